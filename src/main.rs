use log::{error, info};
use std::env;
use std::io::{self, Write};
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tourist_guide::{
    render_view, select_view, ClientConfig, GuideClient, GuideFlow, IgnoreReason, RequestState,
    SubmitOutcome,
};

const USAGE: &str = "Usage: tourist-guide [--base-url <URL>] [--json] [--health] [PLACE...]

Without PLACE, reads one place per line from stdin.
An empty line dismisses an error, :quit exits.";

#[derive(Debug, Default)]
struct Args {
    base_url: Option<String>,
    json: bool,
    health: bool,
    help: bool,
    place: Vec<String>,
}

fn parse_args(raw: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut args = Args::default();
    let mut raw = raw;
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--base-url" => {
                let url = raw
                    .next()
                    .filter(|value| !value.starts_with("--"))
                    .ok_or("--base-url requires a URL value")?;
                args.base_url = Some(url);
            }
            "--json" => args.json = true,
            "--health" => args.health = true,
            "-h" | "--help" => args.help = true,
            flag if flag.starts_with("--") => return Err(format!("Unknown option: {}", flag)),
            _ => args.place.push(arg),
        }
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = match parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}\n\n{}", msg, USAGE);
            return ExitCode::from(2);
        }
    };
    if args.help {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    let mut config = match ClientConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::from(2);
        }
    };
    if let Some(url) = args.base_url.clone() {
        config = config.with_base_url(url);
    }
    info!("Using guide service at {}", config.base_url);

    let client = match GuideClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.health {
        return health(&client).await;
    }

    if args.place.is_empty() {
        interactive(client, args.json).await
    } else {
        one_shot(client, &args.place.join(" "), args.json).await
    }
}

async fn health(client: &GuideClient) -> ExitCode {
    match client.health().await {
        Ok(report) => {
            println!("status: {}", report.status);
            if let Some(name) = &report.app_name {
                println!("app: {}", name);
            }
            if let Some(version) = &report.version {
                println!("version: {}", version);
            }
            if let Some(model) = &report.gemini_status {
                println!("model: {}", model);
            }
            if let Some(detail) = &report.error {
                println!("error: {}", detail);
            }
            if report.is_healthy() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!("Health check failed: {}", e);
            eprintln!("Guide service at {} is unreachable", client.base_url());
            ExitCode::FAILURE
        }
    }
}

async fn one_shot(client: GuideClient, place: &str, json: bool) -> ExitCode {
    let flow = GuideFlow::new(client);

    match flow.submit(place).await {
        SubmitOutcome::Succeeded => {
            if let Err(e) = show_state(&flow.state(), json) {
                error!("Failed to write guide: {}", e);
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        SubmitOutcome::Failed => {
            let state = flow.state();
            if let Err(e) = render_view(&mut io::stderr().lock(), select_view(&state)) {
                error!("Failed to render error: {}", e);
            }
            ExitCode::FAILURE
        }
        SubmitOutcome::Ignored(IgnoreReason::EmptyQuery) => {
            eprintln!("Place cannot be empty\n\n{}", USAGE);
            ExitCode::from(2)
        }
        SubmitOutcome::Ignored(IgnoreReason::Busy) => ExitCode::FAILURE,
    }
}

async fn interactive(client: GuideClient, json: bool) -> ExitCode {
    let flow = GuideFlow::new(client).with_renderer(move |state: &RequestState| {
        if let Err(e) = show_state(state, json) {
            error!("Failed to render: {}", e);
        }
    });

    if let Err(e) = show_state(&RequestState::Idle, json) {
        error!("Failed to render: {}", e);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read input: {}", e);
                return ExitCode::FAILURE;
            }
        };

        if line.trim() == ":quit" {
            break;
        }
        if line.trim().is_empty() && flow.dismiss() {
            continue;
        }

        flow.set_input(line);
        flow.submit_input().await;
    }

    ExitCode::SUCCESS
}

/// With `--json`, stdout carries only guide documents and every other view
/// goes to stderr.
fn show_state(state: &RequestState, json: bool) -> io::Result<()> {
    match state {
        RequestState::Success(result) if json => {
            let mut out = io::stdout().lock();
            serde_json::to_writer_pretty(&mut out, result)?;
            writeln!(out)
        }
        _ if json => render_view(&mut io::stderr().lock(), select_view(state)),
        _ => render_view(&mut io::stdout().lock(), select_view(state)),
    }
}
