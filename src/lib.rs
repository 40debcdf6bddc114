pub mod client;
pub mod config;
pub mod error;
pub mod flow;
pub mod model;
pub mod view;

pub use client::{GuideClient, GuideClientBuilder, GuideService};
pub use config::ClientConfig;
pub use error::GuideError;
pub use flow::{
    GuideFlow, IgnoreReason, Renderer, RequestState, SubmitOutcome, GENERIC_FAILURE_MESSAGE,
};
pub use model::{GuideQuery, GuideResult, HealthReport, PlaceRequest, CONTRACT_VERSION};
pub use view::{render_view, select_view, View};

use log::debug;

/// Fetch a guide for `place` using configuration from the environment
///
/// # Example
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), tourist_guide::GuideError> {
/// let guide = tourist_guide::lookup_place("Lisbon").await?;
/// println!("{}", guide.introduction);
/// # Ok(())
/// # }
/// ```
pub async fn lookup_place(place: &str) -> Result<GuideResult, GuideError> {
    let config = ClientConfig::load()?;
    lookup_place_with_config(place, &config).await
}

/// Fetch a guide for `place` from the service described by `config`
pub async fn lookup_place_with_config(
    place: &str,
    config: &ClientConfig,
) -> Result<GuideResult, GuideError> {
    let query = GuideQuery::parse(place)?;
    debug!("Looking up {:?} at {}", query.as_str(), config.base_url);
    let client = GuideClient::new(config)?;
    client.tourist_guide(&query).await
}
