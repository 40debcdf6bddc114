use std::io::{self, Write};

use crate::flow::RequestState;
use crate::model::GuideResult;

/// What the search surface shows for a given state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View<'a> {
    /// Search input only
    Search,
    /// Search input disabled, spinner shown
    Searching,
    /// Error panel with a dismiss action
    Error(&'a str),
    /// Guide sections
    Results(&'a GuideResult),
}

pub fn select_view(state: &RequestState) -> View<'_> {
    match state {
        RequestState::Idle => View::Search,
        RequestState::Loading => View::Searching,
        RequestState::Failed(message) => View::Error(message),
        RequestState::Success(result) => View::Results(result),
    }
}

/// Write a plain-text rendering of `view`
pub fn render_view<W: Write>(out: &mut W, view: View<'_>) -> io::Result<()> {
    match view {
        View::Search => writeln!(out, "Where would you like to explore?"),
        View::Searching => writeln!(out, "Searching..."),
        View::Error(message) => {
            writeln!(out, "Something went wrong")?;
            writeln!(out, "{}", message)?;
            writeln!(out, "(press Enter to try again)")
        }
        View::Results(result) => render_guide(out, result),
    }
}

fn render_guide<W: Write>(out: &mut W, guide: &GuideResult) -> io::Result<()> {
    writeln!(out, "# {}", guide.place)?;
    writeln!(out)?;
    writeln!(out, "## Introduction")?;
    writeln!(out, "{}", guide.introduction)?;

    let sections = [
        ("Top Attractions", &guide.top_attractions),
        ("Famous Foods", &guide.famous_foods),
        ("Cultural Highlights", &guide.cultural_highlights),
        ("Travel Tips", &guide.travel_tips),
    ];
    for (title, items) in sections {
        writeln!(out)?;
        writeln!(out, "## {}", title)?;
        for item in items {
            writeln!(out, "- {}", item)?;
        }
    }
    Ok(())
}
