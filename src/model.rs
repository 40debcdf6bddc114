use serde::{Deserialize, Serialize};
use std::fmt;

use crate::GuideError;

/// Version of the guide response contract this crate speaks.
///
/// Version 1 carries `top_attractions` as a flat list of strings.
pub const CONTRACT_VERSION: u32 = 1;

/// A place name ready to be sent to the guide service.
///
/// Always trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideQuery(String);

impl GuideQuery {
    /// Trim the raw input and reject it if nothing is left
    pub fn parse(raw: &str) -> Result<Self, GuideError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(GuideError::EmptyQuery);
        }
        Ok(GuideQuery(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GuideQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of `POST /tourist-guide`
#[derive(Debug, Serialize)]
pub struct PlaceRequest<'a> {
    pub place: &'a str,
}

impl<'a> From<&'a GuideQuery> for PlaceRequest<'a> {
    fn from(query: &'a GuideQuery) -> Self {
        PlaceRequest {
            place: query.as_str(),
        }
    }
}

/// Structured travel information returned for a place
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideResult {
    pub place: String,
    pub introduction: String,
    pub top_attractions: Vec<String>,
    pub famous_foods: Vec<String>,
    pub cultural_highlights: Vec<String>,
    pub travel_tips: Vec<String>,
}

/// Report from `GET /health`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub gemini_status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
