use thiserror::Error;

/// Errors that can occur while requesting a travel guide
#[derive(Error, Debug)]
pub enum GuideError {
    /// The place query was empty or whitespace-only
    #[error("Place query cannot be empty")]
    EmptyQuery,

    /// The request never produced a response
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("Guide service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not match the guide contract
    #[error("Malformed guide response: {0}")]
    MalformedBody(#[from] serde_json::Error),

    /// HTTP client could not be constructed
    #[error("Client error: {0}")]
    Client(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl GuideError {
    /// Whether this error happened on the way to or from the service.
    ///
    /// These are the failures that the request flow reports to the user
    /// with a single generic message.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            GuideError::Transport(_) | GuideError::Status { .. } | GuideError::MalformedBody(_)
        )
    }
}
