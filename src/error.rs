use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UptimeError {
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Encode error: {0}")]
    Encode(String),
    #[error("Chain endpoint unavailable: {0}")]
    Unavailable(String),
    #[error("Height {0} not found (pruned or out of range)")]
    NotFound(u64),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Analysis pass aborted: {0}")]
    Aborted(String),
}

impl UptimeError {
    /// Only transport-level failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, UptimeError::Unavailable(_))
    }
}

impl From<reqwest::Error> for UptimeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            UptimeError::Decode(e.to_string())
        } else {
            UptimeError::Unavailable(e.to_string())
        }
    }
}

impl From<serde_json::Error> for UptimeError {
    fn from(e: serde_json::Error) -> Self {
        UptimeError::Decode(e.to_string())
    }
}
