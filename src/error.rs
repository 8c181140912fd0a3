//! Custom error types for vidpulse

use thiserror::Error;

/// Main error type for vidpulse operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A search, video-stats or channel-stats call failed
    #[error("Upstream {stage} fetch failed: {message}")]
    Upstream { stage: String, message: String },

    /// A raw record lacks a mandatory field that has no safe default
    #[error("Malformed {entity} record: {reason}")]
    MalformedRecord { entity: String, reason: String },

    #[error("Timestamp has no time zone: {0}")]
    NaiveTimestamp(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn upstream(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Upstream {
            stage: stage.into(),
            message: message.into(),
        }
    }

    pub fn malformed(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedRecord {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error came from a collaborator call
    pub fn is_upstream(&self) -> bool {
        matches!(self, Error::Upstream { .. } | Error::Http(_))
    }
}

/// Result type alias for vidpulse
pub type Result<T> = std::result::Result<T, Error>;
