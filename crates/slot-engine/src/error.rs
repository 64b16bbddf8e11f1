//! Error types for slot-engine operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlotError {
    #[error("Calendly API key is not set")]
    MissingCredential,

    #[error("Calendly rejected the API key (HTTP 401)")]
    InvalidCredential,

    #[error("Permission denied by Calendly: {0}")]
    PermissionDenied(String),

    #[error("Upstream returned HTTP {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Invalid roster: {0}")]
    InvalidRoster(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid setting {name}: {reason}")]
    InvalidSetting { name: String, reason: String },
}

impl SlotError {
    /// Configuration errors abort every fetch; everything else is contained
    /// at the smallest failing unit.
    pub fn is_configuration(&self) -> bool {
        matches!(self, SlotError::MissingCredential | SlotError::InvalidCredential)
    }
}

impl From<reqwest::Error> for SlotError {
    fn from(err: reqwest::Error) -> Self {
        SlotError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SlotError>;
