//! Store error taxonomy

use thiserror::Error;

/// PostgREST / Postgres code for a unique constraint violation
pub const UNIQUE_VIOLATION: &str = "23505";

/// Coarse classification used to pick a user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    Duplicate,
    AccessDenied,
    Network,
    Unknown,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Network failure: {0}")]
    Network(String),

    #[error("Backend error ({code}): {message}")]
    Backend { code: String, message: String },

    #[error("Malformed record: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Backend misconfigured: {0}")]
    Config(String),
}

impl StoreError {
    /// Classify an error reported by the backend
    ///
    /// `23505` is a duplicate; a row-level security message is an access
    /// denial; a message mentioning the network is a network failure.
    pub fn from_backend(code: Option<&str>, message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if code == Some(UNIQUE_VIOLATION) {
            Self::Duplicate(message.to_string())
        } else if lower.contains("row-level security") {
            Self::AccessDenied(message.to_string())
        } else if lower.contains("network") {
            Self::Network(message.to_string())
        } else {
            Self::Backend {
                code: code.unwrap_or_default().to_string(),
                message: message.to_string(),
            }
        }
    }

    pub fn kind(&self) -> StoreErrorKind {
        match self {
            Self::Duplicate(_) => StoreErrorKind::Duplicate,
            Self::AccessDenied(_) => StoreErrorKind::AccessDenied,
            Self::Network(_) => StoreErrorKind::Network,
            Self::Backend { .. } | Self::Decode(_) | Self::Config(_) => StoreErrorKind::Unknown,
        }
    }

    /// Backend-supplied message, without the variant prefix
    pub fn message(&self) -> String {
        match self {
            Self::Duplicate(m) | Self::AccessDenied(m) | Self::Network(m) | Self::Config(m) => {
                m.clone()
            }
            Self::Backend { message, .. } => message.clone(),
            Self::Decode(e) => e.to_string(),
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Backend {
                code: String::new(),
                message: e.to_string(),
            }
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for StoreError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Network(e.to_string())
    }
}
