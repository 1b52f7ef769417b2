//! Messages pushed from the service to dashboard clients.

use serde::{Deserialize, Serialize};

use crate::error::IpcError;
use crate::types::CheckInRecord;

/// Server-sent event payloads for the live check-in list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerEvent {
    /// A participant checked in
    CheckInAdded(CheckInRecord),

    /// A check-in was deleted
    CheckInRemoved { id: String },

    /// The upstream change feed failed; the client should refetch
    Error { code: String, message: String },
}

impl ServerEvent {
    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            Self::CheckInAdded(_) => "check_in_added",
            Self::CheckInRemoved { .. } => "check_in_removed",
            Self::Error { .. } => "error",
        }
    }

    pub fn to_json(&self) -> Result<String, IpcError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, IpcError> {
        serde_json::from_str(json).map_err(|e| IpcError::InvalidFormat(e.to_string()))
    }
}
