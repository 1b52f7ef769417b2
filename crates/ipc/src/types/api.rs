//! HTTP request and response bodies.

use serde::{Deserialize, Serialize};
use signature_pad::PointerInput;

// ============================================================================
// Check-in API
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInStatus {
    pub checked_in: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitCheckIn {
    pub participant_id: String,
    /// `data:image/jpeg;base64,...` from the signature pad
    pub signature: String,
}

/// Replay a recorded pointer stream through a fresh pad
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSignatureRequest {
    /// Container width in CSS pixels (configured canvas width if absent)
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
    #[serde(default = "default_ratio")]
    pub device_pixel_ratio: f32,
    pub inputs: Vec<PointerInput>,
}

fn default_ratio() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSignatureResponse {
    /// Last encoded output, or null if the replay left the pad empty
    pub signature: Option<String>,
}

// ============================================================================
// Dashboard API
// ============================================================================

/// Check-in status filter for the roster view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusFilter {
    #[default]
    All,
    CheckedIn,
    NotCheckedIn,
}

impl StatusFilter {
    pub fn admits(self, checked_in: bool) -> bool {
        match self {
            Self::All => true,
            Self::CheckedIn => checked_in,
            Self::NotCheckedIn => !checked_in,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterFilter {
    /// Case-insensitive substring of name or role
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: StatusFilter,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdList {
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: usize,
}

// ============================================================================
// Session
// ============================================================================

#[derive(Clone, Serialize, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Errors
// ============================================================================

/// JSON error body: machine code plus user-facing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}
