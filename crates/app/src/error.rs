//! Service errors and their HTTP mapping

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hadir_ipc::ErrorBody;
use hadir_store::{StoreError, StoreErrorKind};
use signature_pad::EncodeError;
use thiserror::Error;

pub const MSG_ALREADY_CHECKED_IN: &str = "Anda sudah check-in sebelumnya.";
pub const MSG_ACCESS_DENIED: &str = "Akses ditolak oleh server penyimpanan.";
pub const MSG_NETWORK: &str = "Koneksi ke server bermasalah. Coba cek internet lalu ulangi.";
pub const MSG_SUBMIT_FAILED: &str = "Gagal submit. Silakan coba lagi.";
pub const MSG_INVALID_CREDENTIALS: &str = "Username atau password salah";
pub const MSG_NOT_FOUND: &str = "Data peserta tidak ditemukan.";
pub const MSG_INVALID_SIGNATURE: &str = "Format tanda tangan tidak valid";
pub const MSG_EXPORT_FAILED: &str = "Gagal membuat file export.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Participant has already checked in")]
    AlreadyCheckedIn,

    #[error("Invalid signature: {0}")]
    InvalidSignature(#[from] EncodeError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<rust_xlsxwriter::XlsxError> for AppError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        Self::Export(e.to_string())
    }
}

impl AppError {
    /// Machine-readable code for the JSON body
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AlreadyCheckedIn => "already_checked_in",
            Self::InvalidSignature(_) => "invalid_signature",
            Self::Validation(_) => "validation",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Export(_) => "export",
            Self::Internal(_) => "internal",
            Self::Store(e) => match e.kind() {
                StoreErrorKind::Duplicate => "already_checked_in",
                StoreErrorKind::AccessDenied => "access_denied",
                StoreErrorKind::Network => "network",
                StoreErrorKind::Unknown => "store",
            },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyCheckedIn => StatusCode::CONFLICT,
            Self::InvalidSignature(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Export(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Store(e) => match e.kind() {
                StoreErrorKind::Duplicate => StatusCode::CONFLICT,
                StoreErrorKind::AccessDenied => StatusCode::FORBIDDEN,
                StoreErrorKind::Network => StatusCode::BAD_GATEWAY,
                StoreErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Message shown to the participant or admin
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(_) => MSG_NOT_FOUND.to_string(),
            Self::AlreadyCheckedIn => MSG_ALREADY_CHECKED_IN.to_string(),
            Self::InvalidSignature(_) => MSG_INVALID_SIGNATURE.to_string(),
            Self::Validation(message) => message.clone(),
            Self::InvalidCredentials => MSG_INVALID_CREDENTIALS.to_string(),
            Self::Export(_) => MSG_EXPORT_FAILED.to_string(),
            Self::Internal(_) => MSG_SUBMIT_FAILED.to_string(),
            Self::Store(e) => match e.kind() {
                StoreErrorKind::Duplicate => MSG_ALREADY_CHECKED_IN.to_string(),
                StoreErrorKind::AccessDenied => MSG_ACCESS_DENIED.to_string(),
                StoreErrorKind::Network => MSG_NETWORK.to_string(),
                StoreErrorKind::Unknown => {
                    let message = e.message();
                    if message.trim().is_empty() {
                        MSG_SUBMIT_FAILED.to_string()
                    } else {
                        message
                    }
                }
            },
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code().to_string(),
            message: self.user_message(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        (status, Json(self.body())).into_response()
    }
}
