//! Wire protocol for Hadir
//!
//! Defines the records stored by the backend, the HTTP request/response
//! bodies of the check-in and dashboard APIs, and the server-sent event
//! messages pushed to the dashboard.

pub mod error;
pub mod messages;
pub mod types;

pub use error::IpcError;
pub use messages::ServerEvent;
pub use types::*;
