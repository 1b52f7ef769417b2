//! Shared value types.

mod api;
mod records;

pub use api::*;
pub use records::*;
