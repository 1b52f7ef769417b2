//! Hadir - event check-in service
//!
//! Participants pick their pre-registered name, sign, and submit; admins
//! review, prune and export the attendance list:
//! - [`form`] - Check-in form model owning the signature pad
//! - [`checkin`] - Roster search, status, submit, profile, signature replay
//! - [`admin`] - Check-in list, roster view, participant and check-in deletion
//! - [`export`] - Spreadsheet and print documents
//! - [`feed`] - Live check-in list over the backend change feed
//! - [`session`] / [`auth`] - Dashboard gate and admin sign-in
//! - [`server`] - axum router and listener

pub mod admin;
pub mod auth;
pub mod checkin;
pub mod error;
pub mod export;
pub mod feed;
pub mod form;
pub mod server;
pub mod session;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use error::AppError;
pub use state::AppState;
