//! Freehand signature capture
//!
//! This crate provides the drawing surface behind the check-in form:
//! - [`pad::SignaturePad`] - Idle/Drawing stroke state machine with frame-coalesced input
//! - [`pen`] - Round-capped, anti-aliased segment rasterizer
//! - [`surface`] - CPU RGBA surface holding the live raster
//! - [`frame`] - Single-slot coalescer committing one sample per animation frame
//! - [`encode`] - Flatten onto paper, JPEG encode, data URI wrap/unwrap
//! - [`coords`] - Device pixel ratio capping and client -> local mapping
//! - [`handle`] - Reset handle for the owning form

pub mod constants;
pub mod coords;
pub mod encode;
pub mod frame;
pub mod handle;
pub mod pad;
pub mod pen;
pub mod surface;
pub mod types;

pub use constants::*;
pub use coords::*;
pub use encode::*;
pub use frame::*;
pub use handle::*;
pub use pad::*;
pub use pen::*;
pub use surface::*;
pub use types::*;
