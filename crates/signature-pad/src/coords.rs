//! Coordinate helpers: device pixel ratio, backing size, client -> local mapping

use crate::constants::MAX_DEVICE_PIXEL_RATIO;
use crate::types::{ClientPoint, StrokePoint, SurfaceRect};

/// Clamp a reported device pixel ratio into [1, MAX_DEVICE_PIXEL_RATIO]
pub fn effective_device_pixel_ratio(reported: f32) -> f32 {
    if !reported.is_finite() || reported < 1.0 {
        return 1.0;
    }
    reported.min(MAX_DEVICE_PIXEL_RATIO)
}

/// Backing buffer size for a CSS size at the given ratio
pub fn backing_size(css_width: f32, css_height: f32, ratio: f32) -> (u32, u32) {
    (to_pixels(css_width * ratio), to_pixels(css_height * ratio))
}

fn to_pixels(v: f32) -> u32 {
    if v.is_finite() && v > 0.0 {
        v.round() as u32
    } else {
        0
    }
}

/// Translate client coordinates into surface-local CSS pixels
pub fn to_local(rect: &SurfaceRect, client_x: f32, client_y: f32) -> StrokePoint {
    StrokePoint::new(client_x - rect.left, client_y - rect.top)
}

/// Surface-local point of the first active touch, or `fallback` when none remain
pub fn first_touch(rect: &SurfaceRect, touches: &[ClientPoint], fallback: StrokePoint) -> StrokePoint {
    match touches.first() {
        Some(t) => to_local(rect, t.client_x, t.client_y),
        None => fallback,
    }
}
