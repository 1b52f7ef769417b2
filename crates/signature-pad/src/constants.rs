/// Default drawing area width in CSS pixels.
pub const DEFAULT_WIDTH: u32 = 400;

/// Default drawing area height in CSS pixels.
pub const DEFAULT_HEIGHT: u32 = 200;

/// Upper bound on the device pixel ratio used for the backing buffer.
/// Bounds memory and redraw cost on high-density displays.
pub const MAX_DEVICE_PIXEL_RATIO: f32 = 2.0;

/// Pen width in CSS pixels.
pub const DEFAULT_LINE_WIDTH: f32 = 2.0;

/// JPEG quality for the flattened export (0.8 on a 0..1 scale).
pub const JPEG_QUALITY: u8 = 80;

/// Ink color (opaque black).
pub const INK_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Paper color the surface is flattened onto.
pub const PAPER_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// MIME type of the encoded output.
pub const ENCODED_MIME: &str = "image/jpeg";
