use serde::{Deserialize, Serialize};

/// A point in surface-local CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StrokePoint {
    pub x: f32,
    pub y: f32,
}

impl StrokePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Stroke state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PadState {
    #[default]
    Idle,
    Drawing,
}

/// What the host should draw over the surface when it is not showing ink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Affordance {
    /// Input is locked (pad disabled)
    Locked,
    /// Empty and accepting input ("sign here")
    Placeholder,
    /// Surface carries ink; nothing to overlay
    None,
}

/// A pointer position in client (viewport) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClientPoint {
    pub client_x: f32,
    pub client_y: f32,
}

/// On-screen bounding rectangle of the drawing surface in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SurfaceRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Rect of the given size anchored at the viewport origin
    pub fn sized(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }
}

/// Pixel rectangle (x, y, width, height) in backing-buffer pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Smallest rect covering both
    pub fn union(self, other: PixelRect) -> PixelRect {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = (self.x + self.width).max(other.x + other.width);
        let y1 = (self.y + self.height).max(other.y + other.height);
        PixelRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }
}

/// Raw pointer input as delivered by the host event loop
///
/// Mouse and touch events carry client coordinates; `Frame` is the
/// animation-frame tick on which coalesced samples are committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerInput {
    Down {
        client_x: f32,
        client_y: f32,
    },
    Move {
        client_x: f32,
        client_y: f32,
        /// Primary button still held
        #[serde(default = "primary_default")]
        primary: bool,
    },
    Up,
    Leave,
    TouchStart {
        touches: Vec<ClientPoint>,
    },
    TouchMove {
        touches: Vec<ClientPoint>,
    },
    TouchEnd {
        #[serde(default)]
        touches: Vec<ClientPoint>,
    },
    Frame,
}

fn primary_default() -> bool {
    true
}
