//! Signature pad
//!
//! The pad connects:
//! - Pointer input (mouse/touch handlers, or a scripted `PointerInput` stream)
//! - Frame coalescing (one committed segment per animation frame)
//! - The pen rasterizer writing into the CPU surface
//! - Flatten-and-encode on stroke end, reported through the change callback
//!
//! Nothing about a stroke is kept once it is rasterized; the only edit is a
//! full clear.

mod stroke;
mod surface_ops;

use crate::constants::{DEFAULT_HEIGHT, DEFAULT_WIDTH, JPEG_QUALITY};
use crate::coords::{backing_size, effective_device_pixel_ratio};
use crate::encode::EncodedSignature;
use crate::frame::FrameCoalescer;
use crate::pen::{Pen, PenStyle};
use crate::surface::CpuSurface;
use crate::types::{Affordance, PadState, PixelRect, StrokePoint, SurfaceRect};

/// Receives the encoded signature after each stroke, or None after a clear
pub type SignatureCallback = Box<dyn FnMut(Option<EncodedSignature>) + Send>;

/// Mount-time configuration
#[derive(Debug, Clone)]
pub struct PadConfig {
    /// On-screen rect of the container at mount (CSS pixels)
    pub rect: SurfaceRect,
    /// Device pixel ratio reported by the host (capped internally)
    pub device_pixel_ratio: f32,
    pub pen: PenStyle,
    pub jpeg_quality: u8,
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            rect: SurfaceRect::sized(DEFAULT_WIDTH as f32, DEFAULT_HEIGHT as f32),
            device_pixel_ratio: 1.0,
            pen: PenStyle::default(),
            jpeg_quality: JPEG_QUALITY,
        }
    }
}

/// Counters for observing rasterization work
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PadStats {
    /// Dots and segments handed to the pen
    pub draw_calls: u64,
    /// Animation frames that committed a sample
    pub frames_committed: u64,
    /// Move samples dropped in favor of a later one in the same frame
    pub samples_coalesced: u64,
    /// Successful flatten-and-encode passes
    pub encodes: u64,
}

/// Freehand signature capture control
pub struct SignaturePad {
    pub(crate) surface: CpuSurface,
    pub(crate) pen: Pen,
    pub(crate) rect: SurfaceRect,
    pub(crate) state: PadState,
    pub(crate) last_point: StrokePoint,
    pub(crate) has_ink: bool,
    pub(crate) device_scale: f32,
    pub(crate) disabled: bool,
    pub(crate) pending: FrameCoalescer<StrokePoint>,
    pub(crate) damage: Option<PixelRect>,
    pub(crate) stats: PadStats,
    pub(crate) jpeg_quality: u8,
    pub(crate) on_change: SignatureCallback,
}

impl SignaturePad {
    /// Mount a pad; the backing buffer is sized here once and never again
    pub fn new(
        config: PadConfig,
        on_change: impl FnMut(Option<EncodedSignature>) + Send + 'static,
    ) -> Self {
        let device_scale = effective_device_pixel_ratio(config.device_pixel_ratio);
        let (width, height) = backing_size(config.rect.width, config.rect.height, device_scale);
        tracing::debug!(
            "SignaturePad mounted: css {}x{} @ {:.2} -> backing {}x{}",
            config.rect.width,
            config.rect.height,
            device_scale,
            width,
            height
        );

        Self {
            surface: CpuSurface::new(width, height),
            pen: Pen::new(config.pen, device_scale),
            rect: config.rect,
            state: PadState::Idle,
            last_point: StrokePoint::default(),
            has_ink: false,
            device_scale,
            disabled: false,
            pending: FrameCoalescer::new(),
            damage: None,
            stats: PadStats::default(),
            jpeg_quality: config.jpeg_quality,
            on_change: Box::new(on_change),
        }
    }

    /// Backing buffer width in device pixels
    pub fn width(&self) -> u32 {
        self.surface.width
    }

    /// Backing buffer height in device pixels
    pub fn height(&self) -> u32 {
        self.surface.height
    }

    pub fn device_scale(&self) -> f32 {
        self.device_scale
    }

    pub fn state(&self) -> PadState {
        self.state
    }

    pub fn is_drawing(&self) -> bool {
        self.state == PadState::Drawing
    }

    pub fn has_ink(&self) -> bool {
        self.has_ink
    }

    pub fn last_point(&self) -> StrokePoint {
        self.last_point
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Lock or unlock input; existing ink is left alone
    ///
    /// Locking mid-stroke abandons the stroke: the parked sample is dropped
    /// and the pad returns to Idle without emitting.
    pub fn set_disabled(&mut self, disabled: bool) {
        if disabled && self.state == PadState::Drawing {
            self.pending.discard();
            self.state = PadState::Idle;
            tracing::debug!("SignaturePad locked mid-stroke, stroke abandoned");
        }
        self.disabled = disabled;
    }

    /// Overlay the host should render above the surface
    pub fn affordance(&self) -> Affordance {
        if self.disabled {
            Affordance::Locked
        } else if self.has_ink {
            Affordance::None
        } else {
            Affordance::Placeholder
        }
    }

    /// Update the container's on-screen origin (e.g. after scrolling)
    ///
    /// Only the offset used for coordinate mapping changes; the backing
    /// buffer keeps its mount-time size.
    pub fn set_origin(&mut self, left: f32, top: f32) {
        self.rect.left = left;
        self.rect.top = top;
    }

    pub fn rect(&self) -> SurfaceRect {
        self.rect
    }

    pub fn stats(&self) -> PadStats {
        PadStats {
            samples_coalesced: self.pending.coalesced_count(),
            ..self.stats
        }
    }

    /// Direct read access to the live raster
    pub fn surface(&self) -> &CpuSurface {
        &self.surface
    }

    /// True while a move sample is parked waiting for the next frame
    pub fn needs_frame(&self) -> bool {
        self.pending.frame_requested()
    }
}
