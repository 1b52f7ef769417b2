//! Surface operations: damage tracking, clear, encode

use tracing::{debug, warn};

use super::SignaturePad;
use crate::constants::PAPER_COLOR;
use crate::encode::{EncodedSignature, encode_surface};
use crate::types::{PadState, PixelRect, StrokePoint};

impl SignaturePad {
    pub(crate) fn record_damage(&mut self, touched: Option<PixelRect>) {
        let Some(rect) = touched else {
            return;
        };
        self.has_ink = true;
        self.damage = Some(match self.damage {
            Some(existing) => existing.union(rect),
            None => rect,
        });
    }

    /// Region changed since the last call, for partial repaint
    pub fn take_damage(&mut self) -> Option<PixelRect> {
        self.damage.take()
    }

    /// Erase everything and return to the mount state
    ///
    /// Any in-progress stroke is abandoned and its parked sample dropped.
    /// Always reports `None` to the change callback, even if the pad was
    /// already empty.
    pub fn clear(&mut self) {
        self.pending.discard();
        self.state = PadState::Idle;
        self.last_point = StrokePoint::default();
        self.surface.clear([0.0; 4]);
        self.has_ink = false;
        if self.surface.pixel_count() > 0 {
            self.damage = Some(PixelRect {
                x: 0,
                y: 0,
                width: self.surface.width,
                height: self.surface.height,
            });
        }
        debug!("SignaturePad cleared");
        (self.on_change)(None);
    }

    /// Encode the current raster without touching stroke state
    ///
    /// None when nothing has been drawn or encoding fails.
    pub fn snapshot(&self) -> Option<EncodedSignature> {
        if !self.has_ink {
            return None;
        }
        match encode_surface(&self.surface, PAPER_COLOR, self.jpeg_quality) {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                warn!("Signature snapshot failed: {}", e);
                None
            }
        }
    }

    pub(crate) fn emit_encoded(&mut self) {
        match encode_surface(&self.surface, PAPER_COLOR, self.jpeg_quality) {
            Ok(encoded) => {
                self.stats.encodes += 1;
                debug!(
                    "Signature encoded: {} bytes of data URI",
                    encoded.as_data_uri().len()
                );
                (self.on_change)(Some(encoded));
            }
            Err(e) => warn!("Signature encode failed, keeping previous value: {}", e),
        }
    }
}
