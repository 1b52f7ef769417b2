//! Stroke state machine: pointer and touch handlers

use super::SignaturePad;
use crate::coords::{first_touch, to_local};
use crate::types::{ClientPoint, PadState, PointerInput, StrokePoint};

impl SignaturePad {
    /// Primary button pressed (or first touch) at client coordinates
    pub fn pointer_down(&mut self, client_x: f32, client_y: f32) {
        if self.disabled {
            return;
        }
        let point = to_local(&self.rect, client_x, client_y);
        self.begin_stroke(point);
    }

    /// Pointer moved; `primary` is whether the primary button is still held
    ///
    /// The sample is parked until the next animation frame. Returns true if
    /// the host must schedule a frame.
    pub fn pointer_move(&mut self, client_x: f32, client_y: f32, primary: bool) -> bool {
        if self.disabled || self.state != PadState::Drawing || !primary {
            return false;
        }
        let point = to_local(&self.rect, client_x, client_y);
        self.pending.offer(point)
    }

    pub fn pointer_up(&mut self) {
        if self.disabled {
            return;
        }
        self.end_stroke();
    }

    /// Pointer left the surface; treated exactly like release
    pub fn pointer_leave(&mut self) {
        if self.disabled {
            return;
        }
        self.end_stroke();
    }

    pub fn touch_start(&mut self, touches: &[ClientPoint]) {
        if self.disabled {
            return;
        }
        let point = first_touch(&self.rect, touches, self.last_point);
        self.begin_stroke(point);
    }

    pub fn touch_move(&mut self, touches: &[ClientPoint]) -> bool {
        if self.disabled || self.state != PadState::Drawing {
            return false;
        }
        let point = first_touch(&self.rect, touches, self.last_point);
        self.pending.offer(point)
    }

    /// Touch lifted; the remaining touch list may be empty
    pub fn touch_end(&mut self, _touches: &[ClientPoint]) {
        if self.disabled {
            return;
        }
        self.end_stroke();
    }

    /// Animation frame tick: commit at most one parked sample as a segment
    pub fn on_animation_frame(&mut self) {
        if self.disabled {
            return;
        }
        if let Some(point) = self.pending.take() {
            if self.state == PadState::Drawing {
                self.draw_to(point);
                self.stats.frames_committed += 1;
            }
        }
    }

    /// Route a scripted input to its handler
    pub fn dispatch(&mut self, input: PointerInput) {
        match input {
            PointerInput::Down { client_x, client_y } => self.pointer_down(client_x, client_y),
            PointerInput::Move {
                client_x,
                client_y,
                primary,
            } => {
                self.pointer_move(client_x, client_y, primary);
            }
            PointerInput::Up => self.pointer_up(),
            PointerInput::Leave => self.pointer_leave(),
            PointerInput::TouchStart { touches } => self.touch_start(&touches),
            PointerInput::TouchMove { touches } => {
                self.touch_move(&touches);
            }
            PointerInput::TouchEnd { touches } => self.touch_end(&touches),
            PointerInput::Frame => self.on_animation_frame(),
        }
    }

    fn begin_stroke(&mut self, point: StrokePoint) {
        self.pending.discard();
        self.state = PadState::Drawing;
        self.last_point = point;

        self.stats.draw_calls += 1;
        let touched = self.pen.dot(&mut self.surface, point);
        self.record_damage(touched);
    }

    fn draw_to(&mut self, point: StrokePoint) {
        let from = self.last_point;
        self.stats.draw_calls += 1;
        let touched = self.pen.segment(&mut self.surface, from, point);
        self.record_damage(touched);
        self.last_point = point;
    }

    fn end_stroke(&mut self) {
        if self.state != PadState::Drawing {
            return;
        }
        // A sample parked since the last frame still belongs to this stroke
        if let Some(point) = self.pending.take() {
            self.draw_to(point);
        }
        self.state = PadState::Idle;

        if self.has_ink {
            self.emit_encoded();
        }
    }
}
