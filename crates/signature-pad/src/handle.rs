//! Imperative handle exposed to the owning form

use crate::pad::SignaturePad;

/// Lets a parent clear the pad without reaching into its state
pub trait SignatureHandle {
    fn reset_signature(&mut self);
}

impl SignatureHandle for SignaturePad {
    fn reset_signature(&mut self) {
        self.clear();
    }
}
