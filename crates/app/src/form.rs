//! Check-in form model
//!
//! Holds what the participant has entered so far and owns the signature
//! pad. The pad is locked until a participant is picked and confirmed as
//! not yet checked in.

use std::sync::mpsc;

use hadir_config::CanvasConfig;
use hadir_ipc::{CheckInRecord, RosterEntry};
use signature_pad::{
    EncodedSignature, PadConfig, PenStyle, SignatureHandle, SignaturePad, SurfaceRect,
};
use tracing::debug;

use crate::checkin::CheckInService;
use crate::error::AppError;

pub const MSG_PICK_PARTICIPANT: &str = "Pilih nama peserta dahulu";
pub const MSG_ALREADY_REGISTERED: &str = "Anda sudah melakukan check-in";
pub const MSG_SIGNATURE_REQUIRED: &str = "Tanda tangan diperlukan";
pub const MSG_STATUS_CHECK_FAILED: &str = "Gagal memeriksa status check-in. Silakan coba lagi.";

const SIGNATURE_PREFIX: &str = "data:image";

pub struct CheckInForm {
    search: String,
    selected: Option<RosterEntry>,
    jabatan: String,
    instansi: String,
    signature: Option<String>,
    already_registered: bool,
    checking_status: bool,
    submitting: bool,
    error: Option<String>,
    pad: SignaturePad,
    signatures: mpsc::Receiver<Option<EncodedSignature>>,
}

impl CheckInForm {
    pub fn new(canvas: &CanvasConfig, device_pixel_ratio: f32) -> Self {
        let (tx, signatures) = mpsc::channel();
        let mut pad = SignaturePad::new(
            PadConfig {
                rect: SurfaceRect::sized(canvas.width as f32, canvas.height as f32),
                device_pixel_ratio,
                pen: PenStyle {
                    width: canvas.line_width,
                    ..Default::default()
                },
                jpeg_quality: canvas.jpeg_quality,
            },
            move |signature| {
                let _ = tx.send(signature);
            },
        );
        pad.set_disabled(true);

        Self {
            search: String::new(),
            selected: None,
            jabatan: String::new(),
            instansi: String::new(),
            signature: None,
            already_registered: false,
            checking_status: false,
            submitting: false,
            error: None,
            pad,
            signatures,
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn selected(&self) -> Option<&RosterEntry> {
        self.selected.as_ref()
    }

    pub fn jabatan(&self) -> &str {
        &self.jabatan
    }

    pub fn instansi(&self) -> &str {
        &self.instansi
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn is_already_registered(&self) -> bool {
        self.already_registered
    }

    pub fn is_checking_status(&self) -> bool {
        self.checking_status
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Typed search text; clearing it drops the current selection
    pub fn set_search(&mut self, text: &str) {
        self.search = text.to_string();
        if text.is_empty() {
            self.selected = None;
            self.jabatan.clear();
            self.instansi.clear();
            self.already_registered = false;
            self.error = None;
        }
        self.refresh_pad_lock();
    }

    pub fn set_jabatan(&mut self, jabatan: &str) {
        self.jabatan = jabatan.to_string();
    }

    pub fn set_instansi(&mut self, instansi: &str) {
        self.instansi = instansi.to_string();
    }

    /// Pick a suggestion; the caller must follow up with a status check
    pub fn select(&mut self, entry: RosterEntry) {
        self.search = entry.nama.clone();
        self.jabatan = entry.jabatan.clone();
        self.instansi = entry.departemen_instansi.clone();
        self.selected = Some(entry);
        self.already_registered = false;
        self.checking_status = true;
        self.error = None;
        self.refresh_pad_lock();
    }

    pub fn finish_status_check(&mut self, result: Result<bool, AppError>) {
        self.checking_status = false;
        match result {
            Ok(checked_in) => {
                self.already_registered = checked_in;
                if checked_in {
                    self.error = Some(MSG_ALREADY_REGISTERED.to_string());
                }
            }
            Err(e) => {
                debug!("Status check failed: {}", e);
                self.error = Some(MSG_STATUS_CHECK_FAILED.to_string());
            }
        }
        self.refresh_pad_lock();
    }

    /// Pull every output the pad has reported since the last call
    pub fn sync_signature(&mut self) {
        while let Ok(signature) = self.signatures.try_recv() {
            self.signature = signature.map(EncodedSignature::into_data_uri);
        }
    }

    pub fn pad(&self) -> &SignaturePad {
        &self.pad
    }

    /// Pointer input goes here; call [`Self::sync_signature`] afterwards
    pub fn pad_mut(&mut self) -> &mut SignaturePad {
        &mut self.pad
    }

    pub fn pad_disabled(&self) -> bool {
        self.selected.is_none() || self.already_registered || self.checking_status
    }

    fn refresh_pad_lock(&mut self) {
        let disabled = self.pad_disabled();
        self.pad.set_disabled(disabled);
    }

    pub fn is_name_valid(&self) -> bool {
        self.selected
            .as_ref()
            .is_some_and(|entry| entry.nama == self.search)
    }

    pub fn is_complete(&self) -> bool {
        self.is_name_valid()
            && !self.jabatan.is_empty()
            && !self.instansi.is_empty()
            && self.signature.is_some()
            && !self.already_registered
    }

    /// Participant id and signature ready to send, or the message to show
    pub fn validate_submission(&self) -> Result<(String, String), String> {
        let Some(entry) = self.selected.as_ref().filter(|_| self.is_name_valid()) else {
            return Err(MSG_PICK_PARTICIPANT.to_string());
        };
        if self.already_registered {
            return Err(MSG_ALREADY_REGISTERED.to_string());
        }
        let Some(signature) = &self.signature else {
            return Err(MSG_SIGNATURE_REQUIRED.to_string());
        };
        if !signature.starts_with(SIGNATURE_PREFIX) {
            return Err(crate::error::MSG_INVALID_SIGNATURE.to_string());
        }
        Ok((entry.id.clone(), signature.clone()))
    }

    /// Validate and submit; on success the form is reset
    pub async fn submit(&mut self, service: &CheckInService) -> Result<CheckInRecord, AppError> {
        self.sync_signature();
        let (participant_id, signature) = self.validate_submission().map_err(|message| {
            self.error = Some(message.clone());
            AppError::Validation(message)
        })?;

        self.submitting = true;
        self.error = None;
        let result = service.submit(&participant_id, &signature).await;
        self.submitting = false;

        match result {
            Ok(record) => {
                self.cancel();
                Ok(record)
            }
            Err(e) => {
                if matches!(e, AppError::AlreadyCheckedIn) {
                    self.already_registered = true;
                    self.refresh_pad_lock();
                }
                self.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Back to the empty form; the pad is wiped and reports no signature
    pub fn cancel(&mut self) {
        self.search.clear();
        self.selected = None;
        self.jabatan.clear();
        self.instansi.clear();
        self.already_registered = false;
        self.checking_status = false;
        self.submitting = false;
        self.error = None;
        self.pad.reset_signature();
        self.sync_signature();
        self.refresh_pad_lock();
    }
}
