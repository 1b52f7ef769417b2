//! Participant-facing check-in operations

use std::sync::mpsc;

use chrono::Utc;
use hadir_config::{AppConfig, CanvasConfig};
use hadir_ipc::{
    CheckInRecord, NewCheckIn, RenderSignatureRequest, RenderSignatureResponse, RosterEntry,
};
use hadir_store::{
    Backend, BlobStore, Collection, Query, RecordStore, StoreErrorKind, UploadOptions, fetch,
    insert_as,
};
use signature_pad::{
    ENCODED_MIME, PadConfig, PenStyle, PointerInput, SignaturePad, SurfaceRect, decode_data_uri,
};
use tracing::{debug, info};

use crate::error::AppError;

/// Shortest query that hits the roster
pub const SEARCH_MIN_CHARS: usize = 3;

/// Suggestions returned per search
pub const SEARCH_LIMIT: usize = 5;

/// Most pointer inputs accepted in one replay
pub const MAX_RENDER_INPUTS: usize = 4096;

/// Most strokes (and so flatten-and-encode passes) in one replay
pub const MAX_RENDER_STROKES: usize = 64;

#[derive(Clone)]
pub struct CheckInService {
    backend: Backend,
    bucket: String,
    canvas: CanvasConfig,
}

impl CheckInService {
    pub fn new(backend: Backend, config: &AppConfig) -> Self {
        Self {
            backend,
            bucket: config.backend.bucket.clone(),
            canvas: config.canvas.clone(),
        }
    }

    /// Roster suggestions for a partially typed name
    pub async fn search_roster(&self, q: &str) -> Result<Vec<RosterEntry>, AppError> {
        if q.chars().count() < SEARCH_MIN_CHARS {
            return Ok(Vec::new());
        }
        let query = Query::new(Collection::DaftarNama)
            .contains("nama", q)
            .limit(SEARCH_LIMIT);
        Ok(fetch(&self.backend, &query).await?)
    }

    /// Whether the roster participant already has a check-in
    pub async fn check_in_status(&self, participant_id: &str) -> Result<bool, AppError> {
        let query = Query::new(Collection::DaftarHadir)
            .select(&["id"])
            .eq("uuid", participant_id)
            .limit(1);
        let rows = self.backend.query(&query).await?;
        Ok(!rows.is_empty())
    }

    async fn roster_entry(&self, participant_id: &str) -> Result<RosterEntry, AppError> {
        let query = Query::new(Collection::DaftarNama)
            .eq("id", participant_id)
            .limit(1);
        fetch::<RosterEntry, _>(&self.backend, &query)
            .await?
            .pop()
            .ok_or_else(|| AppError::NotFound(participant_id.to_string()))
    }

    /// Upload the signature and record the check-in
    pub async fn submit(
        &self,
        participant_id: &str,
        signature: &str,
    ) -> Result<CheckInRecord, AppError> {
        let entry = self.roster_entry(participant_id).await?;
        if self.check_in_status(participant_id).await? {
            return Err(AppError::AlreadyCheckedIn);
        }

        let image = decode_data_uri(signature)?;
        if image.bytes.is_empty() {
            return Err(AppError::Validation("Tanda tangan diperlukan".into()));
        }

        let path = format!("{}/{}.jpg", participant_id, Utc::now().timestamp_millis());
        self.backend
            .upload(
                &self.bucket,
                &path,
                image.bytes,
                ENCODED_MIME,
                UploadOptions { overwrite: false },
            )
            .await?;
        let public_url = self.backend.public_url(&self.bucket, &path);
        debug!("Signature stored at {}", public_url);

        // Another submission may have landed while uploading
        if self.check_in_status(participant_id).await? {
            return Err(AppError::AlreadyCheckedIn);
        }

        let record = NewCheckIn::for_participant(&entry, public_url, Utc::now());
        let stored: CheckInRecord = insert_as(&self.backend, Collection::DaftarHadir, &record)
            .await
            .map_err(|e| match e.kind() {
                StoreErrorKind::Duplicate => AppError::AlreadyCheckedIn,
                _ => AppError::Store(e),
            })?;

        info!("Check-in recorded for {} ({})", stored.nama, participant_id);
        Ok(stored)
    }

    /// Latest check-in of a participant
    pub async fn profile(&self, participant_id: &str) -> Result<CheckInRecord, AppError> {
        let query = Query::new(Collection::DaftarHadir)
            .eq("uuid", participant_id)
            .order_by("check_in", true)
            .limit(1);
        fetch::<CheckInRecord, _>(&self.backend, &query)
            .await?
            .pop()
            .ok_or_else(|| AppError::NotFound(participant_id.to_string()))
    }

    /// Replay a pointer script through a fresh pad
    ///
    /// The replayed canvas may not exceed the configured one, and the script
    /// is capped in inputs and strokes.
    pub fn render_signature(
        &self,
        request: RenderSignatureRequest,
    ) -> Result<RenderSignatureResponse, AppError> {
        let width = request.width.unwrap_or(self.canvas.width as f32);
        let height = request.height.unwrap_or(self.canvas.height as f32);
        let in_range = |v: f32, max: u32| v.is_finite() && (0.0..=max as f32).contains(&v);
        if !in_range(width, self.canvas.width) || !in_range(height, self.canvas.height) {
            return Err(AppError::Validation(format!(
                "Ukuran kanvas tidak valid: {width}x{height} (maks {}x{})",
                self.canvas.width, self.canvas.height
            )));
        }
        if request.inputs.len() > MAX_RENDER_INPUTS {
            return Err(AppError::Validation(format!(
                "Terlalu banyak input ({} > {})",
                request.inputs.len(),
                MAX_RENDER_INPUTS
            )));
        }
        let strokes = request
            .inputs
            .iter()
            .filter(|input| {
                matches!(
                    input,
                    PointerInput::Down { .. } | PointerInput::TouchStart { .. }
                )
            })
            .count();
        if strokes > MAX_RENDER_STROKES {
            return Err(AppError::Validation(format!(
                "Terlalu banyak goresan ({strokes} > {MAX_RENDER_STROKES})"
            )));
        }

        let (tx, rx) = mpsc::channel();
        let mut pad = SignaturePad::new(
            PadConfig {
                rect: SurfaceRect::sized(width, height),
                device_pixel_ratio: request.device_pixel_ratio,
                pen: PenStyle {
                    width: self.canvas.line_width,
                    ..Default::default()
                },
                jpeg_quality: self.canvas.jpeg_quality,
            },
            move |signature| {
                let _ = tx.send(signature);
            },
        );
        for input in request.inputs {
            pad.dispatch(input);
        }

        let signature = rx.try_iter().last().flatten();
        debug!(
            "Replayed signature: {} draw calls, output {}",
            pad.stats().draw_calls,
            if signature.is_some() { "present" } else { "empty" }
        );
        Ok(RenderSignatureResponse {
            signature: signature.map(|s| s.into_data_uri()),
        })
    }
}
