//! Shared fixtures for service and route tests

use hadir_ipc::{NewRosterEntry, RosterEntry};
use hadir_store::{Collection, MemoryBackend, insert_as};
use signature_pad::{
    CpuSurface, JPEG_QUALITY, PAPER_COLOR, Pen, PenStyle, StrokePoint, encode_surface,
};

pub async fn seed_roster(
    memory: &MemoryBackend,
    nama: &str,
    jabatan: &str,
    departemen_instansi: &str,
) -> RosterEntry {
    insert_as(
        memory,
        Collection::DaftarNama,
        &NewRosterEntry {
            nama: nama.to_string(),
            jabatan: jabatan.to_string(),
            departemen_instansi: departemen_instansi.to_string(),
        },
    )
    .await
    .unwrap()
}

/// A small inked JPEG data URI
pub fn signature_uri() -> String {
    let mut surface = CpuSurface::new(120, 60);
    surface.clear([0.0, 0.0, 0.0, 0.0]);
    let pen = Pen::new(PenStyle::default(), 1.0);
    pen.segment(
        &mut surface,
        StrokePoint::new(10.0, 10.0),
        StrokePoint::new(100.0, 40.0),
    );
    encode_surface(&surface, PAPER_COLOR, JPEG_QUALITY)
        .unwrap()
        .into_data_uri()
}
