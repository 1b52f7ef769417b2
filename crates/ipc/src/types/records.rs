//! Stored records: roster (`daftar_nama`) and check-ins (`daftar_hadir`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pre-registered participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: String,
    pub nama: String,
    pub jabatan: String,
    pub departemen_instansi: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for the roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRosterEntry {
    pub nama: String,
    pub jabatan: String,
    pub departemen_instansi: String,
}

impl NewRosterEntry {
    /// Copy with surrounding whitespace removed from every field
    pub fn trimmed(&self) -> Self {
        Self {
            nama: self.nama.trim().to_string(),
            jabatan: self.jabatan.trim().to_string(),
            departemen_instansi: self.departemen_instansi.trim().to_string(),
        }
    }

    /// Name of the first empty field, if any
    pub fn first_empty_field(&self) -> Option<&'static str> {
        if self.nama.is_empty() {
            Some("nama")
        } else if self.jabatan.is_empty() {
            Some("jabatan")
        } else if self.departemen_instansi.is_empty() {
            Some("departemen_instansi")
        } else {
            None
        }
    }
}

/// An attendance record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInRecord {
    pub id: String,
    /// Roster id of the participant (absent for walk-ins)
    pub uuid: Option<String>,
    pub nama: String,
    pub jabatan: String,
    pub departemen_instansi: String,
    /// Public URL of the uploaded signature image
    pub photo_ttd_url: Option<String>,
    pub check_in: DateTime<Utc>,
}

/// Insert payload for check-ins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCheckIn {
    pub uuid: Option<String>,
    pub nama: String,
    pub jabatan: String,
    pub departemen_instansi: String,
    pub photo_ttd_url: Option<String>,
    pub check_in: DateTime<Utc>,
}

impl NewCheckIn {
    /// Check-in for a roster participant, stamped now
    pub fn for_participant(entry: &RosterEntry, photo_ttd_url: String, at: DateTime<Utc>) -> Self {
        Self {
            uuid: Some(entry.id.clone()),
            nama: entry.nama.clone(),
            jabatan: entry.jabatan.clone(),
            departemen_instansi: entry.departemen_instansi.clone(),
            photo_ttd_url: Some(photo_ttd_url),
            check_in: at,
        }
    }
}

/// Row of the dashboard roster view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRow {
    #[serde(flatten)]
    pub entry: RosterEntry,
    pub checked_in: bool,
}
