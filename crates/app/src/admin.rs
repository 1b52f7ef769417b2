//! Dashboard operations: check-in list, roster management, deletions

use std::collections::HashSet;

use hadir_config::AppConfig;
use hadir_ipc::{CheckInRecord, NewRosterEntry, RosterEntry, RosterFilter, RosterRow};
use hadir_store::{Backend, BlobStore, Collection, Query, RecordStore, fetch, insert_as};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::AppError;

#[derive(Clone)]
pub struct AdminService {
    backend: Backend,
    bucket: String,
    departments: Vec<String>,
}

/// Object path inside `bucket` for one of its public URLs
///
/// `https://host/storage/v1/object/public/ttd/p1/123.jpg?token=x` gives
/// `p1/123.jpg`. URLs that do not point into the bucket give None.
pub fn blob_path(url: &str, bucket: &str) -> Option<String> {
    let marker = format!("/{bucket}/");
    let (_, rest) = url.split_once(&marker)?;
    let path = rest.split('?').next().unwrap_or_default();
    (!path.is_empty()).then(|| path.to_string())
}

impl AdminService {
    pub fn new(backend: Backend, config: &AppConfig) -> Self {
        Self {
            backend,
            bucket: config.backend.bucket.clone(),
            departments: config.event.departments.clone(),
        }
    }

    /// All check-ins, newest first
    pub async fn list_check_ins(&self) -> Result<Vec<CheckInRecord>, AppError> {
        let query = Query::new(Collection::DaftarHadir).order_by("check_in", true);
        Ok(fetch(&self.backend, &query).await?)
    }

    /// Roster joined with check-in status, newest registration first
    pub async fn roster(&self, filter: &RosterFilter) -> Result<Vec<RosterRow>, AppError> {
        let entries: Vec<RosterEntry> = fetch(
            &self.backend,
            &Query::new(Collection::DaftarNama).order_by("created_at", true),
        )
        .await?;

        let checked_in: HashSet<String> = self
            .backend
            .query(&Query::new(Collection::DaftarHadir).select(&["uuid"]))
            .await?
            .into_iter()
            .filter_map(|row| match row.get("uuid") {
                Some(Value::String(id)) => Some(id.clone()),
                _ => None,
            })
            .collect();

        let needle = filter
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        Ok(entries
            .into_iter()
            .filter(|entry| match &needle {
                Some(needle) => {
                    entry.nama.to_lowercase().contains(needle)
                        || entry.jabatan.to_lowercase().contains(needle)
                }
                None => true,
            })
            .map(|entry| RosterRow {
                checked_in: checked_in.contains(&entry.id),
                entry,
            })
            .filter(|row| filter.status.admits(row.checked_in))
            .collect())
    }

    pub async fn add_participant(&self, new: &NewRosterEntry) -> Result<RosterEntry, AppError> {
        let new = new.trimmed();
        if let Some(field) = new.first_empty_field() {
            return Err(AppError::Validation(format!("Field {field} wajib diisi")));
        }
        let entry: RosterEntry = insert_as(&self.backend, Collection::DaftarNama, &new).await?;
        info!("Participant added: {} ({})", entry.nama, entry.id);
        Ok(entry)
    }

    pub async fn delete_participants(&self, ids: &[String]) -> Result<usize, AppError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let deleted = self.backend.delete(Collection::DaftarNama, ids).await?;
        info!("Deleted {} participants", deleted);
        Ok(deleted)
    }

    /// Delete check-ins and, best effort, their signature images
    pub async fn delete_check_ins(&self, ids: &[String]) -> Result<usize, AppError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let rows = self
            .backend
            .query(
                &Query::new(Collection::DaftarHadir)
                    .select(&["id", "photo_ttd_url"])
                    .is_in("id", ids.iter().cloned()),
            )
            .await?;
        let paths: Vec<String> = rows
            .iter()
            .filter_map(|row| row.get("photo_ttd_url").and_then(Value::as_str))
            .filter_map(|url| blob_path(url, &self.bucket))
            .collect();

        if !paths.is_empty() {
            if let Err(e) = self.backend.remove(&self.bucket, &paths).await {
                warn!(
                    "Failed to remove {} signature images, deleting records anyway: {}",
                    paths.len(),
                    e
                );
            }
        }

        let deleted = self.backend.delete(Collection::DaftarHadir, ids).await?;
        info!("Deleted {} check-ins", deleted);
        Ok(deleted)
    }

    pub fn departments(&self) -> &[String] {
        &self.departments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkin::CheckInService;
    use crate::testing::{seed_roster, signature_uri};
    use hadir_ipc::StatusFilter;
    use hadir_store::{Fault, MemoryBackend};

    fn services() -> (AdminService, CheckInService, MemoryBackend) {
        let memory = MemoryBackend::new();
        let config = AppConfig::default();
        (
            AdminService::new(memory.clone().into(), &config),
            CheckInService::new(memory.clone().into(), &config),
            memory,
        )
    }

    #[test]
    fn test_blob_path() {
        assert_eq!(
            blob_path(
                "https://x.supabase.co/storage/v1/object/public/ttd/p1/123.jpg?token=abc",
                "ttd"
            )
            .as_deref(),
            Some("p1/123.jpg")
        );
        assert_eq!(
            blob_path("http://localhost/storage/v1/object/public/ttd/a.jpg", "ttd").as_deref(),
            Some("a.jpg")
        );
        assert_eq!(blob_path("https://elsewhere/img.jpg", "ttd"), None);
        assert_eq!(blob_path("https://x/ttd/?q=1", "ttd"), None);
    }

    #[tokio::test]
    async fn test_roster_filter_by_status_and_text() {
        let (admin, checkin, memory) = services();
        let andi = seed_roster(&memory, "Andi", "Direktur", "DIREKSI").await;
        seed_roster(&memory, "Budi", "Staf Direksi", "DIREKSI").await;
        seed_roster(&memory, "Citra", "Manager", "YKST").await;
        checkin.submit(&andi.id, &signature_uri()).await.unwrap();

        let all = admin.roster(&RosterFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let checked = admin
            .roster(&RosterFilter {
                search: None,
                status: StatusFilter::CheckedIn,
            })
            .await
            .unwrap();
        assert_eq!(checked.len(), 1);
        assert_eq!(checked[0].entry.id, andi.id);

        let pending_direk = admin
            .roster(&RosterFilter {
                search: Some("DIREK".into()),
                status: StatusFilter::NotCheckedIn,
            })
            .await
            .unwrap();
        assert_eq!(pending_direk.len(), 1);
        assert_eq!(pending_direk[0].entry.nama, "Budi");
    }

    #[tokio::test]
    async fn test_add_participant_validates() {
        let (admin, _checkin, _memory) = services();
        let err = admin
            .add_participant(&NewRosterEntry {
                nama: "  ".into(),
                jabatan: "Staf".into(),
                departemen_instansi: "YKST".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let entry = admin
            .add_participant(&NewRosterEntry {
                nama: " Fajar ".into(),
                jabatan: "Staf".into(),
                departemen_instansi: "YKST".into(),
            })
            .await
            .unwrap();
        assert_eq!(entry.nama, "Fajar");
    }

    #[tokio::test]
    async fn test_delete_participants() {
        let (admin, _checkin, memory) = services();
        let a = seed_roster(&memory, "A", "x", "y").await;
        seed_roster(&memory, "B", "x", "y").await;

        assert_eq!(admin.delete_participants(&[]).await.unwrap(), 0);
        assert_eq!(admin.delete_participants(&[a.id]).await.unwrap(), 1);
        assert_eq!(memory.row_count(Collection::DaftarNama).await, 1);
    }

    #[tokio::test]
    async fn test_delete_check_ins_removes_blobs() {
        let (admin, checkin, memory) = services();
        let entry = seed_roster(&memory, "Gita", "Staf", "SKST").await;
        let record = checkin.submit(&entry.id, &signature_uri()).await.unwrap();
        assert_eq!(memory.blob_count().await, 1);

        assert_eq!(admin.delete_check_ins(&[]).await.unwrap(), 0);
        assert_eq!(admin.delete_check_ins(&[record.id]).await.unwrap(), 1);
        assert_eq!(memory.blob_count().await, 0);
        assert!(admin.list_check_ins().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_check_ins_tolerates_blob_failure() {
        let (admin, checkin, memory) = services();
        let entry = seed_roster(&memory, "Hana", "Staf", "SKST").await;
        let record = checkin.submit(&entry.id, &signature_uri()).await.unwrap();

        memory.set_fault(Fault::RemoveBlobs, true);
        assert_eq!(admin.delete_check_ins(&[record.id]).await.unwrap(), 1);
        assert_eq!(memory.row_count(Collection::DaftarHadir).await, 0);
        // Blob is orphaned but the records are gone
        assert_eq!(memory.blob_count().await, 1);
    }

    #[tokio::test]
    async fn test_delete_check_ins_record_failure_propagates() {
        let (admin, checkin, memory) = services();
        let entry = seed_roster(&memory, "Indra", "Staf", "SKST").await;
        let record = checkin.submit(&entry.id, &signature_uri()).await.unwrap();

        memory.set_fault(Fault::Delete, true);
        assert!(admin.delete_check_ins(&[record.id]).await.is_err());
    }

    #[tokio::test]
    async fn test_list_check_ins_newest_first() {
        let (admin, checkin, memory) = services();
        let first = seed_roster(&memory, "Joko", "Staf", "SKST").await;
        let second = seed_roster(&memory, "Kiki", "Staf", "SKST").await;
        checkin.submit(&first.id, &signature_uri()).await.unwrap();
        checkin.submit(&second.id, &signature_uri()).await.unwrap();

        let list = admin.list_check_ins().await.unwrap();
        assert_eq!(list.len(), 2);
        assert!(list[0].check_in >= list[1].check_in);
        assert_eq!(admin.departments().len(), hadir_config::DEFAULT_DEPARTMENTS.len());
    }
}
