//! Process-local backend
//!
//! Tables are vectors of JSON rows behind a tokio `RwLock`; every insert and
//! delete is published on a broadcast channel that subscriptions filter.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tokio::sync::{RwLock, broadcast, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{StoreError, UNIQUE_VIOLATION};
use crate::feed::{ChangeEvent, ChangeKind, SUBSCRIPTION_BUFFER, Subscription};
use crate::query::{Collection, Query, Row};
use crate::{BlobStore, ChangeFeed, RecordStore, UploadOptions};

/// Base of public blob URLs handed out by the memory backend
pub const DEFAULT_PUBLIC_BASE: &str = "http://localhost:54321";

const EVENT_CAPACITY: usize = 256;

/// Operations that can be made to fail on purpose
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Query,
    Insert,
    Delete,
    Upload,
    RemoveBlobs,
}

#[derive(Default)]
struct Faults {
    query: AtomicBool,
    insert: AtomicBool,
    delete: AtomicBool,
    upload: AtomicBool,
    remove_blobs: AtomicBool,
}

impl Faults {
    fn flag(&self, fault: Fault) -> &AtomicBool {
        match fault {
            Fault::Query => &self.query,
            Fault::Insert => &self.insert,
            Fault::Delete => &self.delete,
            Fault::Upload => &self.upload,
            Fault::RemoveBlobs => &self.remove_blobs,
        }
    }
}

struct StoredBlob {
    bytes: Vec<u8>,
    content_type: String,
}

struct Inner {
    tables: RwLock<HashMap<Collection, Vec<Row>>>,
    blobs: RwLock<HashMap<String, StoredBlob>>,
    changes: broadcast::Sender<ChangeEvent>,
    faults: Faults,
    public_base: String,
}

/// In-memory records, blobs and change feed
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_public_base(DEFAULT_PUBLIC_BASE)
    }

    pub fn with_public_base(base: &str) -> Self {
        let (changes, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                tables: RwLock::new(HashMap::new()),
                blobs: RwLock::new(HashMap::new()),
                changes,
                faults: Faults::default(),
                public_base: base.trim_end_matches('/').to_string(),
            }),
        }
    }

    /// Make `fault` fail with a network error until cleared
    pub fn set_fault(&self, fault: Fault, enabled: bool) {
        self.inner.faults.flag(fault).store(enabled, Ordering::SeqCst);
    }

    /// Stored object bytes and content type
    pub async fn blob(&self, bucket: &str, path: &str) -> Option<(Vec<u8>, String)> {
        self.inner
            .blobs
            .read()
            .await
            .get(&blob_key(bucket, path))
            .map(|b| (b.bytes.clone(), b.content_type.clone()))
    }

    pub async fn blob_count(&self) -> usize {
        self.inner.blobs.read().await.len()
    }

    pub async fn row_count(&self, collection: Collection) -> usize {
        self.inner
            .tables
            .read()
            .await
            .get(&collection)
            .map_or(0, Vec::len)
    }

    fn check(&self, fault: Fault) -> Result<(), StoreError> {
        if self.inner.faults.flag(fault).load(Ordering::SeqCst) {
            return Err(StoreError::Network(format!("injected {fault:?} failure")));
        }
        Ok(())
    }

    fn publish(&self, event: ChangeEvent) {
        // No receivers is fine
        let _ = self.inner.changes.send(event);
    }
}

fn blob_key(bucket: &str, path: &str) -> String {
    format!("{}/{}", bucket, path.trim_start_matches('/'))
}

fn is_missing(row: &Row, column: &str) -> bool {
    row.get(column).is_none_or(Value::is_null)
}

impl RecordStore for MemoryBackend {
    async fn query(&self, query: &Query) -> Result<Vec<Row>, StoreError> {
        self.check(Fault::Query)?;
        let tables = self.inner.tables.read().await;
        let rows = tables
            .get(&query.collection)
            .map(|rows| query.apply(rows))
            .unwrap_or_default();
        Ok(rows)
    }

    async fn insert(&self, collection: Collection, mut record: Row) -> Result<Row, StoreError> {
        self.check(Fault::Insert)?;

        if is_missing(&record, "id") {
            record.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
        }
        let stamp = collection.timestamp_column();
        if is_missing(&record, stamp) {
            record.insert(
                stamp.into(),
                Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
            );
        }

        let mut tables = self.inner.tables.write().await;
        let rows = tables.entry(collection).or_default();

        let mut unique = vec!["id"];
        unique.extend_from_slice(collection.unique_columns());
        for column in unique {
            let Some(value) = record.get(column).filter(|v| !v.is_null()) else {
                continue;
            };
            if rows.iter().any(|row| row.get(column) == Some(value)) {
                return Err(StoreError::from_backend(
                    Some(UNIQUE_VIOLATION),
                    &format!(
                        "duplicate key value violates unique constraint \"{}_{}_key\"",
                        collection.table(),
                        column
                    ),
                ));
            }
        }

        rows.push(record.clone());
        drop(tables);

        debug!("Inserted row into {}", collection.table());
        self.publish(ChangeEvent {
            collection,
            kind: ChangeKind::Insert,
            record: record.clone(),
        });
        Ok(record)
    }

    async fn delete(&self, collection: Collection, ids: &[String]) -> Result<usize, StoreError> {
        self.check(Fault::Delete)?;
        if ids.is_empty() {
            return Ok(0);
        }

        let mut removed = Vec::new();
        {
            let mut tables = self.inner.tables.write().await;
            if let Some(rows) = tables.get_mut(&collection) {
                rows.retain(|row| {
                    let hit = row
                        .get("id")
                        .and_then(Value::as_str)
                        .is_some_and(|id| ids.iter().any(|wanted| wanted == id));
                    if hit {
                        removed.push(row.clone());
                    }
                    !hit
                });
            }
        }

        debug!("Deleted {} rows from {}", removed.len(), collection.table());
        let count = removed.len();
        for record in removed {
            self.publish(ChangeEvent {
                collection,
                kind: ChangeKind::Delete,
                record,
            });
        }
        Ok(count)
    }
}

impl BlobStore for MemoryBackend {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        options: UploadOptions,
    ) -> Result<(), StoreError> {
        self.check(Fault::Upload)?;
        let key = blob_key(bucket, path);
        let mut blobs = self.inner.blobs.write().await;
        if !options.overwrite && blobs.contains_key(&key) {
            return Err(StoreError::Duplicate(format!(
                "The resource already exists: {key}"
            )));
        }
        debug!("Stored blob {} ({} bytes)", key, bytes.len());
        blobs.insert(
            key,
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}",
            self.inner.public_base,
            blob_key(bucket, path)
        )
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<usize, StoreError> {
        self.check(Fault::RemoveBlobs)?;
        let mut blobs = self.inner.blobs.write().await;
        let removed = paths
            .iter()
            .filter(|path| blobs.remove(&blob_key(bucket, path)).is_some())
            .count();
        Ok(removed)
    }
}

impl ChangeFeed for MemoryBackend {
    async fn subscribe(
        &self,
        collection: Collection,
        kinds: &[ChangeKind],
    ) -> Result<Subscription, StoreError> {
        let mut changes = self.inner.changes.subscribe();
        let kinds = kinds.to_vec();
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);

        let task = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(event) => {
                        if event.collection != collection || !kinds.contains(&event.kind) {
                            continue;
                        }
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Memory change feed lagged, {} events skipped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("Memory subscription on {} ended", collection.table());
        });

        Ok(Subscription::new(rx, task))
    }
}
