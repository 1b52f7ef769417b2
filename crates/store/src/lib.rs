//! Backend-as-a-service access for Hadir
//!
//! Records, blobs and change notifications sit behind three traits so the
//! service can run against process-local tables or a Supabase project.

mod backend;
mod error;
mod feed;
mod memory;
mod query;
mod supabase;

pub use backend::Backend;
pub use error::{StoreError, StoreErrorKind, UNIQUE_VIOLATION};
pub use feed::{ChangeEvent, ChangeKind, SUBSCRIPTION_BUFFER, Subscription};
pub use memory::{Fault, MemoryBackend};
pub use query::{Collection, Filter, Order, Query, Row, compare_values};
pub use supabase::SupabaseBackend;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Upload behaviour
#[derive(Debug, Clone, Copy, Default)]
pub struct UploadOptions {
    /// Replace an existing object at the same path
    pub overwrite: bool,
}

/// Tabular records
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    /// Rows matching `query`
    async fn query(&self, query: &Query) -> Result<Vec<Row>, StoreError>;

    /// Insert one row and return it as stored (with server-assigned fields)
    ///
    /// A uniqueness violation is reported as [`StoreError::Duplicate`].
    async fn insert(&self, collection: Collection, record: Row) -> Result<Row, StoreError>;

    /// Delete rows by id; returns how many were removed
    async fn delete(&self, collection: Collection, ids: &[String]) -> Result<usize, StoreError>;
}

/// Binary objects addressed by bucket and path
#[allow(async_fn_in_trait)]
pub trait BlobStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        options: UploadOptions,
    ) -> Result<(), StoreError>;

    /// Publicly reachable URL of an object (no existence check)
    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Remove objects; paths that do not exist are skipped
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<usize, StoreError>;
}

/// Insert/delete notifications
#[allow(async_fn_in_trait)]
pub trait ChangeFeed {
    async fn subscribe(
        &self,
        collection: Collection,
        kinds: &[ChangeKind],
    ) -> Result<Subscription, StoreError>;
}

/// Query and deserialize rows
pub async fn fetch<T, S>(store: &S, query: &Query) -> Result<Vec<T>, StoreError>
where
    T: DeserializeOwned,
    S: RecordStore,
{
    store
        .query(query)
        .await?
        .into_iter()
        .map(from_row)
        .collect()
}

/// Serialize, insert and deserialize the stored row
pub async fn insert_as<T, R, S>(store: &S, collection: Collection, record: &R) -> Result<T, StoreError>
where
    T: DeserializeOwned,
    R: Serialize,
    S: RecordStore,
{
    let row = to_row(record)?;
    let stored = store.insert(collection, row).await?;
    Ok(serde_json::from_value(Value::Object(stored))?)
}

/// Serialize a record into a row
pub fn to_row<R: Serialize>(record: &R) -> Result<Row, StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(row) => Ok(row),
        other => Err(StoreError::Backend {
            code: String::new(),
            message: format!("record is not an object: {other}"),
        }),
    }
}

/// Deserialize a change-event row
pub fn from_row<T: DeserializeOwned>(row: Row) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(row))?)
}
