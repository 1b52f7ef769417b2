//! Backend selection

use hadir_config::{BackendConfig, BackendKind};
use tracing::info;

use crate::error::StoreError;
use crate::feed::{ChangeKind, Subscription};
use crate::memory::MemoryBackend;
use crate::query::{Collection, Query, Row};
use crate::supabase::SupabaseBackend;
use crate::{BlobStore, ChangeFeed, RecordStore, UploadOptions};

/// The configured backend; one handle serves records, blobs and changes
#[derive(Clone)]
pub enum Backend {
    Memory(MemoryBackend),
    Supabase(SupabaseBackend),
}

impl Backend {
    pub fn from_config(config: &BackendConfig) -> Result<Self, StoreError> {
        let backend = match config.kind {
            BackendKind::Memory => Self::Memory(MemoryBackend::new()),
            BackendKind::Supabase => Self::Supabase(SupabaseBackend::from_config(config)?),
        };
        info!("Using {} backend", backend.name());
        Ok(backend)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Supabase(_) => "supabase",
        }
    }

    /// The in-memory backend, if that is what is running
    pub fn as_memory(&self) -> Option<&MemoryBackend> {
        match self {
            Self::Memory(memory) => Some(memory),
            Self::Supabase(_) => None,
        }
    }
}

impl From<MemoryBackend> for Backend {
    fn from(memory: MemoryBackend) -> Self {
        Self::Memory(memory)
    }
}

impl RecordStore for Backend {
    async fn query(&self, query: &Query) -> Result<Vec<Row>, StoreError> {
        match self {
            Self::Memory(b) => b.query(query).await,
            Self::Supabase(b) => b.query(query).await,
        }
    }

    async fn insert(&self, collection: Collection, record: Row) -> Result<Row, StoreError> {
        match self {
            Self::Memory(b) => b.insert(collection, record).await,
            Self::Supabase(b) => b.insert(collection, record).await,
        }
    }

    async fn delete(&self, collection: Collection, ids: &[String]) -> Result<usize, StoreError> {
        match self {
            Self::Memory(b) => b.delete(collection, ids).await,
            Self::Supabase(b) => b.delete(collection, ids).await,
        }
    }
}

impl BlobStore for Backend {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        options: UploadOptions,
    ) -> Result<(), StoreError> {
        match self {
            Self::Memory(b) => b.upload(bucket, path, bytes, content_type, options).await,
            Self::Supabase(b) => b.upload(bucket, path, bytes, content_type, options).await,
        }
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        match self {
            Self::Memory(b) => b.public_url(bucket, path),
            Self::Supabase(b) => b.public_url(bucket, path),
        }
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<usize, StoreError> {
        match self {
            Self::Memory(b) => b.remove(bucket, paths).await,
            Self::Supabase(b) => b.remove(bucket, paths).await,
        }
    }
}

impl ChangeFeed for Backend {
    async fn subscribe(
        &self,
        collection: Collection,
        kinds: &[ChangeKind],
    ) -> Result<Subscription, StoreError> {
        match self {
            Self::Memory(b) => b.subscribe(collection, kinds).await,
            Self::Supabase(b) => b.subscribe(collection, kinds).await,
        }
    }
}
