//! PostgREST records and Storage objects

use serde_json::{Value, json};
use tracing::debug;

use super::{SupabaseBackend, check};
use crate::error::StoreError;
use crate::query::{Collection, Query, Row};
use crate::{BlobStore, RecordStore, UploadOptions};

impl SupabaseBackend {
    fn rest_url(&self, collection: Collection) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection.table())
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            bucket,
            path.trim_start_matches('/')
        )
    }
}

/// `id=in.(...)` filter for a delete
fn id_filter(ids: &[String]) -> Vec<(String, String)> {
    let query = Query::new(Collection::DaftarHadir).is_in("id", ids.iter().cloned());
    query
        .to_params()
        .into_iter()
        .filter(|(key, _)| key == "id")
        .collect()
}

impl RecordStore for SupabaseBackend {
    async fn query(&self, query: &Query) -> Result<Vec<Row>, StoreError> {
        let response = self
            .authed(self.http.get(self.rest_url(query.collection)))
            .query(&query.to_params())
            .send()
            .await?;
        let rows: Vec<Row> = check(response).await?.json().await?;
        debug!("{} rows from {}", rows.len(), query.collection.table());
        Ok(rows)
    }

    async fn insert(&self, collection: Collection, record: Row) -> Result<Row, StoreError> {
        let response = self
            .authed(self.http.post(self.rest_url(collection)))
            .header("Prefer", "return=representation")
            .json(&[Value::Object(record)])
            .send()
            .await?;
        let mut rows: Vec<Row> = check(response).await?.json().await?;
        rows.pop().ok_or_else(|| StoreError::Backend {
            code: String::new(),
            message: format!("insert into {} returned no row", collection.table()),
        })
    }

    async fn delete(&self, collection: Collection, ids: &[String]) -> Result<usize, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let response = self
            .authed(self.http.delete(self.rest_url(collection)))
            .header("Prefer", "return=representation")
            .query(&id_filter(ids))
            .send()
            .await?;
        let rows: Vec<Value> = check(response).await?.json().await?;
        debug!("Deleted {} rows from {}", rows.len(), collection.table());
        Ok(rows.len())
    }
}

impl BlobStore for SupabaseBackend {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        options: UploadOptions,
    ) -> Result<(), StoreError> {
        let size = bytes.len();
        let response = self
            .authed(self.http.post(self.object_url(bucket, path)))
            .header("Content-Type", content_type)
            .header("x-upsert", if options.overwrite { "true" } else { "false" })
            .body(bytes)
            .send()
            .await?;
        check(response).await?;
        debug!("Uploaded {}/{} ({} bytes)", bucket, path, size);
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            bucket,
            path.trim_start_matches('/')
        )
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<usize, StoreError> {
        if paths.is_empty() {
            return Ok(0);
        }
        let response = self
            .authed(
                self.http
                    .delete(format!("{}/storage/v1/object/{}", self.base_url, bucket)),
            )
            .json(&json!({ "prefixes": paths }))
            .send()
            .await?;
        let removed: Vec<Value> = check(response).await?.json().await?;
        Ok(removed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_urls() {
        let backend = SupabaseBackend::new("https://x.supabase.co/", "k", Duration::from_secs(30));
        assert_eq!(
            backend.rest_url(Collection::DaftarHadir),
            "https://x.supabase.co/rest/v1/daftar_hadir"
        );
        assert_eq!(
            backend.object_url("ttd", "/p/1.jpg"),
            "https://x.supabase.co/storage/v1/object/ttd/p/1.jpg"
        );
        assert_eq!(
            backend.public_url("ttd", "p/1.jpg"),
            "https://x.supabase.co/storage/v1/object/public/ttd/p/1.jpg"
        );
    }

    #[test]
    fn test_id_filter() {
        let params = id_filter(&["a".into(), "b".into()]);
        assert_eq!(params, vec![("id".to_string(), r#"in.("a","b")"#.to_string())]);
    }
}
