use chrono::Utc;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::db::dbdoc::DbDoc;
use crate::models::{Document, Version};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store call '{op}' timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },
}

/// Canonical document storage.
///
/// Every call is bounded by `timeout`. Writes are plain upserts: two
/// concurrent puts race and the one that lands last owns `content`, while
/// each requested version entry is appended independently.
pub struct DocStore {
    db: DbDoc,
    timeout: Duration,
}

impl DocStore {
    pub fn new(db: DbDoc, timeout: Duration) -> Self {
        Self { db, timeout }
    }

    /// Connect to `database_url` and make sure the schema exists
    pub async fn open(database_url: &str, max_connections: u32, timeout: Duration) -> Result<Self, StoreError> {
        let db = DbDoc::connect(database_url, max_connections).await?;
        db.init_schema().await?;
        Ok(Self::new(db, timeout))
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(|e| {
                error!("Store call '{}' failed: {}", op, e);
                StoreError::Database(e)
            }),
            Err(_) => {
                error!("Store call '{}' timed out after {:?}", op, self.timeout);
                Err(StoreError::Timeout { op, after: self.timeout })
            }
        }
    }

    /// Fetch a document. A document that was never written is not an error,
    /// it comes back as the empty shape.
    pub async fn get_document(&self, id: &str) -> Result<Document, StoreError> {
        let loaded = self.bounded("get_document", self.db.load_document_with_versions(id)).await?;
        let Some((row, versions)) = loaded else {
            return Ok(Document::empty(id));
        };
        Ok(Document {
            id: row.id,
            content: row.content,
            versions,
            comments: row.comments,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }

    /// Upsert `content`; with `create_version` also append a snapshot to the version log
    pub async fn put_document(&self, id: &str, content: Value, create_version: bool) -> Result<Option<Version>, StoreError> {
        let now = Utc::now();
        let version = create_version.then(|| Version {
            version_id: Uuid::new_v4().to_string(),
            created_at: now,
            content: content.clone(),
        });

        self.bounded("put_document", self.db.upsert_document(id, &content, version.as_ref(), now))
            .await?;

        match &version {
            Some(v) => info!("Document '{}' saved with version {}", id, v.version_id),
            None => info!("Document '{}' saved", id),
        }
        Ok(version)
    }

    /// Only the version log, oldest first
    pub async fn list_versions(&self, id: &str) -> Result<Vec<Version>, StoreError> {
        self.bounded("list_versions", self.db.load_versions(id)).await
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.bounded("ping", self.db.ping()).await
    }

    pub async fn close(&self) {
        self.db.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    async fn setup_store() -> DocStore {
        DocStore::open("sqlite::memory:", 1, Duration::from_secs(5)).await.unwrap()
    }

    #[tokio::test]
    async fn test_get_missing_returns_empty_shape() {
        let store = setup_store().await;
        let doc = store.get_document("main-doc-1").await.unwrap();
        assert_eq!(doc, Document::empty("main-doc-1"));
    }

    #[tokio::test]
    async fn test_read_your_write() {
        let store = setup_store().await;
        let content = json!({"type": "doc", "content": [{"type": "paragraph"}]});
        store.put_document("d", content.clone(), false).await.unwrap();

        let doc = store.get_document("d").await.unwrap();
        assert_eq!(doc.content, content);
        assert!(doc.versions.is_empty());
        assert!(doc.comments.is_empty());
        assert!(doc.created_at.is_some());
        assert!(doc.updated_at >= doc.created_at);
    }

    #[tokio::test]
    async fn test_sequential_versions_in_call_order() {
        let store = setup_store().await;
        for i in 0..5 {
            store.put_document("d", json!({ "n": i }), true).await.unwrap();
        }

        let versions = store.list_versions("d").await.unwrap();
        assert_eq!(versions.len(), 5);
        for (i, v) in versions.iter().enumerate() {
            assert_eq!(v.content, json!({ "n": i }));
        }

        // Ids stay unique even when saves share a millisecond
        let mut ids: Vec<_> = versions.iter().map(|v| v.version_id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[tokio::test]
    async fn test_put_without_version_keeps_log() {
        let store = setup_store().await;
        store.put_document("d", json!("one"), true).await.unwrap();
        store.put_document("d", json!("two"), false).await.unwrap();

        let doc = store.get_document("d").await.unwrap();
        assert_eq!(doc.content, json!("two"));
        assert_eq!(doc.versions.len(), 1);
        assert_eq!(doc.versions[0].content, json!("one"));
    }

    #[tokio::test]
    async fn test_concurrent_puts_pick_one_winner() {
        let store = Arc::new(setup_store().await);
        let c1 = json!({"author": "one"});
        let c2 = json!({"author": "two"});

        let (r1, r2) = tokio::join!(
            store.put_document("d", c1.clone(), true),
            store.put_document("d", c2.clone(), true),
        );
        r1.unwrap();
        r2.unwrap();

        let doc = store.get_document("d").await.unwrap();
        assert!(doc.content == c1 || doc.content == c2);
        assert_eq!(doc.versions.len(), 2);
        let contents: Vec<_> = doc.versions.iter().map(|v| v.content.clone()).collect();
        assert!(contents.contains(&c1));
        assert!(contents.contains(&c2));
    }

    #[tokio::test]
    async fn test_timeout_surfaces_as_error() {
        let db = DbDoc::connect("sqlite::memory:", 1).await.unwrap();
        db.init_schema().await.unwrap();
        let store = DocStore::new(db, Duration::ZERO);

        let result = store.bounded("slow", async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, sqlx::Error>(())
        }).await;
        assert!(matches!(result, Err(StoreError::Timeout { op: "slow", .. })));
    }
}
