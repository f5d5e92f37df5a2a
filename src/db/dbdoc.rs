use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::sqlite::{Sqlite, SqlitePool, SqlitePoolOptions};
use sqlx::types::Json;
use sqlx::{Error as SqlxError, Executor, Row};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::models::Version;

/// Document row from database
#[derive(Debug, Clone)]
pub struct DocumentRow {
    pub id: String,
    pub content: Value,
    pub comments: Vec<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database connection pool
pub struct DbDoc {
    pool: SqlitePool,
}

impl DbDoc {
    /// Create a new database connection pool
    ///
    /// # Arguments
    /// * `database_url` - SQLite connection string
    /// * `max_connections` - Upper bound on pooled connections
    ///
    /// # Returns
    /// * `Result<Self, SqlxError>` - Database connection pool or error
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, SqlxError> {
        info!("Connecting to database...");

        let options = if database_url.contains(":memory:") {
            // An in-memory database lives and dies with its single connection
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .acquire_timeout(Duration::from_secs(30))
                .idle_timeout(Duration::from_secs(600))
                .max_lifetime(Duration::from_secs(1800))
        };
        let pool = options.connect(database_url).await?;

        info!("Database connection pool created successfully");

        Ok(Self { pool })
    }

    /// Create the tables if they are missing
    pub async fn init_schema(&self) -> Result<(), SqlxError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                comments TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS document_versions (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                document TEXT NOT NULL,
                version_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                content TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_document_versions_document
                ON document_versions(document, seq);
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Database schema ready");
        Ok(())
    }

    /// Round-trip to the database, used by the readiness probe
    pub async fn ping(&self) -> Result<(), SqlxError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Load a document row and its versions inside one read transaction
    pub async fn load_document_with_versions(
        &self,
        document_id: &str,
    ) -> Result<Option<(DocumentRow, Vec<Version>)>, SqlxError> {
        let mut tx = self.pool.begin().await?;
        let Some(row) = fetch_document(&mut *tx, document_id).await? else {
            tx.commit().await?;
            return Ok(None);
        };
        let versions = fetch_versions(&mut *tx, document_id).await?;
        tx.commit().await?;
        Ok(Some((row, versions)))
    }

    /// Upsert the content of a document and optionally append a version
    ///
    /// # Arguments
    /// * `document_id` - Document identifier
    /// * `content` - The full snapshot to store
    /// * `version` - Version entry to append, if any
    /// * `now` - Timestamp of this write
    pub async fn upsert_document(
        &self,
        document_id: &str,
        content: &Value,
        version: Option<&Version>,
        now: DateTime<Utc>,
    ) -> Result<(), SqlxError> {
        let pool_idle = self.pool.num_idle() as u32;
        let pool_size = self.pool.size();
        debug!(
            "Writing document {}. Pool connections: {} idle, {} in use",
            document_id,
            pool_idle,
            pool_size.saturating_sub(pool_idle)
        );

        let mut tx = match self.pool.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                error!(
                    "Failed to acquire connection from pool for document {}: {}. Pool state: {} idle, {} total",
                    document_id,
                    e,
                    self.pool.num_idle(),
                    self.pool.size()
                );
                return Err(e);
            }
        };

        sqlx::query(
            r#"
            INSERT INTO documents (id, content, comments, created_at, updated_at)
            VALUES (?1, ?2, '[]', ?3, ?3)
            ON CONFLICT(id) DO UPDATE SET
                content = excluded.content,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(document_id)
        .bind(Json(content))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if let Some(version) = version {
            sqlx::query(
                r#"
                INSERT INTO document_versions (document, version_id, created_at, content)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(document_id)
            .bind(&version.version_id)
            .bind(version.created_at)
            .bind(Json(&version.content))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// List the versions of a document in insertion order
    pub async fn load_versions(&self, document_id: &str) -> Result<Vec<Version>, SqlxError> {
        fetch_versions(&self.pool, document_id).await
    }

    /// Close the pool; later calls fail with `PoolClosed`
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}

async fn fetch_document<'e, E>(executor: E, document_id: &str) -> Result<Option<DocumentRow>, SqlxError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        r#"
        SELECT id, content, comments, created_at, updated_at
        FROM documents
        WHERE id = ?1
        "#,
    )
    .bind(document_id)
    .fetch_optional(executor)
    .await?;

    match row {
        Some(row) => {
            let content: Json<Value> = row.try_get("content")?;
            let comments: Json<Vec<Value>> = row.try_get("comments")?;
            Ok(Some(DocumentRow {
                id: row.try_get("id")?,
                content: content.0,
                comments: comments.0,
                created_at: row.try_get("created_at")?,
                updated_at: row.try_get("updated_at")?,
            }))
        }
        None => Ok(None),
    }
}

async fn fetch_versions<'e, E>(executor: E, document_id: &str) -> Result<Vec<Version>, SqlxError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        r#"
        SELECT version_id, created_at, content
        FROM document_versions
        WHERE document = ?1
        ORDER BY seq ASC
        "#,
    )
    .bind(document_id)
    .fetch_all(executor)
    .await?;

    rows.into_iter()
        .map(|row| {
            let content: Json<Value> = row.try_get("content")?;
            Ok(Version {
                version_id: row.try_get("version_id")?,
                created_at: row.try_get("created_at")?,
                content: content.0,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn setup_test_db() -> DbDoc {
        let db = DbDoc::connect("sqlite::memory:", 1).await.unwrap();
        db.init_schema().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_missing_document_is_none() {
        let db = setup_test_db().await;
        assert!(db.load_document_with_versions("nope").await.unwrap().is_none());
        assert!(db.load_versions("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_keeps_created_at() {
        let db = setup_test_db().await;
        let first = Utc::now();
        db.upsert_document("d", &json!({"v": 1}), None, first).await.unwrap();

        let later = first + chrono::Duration::seconds(5);
        db.upsert_document("d", &json!({"v": 2}), None, later).await.unwrap();

        let (row, _) = db.load_document_with_versions("d").await.unwrap().unwrap();
        assert_eq!(row.content, json!({"v": 2}));
        assert_eq!(row.created_at, first);
        assert_eq!(row.updated_at, later);
        assert!(row.comments.is_empty());
    }

    #[tokio::test]
    async fn test_versions_are_scoped_to_document() {
        let db = setup_test_db().await;
        let now = Utc::now();
        let version = Version {
            version_id: "v1".to_string(),
            created_at: now,
            content: json!("a"),
        };
        db.upsert_document("a", &json!("a"), Some(&version), now).await.unwrap();
        db.upsert_document("b", &json!("b"), None, now).await.unwrap();

        assert_eq!(db.load_versions("a").await.unwrap(), vec![version]);
        assert!(db.load_versions("b").await.unwrap().is_empty());

        let (row, versions) = db.load_document_with_versions("a").await.unwrap().unwrap();
        assert_eq!(row.content, json!("a"));
        assert_eq!(versions.len(), 1);
        assert!(db.load_document_with_versions("c").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_closed_pool_rejects_queries() {
        let db = setup_test_db().await;
        db.close().await;
        assert!(matches!(db.ping().await, Err(SqlxError::PoolClosed)));
    }
}
