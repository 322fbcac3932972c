//! sqlx-backed status store
//!
//! Works against Postgres and SQLite through the `Any` driver. Timestamps
//! are stored as ISO-8601 text so both backends share one schema and one set
//! of queries.

use async_trait::async_trait;
use rally_relay_core::StatusCheck;
use sqlx::any::{install_default_drivers, AnyPoolOptions};
use sqlx::{AnyPool, Row};
use tracing::{debug, info, instrument};

use crate::error::{DbError, DbResult};
use crate::store::{StatusStore, MAX_LIST_LIMIT};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS status_checks (
    id TEXT PRIMARY KEY,
    client_name TEXT NOT NULL,
    "timestamp" TEXT NOT NULL
)
"#;

const INSERT_CHECK: &str =
    r#"INSERT INTO status_checks (id, client_name, "timestamp") VALUES ($1, $2, $3)"#;

// No ORDER BY: the table is append-only and is read in natural order
const SELECT_CHECKS: &str = r#"SELECT id, client_name, "timestamp" FROM status_checks LIMIT $1"#;

/// Connection settings for [`SqlStatusStore`]
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Connection URL (`postgres://...`, `sqlite://...`, `sqlite::memory:`)
    pub url: String,

    /// Pool size; in-memory SQLite is always pinned to a single connection
    pub max_connections: u32,
}

impl StoreOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// Apply a separately configured database name to a connection URL.
///
/// Only Postgres URLs carry a database name in their path; for other
/// schemes the name is ignored and the URL is returned unchanged.
pub fn resolve_database_url(url: &str, db_name: Option<&str>) -> DbResult<String> {
    let mut parsed = url::Url::parse(url).map_err(|e| DbError::InvalidUrl(e.to_string()))?;

    let Some(name) = db_name.filter(|n| !n.is_empty()) else {
        return Ok(url.to_string());
    };

    match parsed.scheme() {
        "postgres" | "postgresql" => {
            parsed.set_path(&format!("/{name}"));
            Ok(parsed.to_string())
        }
        scheme => {
            debug!(scheme, db_name = name, "Database name ignored for this scheme");
            Ok(url.to_string())
        }
    }
}

/// Status store backed by a sqlx connection pool
#[derive(Clone)]
pub struct SqlStatusStore {
    pool: AnyPool,
}

impl SqlStatusStore {
    /// Connect and make sure the schema exists
    #[instrument(skip(options), fields(max_connections = options.max_connections))]
    pub async fn connect(options: &StoreOptions) -> DbResult<Self> {
        install_default_drivers();

        let mut pool_options = AnyPoolOptions::new().max_connections(options.max_connections);
        if options.is_in_memory() {
            // Each SQLite memory connection is its own database
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options.connect(&options.url).await?;
        let store = Self { pool };
        store.migrate().await?;

        info!("Connected to status store");
        Ok(store)
    }

    /// Create the `status_checks` table if it is missing
    pub async fn migrate(&self) -> DbResult<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        debug!("Status store schema ready");
        Ok(())
    }

    /// Close the pool, waiting for checked-out connections to return
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Status store closed");
    }
}

#[async_trait]
impl StatusStore for SqlStatusStore {
    #[instrument(skip(self, check), fields(id = %check.id))]
    async fn insert(&self, check: &StatusCheck) -> DbResult<()> {
        sqlx::query(INSERT_CHECK)
            .bind(check.id.clone())
            .bind(check.client_name.clone())
            .bind(check.timestamp_iso())
            .execute(&self.pool)
            .await?;

        debug!("Inserted status check");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self, limit: i64) -> DbResult<Vec<StatusCheck>> {
        let limit = limit.clamp(0, MAX_LIST_LIMIT);

        let rows = sqlx::query(SELECT_CHECKS)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let checks = rows
            .iter()
            .map(|row| {
                let id: String = row.try_get(0)?;
                let client_name: String = row.try_get(1)?;
                let timestamp: String = row.try_get(2)?;

                StatusCheck::from_stored(id.clone(), client_name, &timestamp).map_err(|e| {
                    DbError::CorruptRecord {
                        id,
                        reason: e.to_string(),
                    }
                })
            })
            .collect::<DbResult<Vec<_>>>()?;

        debug!(count = checks.len(), "Listed status checks");
        Ok(checks)
    }

    async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    async fn memory_store() -> SqlStatusStore {
        SqlStatusStore::connect(&StoreOptions::new("sqlite::memory:"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_list_in_order() {
        let store = memory_store().await;

        let names = ["alice", "bob", "carol"];
        let mut created = Vec::new();
        for name in names {
            let check = StatusCheck::new(name);
            store.insert(&check).await.unwrap();
            created.push(check);
        }

        let listed = store.list(MAX_LIST_LIMIT).await.unwrap();
        assert_eq!(listed, created);
    }

    #[tokio::test]
    async fn test_list_respects_limit() {
        let store = memory_store().await;
        for i in 0..5 {
            store.insert(&StatusCheck::new(format!("client-{i}"))).await.unwrap();
        }

        let listed = store.list(2).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].client_name, "client-0");
    }

    #[tokio::test]
    async fn test_list_is_capped() {
        let store = memory_store().await;
        for i in 0..(MAX_LIST_LIMIT + 5) {
            store.insert(&StatusCheck::new(format!("c{i}"))).await.unwrap();
        }

        let listed = store.list(i64::MAX).await.unwrap();
        assert_eq!(listed.len() as i64, MAX_LIST_LIMIT);
    }

    #[tokio::test]
    async fn test_corrupt_timestamp_is_reported() {
        let store = memory_store().await;
        sqlx::query(INSERT_CHECK)
            .bind("bad-1".to_string())
            .bind("mallory".to_string())
            .bind("not a time".to_string())
            .execute(&store.pool)
            .await
            .unwrap();

        let err = store.list(10).await.unwrap_err();
        assert!(matches!(err, DbError::CorruptRecord { ref id, .. } if id == "bad-1"));
    }

    #[tokio::test]
    async fn test_stored_timestamp_is_iso_text() {
        let store = memory_store().await;
        let check = StatusCheck::new("alice");
        store.insert(&check).await.unwrap();

        let row = sqlx::query(r#"SELECT "timestamp" FROM status_checks"#)
            .fetch_one(&store.pool)
            .await
            .unwrap();
        let text: String = row.try_get(0).unwrap();
        assert!(text.ends_with("+00:00"));
        assert!(text.starts_with(&Utc::now().format("%Y-").to_string()));
    }

    #[tokio::test]
    async fn test_ping_and_close() {
        let store = memory_store().await;
        store.ping().await.unwrap();
        store.close().await;
        assert!(store.ping().await.is_err());
    }

    #[test]
    fn test_resolve_postgres_database_name() {
        let url = resolve_database_url("postgres://u:p@db:5432/postgres", Some("rally")).unwrap();
        assert_eq!(url, "postgres://u:p@db:5432/rally");
    }

    #[test]
    fn test_resolve_keeps_url_without_name() {
        let url = resolve_database_url("postgres://db/app", None).unwrap();
        assert_eq!(url, "postgres://db/app");
        let url = resolve_database_url("postgres://db/app", Some("")).unwrap();
        assert_eq!(url, "postgres://db/app");
    }

    #[test]
    fn test_resolve_ignores_name_for_sqlite() {
        let url = resolve_database_url("sqlite::memory:", Some("rally")).unwrap();
        assert_eq!(url, "sqlite::memory:");
    }

    #[test]
    fn test_resolve_rejects_garbage() {
        assert!(matches!(
            resolve_database_url("not a url", None),
            Err(DbError::InvalidUrl(_))
        ));
    }
}
