//! SQLite catalog store.
//!
//! One row per `(provider_id, model_id)`. The pricing policy is stored as its
//! tagged JSON form, timestamps as RFC 3339 text. All statements run on the
//! blocking pool against a single connection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pricewise_core::{
    CatalogChange, CatalogEntry, CatalogKey, CatalogPatch, CatalogStore, CoreError, ModelLimits,
    PricingPolicy,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::persistence::{ensure_parent_dir, set_restrictive_permissions};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS catalog (
    provider_id   TEXT    NOT NULL,
    model_id      TEXT    NOT NULL,
    provider_name TEXT    NOT NULL,
    model_name    TEXT    NOT NULL,
    pricing       TEXT    NOT NULL,
    context_limit INTEGER NOT NULL DEFAULT 0,
    output_limit  INTEGER NOT NULL DEFAULT 0,
    last_updated  TEXT    NOT NULL,
    PRIMARY KEY (provider_id, model_id)
);
";

const SELECT_COLUMNS: &str = "SELECT provider_id, model_id, provider_name, model_name, pricing, \
     context_limit, output_limit, last_updated FROM catalog";

// ============================================================================
// Store
// ============================================================================

/// Catalog persisted in a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalogStore {
    /// Opens (or creates) the catalog database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created, or
    /// [`StoreError::Database`] if the database cannot be opened.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        ensure_parent_dir(path).await?;

        let db_path = path.to_path_buf();
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection, StoreError> {
            let conn = Connection::open(&db_path)?;
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        })
        .await
        .map_err(|e| StoreError::TaskFailed(e.to_string()))??;

        set_restrictive_permissions(path).await?;
        info!(path = %path.display(), "Opened catalog database");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if SQLite cannot be initialised.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::TaskFailed("catalog connection poisoned".to_string()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::TaskFailed(e.to_string()))?
    }
}

// ============================================================================
// Row Mapping
// ============================================================================

fn limit_to_sql(value: u64, column: &str) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| {
        CoreError::Validation(format!("{column} {value} exceeds the storable maximum {}", i64::MAX))
            .into()
    })
}

fn limit_from_sql(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<CatalogEntry> {
    let pricing: String = row.get(4)?;
    let pricing: PricingPolicy = serde_json::from_str(&pricing)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    let last_updated: String = row.get(7)?;
    let last_updated = DateTime::parse_from_rfc3339(&last_updated)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(CatalogEntry {
        provider_id: row.get(0)?,
        model_id: row.get(1)?,
        provider_name: row.get(2)?,
        model_name: row.get(3)?,
        pricing,
        limits: ModelLimits {
            context: limit_from_sql(row.get(5)?),
            output: limit_from_sql(row.get(6)?),
        },
        last_updated,
    })
}

fn query_entries(
    conn: &Connection,
    filter: &str,
    args: &[&dyn rusqlite::ToSql],
) -> Result<Vec<CatalogEntry>, StoreError> {
    let sql = format!("{SELECT_COLUMNS} {filter} ORDER BY provider_id, model_id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(args, entry_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn get_entry(conn: &Connection, key: &CatalogKey) -> Result<Option<CatalogEntry>, StoreError> {
    let sql = format!("{SELECT_COLUMNS} WHERE provider_id = ?1 AND model_id = ?2");
    Ok(conn
        .query_row(&sql, params![key.provider_id, key.model_id], entry_from_row)
        .optional()?)
}

fn insert_entry(conn: &Connection, entry: &CatalogEntry) -> Result<(), StoreError> {
    let pricing = serde_json::to_string(&entry.pricing)?;
    let context = limit_to_sql(entry.limits.context, "context limit")?;
    let output = limit_to_sql(entry.limits.output, "output limit")?;
    let result = conn.execute(
        "INSERT INTO catalog (provider_id, model_id, provider_name, model_name, pricing, \
         context_limit, output_limit, last_updated) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            entry.provider_id,
            entry.model_id,
            entry.provider_name,
            entry.model_name,
            pricing,
            context,
            output,
            entry.last_updated.to_rfc3339(),
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == ErrorCode::ConstraintViolation =>
        {
            Err(StoreError::DuplicateKey(entry.key().to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

fn write_entry(conn: &Connection, entry: &CatalogEntry) -> Result<(), StoreError> {
    let pricing = serde_json::to_string(&entry.pricing)?;
    let context = limit_to_sql(entry.limits.context, "context limit")?;
    let output = limit_to_sql(entry.limits.output, "output limit")?;
    conn.execute(
        "UPDATE catalog SET provider_name = ?3, model_name = ?4, pricing = ?5, \
         context_limit = ?6, output_limit = ?7, last_updated = ?8 \
         WHERE provider_id = ?1 AND model_id = ?2",
        params![
            entry.provider_id,
            entry.model_id,
            entry.provider_name,
            entry.model_name,
            pricing,
            context,
            output,
            entry.last_updated.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn patch_entry(conn: &Connection, key: &CatalogKey, patch: &CatalogPatch) -> Result<(), StoreError> {
    let mut entry = get_entry(conn, key)?.ok_or_else(|| StoreError::NotFound(key.to_string()))?;
    entry.apply_patch(patch);
    write_entry(conn, &entry)
}

fn delete_entry(conn: &Connection, key: &CatalogKey) -> Result<bool, StoreError> {
    let removed = conn.execute(
        "DELETE FROM catalog WHERE provider_id = ?1 AND model_id = ?2",
        params![key.provider_id, key.model_id],
    )?;
    Ok(removed > 0)
}

// ============================================================================
// CatalogStore
// ============================================================================

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    type Error = StoreError;

    async fn list(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        self.with_conn(|conn| query_entries(conn, "", &[])).await
    }

    async fn get(&self, key: &CatalogKey) -> Result<Option<CatalogEntry>, StoreError> {
        let key = key.clone();
        self.with_conn(move |conn| get_entry(conn, &key)).await
    }

    async fn list_by_provider(&self, provider_id: &str) -> Result<Vec<CatalogEntry>, StoreError> {
        let provider_id = provider_id.to_string();
        self.with_conn(move |conn| {
            query_entries(conn, "WHERE provider_id = ?1", &[&provider_id])
        })
        .await
    }

    async fn insert(&self, entry: CatalogEntry) -> Result<(), StoreError> {
        self.with_conn(move |conn| insert_entry(conn, &entry)).await
    }

    async fn patch(&self, key: &CatalogKey, patch: CatalogPatch) -> Result<(), StoreError> {
        let key = key.clone();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            patch_entry(&tx, &key, &patch)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &CatalogKey) -> Result<bool, StoreError> {
        let key = key.clone();
        self.with_conn(move |conn| delete_entry(conn, &key)).await
    }

    async fn apply(&self, changes: Vec<CatalogChange>) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            let count = changes.len();
            // Dropping the transaction on error rolls it back.
            let tx = conn.transaction()?;
            for change in &changes {
                match change {
                    CatalogChange::Insert(entry) => insert_entry(&tx, entry)?,
                    CatalogChange::Update { key, patch } => patch_entry(&tx, key, patch)?,
                    CatalogChange::Delete(key) => {
                        if !delete_entry(&tx, key)? {
                            return Err(StoreError::NotFound(key.to_string()));
                        }
                    }
                }
            }
            tx.commit()?;
            debug!(changes = count, "Committed catalog batch");
            Ok(())
        })
        .await
    }
}

// ============================================================================
// Tests
// ============================================================================
