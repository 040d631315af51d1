/*!
 * SQLite-backed credential store.
 *
 * The connection is shared behind a mutex and every operation runs on the
 * blocking pool through `tokio::task::spawn_blocking`.
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::KeyValueStore;

/// Default database filename
const DEFAULT_DB_FILENAME: &str = "credentials.db";

/// Default database directory name under user's data directory
const DEFAULT_DB_DIRNAME: &str = "lingobridge";

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Key/value store persisted in a SQLite file
#[derive(Clone)]
pub struct SqliteStore {
    /// Path to the database file
    db_path: PathBuf,
    /// Thread-safe connection wrapped in Arc<Mutex>
    connection: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").field("db_path", &self.db_path).finish()
    }
}

impl SqliteStore {
    /// Open the store at the default location
    pub fn new_default() -> Result<Self> {
        let db_path = Self::default_database_path()?;
        Self::new(&db_path)
    }

    /// Open (or create) the store at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }

        info!("Opening credential store at: {:?}", db_path);

        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database: {:?}", db_path))?;
        initialize_schema(&conn)?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory store (for testing)
    pub fn new_in_memory() -> Result<Self> {
        debug!("Creating in-memory credential store");

        let conn = Connection::open_in_memory().context("Failed to create in-memory database")?;
        initialize_schema(&conn)?;

        Ok(Self {
            db_path: PathBuf::from(":memory:"),
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get the default database path
    pub fn default_database_path() -> Result<PathBuf> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Run a mutable operation on the blocking pool
    async fn execute_mut_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| anyhow::anyhow!("Failed to acquire database lock: {}", e))?;

            f(&mut conn)
        })
        .await
        .context("Database task panicked")?
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, String>> {
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();

        self.execute_mut_async(move |conn| {
            let mut stmt = conn.prepare_cached("SELECT value FROM kv_store WHERE key = ?1")?;
            let mut found = HashMap::new();
            for key in keys {
                let value: Option<String> = stmt
                    .query_row(params![key], |row| row.get(0))
                    .optional()?;
                if let Some(value) = value {
                    found.insert(key, value);
                }
            }
            Ok(found)
        })
        .await
    }

    async fn set(&self, items: HashMap<String, String>) -> Result<()> {
        self.execute_mut_async(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached(
                    "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                )?;
                for (key, value) in &items {
                    stmt.execute(params![key, value])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();

        self.execute_mut_async(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached("DELETE FROM kv_store WHERE key = ?1")?;
                for key in &keys {
                    stmt.execute(params![key])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }
}

/// Initialize the database schema
fn initialize_schema(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Initializing credential store schema v{}", SCHEMA_VERSION);
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                version INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .context("Failed to create credential store tables")?;
        conn.execute(
            "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
            [SCHEMA_VERSION],
        )?;
    } else {
        debug!("Credential store schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .context("Failed to check schema_version table existence")?;

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .unwrap_or(0);

    Ok(version)
}
