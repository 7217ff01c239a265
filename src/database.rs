//! SQLite database for persistent notepad storage.
//!
//! Holds a single `document` row that is overwritten in full on every save.
//! There is no history: the row always mirrors the latest applied content.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Database wrapper with thread-safe connection.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens or creates the database at `path`.
    ///
    /// Fails if the file exists but is not a readable SQLite database.
    pub fn open(path: &Path) -> SqlResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!(path = ?parent, error = %e, "Could not create database directory");
            }
        }

        tracing::info!(path = ?path, "Opening database");

        let conn = Connection::open(path)?;

        // WAL keeps a half-written save from corrupting the last good row
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let db = Self {
            conn: Mutex::new(conn),
        };

        db.init_schema()?;

        Ok(db)
    }

    /// Opens an in-memory database (for testing).
    #[cfg(test)]
    pub fn open_in_memory() -> SqlResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Returns the default database path.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("syncpad")
            .join("notes.db")
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Initializes the database schema.
    fn init_schema(&self) -> SqlResult<()> {
        self.conn().execute_batch(
            r#"
            -- The shared notepad (exactly one row, id = 1)
            CREATE TABLE IF NOT EXISTS document (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                content TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
    }

    /// Reads the stored document, or `None` if nothing was ever saved.
    pub fn load_document(&self) -> SqlResult<Option<String>> {
        self.conn()
            .query_row("SELECT content FROM document WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()
    }

    /// Replaces the stored document with `content`.
    pub fn save_document(&self, content: &str) -> SqlResult<()> {
        let now = Utc::now().to_rfc3339();

        self.conn().execute(
            "INSERT INTO document (id, content, updated_at) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET content = excluded.content, updated_at = excluded.updated_at",
            params![content, now],
        )?;

        Ok(())
    }

    /// Returns the RFC 3339 timestamp of the last save, if any.
    pub fn last_saved_at(&self) -> SqlResult<Option<String>> {
        self.conn()
            .query_row("SELECT updated_at FROM document WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()
    }
}
