//! SQLite-backed document store.

use super::DocumentStore;
use crate::database::Database;
use crate::error::PersistError;
use std::path::Path;

/// Persists the notepad in a single SQLite row.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Opens (or creates) the store at `path`.
    pub fn open(path: &Path) -> Result<Self, PersistError> {
        Ok(Self {
            db: Database::open(path)?,
        })
    }

    /// Wraps an already opened database.
    pub fn from_database(db: Database) -> Self {
        Self { db }
    }
}

impl DocumentStore for SqliteStore {
    fn load(&self) -> Result<String, PersistError> {
        match self.db.load_document()? {
            Some(content) => {
                let saved_at = self.db.last_saved_at()?;
                tracing::info!(saved_at = ?saved_at, "Restored saved notepad");
                Ok(content)
            }
            None => {
                tracing::info!("No saved notepad found, starting empty");
                Ok(String::new())
            }
        }
    }

    fn save(&self, content: &str) -> Result<(), PersistError> {
        self.db.save_document(content)?;
        tracing::trace!(bytes = content.len(), "Notepad saved");
        Ok(())
    }
}
