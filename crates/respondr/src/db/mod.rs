//! Metadata store backed by SQLite.
//!
//! Uses rusqlite with a thread-safe `Database` handle. All access is
//! serialized through a `Mutex<Connection>`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::categorizer::DocumentType;
use crate::metadata::DocumentRecord;

pub mod document_repo;
pub mod error;
pub mod migrations;

pub use document_repo::ScanPage;
pub use error::DatabaseError;

/// Thread-safe database handle wrapping a single rusqlite connection.
///
/// Cloning is cheap (inner `Arc`). WAL mode is enabled for file databases.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (or creates) the database at the given path and runs all
    /// pending migrations.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        migrations::run_all(&conn)?;

        log::info!("Database opened at {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database. Runs all migrations.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        migrations::run_all(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Provides locked access to the underlying connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }
}

/// Returns the canonical database path: `~/.respondr/data/respondr.db`.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".respondr").join("data").join("respondr.db"))
}

/// Keyed, indexed store of document records.
pub trait MetadataStore: Send + Sync {
    fn put_record(&self, record: &DocumentRecord) -> Result<(), DatabaseError>;

    fn find_record(&self, document_id: &str) -> Result<Option<DocumentRecord>, DatabaseError>;

    fn scan_page(&self, start_after: Option<&str>, limit: u32) -> Result<ScanPage, DatabaseError>;

    fn scan_by_org(&self, org_id: &str) -> Result<Vec<DocumentRecord>, DatabaseError>;

    fn query_by_org_doctype(
        &self,
        org_id: &str,
        document_type: DocumentType,
    ) -> Result<Vec<DocumentRecord>, DatabaseError>;

    /// Every record, following scan pages until no continuation key remains.
    fn scan_all(&self) -> Result<Vec<DocumentRecord>, DatabaseError> {
        let mut records = Vec::new();
        let mut start_after: Option<String> = None;
        loop {
            let page = self.scan_page(start_after.as_deref(), document_repo::SCAN_PAGE_SIZE)?;
            records.extend(page.items);
            match page.last_evaluated_key {
                Some(key) => start_after = Some(key),
                None => return Ok(records),
            }
        }
    }
}

impl MetadataStore for Database {
    fn put_record(&self, record: &DocumentRecord) -> Result<(), DatabaseError> {
        document_repo::insert(self, record)
    }

    fn find_record(&self, document_id: &str) -> Result<Option<DocumentRecord>, DatabaseError> {
        document_repo::find_by_id(self, document_id)
    }

    fn scan_page(&self, start_after: Option<&str>, limit: u32) -> Result<ScanPage, DatabaseError> {
        document_repo::scan_page(self, start_after, limit)
    }

    fn scan_by_org(&self, org_id: &str) -> Result<Vec<DocumentRecord>, DatabaseError> {
        document_repo::scan_by_org(self, org_id)
    }

    fn query_by_org_doctype(
        &self,
        org_id: &str,
        document_type: DocumentType,
    ) -> Result<Vec<DocumentRecord>, DatabaseError> {
        document_repo::query_by_org_doctype(self, org_id, document_type)
    }
}
