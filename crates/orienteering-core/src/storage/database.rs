//! SQLite-backed race document.
//!
//! Stores one JSON document per session id, so several races can share a
//! database file while each store only ever sees its own session.

use std::path::Path;
use std::sync::mpsc::{channel, Receiver, Sender};

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::error::{DatabaseError, SinkError};
use crate::store::sink::{broadcast, PersistenceSink, SinkUpdate};

/// SQLite database holding race documents.
///
/// Changes made by other processes are picked up on the next `subscribe`.
pub struct SqliteSink {
    conn: Connection,
    session_id: String,
    subscribers: Vec<Sender<SinkUpdate>>,
}

impl SqliteSink {
    /// Open (and create if needed) the database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path, session_id: &str) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn, session_id)
    }

    /// Open an in-memory database.
    pub fn open_in_memory(session_id: &str) -> Result<Self, DatabaseError> {
        Self::with_connection(Connection::open_in_memory()?, session_id)
    }

    fn with_connection(conn: Connection, session_id: &str) -> Result<Self, DatabaseError> {
        let db = Self {
            conn,
            session_id: session_id.to_string(),
            subscribers: Vec::new(),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                session_id  TEXT PRIMARY KEY,
                body        TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );",
        )
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Read the stored document for this session.
    pub fn read_document(&self) -> Result<Option<serde_json::Value>, SinkError> {
        let mut stmt = self
            .conn
            .prepare("SELECT body FROM documents WHERE session_id = ?1")?;
        let result = stmt.query_row(params![self.session_id], |row| row.get::<_, String>(0));
        match result {
            Ok(body) => Ok(Some(serde_json::from_str(&body)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Sessions stored in this file.
    pub fn sessions(&self) -> Result<Vec<String>, SinkError> {
        let mut stmt = self
            .conn
            .prepare("SELECT session_id FROM documents ORDER BY session_id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }
        Ok(sessions)
    }
}

impl PersistenceSink for SqliteSink {
    fn subscribe(&mut self) -> Result<Receiver<SinkUpdate>, SinkError> {
        let current = match self.read_document()? {
            Some(doc) => SinkUpdate::Snapshot(doc),
            None => SinkUpdate::Missing,
        };
        let (tx, rx) = channel();
        let _ = tx.send(current);
        self.subscribers.push(tx);
        Ok(rx)
    }

    fn write_full(&mut self, document: &serde_json::Value) -> Result<(), SinkError> {
        let body = serde_json::to_string(document)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO documents (session_id, body, updated_at) VALUES (?1, ?2, ?3)",
            params![self.session_id, body, Utc::now().to_rfc3339()],
        )?;
        broadcast(&mut self.subscribers, &SinkUpdate::Snapshot(document.clone()));
        Ok(())
    }
}
