//! `SQLite`-backed prediction storage.
//!
//! [`SqliteLedger`] holds one table, `predictions`, keyed uniquely by
//! `observation_id`. Uniqueness is enforced by `SQLite`'s unique index,
//! not by application-level locking: a single-statement insert either
//! lands in full or reports a constraint violation, which is mapped to
//! [`LedgerError::DuplicateId`] so callers can tell a replay apart from
//! a storage fault.

// Mutex poisoning indicates a panic in another thread, which is
// unrecoverable.
#![allow(clippy::missing_panics_doc)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, ErrorCode, OpenFlags, params};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Schema SQL embedded at compile time.
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LedgerError {
    /// Database error from `SQLite`.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A record with this observation identifier already exists. The
    /// stored record is untouched.
    #[error("observation id `{observation_id}` already exists")]
    DuplicateId {
        /// The identifier that collided.
        observation_id: String,
    },

    /// No record carries this observation identifier.
    #[error("observation id `{observation_id}` does not exist")]
    NotFound {
        /// The identifier that was looked up.
        observation_id: String,
    },
}

/// A persisted scoring event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Caller-supplied identifier, unique across the ledger.
    pub observation_id: String,
    /// The raw request body, stored verbatim for audit and replay.
    pub observation: String,
    /// Probability of the positive class, captured at scoring time.
    pub proba: f64,
    /// Ground-truth label attached after the fact; absent at creation.
    pub true_class: Option<i64>,
}

/// The prediction ledger backed by `SQLite`.
///
/// Writes are serialized through an internal mutex; the store itself
/// guarantees identifier uniqueness, so two racing inserts of the same
/// identifier resolve to one success and one [`LedgerError::DuplicateId`].
pub struct SqliteLedger {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLedger {
    /// Opens or creates a ledger at the specified path.
    ///
    /// If the database doesn't exist, it is created with the embedded
    /// schema. WAL mode is enabled for concurrent reads.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Self::initialize_connection(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Creates an in-memory ledger for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_connection(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Initialize the connection with schema and pragmas.
    fn initialize_connection(conn: &Connection) -> Result<(), LedgerError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    /// Inserts a new prediction record.
    ///
    /// The insert is a single statement: either the record is persisted
    /// in full or nothing changes.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateId`] if a record with the same
    /// `observation_id` is already stored; the existing record keeps its
    /// original values.
    pub fn insert(&self, record: &PredictionRecord) -> Result<(), LedgerError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO predictions (observation_id, observation, proba, true_class)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.observation_id,
                record.observation,
                record.proba,
                record.true_class,
            ],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(inner, _)
                if inner.code == ErrorCode::ConstraintViolation =>
            {
                LedgerError::DuplicateId {
                    observation_id: record.observation_id.clone(),
                }
            },
            other => LedgerError::Database(other),
        })?;

        Ok(())
    }

    /// Attaches a ground-truth label to a previously scored observation.
    ///
    /// Re-appliable: each call simply sets the value again. Returns the
    /// updated record in full.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] if no record carries the
    /// identifier; nothing is mutated in that case.
    pub fn update_label(
        &self,
        observation_id: &str,
        true_class: i64,
    ) -> Result<PredictionRecord, LedgerError> {
        let conn = self.conn.lock().unwrap();

        let updated = conn.execute(
            "UPDATE predictions SET true_class = ?2 WHERE observation_id = ?1",
            params![observation_id, true_class],
        )?;
        if updated == 0 {
            return Err(LedgerError::NotFound {
                observation_id: observation_id.to_string(),
            });
        }

        let record = conn.query_row(
            "SELECT observation_id, observation, proba, true_class
             FROM predictions
             WHERE observation_id = ?1",
            params![observation_id],
            row_to_record,
        )?;

        Ok(record)
    }

    /// Returns every stored record, in insertion order.
    ///
    /// Full scan; the current contract has no pagination.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_all(&self) -> Result<Vec<PredictionRecord>, LedgerError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT observation_id, observation, proba, true_class
             FROM predictions
             ORDER BY rowid ASC",
        )?;

        let records = stmt
            .query_map([], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<PredictionRecord> {
    Ok(PredictionRecord {
        observation_id: row.get(0)?,
        observation: row.get(1)?,
        proba: row.get(2)?,
        true_class: row.get(3)?,
    })
}
