//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Services call store methods and never execute SQL directly.

use crate::error::{DeskError, DeskResult};
use rusqlite::{Connection, ErrorCode};
use std::sync::{Mutex, MutexGuard};

mod complaint;
mod shipment;

pub use shipment::ShipmentTallies;

pub struct DeskStore {
    conn: Mutex<Connection>,
}

impl DeskStore {
    pub fn open(path: &str) -> DeskResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        if let Err(e) = conn.execute_batch("PRAGMA journal_mode=WAL;") {
            log::debug!("journal_mode=WAL not applied to {path}: {e}");
        }
        conn.execute_batch("PRAGMA busy_timeout=5000;")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> DeskResult<Self> {
        let conn = Connection::open(":memory:")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open and migrate in one step.
    pub fn open_migrated(path: &str) -> DeskResult<Self> {
        let store = if path == ":memory:" {
            Self::in_memory()?
        } else {
            Self::open(path)?
        };
        store.migrate()?;
        Ok(store)
    }

    /// Apply all schema migrations in order. Safe to run on every start.
    pub fn migrate(&self) -> DeskResult<()> {
        let conn = self.conn();
        conn.execute_batch(include_str!("../../../migrations/001_complaints.sql"))?;
        conn.execute_batch(include_str!("../../../migrations/002_shipments.sql"))?;
        Ok(())
    }

    /// Cheap liveness probe.
    pub fn ping(&self) -> DeskResult<()> {
        self.conn().query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    /// A poisoned lock only means another request panicked mid-call; the
    /// connection itself is still usable.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// True when `err` is a UNIQUE constraint violation.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Map a UNIQUE violation to `Conflict`, anything else to `Database`.
fn conflict_or(err: rusqlite::Error, message: &str) -> DeskError {
    if is_unique_violation(&err) {
        DeskError::Conflict {
            message: message.to_string(),
        }
    } else {
        DeskError::Database(err)
    }
}
