use super::DeskStore;
use crate::{complaint::Complaint, error::DeskResult};
use rusqlite::{params, OptionalExtension};
use std::str::FromStr;

const COMPLAINT_COLUMNS: &str = "complaint_id, name, email, phone, country, currency,
    scam_type, description, amount_lost, status, admin_notes, created_at, updated_at";

/// Read a text column holding one of a closed set of values.
fn text_column<E: FromStr<Err = String>>(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<E> {
    let raw: String = row.get(idx)?;
    raw.parse::<E>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}

// Helper function for mapping complaint rows
fn complaint_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Complaint> {
    Ok(Complaint {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        country: row.get(4)?,
        currency: row.get(5)?,
        scam_type: text_column(row, 6)?,
        description: row.get(7)?,
        amount_lost: row.get(8)?,
        status: text_column(row, 9)?,
        admin_notes: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

impl DeskStore {
    // ── Complaint ──────────────────────────────────────────────────

    pub fn insert_complaint(&self, c: &Complaint) -> DeskResult<()> {
        self.conn().execute(
            "INSERT INTO complaint (
                complaint_id, name, email, phone, country, currency,
                scam_type, description, amount_lost, status, admin_notes,
                created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                &c.id,
                &c.name,
                &c.email,
                c.phone.as_deref(),
                c.country.as_deref(),
                c.currency.as_deref(),
                c.scam_type.as_str(),
                &c.description,
                c.amount_lost,
                c.status.as_str(),
                c.admin_notes.as_deref(),
                c.created_at,
                c.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_complaint(&self, complaint_id: &str) -> DeskResult<Option<Complaint>> {
        self.conn()
            .query_row(
                &format!("SELECT {COMPLAINT_COLUMNS} FROM complaint WHERE complaint_id = ?1"),
                params![complaint_id],
                complaint_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Newest first. Ties on `created_at` fall back to insertion order.
    pub fn list_complaints(&self) -> DeskResult<Vec<Complaint>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaint
             ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt.query_map([], complaint_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Overwrite every mutable column. Returns false if the row is gone.
    pub fn update_complaint(&self, c: &Complaint) -> DeskResult<bool> {
        let changed = self.conn().execute(
            "UPDATE complaint SET
                name = ?1, email = ?2, phone = ?3, country = ?4, currency = ?5,
                scam_type = ?6, description = ?7, amount_lost = ?8, status = ?9,
                admin_notes = ?10, updated_at = ?11
             WHERE complaint_id = ?12",
            params![
                &c.name,
                &c.email,
                c.phone.as_deref(),
                c.country.as_deref(),
                c.currency.as_deref(),
                c.scam_type.as_str(),
                &c.description,
                c.amount_lost,
                c.status.as_str(),
                c.admin_notes.as_deref(),
                c.updated_at,
                &c.id,
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_complaint(&self, complaint_id: &str) -> DeskResult<bool> {
        let changed = self.conn().execute(
            "DELETE FROM complaint WHERE complaint_id = ?1",
            params![complaint_id],
        )?;
        Ok(changed > 0)
    }
}
