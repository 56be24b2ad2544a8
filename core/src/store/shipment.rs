use super::{conflict_or, DeskStore};
use crate::{error::DeskResult, shipment::Shipment};
use rusqlite::{params, OptionalExtension};
use std::collections::HashMap;

pub const DUPLICATE_TRACKING_ID: &str = "Tracking ID already exists";

/// Aggregate counts read in one pass under a single lock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipmentTallies {
    pub total: i64,
    pub by_status: HashMap<String, i64>,
    pub by_customs: HashMap<String, i64>,
    pub total_value: f64,
}

// Helper function for mapping shipment rows: (document, revision)
fn shipment_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Shipment> {
    let document: String = row.get(0)?;
    let mut shipment: Shipment = serde_json::from_str(&document).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    shipment.revision = row.get(1)?;
    Ok(shipment)
}

impl DeskStore {
    // ── Shipment ──────────────────────────────────────────────────

    /// Fails with `Conflict` if the tracking id is taken.
    pub fn insert_shipment(&self, s: &Shipment) -> DeskResult<()> {
        let document = serde_json::to_string(s)?;
        self.conn()
            .execute(
                "INSERT INTO shipment (
                    shipment_id, tracking_id, status, customs_status,
                    shipment_value, created_at, revision, document
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    &s.id,
                    &s.tracking_id,
                    s.status.as_str(),
                    s.customs_status.as_str(),
                    s.shipment_value,
                    s.created_at,
                    s.revision,
                    document,
                ],
            )
            .map_err(|e| conflict_or(e, DUPLICATE_TRACKING_ID))?;
        Ok(())
    }

    pub fn get_shipment(&self, shipment_id: &str) -> DeskResult<Option<Shipment>> {
        self.conn()
            .query_row(
                "SELECT document, revision FROM shipment WHERE shipment_id = ?1",
                params![shipment_id],
                shipment_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn find_shipment_by_tracking_id(&self, tracking_id: &str) -> DeskResult<Option<Shipment>> {
        self.conn()
            .query_row(
                "SELECT document, revision FROM shipment WHERE tracking_id = ?1",
                params![tracking_id],
                shipment_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Newest first, `limit` rows starting at `offset`.
    pub fn list_shipments(&self, offset: u64, limit: u64) -> DeskResult<Vec<Shipment>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT document, revision FROM shipment
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt.query_map(
            params![clamp_i64(limit), clamp_i64(offset)],
            shipment_row_mapper,
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn shipment_count(&self) -> DeskResult<i64> {
        self.conn()
            .query_row("SELECT COUNT(*) FROM shipment", [], |r| r.get(0))
            .map_err(Into::into)
    }

    /// Unconditional overwrite; bumps the revision. Returns false if the
    /// row is gone. Fails with `Conflict` if the new tracking id is taken.
    pub fn update_shipment(&self, s: &Shipment) -> DeskResult<bool> {
        let document = serde_json::to_string(s)?;
        let changed = self
            .conn()
            .execute(
                "UPDATE shipment SET
                    tracking_id = ?1, status = ?2, customs_status = ?3,
                    shipment_value = ?4, document = ?5, revision = revision + 1
                 WHERE shipment_id = ?6",
                params![
                    &s.tracking_id,
                    s.status.as_str(),
                    s.customs_status.as_str(),
                    s.shipment_value,
                    document,
                    &s.id,
                ],
            )
            .map_err(|e| conflict_or(e, DUPLICATE_TRACKING_ID))?;
        Ok(changed > 0)
    }

    /// Compare-and-swap on `revision`: the write lands only if nobody has
    /// written the row since `s` was read. Returns whether it landed.
    pub fn save_shipment_if_unchanged(&self, s: &Shipment) -> DeskResult<bool> {
        let document = serde_json::to_string(s)?;
        let changed = self.conn().execute(
            "UPDATE shipment SET document = ?1, revision = revision + 1
             WHERE shipment_id = ?2 AND revision = ?3",
            params![document, &s.id, s.revision],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_shipment(&self, shipment_id: &str) -> DeskResult<bool> {
        let changed = self.conn().execute(
            "DELETE FROM shipment WHERE shipment_id = ?1",
            params![shipment_id],
        )?;
        Ok(changed > 0)
    }

    pub fn shipment_tallies(&self) -> DeskResult<ShipmentTallies> {
        let conn = self.conn();
        let (total, total_value) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(shipment_value), 0.0) FROM shipment",
            [],
            |r| Ok((r.get::<_, i64>(0)?, r.get::<_, f64>(1)?)),
        )?;

        let mut by_status = HashMap::new();
        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM shipment GROUP BY status")?;
        for row in stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))? {
            let (status, n) = row?;
            by_status.insert(status, n);
        }

        let mut by_customs = HashMap::new();
        let mut stmt =
            conn.prepare("SELECT customs_status, COUNT(*) FROM shipment GROUP BY customs_status")?;
        for row in stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))? {
            let (customs, n) = row?;
            by_customs.insert(customs, n);
        }

        Ok(ShipmentTallies {
            total,
            by_status,
            by_customs,
            total_value,
        })
    }
}

fn clamp_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
