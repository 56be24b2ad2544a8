//! Shipment CRUD, tracking lookup and statistics.
//!
//! Every read path (list, get, track) runs the progress normalizer and
//! writes back any repair before returning. Update does not normalize.

use crate::{
    clock::Clock,
    error::{DeskError, DeskResult},
    fields::Fields,
    normalizer,
    shipment::{CustomsStatus, Shipment, ShipmentStatus},
    store::DeskStore,
    types::new_record_id,
};
use serde::Serialize;
use std::sync::Arc;

const ENTITY: &str = "Shipment";

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Attempts at a read-path repair before giving up on persisting it.
const MAX_REPAIR_ATTEMPTS: usize = 3;

/// Offset pagination, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Parse raw query values. Anything missing, non-numeric or below 1
    /// falls back to the default for that parameter.
    pub fn parse(page: Option<&str>, limit: Option<&str>, default_limit: u64) -> Self {
        let positive = |raw: Option<&str>| {
            raw.and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|n| *n > 0)
        };
        Self {
            page: positive(page).unwrap_or(DEFAULT_PAGE),
            limit: positive(limit).unwrap_or(default_limit.max(1)),
        }
    }

    /// Page 0 reads as page 1.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// A zero limit counts as 1.
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit.max(1))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentPage {
    pub shipments: Vec<Shipment>,
    pub total: u64,
    pub page: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub in_transit: i64,
    pub delivered: i64,
    pub pending: i64,
    pub out_for_delivery: i64,
    pub exception: i64,
    pub on_hold: i64,
    pub returned: i64,
}

impl StatusCounts {
    pub fn sum(&self) -> i64 {
        self.in_transit
            + self.delivered
            + self.pending
            + self.out_for_delivery
            + self.exception
            + self.on_hold
            + self.returned
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomsCounts {
    pub cleared: i64,
    pub on_hold: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentStats {
    pub total: i64,
    pub status: StatusCounts,
    pub customs: CustomsCounts,
    pub total_value: f64,
}

#[derive(Clone)]
pub struct ShipmentService {
    store: Arc<DeskStore>,
    clock: Arc<dyn Clock>,
    default_page_size: u64,
}

impl ShipmentService {
    pub fn new(store: Arc<DeskStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_default_page_size(mut self, limit: u64) -> Self {
        self.default_page_size = limit.max(1);
        self
    }

    pub fn default_page_size(&self) -> u64 {
        self.default_page_size
    }

    /// Not read-only: may write back up to `limit` repaired records.
    /// A failed repair is logged and the record is still returned.
    pub fn list(&self, page: PageRequest) -> DeskResult<ShipmentPage> {
        let rows = self.store.list_shipments(page.offset(), page.limit.max(1))?;
        let shipments = rows
            .into_iter()
            .map(|shipment| {
                let fallback = shipment.clone();
                self.normalized(shipment).unwrap_or_else(|e| {
                    log::warn!("shipment {}: progress repair failed: {e}", fallback.id);
                    let mut local = fallback;
                    normalizer::ensure_delivered_step(&mut local, self.clock.now());
                    local
                })
            })
            .collect();

        let total = u64::try_from(self.store.shipment_count()?).unwrap_or(0);
        Ok(ShipmentPage {
            shipments,
            total,
            page: page.page,
            total_pages: page.total_pages(total),
        })
    }

    pub fn get(&self, id: &str) -> DeskResult<Shipment> {
        let shipment = self
            .store
            .get_shipment(id)?
            .ok_or(DeskError::NotFound { entity: ENTITY })?;
        self.normalized(shipment)
    }

    pub fn track(&self, tracking_id: &str) -> DeskResult<Shipment> {
        let shipment = self
            .store
            .find_shipment_by_tracking_id(tracking_id)?
            .ok_or(DeskError::NotFound { entity: ENTITY })?;
        self.normalized(shipment)
    }

    /// New shipments carry the terminal step from the start, so they never
    /// need a read-time repair.
    pub fn create(&self, fields: &Fields) -> DeskResult<Shipment> {
        let now = self.clock.now();
        let mut shipment = Shipment::from_fields(new_record_id(), fields, now)?;
        normalizer::ensure_delivered_step(&mut shipment, now);
        self.store.insert_shipment(&shipment)?;
        log::info!(
            "shipment {} created (tracking_id={})",
            shipment.id,
            shipment.tracking_id
        );
        Ok(shipment)
    }

    pub fn update(&self, id: &str, fields: &Fields) -> DeskResult<Shipment> {
        let mut shipment = self
            .store
            .get_shipment(id)?
            .ok_or(DeskError::NotFound { entity: ENTITY })?;
        shipment.apply(fields, self.clock.now())?;
        if !self.store.update_shipment(&shipment)? {
            return Err(DeskError::NotFound { entity: ENTITY });
        }
        shipment.revision += 1;
        log::debug!("shipment {id} updated (status={})", shipment.status);
        Ok(shipment)
    }

    pub fn delete(&self, id: &str) -> DeskResult<()> {
        if !self.store.delete_shipment(id)? {
            return Err(DeskError::NotFound { entity: ENTITY });
        }
        log::info!("shipment {id} deleted");
        Ok(())
    }

    /// Fresh on every call; nothing is cached.
    pub fn stats(&self) -> DeskResult<ShipmentStats> {
        let tallies = self.store.shipment_tallies()?;
        let status = |s: ShipmentStatus| tallies.by_status.get(s.as_str()).copied().unwrap_or(0);
        let customs = |c: CustomsStatus| tallies.by_customs.get(c.as_str()).copied().unwrap_or(0);

        Ok(ShipmentStats {
            total: tallies.total,
            status: StatusCounts {
                in_transit: status(ShipmentStatus::InTransit),
                delivered: status(ShipmentStatus::Delivered),
                pending: status(ShipmentStatus::Pending),
                out_for_delivery: status(ShipmentStatus::OutForDelivery),
                exception: status(ShipmentStatus::Exception),
                on_hold: status(ShipmentStatus::OnHold),
                returned: status(ShipmentStatus::Returned),
            },
            customs: CustomsCounts {
                cleared: customs(CustomsStatus::Cleared),
                on_hold: customs(CustomsStatus::OnHold),
            },
            total_value: tallies.total_value,
        })
    }

    /// Ensure the terminal step exists and persist the repair.
    ///
    /// The write is conditional on the revision read. If another writer got
    /// in first, re-read and check again: the winner's copy usually already
    /// holds the step, so the retry is a no-op.
    fn normalized(&self, mut shipment: Shipment) -> DeskResult<Shipment> {
        for _ in 0..MAX_REPAIR_ATTEMPTS {
            if !normalizer::ensure_delivered_step(&mut shipment, self.clock.now()) {
                return Ok(shipment);
            }
            if self.store.save_shipment_if_unchanged(&shipment)? {
                shipment.revision += 1;
                log::info!(
                    "shipment {}: backfilled terminal progress step",
                    shipment.id
                );
                return Ok(shipment);
            }
            log::debug!("shipment {}: repair lost a race, re-reading", shipment.id);
            shipment = self
                .store
                .get_shipment(&shipment.id)?
                .ok_or(DeskError::NotFound { entity: ENTITY })?;
        }
        if normalizer::has_delivered_step(&shipment.progress) {
            return Ok(shipment);
        }
        Err(DeskError::Other(anyhow::anyhow!(
            "shipment {}: progress repair kept losing to concurrent writers",
            shipment.id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_falls_back_to_defaults() {
        assert_eq!(PageRequest::parse(None, None, 10), PageRequest::default());
        assert_eq!(
            PageRequest::parse(Some("abc"), Some("0"), 10),
            PageRequest { page: 1, limit: 10 }
        );
        assert_eq!(
            PageRequest::parse(Some("-2"), Some("25"), 10),
            PageRequest { page: 1, limit: 25 }
        );
    }

    #[test]
    fn offset_and_total_pages() {
        let p = PageRequest { page: 2, limit: 10 };
        assert_eq!(p.offset(), 10);
        assert_eq!(p.total_pages(15), 2);
        assert_eq!(p.total_pages(0), 0);
        assert_eq!(p.total_pages(20), 2);
    }

    #[test]
    fn zero_page_and_limit_do_not_underflow() {
        let p = PageRequest { page: 0, limit: 0 };
        assert_eq!(p.offset(), 0);
        assert_eq!(p.total_pages(3), 3);
    }
}
