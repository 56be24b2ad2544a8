//! Progress normalization.
//!
//! RULE: every shipment's progress list holds exactly one step titled
//! "Delivered". New shipments get it at construction; older records that
//! lack it are repaired the first time they are read.
//!
//! This module only decides and mutates in memory. Persisting the repair,
//! and guarding it against concurrent readers, is the shipment service's job.

use crate::{
    shipment::{ProgressStep, Shipment, ShipmentStatus},
    types::Timestamp,
};

pub const DELIVERED_TITLE: &str = "Delivered";
pub const DELIVERED_DESCRIPTION: &str = "Package has been successfully delivered";

/// Exact, case-sensitive title match.
pub fn has_delivered_step(progress: &[ProgressStep]) -> bool {
    progress.iter().any(|step| step.title == DELIVERED_TITLE)
}

/// The synthetic terminal step for `shipment` as of `now`.
pub fn delivered_step(shipment: &Shipment, now: Timestamp) -> ProgressStep {
    let delivered = shipment.status == ShipmentStatus::Delivered;
    ProgressStep {
        title: DELIVERED_TITLE.to_string(),
        description: DELIVERED_DESCRIPTION.to_string(),
        location: shipment.destination.clone(),
        timestamp: delivered.then_some(now),
        completed: delivered,
    }
}

/// Append the terminal step if it is missing. Returns true if `shipment`
/// was changed and needs to be written back.
pub fn ensure_delivered_step(shipment: &mut Shipment, now: Timestamp) -> bool {
    if has_delivered_step(&shipment.progress) {
        return false;
    }
    let step = delivered_step(shipment, now);
    shipment.progress.push(step);
    true
}
