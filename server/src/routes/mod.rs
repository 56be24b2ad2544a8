//! Route groups.

pub mod complaints;
pub mod shipments;

use serde::Serialize;

/// Body returned by delete endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
