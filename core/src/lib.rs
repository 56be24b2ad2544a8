//! Record desk core: complaint and shipment records over SQLite.
//!
//! The HTTP surface lives in the server crate; everything here is
//! synchronous and transport-agnostic.

pub mod clock;
pub mod complaint;
pub mod complaint_service;
pub mod config;
pub mod error;
pub mod fields;
pub mod normalizer;
pub mod shipment;
pub mod shipment_service;
pub mod store;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use complaint_service::ComplaintService;
pub use config::DeskConfig;
pub use error::{DeskError, DeskResult};
pub use fields::Fields;
pub use shipment_service::{PageRequest, ShipmentService};
pub use store::DeskStore;
