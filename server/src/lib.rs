//! HTTP surface for the record desk.

pub mod error;
pub mod routes;
pub mod router;
pub mod state;

pub use router::desk_router;
pub use state::AppState;
