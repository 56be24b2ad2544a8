//! Shared state handed to every handler.

use std::sync::Arc;

use recovery_desk_core::{
    Clock, ComplaintService, DeskConfig, DeskResult, DeskStore, ShipmentService,
};

use crate::error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DeskStore>,
    pub complaints: ComplaintService,
    pub shipments: ShipmentService,
    pub config: Arc<DeskConfig>,
}

impl AppState {
    /// Wire both services to one explicitly constructed store.
    pub fn new(store: Arc<DeskStore>, clock: Arc<dyn Clock>, config: DeskConfig) -> Self {
        let shipments = ShipmentService::new(store.clone(), clock.clone())
            .with_default_page_size(config.default_page_size);
        Self {
            complaints: ComplaintService::new(store.clone(), clock),
            store,
            shipments,
            config: Arc::new(config),
        }
    }
}

/// Run a store-bound call on the blocking pool.
pub async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> DeskResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("worker task failed: {e}")))?
        .map_err(ApiError::from)
}
