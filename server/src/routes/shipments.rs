//! `/api/shipments` handlers.
//!
//! Single-record responses are wrapped as `{ "shipment": ... }`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use recovery_desk_core::shipment::Shipment;
use recovery_desk_core::shipment_service::{ShipmentPage, ShipmentStats};
use recovery_desk_core::{Fields, PageRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::MessageResponse;
use crate::error::ApiResult;
use crate::state::{blocking, AppState};

/// Shipment route group.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/shipments", get(list_shipments).post(create_shipment))
        .route("/api/shipments/stats", get(shipment_stats))
        .route("/api/shipments/track/:tracking_id", get(track_shipment))
        .route(
            "/api/shipments/:id",
            get(get_shipment)
                .put(update_shipment)
                .patch(update_shipment)
                .delete(delete_shipment),
        )
}

/// Raw strings so malformed values fall back to defaults instead of
/// rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListShipmentsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShipmentEnvelope {
    pub shipment: Shipment,
}

async fn list_shipments(
    State(state): State<AppState>,
    Query(query): Query<ListShipmentsQuery>,
) -> ApiResult<Json<ShipmentPage>> {
    let svc = state.shipments.clone();
    let page = PageRequest::parse(
        query.page.as_deref(),
        query.limit.as_deref(),
        svc.default_page_size(),
    );
    blocking(move || svc.list(page)).await.map(Json)
}

async fn get_shipment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ShipmentEnvelope>> {
    let svc = state.shipments.clone();
    let shipment = blocking(move || svc.get(&id)).await?;
    Ok(Json(ShipmentEnvelope { shipment }))
}

async fn track_shipment(
    State(state): State<AppState>,
    Path(tracking_id): Path<String>,
) -> ApiResult<Json<ShipmentEnvelope>> {
    let svc = state.shipments.clone();
    let shipment = blocking(move || svc.track(&tracking_id)).await?;
    Ok(Json(ShipmentEnvelope { shipment }))
}

async fn create_shipment(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ShipmentEnvelope>)> {
    let Json(body) = body?;
    let fields = Fields::from_json(body)?;
    let svc = state.shipments.clone();
    let shipment = blocking(move || svc.create(&fields)).await?;
    Ok((StatusCode::CREATED, Json(ShipmentEnvelope { shipment })))
}

async fn update_shipment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<ShipmentEnvelope>> {
    let Json(body) = body?;
    let fields = Fields::from_json(body)?;
    let svc = state.shipments.clone();
    let shipment = blocking(move || svc.update(&id, &fields)).await?;
    Ok(Json(ShipmentEnvelope { shipment }))
}

async fn delete_shipment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let svc = state.shipments.clone();
    blocking(move || svc.delete(&id)).await?;
    Ok(Json(MessageResponse {
        message: "Shipment deleted successfully",
    }))
}

async fn shipment_stats(State(state): State<AppState>) -> ApiResult<Json<ShipmentStats>> {
    let svc = state.shipments.clone();
    blocking(move || svc.stats()).await.map(Json)
}
