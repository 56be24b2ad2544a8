//! `/api/complaints` handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use recovery_desk_core::complaint::Complaint;
use recovery_desk_core::Fields;
use serde_json::Value;

use super::MessageResponse;
use crate::error::ApiResult;
use crate::state::{blocking, AppState};

/// Complaint route group.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/complaints",
            get(list_complaints).post(create_complaint),
        )
        .route(
            "/api/complaints/:id",
            get(get_complaint)
                .put(update_complaint)
                .delete(delete_complaint),
        )
}

async fn list_complaints(State(state): State<AppState>) -> ApiResult<Json<Vec<Complaint>>> {
    let svc = state.complaints.clone();
    blocking(move || svc.list()).await.map(Json)
}

async fn get_complaint(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Complaint>> {
    let svc = state.complaints.clone();
    blocking(move || svc.get(&id)).await.map(Json)
}

async fn create_complaint(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Complaint>)> {
    let Json(body) = body?;
    let fields = Fields::from_json(body)?;
    let svc = state.complaints.clone();
    let complaint = blocking(move || svc.create(&fields)).await?;
    Ok((StatusCode::CREATED, Json(complaint)))
}

async fn update_complaint(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Complaint>> {
    let Json(body) = body?;
    let fields = Fields::from_json(body)?;
    let svc = state.complaints.clone();
    blocking(move || svc.update(&id, &fields)).await.map(Json)
}

async fn delete_complaint(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let svc = state.complaints.clone();
    blocking(move || svc.delete(&id)).await?;
    Ok(Json(MessageResponse {
        message: "Complaint deleted",
    }))
}
