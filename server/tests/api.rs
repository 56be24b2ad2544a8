//! HTTP-level tests for the complaint and shipment endpoints.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use recovery_desk_core::{DeskConfig, DeskStore, SystemClock};
use recovery_desk_server::{desk_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

const ADMIN_ORIGIN: &str = "https://admin.desk.example";

fn router_with(config: DeskConfig) -> Router {
    let store = Arc::new(DeskStore::open_migrated(":memory:").expect("in-memory store"));
    desk_router(AppState::new(store, Arc::new(SystemClock), config))
}

fn test_router() -> Router {
    router_with(DeskConfig::default_test())
}

fn cors_router() -> Router {
    router_with(DeskConfig {
        allowed_origins: vec![ADMIN_ORIGIN.to_string()],
        ..DeskConfig::default_test()
    })
}

async fn raw(router: &Router, req: Request<Body>) -> Result<axum::response::Response, String> {
    router
        .clone()
        .oneshot(req)
        .await
        .map_err(|err| format!("route request: {err}"))
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> Result<(StatusCode, Value), String> {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(payload) => {
            let bytes = serde_json::to_vec(&payload)
                .map_err(|err| format!("serialize request body: {err}"))?;
            builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(bytes))
        }
        None => builder.body(Body::empty()),
    }
    .map_err(|err| format!("build request: {err}"))?;

    let response = router
        .clone()
        .oneshot(req)
        .await
        .map_err(|err| format!("route request: {err}"))?;
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .map_err(|err| format!("read response body: {err}"))?;

    let parsed = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).map_err(|err| format!("parse response body: {err}"))?
    };
    Ok((status, parsed))
}

fn shipment_body(tracking_id: &str) -> Value {
    json!({
        "tracking_id": tracking_id,
        "service_type": "Express",
        "origin": "Lagos",
        "destination": "Berlin",
        "estimated_delivery": "2025-06-12",
        "shipment_value": 250,
        "current_location": "Lagos hub",
    })
}

#[tokio::test]
async fn create_complaint_defaults_to_pending() -> Result<(), String> {
    let router = test_router();
    let (status, body) = send(
        &router,
        Method::POST,
        "/api/complaints",
        Some(json!({
            "name": "A",
            "email": "a@x.com",
            "scam_type": "crypto",
            "description": "lost funds",
        })),
    )
    .await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["name"], "A");
    assert!(body["_id"].is_string());
    Ok(())
}

#[tokio::test]
async fn invalid_complaint_is_bad_request() -> Result<(), String> {
    let router = test_router();
    let (status, body) = send(
        &router,
        Method::POST,
        "/api/complaints",
        Some(json!({ "name": "A", "scam_type": "lottery" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_bad_request() -> Result<(), String> {
    let router = test_router();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/complaints")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .map_err(|err| format!("build request: {err}"))?;
    let response = router
        .oneshot(req)
        .await
        .map_err(|err| format!("route request: {err}"))?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn complaint_crud_round() -> Result<(), String> {
    let router = test_router();
    let (_, created) = send(
        &router,
        Method::POST,
        "/api/complaints",
        Some(json!({
            "name": "B",
            "email": "b@x.com",
            "scam_type": "gift_card",
            "description": "paid in cards",
        })),
    )
    .await?;
    let id = created["_id"].as_str().ok_or("missing _id")?.to_string();

    let (status, updated) = send(
        &router,
        Method::PUT,
        &format!("/api/complaints/{id}"),
        Some(json!({ "status": "resolved" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "resolved");

    let (status, list) = send(&router, Method::GET, "/api/complaints", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    let (status, body) = send(&router, Method::DELETE, &format!("/api/complaints/{id}"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Complaint deleted");

    let (status, _) = send(&router, Method::GET, &format!("/api/complaints/{id}"), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn deleting_unknown_complaint_is_404() -> Result<(), String> {
    let router = test_router();
    let (status, body) = send(&router, Method::DELETE, "/api/complaints/does-not-exist", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Complaint not found");
    Ok(())
}

#[tokio::test]
async fn duplicate_tracking_id_is_rejected_with_its_own_message() -> Result<(), String> {
    let router = test_router();
    let (status, first) =
        send(&router, Method::POST, "/api/shipments", Some(shipment_body("TRK-1"))).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) =
        send(&router, Method::POST, "/api/shipments", Some(shipment_body("TRK-1"))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Tracking ID already exists");

    let id = first["shipment"]["_id"].as_str().ok_or("missing _id")?;
    let (status, _) = send(&router, Method::GET, &format!("/api/shipments/{id}"), None).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn shipment_read_paths_return_envelope_with_terminal_step() -> Result<(), String> {
    let router = test_router();
    let (_, created) =
        send(&router, Method::POST, "/api/shipments", Some(shipment_body("TRK-ENV"))).await?;
    let id = created["shipment"]["_id"].as_str().ok_or("missing _id")?.to_string();

    let (status, by_id) = send(&router, Method::GET, &format!("/api/shipments/{id}"), None).await?;
    assert_eq!(status, StatusCode::OK);
    let progress = by_id["shipment"]["progress"].as_array().ok_or("no progress")?;
    assert_eq!(progress.len(), 1);
    assert_eq!(progress[0]["title"], "Delivered");
    assert_eq!(progress[0]["completed"], false);
    assert!(progress[0]["timestamp"].is_null());

    let (status, tracked) =
        send(&router, Method::GET, "/api/shipments/track/TRK-ENV", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tracked["shipment"]["_id"], id.as_str());

    let (status, _) = send(&router, Method::GET, "/api/shipments/track/NOPE", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn patch_and_put_both_update() -> Result<(), String> {
    let router = test_router();
    let (_, created) =
        send(&router, Method::POST, "/api/shipments", Some(shipment_body("TRK-UPD"))).await?;
    let id = created["shipment"]["_id"].as_str().ok_or("missing _id")?.to_string();
    let uri = format!("/api/shipments/{id}");

    let (status, put) = send(&router, Method::PUT, &uri, Some(json!({ "status": "Delivered" }))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(put["shipment"]["status"], "Delivered");

    let (status, patched) =
        send(&router, Method::PATCH, &uri, Some(json!({ "delivery_attempts": 2 }))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["shipment"]["delivery_attempts"], 2);
    assert_eq!(patched["shipment"]["status"], "Delivered");

    let (status, _) = send(
        &router,
        Method::PUT,
        "/api/shipments/unknown",
        Some(json!({ "status": "Delivered" })),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn list_paginates_fifteen_records() -> Result<(), String> {
    let router = test_router();
    for i in 0..15 {
        let (status, _) = send(
            &router,
            Method::POST,
            "/api/shipments",
            Some(shipment_body(&format!("TRK-P{i:02}"))),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, page) = send(&router, Method::GET, "/api/shipments?page=2&limit=10", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["shipments"].as_array().map(Vec::len), Some(5));
    assert_eq!(page["total"], 15);
    assert_eq!(page["page"], 2);
    assert_eq!(page["totalPages"], 2);

    let (_, defaults) = send(&router, Method::GET, "/api/shipments?page=x&limit=", None).await?;
    assert_eq!(defaults["page"], 1);
    assert_eq!(defaults["shipments"].as_array().map(Vec::len), Some(10));
    Ok(())
}

#[tokio::test]
async fn stats_are_not_shadowed_by_id_route() -> Result<(), String> {
    let router = test_router();
    send(&router, Method::POST, "/api/shipments", Some(shipment_body("TRK-ST1"))).await?;
    let mut delivered = shipment_body("TRK-ST2");
    delivered["status"] = json!("Delivered");
    delivered["customs_status"] = json!("Cleared");
    send(&router, Method::POST, "/api/shipments", Some(delivered)).await?;

    let (status, stats) = send(&router, Method::GET, "/api/shipments/stats", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["status"]["inTransit"], 1);
    assert_eq!(stats["status"]["delivered"], 1);
    assert_eq!(stats["customs"]["cleared"], 1);
    assert_eq!(stats["customs"]["onHold"], 1);
    assert_eq!(stats["totalValue"], 500.0);
    Ok(())
}

#[tokio::test]
async fn delete_shipment_then_404() -> Result<(), String> {
    let router = test_router();
    let (_, created) =
        send(&router, Method::POST, "/api/shipments", Some(shipment_body("TRK-DEL"))).await?;
    let uri = format!(
        "/api/shipments/{}",
        created["shipment"]["_id"].as_str().ok_or("missing _id")?
    );
    let (status, body) = send(&router, Method::DELETE, &uri, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Shipment deleted successfully");
    let (status, _) = send(&router, Method::DELETE, &uri, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn unmatched_route_gets_structured_404() -> Result<(), String> {
    let router = test_router();
    let (status, body) = send(&router, Method::GET, "/api/nothing-here", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Not found: /api/nothing-here");
    Ok(())
}

#[tokio::test]
async fn responses_are_marked_no_store() -> Result<(), String> {
    let router = test_router();
    let req = Request::builder()
        .uri("/")
        .body(Body::empty())
        .map_err(|err| format!("build request: {err}"))?;
    let response = router
        .oneshot(req)
        .await
        .map_err(|err| format!("route request: {err}"))?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
        Some(&b"no-store"[..])
    );
    Ok(())
}

#[tokio::test]
async fn root_reports_liveness_after_store_ping() -> Result<(), String> {
    let router = test_router();
    let (status, body) = send(&router, Method::GET, "/", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "recovery desk is up");
    Ok(())
}

#[tokio::test]
async fn oversized_body_is_rejected_with_413() -> Result<(), String> {
    let router = test_router();
    let limit = DeskConfig::default_test().body_limit_bytes;
    let padding = "x".repeat(limit + 1);
    let payload = format!(r#"{{"name":"A","description":"{padding}"}}"#);
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/complaints")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload))
        .map_err(|err| format!("build request: {err}"))?;
    let response = raw(&router, req).await?;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let (status, list) = send(&router, Method::GET, "/api/complaints", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn cors_echoes_configured_origin() -> Result<(), String> {
    let router = cors_router();
    let req = Request::builder()
        .uri("/api/complaints")
        .header(header::ORIGIN, ADMIN_ORIGIN)
        .body(Body::empty())
        .map_err(|err| format!("build request: {err}"))?;
    let response = raw(&router, req).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.as_bytes()),
        Some(ADMIN_ORIGIN.as_bytes())
    );
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .map(|v| v.as_bytes()),
        Some(&b"true"[..])
    );
    Ok(())
}

#[tokio::test]
async fn cors_ignores_unlisted_origin() -> Result<(), String> {
    let router = cors_router();
    let req = Request::builder()
        .uri("/api/complaints")
        .header(header::ORIGIN, "https://elsewhere.example")
        .body(Body::empty())
        .map_err(|err| format!("build request: {err}"))?;
    let response = raw(&router, req).await?;
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
    Ok(())
}

#[tokio::test]
async fn cors_preflight_lists_allowed_methods() -> Result<(), String> {
    let router = cors_router();
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/shipments/abc")
        .header(header::ORIGIN, ADMIN_ORIGIN)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .map_err(|err| format!("build request: {err}"))?;
    let response = raw(&router, req).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let methods = response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .and_then(|v| v.to_str().ok())
        .ok_or("missing allow-methods")?
        .to_string();
    assert!(methods.contains("PATCH"), "{methods}");
    assert!(methods.contains("DELETE"), "{methods}");
    Ok(())
}
