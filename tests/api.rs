//! HTTP API end to end: axum router, orchestrator, zone store on disk and a
//! mock routing engine over TCP.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use bike_route_engine::config::{EngineConfig, Environment};
use bike_route_engine::http::HttpServer;
use bike_route_engine::lifecycle::Engine;

mod common;

/// Engine config pointing at a mock engine and a zone directory, without dev cache.
fn config(engine: SocketAddr, zone_dir: &std::path::Path) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.routing.base_url = format!("http://{}", engine);
    config.routing.timeout_secs = 2;
    config.zones.environment = Environment::Production;
    config.zones.data_dir = zone_dir.to_path_buf();
    config.scoring.max_workers = 2;
    config
}

fn app(config: &EngineConfig) -> Router {
    let engine = Engine::build(config).unwrap();
    HttpServer::build_router(engine.app_state(config), Duration::from_secs(5))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let request_id = response
        .headers()
        .get("x-request-id")
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, request_id, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn route_body() -> Value {
    json!({
        "start_lon": 77.0, "start_lat": 28.1,
        "end_lon": 77.1, "end_lat": 28.1,
        "monsoon_mode": false
    })
}

#[tokio::test]
async fn test_route_selects_safer_alternative() {
    let zones = tempfile::tempdir().unwrap();
    common::write_zone_dir(zones.path());
    // First route runs through the theft square, second stays north of it.
    let body = common::engine_response(&[(28.1, 1000.0), (28.3, 1100.0)]);
    let (engine, _) = common::start_fixed_engine(200, body).await;
    let app = app(&config(engine, zones.path()));

    let (status, request_id, body) = send(&app, post_json("/api/v1/routes", route_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(request_id.is_some());

    let alternatives = body["alternatives"].as_array().unwrap();
    assert_eq!(alternatives.len(), 2);
    assert_eq!(alternatives[0]["metadata"]["safety_score"], 0.4);
    assert_eq!(alternatives[0]["metadata"]["hazards"][0]["category"], "theft");
    assert_eq!(alternatives[0]["metadata"]["hazards"][0]["severity"], "high");
    assert_eq!(alternatives[0]["weight"], 250.0);

    assert_eq!(body["selected"]["distance"], 1100.0);
    assert_eq!(body["selected"]["metadata"]["safety_score"], 1.0);
}

#[tokio::test]
async fn test_avoid_sends_exclusions_and_suppresses_hazards() {
    let zones = tempfile::tempdir().unwrap();
    common::write_zone_dir(zones.path());
    let (engine, seen) = common::start_fixed_engine(200, common::engine_response(&[(28.1, 1000.0)])).await;
    let app = app(&config(engine, zones.path()));

    let mut request = route_body();
    request["avoid"] = json!(["theft"]);
    let (status, _, body) = send(&app, post_json("/api/v1/routes", request)).await;
    assert_eq!(status, StatusCode::OK);

    let target = seen.lock().unwrap()[0].clone();
    assert!(target.contains("exclude=polygon%28"));

    let selected = &body["selected"]["metadata"];
    assert_eq!(selected["hazards"], json!([]));
    assert_eq!(selected["avoided_categories"], json!(["theft"]));
}

#[tokio::test]
async fn test_no_alternatives_returns_null_selection() {
    let zones = tempfile::tempdir().unwrap();
    let (engine, _) = common::start_fixed_engine(200, common::engine_response(&[])).await;
    let app = app(&config(engine, zones.path()));

    let (status, _, body) = send(&app, post_json("/api/v1/routes", route_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["alternatives"], json!([]));
    assert_eq!(body["selected"], Value::Null);
}

#[tokio::test]
async fn test_routing_failure_is_503() {
    let zones = tempfile::tempdir().unwrap();
    let (engine, _) = common::start_fixed_engine(500, "{}".into()).await;
    let app = app(&config(engine, zones.path()));

    let (status, _, body) = send(&app, post_json("/api/v1/routes", route_body())).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["detail"], "Route calculation service unavailable");
}

#[tokio::test]
async fn test_invalid_input_is_422() {
    let zones = tempfile::tempdir().unwrap();
    let (engine, seen) = common::start_fixed_engine(200, common::engine_response(&[])).await;
    let app = app(&config(engine, zones.path()));

    let mut out_of_range = route_body();
    out_of_range["start_lat"] = json!(95.0);
    let (status, _, _) = send(&app, post_json("/api/v1/routes", out_of_range)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let mut unknown = route_body();
    unknown["avoid"] = json!(["sharks"]);
    let (status, _, _) = send(&app, post_json("/api/v1/routes", unknown)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_health_reports_city_and_zones() {
    let zones = tempfile::tempdir().unwrap();
    common::write_zone_dir(zones.path());
    let (engine, _) = common::start_fixed_engine(200, common::engine_response(&[])).await;
    let config = config(engine, zones.path());
    let engine = Engine::build(&config).unwrap();
    engine.zones.refresh().await.unwrap();
    let app = HttpServer::build_router(engine.app_state(&config), Duration::from_secs(5));

    let (status, _, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["city"], "Delhi");
    assert_eq!(body["zones"]["theft"], 1);
    assert_eq!(body["zones"]["bike_lane"], 0);
}

#[tokio::test]
async fn test_nearby_hazards() {
    let zones = tempfile::tempdir().unwrap();
    common::write_zone_dir(zones.path());
    let (engine, _) = common::start_fixed_engine(200, common::engine_response(&[])).await;
    let app = app(&config(engine, zones.path()));

    let (status, _, body) = send(&app, get("/api/v1/hazards/nearby?lon=77.1&lat=28.1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inside"], json!(["theft"]));
    assert_eq!(body["distances_m"]["theft"], Value::Null);
    // No waterlogging zones at all.
    assert_eq!(body["distances_m"]["waterlogging"], Value::Null);

    // 0.1 degrees east of the square's edge.
    let (_, _, body) = send(&app, get("/api/v1/hazards/nearby?lon=77.3&lat=28.1")).await;
    assert_eq!(body["inside"], json!([]));
    let meters = body["distances_m"]["theft"].as_f64().unwrap();
    assert!((meters - 11_132.0).abs() < 1.0, "got {}", meters);
}

#[tokio::test]
async fn test_refresh_endpoint() {
    let zones = tempfile::tempdir().unwrap();
    let (engine, _) = common::start_fixed_engine(200, common::engine_response(&[])).await;
    let app = app(&config(engine, zones.path()));

    // Empty directory: every category fails at every tier.
    let (status, _, body) = send(&app, Request::post("/api/v1/zones/refresh").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["zones"]["theft"], 0);
    assert_eq!(body["failed"].as_array().unwrap().len(), 4);

    common::write_zone_dir(zones.path());
    let (status, _, body) = send(&app, Request::post("/api/v1/zones/refresh").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["zones"]["theft"], 1);
    assert!(body.get("failed").is_none());
}

#[tokio::test]
async fn test_refresh_endpoint_sees_edited_zone_files() {
    let zones = tempfile::tempdir().unwrap();
    common::write_zone_dir(zones.path());
    let (engine, _) = common::start_fixed_engine(200, common::engine_response(&[])).await;
    let app = app(&config(engine, zones.path()));

    let refresh = || Request::post("/api/v1/zones/refresh").body(Body::empty()).unwrap();
    let (status, _, body) = send(&app, refresh()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["zones"]["theft"], 1);

    std::fs::write(
        zones.path().join("theft_zones.geojson"),
        common::squares(&[(77.0, 28.0, 0.2), (77.5, 28.0, 0.1)]),
    )
    .unwrap();
    let (status, _, body) = send(&app, refresh()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["zones"]["theft"], 2);
}

fn put_zones(category: &str, body: String) -> Request<Body> {
    Request::put(format!("/api/v1/zones/{}", category))
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_dev_zone_override() {
    let zones = tempfile::tempdir().unwrap();
    common::write_zone_dir(zones.path());
    let (engine, _) = common::start_fixed_engine(200, common::engine_response(&[])).await;
    let mut config = config(engine, zones.path());
    config.zones.environment = Environment::Development;
    config.zones.dev_cache_file = zones.path().join("zone_cache.dev.json");
    let app = app(&config);

    let body = common::squares(&[(77.3, 28.3, 0.1), (77.5, 28.3, 0.1)]);
    let (status, _, report) = send(&app, put_zones("bike_lanes", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["category"], "bike_lane");
    assert_eq!(report["zones"], 2);

    let (_, _, health) = send(&app, get("/health")).await;
    assert_eq!(health["zones"]["bike_lane"], 2);
    assert_eq!(health["zones"]["theft"], 1);
    assert!(config.zones.dev_cache_file.exists());
}

#[tokio::test]
async fn test_dev_zone_override_refused_in_production() {
    let zones = tempfile::tempdir().unwrap();
    let (engine, _) = common::start_fixed_engine(200, common::engine_response(&[])).await;
    let app = app(&config(engine, zones.path()));

    let (status, _, body) = send(&app, put_zones("theft", common::squares(&[]))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Zone overrides are only available in development mode");
}

#[tokio::test]
async fn test_shared_store_is_loaded_lazily() {
    let zones = tempfile::tempdir().unwrap();
    common::write_zone_dir(zones.path());
    let (engine, _) = common::start_fixed_engine(200, common::engine_response(&[])).await;
    let config = config(engine, zones.path());
    let engine = Engine::build(&config).unwrap();
    let store = Arc::clone(&engine.zones);

    assert!(store.current().refreshed_at().is_none());
    assert_eq!(store.get_zones(bike_route_engine::zones::ZoneCategory::Theft).await.len(), 1);
    assert!(store.current().refreshed_at().is_some());
}
