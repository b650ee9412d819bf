//! Routing engine client against a mock engine over real TCP.

use std::net::SocketAddr;
use std::time::Duration;

use bike_route_engine::config::RoutingEngineConfig;
use bike_route_engine::routing::{
    ExclusionPolygon, OsrmClient, RouteGeometry, RouteQuery, RoutingEngine, RoutingError,
};
use bike_route_engine::spatial::Coordinate;

mod common;

fn client(addr: SocketAddr) -> OsrmClient {
    OsrmClient::new(&RoutingEngineConfig {
        base_url: format!("http://{}", addr),
        ..Default::default()
    })
    .unwrap()
}

fn query() -> RouteQuery {
    RouteQuery::new(Coordinate::new(77.0, 28.1), Coordinate::new(77.1, 28.1))
}

#[tokio::test]
async fn test_fetches_and_caps_alternatives() {
    let body = common::engine_response(&[(28.1, 1000.0), (28.3, 1100.0), (28.5, 1200.0), (28.7, 1300.0)]);
    let (addr, seen) = common::start_fixed_engine(200, body).await;

    let routes = client(addr).alternatives(&query()).await.unwrap();
    assert_eq!(routes.len(), 3);
    assert_eq!(routes[0].distance, 1000.0);
    assert!(matches!(routes[0].geometry, Some(RouteGeometry::GeoJson(_))));
    assert_eq!(routes[0].legs.len(), 1);

    let target = seen.lock().unwrap()[0].clone();
    assert!(target.starts_with("/route/v1/cycling/77,28.1;77.1,28.1?"));
    assert!(target.contains("alternatives=true"));
    assert!(target.contains("steps=true"));
    assert!(target.contains("geometries=geojson"));
    assert!(target.contains("overview=full"));
    assert!(!target.contains("exclude="));
}

#[tokio::test]
async fn test_sends_exclusions() {
    let (addr, seen) = common::start_fixed_engine(200, common::engine_response(&[])).await;
    let query = query().with_exclusions(vec![ExclusionPolygon {
        ring: vec![Coordinate::new(77.0, 28.0), Coordinate::new(77.1, 28.0)],
        buffer_meters: 100,
    }]);

    let routes = client(addr).alternatives(&query).await.unwrap();
    assert!(routes.is_empty());

    let target = seen.lock().unwrap()[0].clone();
    // polygon(28,77,28,77.1,100), form-encoded
    assert!(target.contains("exclude=polygon%2828%2C77%2C28%2C77.1%2C100%29"));
}

#[tokio::test]
async fn test_server_error_is_status() {
    let (addr, _) = common::start_fixed_engine(500, r#"{"error":"boom"}"#.into()).await;

    let err = client(addr).alternatives(&query()).await.unwrap_err();
    match err {
        RoutingError::Status { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("boom"));
        }
        other => panic!("expected Status, got {:?}", other),
    }
}

#[tokio::test]
async fn test_engine_failure_code_is_rejected() {
    let body = r#"{"code":"InvalidQuery","message":"Query string malformed"}"#;
    let (addr, _) = common::start_fixed_engine(200, body.into()).await;

    let err = client(addr).alternatives(&query()).await.unwrap_err();
    assert!(matches!(err, RoutingError::Rejected { ref code, .. } if code == "InvalidQuery"));
}

#[tokio::test]
async fn test_slow_engine_times_out() {
    let (addr, _) = common::start_routing_engine(|_| async {
        tokio::time::sleep(Duration::from_secs(3)).await;
        (200, common::engine_response(&[(28.1, 1000.0)]))
    })
    .await;

    let started = std::time::Instant::now();
    let err = client(addr)
        .with_timeout(Duration::from_millis(200))
        .alternatives(&query())
        .await
        .unwrap_err();

    assert!(matches!(err, RoutingError::Timeout(d) if d == Duration::from_millis(200)));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_unreachable_engine_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(addr).alternatives(&query()).await.unwrap_err();
    assert!(matches!(err, RoutingError::Transport(_)));
}

#[tokio::test]
async fn test_garbage_body_is_decode_error() {
    let (addr, _) = common::start_fixed_engine(200, "not json".into()).await;

    let err = client(addr).alternatives(&query()).await.unwrap_err();
    assert!(matches!(err, RoutingError::Decode(_)));
}
