//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Request targets (path and query) seen by a mock engine, in arrival order.
pub type Seen = Arc<Mutex<Vec<String>>>;

/// Start a programmable mock routing engine on an ephemeral port.
///
/// The handler receives the request target and returns a status and JSON body.
pub async fn start_routing_engine<F, Fut>(f: F) -> (SocketAddr, Seen)
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let seen_by_server = seen.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let seen = seen_by_server.clone();
                    tokio::spawn(async move {
                        let Some(target) = read_request_target(&mut socket).await else {
                            return;
                        };
                        seen.lock().unwrap().push(target.clone());

                        let (status, body) = f(target).await;
                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, seen)
}

/// Start a mock engine that always answers with the same status and body.
pub async fn start_fixed_engine(status: u16, body: String) -> (SocketAddr, Seen) {
    start_routing_engine(move |_| {
        let body = body.clone();
        async move { (status, body) }
    })
    .await
}

/// Read request headers and return the request target from the request line.
async fn read_request_target(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let head = String::from_utf8_lossy(&buf);
    head.lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .map(str::to_string)
}

/// An OSRM-style response with one GeoJSON route per `(latitude, distance)`.
///
/// Each route runs east from lon 77.00 to 77.10 at the given latitude.
pub fn engine_response(routes: &[(f64, f64)]) -> String {
    let routes: Vec<serde_json::Value> = routes
        .iter()
        .map(|(lat, distance)| {
            serde_json::json!({
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[77.00, lat], [77.05, lat], [77.10, lat]]
                },
                "distance": distance,
                "duration": distance / 4.0,
                "weight": distance / 4.0,
                "legs": [{"steps": []}]
            })
        })
        .collect();
    serde_json::json!({ "code": "Ok", "routes": routes }).to_string()
}

/// GeoJSON feature collection of axis-aligned squares `(min_lon, min_lat, size)`.
pub fn squares(squares: &[(f64, f64, f64)]) -> String {
    let features: Vec<serde_json::Value> = squares
        .iter()
        .map(|(lon, lat, size)| {
            serde_json::json!({
                "type": "Feature",
                "properties": {"source": "test"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [lon, lat],
                        [lon + size, lat],
                        [lon + size, lat + size],
                        [lon, lat + size],
                        [lon, lat]
                    ]]
                }
            })
        })
        .collect();
    serde_json::json!({ "type": "FeatureCollection", "features": features }).to_string()
}

/// Write a zone data directory: one theft square at (77.0, 28.0) size 0.2,
/// and empty collections for every other category.
pub fn write_zone_dir(dir: &Path) {
    std::fs::write(dir.join("theft_zones.geojson"), squares(&[(77.0, 28.0, 0.2)])).unwrap();
    for file in [
        "waterlogging_zones.geojson",
        "pothole_zones.geojson",
        "bike_lanes.geojson",
    ] {
        std::fs::write(dir.join(file), squares(&[])).unwrap();
    }
}
