//! Routing engine HTTP client with a hard deadline.
//!
//! # Responsibilities
//! - Build the `/route/...` request with alternatives, steps and exclusions
//! - Enforce one deadline over connect, send and body read
//! - Map transport, status and engine-level failures to `RoutingError`

use std::time::Duration;

use async_trait::async_trait;

use crate::config::{GeometryFormat, RoutingEngineConfig};
use crate::observability::metrics;
use crate::resilience::with_deadline;
use crate::routing::request::RouteQuery;
use crate::routing::response::{EngineResponse, RouteAlternative};
use crate::routing::types::{RoutingError, RoutingResult};

/// Source of candidate routes between two points.
#[async_trait]
pub trait RoutingEngine: Send + Sync {
    /// Fetch up to the configured number of alternatives, in engine order.
    async fn alternatives(&self, query: &RouteQuery) -> RoutingResult<Vec<RouteAlternative>>;
}

/// Client for an OSRM-compatible routing engine.
#[derive(Clone)]
pub struct OsrmClient {
    http: reqwest::Client,
    base_url: String,
    route_path: String,
    timeout: Duration,
    max_alternatives: usize,
    geometries: GeometryFormat,
}

impl OsrmClient {
    pub fn new(config: &RoutingEngineConfig) -> RoutingResult<Self> {
        url::Url::parse(&config.base_url).map_err(|e| {
            RoutingError::InvalidUrl(format!("'{}': {}", config.base_url, e))
        })?;

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| RoutingError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            route_path: config.route_path.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            max_alternatives: config.max_alternatives,
            geometries: config.geometries,
        })
    }

    /// Override the request deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn geometries(&self) -> GeometryFormat {
        self.geometries
    }

    /// Full request URL without query parameters.
    pub fn route_url(&self, query: &RouteQuery) -> RoutingResult<url::Url> {
        let path = self
            .route_path
            .replace("{coordinates}", &query.coordinates_path());
        let raw = format!("{}{}", self.base_url, path);
        url::Url::parse(&raw).map_err(|e| RoutingError::InvalidUrl(format!("'{}': {}", raw, e)))
    }

    fn query_params(&self, query: &RouteQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("alternatives", "true".to_string()),
            ("steps", "true".to_string()),
            ("geometries", self.geometries.as_param().to_string()),
            ("overview", "full".to_string()),
        ];
        if let Some(exclude) = query.exclude_param() {
            params.push(("exclude", exclude));
        }
        params
    }

    async fn fetch(&self, url: url::Url, params: Vec<(&'static str, String)>) -> RoutingResult<EngineResponse> {
        let response = self
            .http
            .get(url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                metrics::record_routing_engine("transport".to_string());
                RoutingError::Transport(e.to_string())
            })?;

        let status = response.status();
        metrics::record_routing_engine(status.as_u16().to_string());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RoutingError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RoutingError::Transport(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| RoutingError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RoutingEngine for OsrmClient {
    async fn alternatives(&self, query: &RouteQuery) -> RoutingResult<Vec<RouteAlternative>> {
        let url = self.route_url(query)?;
        let params = self.query_params(query);

        tracing::debug!(
            url = %url,
            exclusions = query.exclusions.len(),
            "Requesting route alternatives"
        );

        let response = match with_deadline(self.timeout, self.fetch(url, params)).await {
            Ok(result) => result?,
            Err(_) => {
                metrics::record_routing_engine("timeout".to_string());
                tracing::warn!(timeout = ?self.timeout, "Routing engine timed out");
                return Err(RoutingError::Timeout(self.timeout));
            }
        };

        if let Some(code) = response.code.as_deref() {
            if code != "Ok" {
                return Err(RoutingError::Rejected {
                    code: code.to_string(),
                    message: response.message.unwrap_or_default(),
                });
            }
        }

        let mut routes = response.routes;
        routes.truncate(self.max_alternatives);
        Ok(routes)
    }
}
