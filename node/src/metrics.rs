//! # Prometheus Metrics
//!
//! Per-endpoint request and error counters plus a latency histogram, kept
//! in a dedicated [`prometheus::Registry`] and served at `/metrics`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Metric handles for the API server. Cloning shares the underlying
/// metrics.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Requests served, by endpoint.
    pub requests_total: IntCounterVec,
    /// Error responses, by endpoint and catalog code.
    pub errors_total: IntCounterVec,
    /// Handler latency in seconds, by endpoint.
    pub request_duration_seconds: HistogramVec,
}

impl NodeMetrics {
    /// Creates and registers every metric.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("vite_rosetta".into()), None)?;

        let requests_total = IntCounterVec::new(
            Opts::new("requests_total", "Rosetta API requests served"),
            &["endpoint"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let errors_total = IntCounterVec::new(
            Opts::new("errors_total", "Rosetta API error responses"),
            &["endpoint", "code"],
        )?;
        registry.register(Box::new(errors_total.clone()))?;

        let request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "request_duration_seconds",
                "Rosetta API handler latency in seconds",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
            &["endpoint"],
        )?;
        registry.register(Box::new(request_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            errors_total,
            request_duration_seconds,
        })
    }

    pub fn record_request(&self, endpoint: &str, seconds: f64) {
        self.requests_total.with_label_values(&[endpoint]).inc();
        self.request_duration_seconds
            .with_label_values(&[endpoint])
            .observe(seconds);
    }

    pub fn record_error(&self, endpoint: &str, code: i32) {
        let code = code.to_string();
        self.errors_total
            .with_label_values(&[endpoint, code.as_str()])
            .inc();
    }

    /// Prometheus text exposition of every registered metric.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

pub type SharedMetrics = Arc<NodeMetrics>;

/// Renders `/metrics`.
pub async fn metrics_handler(State(metrics): State<SharedMetrics>) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_exposition() {
        let metrics = NodeMetrics::new().unwrap();
        metrics.record_request("/network/list", 0.002);
        metrics.record_error("/construction/metadata", 1);

        let text = metrics.encode().unwrap();
        assert!(text.contains("vite_rosetta_requests_total{endpoint=\"/network/list\"} 1"));
        assert!(text.contains(
            "vite_rosetta_errors_total{code=\"1\",endpoint=\"/construction/metadata\"} 1"
        ));
        assert!(text.contains("vite_rosetta_request_duration_seconds_bucket"));
    }
}
