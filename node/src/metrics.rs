//! # Prometheus Metrics
//!
//! Operational metrics for the gateway, scraped at `/metrics` on the
//! metrics port. Everything is registered in a dedicated
//! [`prometheus::Registry`] under the `custos` namespace.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Metric handles shared by the request handlers.
#[derive(Clone)]
pub struct GatewayMetrics {
    registry: Registry,
    /// JSON-RPC requests served, by method label and outcome.
    pub requests_total: IntCounterVec,
    /// Latency of intercepted calls, by method.
    pub intercepted_latency_seconds: HistogramVec,
    /// Responses carrying a blockchain node error.
    pub downstream_errors_total: IntCounter,
}

impl GatewayMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("custos".into()), None)?;

        let requests_total = IntCounterVec::new(
            Opts::new("requests_total", "JSON-RPC requests served"),
            &["method", "outcome"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let intercepted_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "intercepted_latency_seconds",
                "Time spent serving intercepted calls, node round trips included",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["method"],
        )?;
        registry.register(Box::new(intercepted_latency_seconds.clone()))?;

        let downstream_errors_total = IntCounter::new(
            "downstream_errors_total",
            "Responses carrying a blockchain node error",
        )?;
        registry.register(Box::new(downstream_errors_total.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            intercepted_latency_seconds,
            downstream_errors_total,
        })
    }

    /// Records one served request. `latency` is only observed for
    /// intercepted methods.
    pub fn observe(&self, label: &str, intercepted: bool, outcome: Outcome, latency: f64) {
        self.requests_total
            .with_label_values(&[label, outcome.as_str()])
            .inc();
        if intercepted {
            self.intercepted_latency_seconds
                .with_label_values(&[label])
                .observe(latency);
        }
        if outcome == Outcome::NodeError {
            self.downstream_errors_total.inc();
        }
    }

    /// Renders every metric in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// How a request ended, as far as metrics are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Error,
    NodeError,
}

impl Outcome {
    fn as_str(self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Error => "error",
            Outcome::NodeError => "node_error",
        }
    }
}

pub type SharedMetrics = Arc<GatewayMetrics>;

/// `GET /metrics`.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
