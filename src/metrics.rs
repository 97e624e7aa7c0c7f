// src/metrics.rs
//! Prometheus recorder, pipeline series descriptions and the `/metrics` route.
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and describe the pipeline series.
    pub fn init() -> Result<Self, BuildError> {
        // Default buckets; histograms render as summaries.
        let handle = PrometheusBuilder::new().install_recorder()?;
        describe_all();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe_all() {
    describe_counter!("analysis_requests_total", "Texts submitted for full analysis");
    describe_counter!(
        "analysis_failures_total",
        "Analyses aborted by a language or summarization failure"
    );
    describe_counter!(
        "classification_fallback_total",
        "Classifications replaced by the Miscellaneous fallback"
    );
    describe_counter!(
        "multilang_segment_skipped_total",
        "Segments whose language detection failed and were skipped"
    );
    describe_counter!("persist_saves_total", "Analyses saved to the document store");
    describe_counter!("persist_failures_total", "Failed saves to the document store");
    describe_histogram!("analysis_duration_ms", "Wall time of one full analysis");
}
