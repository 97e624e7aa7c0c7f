// src/lib.rs
// Public library surface shared by the server, the CLI and integration tests.

pub mod analyze;
pub mod api;
pub mod bootstrap;
pub mod config;
pub mod display;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod persist;
pub mod record;
pub mod telemetry;
pub mod translate;

// ---- Re-exports for stable public API ----
pub use crate::analyze::Analyzer;
pub use crate::api::{router, AppState};
pub use crate::bootstrap::Runtime;
pub use crate::error::{AnalysisError, Result};
pub use crate::record::AnalysisRecord;

/// Full in-process app from the environment, without the Prometheus route.
pub fn app() -> anyhow::Result<axum::Router> {
    let rt = Runtime::from_env()?;
    Ok(router(state_from(&rt)))
}

pub fn state_from(rt: &Runtime) -> AppState {
    AppState {
        analyzer: rt.analyzer.clone(),
        translator: rt.translator.clone(),
        persistence: rt.persistence.clone(),
        max_body_bytes: rt.tuning.max_upload_bytes(),
    }
}
