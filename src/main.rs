//! Text insight dashboard service - binary entrypoint.
//! Boots the Axum HTTP server with the analysis, translation, save and export routes.

use anyhow::Context;
use shuttle_axum::ShuttleAxum;
use tracing::info;

use text_insight_analyzer::{metrics::Metrics, router, state_from, telemetry, Runtime};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    telemetry::init_tracing();

    let rt = Runtime::from_env().context("service configuration")?;
    let metrics = Metrics::init().context("prometheus: install recorder")?;
    info!(
        provider = rt.analyzer.provider_name(),
        translator = rt.translator.is_some(),
        persistence = rt.persistence.is_some(),
        "service ready"
    );

    let app = router(state_from(&rt)).merge(metrics.router());
    Ok(app.into())
}
