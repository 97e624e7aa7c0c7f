// src/telemetry.rs
//! Tracing setup plus the helpers that keep raw user text out of logs.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_DEV_LOG: &str = "ANALYZER_DEV_LOG";

/// `ANALYZER_DEV_LOG=1` in a debug build (or `SHUTTLE_ENV` in {local, development, dev}).
pub fn dev_logging_enabled() -> bool {
    let on = std::env::var(ENV_DEV_LOG).ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// Install the global subscriber. `RUST_LOG` wins; otherwise dev logging raises
/// this crate to `debug`. Safe to call more than once.
pub fn init_tracing() {
    let default_directive = if dev_logging_enabled() {
        "text_insight_analyzer=debug,info"
    } else {
        "text_insight_analyzer=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false))
        .try_init();
}

/// Short, stable fingerprint used in place of input text in log lines.
pub fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
