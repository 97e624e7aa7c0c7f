// src/config/tuning.rs
//! Non-secret knobs (API versions, HTTP timeouts, Cosmos throughput) from `config/analyzer.toml`.
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{env, fs, path::Path};
use tracing::warn;

pub const DEFAULT_TUNING_PATH: &str = "config/analyzer.toml";
pub const ENV_TUNING_PATH: &str = "ANALYZER_CONFIG_PATH";

const MIN_COSMOS_THROUGHPUT: u32 = 400;

fn default_openai_api_version() -> String {
    "2024-08-01-preview".to_string()
}
fn default_language_api_version() -> String {
    "v3.1".to_string()
}
fn default_translator_api_version() -> String {
    "3.0".to_string()
}
fn default_cosmos_throughput() -> u32 {
    MIN_COSMOS_THROUGHPUT
}
fn default_connect_timeout_secs() -> u64 {
    5
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_user_agent() -> String {
    "text-insight-analyzer/0.1".to_string()
}
fn default_segment_concurrency() -> usize {
    4
}
fn default_max_upload_mb() -> usize {
    200
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tuning {
    #[serde(default = "default_openai_api_version")]
    pub openai_api_version: String,
    /// Path segment of the Text Analytics REST API, e.g. `v3.1`.
    #[serde(default = "default_language_api_version")]
    pub language_api_version: String,
    #[serde(default = "default_translator_api_version")]
    pub translator_api_version: String,
    /// RU/s requested when the container is created on first save.
    #[serde(default = "default_cosmos_throughput")]
    pub cosmos_throughput: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// In-flight per-segment language detections.
    #[serde(default = "default_segment_concurrency")]
    pub segment_concurrency: usize,
    /// Request body cap for uploads and JSON payloads, in MiB.
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            openai_api_version: default_openai_api_version(),
            language_api_version: default_language_api_version(),
            translator_api_version: default_translator_api_version(),
            cosmos_throughput: default_cosmos_throughput(),
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            segment_concurrency: default_segment_concurrency(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

impl Tuning {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let cfg: Tuning = toml::from_str(&data)?;
        Ok(cfg.sanitized())
    }

    /// `$ANALYZER_CONFIG_PATH`, then `config/analyzer.toml`; defaults when neither loads.
    pub fn load() -> Self {
        let path = env::var(ENV_TUNING_PATH).unwrap_or_else(|_| DEFAULT_TUNING_PATH.to_string());
        if !Path::new(&path).exists() {
            return Self::default();
        }
        match Self::load_from_file(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(error = %e, %path, "invalid tuning file, using defaults");
                Self::default()
            }
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    /// Shared HTTP client for all service wrappers.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(self.user_agent.clone())
            .connect_timeout(self.connect_timeout())
            .timeout(self.timeout())
            .build()
    }

    fn sanitized(mut self) -> Self {
        if self.connect_timeout_secs == 0 {
            self.connect_timeout_secs = default_connect_timeout_secs();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        if self.timeout_secs < self.connect_timeout_secs {
            std::mem::swap(&mut self.timeout_secs, &mut self.connect_timeout_secs);
        }
        // Cosmos rejects manual throughput below 400 RU/s.
        self.cosmos_throughput = self.cosmos_throughput.max(MIN_COSMOS_THROUGHPUT);
        if self.segment_concurrency == 0 {
            self.segment_concurrency = 1;
        }
        if self.max_upload_mb == 0 {
            self.max_upload_mb = default_max_upload_mb();
        }
        self
    }
}
