// src/translate.rs
//! Azure Translator wrapper.
//!
//! Failures are returned *as text* (`"Translation error: ..."`) instead of
//! being raised: the only consumers are the dashboard and CLI, which show the
//! string either way.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{Tuning, TranslatorSettings};
use crate::error::{AnalysisError, Result};

/// Targets offered by the dashboard, as (display name, language code).
pub const SUPPORTED_TARGETS: [(&str, &str); 10] = [
    ("English", "en"),
    ("Spanish", "es"),
    ("French", "fr"),
    ("Hindi", "hi"),
    ("Arabic", "ar"),
    ("Japanese", "ja"),
    ("Tamil", "ta"),
    ("Telugu", "te"),
    ("German", "de"),
    ("Chinese", "zh"),
];

pub const DEFAULT_TARGET: &str = "en";

#[derive(Clone)]
pub struct Translator {
    client: Client,
    endpoint: String,
    key: String,
    region: Option<String>,
    api_version: String,
}

#[derive(Serialize)]
struct TextItem<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct TranslateItem {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
struct Translation {
    text: String,
}

impl Translator {
    pub fn new(settings: &TranslatorSettings, tuning: &Tuning, client: Client) -> Self {
        Self {
            client,
            endpoint: settings.endpoint.clone(),
            key: settings.key.clone(),
            region: settings.region.clone(),
            api_version: tuning.translator_api_version.clone(),
        }
    }

    /// Translated text, or a descriptive `Translation error: ...` string.
    pub async fn translate_text(&self, text: &str, target_lang: &str) -> String {
        match self.try_translate(text, target_lang).await {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, target = target_lang, "translation failed");
                format!("Translation error: {e}")
            }
        }
    }

    async fn try_translate(&self, text: &str, target_lang: &str) -> Result<String> {
        let url = format!("{}/translate", self.endpoint);
        let mut req = self
            .client
            .post(url)
            .query(&[("api-version", self.api_version.as_str()), ("to", target_lang)])
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .json(&[TextItem { text }]);
        if let Some(region) = &self.region {
            req = req.header("Ocp-Apim-Subscription-Region", region);
        }

        let items: Vec<TranslateItem> = req.send().await?.error_for_status()?.json().await?;
        items
            .into_iter()
            .next()
            .and_then(|item| item.translations.into_iter().next())
            .map(|t| t.text)
            .ok_or_else(|| AnalysisError::service("translator", "reply contained no translations"))
    }
}

/// Code for a dashboard display name (case-insensitive), if offered.
pub fn code_for(display_name: &str) -> Option<&'static str> {
    SUPPORTED_TARGETS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(display_name.trim()))
        .map(|(_, code)| *code)
}

pub fn is_supported_code(code: &str) -> bool {
    SUPPORTED_TARGETS.iter().any(|(_, c)| *c == code)
}
