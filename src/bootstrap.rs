// src/bootstrap.rs
//! Builds the service graph from the environment: one shared HTTP client, the
//! analyzer, and the optional translator and persistence layers.
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::analyze::{Analyzer, AzureOpenAiProvider, AzureTextAnalytics};
use crate::config::{CosmosSettings, LanguageSettings, OpenAiSettings, TranslatorSettings, Tuning};
use crate::persist::{CosmosStore, Persistence};
use crate::translate::Translator;

pub struct Runtime {
    pub tuning: Tuning,
    pub analyzer: Arc<Analyzer>,
    pub translator: Option<Arc<Translator>>,
    pub persistence: Option<Arc<Persistence>>,
}

impl Runtime {
    /// Language + OpenAI settings are required; translator and Cosmos are optional.
    pub fn from_env() -> anyhow::Result<Self> {
        let tuning = Tuning::load();
        Self::from_env_with(tuning)
    }

    pub fn from_env_with(tuning: Tuning) -> anyhow::Result<Self> {
        let http = tuning.http_client().context("build HTTP client")?;

        let language = LanguageSettings::from_env().context("language service settings")?;
        let openai = OpenAiSettings::from_env().context("Azure OpenAI settings")?;
        // Safe diagnostics: endpoints and key lengths only
        info!(
            "services: language={} (key_len={}), openai={} model={} (key_len={})",
            language.endpoint,
            language.key.len(),
            openai.endpoint,
            openai.model,
            openai.key.len()
        );

        let analytics = Arc::new(AzureTextAnalytics::new(&language, &tuning, http.clone()));
        let generative = Arc::new(AzureOpenAiProvider::new(&openai, &tuning, http.clone()));
        let analyzer = Arc::new(
            Analyzer::new(analytics, generative).with_segment_concurrency(tuning.segment_concurrency),
        );

        let translator = match TranslatorSettings::from_env() {
            Ok(s) => Some(Arc::new(Translator::new(&s, &tuning, http.clone()))),
            Err(e) => {
                warn!("translator disabled: {}", e);
                None
            }
        };

        let persistence = match CosmosSettings::from_env() {
            Ok(s) => {
                let store = CosmosStore::new(&s, &tuning, http).context("Cosmos DB store")?;
                info!(
                    "persistence: cosmos db={} container={} (key_len={})",
                    s.database,
                    s.container,
                    s.key.len()
                );
                Some(Arc::new(Persistence::new(Arc::new(store))))
            }
            Err(e) => {
                warn!("persistence disabled: {}", e);
                None
            }
        };

        Ok(Self {
            tuning,
            analyzer,
            translator,
            persistence,
        })
    }
}
