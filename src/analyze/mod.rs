// src/analyze/mod.rs
//! Analysis pipeline entry: fans out to the language service and the generative
//! model, then normalizes everything into one [`AnalysisRecord`].
//!
//! Order of work inside [`Analyzer::analyze_text_all`]:
//! 1) reject blank input before any network call
//! 2) whole-document language, sentiment, key phrases, entities, PII
//! 3) generative summary
//! 4) multi-segment language breakdown (once)
//! 5) generative classification (never fails)
//! 6) PII allow-list filter, then assembly
//!
//! Steps 2 to 5 are independent and run concurrently; list fields keep service order.

pub mod ai_adapter;
pub mod classify;
pub mod multilang;
pub mod pii;
pub mod summarize;
pub mod text_analytics;

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{info, warn};

use crate::error::{AnalysisError, Result};
use crate::record::AnalysisRecord;
use crate::telemetry::anon_hash;

// Re-export convenient types.
pub use ai_adapter::{AzureOpenAiProvider, ChatRequest, DynProvider, MockProvider, Provider};
pub use classify::{classify, parse_classification, strip_code_fences};
pub use multilang::{detect_languages_multiline, rank_languages, MULTI_LANGUAGE_THRESHOLD};
pub use pii::{filter_sensitive, SENSITIVE_PII_CATEGORIES};
pub use summarize::summarize;
pub use text_analytics::{AzureTextAnalytics, MockTextAnalytics, TextAnalytics};

const DEFAULT_SEGMENT_CONCURRENCY: usize = 4;

/// Stateless orchestrator; clone the `Arc`s, not the clients.
#[derive(Clone)]
pub struct Analyzer {
    analytics: Arc<dyn TextAnalytics>,
    generative: DynProvider,
    segment_concurrency: usize,
}

impl Analyzer {
    pub fn new(analytics: Arc<dyn TextAnalytics>, generative: DynProvider) -> Self {
        Self {
            analytics,
            generative,
            segment_concurrency: DEFAULT_SEGMENT_CONCURRENCY,
        }
    }

    pub fn with_segment_concurrency(mut self, n: usize) -> Self {
        self.segment_concurrency = n.max(1);
        self
    }

    pub fn provider_name(&self) -> &'static str {
        self.generative.name()
    }

    /// Produce the unified record for `text`, or fail as a whole.
    pub async fn analyze_text_all(&self, text: &str) -> Result<AnalysisRecord> {
        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let started = Instant::now();
        let id = anon_hash(text);
        counter!("analysis_requests_total").increment(1);

        let analytics = self.analytics.as_ref();
        let generative = self.generative.as_ref();

        let joined = tokio::try_join!(
            analytics.detect_language(text),
            analytics.analyze_sentiment(text),
            analytics.extract_key_phrases(text),
            analytics.recognize_entities(text),
            analytics.recognize_pii_entities(text),
            summarize(generative, text),
            async {
                Ok::<_, AnalysisError>(
                    detect_languages_multiline(analytics, text, self.segment_concurrency).await,
                )
            },
            async { Ok::<_, AnalysisError>(classify(generative, text).await) },
        );

        let (language, sentiment, key_phrases, entities, pii, summary, multi_language, classification) =
            match joined {
                Ok(parts) => parts,
                Err(e) => {
                    counter!("analysis_failures_total").increment(1);
                    warn!(%id, error = %e, "analysis aborted");
                    return Err(e);
                }
            };

        let record = AnalysisRecord {
            language,
            multi_language,
            sentiment,
            classification,
            key_phrases,
            entities,
            pii: filter_sensitive(pii),
            summary: vec![summary],
        };

        let elapsed_ms = started.elapsed().as_millis() as f64;
        histogram!("analysis_duration_ms").record(elapsed_ms);
        info!(
            %id,
            chars = text.chars().count(),
            language = %record.language.iso6391,
            label = %record.classification.label,
            pii = record.pii.len(),
            elapsed_ms,
            "analysis complete"
        );
        Ok(record)
    }
}
