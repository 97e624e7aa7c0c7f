// src/persist/mod.rs
//! Saving analyses to a document store.
//!
//! A saved analysis is the record flattened into a [`PersistedDocument`] with
//! a fresh UUID and capture timestamp. Saving the same record twice creates two
//! documents. The partition key is the classification label.

pub mod cosmos;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AnalysisError, Result};
use crate::record::{AnalysisRecord, EntityMatch, LanguageInfo, SentimentLabel, SentimentScores};

pub use cosmos::CosmosStore;

pub const UNCLASSIFIED_PARTITION: &str = "Unclassified";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Text,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedDocument {
    pub id: String,
    pub timestamp: String,
    pub source_type: SourceType,
    pub file_name: Option<String>,
    pub language: String,
    pub language_name: String,
    pub sentiment: SentimentLabel,
    pub sentiment_scores: SentimentScores,
    pub classification_label: String,
    pub classification_confidence: f64,
    pub classification_explanation: String,
    pub has_pii: bool,
    pub pii_categories: Vec<String>,
    pub pii: Vec<EntityMatch>,
    pub multi_language: Vec<LanguageInfo>,
    pub summary: String,
    pub key_phrases: Vec<String>,
    pub entities: Vec<EntityMatch>,
    pub raw_text: String,
}

impl PersistedDocument {
    pub fn build(
        record: &AnalysisRecord,
        raw_text: &str,
        source_type: SourceType,
        file_name: Option<&str>,
        id: Uuid,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.to_string(),
            timestamp: captured_at.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            source_type,
            file_name: file_name.map(str::to_string),
            language: record.language.iso6391.clone(),
            language_name: record.language.name.clone(),
            sentiment: record.sentiment.overall,
            sentiment_scores: record.sentiment.scores,
            classification_label: partition_label(record.classification.label.as_str()),
            classification_confidence: record.classification.confidence,
            classification_explanation: record.classification.explanation.clone(),
            has_pii: record.has_pii(),
            pii_categories: record.pii_categories(),
            pii: record.pii.clone(),
            multi_language: record.multi_language.clone(),
            summary: record.summary.join(" "),
            key_phrases: record.key_phrases.clone(),
            entities: record.entities.clone(),
            raw_text: raw_text.to_string(),
        }
    }

    /// Fresh id, captured now.
    pub fn new(
        record: &AnalysisRecord,
        raw_text: &str,
        source_type: SourceType,
        file_name: Option<&str>,
    ) -> Self {
        Self::build(record, raw_text, source_type, file_name, Uuid::new_v4(), Utc::now())
    }
}

/// Partition value for a label; blank labels go to [`UNCLASSIFIED_PARTITION`].
pub fn partition_label(label: &str) -> String {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        UNCLASSIFIED_PARTITION.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Single-document create against some store. One call, no transaction.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_document(&self, partition_key: &str, document: &serde_json::Value) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// The save boundary used by the dashboard and CLI.
#[derive(Clone)]
pub struct Persistence {
    store: Arc<dyn DocumentStore>,
}

impl Persistence {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Persist `record` and return the generated document id.
    pub async fn save(
        &self,
        record: &AnalysisRecord,
        raw_text: &str,
        source_type: SourceType,
        file_name: Option<&str>,
    ) -> Result<String> {
        let doc = PersistedDocument::new(record, raw_text, source_type, file_name);
        let value = serde_json::to_value(&doc)
            .map_err(|e| AnalysisError::Persistence(format!("serialize: {e}")))?;

        match self
            .store
            .create_document(&doc.classification_label, &value)
            .await
        {
            Ok(()) => {
                counter!("persist_saves_total").increment(1);
                info!(id = %doc.id, partition = %doc.classification_label, store = self.store.name(), "analysis saved");
                Ok(doc.id)
            }
            Err(e) => {
                counter!("persist_failures_total").increment(1);
                warn!(error = %e, store = self.store.name(), "save failed");
                Err(match e {
                    AnalysisError::Persistence(msg) => AnalysisError::Persistence(msg),
                    other => AnalysisError::Persistence(other.to_string()),
                })
            }
        }
    }
}

/// In-process store for tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<Vec<(String, serde_json::Value)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(partition key, document)` pairs in insertion order.
    pub fn documents(&self) -> Vec<(String, serde_json::Value)> {
        match self.docs.lock() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_document(&self, partition_key: &str, document: &serde_json::Value) -> Result<()> {
        let mut g = self
            .docs
            .lock()
            .map_err(|_| AnalysisError::Persistence("memory store poisoned".into()))?;
        g.push((partition_key.to_string(), document.clone()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::sample_record;
    use chrono::TimeZone;

    #[test]
    fn document_derives_pii_flags_and_flattens() {
        let record = sample_record();
        let id = Uuid::nil();
        let at = Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap();
        let doc = PersistedDocument::build(&record, "raw", SourceType::File, Some("in.pdf"), id, at);

        assert_eq!(doc.id, "00000000-0000-0000-0000-000000000000");
        assert_eq!(doc.timestamp, "2024-02-01T10:00:00.000000Z");
        assert_eq!(doc.language, "en");
        assert_eq!(doc.classification_label, "Healthcare / Medical");
        assert!(doc.has_pii);
        assert_eq!(doc.pii_categories, vec!["Email", "PhoneNumber"]);
        assert_eq!(doc.file_name.as_deref(), Some("in.pdf"));

        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v["source_type"], "file");
        assert_eq!(v["sentiment"], "mixed");
    }

    #[test]
    fn blank_labels_fall_into_unclassified() {
        assert_eq!(partition_label("   "), UNCLASSIFIED_PARTITION);
        assert_eq!(partition_label("Education"), "Education");
    }

    #[tokio::test]
    async fn each_save_creates_a_new_document() {
        let store = Arc::new(MemoryStore::new());
        let p = Persistence::new(store.clone());
        let record = sample_record();

        let a = p.save(&record, "raw", SourceType::Text, None).await.unwrap();
        let b = p.save(&record, "raw", SourceType::Text, None).await.unwrap();
        assert_ne!(a, b);

        let docs = store.documents();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].0, "Healthcare / Medical");
        assert_eq!(docs[0].1["id"], a.as_str());
        assert!(docs[0].1["file_name"].is_null());
    }

    struct BrokenStore;

    #[async_trait]
    impl DocumentStore for BrokenStore {
        async fn create_document(&self, _: &str, _: &serde_json::Value) -> Result<()> {
            Err(AnalysisError::Api {
                status: 503,
                message: "unavailable".into(),
            })
        }
        fn name(&self) -> &'static str {
            "broken"
        }
    }

    #[tokio::test]
    async fn store_errors_surface_as_persistence_errors() {
        let p = Persistence::new(Arc::new(BrokenStore));
        let err = p
            .save(&sample_record(), "raw", SourceType::Text, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Persistence(_)));
        assert!(err.to_string().starts_with("Failed to save to CosmosDB: "));
    }
}
