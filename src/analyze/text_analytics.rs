// src/analyze/text_analytics.rs
//! Azure AI Language (Text Analytics v3.x REST) client.
//!
//! Each call sends exactly one document and normalizes the reply into the
//! record types, so the aggregator never sees service DTOs. A per-document
//! error in the reply is treated like a transport failure.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{LanguageSettings, Tuning};
use crate::error::{AnalysisError, Result};
use crate::record::{EntityMatch, LanguageInfo, Sentiment, SentimentLabel, SentimentScores};

const SERVICE: &str = "language";

/// Single-document NLP annotations. Implementations must be safe for concurrent reuse.
#[async_trait]
pub trait TextAnalytics: Send + Sync {
    async fn detect_language(&self, text: &str) -> Result<LanguageInfo>;
    async fn analyze_sentiment(&self, text: &str) -> Result<Sentiment>;
    async fn extract_key_phrases(&self, text: &str) -> Result<Vec<String>>;
    async fn recognize_entities(&self, text: &str) -> Result<Vec<EntityMatch>>;
    async fn recognize_pii_entities(&self, text: &str) -> Result<Vec<EntityMatch>>;
}

pub struct AzureTextAnalytics {
    http: reqwest::Client,
    base: String,
    key: String,
    region: Option<String>,
}

impl AzureTextAnalytics {
    pub fn new(settings: &LanguageSettings, tuning: &Tuning, http: reqwest::Client) -> Self {
        Self {
            http,
            base: format!(
                "{}/text/analytics/{}",
                settings.endpoint, tuning.language_api_version
            ),
            key: settings.key.clone(),
            region: settings.region.clone(),
        }
    }

    async fn call<D: DeserializeOwned>(&self, route: &str, text: &str) -> Result<D> {
        let body = Request {
            documents: vec![Document { id: "1", text }],
        };
        let mut req = self
            .http
            .post(format!("{}/{}", self.base, route))
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .json(&body);
        if let Some(region) = &self.region {
            req = req.header("Ocp-Apim-Subscription-Region", region);
        }
        let resp = req.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(AnalysisError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<D> = resp.json().await?;
        debug!(route, docs = envelope.documents.len(), errors = envelope.errors.len(), "text analytics reply");
        first_document(envelope)
    }
}

#[derive(Serialize)]
struct Document<'a> {
    id: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
struct Request<'a> {
    documents: Vec<Document<'a>>,
}

#[derive(Deserialize)]
struct Envelope<D> {
    #[serde(default = "Vec::new")]
    documents: Vec<D>,
    #[serde(default)]
    errors: Vec<DocumentError>,
}

#[derive(Deserialize)]
struct DocumentError {
    #[serde(default)]
    id: String,
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LanguageDoc {
    detected_language: DetectedLanguage,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectedLanguage {
    name: String,
    iso6391_name: String,
    confidence_score: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SentimentDoc {
    sentiment: String,
    confidence_scores: ScoresDto,
}

#[derive(Deserialize)]
struct ScoresDto {
    positive: f64,
    neutral: f64,
    negative: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyPhraseDoc {
    #[serde(default)]
    key_phrases: Vec<String>,
}

#[derive(Deserialize)]
struct EntitiesDoc {
    #[serde(default)]
    entities: Vec<EntityDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityDto {
    text: String,
    category: String,
    confidence_score: f64,
}

impl From<EntityDto> for EntityMatch {
    fn from(e: EntityDto) -> Self {
        EntityMatch {
            text: e.text,
            category: e.category,
            confidence: e.confidence_score,
        }
    }
}

fn first_document<D>(envelope: Envelope<D>) -> Result<D> {
    if let Some(err) = envelope.errors.into_iter().next() {
        return Err(AnalysisError::service(
            SERVICE,
            format!("document {}: {} ({})", err.id, err.error.message, err.error.code),
        ));
    }
    envelope
        .documents
        .into_iter()
        .next()
        .ok_or_else(|| AnalysisError::service(SERVICE, "reply contained no documents"))
}

#[async_trait]
impl TextAnalytics for AzureTextAnalytics {
    async fn detect_language(&self, text: &str) -> Result<LanguageInfo> {
        let doc: LanguageDoc = self.call("languages", text).await?;
        let d = doc.detected_language;
        Ok(LanguageInfo {
            name: d.name,
            iso6391: d.iso6391_name,
            confidence: d.confidence_score,
        })
    }

    async fn analyze_sentiment(&self, text: &str) -> Result<Sentiment> {
        let doc: SentimentDoc = self.call("sentiment", text).await?;
        let overall = SentimentLabel::parse(&doc.sentiment).ok_or_else(|| {
            AnalysisError::service(SERVICE, format!("unknown sentiment '{}'", doc.sentiment))
        })?;
        Ok(Sentiment {
            overall,
            scores: SentimentScores {
                positive: doc.confidence_scores.positive,
                neutral: doc.confidence_scores.neutral,
                negative: doc.confidence_scores.negative,
            },
        })
    }

    async fn extract_key_phrases(&self, text: &str) -> Result<Vec<String>> {
        let doc: KeyPhraseDoc = self.call("keyPhrases", text).await?;
        Ok(doc.key_phrases)
    }

    async fn recognize_entities(&self, text: &str) -> Result<Vec<EntityMatch>> {
        let doc: EntitiesDoc = self.call("entities/recognition/general", text).await?;
        Ok(doc.entities.into_iter().map(EntityMatch::from).collect())
    }

    async fn recognize_pii_entities(&self, text: &str) -> Result<Vec<EntityMatch>> {
        let doc: EntitiesDoc = self.call("entities/recognition/pii", text).await?;
        Ok(doc.entities.into_iter().map(EntityMatch::from).collect())
    }
}

type LanguageFn = dyn Fn(&str) -> Result<LanguageInfo> + Send + Sync;

/// In-memory stand-in for tests and offline runs. Counts every call.
pub struct MockTextAnalytics {
    language: Box<LanguageFn>,
    sentiment: Sentiment,
    key_phrases: Vec<String>,
    entities: Vec<EntityMatch>,
    pii: Vec<EntityMatch>,
    fail_with: Option<String>,
    calls: AtomicUsize,
}

impl MockTextAnalytics {
    /// Everything is English, neutral, and annotation-free.
    pub fn english() -> Self {
        Self {
            language: Box::new(|_| Ok(language("English", "en", 1.0))),
            sentiment: Sentiment {
                overall: SentimentLabel::Neutral,
                scores: SentimentScores {
                    positive: 0.1,
                    neutral: 0.8,
                    negative: 0.1,
                },
            },
            key_phrases: Vec::new(),
            entities: Vec::new(),
            pii: Vec::new(),
            fail_with: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_language_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<LanguageInfo> + Send + Sync + 'static,
    {
        self.language = Box::new(f);
        self
    }

    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = sentiment;
        self
    }

    pub fn with_key_phrases(mut self, phrases: Vec<String>) -> Self {
        self.key_phrases = phrases;
        self
    }

    pub fn with_entities(mut self, entities: Vec<EntityMatch>) -> Self {
        self.entities = entities;
        self
    }

    pub fn with_pii(mut self, pii: Vec<EntityMatch>) -> Self {
        self.pii = pii;
        self
    }

    /// Every whole-document call fails (language detection keeps using the language fn).
    pub fn with_outage(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(msg) => Err(AnalysisError::service(SERVICE, msg.clone())),
            None => Ok(()),
        }
    }
}

/// Shorthand for building a [`LanguageInfo`].
pub fn language(name: &str, iso6391: &str, confidence: f64) -> LanguageInfo {
    LanguageInfo {
        name: name.to_string(),
        iso6391: iso6391.to_string(),
        confidence,
    }
}

#[async_trait]
impl TextAnalytics for MockTextAnalytics {
    async fn detect_language(&self, text: &str) -> Result<LanguageInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.language)(text)
    }

    async fn analyze_sentiment(&self, _text: &str) -> Result<Sentiment> {
        self.tick()?;
        Ok(self.sentiment.clone())
    }

    async fn extract_key_phrases(&self, _text: &str) -> Result<Vec<String>> {
        self.tick()?;
        Ok(self.key_phrases.clone())
    }

    async fn recognize_entities(&self, _text: &str) -> Result<Vec<EntityMatch>> {
        self.tick()?;
        Ok(self.entities.clone())
    }

    async fn recognize_pii_entities(&self, _text: &str) -> Result<Vec<EntityMatch>> {
        self.tick()?;
        Ok(self.pii.clone())
    }
}
