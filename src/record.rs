// src/record.rs
//! The unified analysis record and its parts.
//!
//! An [`AnalysisRecord`] is assembled once per request from live service
//! responses and never mutated afterwards. The same serde shape is used for the
//! dashboard JSON view, the downloadable snapshot and the persisted document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Default download name for exported snapshots.
pub const EXPORT_FILE_NAME: &str = "nlp_analysis_result.json";

pub const FALLBACK_CLASSIFICATION_CONFIDENCE: f64 = 0.70;
pub const FALLBACK_CLASSIFICATION_EXPLANATION: &str = "Failed to parse GPT classification output.";

/// The fixed single-label category set used by the generative classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Personal Information")]
    PersonalInformation,
    #[serde(rename = "Professional / Work")]
    ProfessionalWork,
    #[serde(rename = "Education")]
    Education,
    #[serde(rename = "Technical / Engineering")]
    TechnicalEngineering,
    #[serde(rename = "Healthcare / Medical")]
    HealthcareMedical,
    #[serde(rename = "Finance / Banking")]
    FinanceBanking,
    #[serde(rename = "Travel / Location")]
    TravelLocation,
    #[serde(rename = "Legal / Compliance")]
    LegalCompliance,
    #[serde(rename = "Sentiment / Opinion")]
    SentimentOpinion,
    #[default]
    #[serde(rename = "Miscellaneous / Other")]
    MiscellaneousOther,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::PersonalInformation,
        Category::ProfessionalWork,
        Category::Education,
        Category::TechnicalEngineering,
        Category::HealthcareMedical,
        Category::FinanceBanking,
        Category::TravelLocation,
        Category::LegalCompliance,
        Category::SentimentOpinion,
        Category::MiscellaneousOther,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::PersonalInformation => "Personal Information",
            Category::ProfessionalWork => "Professional / Work",
            Category::Education => "Education",
            Category::TechnicalEngineering => "Technical / Engineering",
            Category::HealthcareMedical => "Healthcare / Medical",
            Category::FinanceBanking => "Finance / Banking",
            Category::TravelLocation => "Travel / Location",
            Category::LegalCompliance => "Legal / Compliance",
            Category::SentimentOpinion => "Sentiment / Opinion",
            Category::MiscellaneousOther => "Miscellaneous / Other",
        }
    }

    /// Exact match on the trimmed label first, then a case-insensitive one.
    pub fn from_label(label: &str) -> Option<Self> {
        let wanted = label.trim();
        Self::ALL
            .iter()
            .find(|c| c.as_str() == wanted)
            .or_else(|| Self::ALL.iter().find(|c| c.as_str().eq_ignore_ascii_case(wanted)))
            .copied()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub name: String,
    pub iso6391: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
    Mixed,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Mixed => "mixed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(SentimentLabel::Positive),
            "neutral" => Some(SentimentLabel::Neutral),
            "negative" => Some(SentimentLabel::Negative),
            "mixed" => Some(SentimentLabel::Mixed),
            _ => None,
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScores {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub overall: SentimentLabel,
    pub scores: SentimentScores,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: Category,
    pub confidence: f64,
    pub explanation: String,
}

impl Classification {
    /// Returned whenever the generative reply cannot be used.
    pub fn fallback() -> Self {
        Self {
            label: Category::MiscellaneousOther,
            confidence: FALLBACK_CLASSIFICATION_CONFIDENCE,
            explanation: FALLBACK_CLASSIFICATION_EXPLANATION.to_string(),
        }
    }
}

/// A recognized entity or PII span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMatch {
    pub text: String,
    pub category: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub language: LanguageInfo,
    pub multi_language: Vec<LanguageInfo>,
    pub sentiment: Sentiment,
    pub classification: Classification,
    pub key_phrases: Vec<String>,
    pub entities: Vec<EntityMatch>,
    pub pii: Vec<EntityMatch>,
    pub summary: Vec<String>,
}

impl AnalysisRecord {
    pub fn has_pii(&self) -> bool {
        !self.pii.is_empty()
    }

    /// Sorted, de-duplicated PII categories.
    pub fn pii_categories(&self) -> Vec<String> {
        self.pii
            .iter()
            .map(|e| e.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Pretty JSON snapshot for download; non-ASCII is written as-is.
    pub fn to_export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_export_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}
