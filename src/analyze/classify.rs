// src/analyze/classify.rs
//! Single-label classification via a constrained generative prompt.
//!
//! The model is asked for one bare JSON object, but replies are parsed
//! defensively: code fences are stripped, missing keys get defaults, and any
//! reply that still cannot be read collapses to [`Classification::fallback`].
//! Labels outside the fixed category set are mapped to `Miscellaneous / Other`.
//! Nothing in this module returns an error.

use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::ai_adapter::{ChatRequest, Provider};
use crate::record::{Category, Classification};

pub const DEFAULT_PARSED_CONFIDENCE: f64 = 0.75;

const CLASSIFY_SYSTEM_PROMPT: &str = "Return ONLY valid JSON.";

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)```(?:json)?").expect("fence regex"));

pub fn classification_request(text: &str) -> ChatRequest {
    let categories = serde_json::to_string(
        &Category::ALL.iter().map(Category::as_str).collect::<Vec<_>>(),
    )
    .unwrap_or_default();

    let user = format!(
        r#"You must classify the text into EXACTLY ONE of these categories:

{categories}

Return ONLY valid JSON with this structure:

{{
  "label": "category from list",
  "confidence": 0.0 to 1.0,
  "explanation": "short explanation"
}}

Do NOT add anything else.
Do NOT add comments.
Do NOT add markdown.
Do NOT wrap in ```json```.

Text to classify:
{text}"#
    );

    ChatRequest {
        system: CLASSIFY_SYSTEM_PROMPT.to_string(),
        user,
        temperature: Some(0.0),
    }
}

/// Classify `text`. Transport failures are absorbed like parse failures.
pub async fn classify(provider: &dyn Provider, text: &str) -> Classification {
    let req = classification_request(text);
    match provider.complete(&req).await {
        Ok(raw) => parse_classification(&raw),
        Err(e) => {
            warn!(error = %e, provider = provider.name(), "classification request failed, using fallback");
            counter!("classification_fallback_total").increment(1);
            Classification::fallback()
        }
    }
}

/// Remove ```` ```json ```` / ```` ``` ```` markers anywhere in the reply, then trim.
pub fn strip_code_fences(raw: &str) -> String {
    CODE_FENCE.replace_all(raw, "").trim().to_string()
}

pub fn parse_classification(raw: &str) -> Classification {
    let cleaned = strip_code_fences(raw);
    match serde_json::from_str::<Value>(&cleaned)
        .ok()
        .as_ref()
        .and_then(Value::as_object)
        .and_then(from_object)
    {
        Some(c) => c,
        None => {
            debug!(chars = cleaned.len(), "unparseable classification reply");
            counter!("classification_fallback_total").increment(1);
            Classification::fallback()
        }
    }
}

fn from_object(obj: &Map<String, Value>) -> Option<Classification> {
    let label = match obj.get("label") {
        None => Category::MiscellaneousOther,
        Some(Value::String(s)) => Category::from_label(s).unwrap_or_else(|| {
            debug!(label = %s, "label outside category set");
            Category::MiscellaneousOther
        }),
        Some(_) => Category::MiscellaneousOther,
    };

    let confidence = match obj.get("confidence") {
        None => DEFAULT_PARSED_CONFIDENCE,
        Some(v) => coerce_f64(v)?,
    };

    let explanation = match obj.get("explanation") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    Some(Classification {
        label,
        confidence: confidence.clamp(0.0, 1.0),
        explanation,
    })
}

/// Numbers and numeric strings; anything else is a parse failure.
fn coerce_f64(v: &Value) -> Option<f64> {
    let f = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    f.is_finite().then_some(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::ai_adapter::MockProvider;
    use crate::record::{FALLBACK_CLASSIFICATION_CONFIDENCE, FALLBACK_CLASSIFICATION_EXPLANATION};

    fn education() -> Classification {
        Classification {
            label: Category::Education,
            confidence: 0.92,
            explanation: "about school".into(),
        }
    }

    #[test]
    fn plain_json_parses() {
        let raw = r#"{"label":"Education","confidence":0.92,"explanation":"about school"}"#;
        assert_eq!(parse_classification(raw), education());
    }

    #[test]
    fn fenced_json_parses() {
        let raw = "```json\n{\"label\":\"Education\",\"confidence\":0.92,\"explanation\":\"about school\"}\n```";
        assert_eq!(parse_classification(raw), education());
        let raw = "```{\"label\":\"Education\",\"confidence\":0.92,\"explanation\":\"about school\"}```";
        assert_eq!(parse_classification(raw), education());
    }

    #[test]
    fn non_json_yields_exact_fallback() {
        let out = parse_classification("not json at all");
        assert_eq!(out.label, Category::MiscellaneousOther);
        assert_eq!(out.confidence, FALLBACK_CLASSIFICATION_CONFIDENCE);
        assert_eq!(out.explanation, FALLBACK_CLASSIFICATION_EXPLANATION);
    }

    #[test]
    fn missing_keys_take_defaults() {
        let out = parse_classification("{}");
        assert_eq!(out.label, Category::MiscellaneousOther);
        assert_eq!(out.confidence, DEFAULT_PARSED_CONFIDENCE);
        assert_eq!(out.explanation, "");
    }

    #[test]
    fn numeric_string_confidence_is_coerced_and_clamped() {
        let out = parse_classification(r#"{"label":"Finance / Banking","confidence":"0.6"}"#);
        assert_eq!(out.label, Category::FinanceBanking);
        assert_eq!(out.confidence, 0.6);

        let out = parse_classification(r#"{"label":"Finance / Banking","confidence":7}"#);
        assert_eq!(out.confidence, 1.0);
    }

    #[test]
    fn bad_confidence_or_non_object_falls_back() {
        assert_eq!(
            parse_classification(r#"{"label":"Education","confidence":"high"}"#),
            Classification::fallback()
        );
        assert_eq!(
            parse_classification(r#"{"label":"Education","confidence":null}"#),
            Classification::fallback()
        );
        assert_eq!(parse_classification(r#"["Education"]"#), Classification::fallback());
    }

    #[test]
    fn unknown_label_is_replaced_but_details_kept() {
        let out = parse_classification(r#"{"label":"Sports","confidence":0.8,"explanation":"match report"}"#);
        assert_eq!(out.label, Category::MiscellaneousOther);
        assert_eq!(out.confidence, 0.8);
        assert_eq!(out.explanation, "match report");
    }

    #[test]
    fn prompt_is_deterministic_and_lists_every_category() {
        let req = classification_request("Some text");
        assert_eq!(req.temperature, Some(0.0));
        for c in Category::ALL {
            assert!(req.user.contains(c.as_str()), "missing {c}");
        }
        assert!(req.user.ends_with("Text to classify:\nSome text"));
    }

    #[tokio::test]
    async fn transport_failure_is_absorbed() {
        let mock = MockProvider::failing("503");
        assert_eq!(classify(&mock, "x").await, Classification::fallback());
    }
}
