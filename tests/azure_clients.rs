// tests/azure_clients.rs
//
// REST clients against local fakes of the Language, OpenAI and Translator APIs.
//
// Covered:
// - request shape (routes, auth and region headers, api-version query)
// - reply normalization into the record types
// - full analysis through the real HTTP clients
// - per-document errors, HTTP errors and inline translation errors

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use text_insight_analyzer::analyze::{Analyzer, AzureOpenAiProvider, AzureTextAnalytics, TextAnalytics};
use text_insight_analyzer::config::{LanguageSettings, OpenAiSettings, TranslatorSettings, Tuning};
use text_insight_analyzer::record::{Category, SentimentLabel};
use text_insight_analyzer::translate::Translator;
use text_insight_analyzer::AnalysisError;

const KEY: &str = "test-key";

fn authorized(headers: &HeaderMap, name: &str) -> bool {
    headers.get(name).and_then(|v| v.to_str().ok()) == Some(KEY)
}

fn doc_text(body: &Value) -> String {
    body["documents"][0]["text"].as_str().unwrap_or_default().to_string()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error":{"code":"401","message":"Access denied due to invalid subscription key."}})),
    )
        .into_response()
}

async fn languages(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers, "Ocp-Apim-Subscription-Key") {
        return unauthorized();
    }
    let text = doc_text(&body);
    if text.contains("trigger-doc-error") {
        return Json(json!({
            "documents": [],
            "errors": [{"id":"1","error":{"code":"InvalidArgument","message":"Invalid document in request."}}]
        }))
        .into_response();
    }
    let (name, iso, score) = if text.to_lowercase().contains("bonjour") {
        ("French", "fr", 0.97)
    } else {
        ("English", "en", 0.99)
    };
    Json(json!({
        "documents": [{"id":"1","detectedLanguage":{"name":name,"iso6391Name":iso,"confidenceScore":score},"warnings":[]}],
        "errors": [],
        "modelVersion": "2022-10-01"
    }))
    .into_response()
}

async fn sentiment(headers: HeaderMap) -> Response {
    if !authorized(&headers, "Ocp-Apim-Subscription-Key") {
        return unauthorized();
    }
    Json(json!({
        "documents": [{"id":"1","sentiment":"positive","confidenceScores":{"positive":0.9,"neutral":0.08,"negative":0.02},"sentences":[],"warnings":[]}],
        "errors": []
    }))
    .into_response()
}

async fn key_phrases(headers: HeaderMap) -> Json<Value> {
    // A regional resource echoes its region back as the only phrase.
    let phrases = match headers
        .get("Ocp-Apim-Subscription-Region")
        .and_then(|v| v.to_str().ok())
    {
        Some(region) => json!([region]),
        None => json!(["release notes", "build pipeline"]),
    };
    Json(json!({
        "documents": [{"id":"1","keyPhrases":phrases,"warnings":[]}],
        "errors": []
    }))
}

async fn entities() -> Json<Value> {
    Json(json!({
        "documents": [{"id":"1","entities":[
            {"text":"Hyderabad","category":"Location","subcategory":"GPE","offset":10,"length":9,"confidenceScore":0.93}
        ],"warnings":[]}],
        "errors": []
    }))
}

async fn pii() -> Json<Value> {
    Json(json!({
        "documents": [{"id":"1","redactedText":"","entities":[
            {"text":"Asha","category":"Person","offset":0,"length":4,"confidenceScore":0.99},
            {"text":"asha@example.com","category":"Email","offset":20,"length":16,"confidenceScore":0.8}
        ],"warnings":[]}],
        "errors": []
    }))
}

async fn chat(
    Path(deployment): Path<String>,
    Query(q): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers, "api-key") || q.get("api-version").is_none() {
        return unauthorized();
    }
    assert_eq!(deployment, "gpt-test");
    let user = body["messages"][1]["content"].as_str().unwrap_or_default();
    let content = if user.contains("Text to classify:") {
        assert_eq!(body["temperature"], json!(0.0));
        "```json\n{\"label\":\"Technical / Engineering\",\"confidence\":0.83,\"explanation\":\"Build tooling.\"}\n```"
    } else {
        "The build pipeline shipped new release notes."
    };
    Json(json!({
        "id": "chatcmpl-1",
        "choices": [{"index":0,"message":{"role":"assistant","content":content},"finish_reason":"stop"}]
    }))
    .into_response()
}

async fn translate(
    Query(q): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers, "Ocp-Apim-Subscription-Key") {
        return unauthorized();
    }
    assert_eq!(q.get("api-version").map(String::as_str), Some("3.0"));
    assert_eq!(
        headers
            .get("Ocp-Apim-Subscription-Region")
            .and_then(|v| v.to_str().ok()),
        Some("centralindia")
    );
    let to = q.get("to").cloned().unwrap_or_default();
    if to == "xx" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error":{"code":400036,"message":"The target language is not valid."}})),
        )
            .into_response();
    }
    let text = body[0]["text"].as_str().unwrap_or_default();
    let out = if text == "Bonjour" { "Hello" } else { text };
    Json(json!([{"translations":[{"text":out,"to":to}]}])).into_response()
}

fn fake_azure() -> Router {
    Router::new()
        .route("/text/analytics/v3.1/languages", post(languages))
        .route("/text/analytics/v3.1/sentiment", post(sentiment))
        .route("/text/analytics/v3.1/keyPhrases", post(key_phrases))
        .route("/text/analytics/v3.1/entities/recognition/general", post(entities))
        .route("/text/analytics/v3.1/entities/recognition/pii", post(pii))
        .route("/openai/deployments/{deployment}/chat/completions", post(chat))
        .route("/translate", post(translate))
}

fn language_client(base: &str, key: &str) -> AzureTextAnalytics {
    regional_language_client(base, key, None)
}

fn regional_language_client(base: &str, key: &str, region: Option<&str>) -> AzureTextAnalytics {
    let settings = LanguageSettings {
        endpoint: base.to_string(),
        key: key.to_string(),
        region: region.map(str::to_string),
    };
    AzureTextAnalytics::new(&settings, &Tuning::default(), common::http())
}

fn openai_client(base: &str) -> AzureOpenAiProvider {
    let settings = OpenAiSettings {
        endpoint: base.to_string(),
        key: KEY.to_string(),
        model: "gpt-test".to_string(),
    };
    AzureOpenAiProvider::new(&settings, &Tuning::default(), common::http())
}

#[tokio::test]
async fn full_analysis_over_http() {
    let base = common::serve(fake_azure()).await;
    let analyzer = Analyzer::new(
        Arc::new(language_client(&base, KEY)),
        Arc::new(openai_client(&base)),
    );

    let record = analyzer
        .analyze_text_all("Asha in Hyderabad updated the build pipeline. Bonjour a tous.")
        .await
        .unwrap();

    assert_eq!(record.language.iso6391, "fr");
    assert_eq!(record.sentiment.overall, SentimentLabel::Positive);
    assert_eq!(record.sentiment.scores.positive, 0.9);
    assert_eq!(record.key_phrases, vec!["release notes", "build pipeline"]);
    assert_eq!(record.entities[0].text, "Hyderabad");
    assert_eq!(record.pii.len(), 1);
    assert_eq!(record.pii[0].category, "Email");
    assert_eq!(
        record.summary,
        vec!["The build pipeline shipped new release notes.".to_string()]
    );
    assert_eq!(record.classification.label, Category::TechnicalEngineering);
    assert_eq!(record.classification.confidence, 0.83);

    let codes: Vec<_> = record
        .multi_language
        .iter()
        .map(|l| l.iso6391.as_str())
        .collect();
    assert_eq!(codes, vec!["en", "fr"]);
}

#[tokio::test]
async fn document_level_error_is_reported() {
    let base = common::serve(fake_azure()).await;
    let client = language_client(&base, KEY);
    let err = client.detect_language("trigger-doc-error").await.unwrap_err();
    assert!(matches!(err, AnalysisError::Service { .. }));
    assert!(err.to_string().contains("Invalid document in request."));
}

#[tokio::test]
async fn region_header_is_sent_when_configured() {
    let base = common::serve(fake_azure()).await;

    let regional = regional_language_client(&base, KEY, Some("centralindia"));
    assert_eq!(
        regional.extract_key_phrases("anything").await.unwrap(),
        vec!["centralindia"]
    );

    let global = language_client(&base, KEY);
    assert_eq!(
        global.extract_key_phrases("anything").await.unwrap(),
        vec!["release notes", "build pipeline"]
    );
}

#[tokio::test]
async fn bad_key_surfaces_http_status() {
    let base = common::serve(fake_azure()).await;
    let client = language_client(&base, "wrong");
    match client.analyze_sentiment("hello").await {
        Err(AnalysisError::Api { status, message }) => {
            assert_eq!(status, 401);
            assert!(message.contains("invalid subscription key"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn translator_returns_text_or_inline_error() {
    let base = common::serve(fake_azure()).await;
    let settings = TranslatorSettings {
        endpoint: base.clone(),
        key: KEY.to_string(),
        region: Some("centralindia".to_string()),
    };
    let translator = Translator::new(&settings, &Tuning::default(), common::http());

    assert_eq!(translator.translate_text("Bonjour", "en").await, "Hello");

    let out = translator.translate_text("Bonjour", "xx").await;
    assert!(out.starts_with("Translation error: "), "{out}");
}
