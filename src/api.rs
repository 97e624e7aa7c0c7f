// src/api.rs
//! HTTP surface for the dashboard: analyze text or an upload, translate,
//! save and export. Every handler reuses the same [`Analyzer`].
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::analyze::Analyzer;
use crate::config::Tuning;
use crate::error::AnalysisError;
use crate::extract::extract_text_from_bytes;
use crate::persist::{Persistence, SourceType};
use crate::record::{AnalysisRecord, EXPORT_FILE_NAME};
use crate::translate::{code_for, is_supported_code, Translator, DEFAULT_TARGET, SUPPORTED_TARGETS};

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub translator: Option<Arc<Translator>>,
    pub persistence: Option<Arc<Persistence>>,
    /// Request body cap in bytes.
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(analyzer: Arc<Analyzer>) -> Self {
        Self {
            analyzer,
            translator: None,
            persistence: None,
            max_body_bytes: Tuning::default().max_upload_bytes(),
        }
    }

    pub fn with_max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }

    pub fn with_translator(mut self, translator: Arc<Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn with_persistence(mut self, persistence: Arc<Persistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.max_body_bytes;
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/analyze", post(analyze_text))
        .route("/analyze/file", post(analyze_file))
        .route("/translate", post(translate))
        .route("/translate/languages", get(languages))
        .route("/save", post(save))
        .route("/export", post(export))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Handler error: the pipeline error plus its HTTP status.
#[derive(Debug)]
pub struct ApiError(pub AnalysisError);

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AnalysisError::EmptyInput => StatusCode::BAD_REQUEST,
            AnalysisError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AnalysisError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AnalysisError::Http(_)
            | AnalysisError::Api { .. }
            | AnalysisError::Service { .. }
            | AnalysisError::Persistence(_) => StatusCode::BAD_GATEWAY,
            AnalysisError::MissingConfig(_) => StatusCode::SERVICE_UNAVAILABLE,
            AnalysisError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message.into() }))).into_response()
}

#[derive(Deserialize)]
struct AnalyzeReq {
    text: String,
}

#[derive(Serialize)]
struct AnalyzeResp {
    source_type: SourceType,
    file_name: Option<String>,
    raw_text: String,
    result: AnalysisRecord,
}

async fn analyze_text(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeReq>,
) -> Result<Json<AnalyzeResp>, ApiError> {
    let result = state.analyzer.analyze_text_all(&body.text).await?;
    Ok(Json(AnalyzeResp {
        source_type: SourceType::Text,
        file_name: None,
        raw_text: body.text,
        result,
    }))
}

#[derive(Deserialize)]
struct FileQuery {
    file_name: String,
}

async fn analyze_file(
    State(state): State<AppState>,
    Query(q): Query<FileQuery>,
    bytes: Bytes,
) -> Result<Json<AnalyzeResp>, ApiError> {
    let raw_text = extract_text_from_bytes(&q.file_name, &bytes)?;
    let result = state.analyzer.analyze_text_all(&raw_text).await?;
    Ok(Json(AnalyzeResp {
        source_type: SourceType::File,
        file_name: Some(q.file_name),
        raw_text,
        result,
    }))
}

#[derive(Deserialize)]
struct TranslateReq {
    text: String,
    /// Language code (`hi`) or display name (`Hindi`).
    #[serde(default)]
    to: Option<String>,
}

async fn translate(State(state): State<AppState>, Json(body): Json<TranslateReq>) -> Response {
    let Some(translator) = state.translator.clone() else {
        return ApiError(AnalysisError::MissingConfig("AZURE_TRANSLATE_KEY")).into_response();
    };
    let requested = body.to.unwrap_or_else(|| DEFAULT_TARGET.to_string());
    let to = if is_supported_code(&requested) {
        requested
    } else if let Some(code) = code_for(&requested) {
        code.to_string()
    } else {
        return bad_request(format!("Unsupported target language: {requested}"));
    };

    let text = translator.translate_text(&body.text, &to).await;
    Json(json!({ "to": to, "text": text })).into_response()
}

async fn languages() -> Json<serde_json::Value> {
    let list: Vec<_> = SUPPORTED_TARGETS
        .iter()
        .map(|(name, code)| json!({ "name": name, "code": code }))
        .collect();
    Json(serde_json::Value::Array(list))
}

#[derive(Deserialize)]
struct SaveReq {
    result: AnalysisRecord,
    raw_text: String,
    source_type: SourceType,
    #[serde(default)]
    file_name: Option<String>,
}

async fn save(
    State(state): State<AppState>,
    Json(body): Json<SaveReq>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let persistence = state
        .persistence
        .clone()
        .ok_or(AnalysisError::MissingConfig("COSMOS_ENDPOINT"))?;
    let id = persistence
        .save(
            &body.result,
            &body.raw_text,
            body.source_type,
            body.file_name.as_deref(),
        )
        .await?;
    Ok(Json(json!({ "id": id })))
}

#[derive(Deserialize)]
struct ExportReq {
    result: AnalysisRecord,
}

async fn export(Json(body): Json<ExportReq>) -> Response {
    match body.result.to_export_json() {
        Ok(pretty) => (
            [
                (header::CONTENT_TYPE, "application/json".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
                ),
            ],
            pretty,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError(AnalysisError::EmptyInput).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError(AnalysisError::UnsupportedFormat(".xlsx".into())).status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            ApiError(AnalysisError::service("openai", "empty")).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError(AnalysisError::MissingConfig("COSMOS_KEY")).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
