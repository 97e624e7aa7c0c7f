//! Generative-text adapter: provider abstraction over chat completions.
//!
//! The summarizer and the classifier only see [`Provider`]; production wires in
//! [`AzureOpenAiProvider`], tests wire in [`MockProvider`].

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{OpenAiSettings, Tuning};
use crate::error::{AnalysisError, Result};

const SERVICE: &str = "openai";

/// One system + user exchange. `temperature: None` leaves the service default.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: Option<f32>,
}

/// Low-level provider: does a *real* remote call. Separated so the prompt logic can be
/// exercised against scripted replies.
pub trait Provider: Send + Sync + 'static {
    fn complete<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
    fn name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynProvider = Arc<dyn Provider>;

/// Azure OpenAI chat completions (`/openai/deployments/{model}/chat/completions`).
pub struct AzureOpenAiProvider {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
}

impl AzureOpenAiProvider {
    pub fn new(settings: &OpenAiSettings, tuning: &Tuning, http: reqwest::Client) -> Self {
        Self {
            http,
            endpoint: settings.endpoint.clone(),
            api_key: settings.key.clone(),
            deployment: settings.model.clone(),
            api_version: tuning.openai_api_version.clone(),
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    messages: Vec<Msg<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

impl Provider for AzureOpenAiProvider {
    fn complete<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let req = Req {
                messages: vec![
                    Msg {
                        role: "system",
                        content: &request.system,
                    },
                    Msg {
                        role: "user",
                        content: &request.user,
                    },
                ],
                temperature: request.temperature,
            };

            let resp = self
                .http
                .post(self.url())
                .header("api-key", &self.api_key)
                .json(&req)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let message = resp.text().await.unwrap_or_default();
                return Err(AnalysisError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let body: Resp = resp.json().await?;
            let content = body
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_default();
            debug!(deployment = %self.deployment, chars = content.len(), "chat completion received");

            let content = content.trim().to_string();
            if content.is_empty() {
                return Err(AnalysisError::service(SERVICE, "empty completion"));
            }
            Ok(content)
        })
    }

    fn name(&self) -> &'static str {
        "azure-openai"
    }
}

type Responder = dyn Fn(&ChatRequest) -> Result<String> + Send + Sync;

/// Scripted provider for tests/local runs. Counts calls.
pub struct MockProvider {
    responder: Box<Responder>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&ChatRequest) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always answers with `reply`.
    pub fn fixed(reply: impl Into<String>) -> Self {
        let reply = reply.into();
        Self::from_fn(move |_| Ok(reply.clone()))
    }

    /// Always fails as if the service were unreachable.
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::from_fn(move |_| Err(AnalysisError::service(SERVICE, message.clone())))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Provider for MockProvider {
    fn complete<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let out = (self.responder)(request);
        Box::pin(async move { out })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
