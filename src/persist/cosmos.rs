// src/persist/cosmos.rs
//! Cosmos DB (SQL API) over REST with master-key auth.
//!
//! The database and the container are created on the first save and reused
//! afterwards; `409 Conflict` on either create means it already exists.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use reqwest::Client;
use ring::hmac;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::DocumentStore;
use crate::config::{CosmosSettings, Tuning};
use crate::error::{AnalysisError, Result};

pub const COSMOS_API_VERSION: &str = "2018-12-31";
pub const PARTITION_KEY_PATH: &str = "/classification_label";

pub struct CosmosStore {
    client: Client,
    endpoint: String,
    key: hmac::Key,
    database: String,
    container: String,
    throughput: u32,
    ready: OnceCell<()>,
}

impl CosmosStore {
    /// Fails when the account key is not valid base64.
    pub fn new(settings: &CosmosSettings, tuning: &Tuning, client: Client) -> Result<Self> {
        let raw = STANDARD
            .decode(settings.key.trim())
            .map_err(|e| AnalysisError::Persistence(format!("invalid account key: {e}")))?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            key: hmac::Key::new(hmac::HMAC_SHA256, &raw),
            database: settings.database.clone(),
            container: settings.container.clone(),
            throughput: tuning.cosmos_throughput,
            ready: OnceCell::new(),
        })
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    async fn ensure_ready(&self) -> Result<()> {
        self.ready
            .get_or_try_init(|| async {
                self.create_database().await?;
                self.create_container().await?;
                info!(database = %self.database, container = %self.container, "cosmos container ready");
                Ok::<_, AnalysisError>(())
            })
            .await
            .map(|_| ())
    }

    async fn create_database(&self) -> Result<()> {
        let body = json!({ "id": self.database });
        let status = self.post("dbs", "", "dbs", &body, &[]).await?;
        accept_created_or_existing("database", status)
    }

    async fn create_container(&self) -> Result<()> {
        let link = format!("dbs/{}", self.database);
        let body = json!({
            "id": self.container,
            "partitionKey": { "paths": [PARTITION_KEY_PATH], "kind": "Hash" },
        });
        let throughput = self.throughput.to_string();
        let status = self
            .post(
                "colls",
                &link,
                &format!("{link}/colls"),
                &body,
                &[("x-ms-offer-throughput", throughput)],
            )
            .await?;
        accept_created_or_existing("container", status)
    }

    /// Signed POST; returns the status, or an `Api` error carrying the body for
    /// anything that is neither success nor conflict.
    async fn post(
        &self,
        resource_type: &str,
        resource_link: &str,
        path: &str,
        body: &Value,
        extra_headers: &[(&str, String)],
    ) -> Result<u16> {
        let date = rfc1123(Utc::now());
        let token = sign_token(&self.key, "POST", resource_type, resource_link, &date);
        let url = format!("{}/{}", self.endpoint, path);
        debug!(%url, resource_type, "cosmos request");

        let mut req = self
            .client
            .post(url)
            .header("authorization", token)
            .header("x-ms-date", date)
            .header("x-ms-version", COSMOS_API_VERSION)
            .json(body);
        for (name, value) in extra_headers {
            req = req.header(*name, value.as_str());
        }

        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() || status == reqwest::StatusCode::CONFLICT {
            return Ok(status.as_u16());
        }
        let message = resp.text().await.unwrap_or_default();
        Err(AnalysisError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl DocumentStore for CosmosStore {
    async fn create_document(&self, partition_key: &str, document: &Value) -> Result<()> {
        self.ensure_ready().await?;
        let link = format!("dbs/{}/colls/{}", self.database, self.container);
        let partition = serde_json::to_string(&[partition_key])
            .map_err(|e| AnalysisError::Persistence(e.to_string()))?;
        let status = self
            .post(
                "docs",
                &link,
                &format!("{link}/docs"),
                document,
                &[("x-ms-documentdb-partitionkey", partition)],
            )
            .await?;
        if status == reqwest::StatusCode::CONFLICT.as_u16() {
            return Err(AnalysisError::Persistence(
                "a document with this id already exists".into(),
            ));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "cosmos"
    }
}

fn accept_created_or_existing(what: &str, status: u16) -> Result<()> {
    if status == reqwest::StatusCode::CONFLICT.as_u16() {
        debug!(what, "already exists");
    }
    Ok(())
}

/// `x-ms-date` format, e.g. `Thu, 01 Feb 2024 10:00:00 GMT`.
pub fn rfc1123(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// URL-encoded `type=master&ver=1.0&sig=...` authorization header value.
/// `key_b64` is the account key as shown in the portal.
pub fn auth_token(
    key_b64: &str,
    verb: &str,
    resource_type: &str,
    resource_link: &str,
    date: &str,
) -> Result<String> {
    let raw = STANDARD
        .decode(key_b64.trim())
        .map_err(|e| AnalysisError::Persistence(format!("invalid account key: {e}")))?;
    let key = hmac::Key::new(hmac::HMAC_SHA256, &raw);
    Ok(sign_token(&key, verb, resource_type, resource_link, date))
}

fn sign_token(
    key: &hmac::Key,
    verb: &str,
    resource_type: &str,
    resource_link: &str,
    date: &str,
) -> String {
    let payload = format!(
        "{}\n{}\n{}\n{}\n\n",
        verb.to_lowercase(),
        resource_type.to_lowercase(),
        resource_link,
        date.to_lowercase()
    );
    let sig = STANDARD.encode(hmac::sign(key, payload.as_bytes()).as_ref());
    let token = format!("type=master&ver=1.0&sig={sig}");
    url::form_urlencoded::byte_serialize(token.as_bytes()).collect()
}
