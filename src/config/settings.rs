// src/config/settings.rs
//! Service endpoints and credentials, sourced from the environment (`.env` in dev).
//!
//! Every section is built independently so a missing database configuration only
//! disables persistence, while the analysis services stay usable.

use crate::error::{AnalysisError, Result};

pub const ENV_LANGUAGE_ENDPOINT: &str = "AZURE_LANGUAGE_ENDPOINT";
pub const ENV_LANGUAGE_KEY: &str = "AZURE_LANGUAGE_KEY";
pub const ENV_LANGUAGE_REGION: &str = "AZURE_LANGUAGE_REGION";

pub const ENV_OPENAI_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
pub const ENV_OPENAI_KEY: &str = "AZURE_OPENAI_KEY";
pub const ENV_OPENAI_MODEL: &str = "AZURE_OPENAI_MODEL";

pub const ENV_TRANSLATE_ENDPOINT: &str = "AZURE_TRANSLATE_ENDPOINT";
pub const ENV_TRANSLATE_KEY: &str = "AZURE_TRANSLATE_KEY";
pub const ENV_TRANSLATE_REGION: &str = "AZURE_TRANSLATE_REGION";

pub const ENV_COSMOS_ENDPOINT: &str = "COSMOS_ENDPOINT";
pub const ENV_COSMOS_KEY: &str = "COSMOS_KEY";
pub const ENV_COSMOS_DB: &str = "COSMOS_DB";
pub const ENV_COSMOS_CONTAINER: &str = "COSMOS_CONTAINER";

/// Azure AI Language (Text Analytics) resource.
#[derive(Debug, Clone)]
pub struct LanguageSettings {
    pub endpoint: String,
    pub key: String,
    pub region: Option<String>,
}

/// Azure OpenAI resource; `model` is the deployment name.
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub endpoint: String,
    pub key: String,
    pub model: String,
}

/// Azure Translator resource.
#[derive(Debug, Clone)]
pub struct TranslatorSettings {
    pub endpoint: String,
    pub key: String,
    pub region: Option<String>,
}

/// Cosmos DB account plus the database/container that hold saved analyses.
#[derive(Debug, Clone)]
pub struct CosmosSettings {
    pub endpoint: String,
    pub key: String,
    pub database: String,
    pub container: String,
}

impl LanguageSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            endpoint: trim_endpoint(required(&lookup, ENV_LANGUAGE_ENDPOINT)?),
            key: required(&lookup, ENV_LANGUAGE_KEY)?,
            region: optional(&lookup, ENV_LANGUAGE_REGION),
        })
    }
}

impl OpenAiSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            endpoint: trim_endpoint(required(&lookup, ENV_OPENAI_ENDPOINT)?),
            key: required(&lookup, ENV_OPENAI_KEY)?,
            model: required(&lookup, ENV_OPENAI_MODEL)?,
        })
    }
}

impl TranslatorSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            endpoint: trim_endpoint(required(&lookup, ENV_TRANSLATE_ENDPOINT)?),
            key: required(&lookup, ENV_TRANSLATE_KEY)?,
            region: optional(&lookup, ENV_TRANSLATE_REGION),
        })
    }
}

impl CosmosSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            endpoint: trim_endpoint(required(&lookup, ENV_COSMOS_ENDPOINT)?),
            key: required(&lookup, ENV_COSMOS_KEY)?,
            database: required(&lookup, ENV_COSMOS_DB)?,
            container: required(&lookup, ENV_COSMOS_CONTAINER)?,
        })
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name).ok_or(AnalysisError::MissingConfig(name))
}

fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Endpoints are joined with paths later; a trailing slash would double up.
fn trim_endpoint(endpoint: String) -> String {
    endpoint.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn cosmos_reports_first_missing_variable() {
        let lookup = lookup_from(&[(ENV_COSMOS_ENDPOINT, "https://acct.documents.azure.com:443/")]);
        let err = CosmosSettings::from_lookup(lookup).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingConfig(ENV_COSMOS_KEY)));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let lookup = lookup_from(&[
            (ENV_OPENAI_ENDPOINT, "https://x.openai.azure.com"),
            (ENV_OPENAI_KEY, "   "),
            (ENV_OPENAI_MODEL, "gpt-4o-mini"),
        ]);
        let err = OpenAiSettings::from_lookup(lookup).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingConfig(ENV_OPENAI_KEY)));
    }

    #[test]
    fn endpoints_lose_trailing_slash_and_region_is_optional() {
        let lookup = lookup_from(&[
            (ENV_LANGUAGE_ENDPOINT, "https://lang.cognitiveservices.azure.com/"),
            (ENV_LANGUAGE_KEY, "k"),
        ]);
        let s = LanguageSettings::from_lookup(lookup).unwrap();
        assert_eq!(s.endpoint, "https://lang.cognitiveservices.azure.com");
        assert!(s.region.is_none());
    }
}
