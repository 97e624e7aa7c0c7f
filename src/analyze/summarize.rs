// src/analyze/summarize.rs
use super::ai_adapter::{ChatRequest, Provider};
use crate::error::Result;

const SUMMARY_SYSTEM_PROMPT: &str = "You are a helpful assistant that summarizes text clearly.";

pub fn summary_request(text: &str) -> ChatRequest {
    ChatRequest {
        system: SUMMARY_SYSTEM_PROMPT.to_string(),
        user: format!("Summarize the following text in 3-4 sentences:\n\n{text}"),
        temperature: None,
    }
}

/// One trimmed summary paragraph. Provider failures propagate; there is no retry.
pub async fn summarize(provider: &dyn Provider, text: &str) -> Result<String> {
    let req = summary_request(text);
    let out = provider.complete(&req).await?;
    Ok(out.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::ai_adapter::MockProvider;

    #[tokio::test]
    async fn trims_and_embeds_text_in_prompt() {
        let mock = MockProvider::from_fn(|req| {
            assert!(req.user.starts_with("Summarize the following text in 3-4 sentences:\n\n"));
            assert!(req.user.ends_with("The quick brown fox."));
            Ok("  A fox was quick.  \n".to_string())
        });
        let out = summarize(&mock, "The quick brown fox.").await.unwrap();
        assert_eq!(out, "A fox was quick.");
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let mock = MockProvider::failing("connection refused");
        assert!(summarize(&mock, "text").await.is_err());
    }
}
