//! Chat-completion provider for answering prompts over retrieved context.
//!
//! Talks to any OpenAI-compatible chat completions API (the default base
//! URL is Groq's). The API key is read from the environment variable
//! named in the configuration. A single request per prompt, no retry;
//! a failed completion surfaces to the caller.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::store::ScoredChunk;

const SYSTEM_PROMPT: &str =
    "You are a documentation assistant. Answer using only the provided context. \
     If the context does not contain the answer, say so.";

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Render retrieved chunks and the user question into the user message.
pub fn build_prompt(context: &[ScoredChunk], question: &str) -> String {
    let mut out = String::from("Context:\n\n");
    if context.is_empty() {
        out.push_str("(no matching documents)\n");
    }
    for chunk in context {
        out.push_str(&format!("[{} p.{}]\n{}\n\n", chunk.source, chunk.page, chunk.text));
    }
    out.push_str("---\n\nAnswer the question based on the above context: ");
    out.push_str(question);
    out
}

/// Run one chat completion and return the assistant's reply.
pub async fn complete(config: &LlmConfig, user_prompt: &str) -> Result<String> {
    let model = config
        .model
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("llm.model required"))?;
    let api_key = config.api_key()?;

    let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
    let request = ChatRequest {
        model: model.clone(),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: user_prompt.to_string(),
            },
        ],
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let response = client
        .post(&url)
        .bearer_auth(&api_key)
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("Chat API error {}: {}", status, body);
    }

    let parsed: ChatResponse = response.json().await?;
    let reply = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Chat API returned no choices"))?;

    Ok(reply.message.content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(source: &str, page: i64, text: &str) -> ScoredChunk {
        ScoredChunk {
            chunk_id: format!("{}:{}:0", source, page),
            source: source.to_string(),
            page,
            text: text.to_string(),
            score: 0.9,
        }
    }

    #[test]
    fn prompt_includes_context_and_question() {
        let context = vec![scored("guide.pdf", 2, "Install with cargo.")];
        let prompt = build_prompt(&context, "How do I install?");
        assert!(prompt.contains("guide.pdf p.2"));
        assert!(prompt.contains("Install with cargo."));
        assert!(prompt.ends_with("How do I install?"));
    }

    #[test]
    fn prompt_notes_empty_context() {
        let prompt = build_prompt(&[], "anything?");
        assert!(prompt.contains("no matching documents"));
    }

    #[test]
    fn complete_requires_api_key() {
        let config = LlmConfig {
            provider: "openai".to_string(),
            api_key_env: "RAGSERVE_TEST_KEY_THAT_IS_UNSET".to_string(),
            model: Some("test-model".to_string()),
            ..Default::default()
        };
        let err = config.api_key().unwrap_err();
        assert!(err.to_string().contains("RAGSERVE_TEST_KEY_THAT_IS_UNSET"));
    }
}
