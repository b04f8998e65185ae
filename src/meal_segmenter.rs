use async_trait::async_trait;
use log::warn;

use crate::api_connection::connection::ApiConnectionError;
use crate::api_connection::endpoints::{
    ChatCompletionRequest, ChatMessage, Provider, SEGMENTER_MODEL,
};
use crate::meal_analyzer::naive_split;

/// Turns raw meal text into an ordered sequence of ingredient phrases. The
/// analyzer only relies on this contract, never on a particular
/// segmentation strategy.
#[async_trait]
pub trait TextSegmenter: Send + Sync {
    async fn segment(&self, text: &str) -> Vec<String>;
}

/// Comma/newline splitter, the degraded-but-dependable strategy.
pub struct NaiveSegmenter;

#[async_trait]
impl TextSegmenter for NaiveSegmenter {
    async fn segment(&self, text: &str) -> Vec<String> {
        naive_split(text)
    }
}

/// LLM-backed segmenter. Asks the model for a bare JSON array of ingredient
/// phrases; any model or parse failure degrades to a single-element
/// sequence holding the trimmed raw text, so the caller always gets
/// something to look up.
pub struct LlmSegmenter {
    provider: Provider,
}

impl LlmSegmenter {
    pub fn new(api_key_env_var: &str) -> Result<Self, ApiConnectionError> {
        Ok(Self {
            provider: Provider::openrouter(api_key_env_var)?,
        })
    }

    async fn segment_via_llm(&self, text: &str) -> Result<Vec<String>, ApiConnectionError> {
        let system_prompt = "/no_thinking
You are a meal description segmenter. Split the given meal description into individual ingredient phrases, keeping any quantities with their ingredient (e.g. '150g chicken breast', '2 large eggs').
Return ONLY a JSON array of strings. Do not include any explanatory text, comments, or markdown formatting (like ```json) before or after the array.
Your response must start with [ and end with ].";

        let request = ChatCompletionRequest {
            model: SEGMENTER_MODEL.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            temperature: Some(0.05),
            max_tokens: Some(512),
        };

        let response = self.provider.call_chat_completion(request).await?;
        let choice = response.choices.first().ok_or(ApiConnectionError::ApiError {
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            error_body: "No response choices received from API".to_string(),
        })?;

        let mut content_str = choice.message.content.trim().to_string();
        // Models still sometimes wrap the payload in code fences.
        if content_str.starts_with("```json") && content_str.ends_with("```") {
            content_str = content_str
                .trim_start_matches("```json")
                .trim_end_matches("```")
                .trim()
                .to_string();
        } else if content_str.starts_with("```") && content_str.ends_with("```") {
            content_str = content_str
                .trim_start_matches("```")
                .trim_end_matches("```")
                .trim()
                .to_string();
        }

        let phrases: Vec<String> = serde_json::from_str(&content_str)?;
        Ok(phrases
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect())
    }
}

#[async_trait]
impl TextSegmenter for LlmSegmenter {
    async fn segment(&self, text: &str) -> Vec<String> {
        let fallback = || {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![trimmed.to_string()]
            }
        };
        match self.segment_via_llm(text).await {
            Ok(phrases) if !phrases.is_empty() => phrases,
            Ok(_) => {
                warn!("LLM segmenter returned no phrases, falling back to raw text");
                fallback()
            }
            Err(e) => {
                warn!("LLM segmentation failed ({}), falling back to raw text", e);
                fallback()
            }
        }
    }
}
