//! Remote correction client.
//!
//! Builds the language-specific instruction prompt and obtains a candidate
//! correction from an OpenAI-compatible chat completion endpoint, with a
//! per-attempt timeout and a bounded retry budget. The `CompletionBackend`
//! trait is the seam the orchestrator is tested against.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::CorrectorConfig;
use crate::error::CorrectionError;

/// Backend capable of producing a corrected string for a speech fragment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_text: &str)
        -> Result<String, CorrectionError>;
}

/// Build the system instruction for the target language.
///
/// The rule set is fixed: the model must treat every input as a non-terminal
/// fragment of continuous speech and be conservative with sentence-closing
/// punctuation.
pub fn build_system_prompt(language: &str) -> String {
    let language_name = match language.split(['-', '_']).next().unwrap_or("en") {
        "en" => "English",
        "hi" => "Hindi",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        other => return build_system_prompt_named(other),
    };
    build_system_prompt_named(language_name)
}

fn build_system_prompt_named(language_name: &str) -> String {
    format!(
        "You are a punctuation corrector for live {language_name} captions. \
The input is a short fragment of continuous speech; the next fragment will \
continue the same sentence.\n\
Rules:\n\
1. NEVER change, add, remove, or reorder words. Only punctuation, spacing and capitalization.\n\
2. NEVER add a closing period when the fragment ends with: a conjunction (and, but, or, \
because), an incomplete verb phrase (I am, she was, they will), a dangling preposition \
(to, of, in, with), a bare article or possessive (the, a, my, your), a question word \
(what, where, how), or a predicate adjective with no noun after it.\n\
3. Only close with a period when the fragment is a complete declarative sentence, \
a complete self-contained question (close with a question mark), or ends on a \
concrete noun or completion word.\n\
4. Commas and capitalization inside the fragment may be added freely.\n\
5. Collapse repeated terminal punctuation to a single mark.\n\
Respond with the corrected text only, no commentary."
    )
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    error: Option<ServiceError>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ServiceError {
    message: String,
}

/// HTTP client for the remote completion service.
pub struct HttpCompletionClient {
    http: reqwest::Client,
    config: Arc<CorrectorConfig>,
}

impl HttpCompletionClient {
    pub fn new(config: Arc<CorrectorConfig>) -> Result<Self, CorrectionError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    async fn try_complete(&self, request: &ChatRequest<'_>) -> Result<String, CorrectionError> {
        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ChatResponse>(&body)
                .ok()
                .and_then(|parsed| parsed.error)
                .map(|e| e.message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(CorrectionError::Service { message });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| CorrectionError::Service {
                message: format!("malformed response body: {e}"),
            })?;
        if let Some(error) = parsed.error {
            return Err(CorrectionError::Service {
                message: error.message,
            });
        }

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();
        let content = content.trim();
        if content.is_empty() {
            return Err(CorrectionError::EmptyCompletion);
        }
        Ok(content.to_string())
    }
}

#[async_trait]
impl CompletionBackend for HttpCompletionClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<String, CorrectionError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_text,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.try_complete(&request).await {
                Ok(content) => {
                    debug!("Completion succeeded on attempt {}", attempt);
                    return Ok(content);
                }
                Err(err) if attempt <= self.config.max_retries => {
                    let delay = self.config.retry_delay * attempt;
                    warn!(
                        "Completion attempt {} failed ({}), retrying in {:?}",
                        attempt, err, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
