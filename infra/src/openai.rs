use std::fmt::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use docqa_domain::{Answer, AnswerPort, AnswerRequest, DomainError};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const SERVICE_NAME: &str = "openai";
const SYSTEM_PROMPT: &str = "You answer questions using only the numbered context passages. \
Cite passages by their number in square brackets. If the passages do not contain the answer, \
say that the documents do not cover it.";

#[derive(Debug, Clone)]
pub struct OpenAiAnswererConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

/// Answer generator backed by any OpenAI-compatible chat completions endpoint.
pub struct OpenAiAnswerer {
    client: Client,
    config: OpenAiAnswererConfig,
}

impl OpenAiAnswerer {
    pub fn new(config: OpenAiAnswererConfig) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| {
                DomainError::internal_error(&format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self { client, config })
    }

    fn chat_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

fn user_prompt(request: &AnswerRequest) -> String {
    let mut prompt = String::from("Context:\n");
    for (idx, passage) in request.passages.iter().enumerate() {
        let _ = writeln!(
            prompt,
            "[{}] ({}) {}",
            idx + 1,
            passage.document_title,
            passage.chunk.text
        );
    }
    let _ = write!(prompt, "\nQuestion: {}", request.question);
    prompt
}

#[async_trait]
impl AnswerPort for OpenAiAnswerer {
    async fn answer(&self, request: AnswerRequest) -> Result<Answer, DomainError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Some(SYSTEM_PROMPT.to_string()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Some(user_prompt(&request)),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        tracing::debug!(
            model = %self.config.model,
            passage_count = request.passages.len(),
            "requesting chat completion"
        );
        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| DomainError::external_service_error(SERVICE_NAME, &err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "chat completion request rejected");
            return Err(DomainError::external_service_error(
                SERVICE_NAME,
                &format!("HTTP {}: {}", status.as_u16(), detail.trim()),
            ));
        }

        let parsed: ChatResponse = response.json().await.map_err(|err| {
            DomainError::external_service_error(SERVICE_NAME, &format!("invalid response: {err}"))
        })?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                DomainError::external_service_error(SERVICE_NAME, "response carried no answer")
            })?;

        Ok(Answer {
            text,
            model: parsed.model.unwrap_or_else(|| self.config.model.clone()),
        })
    }
}
