//! OpenAI-compatible vision backend
//!
//! Works with any server implementing `/v1/chat/completions` with image
//! content parts (hosted gateways, vLLM, LocalAI, llama-server).

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{parse_reply, require_host, Extraction, TextExtractor, EXTRACTION_PROMPT};
use crate::config::ExtractionConfig;
use crate::error::{Error, Result};

#[derive(Clone)]
pub struct OpenAICompatibleExtractor {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAICompatibleExtractor {
    pub fn new(base_url: &str, model: &str, api_key: Option<&str>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.map(str::to_string),
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        let base_url = require_host(config)?;
        let http_client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn build_request(&self, image: &[u8]) -> ChatCompletionRequest {
        let base64_image = base64::engine::general_purpose::STANDARD.encode(image);

        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::Text {
                        text: EXTRACTION_PROMPT.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: format!("data:image/jpeg;base64,{}", base64_image),
                        },
                    },
                ],
            }],
            max_tokens: Some(500),
            stream: false,
        }
    }
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

/// Content part for multimodal messages
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[async_trait]
impl TextExtractor for OpenAICompatibleExtractor {
    async fn extract(&self, image: &[u8]) -> Result<Extraction> {
        let request = self.build_request(image);

        let mut req_builder = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&request);

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Extraction(format!(
                "OpenAI-compatible API error {}: {}",
                status, body
            )));
        }

        let chat_response: ChatCompletionResponse = response.json().await?;
        let content = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Extraction("No choices in completion response".into()))?;
        debug!("OpenAI-compatible extraction response: {}", content);

        Ok(parse_reply(&content))
    }

    fn name(&self) -> &'static str {
        "openai_compatible"
    }
}
