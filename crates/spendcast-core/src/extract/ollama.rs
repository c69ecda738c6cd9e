//! Ollama vision backend (`/api/generate` with `images`)

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{parse_reply, require_host, Extraction, TextExtractor, EXTRACTION_PROMPT};
use crate::config::ExtractionConfig;
use crate::error::{Error, Result};

#[derive(Clone)]
pub struct OllamaExtractor {
    http_client: Client,
    base_url: String,
    model: String,
}

impl OllamaExtractor {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        let base_url = require_host(config)?;
        let http_client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            model: config.model.clone(),
        })
    }
}

/// Request to Ollama API with images (for vision models)
#[derive(Debug, Serialize)]
struct OllamaVisionRequest {
    model: String,
    prompt: String,
    images: Vec<String>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl TextExtractor for OllamaExtractor {
    async fn extract(&self, image: &[u8]) -> Result<Extraction> {
        let request = OllamaVisionRequest {
            model: self.model.clone(),
            prompt: EXTRACTION_PROMPT.to_string(),
            images: vec![base64::engine::general_purpose::STANDARD.encode(image)],
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Extraction(format!(
                "Ollama API error {}: {}",
                status, body
            )));
        }

        let ollama_response: OllamaResponse = response.json().await?;
        debug!("Ollama extraction response: {}", ollama_response.response);

        Ok(parse_reply(&ollama_response.response))
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}
