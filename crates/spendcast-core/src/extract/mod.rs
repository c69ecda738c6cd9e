//! Receipt text extraction
//!
//! Turns image bytes into free text plus a best-effort amount and category.
//! Images are never stored; backends only see the bytes of one request.
//!
//! # Architecture
//!
//! - `TextExtractor` trait: the interface every backend implements
//! - `ExtractorClient` enum: concrete wrapper providing Clone + static dispatch
//! - Backends: `OpenAICompatibleExtractor`, `OllamaExtractor`, `MockExtractor`
//!
//! The backend is chosen from an explicit [`ExtractionConfig`]:
//!
//! ```rust,ignore
//! let config = AppConfig::load(None)?;
//! if let Some(client) = ExtractorClient::from_config(&config.extraction)? {
//!     let extraction = client.extract(&bytes).await?;
//! }
//! ```

mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;

pub use mock::MockExtractor;
pub use ollama::OllamaExtractor;
pub use openai_compatible::OpenAICompatibleExtractor;
pub use parsing::{categorize_text, extract_amount, parse_reply};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{ExtractionBackend, ExtractionConfig};
use crate::error::{Error, Result};
use crate::models::Category;

/// Largest accepted image
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Instruction sent alongside the image
pub(crate) const EXTRACTION_PROMPT: &str = r#"Please analyze this receipt image and extract the following information in JSON format:
{
  "amount": <total amount as a number>,
  "category": <one of: food, travel, entertainment, shopping, healthcare, utilities, education, other>,
  "confidence": <confidence score 0-1>,
  "raw_text": <extracted text>
}

Focus on finding the total amount and categorize the expense based on the merchant type."#;

/// Result of reading a receipt image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub amount: f64,
    pub category: Category,
    pub confidence: f64,
    pub raw_text: String,
}

/// Interface implemented by all extraction backends
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Read text, amount and category from image bytes
    async fn extract(&self, image: &[u8]) -> Result<Extraction>;

    /// Backend identifier (for logging)
    fn name(&self) -> &'static str;
}

/// Reject empty or oversized images before any backend sees them
pub fn validate_image(image: &[u8]) -> Result<()> {
    if image.is_empty() {
        return Err(Error::InvalidData("Image is empty".into()));
    }
    if image.len() > MAX_IMAGE_BYTES {
        return Err(Error::InvalidData(format!(
            "Image is {} bytes; the limit is {} bytes",
            image.len(),
            MAX_IMAGE_BYTES
        )));
    }
    Ok(())
}

/// Concrete extractor enum
#[derive(Clone)]
pub enum ExtractorClient {
    OpenAICompatible(OpenAICompatibleExtractor),
    Ollama(OllamaExtractor),
    Mock(MockExtractor),
}

impl ExtractorClient {
    /// Build the configured backend; `None` when extraction is disabled
    pub fn from_config(config: &ExtractionConfig) -> Result<Option<Self>> {
        let client = match config.backend {
            ExtractionBackend::None => return Ok(None),
            ExtractionBackend::OpenAICompatible => {
                Self::OpenAICompatible(OpenAICompatibleExtractor::from_config(config)?)
            }
            ExtractionBackend::Ollama => Self::Ollama(OllamaExtractor::from_config(config)?),
            ExtractionBackend::Mock => Self::Mock(MockExtractor::new()),
        };
        tracing::info!(backend = client.name(), "Text extraction enabled");
        Ok(Some(client))
    }

    pub fn mock() -> Self {
        Self::Mock(MockExtractor::new())
    }
}

#[async_trait]
impl TextExtractor for ExtractorClient {
    async fn extract(&self, image: &[u8]) -> Result<Extraction> {
        validate_image(image)?;
        match self {
            Self::OpenAICompatible(b) => b.extract(image).await,
            Self::Ollama(b) => b.extract(image).await,
            Self::Mock(b) => b.extract(image).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::OpenAICompatible(b) => b.name(),
            Self::Ollama(b) => b.name(),
            Self::Mock(b) => b.name(),
        }
    }
}

/// Fail early on a backend host that cannot be used
pub(crate) fn require_host(config: &ExtractionConfig) -> Result<String> {
    let host = config.host.trim().trim_end_matches('/');
    if host.is_empty() {
        return Err(Error::Config(format!(
            "Extraction backend {} needs a host",
            config.backend
        )));
    }
    Ok(host.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_none() {
        let config = ExtractionConfig::default();
        assert!(ExtractorClient::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_from_config_requires_host() {
        let config = ExtractionConfig {
            backend: ExtractionBackend::Ollama,
            host: "  ".into(),
            ..Default::default()
        };
        assert!(matches!(
            ExtractorClient::from_config(&config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_from_config_builds_backends() {
        for backend in [
            ExtractionBackend::OpenAICompatible,
            ExtractionBackend::Ollama,
            ExtractionBackend::Mock,
        ] {
            let config = ExtractionConfig {
                backend,
                ..Default::default()
            };
            let client = ExtractorClient::from_config(&config).unwrap().unwrap();
            assert_eq!(client.name(), backend.as_str());
        }
    }

    #[test]
    fn test_validate_image() {
        assert!(validate_image(&[1, 2, 3]).is_ok());
        assert!(matches!(validate_image(&[]), Err(Error::InvalidData(_))));
        let big = vec![0u8; MAX_IMAGE_BYTES + 1];
        assert!(matches!(validate_image(&big), Err(Error::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_client_rejects_oversized_image() {
        let client = ExtractorClient::mock();
        let big = vec![0u8; MAX_IMAGE_BYTES + 1];
        assert!(client.extract(&big).await.is_err());
        assert!(client.extract(b"receipt").await.is_ok());
    }
}
