//! Mock extractor for testing
//!
//! Treats the image bytes as UTF-8 receipt text and runs the same reply
//! parser as the real backends, so tests can exercise both the JSON and the
//! heuristic paths without a model server.

use async_trait::async_trait;

use super::{parse_reply, Extraction, TextExtractor};
use crate::error::Result;

#[derive(Clone, Default)]
pub struct MockExtractor {
    /// Fixed reply overriding the image contents
    pub reply: Option<String>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer with `reply`
    pub fn with_reply(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
        }
    }
}

#[async_trait]
impl TextExtractor for MockExtractor {
    async fn extract(&self, image: &[u8]) -> Result<Extraction> {
        let reply = match &self.reply {
            Some(reply) => reply.clone(),
            None => String::from_utf8_lossy(image).into_owned(),
        };
        Ok(parse_reply(&reply))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
