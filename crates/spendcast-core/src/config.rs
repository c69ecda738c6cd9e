//! Application configuration
//!
//! Loads TOML from an override file if present, falling back to the defaults
//! embedded at build time:
//! 1. Explicit path (`--config`) or `~/.local/share/spendcast/config.toml`
//! 2. `config/spendcast.toml` compiled into the binary
//!
//! Environment variables override the extraction settings:
//! - `SPENDCAST_EXTRACTION_BACKEND`: none | openai_compatible | ollama | mock
//! - `SPENDCAST_EXTRACTION_HOST`
//! - `SPENDCAST_EXTRACTION_MODEL`
//! - `SPENDCAST_EXTRACTION_API_KEY`

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Default configuration (embedded at compile time)
const DEFAULT_CONFIG: &str = include_str!("../../../config/spendcast.toml");

pub const BACKEND_ENV: &str = "SPENDCAST_EXTRACTION_BACKEND";
pub const HOST_ENV: &str = "SPENDCAST_EXTRACTION_HOST";
pub const MODEL_ENV: &str = "SPENDCAST_EXTRACTION_MODEL";
pub const API_KEY_ENV: &str = "SPENDCAST_EXTRACTION_API_KEY";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub analytics: AnalyticsConfig,
    pub extraction: ExtractionConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsConfig {
    pub default_lookback_months: u32,
    pub default_top_limit: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_lookback_months: 6,
            default_top_limit: 10,
        }
    }
}

/// Text-extraction provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionBackend {
    #[default]
    None,
    OpenAICompatible,
    Ollama,
    Mock,
}

impl ExtractionBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::OpenAICompatible => "openai_compatible",
            Self::Ollama => "ollama",
            Self::Mock => "mock",
        }
    }
}

impl std::str::FromStr for ExtractionBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "" => Ok(Self::None),
            "openai_compatible" | "openai" => Ok(Self::OpenAICompatible),
            "ollama" => Ok(Self::Ollama),
            "mock" => Ok(Self::Mock),
            _ => Err(format!(
                "Unknown extraction backend: {}. Available: none, openai_compatible, ollama, mock",
                s
            )),
        }
    }
}

impl std::fmt::Display for ExtractionBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionConfig {
    pub backend: ExtractionBackend,
    pub host: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            backend: ExtractionBackend::None,
            host: "http://localhost:11434".to_string(),
            model: "llava".to_string(),
            api_key: None,
            timeout: Duration::from_secs(60),
        }
    }
}

impl AppConfig {
    /// Load from `path`, the default override location, or the embedded defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let override_path = path.map(Path::to_path_buf).or_else(default_config_path);

        let content = match override_path {
            Some(p) if p.exists() => {
                debug!(path = %p.display(), "Loading config override");
                fs::read_to_string(&p)
                    .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?
            }
            Some(p) if path.is_some() => {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )))
            }
            _ => DEFAULT_CONFIG.to_string(),
        };

        Self::parse(&content)
    }

    /// Parse TOML, filling unspecified keys from the built-in defaults
    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        let mut config = Self::default();

        if let Some(analytics) = raw.analytics {
            if let Some(months) = analytics.default_lookback_months {
                config.analytics.default_lookback_months = months;
            }
            if let Some(limit) = analytics.default_top_limit {
                config.analytics.default_top_limit = limit;
            }
        }

        if let Some(extraction) = raw.extraction {
            if let Some(backend) = extraction.backend {
                config.extraction.backend = backend.parse().map_err(Error::Config)?;
            }
            if let Some(host) = extraction.host {
                config.extraction.host = host;
            }
            if let Some(model) = extraction.model {
                config.extraction.model = model;
            }
            if extraction.api_key.is_some() {
                config.extraction.api_key = extraction.api_key;
            }
            if let Some(secs) = extraction.timeout_secs {
                config.extraction.timeout = Duration::from_secs(secs);
            }
        }

        Ok(config)
    }

    /// Apply `SPENDCAST_EXTRACTION_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(backend) = lookup(BACKEND_ENV) {
            match backend.parse() {
                Ok(b) => self.extraction.backend = b,
                Err(e) => warn!(error = %e, "Ignoring {}", BACKEND_ENV),
            }
        }
        if let Some(host) = lookup(HOST_ENV) {
            self.extraction.host = host;
        }
        if let Some(model) = lookup(MODEL_ENV) {
            self.extraction.model = model;
        }
        if let Some(key) = lookup(API_KEY_ENV) {
            self.extraction.api_key = Some(key);
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            analytics: AnalyticsConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("spendcast").join("config.toml"))
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    analytics: Option<RawAnalytics>,
    extraction: Option<RawExtraction>,
}

#[derive(Debug, Deserialize)]
struct RawAnalytics {
    default_lookback_months: Option<u32>,
    default_top_limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawExtraction {
    backend: Option<String>,
    host: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}
