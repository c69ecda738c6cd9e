//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};
use spendcast_core::config::AppConfig;
use spendcast_core::ExtractorClient;
use spendcast_server::{parse_comma_separated, ServerConfig};

use super::open_db;

/// Environment variable holding comma-separated API keys
pub const API_KEYS_ENV: &str = "SPENDCAST_API_KEYS";

/// Environment variable holding comma-separated CORS origins
pub const ALLOWED_ORIGINS_ENV: &str = "SPENDCAST_ALLOWED_ORIGINS";

pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: u16,
    no_auth: bool,
    no_encrypt: bool,
    config: &AppConfig,
) -> Result<()> {
    println!("🚀 Starting Spendcast web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);

    let api_keys = parse_comma_separated(&std::env::var(API_KEYS_ENV).unwrap_or_default());
    let allowed_origins =
        parse_comma_separated(&std::env::var(ALLOWED_ORIGINS_ENV).unwrap_or_default());

    if no_auth {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
    } else {
        println!("   🔒 Authentication: Cloudflare Access (header)");
        if !api_keys.is_empty() {
            println!(
                "   🔑 API keys: {} configured ({})",
                api_keys.len(),
                API_KEYS_ENV
            );
        }
    }
    if !allowed_origins.is_empty() {
        println!("   🌐 CORS origins: {}", allowed_origins.join(", "));
    }

    let extractor = ExtractorClient::from_config(&config.extraction)
        .context("Invalid extraction configuration")?;
    if extractor.is_some() {
        println!(
            "   🧾 Receipt extraction: {} ({})",
            config.extraction.backend, config.extraction.model
        );
    }
    println!();

    let db = open_db(db_path, no_encrypt)?;

    let server_config = ServerConfig {
        require_auth: !no_auth,
        allowed_origins,
        api_keys,
        analytics: config.analytics.clone(),
    };

    spendcast_server::serve_with_config(db, host, port, server_config, extractor).await
}
