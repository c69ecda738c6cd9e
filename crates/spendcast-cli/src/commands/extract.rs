//! Receipt extraction command

use std::path::Path;

use anyhow::{Context, Result};
use spendcast_core::config::ExtractionConfig;
use spendcast_core::{ExtractorClient, TextExtractor, MAX_IMAGE_BYTES};

pub async fn cmd_extract(config: &ExtractionConfig, image: &Path) -> Result<()> {
    let client = ExtractorClient::from_config(config)
        .context("Invalid extraction configuration")?
        .context(
            "Text extraction is not configured. Set [extraction] backend in the config file \
             or SPENDCAST_EXTRACTION_BACKEND (openai_compatible, ollama, mock)",
        )?;

    let metadata = std::fs::metadata(image)
        .with_context(|| format!("Failed to read {}", image.display()))?;
    if metadata.len() > MAX_IMAGE_BYTES as u64 {
        anyhow::bail!(
            "{} is {} bytes; the limit is {} bytes",
            image.display(),
            metadata.len(),
            MAX_IMAGE_BYTES
        );
    }
    let bytes = std::fs::read(image)
        .with_context(|| format!("Failed to read {}", image.display()))?;

    println!("🔍 Reading {} with {}...", image.display(), client.name());

    let extraction = client
        .extract(&bytes)
        .await
        .context("Text extraction failed")?;

    println!("   Amount:     ${:.2}", extraction.amount);
    println!("   Category:   {}", extraction.category);
    println!("   Confidence: {:.0}%", extraction.confidence * 100.0);
    if !extraction.raw_text.is_empty() {
        println!();
        println!("{}", extraction.raw_text);
    }
    println!();
    println!(
        "💡 Record it with: spendcast add --amount {:.2} --category {}",
        extraction.amount, extraction.category
    );

    Ok(())
}
