//! Parsing helpers for extraction backend replies
//!
//! Vision models often wrap their JSON in prose. The reply is scanned for the
//! outermost `{...}`; when that is missing or malformed the raw text is run
//! through keyword and regex heuristics instead.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use super::Extraction;
use crate::models::Category;

/// Confidence reported when the reply had to be parsed heuristically
pub const HEURISTIC_CONFIDENCE: f64 = 0.7;

/// Keyword table, checked in order; the first hit wins
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Food,
        &[
            "restaurant", "food", "dining", "meal", "lunch", "dinner", "breakfast", "cafe",
            "coffee", "pizza", "burger",
        ],
    ),
    (
        Category::Travel,
        &[
            "hotel", "flight", "airline", "taxi", "uber", "lyft", "rental car", "gas", "parking",
            "airport",
        ],
    ),
    (
        Category::Entertainment,
        &["movie", "theater", "concert", "show", "ticket", "netflix", "spotify", "game"],
    ),
    (
        Category::Shopping,
        &["store", "retail", "clothing", "shoes", "electronics", "amazon", "walmart", "target"],
    ),
    (
        Category::Healthcare,
        &["pharmacy", "medical", "doctor", "hospital", "clinic", "medicine", "health"],
    ),
    (
        Category::Utilities,
        &["electric", "water", "gas", "internet", "phone", "cable", "utility"],
    ),
    (
        Category::Education,
        &["book", "course", "tuition", "school", "university", "education"],
    ),
];

fn amount_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"\$?(\d+(?:,\d{3})*(?:\.\d{2})?)",
            r"(?i)(\d+(?:\.\d{2})?)\s*(?:USD|dollars?)",
            r"(?i)total[:\s]*\$?(\d+(?:\.\d{2})?)",
            r"(?i)amount[:\s]*\$?(\d+(?:\.\d{2})?)",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

/// First money-like number in `text`, thousands separators removed; 0 if none
pub fn extract_amount(text: &str) -> f64 {
    for pattern in amount_patterns() {
        if let Some(value) = pattern
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().replace(',', "").parse::<f64>().ok())
        {
            return value;
        }
    }
    0.0
}

/// Guess a category from keywords; `Other` when nothing matches
pub fn categorize_text(text: &str) -> Category {
    let lower = text.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

/// Shape the model is asked to reply with
#[derive(Debug, Deserialize)]
struct RawExtraction {
    #[serde(default)]
    amount: Option<serde_json::Value>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    raw_text: Option<String>,
}

/// Locate the outermost JSON object in a reply
pub fn find_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (start < end).then(|| &reply[start..=end])
}

/// Turn a model reply into an extraction, falling back to heuristics
pub fn parse_reply(reply: &str) -> Extraction {
    let reply = reply.trim();

    if let Some(parsed) = find_json_object(reply)
        .and_then(|json| serde_json::from_str::<RawExtraction>(json).ok())
    {
        return from_json(parsed, reply);
    }

    debug!("Reply had no usable JSON, using heuristics");
    Extraction {
        amount: extract_amount(reply),
        category: categorize_text(reply),
        confidence: HEURISTIC_CONFIDENCE,
        raw_text: reply.to_string(),
    }
}

fn from_json(raw: RawExtraction, reply: &str) -> Extraction {
    let raw_text = raw.raw_text.unwrap_or_else(|| reply.to_string());

    // Models sometimes quote the number or include a currency sign
    let amount = match raw.amount {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(serde_json::Value::String(s)) => extract_amount(&s),
        _ => extract_amount(&raw_text),
    };

    let category = raw
        .category
        .and_then(|c| c.parse::<Category>().ok())
        .unwrap_or(Category::Other);

    let confidence = raw
        .confidence
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(HEURISTIC_CONFIDENCE);

    Extraction {
        amount: if amount.is_finite() { amount.max(0.0) } else { 0.0 },
        category,
        confidence,
        raw_text,
    }
}
