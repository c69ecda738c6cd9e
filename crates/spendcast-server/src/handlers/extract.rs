//! Receipt extraction handler

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};

use crate::{current_owner, AppError, AppState};
use spendcast_core::{Extraction, TextExtractor};

/// POST /api/extract - Read amount and category from a receipt image
///
/// The body is the raw image. Nothing is stored; the caller decides whether
/// to record an expense from the result.
pub async fn extract_receipt(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Extraction>, AppError> {
    let owner = current_owner(&state, &headers)?;

    let extractor = state
        .extractor
        .as_ref()
        .ok_or_else(|| AppError::unavailable("Text extraction is not configured"))?;

    let extraction = extractor.extract(&body).await?;

    state.db.log_audit(
        &owner.email,
        "extract",
        Some("receipt"),
        None,
        Some(&format!(
            "backend={}, bytes={}, amount={:.2}, category={}, confidence={:.2}",
            extractor.name(),
            body.len(),
            extraction.amount,
            extraction.category,
            extraction.confidence
        )),
    )?;

    Ok(Json(extraction))
}
