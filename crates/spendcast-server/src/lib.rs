//! Spendcast Web Server
//!
//! Axum-based REST API for the Spendcast expense tracker.
//!
//! Security features:
//! - Cloudflare Access or API key authentication (secure by default, use --no-auth for local dev)
//! - Every query is scoped to the authenticated owner
//! - Restrictive CORS policy
//! - Input validation (pagination limits, image size limits)
//! - Audit logging for all API access (reads and writes)
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use spendcast_core::config::AnalyticsConfig;
use spendcast_core::db::Database;
use spendcast_core::models::Owner;
use spendcast_core::{ExtractorClient, TextExtractor, MAX_IMAGE_BYTES};

mod handlers;

/// Maximum pagination limit
pub const MAX_PAGE_LIMIT: usize = 1000;

/// Cloudflare Access header for authenticated user email
const CF_ACCESS_USER_HEADER: &str = "cf-access-authenticated-user-email";

/// Authorization header for API key auth
const AUTHORIZATION_HEADER: &str = "authorization";

/// Owner identity used for API key requests
pub const API_KEY_OWNER: &str = "api-key";

/// Owner identity used when authentication is disabled and no user header is sent
pub const LOCAL_DEV_OWNER: &str = "local-dev";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether authentication is required (secure by default)
    pub require_auth: bool,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// API keys for service authentication (alternative to Cloudflare Access)
    /// Format: "Bearer <key>" in Authorization header
    pub api_keys: Vec<String>,
    /// Default lookback and top-N limits for analytics endpoints
    pub analytics: AnalyticsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
            api_keys: vec![],
            analytics: AnalyticsConfig::default(),
        }
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    /// Receipt text extractor, when a backend is configured
    pub extractor: Option<ExtractorClient>,
}

/// Authentication middleware - accepts Cloudflare Access headers or API keys
///
/// # Security Notes
///
/// **Cloudflare Access headers**: The `CF-Access-Authenticated-User-Email` header is
/// safe behind Cloudflare Tunnel (which strips/rewrites CF headers), but can be
/// spoofed if the server is exposed directly to the internet.
///
/// **API keys**: Compared using constant-time comparison to prevent timing attacks.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.require_auth {
        return next.run(request).await;
    }

    let cf_user = request
        .headers()
        .get(CF_ACCESS_USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());

    if let Some(email) = cf_user {
        info!(user = %email, path = %request.uri().path(), "Authenticated via Cloudflare Access header");
        return next.run(request).await;
    }

    let api_key_valid = request
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|key| validate_api_key(key, &state.config.api_keys))
        .unwrap_or(false);

    if api_key_valid {
        info!(user = API_KEY_OWNER, path = %request.uri().path(), "Authenticated via API key");
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "Unauthorized request - no valid auth");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

/// Validate an API key against the configured keys using constant-time comparison
fn validate_api_key(provided: &str, valid_keys: &[String]) -> bool {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();

    valid_keys.iter().any(|key| {
        let key_bytes = key.as_bytes();
        // Only compare if lengths match (constant-time for same-length keys)
        provided_bytes.len() == key_bytes.len() && bool::from(provided_bytes.ct_eq(key_bytes))
    })
}

/// Parse a comma-separated list (API keys, origins), dropping blanks
pub fn parse_comma_separated(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Extract the caller identity from request headers
/// Returns the CF Access email, "api-key" for API key auth, or "local-dev" otherwise
pub fn get_user_email(headers: &HeaderMap) -> String {
    if let Some(email) = headers
        .get(CF_ACCESS_USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
    {
        return email.to_string();
    }

    if headers
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer "))
    {
        return API_KEY_OWNER.to_string();
    }

    LOCAL_DEV_OWNER.to_string()
}

/// Resolve the owner for a request, creating it on first use
pub(crate) fn current_owner(state: &AppState, headers: &HeaderMap) -> Result<Owner, AppError> {
    let email = get_user_email(headers);
    Ok(state.db.upsert_owner(&email)?)
}

/// Success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Create the application router
pub fn create_router(
    db: Database,
    config: ServerConfig,
    extractor: Option<ExtractorClient>,
) -> Router {
    match &extractor {
        Some(client) => info!("Text extraction backend: {}", client.name()),
        None => info!("ℹ️  Text extraction not configured (set SPENDCAST_EXTRACTION_BACKEND to enable)"),
    }

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        extractor,
    });

    let api_routes = Router::new()
        // Ledger
        .route(
            "/expenses",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route(
            "/expenses/:id",
            get(handlers::get_expense)
                .patch(handlers::update_expense)
                .delete(handlers::delete_expense),
        )
        // Summaries
        .route("/summary", get(handlers::current_summary))
        .route("/summary/range", get(handlers::range_summary))
        .route("/summary/:year", get(handlers::yearly_summary))
        .route("/summary/:year/:month", get(handlers::monthly_summary))
        .route("/stats", get(handlers::overall_statistics))
        .route("/top", get(handlers::top_expenses))
        // Trends and forecasts
        .route("/trends", get(handlers::all_trends))
        .route("/trends/:category", get(handlers::category_trend))
        .route("/predict", post(handlers::predict_all))
        .route("/predict/:category", post(handlers::predict_category))
        // Receipt extraction (raw image body)
        .route(
            "/extract",
            post(handlers::extract_receipt).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 1)),
        )
        // Export and audit
        .route("/export", get(handlers::export_expenses))
        .route("/audit", get(handlers::list_audit_log));

    let methods = [
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    Router::new()
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
        ))
}

/// Start the server with the given configuration
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    config: ServerConfig,
    extractor: Option<ExtractorClient>,
) -> anyhow::Result<()> {
    if !config.require_auth {
        warn!("⚠️  Authentication disabled - do not expose to network!");
    }

    let app = create_router(db, config, extractor);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn unavailable(msg: &str) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();

        // Caller mistakes keep their message; everything else is hidden
        if let Some(core) = err.downcast_ref::<spendcast_core::Error>() {
            match core {
                spendcast_core::Error::InvalidData(msg)
                | spendcast_core::Error::InvalidWindow(msg) => return Self::bad_request(msg),
                spendcast_core::Error::NotFound(msg) => return Self::not_found(msg),
                _ => {}
            }
        }

        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "An internal error occurred".to_string(),
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;
