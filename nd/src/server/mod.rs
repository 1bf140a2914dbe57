//! HTTP server
//!
//! One axum router carries all three surfaces:
//! - dashboard API under `/api/*`
//! - workspace UI extension callbacks (`/actions`, `/slash-commands`, `/webhook*`, `/auth/callback`)
//! - tool surface under `/mcp/*`
//!
//! Every request that touches the workspace connects with the caller's
//! bearer token, or the configured default token when none is sent.

mod api;
mod app;
mod error;
mod mcp;

use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue, Method, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use eyre::{Context, Result};
use serde_json::{Value, json};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

pub use error::{ApiError, ApiResult};

use crate::assistant::Assistant;
use crate::config::Config;
use crate::integration::NativeIntegration;
use crate::interpret::PageController;
use crate::llm::TextGenerator;
use crate::prompts::PromptLoader;
use crate::workspace::WorkspaceConnector;

pub const SERVICE_NAME: &str = "notiond";

/// Shared server state; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub generator: Arc<dyn TextGenerator>,
    pub connector: Arc<dyn WorkspaceConnector>,
    /// Used when a request carries no bearer token
    pub default_token: Option<String>,
    pub prompts: Arc<PromptLoader>,
}

impl AppState {
    /// Token from `Authorization: Bearer <t>`, else the default
    pub fn token(&self, headers: &HeaderMap) -> ApiResult<String> {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty());

        match bearer {
            Some(token) => Ok(token.to_string()),
            None => self
                .default_token
                .clone()
                .ok_or_else(|| ApiError::unauthorized("Notion token required")),
        }
    }

    /// Assistant bound to the caller's workspace
    pub fn assistant(&self, headers: &HeaderMap) -> ApiResult<Assistant> {
        let token = self.token(headers)?;
        let store = self.connector.connect(&token)?;
        Ok(Assistant::new(store, self.generator.clone(), self.prompts.clone()))
    }

    pub fn integration(&self, headers: &HeaderMap) -> ApiResult<NativeIntegration> {
        Ok(NativeIntegration::new(
            self.assistant(headers)?,
            self.config.chunking.max_length,
        ))
    }

    pub fn controller(&self, headers: &HeaderMap) -> ApiResult<PageController> {
        Ok(PageController::new(self.assistant(headers)?))
    }
}

pub(crate) fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(allowed))
}

/// Create the router with all endpoints
pub fn create_router(state: AppState) -> Router {
    debug!("create_router: called");
    let cors = cors_layer(&state.config.server.allowed_origins);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        // Dashboard API
        .route("/api/summarize", post(api::summarize))
        .route("/api/analyze-database", post(api::analyze_database))
        .route("/api/content-suggestions", post(api::content_suggestions))
        .route("/api/improve-content", post(api::improve_content))
        .route("/api/generate-questions", post(api::generate_questions))
        .route("/api/extract-info", post(api::extract_info))
        .route("/api/search-analyze", post(api::search_analyze))
        .route("/api/extract-page-id", post(api::extract_page_id))
        .route("/api/ai-actions", post(api::ai_actions))
        .route("/api/page-control", post(api::page_control))
        // UI extension callbacks
        .route("/actions", get(app::actions_status).post(app::actions))
        .route("/slash-commands", post(app::slash_commands))
        .route("/webhook", post(app::webhook))
        .route("/webhook/verify", post(app::webhook_verify))
        .route("/auth/callback", post(app::auth_callback))
        // Tool surface
        .route("/mcp/capabilities", get(mcp::capabilities))
        .route("/mcp/tools", get(mcp::list_tools))
        .route("/mcp/tools/{name}", post(mcp::call_tool))
        .route("/mcp/call", post(mcp::call))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": timestamp(),
    }))
}

async fn index() -> Json<Value> {
    Json(json!({
        "name": SERVICE_NAME,
        "description": "AI assistant for a Notion workspace, backed by Google Gemini",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "GET /health",
            "summarize": "POST /api/summarize",
            "analyze_database": "POST /api/analyze-database",
            "content_suggestions": "POST /api/content-suggestions",
            "improve_content": "POST /api/improve-content",
            "generate_questions": "POST /api/generate-questions",
            "extract_info": "POST /api/extract-info",
            "search_analyze": "POST /api/search-analyze",
            "extract_page_id": "POST /api/extract-page-id",
            "ai_actions": "POST /api/ai-actions",
            "page_control": "POST /api/page-control",
            "actions": "POST /actions",
            "slash_commands": "POST /slash-commands",
            "webhook": "POST /webhook",
            "capabilities": "GET /mcp/capabilities",
            "tools": "GET /mcp/tools",
            "execute": "POST /mcp/tools/{name}",
            "call": "POST /mcp/call",
        },
    }))
}

async fn not_found() -> ApiError {
    ApiError::not_found("Endpoint not found")
}

/// Bind and serve until the process is stopped
pub async fn serve(state: AppState) -> Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    debug!(%addr, "serve: called");

    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, router).await.context("Server error")?;
    Ok(())
}
