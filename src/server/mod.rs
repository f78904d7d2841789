//! HTTP layer
//!
//! `POST /eval` takes a form with a `code` field, records it, runs it through
//! the configured [`SnippetRunner`] and answers with the escaped output page.

use axum::{
    extract::{rejection::FormRejection, DefaultBodyLimit, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::audit::AuditLog;
use crate::config::{Config, InterpreterConfig, LimitsConfig};
use crate::error::{Error, Result};
use crate::render::{render_output, render_page};
use crate::sandbox::{RunRequest, SnippetRunner};

/// Embedded submission form
const INDEX_HTML: &str = include_str!("../../static/index.html");

// ---- App State ----

/// Shared state handed to every request
#[derive(Clone)]
pub struct AppState {
    runner: Arc<dyn SnippetRunner>,
    audit: Option<AuditLog>,
    interpreter: Arc<InterpreterConfig>,
    limits: Arc<LimitsConfig>,
    title: Arc<str>,
    max_request_bytes: usize,
}

impl AppState {
    pub fn new(config: &Config, runner: Arc<dyn SnippetRunner>, audit: Option<AuditLog>) -> Self {
        AppState {
            runner,
            audit,
            interpreter: Arc::new(config.interpreter.clone()),
            limits: Arc::new(config.limits.clone()),
            title: Arc::from(config.server.title.as_str()),
            max_request_bytes: config.server.max_request_bytes,
        }
    }
}

// ---- Error Handling ----

struct AppError(Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            err if err.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let title = status.canonical_reason().unwrap_or("Error");
        (status, Html(render_page(title, &self.0.to_string()))).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError(err)
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError(Error::PayloadTooLarge(rejection.body_text()))
        } else {
            AppError(Error::InvalidInput(rejection.body_text()))
        }
    }
}

// ---- Request Types ----

/// Submitted form
#[derive(Debug, Deserialize)]
pub struct EvalForm {
    /// Source text
    pub code: String,
}

/// Strip carriage returns so CRLF submissions reach the log and the
/// interpreter with plain newlines.
pub fn normalize_source(code: &str) -> String {
    code.replace('\r', "")
}

// ---- Handlers ----

async fn serve_index() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], INDEX_HTML)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn evaluate(
    State(state): State<AppState>,
    form: std::result::Result<Form<EvalForm>, FormRejection>,
) -> std::result::Result<Html<String>, AppError> {
    let Form(form) = form?;
    let source = normalize_source(&form.code);

    // A broken log must not take evaluation down with it
    if let Some(audit) = &state.audit {
        if let Err(e) = audit.record(&source).await {
            warn!(error = %e, "Failed to record submission");
        }
    }

    let request = RunRequest::from_config(source, &state.interpreter, &state.limits);
    let outcome = state.runner.run(request).await?;

    Ok(Html(render_page(&state.title, &render_output(&outcome))))
}

// ---- Router ----

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let max_request_bytes = state.max_request_bytes;

    Router::new()
        .route("/", get(serve_index))
        .route("/eval", post(evaluate))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// Bind to the configured address and serve until Ctrl-C
pub async fn serve(config: &Config, state: AppState) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .map_err(|e| Error::Config(format!("Invalid bind address: {}", e)))?;

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Evaluator listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Evaluator stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
