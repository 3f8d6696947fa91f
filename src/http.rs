//! HTTP surface for genealogy lookups and consanguinity checks.

use crate::config::Config;
use crate::error::{AviaryError, Result};
use crate::genealogy::GenealogyService;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// HTTP server wrapper
pub struct HttpServer {
    state: AppState,
}

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    service: Arc<GenealogyService>,
    api_key: String,
    allowed_origins: Vec<String>,
    authless: bool,
}

impl HttpServer {
    /// Create a new HTTP server.
    ///
    /// The API key is read from the env var named by `http_server.api_key_env`
    /// unless authless mode is on.
    pub fn new(service: GenealogyService, config: &Config) -> Result<Self> {
        let api_key = if config.http_server.authless {
            String::new()
        } else {
            std::env::var(&config.http_server.api_key_env).map_err(|_| {
                AviaryError::Config(format!(
                    "Environment variable {} not set. Set it in your .env file or enable authless mode.",
                    config.http_server.api_key_env
                ))
            })?
        };

        Ok(Self {
            state: AppState {
                service: Arc::new(service),
                api_key,
                allowed_origins: config.http_server.allowed_origins.clone(),
                authless: config.http_server.authless,
            },
        })
    }

    /// Bind and serve until the process stops
    pub async fn run(&self, port: u16) -> Result<()> {
        let addr = format!("127.0.0.1:{}", port);
        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
            AviaryError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to bind to {}: {}. Set http_server.port in config.toml to use another port.", addr, e),
            ))
        })?;
        log::info!("Aviary API listening on http://{}", addr);

        axum::serve(listener, self.router()).await?;
        Ok(())
    }

    /// Build the axum router
    pub fn router(&self) -> Router {
        let cors = if self.state.allowed_origins.is_empty() {
            CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
        } else {
            let origins: Vec<HeaderValue> = self
                .state
                .allowed_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .route("/api/genealogy/:bird_id", get(handle_genealogy))
            .route("/api/ancestors/:bird_id", get(handle_ancestors))
            .route("/api/consanguinity", get(handle_consanguinity))
            .route("/health", get(handle_health))
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
            .with_state(self.state.clone())
    }
}

impl AppState {
    fn authorize(&self, headers: &HeaderMap) -> std::result::Result<(), Response> {
        if self.authless {
            return Ok(());
        }
        validate_auth(headers, &self.api_key)?;
        validate_origin(headers, &self.allowed_origins)
    }
}

#[derive(Debug, Deserialize)]
struct GenerationsQuery {
    max_generations: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ConsanguinityQuery {
    bird_a: String,
    bird_b: String,
    max_generations: Option<usize>,
    strict: Option<bool>,
}

async fn handle_genealogy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(bird_id): Path<String>,
) -> Response {
    if let Err(response) = state.authorize(&headers) {
        return response;
    }
    match state.service.genealogy(&bird_id).await {
        Ok(genealogy) => (StatusCode::OK, Json(genealogy)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn handle_ancestors(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(bird_id): Path<String>,
    Query(query): Query<GenerationsQuery>,
) -> Response {
    if let Err(response) = state.authorize(&headers) {
        return response;
    }
    let result = match state.service.options(query.max_generations, None) {
        Ok(options) => state
            .service
            .ancestors(&bird_id, options)
            .await
            .map(|ancestors| (options, ancestors)),
        Err(e) => Err(e),
    };
    match result {
        Ok((options, ancestors)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "bird_id": bird_id,
                "max_generations": options.max_generations,
                "ancestors": ancestors,
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

async fn handle_consanguinity(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ConsanguinityQuery>,
) -> Response {
    if let Err(response) = state.authorize(&headers) {
        return response;
    }
    let result = match state.service.options(query.max_generations, query.strict) {
        Ok(options) => {
            state
                .service
                .check_consanguinity(&query.bird_a, &query.bird_b, options)
                .await
        }
        Err(e) => Err(e),
    };
    match result {
        Ok(verdict) => (StatusCode::OK, Json(verdict)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn handle_health() -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "service": "aviary",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
        .into_response()
}

/// Map an engine error onto a JSON error response
fn error_response(err: AviaryError) -> Response {
    let status = match &err {
        AviaryError::IndividualNotFound(_) => StatusCode::NOT_FOUND,
        AviaryError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AviaryError::MalformedRecord { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AviaryError::Database(_) | AviaryError::Io(_) | AviaryError::Config(_) => {
            log::error!("Request failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}

/// Validate Authorization header
fn validate_auth(headers: &HeaderMap, expected_key: &str) -> std::result::Result<(), Response> {
    let auth_header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "error": "Missing Authorization header",
                    "message": "Use 'Authorization: Bearer <api-key>' header"
                })),
            )
                .into_response()
        })?;

    match auth_header.strip_prefix("Bearer ") {
        Some(provided) if provided == expected_key => Ok(()),
        Some(_) => Err((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "Invalid API key" })),
        )
            .into_response()),
        None => Err((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "Invalid Authorization header format",
                "message": "Use 'Authorization: Bearer <api-key>' header"
            })),
        )
            .into_response()),
    }
}

/// Validate Origin header against the configured allow-list
fn validate_origin(headers: &HeaderMap, allowed_origins: &[String]) -> std::result::Result<(), Response> {
    if allowed_origins.is_empty() {
        return Ok(());
    }

    // Requests without an Origin header are not from a browser
    let origin = match headers.get("origin").and_then(|h| h.to_str().ok()) {
        Some(o) => o,
        None => return Ok(()),
    };

    if allowed_origins.iter().any(|allowed| origin == allowed) {
        Ok(())
    } else {
        Err((
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({
                "error": "Origin not allowed",
                "message": format!("Origin '{}' is not in the allowed origins list", origin)
            })),
        )
            .into_response())
    }
}
