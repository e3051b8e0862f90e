//! # Educa HTTP API Module
//!
//! This module implements the JSON API and the chat WebSocket using axum.
//!
//! ## Endpoints
//!
//! Public:
//! - `GET /health` - Health check
//! - `POST /api/accounts/register` - Register a student
//! - `GET /api/subjects`, `GET /api/subjects/{id}` - Browse subjects
//! - `GET /api/courses`, `GET /api/courses/{id}` - Browse courses
//!
//! Authenticated (HTTP Basic):
//! - `POST /api/courses/{id}/enroll` - Join a course
//! - `GET /api/courses/{id}/contents` - Course contents (enrolled only)
//! - `GET /api/students/courses[/{id}]` - Joined courses
//! - `GET /api/chat/rooms/{course_id}` - Chat room with recent history
//! - `GET /ws/chat/room/{course_id}` - Chat WebSocket
//!
//! Instructors: `/api/manage/*`. Administrators (API key): `/api/admin/*`.
//!
//! Security settings (CORS origins, rate limit, API key) come from
//! [`ServerConfig`].

mod admin;
mod auth;
mod cache;
mod chat;
mod error;
mod handlers;
mod manage;
mod middleware;
mod types;

// Re-exports for external use
pub use auth::basic_credentials;
pub use cache::CatalogCache;
pub use chat::{ChatHub, group_name};
pub use error::ApiError;
pub use middleware::create_rate_limiter;
// Re-export wire types for integration tests (via `educa::api::*`)
#[allow(unused_imports)]
pub use types::{
    ChatFrame, ChatRoomResponse, ClientFrame, ContentResponse, CourseContentsResponse,
    CourseResponse, ErrorResponse, HealthResponse, MessageResponse, ModuleResponse,
    StudentCourseResponse, SubjectResponse, UserResponse,
};

use crate::config::ServerConfig;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post, put},
};
use educa_core::{EducaError, Store};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum request body size (2 MiB).
pub const BODY_LIMIT: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub cache: CatalogCache,
    pub hub: ChatHub,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Store, config: ServerConfig) -> Self {
        Self {
            store: Arc::new(store),
            cache: CatalogCache::new(config.cache_ttl()),
            hub: ChatHub::new(),
            config: Arc::new(config),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const CORS_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

/// Build the CORS layer from the configured origins.
///
/// - `"*"`: allows all origins
/// - not set: localhost only
/// - otherwise: a comma-separated list of allowed origins
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    match config.cors_origins.as_deref() {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins (cors_origins = \"*\")");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods(CORS_METHODS)
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No origins configured, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(CORS_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/accounts/register", post(handlers::register_handler))
        .route("/api/subjects", get(handlers::list_subjects_handler))
        .route("/api/subjects/{id}", get(handlers::get_subject_handler))
        .route("/api/courses", get(handlers::list_courses_handler))
        .route("/api/courses/{id}", get(handlers::get_course_handler))
}

fn student_routes() -> Router<AppState> {
    Router::new()
        .route("/api/courses/{id}/enroll", post(handlers::enroll_handler))
        .route(
            "/api/courses/{id}/contents",
            get(handlers::course_contents_handler),
        )
        .route(
            "/api/students/courses",
            get(handlers::student_courses_handler),
        )
        .route(
            "/api/students/courses/{id}",
            get(handlers::student_course_handler),
        )
        .route(
            "/api/chat/rooms/{course_id}",
            get(chat::chat_room_handler),
        )
        .route(
            "/ws/chat/room/{course_id}",
            get(chat::chat_socket_handler),
        )
}

fn manage_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/manage/courses",
            get(manage::list_own_courses_handler).post(manage::create_course_handler),
        )
        .route(
            "/api/manage/courses/{id}",
            put(manage::update_course_handler).delete(manage::delete_course_handler),
        )
        .route(
            "/api/manage/courses/{id}/modules",
            get(manage::list_modules_handler).post(manage::create_module_handler),
        )
        .route(
            "/api/manage/modules/order",
            post(manage::reorder_modules_handler),
        )
        .route(
            "/api/manage/modules/{id}",
            put(manage::update_module_handler).delete(manage::delete_module_handler),
        )
        .route(
            "/api/manage/modules/{id}/contents",
            get(manage::module_contents_handler),
        )
        .route(
            "/api/manage/modules/{id}/contents/{kind}",
            post(manage::create_content_handler),
        )
        .route(
            "/api/manage/contents/order",
            post(manage::reorder_contents_handler),
        )
        .route(
            "/api/manage/contents/{id}",
            put(manage::update_content_handler).delete(manage::delete_content_handler),
        )
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/subjects", post(admin::create_subject_handler))
        .route(
            "/api/admin/subjects/{id}",
            axum::routing::delete(admin::delete_subject_handler),
        )
        .route("/api/admin/users", post(admin::create_user_handler))
        .route("/api/admin/messages", get(admin::list_messages_handler))
        .route("/api/admin/stats", get(admin::stats_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::api_key_auth_middleware,
        ))
}

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting - protects against DoS (if enabled)
/// 5. API key - admin routes only
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config);

    let rate_limiter = create_rate_limiter(state.config.rate_limit);
    if rate_limiter.is_some() {
        tracing::info!(
            "Rate limiting enabled: {} requests/second",
            state.config.rate_limit
        );
    } else {
        tracing::info!("Rate limiting disabled");
    }

    let mut router = Router::new()
        .merge(public_routes())
        .merge(student_routes())
        .merge(manage_routes());

    if state.config.admin_key().is_some() {
        tracing::info!("Admin API enabled under /api/admin");
        router = router.merge(admin_routes(&state));
    } else {
        tracing::warn!("Admin API disabled: set EDUCA_API_KEY to mount /api/admin");
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and run until Ctrl+C.
pub async fn run_server(addr: &str, store: Store, config: ServerConfig) -> Result<(), EducaError> {
    let state = AppState::new(store, config);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| EducaError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("Educa server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| EducaError::Io(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a signal handler, run until the process is killed.
        tracing::error!(event = "signal_failed", error = %e);
        std::future::pending::<()>().await;
    }
    tracing::info!(event = "shutdown", "Shutting down");
}

// =============================================================================
// TESTS
// =============================================================================
