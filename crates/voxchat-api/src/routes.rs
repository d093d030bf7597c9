//! HTTP surface: route table, middleware stack and server startup.
//!
//! Rate limiting covers every route except `/health`.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use voxchat_core::{VoxchatConfig, VoxchatError};

use crate::handlers;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::state::AppState;

/// Global request body limit.
const BODY_LIMIT: usize = 1024 * 1024;
/// Body limit for recorded audio uploads.
const VOICE_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Build the router over `state`.
pub fn create_router(state: AppState) -> Router {
    // Browser and desktop clients connect from anywhere.
    let cors = CorsLayer::permissive();

    let limiter = RateLimiter::new(state.config.general.rate_limit_per_sec);

    let chat_routes = Router::new()
        .route("/chat", post(handlers::chat))
        .route(
            "/chat/{session_id}/voice",
            post(handlers::chat_voice).layer(DefaultBodyLimit::max(VOICE_BODY_LIMIT)),
        )
        .route("/chat/{session_id}", delete(handlers::clear_chat))
        .route("/chat/{session_id}/history", get(handlers::chat_history))
        .route(
            "/chat/{session_id}/output",
            get(handlers::get_output_mode).put(handlers::set_output_mode),
        )
        .route("/sessions", get(handlers::list_sessions))
        .route("/sessions/{session_id}", delete(handlers::end_session))
        .layer(axum::middleware::from_fn(rate_limit_middleware))
        .layer(axum::Extension(limiter));

    // Health checks are exempt from rate limiting.
    let public_routes = Router::new().route("/health", get(handlers::health));

    public_routes
        .merge(chat_routes)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the configured address and serve until Ctrl-C.
pub async fn start_server(config: &VoxchatConfig, state: AppState) -> Result<(), VoxchatError> {
    let addr = format!("{}:{}", config.general.host, config.general.port);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| VoxchatError::Api(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!(addr = %addr, "API server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| VoxchatError::Api(format!("Server error: {}", e)))?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
