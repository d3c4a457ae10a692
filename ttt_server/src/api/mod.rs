//! HTTP API for the tic-tac-toe server.
//!
//! # Modules
//!
//! - [`auth`]: Registration, login, token refresh and logout
//! - [`game`]: Starting games, playing moves and reading stats
//! - [`middleware`]: Bearer-token authentication for protected endpoints
//! - [`request_id`]: `x-request-id` propagation plus request metrics and logs
//! - [`error`]: The JSON error envelope and status mapping
//!
//! # Endpoints Overview
//!
//! ```text
//! POST /auth/register   - Register user (public)
//! POST /auth/login      - Login (public)
//! POST /auth/refresh    - Rotate refresh token (public)
//! POST /auth/logout     - Revoke refresh token (auth required)
//! POST /game/start      - Start a game (auth required)
//! GET  /game/current    - Current in-progress game (auth required)
//! POST /game/move       - Play a move (auth required)
//! GET  /game/stats      - Win/loss/draw counters (auth required)
//! GET  /health          - Health check (public)
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use ttt_server::api::{create_router, AppState};
//! use std::sync::Arc;
//! # use tictactoe::{AuthManager, GameManager};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let auth_manager: AuthManager = unimplemented!();
//! # let game_manager: GameManager = unimplemented!();
//!
//! let state = AppState {
//!     auth_manager: Arc::new(auth_manager),
//!     game_manager: Arc::new(game_manager),
//! };
//!
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod auth;
pub mod error;
pub mod game;
pub mod middleware;
pub mod request_id;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use tictactoe::{AuthManager, GameManager};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request (cheap due to Arc wrappers).
#[derive(Clone)]
pub struct AppState {
    pub auth_manager: Arc<AuthManager>,
    pub game_manager: Arc<GameManager>,
}

/// Create the complete API router with all endpoints and middleware.
///
/// Protected routes sit behind [`middleware::auth_middleware`]; every response
/// goes through request-ID tagging and permissive CORS.
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh_token));

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/game/start", post(game::start_game))
        .route("/game/current", get(game::current_game))
        .route("/game/move", post(game::make_move))
        .route("/game/stats", get(game::stats))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(axum::middleware::from_fn(request_id::request_id_middleware)),
        )
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the session store answers, `503 Service Unavailable`
/// otherwise. The move oracle is not probed.
///
/// ```bash
/// curl http://localhost:3000/health
/// # {"status":"healthy","version":"1.0.0","storage":true,"timestamp":"2026-01-01T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let storage_healthy = match state.game_manager.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            false
        }
    };

    let status_code = if storage_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if storage_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
