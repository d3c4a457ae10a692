//! Tic-tac-toe API server.
//!
//! Serves registration, login and game endpoints, storing users and sessions
//! in PostgreSQL (or in memory) and delegating computer moves to the move
//! oracle.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use pico_args::Arguments;
use tictactoe::{
    auth::{AuthManager, AuthSecrets},
    db::{
        Database, GameRepository, MemoryGameRepository, MemoryUserRepository, PgGameRepository,
        PgUserRepository, UserRepository,
    },
    game::GameManager,
    oracle::HttpMoveOracle,
};
use tracing::{info, warn};
use ttt_server::{
    api,
    config::{CliOverrides, ServerConfig},
    logging, metrics,
};

const HELP: &str = "\
Run the tic-tac-toe API server

USAGE:
  ttt_server [OPTIONS]

OPTIONS:
  --bind         IP:PORT   Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:3000]
  --db-url       URL       Database connection string  [default: env DATABASE_URL]
  --oracle-url   URL       Move oracle base URL        [default: env ORACLE_URL]

FLAGS:
  --in-memory              Keep users and games in memory instead of PostgreSQL
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:3000)
  DATABASE_URL             PostgreSQL connection string
  JWT_ACCESS_SECRET        Access token signing secret (32+ chars)
  JWT_REFRESH_SECRET       Refresh token signing secret (32+ chars, distinct)
  PASSWORD_PEPPER          Password hashing pepper (16+ chars)
  ORACLE_URL               Move oracle base URL
  METRICS_BIND             Prometheus exporter address (optional)
  (See .env.example for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = CliOverrides {
        bind: pargs.opt_value_from_str::<_, SocketAddr>("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        oracle_url: pargs.opt_value_from_str("--oracle-url")?,
        in_memory: pargs.contains("--in-memory"),
    };

    logging::init();

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        warn!("Ignoring unrecognized arguments: {:?}", remaining);
    }

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        info!("Prometheus metrics exposed at http://{}/metrics", addr);
    }

    let (users, games): (Arc<dyn UserRepository>, Arc<dyn GameRepository>) = if config.in_memory {
        warn!("Using in-memory stores; all data is lost on shutdown");
        (
            Arc::new(MemoryUserRepository::new()),
            Arc::new(MemoryGameRepository::new()),
        )
    } else {
        info!("Connecting to database");
        let db = Database::new(&config.database)
            .await
            .context("Failed to connect to database")?;
        db.run_migrations()
            .await
            .context("Failed to apply database migrations")?;
        info!("Database connected and migrated");

        (
            Arc::new(PgUserRepository::new(db.pool().clone())),
            Arc::new(PgGameRepository::new(db.pool().clone())),
        )
    };

    let oracle = HttpMoveOracle::with_timeout(&config.oracle.url, config.oracle.timeout())
        .context("Failed to build move oracle client")?;
    info!(
        "Move oracle at {} (timeout {}s)",
        oracle.base_url(),
        config.oracle.timeout_secs
    );

    let security = &config.security;
    let auth_manager = AuthManager::new(
        users.clone(),
        AuthSecrets::new(
            &security.jwt_access_secret,
            &security.jwt_refresh_secret,
            &security.password_pepper,
        ),
    )
    .with_token_durations(
        chrono::Duration::seconds(security.access_token_ttl_secs),
        chrono::Duration::seconds(security.refresh_token_ttl_secs),
    );
    let game_manager = GameManager::new(users, games, Arc::new(oracle));

    let app = api::create_router(api::AppState {
        auth_manager: Arc::new(auth_manager),
        game_manager: Arc::new(game_manager),
    });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
