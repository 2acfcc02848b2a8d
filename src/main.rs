//! Guild Auth Server
//!
//! Serves the wallet-signature login flow for the guild web app: challenge
//! issuance, signature verification and bearer/refresh token management.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;
use tokio::signal;

use guild_auth::auth::sweeper::ChallengeSweeper;
use guild_auth::auth::{AuthService, AuthSettings, TokenIssuer};
use guild_auth::config::Config;
use guild_auth::db;
use guild_auth::routes::create_router;
use guild_auth::state::AppState;
use guild_auth::store::{ChallengeStore, MemoryStore, PgStore, ReplayGuardStore};
use guild_auth::time::{SystemTimeSource, TimeSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(environment = config.environment.as_str(), "Starting guild auth server");

    // Select the challenge store
    let (challenges, replay_guard, storage_backend): (
        Arc<dyn ChallengeStore>,
        Arc<dyn ReplayGuardStore>,
        &'static str,
    ) = if config.database_url.is_some() {
        let pool = db::create_pool(&config)
            .await
            .context("Failed to connect to database")?;
        db::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        let store = Arc::new(PgStore::new(pool));
        let challenges: Arc<dyn ChallengeStore> = store.clone();
        let replay_guard: Arc<dyn ReplayGuardStore> = store;
        (challenges, replay_guard, "postgres")
    } else {
        tracing::warn!(
            "DATABASE_URL not set, using the in-process challenge store; \
             challenges are lost on restart and not shared between instances"
        );
        let store = Arc::new(MemoryStore::new());
        let challenges: Arc<dyn ChallengeStore> = store.clone();
        let replay_guard: Arc<dyn ReplayGuardStore> = store;
        (challenges, replay_guard, "memory")
    };

    let time: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);

    let settings = AuthSettings {
        challenge_ttl: Duration::try_seconds(config.auth_challenge_ttl_seconds)
            .context("AUTH_CHALLENGE_TTL_SECONDS out of range")?,
        challenge_reuse_window: Duration::try_seconds(config.auth_challenge_reuse_seconds)
            .context("AUTH_CHALLENGE_REUSE_SECONDS out of range")?,
    };

    let tokens = TokenIssuer::new(
        &config.jwt_secret,
        &config.jwt_issuer,
        Duration::try_seconds(config.jwt_bearer_ttl_seconds)
            .context("JWT_BEARER_TTL_SECONDS out of range")?,
        Duration::try_days(config.jwt_refresh_ttl_days)
            .context("JWT_REFRESH_TTL_DAYS out of range")?,
        time.clone(),
    );

    let auth_service = Arc::new(AuthService::new(
        challenges.clone(),
        replay_guard,
        tokens,
        time.clone(),
        &config.app_name,
        settings,
    ));

    // Start expired challenge sweeper in background
    let sweeper = ChallengeSweeper::new(
        challenges,
        time,
        settings.challenge_ttl,
        std::time::Duration::from_secs(config.auth_challenge_sweep_seconds),
    );
    tokio::spawn(async move {
        sweeper.start().await;
        tracing::error!("Challenge sweeper task exited unexpectedly");
    });

    // Create shared app state
    let app_state = AppState::new(
        auth_service,
        config.environment,
        storage_backend,
    );

    let app = create_router(app_state, &config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.host, config.port))?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
