use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use panotour_core::{MemoryTourRepo, TourRepository};
use panotour_db::PgTourRepo;
use panotour_events::AnalyticsRecorder;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use panotour_api::config::ServerConfig;
use panotour_api::router::build_app_router;
use panotour_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "panotour_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    tracing::info!(
        host = %config.host,
        port = %config.port,
        max_tours = ?config.limits.max_tours,
        max_scenes = ?config.limits.max_scenes,
        "Loaded server configuration",
    );

    // --- Storage ---
    let (repo, pool) = match &config.database_url {
        Some(database_url) => {
            let pool = panotour_db::create_pool(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            panotour_db::health_check(&pool)
                .await
                .expect("Database health check failed");
            tracing::info!("Database health check passed");

            panotour_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            let repo: Arc<dyn TourRepository> = Arc::new(PgTourRepo::new(pool.clone()));
            (repo, Some(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, tours are kept in memory");
            let repo: Arc<dyn TourRepository> = Arc::new(MemoryTourRepo::new());
            (repo, None)
        }
    };

    // --- App state ---
    let state = AppState::new(config.clone(), repo, pool);

    // Spawn the analytics recorder (folds bus events into the store).
    let recorder_cancel = CancellationToken::new();
    let recorder_handle = tokio::spawn(AnalyticsRecorder::run(
        Arc::clone(&state.analytics),
        state.event_bus.subscribe(),
        recorder_cancel.clone(),
    ));
    tracing::info!("Analytics recorder started");

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    recorder_cancel.cancel();
    let _ = tokio::time::timeout(
        Duration::from_secs(config.shutdown_timeout_secs),
        recorder_handle,
    )
    .await;
    tracing::info!("Analytics recorder stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
