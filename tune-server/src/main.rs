use std::sync::Arc;
use tokio::signal;
use tracing::info;

use tune_core::{MaintenanceService, RiddleService, SystemClock};
use tune_persistence::{
    connection::connect_and_migrate,
    repositories::{DailyRepository, StatsRepository},
};
use tune_server::{
    config::Config, create_routes, images::FsImageProvider, media::ToolchainAcquirer,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting FreezeTune server...");

    let config = Config::new();
    let addr = match config.socket_addr() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("Invalid HOST '{}': {}", config.host, e);
            std::process::exit(1);
        }
    };

    if config.master_key.is_none() && config.category_keys.is_empty() {
        tracing::warn!(
            "No maintenance keys configured; maintenance endpoints will reject every request"
        );
    }

    // Initialize database connection and run migrations
    let db = match connect_and_migrate(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to connect to database and run migrations: {}", e);
            std::process::exit(1);
        }
    };

    let answers = Arc::new(DailyRepository::new(db.clone()));
    let stats = Arc::new(StatsRepository::new(db));
    let images = Arc::new(FsImageProvider::new(&config.base_path));
    let acquirer = Arc::new(ToolchainAcquirer::new(&config.base_path));
    let clock = Arc::new(SystemClock);

    info!(
        "Serving categories {:?} from {}",
        config.categories,
        config.base_path.display()
    );

    let riddle_service = Arc::new(RiddleService::new(
        answers.clone(),
        stats,
        images.clone(),
        clock.clone(),
        config.rules(),
        config.categories.clone(),
    ));
    let maintenance_service = Arc::new(MaintenanceService::new(
        answers,
        images,
        acquirer,
        clock,
        config.keys(),
        config.categories.clone(),
        config.rules(),
    ));

    let routes = create_routes(
        riddle_service,
        maintenance_service,
        config.static_dir.clone(),
    );

    info!("Server starting on {}", addr);

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, shutdown_signal());

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}

/// Resolves on SIGINT or SIGTERM (Ctrl+C elsewhere).
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use signal::unix::{SignalKind, signal};

        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(mut sigint), Ok(mut sigterm)) => {
                tokio::select! {
                    _ = sigint.recv() => {
                        info!("Received SIGINT, shutting down gracefully...");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down gracefully...");
                    }
                }
                return;
            }
            _ => tracing::warn!("Could not install signal handlers, falling back to Ctrl+C"),
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down gracefully..."),
        Err(e) => tracing::error!("Failed to listen for ctrl+c: {}", e),
    }
}
