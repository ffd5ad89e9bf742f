mod config;
mod error;
mod routes;
mod services;
mod state;

use crate::config::AppConfig;
use crate::services::retention_scheduler::RetentionScheduler;
use crate::state::AppState;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    backup_core::utils::logger::init(&config.backup.log.level)?;
    tracing::info!("Starting backup admin on port {}", config.port);

    // Ensure the backups namespace exists so the first listing isn't an error
    std::fs::create_dir_all(config.backup.storage.root.join("backups"))?;
    if let Some(staging) = &config.backup.storage.staging_dir {
        std::fs::create_dir_all(staging)?;
    }

    let state = Arc::new(AppState::new(config.clone()));

    // Retention sweep
    let scheduler = if config.backup.retention.enabled {
        match RetentionScheduler::new(state.clone()).await {
            Ok(s) => {
                if let Err(e) = s.schedule_sweep().await {
                    tracing::warn!("Failed to schedule retention sweep: {}", e);
                }
                if let Err(e) = s.start().await {
                    tracing::warn!("Failed to start scheduler: {}", e);
                }
                Some(s)
            }
            Err(e) => {
                tracing::warn!("Failed to create scheduler: {}", e);
                None
            }
        }
    } else {
        tracing::info!("Retention sweep disabled");
        None
    };

    let app = routes::create_router(state.clone());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down...");

    if let Some(s) = scheduler {
        if let Err(e) = s.shutdown().await {
            tracing::warn!("Scheduler shutdown error: {}", e);
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl+c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
