pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod state;
pub mod background;

use crate::config::Config;
use crate::error::StartupError;
use crate::infra::factory::bootstrap_state;
use api::router::create_router;
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use crate::background::start_background_worker;

pub fn init_logging() -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily("./logs", "workload-service.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("info,workload_backend=debug"));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .pretty()
        .with_target(false)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()));

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("Logging initialized. Writing JSON logs to ./logs/");
    guard
}

pub async fn run() -> Result<(), StartupError> {
    let config = Config::from_env()?;
    let state = bootstrap_state(&config).await?;
    let state_arc = Arc::new(state);

    let worker_state = state_arc.clone();
    let worker = tokio::spawn(async move {
        start_background_worker(worker_state).await;
    });

    let app = create_router(state_arc);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    info!("🚀 Server running on port {}", config.port);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .into_future();

    supervise(server, worker).await?;

    info!("Server stopped");
    Ok(())
}

/// Drives the server while watching the background worker. The worker never
/// returns on its own, so its completion is treated as fatal.
async fn supervise<F>(server: F, mut worker: JoinHandle<()>) -> Result<(), StartupError>
where
    F: Future<Output = std::io::Result<()>>,
{
    let outcome = tokio::select! {
        served = server => served.map_err(StartupError::from),
        joined = &mut worker => {
            let reason = match joined {
                Ok(()) => "exited unexpectedly".to_string(),
                Err(e) => e.to_string(),
            };
            error!("Background worker stopped: {}", reason);
            Err(StartupError::Worker(reason))
        }
    };

    worker.abort();
    outcome
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
