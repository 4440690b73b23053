//! Serve command - Run the Pulse server
//!
//! Wires persistence, the pipeline, the tap point and the rotation scheduler
//! behind the HTTP API, then runs until SIGINT/SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use pulse_api::{AppState, RateLimiter, RouterOptions, build_router_with_options};
use pulse_config::Config;
use pulse_pipeline::{Pipeline, RotationScheduler, spawn_source_cleanup};
use pulse_storage::{ArchiveStore, Persistence};
use pulse_tap::TapPoint;

/// Serve command arguments
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file (defaults to configs/pulse.toml if not specified)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let config_path = args
        .config
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(default)".to_string());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        config = %config_path,
        "Pulse starting"
    );

    let config = super::load_config(args.config.as_deref())?;

    if let Err(e) = run_server(config).await {
        error!(error = %e, "server error");
        return Err(e);
    }

    info!("Pulse shutdown complete");
    Ok(())
}

/// Main server run loop
async fn run_server(config: Config) -> Result<()> {
    let cancel = CancellationToken::new();
    let mut tasks: Vec<(&'static str, JoinHandle<()>)> = Vec::new();

    // Persistence (primary backend with file fallback)
    let persistence = Arc::new(
        Persistence::open(&config.storage)
            .await
            .context("failed to open storage")?,
    );
    info!(
        backend = persistence.backend_name(),
        data_dir = %config.storage.data_dir.display(),
        "storage ready"
    );

    // Fan-out and pipeline
    let tap = Arc::new(TapPoint::new(&config.stream));
    let pipeline = Arc::new(Pipeline::new(
        &config.ingest,
        Arc::clone(&persistence),
        Arc::clone(&tap),
    ));

    let loaded = pipeline.load().await;
    info!(
        logs = loaded.logs,
        monitoring = loaded.monitoring,
        sources = loaded.sources,
        dropped = loaded.dropped,
        "live sets restored"
    );

    // Rotation
    let archives = ArchiveStore::new(&config.rotation.archive_dir, config.rotation.compress);
    let scheduler = Arc::new(
        RotationScheduler::recover(Arc::clone(&pipeline), archives, &config.rotation).await,
    );
    tasks.push(("rotation", scheduler.spawn(cancel.child_token())));

    // Maintenance
    tasks.push((
        "tap",
        tap.spawn_maintenance(config.stream.heartbeat, cancel.child_token()),
    ));
    tasks.push((
        "sources",
        spawn_source_cleanup(Arc::clone(&pipeline), &config.sources, cancel.child_token()),
    ));

    let mut state = AppState::new(Arc::clone(&pipeline), scheduler)
        .with_heartbeat(config.stream.heartbeat);
    if config.rate_limit.enabled {
        let limiter = RateLimiter::new(&config.rate_limit);
        tasks.push((
            "rate_limit",
            limiter.spawn_cleanup(config.rate_limit.cleanup_interval, cancel.child_token()),
        ));
        info!(
            window_ms = config.rate_limit.window_ms,
            max_requests = config.rate_limit.max_requests,
            "rate limiting enabled"
        );
        state = state.with_rate_limiter(limiter);
    }

    // HTTP
    let app = build_router_with_options(
        state,
        RouterOptions {
            max_payload_bytes: Some(config.server.max_payload_bytes),
            cors: config.server.cors,
        },
    );

    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "API server listening");

    let server_cancel = cancel.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            server_cancel.cancelled().await;
        })
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, "API server error");
        });
    });

    tokio::select! {
        _ = wait_for_shutdown() => {
            info!("shutdown signal received, stopping server...");
        }
        _ = &mut server => {
            warn!("API server stopped unexpectedly");
        }
    }

    cancel.cancel();

    let shutdown_timeout = config.server.shutdown_timeout;
    if !server.is_finished() {
        tasks.push(("server", server));
    }
    for (name, task) in tasks {
        match tokio::time::timeout(shutdown_timeout, task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(task = name, error = %e, "task panicked during shutdown"),
            Err(_) => warn!(task = name, "task did not finish within timeout, continuing shutdown"),
        }
    }

    // Final save so the next start restores the same live sets
    if !pipeline.save().await {
        warn!("final save failed, recent entries may be lost");
    }
    persistence.close().await;

    Ok(())
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
