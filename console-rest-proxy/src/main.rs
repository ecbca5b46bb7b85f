// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use console_rest_proxy::config::Config;
use console_rest_proxy::handlers::{build_router, AppState, ProxyState};
use console_rest_proxy::metrics::Metrics;
use console_rest_proxy::{ProxyRequestHandler, RequestOrigin};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config);

    let mount_path = config.normalized_mount_path();
    tracing::info!(
        host = %config.host,
        port = config.port,
        settings_file = %config.settings_file.display(),
        mount_path = %mount_path,
        "starting console-rest-proxy"
    );

    // A handler that cannot be configured never serves a request
    let proxy_configuration = config
        .load_proxy_configuration()
        .context("failed to load proxy configuration")?;
    let handler = ProxyRequestHandler::new(proxy_configuration)
        .context("failed to initialize proxy handler")?;

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let metrics = Metrics::new();
    let app_state = AppState::new(handler.auth_provider_name());

    let proxy_state = ProxyState::new(
        handler,
        metrics,
        mount_path,
        RequestOrigin::new("http", config.host.clone(), config.port),
    );
    let app = build_router(app_state.clone(), proxy_state);

    // Create TCP listener
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "listening for connections");

    // Spawn graceful shutdown handler
    let shutdown_tx_clone = shutdown_tx.clone();
    let shutting_down = app_state.shutting_down.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("shutdown signal received, initiating graceful shutdown");

        // Readiness reports 503 from here on
        shutting_down.store(true, Ordering::SeqCst);

        // Give load balancers time to notice before draining
        tokio::time::sleep(Duration::from_secs(5)).await;
        let _ = shutdown_tx_clone.send(());
    });

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let mut rx = shutdown_tx.subscribe();
            let _ = rx.recv().await;
        })
        .await?;

    tracing::info!("console-rest-proxy stopped");
    Ok(())
}

/// Initialize tracing based on configuration.
fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    if config.log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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
}
