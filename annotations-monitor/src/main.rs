// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Monitors annotation publishes and closes out their transactions.

mod admin;

use std::process;
use std::sync::Arc;
use std::time::Duration;

use closure_engine::{scheduler::spawn_monitor_loop, MonitoringService};
use core_types::config::AppConfig;
use event_reader_client::SplunkEventReader;
use log::{error, info};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SECONDS_PER_MINUTE: u64 = 60;

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error("http client build failed: {0}")]
    Client(#[from] reqwest::Error),
    #[error("admin listener bind failed: {0}")]
    Bind(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .init();

    if let Err(err) = run().await {
        error!("annotations-monitor failed: {err}");
        process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    info!(
        "[startup] {} is starting, system_code={}, port={}",
        config.app_name, config.app_system_code, config.port
    );

    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    let event_reader = Arc::new(SplunkEventReader::new(
        client.clone(),
        config.event_reader_url.clone(),
    ));
    let service = Arc::new(MonitoringService::new(
        event_reader,
        config.content_type.clone(),
        config.max_lookback_period,
        config.superseded_check_period,
    ));

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    let admin = Arc::new(admin::AdminServer::new(&config, client));
    tokio::spawn(async move {
        if let Err(err) = admin.serve(listener).await {
            error!("admin endpoint server failed: {err}");
        }
    });

    let cancel = CancellationToken::new();
    let monitor = spawn_monitor_loop(
        service,
        Duration::from_secs(config.check_frequency * SECONDS_PER_MINUTE),
        cancel.clone(),
    );

    wait_for_signal().await;
    info!("shutdown signal received, finishing current pass");
    cancel.cancel();
    if let Err(err) = monitor.await {
        error!("monitor loop join failed: {err}");
    }
    Ok(())
}

async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(err) => {
            error!("SIGTERM handler unavailable: {err}");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}
