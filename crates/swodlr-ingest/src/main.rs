//! SWODLR Ingest Server - Main entry point

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::Router;
use swodlr_common::logging::{init_logging, LogConfig};
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tracing::info;

use swodlr_ingest::{
    api::{self, AppState},
    bootstrap::{ExecutionLauncher, StepFunctionLauncher},
    config::{load_parameters, IngestSettings, ServerConfig},
    middleware,
    services::{IngestServices, LedgerBackend},
};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::for_service("swodlr-ingest").with_env_overrides()?;
    let _guard = init_logging(&log_config)?;

    info!("Starting SWODLR ingest server");

    let server = ServerConfig::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        server.host, server.port
    );

    let sdk_config = aws_config::load_from_env().await;
    let params = load_parameters(&sdk_config)
        .await
        .context("Failed to load deployment parameters")?;
    let settings = IngestSettings::load(params.as_ref()).context("Invalid ingest settings")?;

    let dynamo = aws_sdk_dynamodb::Client::new(&sdk_config);
    let services = IngestServices::connect(&settings, LedgerBackend::DynamoDb(dynamo))
        .await
        .context("Failed to initialize ingest services")?;

    let launcher = settings.stepfunction_arn.as_ref().map(|arn| {
        info!(state_machine_arn = %arn, "Step function bootstrap enabled");
        Arc::new(StepFunctionLauncher::new(aws_sdk_sfn::Client::new(&sdk_config), arn))
            as Arc<dyn ExecutionLauncher>
    });

    let app = create_router(AppState::new(services, launcher));

    let addr: SocketAddr = format!("{}:{}", server.host, server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

fn create_router(state: AppState) -> Router {
    api::router(state)
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
