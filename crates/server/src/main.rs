mod admin;
mod bootstrap;
mod catalog;
mod health;
mod submission;

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use portico_core::config::{AppConfig, LoadOptions};
use portico_db::repositories::{SqlCatalogRepository, SqlConfigurationRepository};

use crate::admin::AdminState;
use crate::catalog::CatalogState;
use crate::submission::{SubmissionService, SubmissionState};

fn init_logging(config: &AppConfig) {
    use portico_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    let catalog = Arc::new(SqlCatalogRepository::new(app.db_pool.clone()));
    let configurations = Arc::new(SqlConfigurationRepository::new(app.db_pool.clone()));

    let submission_state = SubmissionState {
        service: Arc::new(SubmissionService::new(
            catalog.clone(),
            configurations.clone(),
            app.notifier.clone(),
        )),
    };
    let catalog_state = CatalogState { catalog: catalog.clone() };
    let admin_state = AdminState {
        db_pool: app.db_pool.clone(),
        catalog,
        configurations,
        password: app.config.admin.password.clone(),
        session_ttl_secs: app.config.admin.session_ttl_secs,
    };

    let router: Router = Router::new()
        .merge(health::router(app.db_pool.clone()))
        .merge(submission::router(submission_state))
        .merge(catalog::router(catalog_state))
        .merge(admin::router(admin_state));

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        "portico-server listening"
    );

    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!(event_name = "system.server.stopped", "portico-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_error",
            error = %error,
            "failed to listen for shutdown signal"
        );
    }
}
