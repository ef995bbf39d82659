use std::sync::Arc;

use portico_core::config::{AppConfig, ConfigError, LoadOptions, MailConfig, MailTransportKind};
use portico_db::{connect_with_settings, migrations, DbPool};
use portico_mailer::{
    HttpApiMailer, MailError, MailTransport, NoopMailer, NotificationDispatcher, RenderError,
    SmtpMailer, SubmissionNotifier,
};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub notifier: Arc<dyn SubmissionNotifier>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("mail transport setup failed: {0}")]
    MailTransport(#[from] MailError),
    #[error("email template setup failed: {0}")]
    MailTemplates(#[from] RenderError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let transport = build_transport(&config.mail)?;
    let notifier: Arc<dyn SubmissionNotifier> = Arc::new(NotificationDispatcher::new(
        transport,
        &config.mail.from_address,
        &config.mail.admin_address,
    )?);
    info!(
        event_name = "system.bootstrap.mail_ready",
        transport = transport_label(config.mail.transport),
        "mail transport initialized"
    );

    Ok(Application { config, db_pool, notifier })
}

fn build_transport(mail: &MailConfig) -> Result<Arc<dyn MailTransport>, MailError> {
    match mail.transport {
        MailTransportKind::Smtp => Ok(Arc::new(SmtpMailer::new(
            &mail.smtp_host,
            mail.smtp_port,
            &mail.smtp_username,
            &mail.smtp_password,
            &mail.from_address,
        )?)),
        MailTransportKind::Api => {
            let base_url = mail.api_base_url.as_deref().unwrap_or_default();
            let api_key = mail.api_key.clone().unwrap_or_else(|| String::new().into());
            Ok(Arc::new(HttpApiMailer::new(base_url, api_key, &mail.from_address)))
        }
        MailTransportKind::Noop => Ok(Arc::new(NoopMailer)),
    }
}

fn transport_label(kind: MailTransportKind) -> &'static str {
    match kind {
        MailTransportKind::Smtp => "smtp",
        MailTransportKind::Api => "api",
        MailTransportKind::Noop => "noop",
    }
}
