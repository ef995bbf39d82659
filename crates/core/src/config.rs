use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub mail: MailConfig,
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct MailConfig {
    pub transport: MailTransportKind,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: SecretString,
    pub api_base_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub from_address: String,
    pub admin_address: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AdminConfig {
    /// Login stays disabled until a password is configured.
    pub password: Option<SecretString>,
    pub session_ttl_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailTransportKind {
    Smtp,
    Api,
    Noop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub mail_transport: Option<MailTransportKind>,
    pub mail_from_address: Option<String>,
    pub mail_admin_address: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://portico.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            mail: MailConfig {
                transport: MailTransportKind::Noop,
                smtp_host: String::new(),
                smtp_port: 587,
                smtp_username: String::new(),
                smtp_password: String::new().into(),
                api_base_url: None,
                api_key: None,
                from_address: "noreply@portico.example".to_string(),
                admin_address: "sales@portico.example".to_string(),
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            admin: AdminConfig { password: None, session_ttl_secs: 3_600 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for MailTransportKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "smtp" => Ok(Self::Smtp),
            "api" => Ok(Self::Api),
            "noop" => Ok(Self::Noop),
            other => Err(ConfigError::Validation(format!(
                "unsupported mail transport `{other}` (expected smtp|api|noop)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("portico.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(mail) = patch.mail {
            if let Some(transport) = mail.transport {
                self.mail.transport = transport;
            }
            if let Some(smtp_host) = mail.smtp_host {
                self.mail.smtp_host = smtp_host;
            }
            if let Some(smtp_port) = mail.smtp_port {
                self.mail.smtp_port = smtp_port;
            }
            if let Some(smtp_username) = mail.smtp_username {
                self.mail.smtp_username = smtp_username;
            }
            if let Some(smtp_password_value) = mail.smtp_password {
                self.mail.smtp_password = secret_value(smtp_password_value);
            }
            if let Some(api_base_url) = mail.api_base_url {
                self.mail.api_base_url = Some(api_base_url);
            }
            if let Some(api_key_value) = mail.api_key {
                self.mail.api_key = Some(secret_value(api_key_value));
            }
            if let Some(from_address) = mail.from_address {
                self.mail.from_address = from_address;
            }
            if let Some(admin_address) = mail.admin_address {
                self.mail.admin_address = admin_address;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(admin) = patch.admin {
            if let Some(password_value) = admin.password {
                self.admin.password = Some(secret_value(password_value));
            }
            if let Some(session_ttl_secs) = admin.session_ttl_secs {
                self.admin.session_ttl_secs = session_ttl_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("PORTICO_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("PORTICO_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("PORTICO_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("PORTICO_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("PORTICO_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("PORTICO_MAIL_TRANSPORT") {
            self.mail.transport = value.parse()?;
        }
        if let Some(value) = read_env("PORTICO_MAIL_SMTP_HOST") {
            self.mail.smtp_host = value;
        }
        if let Some(value) = read_env("PORTICO_MAIL_SMTP_PORT") {
            self.mail.smtp_port = parse_u16("PORTICO_MAIL_SMTP_PORT", &value)?;
        }
        if let Some(value) = read_env("PORTICO_MAIL_SMTP_USERNAME") {
            self.mail.smtp_username = value;
        }
        if let Some(value) = read_env("PORTICO_MAIL_SMTP_PASSWORD") {
            self.mail.smtp_password = secret_value(value);
        }
        if let Some(value) = read_env("PORTICO_MAIL_API_BASE_URL") {
            self.mail.api_base_url = Some(value);
        }
        if let Some(value) = read_env("PORTICO_MAIL_API_KEY") {
            self.mail.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("PORTICO_MAIL_FROM_ADDRESS") {
            self.mail.from_address = value;
        }
        if let Some(value) = read_env("PORTICO_MAIL_ADMIN_ADDRESS") {
            self.mail.admin_address = value;
        }

        if let Some(value) = read_env("PORTICO_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("PORTICO_SERVER_PORT") {
            self.server.port = parse_u16("PORTICO_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("PORTICO_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("PORTICO_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("PORTICO_ADMIN_PASSWORD") {
            self.admin.password = Some(secret_value(value));
        }
        if let Some(value) = read_env("PORTICO_ADMIN_SESSION_TTL_SECS") {
            self.admin.session_ttl_secs = parse_u64("PORTICO_ADMIN_SESSION_TTL_SECS", &value)?;
        }

        let log_level = read_env("PORTICO_LOGGING_LEVEL").or_else(|| read_env("PORTICO_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PORTICO_LOGGING_FORMAT").or_else(|| read_env("PORTICO_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(mail_transport) = overrides.mail_transport {
            self.mail.transport = mail_transport;
        }
        if let Some(from_address) = overrides.mail_from_address {
            self.mail.from_address = from_address;
        }
        if let Some(admin_address) = overrides.mail_admin_address {
            self.mail.admin_address = admin_address;
        }
        if let Some(admin_password) = overrides.admin_password {
            self.admin.password = Some(secret_value(admin_password));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_mail(&self.mail)?;
        validate_server(&self.server)?;
        validate_admin(&self.admin)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("portico.toml"), PathBuf::from("config/portico.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_mail(mail: &MailConfig) -> Result<(), ConfigError> {
    if !mail.from_address.contains('@') {
        return Err(ConfigError::Validation(
            "mail.from_address must be an email address".to_string(),
        ));
    }
    if !mail.admin_address.contains('@') {
        return Err(ConfigError::Validation(
            "mail.admin_address must be an email address".to_string(),
        ));
    }

    match mail.transport {
        MailTransportKind::Smtp => {
            if mail.smtp_host.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "mail.smtp_host is required for the smtp transport".to_string(),
                ));
            }
            if mail.smtp_port == 0 {
                return Err(ConfigError::Validation(
                    "mail.smtp_port must be greater than zero".to_string(),
                ));
            }
        }
        MailTransportKind::Api => {
            let base_url_ok = mail
                .api_base_url
                .as_deref()
                .map(|url| url.starts_with("http://") || url.starts_with("https://"))
                .unwrap_or(false);
            if !base_url_ok {
                return Err(ConfigError::Validation(
                    "mail.api_base_url must start with http:// or https:// for the api transport"
                        .to_string(),
                ));
            }

            let key_missing = mail
                .api_key
                .as_ref()
                .map(|key| key.expose_secret().trim().is_empty())
                .unwrap_or(true);
            if key_missing {
                return Err(ConfigError::Validation(
                    "mail.api_key is required for the api transport".to_string(),
                ));
            }
        }
        MailTransportKind::Noop => {}
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_admin(admin: &AdminConfig) -> Result<(), ConfigError> {
    if let Some(password) = &admin.password {
        if password.expose_secret().len() < 8 {
            return Err(ConfigError::Validation(
                "admin.password must be at least 8 characters".to_string(),
            ));
        }
    }

    if admin.session_ttl_secs < 60 || admin.session_ttl_secs > 86_400 {
        return Err(ConfigError::Validation(
            "admin.session_ttl_secs must be in range 60..=86400".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    mail: Option<MailPatch>,
    server: Option<ServerPatch>,
    admin: Option<AdminPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct MailPatch {
    transport: Option<MailTransportKind>,
    smtp_host: Option<String>,
    smtp_port: Option<u16>,
    smtp_username: Option<String>,
    smtp_password: Option<String>,
    api_base_url: Option<String>,
    api_key: Option<String>,
    from_address: Option<String>,
    admin_address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AdminPatch {
    password: Option<String>,
    session_ttl_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
