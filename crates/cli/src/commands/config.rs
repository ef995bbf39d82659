use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use portico_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    let mut push = |key: &str, value: &str, env_key: Option<&str>| {
        lines.push(render_line(
            key,
            value,
            field_source(key, env_key, config_file_doc.as_ref(), config_file_path.as_deref()),
        ));
    };

    push("database.url", &config.database.url, Some("PORTICO_DATABASE_URL"));
    push(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        Some("PORTICO_DATABASE_MAX_CONNECTIONS"),
    );
    push(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        Some("PORTICO_DATABASE_TIMEOUT_SECS"),
    );

    push(
        "mail.transport",
        &format!("{:?}", config.mail.transport).to_lowercase(),
        Some("PORTICO_MAIL_TRANSPORT"),
    );
    push("mail.smtp_host", unset_or(&config.mail.smtp_host), Some("PORTICO_MAIL_SMTP_HOST"));
    push("mail.smtp_port", &config.mail.smtp_port.to_string(), Some("PORTICO_MAIL_SMTP_PORT"));
    push(
        "mail.smtp_username",
        unset_or(&config.mail.smtp_username),
        Some("PORTICO_MAIL_SMTP_USERNAME"),
    );
    push("mail.smtp_password", "<redacted>", Some("PORTICO_MAIL_SMTP_PASSWORD"));
    push(
        "mail.api_base_url",
        config.mail.api_base_url.as_deref().unwrap_or("<unset>"),
        Some("PORTICO_MAIL_API_BASE_URL"),
    );
    push(
        "mail.api_key",
        if config.mail.api_key.is_some() { "<redacted>" } else { "<unset>" },
        Some("PORTICO_MAIL_API_KEY"),
    );
    push("mail.from_address", &config.mail.from_address, Some("PORTICO_MAIL_FROM_ADDRESS"));
    push("mail.admin_address", &config.mail.admin_address, Some("PORTICO_MAIL_ADMIN_ADDRESS"));

    push("server.bind_address", &config.server.bind_address, Some("PORTICO_SERVER_BIND_ADDRESS"));
    push("server.port", &config.server.port.to_string(), Some("PORTICO_SERVER_PORT"));

    push(
        "admin.password",
        if config.admin.password.is_some() { "<redacted>" } else { "<unset>" },
        Some("PORTICO_ADMIN_PASSWORD"),
    );
    push(
        "admin.session_ttl_secs",
        &config.admin.session_ttl_secs.to_string(),
        Some("PORTICO_ADMIN_SESSION_TTL_SECS"),
    );

    push("logging.level", &config.logging.level, Some("PORTICO_LOGGING_LEVEL"));
    push(
        "logging.format",
        &format!("{:?}", config.logging.format).to_lowercase(),
        Some("PORTICO_LOGGING_FORMAT"),
    );

    lines.join("\n")
}

fn unset_or(value: &str) -> &str {
    if value.is_empty() {
        "<unset>"
    } else {
        value
    }
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("portico.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/portico.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
