use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use toml::Value;
use wms_core::config::{AppConfig, LoadOptions};

/// One rendered setting: dotted key, display value, overriding env var.
struct Setting {
    key: &'static str,
    value: String,
    env_key: &'static str,
}

impl Setting {
    fn new(key: &'static str, value: impl Into<String>, env_key: &'static str) -> Self {
        Self { key, value: value.into(), env_key }
    }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for setting in settings(&config) {
        let source = field_source(
            setting.key,
            setting.env_key,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(format!("- {} = {} (source: {source})", setting.key, setting.value));
    }
    lines.join("\n")
}

fn settings(config: &AppConfig) -> Vec<Setting> {
    let quick_pick_token = config
        .procedures
        .quick_pick_token
        .as_ref()
        .map(|token| redact_token(token.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    vec![
        Setting::new("database.url", config.database.url.clone(), "WMS_DATABASE_URL"),
        Setting::new(
            "database.max_connections",
            config.database.max_connections.to_string(),
            "WMS_DATABASE_MAX_CONNECTIONS",
        ),
        Setting::new(
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            "WMS_DATABASE_TIMEOUT_SECS",
        ),
        Setting::new(
            "server.bind_address",
            config.server.bind_address.clone(),
            "WMS_SERVER_BIND_ADDRESS",
        ),
        Setting::new("server.port", config.server.port.to_string(), "WMS_SERVER_PORT"),
        Setting::new(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            "WMS_SERVER_GRACEFUL_SHUTDOWN_SECS",
        ),
        Setting::new(
            "procedures.location_sql",
            single_line(&config.procedures.location_sql),
            "WMS_PROCEDURES_LOCATION_SQL",
        ),
        Setting::new(
            "procedures.quick_pick_url",
            config.procedures.quick_pick_url.as_deref().unwrap_or("<unset>"),
            "WMS_PROCEDURES_QUICK_PICK_URL",
        ),
        Setting::new("procedures.quick_pick_token", quick_pick_token, "WMS_PROCEDURES_QUICK_PICK_TOKEN"),
        Setting::new(
            "procedures.timeout_secs",
            config.procedures.timeout_secs.to_string(),
            "WMS_PROCEDURES_TIMEOUT_SECS",
        ),
        Setting::new(
            "ingestion.serialize_batches",
            config.ingestion.serialize_batches.to_string(),
            "WMS_INGESTION_SERIALIZE_BATCHES",
        ),
        Setting::new(
            "ingestion.legacy_error_format",
            config.ingestion.legacy_error_format.to_string(),
            "WMS_INGESTION_LEGACY_ERROR_FORMAT",
        ),
        Setting::new(
            "ingestion.rma_join_attribute",
            config
                .ingestion
                .rma_join_attribute
                .map(|slot| format!("attribute{slot}"))
                .unwrap_or_else(|| "<unset>".to_string()),
            "WMS_INGESTION_RMA_JOIN_ATTRIBUTE",
        ),
        Setting::new("logging.level", config.logging.level.clone(), "WMS_LOGGING_LEVEL"),
        Setting::new(
            "logging.format",
            format!("{:?}", config.logging.format),
            "WMS_LOGGING_FORMAT",
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("wms.toml"), PathBuf::from("config/wms.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if config_file_doc.is_some_and(|doc| contains_path(doc, key_path)) {
        let file_path = config_file_path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "config file".to_string());
        return format!("file ({file_path})");
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

fn single_line(statement: &str) -> String {
    statement.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keeps at most the first four characters of a secret.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }
    if trimmed.chars().count() <= 8 {
        return "<redacted>".to_string();
    }

    let prefix: String = trimmed.chars().take(4).collect();
    format!("{prefix}***")
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::{contains_path, redact_token, single_line};

    #[test]
    fn short_tokens_are_fully_hidden() {
        assert_eq!(redact_token("abc"), "<redacted>");
        assert_eq!(redact_token("   "), "<empty>");
        assert_eq!(redact_token("qp-live-0123456789"), "qp-l***");
    }

    #[test]
    fn dotted_paths_are_resolved_against_the_file() {
        let doc: Value = "[ingestion]\nserialize_batches = false\n".parse().expect("toml");
        assert!(contains_path(&doc, "ingestion.serialize_batches"));
        assert!(!contains_path(&doc, "ingestion.legacy_error_format"));
    }

    #[test]
    fn statements_render_on_one_line() {
        assert_eq!(single_line("SELECT 1\n   FROM x"), "SELECT 1 FROM x");
    }
}
