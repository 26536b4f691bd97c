use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ingest::{DecodeMode, IngestionSettings};

/// Default statement behind the location check. Answers `200` when the
/// `(subinventory, locator)` pair is registered and enabled, `400` otherwise.
pub const DEFAULT_LOCATION_SQL: &str = "SELECT CASE WHEN EXISTS (\
     SELECT 1 FROM wms_locator WHERE subinventory_code = ?1 AND locator_code = ?2 AND enabled = 1\
     ) THEN '{STATUS=200}' ELSE '{STATUS=400}' END AS result";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub procedures: ProcedureConfig,
    pub ingestion: IngestionConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ProcedureConfig {
    pub location_sql: String,
    pub quick_pick_url: Option<String>,
    pub quick_pick_token: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct IngestionConfig {
    pub serialize_batches: bool,
    pub legacy_error_format: bool,
    pub rma_join_attribute: Option<u8>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
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
    pub server_port: Option<u16>,
    pub quick_pick_url: Option<String>,
    pub serialize_batches: Option<bool>,
    pub legacy_error_format: Option<bool>,
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
                url: "sqlite://wms.db?mode=rwc".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            procedures: ProcedureConfig {
                location_sql: DEFAULT_LOCATION_SQL.to_string(),
                quick_pick_url: None,
                quick_pick_token: None,
                timeout_secs: 30,
            },
            ingestion: IngestionConfig {
                serialize_batches: true,
                legacy_error_format: true,
                rma_join_attribute: None,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
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

impl IngestionConfig {
    pub fn settings(&self) -> IngestionSettings {
        IngestionSettings {
            serialize_batches: self.serialize_batches,
            decode_mode: if self.legacy_error_format {
                DecodeMode::Legacy
            } else {
                DecodeMode::Structured
            },
            rma_join_attribute: self.rma_join_attribute,
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
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("wms.toml"));
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

        if let Some(procedures) = patch.procedures {
            if let Some(location_sql) = procedures.location_sql {
                self.procedures.location_sql = location_sql;
            }
            if let Some(quick_pick_url) = procedures.quick_pick_url {
                self.procedures.quick_pick_url = Some(quick_pick_url);
            }
            if let Some(token) = procedures.quick_pick_token {
                self.procedures.quick_pick_token = Some(SecretString::from(token));
            }
            if let Some(timeout_secs) = procedures.timeout_secs {
                self.procedures.timeout_secs = timeout_secs;
            }
        }

        if let Some(ingestion) = patch.ingestion {
            if let Some(serialize_batches) = ingestion.serialize_batches {
                self.ingestion.serialize_batches = serialize_batches;
            }
            if let Some(legacy_error_format) = ingestion.legacy_error_format {
                self.ingestion.legacy_error_format = legacy_error_format;
            }
            if let Some(slot) = ingestion.rma_join_attribute {
                self.ingestion.rma_join_attribute = Some(slot);
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
        if let Some(value) = read_env("WMS_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("WMS_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("WMS_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("WMS_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("WMS_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("WMS_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("WMS_SERVER_PORT") {
            self.server.port = parse_u16("WMS_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("WMS_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("WMS_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("WMS_PROCEDURES_LOCATION_SQL") {
            self.procedures.location_sql = value;
        }
        if let Some(value) = read_env("WMS_PROCEDURES_QUICK_PICK_URL") {
            self.procedures.quick_pick_url = Some(value);
        }
        if let Some(value) = read_env("WMS_PROCEDURES_QUICK_PICK_TOKEN") {
            self.procedures.quick_pick_token = Some(SecretString::from(value));
        }
        if let Some(value) = read_env("WMS_PROCEDURES_TIMEOUT_SECS") {
            self.procedures.timeout_secs = parse_u64("WMS_PROCEDURES_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("WMS_INGESTION_SERIALIZE_BATCHES") {
            self.ingestion.serialize_batches =
                parse_bool("WMS_INGESTION_SERIALIZE_BATCHES", &value)?;
        }
        if let Some(value) = read_env("WMS_INGESTION_LEGACY_ERROR_FORMAT") {
            self.ingestion.legacy_error_format =
                parse_bool("WMS_INGESTION_LEGACY_ERROR_FORMAT", &value)?;
        }
        if let Some(value) = read_env("WMS_INGESTION_RMA_JOIN_ATTRIBUTE") {
            self.ingestion.rma_join_attribute =
                Some(parse_u8("WMS_INGESTION_RMA_JOIN_ATTRIBUTE", &value)?);
        }

        let log_level = read_env("WMS_LOGGING_LEVEL").or_else(|| read_env("WMS_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("WMS_LOGGING_FORMAT").or_else(|| read_env("WMS_LOG_FORMAT"));
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
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(quick_pick_url) = overrides.quick_pick_url {
            self.procedures.quick_pick_url = Some(quick_pick_url);
        }
        if let Some(serialize_batches) = overrides.serialize_batches {
            self.ingestion.serialize_batches = serialize_batches;
        }
        if let Some(legacy_error_format) = overrides.legacy_error_format {
            self.ingestion.legacy_error_format = legacy_error_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_procedures(&self.procedures)?;
        validate_ingestion(&self.ingestion)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("wms.toml"), PathBuf::from("config/wms.toml")]
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

fn validate_procedures(procedures: &ProcedureConfig) -> Result<(), ConfigError> {
    if procedures.location_sql.trim().is_empty() {
        return Err(ConfigError::Validation(
            "procedures.location_sql must not be empty".to_string(),
        ));
    }

    if procedures.timeout_secs == 0 || procedures.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "procedures.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if let Some(url) = &procedures.quick_pick_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "procedures.quick_pick_url must start with http:// or https://".to_string(),
            ));
        }
    }

    if let Some(token) = &procedures.quick_pick_token {
        if token.expose_secret().trim().is_empty() {
            return Err(ConfigError::Validation(
                "procedures.quick_pick_token must not be blank when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_ingestion(ingestion: &IngestionConfig) -> Result<(), ConfigError> {
    match ingestion.rma_join_attribute {
        Some(slot) if !(1..=15).contains(&slot) => Err(ConfigError::Validation(format!(
            "ingestion.rma_join_attribute must name an attribute slot in 1..=15, got {slot}"
        ))),
        _ => Ok(()),
    }
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

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_u8(key: &str, value: &str) -> Result<u8, ConfigError> {
    value.trim().parse::<u8>().map_err(|_| invalid_override(key, value))
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse::<u16>().map_err(|_| invalid_override(key, value))
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| invalid_override(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| invalid_override(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| invalid_override(key, value))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    procedures: Option<ProcedurePatch>,
    ingestion: Option<IngestionPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ProcedurePatch {
    location_sql: Option<String>,
    quick_pick_url: Option<String>,
    quick_pick_token: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct IngestionPatch {
    serialize_batches: Option<bool>,
    legacy_error_format: Option<bool>,
    rma_join_attribute: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::ingest::DecodeMode;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_serialize_batches_and_keep_legacy_errors() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;
        let settings = config.ingestion.settings();

        ensure(settings.serialize_batches, "batches should be serialised by default")?;
        ensure(settings.decode_mode == DecodeMode::Legacy, "legacy decoding should be default")?;
        ensure(settings.rma_join_attribute.is_none(), "no rma join slot by default")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_QUICK_PICK_TOKEN", "qp-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("wms.toml");
            fs::write(
                &path,
                r#"
[procedures]
quick_pick_url = "http://erp.local/quick-pick"
quick_pick_token = "${TEST_QUICK_PICK_TOKEN}"

[ingestion]
rma_join_attribute = 11
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config
                    .procedures
                    .quick_pick_token
                    .as_ref()
                    .is_some_and(|token| token.expose_secret() == "qp-from-env"),
                "quick pick token should be interpolated from environment",
            )?;
            ensure(config.ingestion.rma_join_attribute == Some(11), "join slot should load")?;
            Ok(())
        })();

        clear_vars(&["TEST_QUICK_PICK_TOKEN"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("WMS_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("WMS_INGESTION_LEGACY_ERROR_FORMAT", "false");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("wms.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[server]
port = 9090

[ingestion]
serialize_batches = false
legacy_error_format = true

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.server.port == 9090, "file port should win over default")?;
            ensure(!config.ingestion.serialize_batches, "file flag should win over default")?;
            ensure(
                !config.ingestion.legacy_error_format,
                "env flag should win over file and defaults",
            )?;
            Ok(())
        })();

        clear_vars(&["WMS_DATABASE_URL", "WMS_INGESTION_LEGACY_ERROR_FORMAT"]);
        result
    }

    #[test]
    fn invalid_env_override_is_reported_with_key() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("WMS_INGESTION_SERIALIZE_BATCHES", "sometimes");

        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected invalid override to fail".to_string()),
            Err(ConfigError::InvalidEnvOverride { key, .. }) => ensure(
                key == "WMS_INGESTION_SERIALIZE_BATCHES",
                "error should name the offending variable",
            ),
            Err(other) => Err(format!("unexpected error: {other}")),
        };

        clear_vars(&["WMS_INGESTION_SERIALIZE_BATCHES"]);
        result
    }

    #[test]
    fn validation_rejects_out_of_range_join_slot() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("WMS_INGESTION_RMA_JOIN_ATTRIBUTE", "16");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("rma_join_attribute")
            );
            ensure(has_message, "validation failure should mention rma_join_attribute")
        })();

        clear_vars(&["WMS_INGESTION_RMA_JOIN_ATTRIBUTE"]);
        result
    }

    #[test]
    fn quick_pick_token_is_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("WMS_PROCEDURES_QUICK_PICK_TOKEN", "qp-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("qp-secret-value"), "debug output should not contain token")
        })();

        clear_vars(&["WMS_PROCEDURES_QUICK_PICK_TOKEN"]);
        result
    }
}
