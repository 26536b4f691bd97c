use std::env;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use tempfile::TempDir;
use wms_cli::commands::{config, doctor, migrate};

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("WMS_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_bad_port() {
    with_env(&[("WMS_SERVER_PORT", "notaport")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn migrate_returns_connectivity_failure_for_missing_directory() {
    with_env(
        &[("WMS_DATABASE_URL", "sqlite:///definitely/not/here/wms.db"), ("WMS_DATABASE_TIMEOUT_SECS", "1")],
        || {
            let result = migrate::run();
            assert_eq!(result.exit_code, 4, "expected db connectivity failure code");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["error_class"], "db_connectivity");
        },
    );
}

#[test]
fn doctor_passes_after_migrating_a_file_database() {
    let dir = TempDir::new().expect("temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("wms.db").display());

    with_env(&[("WMS_DATABASE_URL", &url)], || {
        assert_eq!(migrate::run().exit_code, 0, "migrate should prepare the schema");

        let (output, healthy) = doctor::run(true);
        assert!(healthy, "doctor should pass: {output}");

        let payload = parse_payload(&output);
        assert_eq!(payload["overall_status"], "pass");
        let checks = payload["checks"].as_array().expect("checks array");
        assert_eq!(check_status(checks, "config_validation"), "pass");
        assert_eq!(check_status(checks, "database_connectivity"), "pass");
        assert_eq!(check_status(checks, "confirmation_schema"), "pass");
        assert_eq!(check_status(checks, "quick_pick_endpoint"), "skipped");
    });
}

#[test]
fn doctor_reports_unmigrated_schema() {
    let dir = TempDir::new().expect("temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("empty.db").display());

    with_env(&[("WMS_DATABASE_URL", &url)], || {
        let (output, healthy) = doctor::run(true);
        assert!(!healthy);

        let payload = parse_payload(&output);
        let checks = payload["checks"].as_array().expect("checks array");
        assert_eq!(check_status(checks, "database_connectivity"), "pass");
        assert_eq!(check_status(checks, "confirmation_schema"), "fail");
    });
}

#[test]
fn doctor_skips_dependent_checks_when_config_is_invalid() {
    with_env(&[("WMS_PROCEDURES_QUICK_PICK_URL", "ftp://erp.local/quick-pick")], || {
        let (output, healthy) = doctor::run(false);
        assert!(!healthy);
        assert!(output.contains("- [fail] config_validation:"));
        assert!(output.contains("- [skip] database_connectivity:"));
        assert!(output.contains("- [skip] quick_pick_endpoint:"));
    });
}

#[test]
fn config_attributes_sources_and_redacts_token() {
    with_env(
        &[
            ("WMS_DATABASE_URL", "sqlite::memory:"),
            ("WMS_PROCEDURES_QUICK_PICK_URL", "https://erp.local/quick-pick"),
            ("WMS_PROCEDURES_QUICK_PICK_TOKEN", "qp-live-0123456789"),
        ],
        || {
            let output = config::run();
            assert!(output.contains("- database.url = sqlite::memory: (source: env (WMS_DATABASE_URL))"));
            assert!(output.contains("- procedures.quick_pick_token = qp-l***"));
            assert!(!output.contains("0123456789"));
            assert!(output.contains("- ingestion.serialize_batches = true (source: default)"));
        },
    );
}

fn check_status<'a>(checks: &'a [Value], name: &str) -> &'a str {
    checks
        .iter()
        .find(|check| check["name"] == name)
        .and_then(|check| check["status"].as_str())
        .unwrap_or("missing")
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid json")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "WMS_DATABASE_URL",
        "WMS_DATABASE_MAX_CONNECTIONS",
        "WMS_DATABASE_TIMEOUT_SECS",
        "WMS_SERVER_BIND_ADDRESS",
        "WMS_SERVER_PORT",
        "WMS_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "WMS_PROCEDURES_LOCATION_SQL",
        "WMS_PROCEDURES_QUICK_PICK_URL",
        "WMS_PROCEDURES_QUICK_PICK_TOKEN",
        "WMS_PROCEDURES_TIMEOUT_SECS",
        "WMS_INGESTION_SERIALIZE_BATCHES",
        "WMS_INGESTION_LEGACY_ERROR_FORMAT",
        "WMS_INGESTION_RMA_JOIN_ATTRIBUTE",
        "WMS_LOGGING_LEVEL",
        "WMS_LOGGING_FORMAT",
        "WMS_LOG_LEVEL",
        "WMS_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
