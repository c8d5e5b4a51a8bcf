//! Configuration loading from the process environment

use serial_test::serial;
use swodlr_ingest::config::{
    EnvParameters, IngestSettings, ParameterSource, ServerConfig, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};

const VARS: &[(&str, &str)] = &[
    ("SWODLR_ingest_table_name", "swodlr-ingest"),
    ("SWODLR_available_tiles_table_name", "swodlr-tiles"),
    ("SWODLR_sds_host", "https://sds.example.com"),
    ("SWODLR_sds_username", "swodlr"),
    ("SWODLR_sds_pcm_release_tag", "2.1.0"),
];

fn set_vars() {
    for (k, v) in VARS {
        std::env::set_var(k, v);
    }
}

fn clear_vars() {
    for (k, _) in VARS {
        std::env::remove_var(k);
    }
    std::env::remove_var("SWODLR_sds_ingest_queue");
    std::env::remove_var("SWODLR_HOST");
    std::env::remove_var("SWODLR_PORT");
    std::env::remove_var("SWODLR_SHUTDOWN_TIMEOUT");
}

#[test]
#[serial]
fn test_env_parameters_use_prefix() {
    set_vars();
    std::env::set_var("SWODLR_sds_ingest_queue", "");

    let params = EnvParameters::with_prefix("SWODLR_");
    assert_eq!(params.get("sds_host").as_deref(), Some("https://sds.example.com"));
    assert_eq!(params.get("sds_ingest_queue"), None);
    assert_eq!(params.get("nonexistent"), None);

    clear_vars();
}

#[test]
#[serial]
fn test_settings_from_environment() {
    set_vars();

    let settings = IngestSettings::load(&EnvParameters::with_prefix("SWODLR_")).unwrap();
    assert_eq!(settings.available_tiles_table_name, "swodlr-tiles");
    assert_eq!(settings.sds.release_tag, "2.1.0");
    assert!(settings.sds.password.is_none());

    clear_vars();
}

#[test]
#[serial]
fn test_settings_missing_table() {
    set_vars();
    std::env::remove_var("SWODLR_ingest_table_name");

    let err = IngestSettings::load(&EnvParameters::with_prefix("SWODLR_")).unwrap_err();
    assert!(err.to_string().contains("ingest_table_name"));

    clear_vars();
}

#[test]
#[serial]
fn test_server_config_defaults() {
    clear_vars();

    let config = ServerConfig::load().unwrap();
    assert_eq!(config.host, DEFAULT_SERVER_HOST);
    assert_eq!(config.port, DEFAULT_SERVER_PORT);
    assert_eq!(config.shutdown_timeout_secs, DEFAULT_SHUTDOWN_TIMEOUT_SECS);
}

#[test]
#[serial]
fn test_server_config_overrides() {
    std::env::set_var("SWODLR_HOST", "0.0.0.0");
    std::env::set_var("SWODLR_PORT", "9100");

    let config = ServerConfig::load().unwrap();
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 9100);

    clear_vars();
}

#[test]
#[serial]
fn test_server_config_rejects_port_zero() {
    std::env::set_var("SWODLR_PORT", "0");
    assert!(ServerConfig::load().is_err());
    clear_vars();
}
