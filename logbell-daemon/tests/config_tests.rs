//! Configuration loading tests through the daemon entry points.
//!
//! Covers file formats, CLI overrides, environment overrides, and validation failures.

use std::io::Write;

use clap::Parser;
use serial_test::serial;

use logbell_daemon::app::{describe_config, load_config};
use logbell_daemon::cli::DaemonCli;

const VALID_YAML: &str = r#"
telegram:
  bot_token: "123:abc"
  chat_id: 42
log_file: /var/log/app.log
filters:
  - name: ERROR
    pattern: ERROR
"#;

fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn cli_for(path: &std::path::Path, extra: &[&str]) -> DaemonCli {
    let mut args = vec!["logbell", "--config", path.to_str().unwrap()];
    args.extend_from_slice(extra);
    DaemonCli::try_parse_from(args).unwrap()
}

#[tokio::test]
#[serial]
async fn test_load_yaml_config() {
    let file = write_config(".yaml", VALID_YAML);
    let config = load_config(&cli_for(file.path(), &[])).await.unwrap();

    assert_eq!(config.telegram.chat_id, "42");
    assert_eq!(config.filters.len(), 1);
    assert_eq!(config.monitoring.check_interval, 1.0);
}

#[tokio::test]
#[serial]
async fn test_load_toml_config() {
    let toml = r#"
log_file = "/var/log/app.log"

[telegram]
bot_token = "123:abc"
chat_id = "@alerts"

[[filters]]
name = "ERROR"
pattern = "ERROR"

[monitoring]
batch_size = 3
"#;
    let file = write_config(".toml", toml);
    let config = load_config(&cli_for(file.path(), &[])).await.unwrap();

    assert_eq!(config.telegram.chat_id, "@alerts");
    assert_eq!(config.monitoring.batch_size, 3);
}

#[tokio::test]
#[serial]
async fn test_missing_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yaml");
    let err = load_config(&cli_for(&path, &[])).await.unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[tokio::test]
#[serial]
async fn test_missing_token_fails_validation() {
    let file = write_config(".yaml", "log_file: /var/log/app.log\ntelegram:\n  chat_id: 1\n");
    let err = load_config(&cli_for(file.path(), &[])).await.unwrap_err();
    assert!(err.to_string().contains("telegram.bot_token"));
}

#[tokio::test]
#[serial]
async fn test_cli_overrides_log_settings() {
    let file = write_config(".yaml", VALID_YAML);
    let cli = cli_for(file.path(), &["--log-level", "debug", "--log-format", "json"]);
    let config = load_config(&cli).await.unwrap();

    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.general.log_format, "json");
}

#[tokio::test]
#[serial]
async fn test_invalid_cli_override_is_rejected() {
    let file = write_config(".yaml", VALID_YAML);
    let cli = cli_for(file.path(), &["--log-level", "loud"]);
    let err = load_config(&cli).await.unwrap_err();
    assert!(err.to_string().contains("general.log_level"));
}

#[tokio::test]
#[serial]
async fn test_cli_override_replaces_invalid_file_value() {
    let yaml = format!("{VALID_YAML}general:\n  log_level: loud\n  log_format: xml\n");
    let file = write_config(".yaml", &yaml);

    let err = load_config(&cli_for(file.path(), &[])).await.unwrap_err();
    assert!(err.to_string().contains("general.log_level"));

    let cli = cli_for(file.path(), &["--log-level", "debug", "--log-format", "pretty"]);
    let config = load_config(&cli).await.unwrap();
    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.general.log_format, "pretty");
}

#[tokio::test]
#[serial]
async fn test_cli_override_replaces_invalid_env_value() {
    let file = write_config(".yaml", VALID_YAML);

    // SAFETY: serial_test로 환경변수 접근이 직렬화됨
    unsafe { std::env::set_var("LOGBELL_GENERAL_LOG_LEVEL", "loud") };
    let rejected = load_config(&cli_for(file.path(), &[])).await;
    let accepted = load_config(&cli_for(file.path(), &["--log-level", "warn"])).await;
    unsafe { std::env::remove_var("LOGBELL_GENERAL_LOG_LEVEL") };

    assert!(rejected.is_err());
    assert_eq!(accepted.unwrap().general.log_level, "warn");
}

#[tokio::test]
#[serial]
async fn test_fractional_and_long_intervals_pass_startup_checks() {
    let yaml = format!("{VALID_YAML}monitoring:\n  check_interval: 0.5\n  batch_timeout: 7200\n");
    let file = write_config(".yaml", &yaml);
    let config = load_config(&cli_for(file.path(), &[])).await.unwrap();

    assert_eq!(config.monitoring.check_interval, 0.5);
    assert_eq!(config.monitoring.batch_timeout, 7200.0);

    let monitor_config = logbell_monitor::MonitorConfig::from_core(&config);
    monitor_config.validate().unwrap();
    assert_eq!(
        monitor_config.check_interval(),
        std::time::Duration::from_millis(500)
    );
    assert!(describe_config(&config).contains("check_interval: 0.5s"));
}

#[tokio::test]
#[serial]
async fn test_env_override_supplies_token() {
    let file = write_config(
        ".yaml",
        "log_file: /var/log/app.log\ntelegram:\n  chat_id: 1\n",
    );

    // SAFETY: serial_test로 환경변수 접근이 직렬화됨
    unsafe { std::env::set_var("LOGBELL_TELEGRAM_BOT_TOKEN", "999:env") };
    let result = load_config(&cli_for(file.path(), &[])).await;
    unsafe { std::env::remove_var("LOGBELL_TELEGRAM_BOT_TOKEN") };

    let config = result.unwrap();
    assert_eq!(config.telegram.bot_token, "999:env");
}

#[tokio::test]
#[serial]
async fn test_describe_config_report() {
    let file = write_config(".yaml", VALID_YAML);
    let config = load_config(&cli_for(file.path(), &[])).await.unwrap();

    let report = describe_config(&config);
    assert!(report.starts_with("configuration OK"));
    assert!(report.contains("filters: 1 active, 0 skipped"));
}
