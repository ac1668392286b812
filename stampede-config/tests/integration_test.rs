//! Integration tests for stampede-config

use stampede_config::*;
use std::io::Write;
use std::time::Duration;
use temp_env::with_vars;

#[test]
fn test_default_config_validation() {
    let config = StampedeConfig::default();
    assert!(config.validate_all().is_ok());
}

#[test]
fn test_config_loader_from_env() {
    let vars = vec![
        ("STAMPEDE_HTTP_TIMEOUT", Some("60")),
        ("STAMPEDE_LOG_LEVEL", Some("debug")),
        ("STAMPEDE_LOG_FORMAT", Some("json")),
        ("STAMPEDE_MAX_POOL_SIZE", Some("512")),
        ("STAMPEDE_HOSTS", Some("load-1:8080, load-2:8080,")),
        ("STAMPEDE_MAX_THREADS", Some("32")),
        ("STAMPEDE_THREAD_INCREMENT", Some("4")),
        ("STAMPEDE_THRESHOLD_MS", Some("250")),
    ];

    with_vars(vars, || {
        let config = ConfigLoader::new().from_env().unwrap();

        assert_eq!(config.http.timeout, Duration::from_secs(60));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.execution.max_pool_size, 512);
        assert_eq!(config.saturation.hosts, vec!["load-1:8080", "load-2:8080"]);
        assert_eq!(config.saturation.max_threads, 32);
        assert_eq!(config.saturation.thread_increment, 4);
        assert_eq!(config.saturation.max_runtime_threshold, Duration::from_millis(250));
    });
}

#[test]
fn test_invalid_env_value_is_reported() {
    with_vars(vec![("STAMPEDE_MAX_THREADS", Some("lots"))], || {
        let err = ConfigLoader::new().from_env().unwrap_err();
        assert!(matches!(err, ConfigError::EnvError(ref message) if message.contains("MAX_THREADS")));
    });
}

#[test]
fn test_custom_prefix() {
    with_vars(vec![("LOADTEST_THREAD_INCREMENT", Some("2"))], || {
        let config = ConfigLoader::with_prefix("LOADTEST").from_env().unwrap();
        assert_eq!(config.saturation.thread_increment, 2);
    });
}

#[test]
fn test_yaml_config_serialization() {
    let yaml = StampedeConfig::generate_sample();
    let parsed: StampedeConfig = serde_yaml::from_str(&yaml).unwrap();
    assert!(parsed.validate_all().is_ok());
    assert_eq!(parsed.saturation.max_threads, 64);
}

#[test]
fn test_comprehensive_config_file() {
    let yaml = r#"
execution:
  default_workers: 4
  max_pool_size: 64
  default_recurrences: 20

saturation:
  hosts:
    - "http://load-1.internal:8080"
    - "load-2.internal:8080"
  max_threads: 40
  thread_increment: 10
  recurrences: 5
  recurrence_type: times
  max_runtime_threshold_ms: 800
  safety_margin_ms: 2000
  poll_retry:
    max_attempts: 3
    initial_delay_ms: 500

http:
  timeout: 15
  user_agent: "Stampede Test"

logging:
  level: warn
  format: compact
"#;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    with_vars(vec![("STAMPEDE_HOSTS", None::<&str>)], || {
        let config = ConfigLoader::new().from_file(file.path()).unwrap();

        assert_eq!(config.execution.default_workers, 4);
        assert_eq!(config.saturation.hosts.len(), 2);
        assert_eq!(config.saturation.thread_increment, 10);
        assert_eq!(config.saturation.max_runtime_threshold, Duration::from_millis(800));
        assert_eq!(config.saturation.per_recurrence_estimate, Duration::from_millis(500));
        assert_eq!(config.saturation.poll_retry.as_ref().unwrap().max_attempts, 3);
        assert_eq!(config.http.timeout, Duration::from_secs(15));
        assert_eq!(config.logging.format, LogFormat::Compact);
    });
}

#[test]
fn test_invalid_domain_is_rejected() {
    let yaml = "saturation:\n  recurrence_type: weeks\n";
    with_vars(vec![("STAMPEDE_MAX_THREADS", None::<&str>)], || {
        let err = ConfigLoader::new().from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::DomainError { ref domain, .. } if domain == "saturation"));
    });
}

#[test]
fn test_missing_file() {
    let result = ConfigLoader::new().from_file("/nonexistent/stampede.yaml");
    assert!(matches!(result, Err(ConfigError::FileReadError(_))));
}
