// Configuration module unit tests

use auditlog_harness::config::*;
use auditlog_harness::error::HarnessError;
use auditlog_harness::timeout::TimeoutFactor;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_can_deserialize_full_yaml_config() {
    let yaml = r#"
server:
  home: "/opt/wildfly"
audit:
  default_user: "operator"
  restore_user: "$local"
syslog:
  host: "127.0.0.1"
  port: 10514
  queue_capacity: 8
  handler_name: "udp-audit"
timeout_factor: 3
"#;
    let config = HarnessConfig::from_yaml_with_env(yaml).expect("Failed to parse YAML");

    assert_eq!(config.server.home, PathBuf::from("/opt/wildfly"));
    assert_eq!(config.audit.default_user, "operator");
    assert_eq!(config.syslog.port, 10514);
    assert_eq!(config.syslog.queue_capacity, 8);
    assert_eq!(config.syslog.handler_name, "udp-audit");
    assert_eq!(config.timeout().unwrap().syslog_wait(), Duration::from_secs(15));
    assert!(config.validate().is_ok());
}

#[test]
fn test_missing_server_section_is_rejected() {
    let result = HarnessConfig::from_yaml_with_env("timeout_factor: 1\n");
    assert!(matches!(result, Err(HarnessError::Config(_))));
}

#[test]
fn test_empty_user_is_rejected() {
    let mut config = HarnessConfig::new("/opt/wildfly");
    config.audit.default_user = "  ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_bind_address_combines_host_and_port() {
    let mut config = HarnessConfig::new("/opt/wildfly");
    config.syslog.port = 0;
    assert_eq!(
        config.syslog_bind_addr().unwrap(),
        "127.0.0.1:0".parse().unwrap()
    );
}

#[test]
fn test_timeout_factor_parsing() {
    assert_eq!(TimeoutFactor::parse(" 4 ").unwrap().get(), 4);
    assert!(TimeoutFactor::parse("0").is_err());
    assert!(TimeoutFactor::parse("-1").is_err());
    assert!(TimeoutFactor::parse("fast").is_err());
}

#[test]
fn test_adjusted_second_scales_with_factor() {
    let factor = TimeoutFactor::new(2).unwrap();
    assert_eq!(factor.adjusted_second(), Duration::from_millis(2000));
    assert_eq!(factor.syslog_wait(), Duration::from_secs(10));
    assert_eq!(TimeoutFactor::default().syslog_wait(), Duration::from_secs(5));
}
