// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::constants::{
    AUDIT_FILE_RELATIVE_PATH, DEFAULT_AUDIT_USER, DEFAULT_SYSLOG_HANDLER_NAME, DEFAULT_SYSLOG_HOST,
    DEFAULT_SYSLOG_PORT, DEFAULT_SYSLOG_QUEUE_CAPACITY, DEFAULT_TIMEOUT_FACTOR,
    PLATFORM_DEFAULT_USER, SERVER_HOME_ENV,
};
use crate::error::{HarnessError, HarnessResult};
use crate::timeout::TimeoutFactor;

/// Harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub syslog: SyslogConfig,
    /// Multiplier applied to all bounded waits (default: 1)
    #[serde(default = "default_timeout_factor")]
    pub timeout_factor: u32,
}

/// Server install location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server install root; the audit file lives below it
    pub home: PathBuf,
}

/// Identity recorded on audit records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// User written to the local authentication node during setup (default: IAmAdmin)
    #[serde(default = "default_audit_user")]
    pub default_user: String,

    /// User restored on teardown (default: $local)
    #[serde(default = "default_restore_user")]
    pub restore_user: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            default_user: default_audit_user(),
            restore_user: default_restore_user(),
        }
    }
}

/// Syslog listener and server-side handler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyslogConfig {
    /// Listener host, also the destination configured on the server handler
    #[serde(default = "default_syslog_host")]
    pub host: String,

    /// Listener UDP port; 0 picks an ephemeral port
    #[serde(default = "default_syslog_port")]
    pub port: u16,

    /// Capacity of the received-event queue (must be >= 1)
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Name of the syslog handler installed on the server
    #[serde(default = "default_handler_name")]
    pub handler_name: String,
}

impl Default for SyslogConfig {
    fn default() -> Self {
        Self {
            host: default_syslog_host(),
            port: default_syslog_port(),
            queue_capacity: default_queue_capacity(),
            handler_name: default_handler_name(),
        }
    }
}

fn default_timeout_factor() -> u32 {
    DEFAULT_TIMEOUT_FACTOR
}

fn default_audit_user() -> String {
    DEFAULT_AUDIT_USER.to_string()
}

fn default_restore_user() -> String {
    PLATFORM_DEFAULT_USER.to_string()
}

fn default_syslog_host() -> String {
    DEFAULT_SYSLOG_HOST.to_string()
}

fn default_syslog_port() -> u16 {
    DEFAULT_SYSLOG_PORT
}

fn default_queue_capacity() -> usize {
    DEFAULT_SYSLOG_QUEUE_CAPACITY
}

fn default_handler_name() -> String {
    DEFAULT_SYSLOG_HANDLER_NAME.to_string()
}

impl HarnessConfig {
    /// Configuration with defaults for everything but the server home
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self {
            server: ServerConfig { home: home.into() },
            audit: AuditConfig::default(),
            syslog: SyslogConfig::default(),
            timeout_factor: DEFAULT_TIMEOUT_FACTOR,
        }
    }

    /// Parse YAML, replacing `${VAR_NAME}` with environment variable values
    pub fn from_yaml_with_env(yaml: &str) -> HarnessResult<Self> {
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| HarnessError::Config(e.to_string()))?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                HarnessError::Config(format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                ))
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        serde_yaml::from_str(&substituted).map_err(|e| HarnessError::Config(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> HarnessResult<Self> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| HarnessError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml_with_env(&yaml)
    }

    /// Defaults plus the server home from `JBOSS_HOME` and the timeout factor
    /// from `TS_TIMEOUT_FACTOR`
    pub fn from_env() -> HarnessResult<Self> {
        let home = std::env::var(SERVER_HOME_ENV).map_err(|_| {
            HarnessError::Config(format!(
                "Environment variable '{}' is not set",
                SERVER_HOME_ENV
            ))
        })?;
        let mut config = Self::new(home);
        config.timeout_factor = TimeoutFactor::from_env()?.get();
        Ok(config)
    }

    pub fn validate(&self) -> HarnessResult<()> {
        if self.server.home.as_os_str().is_empty() {
            return Err(HarnessError::Config(
                "server.home cannot be empty".to_string(),
            ));
        }
        if self.audit.default_user.trim().is_empty() {
            return Err(HarnessError::Config(
                "audit.default_user cannot be empty".to_string(),
            ));
        }
        if self.syslog.queue_capacity == 0 {
            return Err(HarnessError::Config(
                "syslog.queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.syslog.handler_name.trim().is_empty() {
            return Err(HarnessError::Config(
                "syslog.handler_name cannot be empty".to_string(),
            ));
        }
        self.syslog_bind_addr()?;
        TimeoutFactor::new(self.timeout_factor)?;
        Ok(())
    }

    /// `<home>/standalone/data/audit-log.log`
    pub fn audit_file_path(&self) -> PathBuf {
        AUDIT_FILE_RELATIVE_PATH
            .iter()
            .fold(self.server.home.clone(), |path, part| path.join(part))
    }

    /// Socket address the syslog listener binds to
    pub fn syslog_bind_addr(&self) -> HarnessResult<SocketAddr> {
        format!("{}:{}", self.syslog.host, self.syslog.port)
            .parse()
            .map_err(|e| {
                HarnessError::Config(format!(
                    "Invalid syslog address '{}:{}': {}",
                    self.syslog.host, self.syslog.port, e
                ))
            })
    }

    pub fn timeout(&self) -> HarnessResult<TimeoutFactor> {
        TimeoutFactor::new(self.timeout_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = HarnessConfig::from_yaml_with_env("server:\n  home: /opt/server\n").unwrap();

        assert_eq!(config.audit.default_user, "IAmAdmin");
        assert_eq!(config.audit.restore_user, "$local");
        assert_eq!(config.syslog.port, 9176);
        assert_eq!(config.syslog.queue_capacity, 64);
        assert_eq!(config.timeout_factor, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_audit_file_path_is_below_home() {
        let config = HarnessConfig::new("/opt/server");
        assert_eq!(
            config.audit_file_path(),
            PathBuf::from("/opt/server/standalone/data/audit-log.log")
        );
    }

    #[test]
    fn test_env_var_substitution_in_home() {
        std::env::set_var("AUDITLOG_HARNESS_TEST_HOME", "/srv/app");
        let config =
            HarnessConfig::from_yaml_with_env("server:\n  home: ${AUDITLOG_HARNESS_TEST_HOME}\n")
                .unwrap();
        assert_eq!(config.server.home, PathBuf::from("/srv/app"));
    }

    #[test]
    fn test_missing_env_var_is_rejected() {
        let result =
            HarnessConfig::from_yaml_with_env("server:\n  home: ${AUDITLOG_HARNESS_UNSET_VAR}\n");
        assert!(matches!(result, Err(HarnessError::Config(msg)) if msg.contains("AUDITLOG_HARNESS_UNSET_VAR")));
    }

    #[test]
    fn test_dollar_local_is_not_treated_as_env_var() {
        let yaml = "server:\n  home: /opt\naudit:\n  restore_user: $local\n";
        let config = HarnessConfig::from_yaml_with_env(yaml).unwrap();
        assert_eq!(config.audit.restore_user, "$local");
    }

    #[test]
    fn test_validation_rejects_zero_capacity_and_factor() {
        let mut config = HarnessConfig::new("/opt");
        config.syslog.queue_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = HarnessConfig::new("/opt");
        config.timeout_factor = 0;
        assert!(config.validate().is_err());

        let mut config = HarnessConfig::new("/opt");
        config.syslog.host = "not a host".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_can_be_loaded_from_file_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "server:\n  home: /opt/server\nsyslog:\n  port: 0\n  handler_name: udp-sink\ntimeout_factor: 2"
        )
        .unwrap();

        let config = HarnessConfig::from_file(file.path()).unwrap();
        assert_eq!(config.syslog.port, 0);
        assert_eq!(config.syslog.handler_name, "udp-sink");
        assert_eq!(config.timeout().unwrap().get(), 2);
    }
}
