// Constants module - centralized default values for the harness
//
// This module defines the default values and well-known names used throughout
// the codebase, so configuration, the embedded server and the scenario agree
// on the same literals.

// =============================================================================
// Audit record defaults
// =============================================================================

/// Default user configured on the local authentication node during setup
pub const DEFAULT_AUDIT_USER: &str = "IAmAdmin";

/// Platform default user restored on teardown
pub const PLATFORM_DEFAULT_USER: &str = "$local";

/// Expected value of the `type` field for management audit records
pub const AUDIT_RECORD_TYPE: &str = "core";

/// Expected value of the `access` field for the native management channel
pub const NATIVE_ACCESS: &str = "NATIVE";

// =============================================================================
// Audit file location
// =============================================================================

/// Environment variable locating the server install root
pub const SERVER_HOME_ENV: &str = "JBOSS_HOME";

/// Audit file path relative to the server install root
pub const AUDIT_FILE_RELATIVE_PATH: [&str; 3] = ["standalone", "data", "audit-log.log"];

// =============================================================================
// Timeout defaults
// =============================================================================

/// Environment variable holding the timeout adjustment factor
pub const TIMEOUT_FACTOR_ENV: &str = "TS_TIMEOUT_FACTOR";

/// Default timeout adjustment factor
pub const DEFAULT_TIMEOUT_FACTOR: u32 = 1;

/// Milliseconds in one unscaled second
pub const MILLIS_PER_SECOND: u64 = 1000;

/// Number of scaled seconds to wait for a syslog datagram
pub const DEFAULT_SYSLOG_WAIT_SECONDS: u64 = 5;

/// Quiet period that ends a queue drain, in unscaled milliseconds
pub const DRAIN_QUIET_MILLIS: u64 = 100;

/// Upper bound on a whole queue drain, in unscaled milliseconds
pub const DRAIN_LIMIT_MILLIS: u64 = 1000;

// =============================================================================
// Syslog defaults
// =============================================================================

/// Default address the syslog listener binds to
pub const DEFAULT_SYSLOG_HOST: &str = "127.0.0.1";

/// Default UDP port of the syslog listener
pub const DEFAULT_SYSLOG_PORT: u16 = 9176;

/// Default capacity of the received-event queue
pub const DEFAULT_SYSLOG_QUEUE_CAPACITY: usize = 64;

/// Default name of the syslog handler installed on the server
pub const DEFAULT_SYSLOG_HANDLER_NAME: &str = "syslog-test";

/// Largest datagram the listener accepts
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

// =============================================================================
// Management model names
// =============================================================================

pub const CORE_SERVICE: &str = "core-service";
pub const MANAGEMENT: &str = "management";
pub const SECURITY_REALM: &str = "security-realm";
pub const MANAGEMENT_REALM: &str = "ManagementRealm";
pub const AUTHENTICATION: &str = "authentication";
pub const LOCAL: &str = "local";
pub const ACCESS: &str = "access";
pub const AUDIT: &str = "audit";
pub const LOGGER: &str = "logger";
pub const AUDIT_LOG: &str = "audit-log";
pub const HANDLER: &str = "handler";
pub const FILE_HANDLER: &str = "file-handler";
pub const SYSLOG_HANDLER: &str = "syslog-handler";
pub const PROTOCOL: &str = "protocol";
pub const UDP: &str = "udp";

pub const ENABLED: &str = "enabled";
pub const LOG_BOOT: &str = "log-boot";
pub const LOG_READ_ONLY: &str = "log-read-only";
pub const DEFAULT_USER: &str = "default-user";

pub const OUTCOME: &str = "outcome";
pub const SUCCESS: &str = "success";
pub const FAILED: &str = "failed";
pub const FAILURE_DESCRIPTION: &str = "failure-description";
pub const RESULT: &str = "result";

/// Name of the file handler wired to the audit logger out of the box
pub const DEFAULT_FILE_HANDLER_NAME: &str = "file";
