// RFC 5424 encoding for the server-side syslog handler

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};

/// Facility used for management audit messages (user-level messages)
pub const FACILITY_USER: u8 = 1;

/// Severity used for management audit messages (warning)
pub const SEVERITY_WARNING: u8 = 4;

/// Static description of a syslog message used for encoding
#[derive(Debug, Clone)]
pub struct EmitMessage<'a> {
    pub facility: u8,
    pub severity: u8,
    pub timestamp: Option<DateTime<Utc>>,
    pub hostname: Option<&'a str>,
    pub app_name: Option<&'a str>,
    pub proc_id: Option<&'a str>,
    pub msg_id: Option<&'a str>,
    pub message: &'a str,
}

impl<'a> EmitMessage<'a> {
    pub fn new(message: &'a str) -> Self {
        Self {
            facility: FACILITY_USER,
            severity: SEVERITY_WARNING,
            timestamp: None,
            hostname: None,
            app_name: None,
            proc_id: None,
            msg_id: None,
            message,
        }
    }

    pub fn priority(&self) -> u8 {
        self.facility.saturating_mul(8).saturating_add(self.severity)
    }
}

/// Encode an RFC 5424 line without structured data
///
/// Absent header fields are written as the NILVALUE `-`.
pub fn encode_rfc5424(msg: &EmitMessage<'_>) -> Bytes {
    let ts = msg
        .timestamp
        .unwrap_or_else(Utc::now)
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    let line = format!(
        "<{}>1 {} {} {} {} {} - {}",
        msg.priority(),
        ts,
        header_field(msg.hostname),
        header_field(msg.app_name),
        header_field(msg.proc_id),
        header_field(msg.msg_id),
        msg.message
    );
    Bytes::from(line)
}

/// Header fields may not contain spaces and may not be empty
fn header_field(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.replace(' ', "_"),
        _ => "-".to_string(),
    }
}

/// Hostname of this machine for the syslog HOSTNAME field
pub fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}
