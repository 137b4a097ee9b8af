//! Audit record verification
//!
//! Records reach the harness through two sinks: the line-oriented audit file
//! ([`file_sink`]) and syslog datagrams ([`datagram_sink`]). Both share the
//! timestamp framing in [`framing`] and are checked against the same field
//! invariants in [`schema`].

pub mod datagram_sink;
pub mod file_sink;
pub mod framing;
pub mod schema;

pub use datagram_sink::DatagramSinkReader;
pub use file_sink::{read_records, FileSinkReader};
pub use framing::{format_record, is_record_start, strip_timestamp_prefix};
pub use schema::{check, ExpectedAuditFields, FieldRule};

/// Label used when checking the record received over syslog
pub const SYSLOG_LABEL: &str = "Syslog";

/// Label used when checking the record read from the audit file
pub const FILE_LABEL: &str = "File";
