//! Audit record framing shared by both sinks
//!
//! Every record is preceded by a timestamp in the form
//! `YYYY-MM-DD HH:MM:SS - {`, where the `{` opens the record body. Readers
//! recognise record boundaries by this prefix and replace it with the bare
//! `{` the JSON parser expects.

use chrono::NaiveDateTime;
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

use crate::error::{HarnessError, HarnessResult};
use crate::model::ModelNode;

/// `chrono` format of the record timestamp (no timezone)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Separator between the timestamp and the record body
pub const TIMESTAMP_SEPARATOR: &str = " - ";

fn date_stamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2} - \{")
            .expect("date stamp pattern is a valid regex")
    })
}

/// Whether `line` opens a new record
pub fn is_record_start(line: &str) -> bool {
    date_stamp_pattern().is_match(line)
}

/// Replace a leading timestamp prefix with `{`
///
/// Payloads without the prefix are returned unchanged, so applying this twice
/// is the same as applying it once.
pub fn strip_timestamp_prefix(payload: &str) -> Cow<'_, str> {
    date_stamp_pattern().replace(payload, "{")
}

/// Parse a reframed record body
pub fn parse_record(body: &str) -> HarnessResult<ModelNode> {
    ModelNode::from_json_str(body).map_err(|e| HarnessError::framing(body, e))
}

/// Render a record the way the server's audit formatter does
///
/// `pretty` selects the multi-line layout used by the file sink; the compact
/// single-line layout is used for datagrams.
pub fn format_record(timestamp: NaiveDateTime, record: &ModelNode, pretty: bool) -> String {
    let body = if pretty {
        record.to_json_pretty()
    } else {
        record.to_json_string()
    };
    format!(
        "{}{}{}",
        timestamp.format(TIMESTAMP_FORMAT),
        TIMESTAMP_SEPARATOR,
        body
    )
}
