// Syslog datagram decoding (RFC 5424 with an RFC 3164 fallback)

use bytes::Bytes;
use thiserror::Error;

use super::SyslogEvent;

const NILVALUE: &str = "-";
const UTF8_BOM: char = '\u{feff}';

/// Errors returned by [`decode`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("empty syslog payload")]
    Empty,
    #[error("syslog payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("missing or malformed PRI part")]
    InvalidPriority,
    #[error("truncated syslog header")]
    TruncatedHeader,
    #[error("unterminated structured data element")]
    UnterminatedStructuredData,
}

/// Decode one datagram into a [`SyslogEvent`]
///
/// Datagrams whose header carries a version number are parsed as RFC 5424;
/// anything else with a valid PRI is treated as RFC 3164.
pub fn decode(raw: Bytes) -> Result<SyslogEvent, DecodeError> {
    if raw.is_empty() {
        return Err(DecodeError::Empty);
    }
    let text = std::str::from_utf8(&raw)?;
    let text = text.trim_end_matches(&['\n', '\r', '\0'][..]);

    let (pri, rest) = parse_priority(text)?;
    let mut event = match parse_version(rest) {
        Some((version, header)) => parse_rfc5424(version, header)?,
        None => parse_rfc3164(rest),
    };
    event.facility = pri / 8;
    event.severity = pri % 8;
    event.raw = raw;
    Ok(event)
}

fn parse_priority(text: &str) -> Result<(u8, &str), DecodeError> {
    let body = text.strip_prefix('<').ok_or(DecodeError::InvalidPriority)?;
    let close = body.find('>').ok_or(DecodeError::InvalidPriority)?;
    let digits = &body[..close];
    if digits.is_empty() || digits.len() > 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecodeError::InvalidPriority);
    }
    let pri: u8 = digits.parse().map_err(|_| DecodeError::InvalidPriority)?;
    if pri > 191 {
        return Err(DecodeError::InvalidPriority);
    }
    Ok((pri, &body[close + 1..]))
}

/// `VERSION SP` directly after the PRI marks an RFC 5424 header
fn parse_version(rest: &str) -> Option<(u8, &str)> {
    let digits = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 || digits > 2 || rest.as_bytes().get(digits) != Some(&b' ') {
        return None;
    }
    let version = rest[..digits].parse().ok()?;
    Some((version, &rest[digits + 1..]))
}

fn nil_to_none(token: &str) -> Option<String> {
    (token != NILVALUE).then(|| token.to_string())
}

/// Split off one space-terminated header token
fn next_token(input: &str) -> Result<(&str, &str), DecodeError> {
    let end = input.find(' ').ok_or(DecodeError::TruncatedHeader)?;
    Ok((&input[..end], &input[end + 1..]))
}

fn parse_rfc5424(version: u8, header: &str) -> Result<SyslogEvent, DecodeError> {
    // TIMESTAMP HOSTNAME APP-NAME PROCID MSGID
    let (timestamp, rest) = next_token(header)?;
    let (hostname, rest) = next_token(rest)?;
    let (app_name, rest) = next_token(rest)?;
    let (proc_id, rest) = next_token(rest)?;
    let (msg_id, rest) = match rest.find(' ') {
        Some(end) => (&rest[..end], &rest[end + 1..]),
        None => return Err(DecodeError::TruncatedHeader),
    };

    let (structured_data, msg) = split_structured_data(rest)?;
    let message = msg
        .map(|m| m.trim_start_matches(UTF8_BOM).to_string())
        .filter(|m| !m.is_empty());

    Ok(SyslogEvent {
        version: Some(version),
        timestamp: nil_to_none(timestamp),
        hostname: nil_to_none(hostname),
        app_name: nil_to_none(app_name),
        proc_id: nil_to_none(proc_id),
        msg_id: nil_to_none(msg_id),
        structured_data,
        message,
        ..SyslogEvent::default()
    })
}

/// Returns the structured data (if not NILVALUE) and the optional message
fn split_structured_data(input: &str) -> Result<(Option<String>, Option<&str>), DecodeError> {
    if let Some(rest) = input.strip_prefix(NILVALUE) {
        return Ok((None, rest.strip_prefix(' ')));
    }
    if !input.starts_with('[') {
        return Err(DecodeError::TruncatedHeader);
    }

    let bytes = input.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() && bytes[i] == b'[' {
        // Scan one SD-ELEMENT; `]` inside a quoted PARAM-VALUE may be escaped
        let mut in_quotes = false;
        let mut j = i + 1;
        loop {
            match bytes.get(j) {
                None => return Err(DecodeError::UnterminatedStructuredData),
                Some(b'\\') if in_quotes => j += 2,
                Some(b'"') => {
                    in_quotes = !in_quotes;
                    j += 1;
                }
                Some(b']') if !in_quotes => break,
                Some(_) => j += 1,
            }
        }
        i = j + 1;
    }

    let structured = input[..i].to_string();
    Ok((Some(structured), input[i..].strip_prefix(' ')))
}

fn parse_rfc3164(rest: &str) -> SyslogEvent {
    // Mmm dd hh:mm:ss HOSTNAME TAG: MSG
    const TIMESTAMP_LEN: usize = 15;
    let mut event = SyslogEvent::default();
    let mut remaining = rest;

    if remaining.len() > TIMESTAMP_LEN
        && remaining.is_char_boundary(TIMESTAMP_LEN)
        && remaining.as_bytes()[TIMESTAMP_LEN] == b' '
        && remaining.as_bytes()[..3].iter().all(u8::is_ascii_alphabetic)
    {
        event.timestamp = Some(remaining[..TIMESTAMP_LEN].to_string());
        remaining = &remaining[TIMESTAMP_LEN + 1..];
        if let Some((host, tail)) = remaining.split_once(' ') {
            event.hostname = Some(host.to_string());
            remaining = tail;
        }
    }

    match remaining.split_once(": ") {
        Some((tag, msg)) if !tag.contains(' ') => {
            event.app_name = Some(tag.to_string());
            remaining = msg;
        }
        _ => {}
    }
    event.message = (!remaining.is_empty()).then(|| remaining.to_string());
    event
}
