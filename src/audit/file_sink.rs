// File sink reader
//
// Audit records in the file sink are pretty-printed over several lines. The
// timestamp line is the only reliable delimiter: it opens a new record and is
// replaced with the `{` that starts the record body.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::framing::{is_record_start, parse_record};
use crate::error::{HarnessError, HarnessResult};
use crate::model::ModelNode;

/// Reads and reframes the on-disk audit log
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSinkReader;

impl FileSinkReader {
    /// Read every record in `path` and require exactly `expected_count`
    ///
    /// The file is closed on every exit path.
    pub fn read(&self, path: &Path, expected_count: usize) -> HarnessResult<Vec<ModelNode>> {
        let reader = BufReader::new(File::open(path)?);
        let records = read_records(reader)?;

        tracing::debug!(
            path = %path.display(),
            records = records.len(),
            expected = expected_count,
            "Read audit file"
        );

        if records.len() != expected_count {
            return Err(HarnessError::CountMismatch {
                expected: expected_count,
                actual: records.len(),
                records: format!("{:?}", records.iter().map(|r| r.to_string()).collect::<Vec<_>>()),
            });
        }
        Ok(records)
    }
}

/// Reframe a line-oriented audit log into records, in emission order
///
/// Lines before the first timestamp line are discarded. Lines are appended
/// verbatim, so whitespace inside a record is preserved.
pub fn read_records<R: BufRead>(reader: R) -> HarnessResult<Vec<ModelNode>> {
    let mut records = Vec::new();
    let mut current: Option<String> = None;

    for line in reader.lines() {
        let line = line?;
        if is_record_start(&line) {
            if let Some(body) = current.take() {
                records.push(parse_record(&body)?);
            }
            current = Some(String::from("{"));
        } else if let Some(body) = current.as_mut() {
            body.push('\n');
            body.push_str(&line);
        }
    }

    if let Some(body) = current {
        records.push(parse_record(&body)?);
    }
    Ok(records)
}
