// File sink reader tests

use auditlog_harness::audit::{read_records, FileSinkReader};
use auditlog_harness::error::HarnessError;
use std::io::{Cursor, Write};
use tempfile::NamedTempFile;

fn file_with(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const ONE_RECORD: &str = "2014-05-12 10:11:12 - {
    \"type\" : \"core\",
    \"r/o\" : false,
    \"ops\" : [{
        \"operation\" : \"write-attribute\",
        \"address\" : [],
        \"name\" : \"log-boot\",
        \"value\" : true
    }]
}
";

#[test]
fn test_reads_multi_line_record() {
    let file = file_with(ONE_RECORD);
    let records = FileSinkReader.read(file.path(), 1).unwrap();

    assert_eq!(records[0].get("type").as_string(), "core");
    assert_eq!(records[0].get("r/o").as_string(), "false");
    assert_eq!(records[0].get("ops").as_list().map(<[_]>::len), Some(1));
}

#[test]
fn test_empty_file_yields_no_records() {
    let file = file_with("");
    assert!(FileSinkReader.read(file.path(), 0).unwrap().is_empty());
}

#[test]
fn test_consecutive_timestamp_lines_yield_two_empty_records() {
    let records = read_records(Cursor::new(
        "2014-05-12 10:11:12 - {\n}\n2014-05-12 10:11:13 - {\n}\n",
    ))
    .unwrap();

    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.entries().is_empty()));
}

#[test]
fn test_records_keep_emission_order() {
    let contents = (1..=3)
        .map(|i| format!("2014-05-12 10:11:1{} - {{\n\"seq\" : {}\n}}\n", i, i))
        .collect::<String>();
    let records = read_records(Cursor::new(contents)).unwrap();

    let sequence: Vec<String> = records.iter().map(|r| r.get("seq").as_string()).collect();
    assert_eq!(sequence, vec!["1", "2", "3"]);
}

#[test]
fn test_lines_before_first_timestamp_are_ignored() {
    let contents = format!("garbage\n{{ not json\n{}", ONE_RECORD);
    let records = read_records(Cursor::new(contents)).unwrap();
    assert_eq!(records.len(), 1);
}

#[test]
fn test_count_mismatch_lists_records() {
    let file = file_with(ONE_RECORD);
    let err = FileSinkReader.read(file.path(), 2).unwrap_err();

    match err {
        HarnessError::CountMismatch {
            expected,
            actual,
            records,
        } => {
            assert_eq!(expected, 2);
            assert_eq!(actual, 1);
            assert!(records.contains("core"));
        }
        other => panic!("Expected CountMismatch, got {:?}", other),
    }
}

#[test]
fn test_unparseable_body_is_a_framing_error() {
    let file = file_with("2014-05-12 10:11:12 - {\n\"type\" : \n");
    let err = FileSinkReader.read(file.path(), 1).unwrap_err();
    assert!(matches!(err, HarnessError::Framing { .. }));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = FileSinkReader.read(&dir.path().join("absent.log"), 1).unwrap_err();
    assert!(matches!(err, HarnessError::Io(_)));
}
