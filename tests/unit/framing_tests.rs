// Timestamp framing tests

use auditlog_harness::audit::{format_record, is_record_start, strip_timestamp_prefix};
use auditlog_harness::model::ModelNode;
use chrono::NaiveDate;
use rstest::rstest;

#[rstest]
#[case("2014-05-12 10:11:12 - {", true)]
#[case("2014-05-12 10:11:12 - {\"type\":\"core\"}", true)]
#[case("1999-12-31 23:59:59 - {   ", true)]
#[case("2014-05-12 10:11:12 - [", false)]
#[case("2014-05-12T10:11:12 - {", false)]
#[case("2014-5-12 10:11:12 - {", false)]
#[case(" 2014-05-12 10:11:12 - {", false)]
#[case("    \"ops\" : [{", false)]
#[case("", false)]
fn test_record_start_detection(#[case] line: &str, #[case] expected: bool) {
    assert_eq!(is_record_start(line), expected, "line: {:?}", line);
}

#[rstest]
#[case("2014-05-12 10:11:12 - {\"a\":1}", "{\"a\":1}")]
#[case("{\"a\":1}", "{\"a\":1}")]
#[case("2014-05-12 10:11:12 - {", "{")]
#[case("note 2014-05-12 10:11:12 - {", "note 2014-05-12 10:11:12 - {")]
fn test_strip_timestamp_prefix(#[case] payload: &str, #[case] expected: &str) {
    assert_eq!(strip_timestamp_prefix(payload), expected);
}

#[test]
fn test_strip_twice_equals_strip_once() {
    let payloads = [
        "2014-05-12 10:11:12 - {\"a\":1}",
        "2014-05-12 10:11:12 - {2014-05-12 10:11:12 - {",
        "{}",
    ];
    for payload in payloads {
        let once = strip_timestamp_prefix(payload).into_owned();
        assert_eq!(strip_timestamp_prefix(&once), once.as_str());
    }
}

#[test]
fn test_formatted_record_strips_back_to_json() {
    let timestamp = NaiveDate::from_ymd_opt(2014, 5, 12)
        .unwrap()
        .and_hms_opt(10, 11, 12)
        .unwrap();
    let record = ModelNode::object()
        .with("type", "core")
        .with("domainUUID", ModelNode::Undefined);

    let line = format_record(timestamp, &record, false);
    assert!(is_record_start(&line));

    let parsed = ModelNode::from_json_str(&strip_timestamp_prefix(&line)).unwrap();
    assert_eq!(parsed.get("type").as_string(), "core");
    assert!(!parsed.get("domainUUID").is_defined());
}
