// Audit record field invariant tests

use auditlog_harness::audit::{check, ExpectedAuditFields, FieldRule};
use auditlog_harness::error::HarnessError;
use auditlog_harness::model::ModelNode;
use rstest::rstest;
use tokio_test::{assert_err, assert_ok};

fn seed_record() -> ModelNode {
    ModelNode::from_json_str(
        r#"{
            "type" : "core",
            "r/o" : false,
            "booting" : false,
            "version" : "8.0.0.Final",
            "user" : "IAmAdmin",
            "domainUUID" : null,
            "access" : "NATIVE",
            "remote-address" : "127.0.0.1/127.0.0.1",
            "success" : true,
            "ops" : [{
                "operation" : "write-attribute",
                "address" : [
                    {"core-service" : "management"},
                    {"access" : "audit"},
                    {"logger" : "audit-log"}
                ],
                "name" : "log-boot",
                "value" : true
            }]
        }"#,
    )
    .unwrap()
}

#[test]
fn test_seed_record_passes_for_both_labels() {
    assert_ok!(check("Syslog", &seed_record()));
    assert_ok!(check("File", &seed_record()));
}

// Test: each field violation is reported against the offending field
#[rstest]
#[case("type", ModelNode::from("domain"))]
#[case("r/o", ModelNode::from(true))]
#[case("booting", ModelNode::from(true))]
#[case("version", ModelNode::Undefined)]
#[case("user", ModelNode::from("$local"))]
#[case("domainUUID", ModelNode::from("c3a2f0b6-9f2b-4d7e-8a57-2f8f0c1d2e3f"))]
#[case("access", ModelNode::from("HTTP"))]
#[case("remote-address", ModelNode::Undefined)]
#[case("success", ModelNode::from(false))]
#[case("ops", ModelNode::List(vec![]))]
fn test_field_violation_is_reported(#[case] field: &str, #[case] value: ModelNode) {
    let mut record = seed_record();
    record.set(field, value);

    match check("File", &record) {
        Err(HarnessError::FieldInvariant {
            label, field: got, ..
        }) => {
            assert_eq!(label, "File");
            assert_eq!(got, field);
        }
        other => panic!("Expected FieldInvariant for {}, got {:?}", field, other),
    }
}

#[test]
fn test_absent_domain_uuid_is_accepted() {
    let mut record = seed_record();
    record.remove("domainUUID");
    assert_ok!(check("Syslog", &record));
}

#[test]
fn test_string_booleans_compare_by_rendering() {
    let mut record = seed_record();
    record.set("success", "true");
    record.set("r/o", "false");
    assert_ok!(check("Syslog", &record));
}

#[test]
fn test_first_violation_in_table_order_wins() {
    let mut record = seed_record();
    record.set("ops", ModelNode::List(vec![]));
    record.set("type", "domain");

    let err = assert_err!(check("Syslog", &record));
    assert!(err.to_string().contains("'type'"), "{}", err);
}

#[test]
fn test_boot_record_expectation() {
    let expected = ExpectedAuditFields::default()
        .with_rule("booting", FieldRule::Equals("true".to_string()))
        .with_rule("ops", FieldRule::Defined);
    let mut record = seed_record();
    record.set("booting", true);
    record.get_mut("ops").push(ModelNode::object());

    assert_ok!(expected.check("File", &record));
}
