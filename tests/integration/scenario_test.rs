use super::test_harness::*;
use auditlog_harness::audit::{ExpectedAuditFields, FieldRule, FileSinkReader};
use auditlog_harness::constants::{DEFAULT_USER, ENABLED, LOG_BOOT};
use auditlog_harness::error::HarnessError;
use auditlog_harness::model::address::{
    audit_logger_address, local_authentication_address, logger_handler_reference_address,
    syslog_handler_address,
};
use auditlog_harness::model::operation::write_attribute;
use auditlog_harness::model::ModelNode;
use auditlog_harness::scenario::AuditLogFieldsScenario;
use auditlog_harness::server::{apply_update, ServerController, ServerMode};
use auditlog_harness::setup::SyslogHandlerSetup;
use uuid::Uuid;

#[tokio::test]
async fn test_full_scenario_verifies_both_sinks() {
    let home = TestHome::new();
    let (mut scenario, _server) = embedded_scenario(&home, ServerMode::Standalone);

    let records = scenario.run().await.expect("Scenario failed");

    assert_eq!(records.syslog.get("user").as_string(), "IAmAdmin");
    assert_eq!(records.file.get("access").as_string(), "NATIVE");
}

// Test: the record read from the file equals the one received over syslog
#[tokio::test]
async fn test_both_sinks_carry_the_same_record() {
    let home = TestHome::new();
    let (mut scenario, _server) = embedded_scenario(&home, ServerMode::Standalone);

    let records = scenario.run().await.expect("Scenario failed");
    assert_eq!(records.syslog, records.file);
}

#[tokio::test]
async fn test_teardown_restores_configuration() {
    let home = TestHome::new();
    let (mut scenario, server) = embedded_scenario(&home, ServerMode::Standalone);

    scenario.run().await.expect("Scenario failed");

    let tree = server.tree();
    assert_eq!(tree.attribute(&audit_logger_address(), ENABLED), &ModelNode::Boolean(false));
    assert_eq!(
        tree.attribute(&local_authentication_address(), DEFAULT_USER).as_string(),
        "$local"
    );
    assert!(!tree.contains(&syslog_handler_address("syslog-test")));
    assert!(!tree.contains(&logger_handler_reference_address("syslog-test")));
    assert!(!scenario.audit_file().exists());
    assert!(!server.is_started());
}

#[tokio::test]
async fn test_teardown_twice_equals_teardown_once() {
    let home = TestHome::new();
    let (mut scenario, server) = embedded_scenario(&home, ServerMode::Standalone);

    scenario.before().await.unwrap();
    scenario.test_audit_logging_fields().await.unwrap();

    assert!(scenario.after().await.is_empty());
    let once = server.tree();
    assert!(scenario.after().await.is_empty());
    assert_eq!(server.tree(), once);
}

#[tokio::test]
async fn test_domain_uuid_fails_the_syslog_check() {
    let home = TestHome::new();
    let (mut scenario, server) = embedded_scenario(&home, ServerMode::Domain(Uuid::new_v4()));

    let err = scenario.run().await.unwrap_err();
    match err {
        HarnessError::FieldInvariant { label, field, .. } => {
            assert_eq!(label, "Syslog");
            assert_eq!(field, "domainUUID");
        }
        other => panic!("Expected FieldInvariant, got {:?}", other),
    }

    // Teardown still ran
    let tree = server.tree();
    assert_eq!(tree.attribute(&audit_logger_address(), ENABLED), &ModelNode::Boolean(false));
}

#[tokio::test]
async fn test_restart_after_log_boot_produces_boot_record() {
    let home = TestHome::new();
    let (mut scenario, server) = embedded_scenario(&home, ServerMode::Standalone);

    scenario.before().await.unwrap();
    scenario.test_audit_logging_fields().await.unwrap();

    server.stop().await.unwrap();
    scenario.delete_audit_file().unwrap();
    server.start().await.unwrap();

    let records = FileSinkReader.read(scenario.audit_file(), 1).unwrap();
    assert_eq!(records[0].get("booting").as_string(), "true");
    let boot = ExpectedAuditFields::default()
        .with_rule("booting", FieldRule::Equals("true".to_string()))
        .with_rule("ops", FieldRule::Defined);
    assert!(boot.check("File", &records[0]).is_ok());

    assert!(scenario.after().await.is_empty());
}

// Test: enabling the logger before setting the user still records the new user
#[tokio::test]
async fn test_setup_order_does_not_change_recorded_user() {
    let home = TestHome::new();
    let (mut scenario, server) = embedded_scenario(&home, ServerMode::Standalone);

    server.start().await.unwrap();
    let client = server.client().unwrap();
    apply_update(client.as_ref(), &write_attribute(&audit_logger_address(), ENABLED, true))
        .await
        .unwrap();
    apply_update(
        client.as_ref(),
        &write_attribute(&local_authentication_address(), DEFAULT_USER, "IAmAdmin"),
    )
    .await
    .unwrap();
    scenario.syslog_setup().setup(client.as_ref()).await.unwrap();
    server.stop().await.unwrap();

    let records = scenario.test_audit_logging_fields().await.unwrap();
    assert_eq!(records.file.get("user").as_string(), "IAmAdmin");

    assert!(scenario.after().await.is_empty());
}

#[tokio::test]
async fn test_failed_setup_still_runs_teardown() {
    let home = TestHome::new();
    let server = home.server(ServerMode::Standalone);
    let setup = FailingSyslogSetup { tear_downs: 0 };
    let mut scenario = AuditLogFieldsScenario::new(server.clone(), setup, &home.config()).unwrap();

    let err = scenario.run().await.unwrap_err();
    assert!(matches!(err, HarnessError::Syslog(_)));

    assert_eq!(scenario.syslog_setup().tear_downs, 1);
    let tree = server.tree();
    assert_eq!(
        tree.attribute(&local_authentication_address(), DEFAULT_USER).as_string(),
        "$local"
    );
    assert_eq!(tree.attribute(&audit_logger_address(), LOG_BOOT), &ModelNode::Boolean(false));
}
