// Test harness for integration tests
// Provides a temporary server home and scenarios wired to the embedded server

use async_trait::async_trait;
use auditlog_harness::config::HarnessConfig;
use auditlog_harness::error::{HarnessError, HarnessResult};
use auditlog_harness::model::address::{logger_handler_reference_address, syslog_handler_address};
use auditlog_harness::model::PathAddress;
use auditlog_harness::scenario::AuditLogFieldsScenario;
use auditlog_harness::server::{EmbeddedServer, ManagementClient, ServerMode};
use auditlog_harness::setup::{SyslogHandlerSetup, UdpSyslogSetup};
use auditlog_harness::syslog::EventQueue;
use tempfile::TempDir;

/// Server home that is removed when the harness is dropped
pub struct TestHome {
    dir: TempDir,
}

impl TestHome {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temporary server home");
        std::fs::create_dir_all(dir.path().join("standalone").join("data"))
            .expect("Failed to create data directory");
        Self { dir }
    }

    /// Harness configuration with an ephemeral syslog port
    pub fn config(&self) -> HarnessConfig {
        let mut config = HarnessConfig::new(self.dir.path());
        config.syslog.port = 0;
        config
    }

    pub fn server(&self, mode: ServerMode) -> EmbeddedServer {
        EmbeddedServer::with_mode(self.dir.path(), mode)
    }
}

pub type EmbeddedScenario = AuditLogFieldsScenario<EmbeddedServer, UdpSyslogSetup>;

/// Scenario against a fresh embedded server; the returned server shares its state
pub fn embedded_scenario(home: &TestHome, mode: ServerMode) -> (EmbeddedScenario, EmbeddedServer) {
    let config = home.config();
    let server = home.server(mode);
    let setup = UdpSyslogSetup::new(config.syslog.clone());
    let scenario = AuditLogFieldsScenario::new(server.clone(), setup, &config)
        .expect("Failed to create scenario");
    (scenario, server)
}

/// Syslog setup whose installation always fails
pub struct FailingSyslogSetup {
    pub tear_downs: usize,
}

#[async_trait]
impl SyslogHandlerSetup for FailingSyslogSetup {
    async fn setup(&mut self, _client: &dyn ManagementClient) -> HarnessResult<()> {
        Err(HarnessError::Syslog("listener refused to start".to_string()))
    }

    async fn tear_down(&mut self, _client: &dyn ManagementClient) -> HarnessResult<()> {
        self.tear_downs += 1;
        Ok(())
    }

    fn handler_address(&self) -> PathAddress {
        syslog_handler_address("failing")
    }

    fn handler_reference_address(&self) -> PathAddress {
        logger_handler_reference_address("failing")
    }

    fn events(&mut self) -> Option<&mut dyn EventQueue> {
        None
    }
}
