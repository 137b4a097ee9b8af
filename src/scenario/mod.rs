//! Audit-log field verification scenario
//!
//! Drives the server into a state where exactly one management write is
//! audited, then reads the resulting record back from both the syslog
//! listener and the audit file and checks its fields.
//!
//! ```text
//! before()  : delete file, start, set default user, enable logger,
//!             install syslog handler, stop
//! test      : start, delete file, drain queue, write log-boot=true,
//!             check syslog record, check file record
//! after()   : best-effort restore of everything before() changed
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;

use crate::audit::{
    DatagramSinkReader, ExpectedAuditFields, FileSinkReader, FILE_LABEL, SYSLOG_LABEL,
};
use crate::config::HarnessConfig;
use crate::constants::{DEFAULT_USER, DRAIN_LIMIT_MILLIS, DRAIN_QUIET_MILLIS, ENABLED, LOG_BOOT};
use crate::error::{HarnessError, HarnessResult};
use crate::model::address::{audit_logger_address, local_authentication_address};
use crate::model::operation::{remove, write_attribute};
use crate::model::{ModelNode, PathAddress};
use crate::server::{
    apply_update, describe_operation, ManagementClient, ScopedClient, ServerController,
};
use crate::setup::SyslogHandlerSetup;
use crate::syslog::EventQueue;
use crate::timeout::TimeoutFactor;

/// The record as received through each sink
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedRecords {
    pub syslog: ModelNode,
    pub file: ModelNode,
}

/// Audit-log field verification against one server
pub struct AuditLogFieldsScenario<C, S> {
    controller: C,
    syslog: S,
    audit_file: PathBuf,
    audit_user: String,
    restore_user: String,
    expected: ExpectedAuditFields,
    timeout: TimeoutFactor,
    client: Option<ScopedClient>,
}

impl<C: ServerController, S: SyslogHandlerSetup> AuditLogFieldsScenario<C, S> {
    pub fn new(controller: C, syslog: S, config: &HarnessConfig) -> HarnessResult<Self> {
        config.validate()?;
        Ok(Self {
            controller,
            syslog,
            audit_file: config.audit_file_path(),
            audit_user: config.audit.default_user.clone(),
            restore_user: config.audit.restore_user.clone(),
            expected: ExpectedAuditFields::for_user(&config.audit.default_user),
            timeout: config.timeout()?,
            client: None,
        })
    }

    pub fn syslog_setup(&mut self) -> &mut S {
        &mut self.syslog
    }

    pub fn audit_file(&self) -> &Path {
        &self.audit_file
    }

    fn ensure_client(&mut self) -> HarnessResult<&ScopedClient> {
        if self.client.is_none() {
            self.client = Some(ScopedClient::new(self.controller.client()?));
        }
        self.client
            .as_ref()
            .ok_or_else(|| HarnessError::Server("Management client unavailable".to_string()))
    }

    /// Remove the audit file; a missing file is not an error
    pub fn delete_audit_file(&self) -> HarnessResult<()> {
        match std::fs::remove_file(&self.audit_file) {
            Ok(()) => {
                tracing::debug!(path = %self.audit_file.display(), "Deleted audit file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Configure the server so the next write is audited to both sinks
    ///
    /// Leaves the server stopped.
    pub async fn before(&mut self) -> HarnessResult<()> {
        self.delete_audit_file()?;
        self.controller.start().await?;
        self.ensure_client()?;

        let Some(client) = self.client.as_deref() else {
            return Err(HarnessError::Server("Management client unavailable".to_string()));
        };

        let op = write_attribute(
            &local_authentication_address(),
            DEFAULT_USER,
            self.audit_user.as_str(),
        );
        apply_update(client, &op).await?;
        apply_update(client, &write_attribute(&audit_logger_address(), ENABLED, true)).await?;

        self.syslog.setup(client).await?;
        let op = write_attribute(&self.syslog.logger_address(), ENABLED, true);
        apply_update(client, &op).await?;

        self.controller.stop().await?;
        tracing::info!(user = %self.audit_user, "Audit logging prepared");
        Ok(())
    }

    /// Execute the single audited write: `log-boot = true` on the logger
    pub async fn make_one_log(&self) -> HarnessResult<()> {
        let client = self
            .client
            .as_deref()
            .ok_or_else(|| HarnessError::Server("Management client unavailable".to_string()))?;
        apply_update(client, &write_attribute(&audit_logger_address(), LOG_BOOT, true)).await?;
        Ok(())
    }

    /// Provoke one record and check it as received by both sinks
    pub async fn test_audit_logging_fields(&mut self) -> HarnessResult<VerifiedRecords> {
        self.controller.start().await?;
        self.ensure_client()?;
        self.delete_audit_file()?;
        self.drain_events().await?;

        self.make_one_log().await?;

        let wait = self.timeout.syslog_wait();
        let syslog = DatagramSinkReader::new(self.events()?).await_one(wait).await?;
        self.expected.check(SYSLOG_LABEL, &syslog)?;

        let file = FileSinkReader
            .read(&self.audit_file, 1)?
            .into_iter()
            .next()
            .unwrap_or_default();
        self.expected.check(FILE_LABEL, &file)?;

        tracing::info!("Audit record fields verified in both sinks");
        Ok(VerifiedRecords { syslog, file })
    }

    /// Drop queued events, then keep dropping until the queue stays quiet
    ///
    /// Datagrams sent during setup may still be in flight when the queue is
    /// first cleared.
    async fn drain_events(&mut self) -> HarnessResult<usize> {
        let quiet = self.timeout.adjust_millis(DRAIN_QUIET_MILLIS);
        let limit = self.timeout.adjust_millis(DRAIN_LIMIT_MILLIS);
        Ok(drain_queue(self.events()?, quiet, limit).await)
    }

    fn events(&mut self) -> HarnessResult<&mut dyn EventQueue> {
        self.syslog
            .events()
            .ok_or_else(|| HarnessError::Syslog("Syslog listener is not set up".to_string()))
    }

    /// Restore the configuration changed by [`Self::before`]
    ///
    /// Every step runs even if an earlier one failed; the failures are
    /// returned in the order they happened. The management client is released
    /// at the end.
    pub async fn after(&mut self) -> Vec<HarnessError> {
        let mut errors = Vec::new();

        note(&mut errors, "start server", self.controller.start().await);
        if let Err(e) = self.ensure_client() {
            note(&mut errors, "obtain client", Err(e));
        }

        if let Some(client) = self.client.as_deref() {
            note(&mut errors, "syslog tear down", self.syslog.tear_down(client).await);

            let disable = write_attribute(&audit_logger_address(), ENABLED, false);
            note(&mut errors, "disable logger", apply_update(client, &disable).await.map(drop));

            let reset = write_attribute(
                &local_authentication_address(),
                DEFAULT_USER,
                self.restore_user.as_str(),
            );
            note(&mut errors, "reset default user", apply_update(client, &reset).await.map(drop));

            for address in [
                self.syslog.handler_reference_address(),
                self.syslog.handler_address(),
            ] {
                note(&mut errors, "remove handler", remove_if_present(client, &address).await);
            }
        }

        note(&mut errors, "delete audit file", self.delete_audit_file());
        note(&mut errors, "stop server", self.controller.stop().await);

        self.client.take();
        errors
    }

    /// Run before, the test and after; teardown always runs
    ///
    /// The first failure wins: a setup or test failure is reported over any
    /// teardown failure.
    pub async fn run(&mut self) -> HarnessResult<VerifiedRecords> {
        let outcome = match self.before().await {
            Ok(()) => self.test_audit_logging_fields().await,
            Err(e) => Err(e),
        };
        let teardown = self.after().await;

        match outcome {
            Ok(records) => match teardown.into_iter().next() {
                Some(e) => Err(e),
                None => Ok(records),
            },
            Err(e) => Err(e),
        }
    }
}

/// Empty `events` until nothing arrives for `quiet` or `limit` has passed
async fn drain_queue(events: &mut dyn EventQueue, quiet: Duration, limit: Duration) -> usize {
    let deadline = Instant::now() + limit;
    let mut dropped = events.clear();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            tracing::warn!(dropped, "Syslog queue still busy, continuing without a quiet period");
            break;
        }
        match events.poll(quiet.min(remaining)).await {
            Some(_) => dropped += 1,
            None => break,
        }
    }
    tracing::debug!(dropped, "Drained stale syslog events");
    dropped
}

fn note(errors: &mut Vec<HarnessError>, step: &str, result: HarnessResult<()>) {
    if let Err(e) = result {
        tracing::warn!(step, error = %e, "Teardown step failed");
        errors.push(e);
    }
}

/// Remove a resource; a resource that is already gone is not a failure
async fn remove_if_present(
    client: &dyn ManagementClient,
    address: &PathAddress,
) -> HarnessResult<()> {
    let op = remove(address);
    let result = client.execute(&op).await?;
    if !result.is_success() {
        tracing::debug!(
            operation = %describe_operation(&op),
            reason = %result.failure_description(),
            "Resource already removed"
        );
    }
    Ok(())
}
