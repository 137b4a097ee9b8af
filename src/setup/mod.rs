//! Server-side syslog handler setup
//!
//! A [`SyslogHandlerSetup`] owns the syslog listener the audit records are
//! sent to and installs the matching handler on the server. It publishes the
//! addresses it created so that callers can clean them up independently.

use async_trait::async_trait;
use std::net::SocketAddr;

use crate::config::SyslogConfig;
use crate::constants::{PROTOCOL, UDP};
use crate::error::{HarnessError, HarnessResult};
use crate::model::address::{
    audit_logger_address, logger_handler_reference_address, syslog_handler_address,
};
use crate::model::operation::{add, remove};
use crate::model::{ModelNode, PathAddress};
use crate::server::{apply_update, describe_operation, ManagementClient};
use crate::syslog::{EventQueue, SyslogEventQueue, SyslogServer};

/// Installs a syslog audit handler and the listener receiving its records
#[async_trait]
pub trait SyslogHandlerSetup: Send {
    /// Start the listener and add the handler to the audit logger
    async fn setup(&mut self, client: &dyn ManagementClient) -> HarnessResult<()>;

    /// Remove what `setup` added and stop the listener
    ///
    /// Safe to call when `setup` never ran or failed halfway.
    async fn tear_down(&mut self, client: &dyn ManagementClient) -> HarnessResult<()>;

    /// Address of the audit logger the handler is attached to
    fn logger_address(&self) -> PathAddress {
        audit_logger_address()
    }

    /// Address of the handler declaration
    fn handler_address(&self) -> PathAddress;

    /// Address of the logger's reference to the handler
    fn handler_reference_address(&self) -> PathAddress;

    /// Queue of received events, available once `setup` succeeded
    fn events(&mut self) -> Option<&mut dyn EventQueue>;
}

/// Syslog handler sending RFC 5424 datagrams over UDP to a local listener
pub struct UdpSyslogSetup {
    config: SyslogConfig,
    server: Option<SyslogServer>,
    queue: Option<SyslogEventQueue>,
}

impl UdpSyslogSetup {
    pub fn new(config: SyslogConfig) -> Self {
        Self {
            config,
            server: None,
            queue: None,
        }
    }

    /// Address of the running listener
    pub fn listener_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(SyslogServer::local_addr)
    }

    pub fn handler_name(&self) -> &str {
        &self.config.handler_name
    }

    fn bind_addr(&self) -> HarnessResult<SocketAddr> {
        format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| {
                HarnessError::Config(format!(
                    "Invalid syslog address '{}:{}': {}",
                    self.config.host, self.config.port, e
                ))
            })
    }

    fn protocol_address(&self) -> PathAddress {
        self.handler_address().append(PROTOCOL, UDP)
    }
}

/// Destination the server should send to for a listener bound on `addr`
fn destination_host(addr: SocketAddr) -> String {
    if addr.ip().is_unspecified() {
        "127.0.0.1".to_string()
    } else {
        addr.ip().to_string()
    }
}

#[async_trait]
impl SyslogHandlerSetup for UdpSyslogSetup {
    async fn setup(&mut self, client: &dyn ManagementClient) -> HarnessResult<()> {
        if self.server.is_none() {
            let (server, queue) =
                SyslogServer::bind(self.bind_addr()?, self.config.queue_capacity).await?;
            self.server = Some(server);
            self.queue = Some(queue);
        }
        let listener = self
            .listener_addr()
            .ok_or_else(|| HarnessError::Syslog("Syslog listener is not running".to_string()))?;

        let handler = add(
            &self.handler_address(),
            [
                ("formatter", ModelNode::from("json-formatter")),
                ("syslog-format", ModelNode::from("RFC5424")),
                ("app-name", ModelNode::from(env!("CARGO_PKG_NAME"))),
            ],
        );
        let protocol = add(
            &self.protocol_address(),
            [
                ("host", ModelNode::from(destination_host(listener))),
                ("port", ModelNode::from(listener.port())),
            ],
        );
        let reference = add(&self.handler_reference_address(), []);

        for op in [handler, protocol, reference] {
            apply_update(client, &op).await?;
        }

        tracing::info!(
            handler = %self.config.handler_name,
            listener = %listener,
            "Syslog audit handler installed"
        );
        Ok(())
    }

    async fn tear_down(&mut self, client: &dyn ManagementClient) -> HarnessResult<()> {
        // Reference first: a handler still referenced by the logger cannot
        // be removed.
        for address in [self.handler_reference_address(), self.handler_address()] {
            let op = remove(&address);
            match client.execute(&op).await {
                Ok(result) if result.is_success() => {}
                Ok(result) => tracing::debug!(
                    operation = %describe_operation(&op),
                    reason = %result.failure_description(),
                    "Nothing to remove"
                ),
                Err(e) => tracing::warn!(
                    operation = %describe_operation(&op),
                    error = %e,
                    "Failed to remove syslog handler resource"
                ),
            }
        }

        if let Some(mut server) = self.server.take() {
            server.shutdown();
        }
        Ok(())
    }

    fn handler_address(&self) -> PathAddress {
        syslog_handler_address(&self.config.handler_name)
    }

    fn handler_reference_address(&self) -> PathAddress {
        logger_handler_reference_address(&self.config.handler_name)
    }

    fn events(&mut self) -> Option<&mut dyn EventQueue> {
        self.queue.as_mut().map(|queue| queue as &mut dyn EventQueue)
    }
}
