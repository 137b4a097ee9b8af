//! Server lifecycle and management client seams
//!
//! The verification pipeline drives an application server through two
//! collaborators: a [`ServerController`] that starts and stops it, and a
//! [`ManagementClient`] that executes management operations against it.
//! [`embedded::EmbeddedServer`] implements both in-process.

pub mod audit_logger;
pub mod embedded;
pub mod resource_tree;

pub use embedded::{EmbeddedServer, ServerMode};

use async_trait::async_trait;
use std::ops::Deref;
use std::sync::Arc;

use crate::error::{HarnessError, HarnessResult};
use crate::model::operation::{operation_address, operation_name};
use crate::model::{ModelNode, OperationResult};

/// Executes management requests against a running server
#[async_trait]
pub trait ManagementClient: Send + Sync {
    /// Execute one operation; a non-success outcome is returned, not raised
    async fn execute(&self, operation: &ModelNode) -> HarnessResult<OperationResult>;

    /// Release the client's connection
    fn close(&self) {}
}

/// Starts and stops the server under test
#[async_trait]
pub trait ServerController: Send + Sync {
    async fn start(&self) -> HarnessResult<()>;

    async fn stop(&self) -> HarnessResult<()>;

    fn is_started(&self) -> bool;

    /// Obtain a management client for the server
    fn client(&self) -> HarnessResult<Arc<dyn ManagementClient>>;
}

/// Execute `operation` and fail unless its outcome is `success`
///
/// Returns the operation's `result` on success.
pub async fn apply_update(
    client: &dyn ManagementClient,
    operation: &ModelNode,
) -> HarnessResult<ModelNode> {
    let result = client.execute(operation).await?;
    if !result.is_success() {
        return Err(HarnessError::Management {
            operation: describe_operation(operation),
            description: result.failure_description(),
        });
    }
    Ok(result.result().clone())
}

/// `<address>:<operation>` rendering for diagnostics
pub fn describe_operation(operation: &ModelNode) -> String {
    let address = operation_address(operation)
        .map(|a| a.to_string())
        .unwrap_or_else(|| "?".to_string());
    format!("{}:{}", address, operation_name(operation))
}

/// Management client that is closed when the handle is dropped
pub struct ScopedClient {
    inner: Arc<dyn ManagementClient>,
}

impl ScopedClient {
    pub fn new(inner: Arc<dyn ManagementClient>) -> Self {
        Self { inner }
    }
}

impl Deref for ScopedClient {
    type Target = dyn ManagementClient;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl Drop for ScopedClient {
    fn drop(&mut self) {
        self.inner.close();
        tracing::debug!("Management client closed");
    }
}
