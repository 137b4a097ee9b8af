//! In-process standalone server
//!
//! [`EmbeddedServer`] keeps a management resource tree behind a lock and
//! audits every management request the way a standalone server does. The
//! lock is released before any record is written, so handler I/O never
//! blocks other clients.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use super::audit_logger::{build_record, emit, AuditLogSettings, RecordContext};
use super::resource_tree::{is_read_only, ResourceTree};
use super::{describe_operation, ManagementClient, ServerController};
use crate::error::{HarnessError, HarnessResult};
use crate::model::operation::operation_name;
use crate::model::{ModelNode, OperationResult};

/// How the server was launched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerMode {
    #[default]
    Standalone,
    /// Managed by a domain controller with the given domain UUID
    Domain(Uuid),
}

impl ServerMode {
    pub fn domain_uuid(&self) -> Option<Uuid> {
        match self {
            ServerMode::Standalone => None,
            ServerMode::Domain(uuid) => Some(*uuid),
        }
    }
}

#[derive(Debug)]
struct ServerState {
    tree: ResourceTree,
    running: bool,
}

/// Records to write once the state lock has been released
struct PendingRecord {
    settings: AuditLogSettings,
    record: ModelNode,
}

impl PendingRecord {
    async fn write(self) {
        emit(&self.settings.targets, &self.record).await;
    }
}

/// Standalone server running inside the harness process
///
/// Configuration survives restarts; only the running flag is reset by
/// [`ServerController::stop`].
#[derive(Debug, Clone)]
pub struct EmbeddedServer {
    home: PathBuf,
    mode: ServerMode,
    state: Arc<Mutex<ServerState>>,
}

impl EmbeddedServer {
    /// Stopped standalone server with the default configuration
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self::with_mode(home, ServerMode::Standalone)
    }

    pub fn with_mode(home: impl Into<PathBuf>, mode: ServerMode) -> Self {
        Self {
            home: home.into(),
            mode,
            state: Arc::new(Mutex::new(ServerState {
                tree: ResourceTree::standalone_defaults(),
                running: false,
            })),
        }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn mode(&self) -> ServerMode {
        self.mode
    }

    /// Copy of the current management model
    pub fn tree(&self) -> ResourceTree {
        self.state.lock().tree.clone()
    }
}

#[async_trait]
impl ServerController for EmbeddedServer {
    async fn start(&self) -> HarnessResult<()> {
        let boot = {
            let mut state = self.state.lock();
            if state.running {
                tracing::debug!("Server already running");
                return Ok(());
            }
            state.running = true;
            let settings = AuditLogSettings::from_tree(&state.tree, &self.home);
            if settings.should_log(false, true) {
                let ctx = RecordContext {
                    user: &settings.user,
                    read_only: false,
                    booting: true,
                    success: true,
                    domain_uuid: self.mode.domain_uuid(),
                };
                let record = build_record(&ctx, state.tree.boot_operations());
                Some(PendingRecord { settings, record })
            } else {
                None
            }
        };

        if let Some(boot) = boot {
            boot.write().await;
        }

        tracing::info!(home = %self.home.display(), mode = ?self.mode, "Server started");
        Ok(())
    }

    async fn stop(&self) -> HarnessResult<()> {
        let mut state = self.state.lock();
        if state.running {
            state.running = false;
            tracing::info!(home = %self.home.display(), "Server stopped");
        }
        Ok(())
    }

    fn is_started(&self) -> bool {
        self.state.lock().running
    }

    fn client(&self) -> HarnessResult<Arc<dyn ManagementClient>> {
        Ok(Arc::new(EmbeddedClient {
            server: self.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

/// Management client bound to an [`EmbeddedServer`]
#[derive(Debug)]
pub struct EmbeddedClient {
    server: EmbeddedServer,
    closed: AtomicBool,
}

impl EmbeddedClient {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ManagementClient for EmbeddedClient {
    async fn execute(&self, operation: &ModelNode) -> HarnessResult<OperationResult> {
        if self.is_closed() {
            return Err(HarnessError::Server("Management client is closed".to_string()));
        }

        let (result, pending) = {
            let mut state = self.server.state.lock();
            if !state.running {
                return Err(HarnessError::Server(format!(
                    "Cannot execute {}: server is not running",
                    describe_operation(operation)
                )));
            }

            let result = state.tree.execute(operation);
            let settings = AuditLogSettings::from_tree(&state.tree, &self.server.home);
            let read_only = is_read_only(&operation_name(operation));

            let pending = settings.should_log(read_only, false).then(|| {
                let ctx = RecordContext {
                    user: &settings.user,
                    read_only,
                    booting: false,
                    success: result.is_success(),
                    domain_uuid: self.server.mode.domain_uuid(),
                };
                let record = build_record(&ctx, vec![operation.clone()]);
                PendingRecord { settings: settings.clone(), record }
            });
            (result, pending)
        };

        tracing::debug!(
            operation = %describe_operation(operation),
            outcome = %result.outcome(),
            "Executed management operation"
        );

        if let Some(pending) = pending {
            pending.write().await;
        }
        Ok(result)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
