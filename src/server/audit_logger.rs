//! Audit logging of the embedded server
//!
//! The logger settings and handler targets are resolved from the resource
//! tree before every emission, so configuration changes take effect on the
//! very next operation. Emission is best-effort: a failing handler is logged
//! and the management request still completes.

use chrono::Local;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::net::UdpSocket;
use uuid::Uuid;

use super::resource_tree::ResourceTree;
use crate::audit::format_record;
use crate::constants::{
    AUDIT_RECORD_TYPE, DEFAULT_USER, ENABLED, HANDLER, LOG_BOOT, LOG_READ_ONLY, NATIVE_ACCESS,
    PROTOCOL, UDP,
};
use crate::model::address::{
    audit_logger_address, file_handler_address, local_authentication_address,
    syslog_handler_address,
};
use crate::model::ModelNode;
use crate::syslog::encoder::{encode_rfc5424, local_hostname, EmitMessage};

/// Remote address recorded for in-process management requests
pub const LOCAL_REMOTE_ADDRESS: &str = "127.0.0.1/127.0.0.1";

/// Where one audit handler writes its records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerTarget {
    File {
        name: String,
        path: PathBuf,
    },
    Syslog {
        name: String,
        host: String,
        port: u16,
        app_name: Option<String>,
    },
}

impl HandlerTarget {
    pub fn name(&self) -> &str {
        match self {
            HandlerTarget::File { name, .. } | HandlerTarget::Syslog { name, .. } => name,
        }
    }
}

/// Resolve a handler `path` against its `relative-to` path variable
fn resolve_path(home: &Path, relative_to: Option<&str>, path: &str) -> PathBuf {
    let base = match relative_to {
        Some("jboss.server.data.dir") => home.join("standalone").join("data"),
        Some("jboss.server.log.dir") => home.join("standalone").join("log"),
        Some("jboss.server.base.dir") => home.join("standalone"),
        Some("jboss.home.dir") => home.to_path_buf(),
        Some(other) => {
            tracing::warn!(relative_to = other, "Unknown path variable, using server home");
            home.to_path_buf()
        }
        None => return PathBuf::from(path),
    };
    base.join(path)
}

/// Snapshot of the audit-log logger configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogSettings {
    pub enabled: bool,
    pub log_boot: bool,
    pub log_read_only: bool,
    /// Default user of the local authentication mechanism
    pub user: String,
    pub targets: Vec<HandlerTarget>,
}

impl AuditLogSettings {
    pub fn from_tree(tree: &ResourceTree, home: &Path) -> Self {
        let logger = audit_logger_address();
        let flag = |name: &str| tree.attribute(&logger, name).as_bool().unwrap_or(false);

        let targets = tree
            .children(&logger, HANDLER)
            .into_iter()
            .filter_map(|name| Self::resolve_target(tree, home, name))
            .collect();

        Self {
            enabled: flag(ENABLED),
            log_boot: flag(LOG_BOOT),
            log_read_only: flag(LOG_READ_ONLY),
            user: tree
                .attribute(&local_authentication_address(), DEFAULT_USER)
                .as_string(),
            targets,
        }
    }

    fn resolve_target(tree: &ResourceTree, home: &Path, name: String) -> Option<HandlerTarget> {
        let file = file_handler_address(&name);
        if tree.contains(&file) {
            let relative_to = tree.attribute(&file, "relative-to");
            let path = resolve_path(
                home,
                relative_to.as_str(),
                &tree.attribute(&file, "path").as_string(),
            );
            return Some(HandlerTarget::File { name, path });
        }

        let syslog = syslog_handler_address(&name);
        let udp = syslog.append(PROTOCOL, UDP);
        if tree.contains(&udp) {
            let port = match tree.attribute(&udp, "port") {
                ModelNode::Int(p) => u16::try_from(*p).ok()?,
                other => other.as_string().parse().ok()?,
            };
            return Some(HandlerTarget::Syslog {
                host: tree.attribute(&udp, "host").as_string(),
                port,
                app_name: tree.attribute(&syslog, "app-name").as_str().map(str::to_string),
                name,
            });
        }

        // A syslog handler without a protocol, or with a protocol this
        // server does not speak, has nowhere to write.
        if tree.contains(&syslog) {
            tracing::warn!(handler = %name, "Syslog handler has no UDP protocol, skipping");
        }
        None
    }

    /// Whether an operation of the given kind produces a record
    pub fn should_log(&self, read_only: bool, booting: bool) -> bool {
        self.enabled && (!booting || self.log_boot) && (!read_only || self.log_read_only)
    }
}

/// Per-request facts recorded alongside the operations
#[derive(Debug, Clone)]
pub struct RecordContext<'a> {
    pub user: &'a str,
    pub read_only: bool,
    pub booting: bool,
    pub success: bool,
    pub domain_uuid: Option<Uuid>,
}

/// Build one audit record in the server's field order
pub fn build_record(ctx: &RecordContext<'_>, ops: Vec<ModelNode>) -> ModelNode {
    ModelNode::object()
        .with("type", AUDIT_RECORD_TYPE)
        .with("r/o", ctx.read_only)
        .with("booting", ctx.booting)
        .with("version", env!("CARGO_PKG_VERSION"))
        .with("user", ctx.user)
        .with(
            "domainUUID",
            ctx.domain_uuid
                .map(|u| ModelNode::from(u.to_string()))
                .unwrap_or_default(),
        )
        .with("access", NATIVE_ACCESS)
        .with("remote-address", LOCAL_REMOTE_ADDRESS)
        .with("success", ctx.success)
        .with("ops", ops)
}

/// Write `record` to every target, logging failures
pub async fn emit(targets: &[HandlerTarget], record: &ModelNode) {
    let timestamp = Local::now().naive_local();
    for target in targets {
        let result = match target {
            HandlerTarget::File { path, .. } => {
                let line = format!("{}\n", format_record(timestamp, record, true));
                append_to_file(path, &line).await
            }
            HandlerTarget::Syslog {
                host,
                port,
                app_name,
                ..
            } => {
                let message = format_record(timestamp, record, false);
                send_datagram(host, *port, app_name.as_deref(), &message).await
            }
        };

        match result {
            Ok(()) => tracing::debug!(handler = target.name(), "Audit record written"),
            Err(e) => tracing::warn!(
                handler = target.name(),
                error = %e,
                "Failed to write audit record"
            ),
        }
    }
}

async fn append_to_file(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}

async fn send_datagram(
    host: &str,
    port: u16,
    app_name: Option<&str>,
    message: &str,
) -> std::io::Result<()> {
    let destination = tokio::net::lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("No address found for {}:{}", host, port),
            )
        })?;

    let bind: SocketAddr = if destination.is_ipv4() {
        SocketAddr::from(([0, 0, 0, 0], 0))
    } else {
        SocketAddr::from(([0u16; 8], 0))
    };
    let socket = UdpSocket::bind(bind).await?;

    let hostname = local_hostname();
    let mut emit = EmitMessage::new(message);
    emit.hostname = Some(hostname.as_str());
    emit.app_name = app_name;
    let datagram = encode_rfc5424(&emit);

    socket.send_to(&datagram, destination).await?;
    Ok(())
}
