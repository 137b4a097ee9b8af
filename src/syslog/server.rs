//! UDP syslog listener
//!
//! Runs on a background tokio task, decodes each datagram and pushes it into
//! a bounded queue. When the queue is full the datagram is dropped and logged.

use bytes::Bytes;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{decoder, SyslogEvent, SyslogEventQueue};
use crate::constants::MAX_DATAGRAM_SIZE;
use crate::error::{HarnessError, HarnessResult};

/// Handle of a running UDP syslog listener
///
/// The listener task is stopped when the handle is shut down or dropped.
#[derive(Debug)]
pub struct SyslogServer {
    local_addr: SocketAddr,
    task: Option<JoinHandle<()>>,
}

impl SyslogServer {
    /// Bind a UDP listener and return it together with its event queue
    ///
    /// # Arguments
    /// * `addr` - Address to bind to; port 0 picks an ephemeral port
    /// * `capacity` - Queue capacity, raised to 1 if zero
    pub async fn bind(addr: SocketAddr, capacity: usize) -> HarnessResult<(Self, SyslogEventQueue)> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| HarnessError::Syslog(format!("Failed to bind {}: {}", addr, e)))?;
        let local_addr = socket.local_addr()?;
        let (sender, queue) = SyslogEventQueue::channel(capacity);

        tracing::info!(addr = %addr, local = %local_addr, capacity, "UDP syslog listener started");

        let task = tokio::spawn(receive_loop(socket, sender));
        Ok((
            Self {
                local_addr,
                task: Some(task),
            },
            queue,
        ))
    }

    /// Address the listener actually bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the listener; queued events stay readable
    pub fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::info!(local = %self.local_addr, "UDP syslog listener stopped");
        }
    }
}

impl Drop for SyslogServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn receive_loop(socket: UdpSocket, sender: mpsc::Sender<SyslogEvent>) {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    let mut first_seen_logged = false;

    loop {
        let (len, peer) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                tracing::warn!(error = %e, "UDP syslog receive failed");
                continue;
            }
        };

        if !first_seen_logged {
            tracing::info!(peer = %peer, "UDP syslog listener received first packet");
            first_seen_logged = true;
        }

        let mut event = match decoder::decode(Bytes::copy_from_slice(&buf[..len])) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(peer = %peer, error = %e, "Dropping undecodable syslog datagram");
                continue;
            }
        };
        event.peer = Some(peer);

        match sender.try_send(event) {
            Ok(()) => tracing::debug!(peer = %peer, bytes = len, "Queued syslog event"),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(peer = %peer, "Syslog event queue full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("Syslog event queue closed, stopping listener");
                return;
            }
        }
    }
}
