//! System-log test harness
//!
//! A UDP listener decodes incoming syslog datagrams and hands them to the
//! consumer through a bounded queue. The queue is reached only through the
//! [`EventQueue`] trait, and every listener owns its own queue, so parallel
//! runs never see each other's events.

pub mod decoder;
pub mod encoder;
pub mod server;

pub use decoder::{decode, DecodeError};
pub use encoder::{encode_rfc5424, EmitMessage};
pub use server::SyslogServer;

use async_trait::async_trait;
use bytes::Bytes;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::mpsc;

/// One received syslog event with its envelope already parsed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyslogEvent {
    pub facility: u8,
    pub severity: u8,
    /// Protocol version; `None` for RFC 3164 messages
    pub version: Option<u8>,
    pub timestamp: Option<String>,
    pub hostname: Option<String>,
    pub app_name: Option<String>,
    pub proc_id: Option<String>,
    pub msg_id: Option<String>,
    pub structured_data: Option<String>,
    /// Message part with the syslog envelope removed
    pub message: Option<String>,
    /// Datagram exactly as received
    pub raw: Bytes,
    /// Sender of the datagram
    pub peer: Option<SocketAddr>,
}

/// Consumer side of a received-event queue
#[async_trait]
pub trait EventQueue: Send {
    /// Wait at most `timeout` for the next event
    async fn poll(&mut self, timeout: Duration) -> Option<SyslogEvent>;

    /// Drop every event currently queued, returning how many were dropped
    fn clear(&mut self) -> usize;
}

/// Bounded queue fed by a [`SyslogServer`]
#[derive(Debug)]
pub struct SyslogEventQueue {
    receiver: mpsc::Receiver<SyslogEvent>,
}

impl SyslogEventQueue {
    pub(crate) fn new(receiver: mpsc::Receiver<SyslogEvent>) -> Self {
        Self { receiver }
    }

    /// Create a detached queue and the sender that feeds it
    pub fn channel(capacity: usize) -> (mpsc::Sender<SyslogEvent>, Self) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (sender, Self::new(receiver))
    }
}

#[async_trait]
impl EventQueue for SyslogEventQueue {
    async fn poll(&mut self, timeout: Duration) -> Option<SyslogEvent> {
        tokio::time::timeout(timeout, self.receiver.recv())
            .await
            .ok()
            .flatten()
    }

    fn clear(&mut self) -> usize {
        let mut dropped = 0;
        while self.receiver.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            tracing::debug!(dropped, "Drained syslog event queue");
        }
        dropped
    }
}
