// Datagram sink reader

use std::time::Duration;

use super::framing::{parse_record, strip_timestamp_prefix};
use crate::error::{HarnessError, HarnessResult};
use crate::model::ModelNode;
use crate::syslog::EventQueue;

/// Reads one audit record from a syslog event queue
pub struct DatagramSinkReader<'q, Q: EventQueue + ?Sized> {
    queue: &'q mut Q,
}

impl<'q, Q: EventQueue + ?Sized> DatagramSinkReader<'q, Q> {
    pub fn new(queue: &'q mut Q) -> Self {
        Self { queue }
    }

    /// Wait at most `timeout` for one event and parse its message as a record
    ///
    /// An event arriving after the timeout is not considered, even if a later
    /// poll would have returned it.
    pub async fn await_one(&mut self, timeout: Duration) -> HarnessResult<ModelNode> {
        let event = self
            .queue
            .poll(timeout)
            .await
            .ok_or(HarnessError::Timeout)?;

        let message = event.message.ok_or(HarnessError::EmptyMessage)?;
        tracing::debug!(
            peer = ?event.peer,
            app_name = ?event.app_name,
            bytes = message.len(),
            "Received audit datagram"
        );

        parse_record(&strip_timestamp_prefix(&message))
    }
}
