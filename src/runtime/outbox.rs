//! Buffered outbox used while inbound messages are being dispatched.
//!
//! Message handlers run from inside the session client's `service` call, with
//! the subscription registry borrowed for the dispatch scan. Anything they
//! request is recorded here and applied by the manager once the scan is over.

use embassy_time::Duration;
use heapless::{Deque, String, Vec};

use super::traits::{Handler, Outbox, OutboxResult, Task};
use crate::config::{MAX_TOPIC_LEN, OUTBOX_PAYLOAD_SIZE};
use crate::error::Error;
use crate::util::{owned_payload, owned_topic};

/// An operation requested by a handler, with inline storage for its data.
pub(crate) enum PendingOp {
    Publish {
        topic: String<MAX_TOPIC_LEN>,
        payload: Vec<u8, OUTBOX_PAYLOAD_SIZE>,
        retain: bool,
    },
    Subscribe {
        topic: String<MAX_TOPIC_LEN>,
        handler: Handler,
    },
    Unsubscribe {
        topic: String<MAX_TOPIC_LEN>,
    },
    Schedule {
        delay: Duration,
        task: Task,
    },
}

/// A bounded FIFO of operations requested during dispatch.
///
/// Requests beyond `DEPTH` are rejected with [`Error::OutboxFull`]. Every
/// rejected request is counted so the manager can report it after the pass.
pub(crate) struct PendingOps<const DEPTH: usize> {
    ops: Deque<PendingOp, DEPTH>,
    rejected: usize,
}

impl<const DEPTH: usize> PendingOps<DEPTH> {
    pub const fn new() -> Self {
        Self {
            ops: Deque::new(),
            rejected: 0,
        }
    }

    /// Take the oldest queued operation.
    pub fn pop(&mut self) -> Option<PendingOp> {
        self.ops.pop_front()
    }

    /// Number of requests rejected since the last call, resetting the count.
    pub fn take_rejected(&mut self) -> usize {
        core::mem::take(&mut self.rejected)
    }

    fn push(&mut self, op: PendingOp) -> OutboxResult {
        self.ops.push_back(op).map_err(|_| Error::OutboxFull)
    }

    fn track(&mut self, result: OutboxResult) -> OutboxResult {
        if result.is_err() {
            self.rejected += 1;
        }
        result
    }
}

impl<const DEPTH: usize> Outbox for PendingOps<DEPTH> {
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> OutboxResult {
        let result = owned_topic(topic).and_then(|topic| {
            let payload = owned_payload(payload)?;
            self.push(PendingOp::Publish {
                topic,
                payload,
                retain,
            })
        });
        self.track(result)
    }

    fn subscribe(&mut self, topic: &str, handler: Handler) -> OutboxResult {
        let result = owned_topic(topic).and_then(|topic| self.push(PendingOp::Subscribe { topic, handler }));
        self.track(result)
    }

    fn unsubscribe(&mut self, topic: &str) -> OutboxResult {
        let result = owned_topic(topic).and_then(|topic| self.push(PendingOp::Unsubscribe { topic }));
        self.track(result)
    }

    fn execute_delayed(&mut self, delay: Duration, task: Task) -> OutboxResult {
        let result = self.push(PendingOp::Schedule { delay, task });
        self.track(result)
    }
}
