//! Inbound message dispatch.

use super::outbox::PendingOps;
use super::registry::SubscriptionRegistry;
use crate::config::MAX_PAYLOAD_SIZE;
use crate::transport::InboundSink;
use crate::util::decode_payload;

/// Routes messages delivered by the session client to registered handlers.
///
/// The registry is borrowed immutably for the whole dispatch, and handlers act
/// through a [`PendingOps`] buffer. Subscribing or unsubscribing from inside a
/// handler therefore only takes effect once the current `service` call returns.
pub(crate) struct Dispatcher<'a, const MAX_SUBSCRIPTIONS: usize, const OUTBOX_DEPTH: usize> {
    registry: &'a SubscriptionRegistry<MAX_SUBSCRIPTIONS>,
    outbox: &'a mut PendingOps<OUTBOX_DEPTH>,
    diagnostics: bool,
}

impl<'a, const MAX_SUBSCRIPTIONS: usize, const OUTBOX_DEPTH: usize>
    Dispatcher<'a, MAX_SUBSCRIPTIONS, OUTBOX_DEPTH>
{
    pub fn new(
        registry: &'a SubscriptionRegistry<MAX_SUBSCRIPTIONS>,
        outbox: &'a mut PendingOps<OUTBOX_DEPTH>,
        diagnostics: bool,
    ) -> Self {
        Self {
            registry,
            outbox,
            diagnostics,
        }
    }
}

impl<const MAX_SUBSCRIPTIONS: usize, const OUTBOX_DEPTH: usize> InboundSink
    for Dispatcher<'_, MAX_SUBSCRIPTIONS, OUTBOX_DEPTH>
{
    fn deliver(&mut self, topic: &str, payload: &[u8]) {
        let text = decode_payload::<MAX_PAYLOAD_SIZE>(payload);
        info!(self.diagnostics, "mqtt: received [{}] {}", topic, text);

        for sub in self.registry.matching(topic) {
            sub.handler().on_message(text, self.outbox);
        }
    }
}
