//! Subscription registry: topic to handler mapping with fixed capacity.

use heapless::{String, Vec};

use super::traits::{Handler, MessageHandler};
use crate::config::MAX_TOPIC_LEN;
use crate::error::{Error, ErrorPlaceHolder};
use crate::util::owned_topic;

/// A single topic subscription.
pub struct Subscription {
    topic: String<MAX_TOPIC_LEN>,
    handler: Handler,
}

impl Subscription {
    pub fn topic(&self) -> &str {
        self.topic.as_str()
    }

    pub fn handler(&self) -> Handler {
        self.handler
    }
}

/// A fixed-capacity registry of subscriptions.
///
/// Entries are kept in insertion order. The registry owns the topic strings
/// (copies them on insert) and borrows handlers for `'static`. Topics are not
/// de-duplicated: subscribing twice to the same topic registers two entries,
/// and both receive every matching message.
///
/// # Example
///
/// ```ignore
/// let mut registry = SubscriptionRegistry::<8>::new();
/// registry.insert("device/cmd", &ON_COMMAND)?;
///
/// for sub in registry.matching("device/cmd") {
///     sub.handler().on_message("ON", &mut outbox);
/// }
/// ```
pub struct SubscriptionRegistry<const MAX_SUBSCRIPTIONS: usize> {
    entries: Vec<Subscription, MAX_SUBSCRIPTIONS>,
}

impl<const MAX_SUBSCRIPTIONS: usize> Default for SubscriptionRegistry<MAX_SUBSCRIPTIONS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const MAX_SUBSCRIPTIONS: usize> SubscriptionRegistry<MAX_SUBSCRIPTIONS> {
    /// Create a new empty registry.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a subscription.
    ///
    /// Fails with [`Error::TopicTooLong`] or [`Error::RegistryFull`] without
    /// touching existing entries.
    pub fn insert(&mut self, topic: &str, handler: Handler) -> Result<(), Error<ErrorPlaceHolder>> {
        if self.is_full() {
            return Err(Error::RegistryFull);
        }
        let topic = owned_topic(topic)?;
        self.entries
            .push(Subscription { topic, handler })
            .map_err(|_| Error::RegistryFull)
    }

    /// Remove the first subscription on `topic`, keeping the order of the rest.
    pub fn remove(&mut self, topic: &str) -> Result<Subscription, Error<ErrorPlaceHolder>> {
        let index = self
            .entries
            .iter()
            .position(|sub| sub.topic.as_str() == topic)
            .ok_or(Error::NotFound)?;
        Ok(self.entries.remove(index))
    }

    /// Whether at least one subscription exists on `topic`.
    pub fn contains(&self, topic: &str) -> bool {
        self.entries.iter().any(|sub| sub.topic.as_str() == topic)
    }

    /// Whether `handler` itself is already subscribed to `topic`.
    ///
    /// Handlers are compared by address, so two distinct closures with the
    /// same body are different handlers.
    pub fn contains_handler(&self, topic: &str, handler: Handler) -> bool {
        self.matching(topic).any(|sub| {
            core::ptr::addr_eq(
                sub.handler as *const dyn MessageHandler,
                handler as *const dyn MessageHandler,
            )
        })
    }

    /// Subscriptions whose topic equals `topic` exactly, in registry order.
    pub fn matching<'s>(&'s self, topic: &'s str) -> impl Iterator<Item = &'s Subscription> + 's {
        self.entries.iter().filter(move |sub| sub.topic.as_str() == topic)
    }

    /// All subscriptions in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &Subscription> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() == MAX_SUBSCRIPTIONS
    }

    /// Drop every subscription.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
