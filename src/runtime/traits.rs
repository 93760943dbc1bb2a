//! Handler traits and the outbox through which handlers act on the manager.
//!
//! Application code reacts to three kinds of events: an inbound message on a
//! subscribed topic, a deferred task becoming due, and the broker session being
//! (re)established. Each has an object-safe trait so handlers can be stored as
//! `&'static dyn` references in fixed-capacity registries without allocation.
//!
//! # Outbox Pattern
//!
//! Handlers never hold a reference to the manager. Instead every callback
//! receives a `&mut dyn Outbox` through which it can publish, subscribe,
//! unsubscribe or schedule more work. During message dispatch the outbox is a
//! bounded buffer applied after the dispatch pass, so a handler unsubscribing
//! its own topic cannot corrupt the scan in progress.
//!
//! Closures implement every handler trait through blanket implementations:
//!
//! ```ignore
//! static ON_LIGHT: fn(&str, &mut dyn Outbox) = |payload, outbox| {
//!     let state = if payload == "ON" { b"1" } else { b"0" };
//!     let _ = outbox.publish("device/light/state", state, true);
//! };
//!
//! manager.subscribe("device/light/cmd", &ON_LIGHT)?;
//! ```

use embassy_time::Duration;

use crate::error::{Error, ErrorPlaceHolder};

/// Result of an operation requested through an [`Outbox`].
pub type OutboxResult = Result<(), Error<ErrorPlaceHolder>>;

/// A registered message handler.
pub type Handler = &'static dyn MessageHandler;

/// A registered deferred task.
pub type Task = &'static dyn DeferredTask;

/// Object-safe access to the manager's application-facing operations.
///
/// Requests made while a message is being dispatched are queued and take
/// effect right after the dispatch pass, in the order they were made.
pub trait Outbox {
    /// Publish `payload` on `topic`.
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> OutboxResult;

    /// Subscribe `handler` to messages on `topic` (exact match).
    fn subscribe(&mut self, topic: &str, handler: Handler) -> OutboxResult;

    /// Remove the first subscription on `topic`.
    fn unsubscribe(&mut self, topic: &str) -> OutboxResult;

    /// Run `task` once, no earlier than `delay` from now.
    fn execute_delayed(&mut self, delay: Duration, task: Task) -> OutboxResult;
}

/// Receives the decoded text of messages on a subscribed topic.
///
/// The text holds at most `MAX_PAYLOAD_SIZE - 1` bytes and ends at the first
/// NUL byte. A payload that is not valid UTF-8 is cut before its first invalid
/// sequence, so binary payloads arrive truncated, possibly empty.
pub trait MessageHandler {
    /// Called synchronously for every inbound message whose topic equals the
    /// subscribed one. Must return promptly.
    fn on_message(&self, payload: &str, outbox: &mut dyn Outbox);
}

impl<F> MessageHandler for F
where
    F: Fn(&str, &mut dyn Outbox),
{
    fn on_message(&self, payload: &str, outbox: &mut dyn Outbox) {
        self(payload, outbox)
    }
}

/// A one-shot action run by the deferred task queue.
pub trait DeferredTask {
    fn run(&self, outbox: &mut dyn Outbox);
}

impl<F> DeferredTask for F
where
    F: Fn(&mut dyn Outbox),
{
    fn run(&self, outbox: &mut dyn Outbox) {
        self(outbox)
    }
}

/// Invoked once per session-established edge.
///
/// This is the hook where the application (re)issues its subscriptions.
pub trait ConnectionHandler {
    fn on_connected(&self, outbox: &mut dyn Outbox);
}

impl<F> ConnectionHandler for F
where
    F: Fn(&mut dyn Outbox),
{
    fn on_connected(&self, outbox: &mut dyn Outbox) {
        self(outbox)
    }
}
