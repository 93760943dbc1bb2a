//! Application-facing runtime pieces.
//!
//! # Overview
//!
//! The runtime holds everything application code plugs into:
//! - The subscription registry, mapping exact topics to message handlers
//! - The dispatcher, routing inbound messages to those handlers
//! - The deferred task queue, running one-shot actions once they are due
//! - The handler traits and the [`Outbox`] through which handlers act
//!
//! # Object-Safe Design
//!
//! Handlers are stored as `&'static dyn` trait objects in fixed-capacity
//! `heapless` containers, so nothing is allocated after startup. On embedded
//! targets handlers typically live in `static` items or a `StaticCell`.
//!
//! # Re-entrancy
//!
//! Message handlers run synchronously inside the session client's `service`
//! call, while the registry is being scanned. Their requests go to a bounded
//! buffer and are applied after the scan.

pub(crate) mod dispatcher;
pub(crate) mod outbox;
pub(crate) mod registry;
pub(crate) mod scheduler;
pub(crate) mod traits;

pub(crate) use dispatcher::Dispatcher;
pub(crate) use outbox::{PendingOp, PendingOps};
pub use registry::{Subscription, SubscriptionRegistry};
pub use scheduler::TaskQueue;
pub use traits::{
    ConnectionHandler, DeferredTask, Handler, MessageHandler, Outbox, OutboxResult, Task,
};
