//! # Connectivity Manager for Embedded Devices
//!
//! `myrtio-connectivity` keeps a device's Wi-Fi link and its MQTT broker session
//! alive, and gives application code a small publish/subscribe and deferred
//! execution API on top of them.
//!
//! ## Core Features
//!
//! - **`no_std` & `no_alloc`:** Every table has a fixed, compile-time capacity and
//!   is backed by `heapless`. Nothing is allocated after construction.
//! - **Non-blocking:** All work happens inside [`ConnectionManager::poll`], which
//!   never waits on the network. Call it from a superloop or let
//!   [`ConnectionManager::run`] drive it from an Embassy `Ticker`.
//! - **Self-healing:** Link drops trigger a fresh association request, broker
//!   sessions are re-established with a fixed retry delay, and subscriptions
//!   are either forgotten or replayed depending on [`ResubscribePolicy`].
//! - **Driver Agnostic:** The radio, the session client and the optional
//!   management endpoint are plain traits ([`Radio`], [`SessionClient`],
//!   [`AdminEndpoint`]), so the manager runs over any network stack.
//!
//! ## Architecture
//!
//! ```text
//! ConnectionManager::poll
//!   ├─ LinkManager      (association, management endpoint)
//!   ├─ SessionManager   (connect, retry pacing, inbound dispatch)
//!   │    └─ Dispatcher → SubscriptionRegistry → MessageHandler
//!   └─ TaskQueue        (one-shot deferred tasks)
//! ```
//!
//! Handlers never get direct access to the manager while the registry is being
//! scanned. They act through an [`Outbox`], and their requests are applied
//! right after dispatch.
//!
//! ```ignore
//! static ON_CMD: fn(&str, &mut dyn Outbox) = |payload, outbox| {
//!     let _ = outbox.publish("device/light/state", payload.as_bytes(), true);
//! };
//!
//! manager.subscribe("device/light/cmd", &ON_CMD)?;
//! loop {
//!     manager.poll();
//! }
//! ```
//!
//! ## Diagnostics
//!
//! Pick one of the `log`, `defmt` or `esp32-log` features to route the
//! manager's diagnostic lines to a backend. Output is also gated at runtime by
//! [`ConnectionConfig::diagnostics`].

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod config;
pub mod error;
pub mod link;
pub mod manager;
pub mod runtime;
pub mod session;
pub mod shared;
pub mod state;
pub mod transport;
pub mod util;

#[cfg(test)]
mod testing;

// Re-export key types for easier access at the crate root.
pub use config::{BrokerConfig, ConnectionConfig, ResubscribePolicy, WifiCredentials};
pub use error::{ConnectFailure, Error};
pub use manager::ConnectionManager;
pub use runtime::{ConnectionHandler, DeferredTask, Handler, MessageHandler, Outbox, Task};
pub use shared::SharedConnectionManager;
pub use state::{ConnectionState, LinkPhase};
pub use transport::{
    AdminEndpoint, Clock, InboundSink, NoAdminEndpoint, Radio, SessionClient, SystemClock,
};
