//! # Collaborator Abstractions
//!
//! The connectivity manager never talks to hardware or to a wire protocol
//! directly. Everything below the reconciliation loop is reached through the
//! narrow traits in this module:
//!
//! - [`Radio`]: the wireless association layer.
//! - [`SessionClient`]: a non-blocking publish/subscribe client.
//! - [`AdminEndpoint`]: an optional management endpoint brought up with the link.
//! - [`Clock`]: the monotonic time source driving retry pacing and deferred tasks.
//!
//! All methods are synchronous and must return promptly: they are invoked from
//! inside a single cooperative `poll` call.

use embassy_net::Ipv4Address;
use embassy_time::Instant;

use crate::error::ConnectFailure;

/// The wireless radio driver or network stack.
pub trait Radio {
    /// Whether the station is currently associated and has an address.
    fn is_associated(&self) -> bool;

    /// Starts associating with the given network. Must not wait for completion.
    fn associate(&mut self, ssid: &str, password: &str);

    /// Drops the current association.
    fn disassociate(&mut self);

    /// The address assigned to the station, if any.
    fn local_address(&self) -> Option<Ipv4Address>;
}

/// Receiver for messages pumped out of the session client.
///
/// Passed to [`SessionClient::service`] and invoked synchronously for every
/// inbound publish processed during that call.
pub trait InboundSink {
    fn deliver(&mut self, topic: &str, payload: &[u8]);
}

/// A publish/subscribe client bound to a single broker.
pub trait SessionClient {
    /// The error type returned by wire-level operations.
    type Error: core::fmt::Debug;

    /// Whether the broker session is currently established.
    fn is_connected(&self) -> bool;

    /// Opens a session with the broker.
    ///
    /// On failure the client reports its state code, classified as a
    /// [`ConnectFailure`].
    fn connect(
        &mut self,
        client_id: &str,
        username: &str,
        password: &str,
    ) -> Result<(), ConnectFailure>;

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error>;

    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error>;

    fn unsubscribe(&mut self, topic: &str) -> Result<(), Self::Error>;

    /// Pumps pending I/O, handing every received message to `sink`.
    fn service(&mut self, sink: &mut dyn InboundSink);
}

/// An auxiliary management endpoint (for example an HTTP update server).
pub trait AdminEndpoint {
    /// Binds a name-resolution alias for the device.
    fn bind_alias(&mut self, name: &str);

    /// Starts listening on `port`, protected with basic access control.
    fn start(&mut self, port: u16, username: &str, password: &str);

    /// Announces the service on the local network.
    fn advertise(&mut self, service: &str, protocol: &str, port: u16);

    /// Handles pending requests. Called once per tick while the link is up.
    fn service(&mut self);
}

/// Placeholder used when no management endpoint is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAdminEndpoint;

impl AdminEndpoint for NoAdminEndpoint {
    fn bind_alias(&mut self, _name: &str) {}

    fn start(&mut self, _port: u16, _username: &str, _password: &str) {}

    fn advertise(&mut self, _service: &str, _protocol: &str, _port: u16) {}

    fn service(&mut self) {}
}

/// Monotonic time source.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Clock backed by the embassy time driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}
