//! # Error Types
//!
//! This module defines the errors surfaced to application code and the
//! classification of failed broker connection attempts.
//!
//! Connectivity failures are never returned to the caller: they are recovered
//! by the retry pacing in the link and session managers and only reported as
//! diagnostics. What the application does see are rejected operations, such as
//! a full subscription registry or an unknown topic passed to `unsubscribe`.

/// Stand-in for the session error type in code that cannot know it.
///
/// Handler-facing code (the [`Outbox`](crate::runtime::Outbox) trait) has no
/// access to the concrete session client, so it reports errors as
/// `Error<ErrorPlaceHolder>`. The type is uninhabited, which makes
/// [`Error::cast_session_error`] total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPlaceHolder {}

#[cfg(feature = "defmt")]
impl defmt::Format for ErrorPlaceHolder {
    fn format(&self, _fmt: defmt::Formatter) {
        match *self {}
    }
}

/// The primary error enum of the connectivity manager.
///
/// It is generic over the session client error type `E`, so failures reported
/// by the underlying publish/subscribe client can be passed through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The session client rejected a wire-level operation.
    Session(E),
    /// The broker session is not established.
    NotConnected,
    /// The subscription registry has no free slot.
    RegistryFull,
    /// The deferred task queue has no free slot.
    QueueFull,
    /// Too many operations were queued from inside a message handler.
    OutboxFull,
    /// The topic does not fit in [`MAX_TOPIC_LEN`](crate::config::MAX_TOPIC_LEN) bytes.
    TopicTooLong,
    /// The payload does not fit in the bounded outbox storage.
    PayloadTooLarge,
    /// No subscription exists for the requested topic.
    NotFound,
}

impl<E> From<E> for Error<E> {
    fn from(err: E) -> Self {
        Error::Session(err)
    }
}

impl<E> Error<E> {
    /// Converts an error raised by handler-facing code into an error carrying
    /// the concrete session error type.
    pub fn cast_session_error(other: Error<ErrorPlaceHolder>) -> Error<E> {
        match other {
            Error::Session(never) => match never {},
            Error::NotConnected => Error::NotConnected,
            Error::RegistryFull => Error::RegistryFull,
            Error::QueueFull => Error::QueueFull,
            Error::OutboxFull => Error::OutboxFull,
            Error::TopicTooLong => Error::TopicTooLong,
            Error::PayloadTooLarge => Error::PayloadTooLarge,
            Error::NotFound => Error::NotFound,
        }
    }

    /// Drops the session error payload, keeping only the error category.
    pub(crate) fn erase(self) -> Error<ErrorPlaceHolder> {
        match self {
            // Handlers only learn that the wire operation did not go through.
            Error::Session(_) => Error::NotConnected,
            Error::NotConnected => Error::NotConnected,
            Error::RegistryFull => Error::RegistryFull,
            Error::QueueFull => Error::QueueFull,
            Error::OutboxFull => Error::OutboxFull,
            Error::TopicTooLong => Error::TopicTooLong,
            Error::PayloadTooLarge => Error::PayloadTooLarge,
            Error::NotFound => Error::NotFound,
        }
    }
}

/// Classification of a failed broker connection attempt.
///
/// Built from the signed state code reported by the session client after a
/// refused or aborted `connect`. Negative codes describe transport-level
/// failures, positive codes mirror the broker's `CONNACK` refusal reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectFailure {
    /// The broker did not answer in time.
    Timeout,
    /// The network connection dropped during the handshake.
    ConnectionLost,
    /// The network connection could not be opened.
    ConnectFailed,
    /// The client was disconnected cleanly.
    Disconnected,
    /// The broker does not support the requested protocol version.
    ProtocolMismatch,
    /// The broker rejected the client identifier.
    IdentifierRejected,
    /// The broker is unavailable.
    ServerUnavailable,
    /// The username or password is malformed.
    BadCredentials,
    /// The client is not authorized to connect.
    Unauthorized,
    /// Any code outside the known range.
    Other(i8),
}

impl From<i8> for ConnectFailure {
    fn from(code: i8) -> Self {
        match code {
            -4 => Self::Timeout,
            -3 => Self::ConnectionLost,
            -2 => Self::ConnectFailed,
            -1 => Self::Disconnected,
            1 => Self::ProtocolMismatch,
            2 => Self::IdentifierRejected,
            3 => Self::ServerUnavailable,
            4 => Self::BadCredentials,
            5 => Self::Unauthorized,
            _ => Self::Other(code),
        }
    }
}

impl ConnectFailure {
    /// Short human readable description used in diagnostics.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "connection timeout",
            Self::ConnectionLost => "connection lost",
            Self::ConnectFailed => "connect failed",
            Self::Disconnected => "disconnected",
            Self::ProtocolMismatch => "protocol mismatch",
            Self::IdentifierRejected => "client identifier rejected",
            Self::ServerUnavailable => "server unavailable",
            Self::BadCredentials => "bad credentials",
            Self::Unauthorized => "not authorized",
            Self::Other(_) => "unknown failure",
        }
    }
}
