//! Connection configuration and compile-time limits.
//!
//! All credentials are borrowed `'static` strings: on embedded targets they are
//! typically baked into flash or leaked once at startup, and they never change
//! for the lifetime of the process.

use embassy_time::Duration;

/// Maximum length for a single topic string.
pub const MAX_TOPIC_LEN: usize = 128;

/// Size of the inbound payload text buffer.
///
/// One slot is reserved for the terminator, so at most `MAX_PAYLOAD_SIZE - 1`
/// bytes of a payload reach the handlers.
pub const MAX_PAYLOAD_SIZE: usize = 512;

/// Default number of operations message handlers may queue during one
/// `service` pass of the session client.
pub const DEFAULT_OUTBOX_DEPTH: usize = 8;

/// Maximum payload size of a publish queued from a message handler.
///
/// Matches the inbound text limit, so a handler can always echo what it got.
pub const OUTBOX_PAYLOAD_SIZE: usize = MAX_PAYLOAD_SIZE;

/// Default number of subscription slots.
pub const DEFAULT_MAX_SUBSCRIPTIONS: usize = 10;

/// Default number of deferred task slots.
pub const DEFAULT_MAX_TASKS: usize = 10;

/// Default minimum interval between two broker connection attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Port of the auxiliary management endpoint.
pub const ADMIN_PORT: u16 = 80;

/// Service name advertised for the management endpoint.
pub const ADMIN_SERVICE: &str = "http";

/// Protocol advertised for the management endpoint.
pub const ADMIN_PROTOCOL: &str = "tcp";

/// Credentials used to associate with the wireless network.
#[derive(Debug, Clone, Copy)]
pub struct WifiCredentials {
    pub ssid: &'static str,
    pub password: &'static str,
}

impl WifiCredentials {
    pub const fn new(ssid: &'static str, password: &'static str) -> Self {
        Self { ssid, password }
    }
}

/// Broker address and session identity.
#[derive(Debug, Clone, Copy)]
pub struct BrokerConfig {
    pub host: &'static str,
    pub port: u16,
    pub username: &'static str,
    pub password: &'static str,
    pub client_id: &'static str,
}

impl BrokerConfig {
    pub const fn new(host: &'static str, port: u16, client_id: &'static str) -> Self {
        Self {
            host,
            port,
            username: "",
            password: "",
            client_id,
        }
    }

    pub const fn with_auth(mut self, username: &'static str, password: &'static str) -> Self {
        self.username = username;
        self.password = password;
        self
    }
}

/// What happens to the subscription registry when the broker session drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResubscribePolicy {
    /// Empty the registry. The application subscribes again from its
    /// connection callback.
    #[default]
    Forget,
    /// Keep the registry and re-issue every subscription on the wire as soon
    /// as the session is back, before the connection callback runs.
    Replay,
}

/// Full configuration of a [`ConnectionManager`](crate::ConnectionManager).
#[derive(Debug, Clone, Copy)]
pub struct ConnectionConfig {
    pub wifi: WifiCredentials,
    pub broker: BrokerConfig,
    /// Minimum interval between two broker connection attempts.
    pub retry_delay: Duration,
    /// Re-issue the association request if the link is still down after this
    /// long. `None` keeps link retries purely edge-triggered.
    pub link_attempt_timeout: Option<Duration>,
    pub resubscribe: ResubscribePolicy,
    /// Start the auxiliary management endpoint on every link-up edge.
    pub admin_endpoint: bool,
    /// Emit diagnostic lines through the enabled logging backend.
    pub diagnostics: bool,
}

impl ConnectionConfig {
    pub const fn new(wifi: WifiCredentials, broker: BrokerConfig) -> Self {
        Self {
            wifi,
            broker,
            retry_delay: DEFAULT_RETRY_DELAY,
            link_attempt_timeout: None,
            resubscribe: ResubscribePolicy::Forget,
            admin_endpoint: false,
            diagnostics: false,
        }
    }

    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub const fn with_link_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.link_attempt_timeout = Some(timeout);
        self
    }

    pub const fn with_resubscribe(mut self, policy: ResubscribePolicy) -> Self {
        self.resubscribe = policy;
        self
    }

    pub const fn with_admin_endpoint(mut self, enabled: bool) -> Self {
        self.admin_endpoint = enabled;
        self
    }

    pub const fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }
}
