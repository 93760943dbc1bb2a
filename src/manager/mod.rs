//! # Poll Orchestrator
//!
//! [`ConnectionManager`] is the single entry point of the crate. It owns the
//! connection state, both managers, the subscription registry and the deferred
//! task queue, and sequences them on every tick:
//!
//! 1. Reconcile the link layer (tearing the session down if the link dropped).
//! 2. While the link is up, service or re-establish the broker session, then
//!    service the management endpoint.
//! 3. Run every deferred task that is due, whatever the connectivity.
//!
//! ```ignore
//! static ON_CONNECTED: fn(&mut dyn Outbox) = |outbox| {
//!     let _ = outbox.subscribe("device/light/cmd", &ON_LIGHT);
//! };
//!
//! let config = ConnectionConfig::new(
//!     WifiCredentials::new("home", "secret"),
//!     BrokerConfig::new("192.168.1.2", 1883, "light-1").with_auth("user", "pass"),
//! )
//! .with_diagnostics(true);
//!
//! let mut manager: ConnectionManager<_, _> =
//!     ConnectionManager::new(config, radio, mqtt, SystemClock).on_connected(&ON_CONNECTED);
//! manager.run(Duration::from_millis(10)).await;
//! ```

use embassy_net::Ipv4Address;
use embassy_time::{Duration, Instant, Ticker};

use crate::config::{
    ConnectionConfig, DEFAULT_MAX_SUBSCRIPTIONS, DEFAULT_MAX_TASKS, DEFAULT_OUTBOX_DEPTH,
    MAX_PAYLOAD_SIZE, MAX_TOPIC_LEN,
};
use crate::error::Error;
use crate::link::{LinkManager, LinkTransition};
use crate::runtime::{
    ConnectionHandler, Handler, Outbox, OutboxResult, PendingOp, PendingOps,
    SubscriptionRegistry, Task, TaskQueue,
};
use crate::session::{SessionManager, SessionTransition};
use crate::state::{ConnectionState, LinkPhase};
use crate::transport::{AdminEndpoint, Clock, NoAdminEndpoint, Radio, SessionClient, SystemClock};
use crate::util::decode_payload;

/// Keeps the Wi-Fi link and the broker session alive and exposes a small
/// publish/subscribe and deferred-execution API.
///
/// # Type Parameters
///
/// - `R`: the [`Radio`] driving the wireless link
/// - `S`: the [`SessionClient`] talking to the broker
/// - `A`: the optional [`AdminEndpoint`]
/// - `C`: the [`Clock`] used for retry pacing and deferred tasks
/// - `MAX_SUBSCRIPTIONS`: capacity of the subscription registry
/// - `MAX_TASKS`: capacity of the deferred task queue
/// - `OUTBOX_DEPTH`: operations message handlers may request during one
///   `service` pass of the session client (a burst of inbound messages)
pub struct ConnectionManager<
    R,
    S,
    A = NoAdminEndpoint,
    C = SystemClock,
    const MAX_SUBSCRIPTIONS: usize = { DEFAULT_MAX_SUBSCRIPTIONS },
    const MAX_TASKS: usize = { DEFAULT_MAX_TASKS },
    const OUTBOX_DEPTH: usize = { DEFAULT_OUTBOX_DEPTH },
> {
    config: ConnectionConfig,
    state: ConnectionState,
    link: LinkManager<R, A>,
    session: SessionManager<S>,
    registry: SubscriptionRegistry<MAX_SUBSCRIPTIONS>,
    tasks: TaskQueue<MAX_TASKS>,
    pending: PendingOps<OUTBOX_DEPTH>,
    clock: C,
    on_connected: Option<&'static dyn ConnectionHandler>,
}

impl<R, S, C, const MAX_SUBSCRIPTIONS: usize, const MAX_TASKS: usize, const OUTBOX_DEPTH: usize>
    ConnectionManager<R, S, NoAdminEndpoint, C, MAX_SUBSCRIPTIONS, MAX_TASKS, OUTBOX_DEPTH>
where
    R: Radio,
    S: SessionClient,
    C: Clock,
{
    /// Create a manager with no management endpoint.
    ///
    /// Nothing happens until the first [`poll`](Self::poll).
    pub fn new(config: ConnectionConfig, radio: R, client: S, clock: C) -> Self {
        Self {
            config,
            state: ConnectionState::new(),
            link: LinkManager::new(radio, NoAdminEndpoint),
            session: SessionManager::new(client),
            registry: SubscriptionRegistry::new(),
            tasks: TaskQueue::new(),
            pending: PendingOps::new(),
            clock,
            on_connected: None,
        }
    }
}

impl<R, S, A, C, const MAX_SUBSCRIPTIONS: usize, const MAX_TASKS: usize, const OUTBOX_DEPTH: usize>
    ConnectionManager<R, S, A, C, MAX_SUBSCRIPTIONS, MAX_TASKS, OUTBOX_DEPTH>
where
    R: Radio,
    S: SessionClient,
    A: AdminEndpoint,
    C: Clock,
{
    /// Attach the management endpoint started on every link-up edge.
    ///
    /// It is only used when `admin_endpoint` is enabled in the config.
    pub fn with_admin_endpoint<A2: AdminEndpoint>(
        self,
        admin: A2,
    ) -> ConnectionManager<R, S, A2, C, MAX_SUBSCRIPTIONS, MAX_TASKS, OUTBOX_DEPTH> {
        ConnectionManager {
            config: self.config,
            state: self.state,
            link: self.link.with_admin(admin),
            session: self.session,
            registry: self.registry,
            tasks: self.tasks,
            pending: self.pending,
            clock: self.clock,
            on_connected: self.on_connected,
        }
    }

    /// Set the callback invoked once per session-established edge.
    pub fn on_connected(mut self, handler: &'static dyn ConnectionHandler) -> Self {
        self.on_connected = Some(handler);
        self
    }

    /// Run one tick of the reconciliation loop. Never blocks.
    pub fn poll(&mut self) {
        let now = self.clock.now();

        if self.link.poll(&mut self.state, &self.config, now) == LinkTransition::Lost {
            self.session
                .teardown(&mut self.state, &self.config, &mut self.registry);
        }

        if self.state.link_up {
            let transition = self.session.poll(
                &mut self.state,
                &self.config,
                &mut self.registry,
                &mut self.pending,
                now,
            );
            self.apply_pending();

            if transition == SessionTransition::Established {
                if let Some(handler) = self.on_connected {
                    handler.on_connected(self);
                }
            }

            self.link.service_admin(&self.config);
        }

        self.run_due_tasks(now);
    }

    /// Drive [`poll`](Self::poll) forever, once per `period`.
    pub async fn run(&mut self, period: Duration) -> ! {
        let mut ticker = Ticker::every(period);
        loop {
            self.poll();
            ticker.next().await;
        }
    }

    /// Both the link and the broker session are up, as of the last tick.
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Publish `payload` on `topic`.
    pub fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Error<S::Error>> {
        let diag = self.config.diagnostics;
        if !self.is_connected() {
            warn!(diag, "mqtt: publish [{}] dropped, not connected", topic);
            return Err(Error::NotConnected);
        }

        self.session.client_mut().publish(topic, payload, retain)?;
        info!(
            diag,
            "mqtt: publish [{}] {}",
            topic,
            decode_payload::<MAX_PAYLOAD_SIZE>(payload)
        );
        Ok(())
    }

    /// Subscribe `handler` to messages on `topic` (exact match).
    ///
    /// While the session is up the subscription is sent to the broker first;
    /// otherwise it is only recorded and sent on the next session-up edge. A
    /// full registry rejects the request before anything reaches the wire.
    ///
    /// Subscribing a handler that is already registered on `topic` succeeds
    /// without adding a second entry, so a connection callback can subscribe
    /// unconditionally under either [`ResubscribePolicy`](crate::ResubscribePolicy).
    pub fn subscribe(&mut self, topic: &str, handler: Handler) -> Result<(), Error<S::Error>> {
        let diag = self.config.diagnostics;
        if self.registry.contains_handler(topic, handler) {
            info!(diag, "mqtt: already subscribed to {}", topic);
            return Ok(());
        }
        if self.registry.is_full() {
            error!(diag, "mqtt: subscribe {} rejected, registry full", topic);
            return Err(Error::RegistryFull);
        }
        if topic.len() > MAX_TOPIC_LEN {
            error!(diag, "mqtt: subscribe rejected, topic too long");
            return Err(Error::TopicTooLong);
        }

        if self.is_connected() {
            self.session.client_mut().subscribe(topic)?;
        }
        self.registry
            .insert(topic, handler)
            .map_err(Error::cast_session_error)?;
        info!(diag, "mqtt: subscribe {}", topic);
        Ok(())
    }

    /// Remove the first subscription on `topic`.
    ///
    /// The entry is removed locally even if the broker rejects the wire-level
    /// unsubscribe, so no handler sees that topic again.
    pub fn unsubscribe(&mut self, topic: &str) -> Result<(), Error<S::Error>> {
        let diag = self.config.diagnostics;
        if let Err(err) = self.registry.remove(topic) {
            warn!(diag, "mqtt: unsubscribe {}, topic not found", topic);
            return Err(Error::cast_session_error(err));
        }

        if self.is_connected() && self.session.client_mut().unsubscribe(topic).is_err() {
            warn!(diag, "mqtt: broker rejected unsubscribe {}", topic);
        }
        info!(diag, "mqtt: unsubscribe {}", topic);
        Ok(())
    }

    /// Run `task` once, on the first tick at least `delay` from now.
    ///
    /// A delay reaching past the end of the clock's range never comes due.
    pub fn execute_delayed(&mut self, delay: Duration, task: Task) -> Result<(), Error<S::Error>> {
        let due = self
            .clock
            .now()
            .checked_add(delay)
            .unwrap_or(Instant::MAX);
        self.tasks.schedule(due, task).map_err(|err| {
            error!(self.config.diagnostics, "scheduler: task rejected, queue full");
            Error::cast_session_error(err)
        })
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn phase(&self) -> LinkPhase {
        self.state.phase()
    }

    /// The station address, while the link is up.
    pub fn local_address(&self) -> Option<Ipv4Address> {
        if self.state.link_up {
            self.link.local_address()
        } else {
            None
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn subscriptions(&self) -> &SubscriptionRegistry<MAX_SUBSCRIPTIONS> {
        &self.registry
    }

    pub fn tasks(&self) -> &TaskQueue<MAX_TASKS> {
        &self.tasks
    }

    /// The earliest time a deferred task becomes due, if any is queued.
    pub fn next_task_due(&self) -> Option<Instant> {
        self.tasks.next_due()
    }

    pub fn radio(&self) -> &R {
        self.link.radio()
    }

    pub fn radio_mut(&mut self) -> &mut R {
        self.link.radio_mut()
    }

    pub fn session_client(&self) -> &S {
        self.session.client()
    }

    pub fn session_client_mut(&mut self) -> &mut S {
        self.session.client_mut()
    }

    pub fn admin_endpoint_mut(&mut self) -> &mut A {
        self.link.admin_mut()
    }

    /// Apply the operations handlers requested during dispatch.
    fn apply_pending(&mut self) {
        let rejected = self.pending.take_rejected();
        if rejected > 0 {
            error!(
                self.config.diagnostics,
                "mqtt: {} handler requests rejected during dispatch", rejected
            );
        }

        while let Some(op) = self.pending.pop() {
            // Every operation reports its own failure through diagnostics.
            let _ = match op {
                PendingOp::Publish {
                    topic,
                    payload,
                    retain,
                } => self.publish(&topic, &payload, retain),
                PendingOp::Subscribe { topic, handler } => self.subscribe(&topic, handler),
                PendingOp::Unsubscribe { topic } => self.unsubscribe(&topic),
                PendingOp::Schedule { delay, task } => self.execute_delayed(delay, task),
            };
        }
    }

    fn run_due_tasks(&mut self, now: Instant) {
        let mut scan = self.tasks.scan();
        while let Some(task) = scan.next_due(&mut self.tasks, now) {
            task.run(self);
        }
    }
}

impl<R, S, A, C, const MAX_SUBSCRIPTIONS: usize, const MAX_TASKS: usize, const OUTBOX_DEPTH: usize>
    Outbox for ConnectionManager<R, S, A, C, MAX_SUBSCRIPTIONS, MAX_TASKS, OUTBOX_DEPTH>
where
    R: Radio,
    S: SessionClient,
    A: AdminEndpoint,
    C: Clock,
{
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> OutboxResult {
        ConnectionManager::publish(self, topic, payload, retain).map_err(Error::erase)
    }

    fn subscribe(&mut self, topic: &str, handler: Handler) -> OutboxResult {
        ConnectionManager::subscribe(self, topic, handler).map_err(Error::erase)
    }

    fn unsubscribe(&mut self, topic: &str) -> OutboxResult {
        ConnectionManager::unsubscribe(self, topic).map_err(Error::erase)
    }

    fn execute_delayed(&mut self, delay: Duration, task: Task) -> OutboxResult {
        ConnectionManager::execute_delayed(self, delay, task).map_err(Error::erase)
    }
}
