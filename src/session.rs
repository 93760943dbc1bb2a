//! # Session Link Manager
//!
//! Keeps the publish/subscribe session with the broker alive while the link
//! layer is up.
//!
//! Reconnection attempts are paced: a new attempt is only made once more than
//! `retry_delay` has passed since the previous one, whatever its outcome. The
//! pacing restarts from scratch after the session (or the link beneath it) is
//! lost, so the first attempt after a drop is immediate.

use embassy_time::Instant;

use crate::config::{ConnectionConfig, ResubscribePolicy};
use crate::runtime::{Dispatcher, PendingOps, SubscriptionRegistry};
use crate::state::ConnectionState;
use crate::transport::SessionClient;

/// What changed on the session during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionTransition {
    Unchanged,
    Established,
    Lost,
}

/// Owns the session client and drives it from the reconciliation loop.
pub struct SessionManager<S> {
    client: S,
}

impl<S: SessionClient> SessionManager<S> {
    pub fn new(client: S) -> Self {
        Self { client }
    }

    /// Service an active session or try to (re)establish it.
    ///
    /// Must only be called while the link is up. Inbound messages are
    /// dispatched to `registry`; operations requested by handlers are left in
    /// `outbox` for the caller to apply.
    ///
    /// When a loss and a successful reconnect happen in the same tick, the
    /// result is [`SessionTransition::Established`].
    pub(crate) fn poll<const MAX_SUBSCRIPTIONS: usize, const OUTBOX_DEPTH: usize>(
        &mut self,
        state: &mut ConnectionState,
        config: &ConnectionConfig,
        registry: &mut SubscriptionRegistry<MAX_SUBSCRIPTIONS>,
        outbox: &mut PendingOps<OUTBOX_DEPTH>,
        now: Instant,
    ) -> SessionTransition {
        if self.client.is_connected() {
            let mut transition = SessionTransition::Unchanged;
            if !state.session_up {
                // The client survived a link drop; adopt its session.
                state.session_up = true;
                info!(config.diagnostics, "mqtt: session resumed");
                self.replay(registry, config.diagnostics);
                transition = SessionTransition::Established;
            }
            let mut dispatcher = Dispatcher::new(registry, outbox, config.diagnostics);
            self.client.service(&mut dispatcher);
            return transition;
        }

        let mut transition = SessionTransition::Unchanged;
        if state.session_up {
            warn!(config.diagnostics, "mqtt: connection lost");
            self.teardown(state, config, registry);
            transition = SessionTransition::Lost;
        }

        let due = match state.last_session_attempt {
            None => true,
            Some(last) => now.saturating_duration_since(last) > config.retry_delay,
        };
        if due && self.connect(state, config, registry, now) {
            transition = SessionTransition::Established;
        }
        transition
    }

    /// Forget the session after it (or the link beneath it) went away.
    ///
    /// Applies the configured [`ResubscribePolicy`] and resets retry pacing.
    pub fn teardown<const MAX_SUBSCRIPTIONS: usize>(
        &mut self,
        state: &mut ConnectionState,
        config: &ConnectionConfig,
        registry: &mut SubscriptionRegistry<MAX_SUBSCRIPTIONS>,
    ) {
        state.session_up = false;
        state.last_session_attempt = None;
        if config.resubscribe == ResubscribePolicy::Forget {
            registry.clear();
        }
    }

    pub fn client(&self) -> &S {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut S {
        &mut self.client
    }

    fn connect<const MAX_SUBSCRIPTIONS: usize>(
        &mut self,
        state: &mut ConnectionState,
        config: &ConnectionConfig,
        registry: &SubscriptionRegistry<MAX_SUBSCRIPTIONS>,
        now: Instant,
    ) -> bool {
        let broker = &config.broker;
        let diag = config.diagnostics;
        info!(diag, "mqtt: connecting to {}:{}", broker.host, broker.port);

        let result = self
            .client
            .connect(broker.client_id, broker.username, broker.password);
        state.last_session_attempt = Some(now);

        match result {
            Ok(()) => {
                state.session_up = true;
                info!(diag, "mqtt: connected as {}", broker.client_id);
                self.replay(registry, diag);
                true
            }
            Err(failure) => {
                error!(diag, "mqtt: unable to connect, {}", failure.as_str());
                false
            }
        }
    }

    /// Re-issue the wire-level subscription of every retained entry.
    fn replay<const MAX_SUBSCRIPTIONS: usize>(
        &mut self,
        registry: &SubscriptionRegistry<MAX_SUBSCRIPTIONS>,
        diag: bool,
    ) {
        for sub in registry.iter() {
            match self.client.subscribe(sub.topic()) {
                Ok(()) => info!(diag, "mqtt: resubscribed {}", sub.topic()),
                Err(_) => error!(diag, "mqtt: resubscribe {} failed", sub.topic()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockSession, NOOP, test_config};
    use embassy_time::Duration;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    struct Fixture {
        session: SessionManager<MockSession>,
        state: ConnectionState,
        config: ConnectionConfig,
        registry: SubscriptionRegistry<4>,
        outbox: PendingOps<4>,
    }

    impl Fixture {
        fn new(config: ConnectionConfig) -> Self {
            let state = ConnectionState {
                link_up: true,
                ..ConnectionState::new()
            };
            Self {
                session: SessionManager::new(MockSession::default()),
                state,
                config,
                registry: SubscriptionRegistry::new(),
                outbox: PendingOps::new(),
            }
        }

        fn poll(&mut self, ms: u64) -> SessionTransition {
            self.session.poll(
                &mut self.state,
                &self.config,
                &mut self.registry,
                &mut self.outbox,
                at(ms),
            )
        }

        fn client(&mut self) -> &mut MockSession {
            self.session.client_mut()
        }
    }

    #[test]
    fn failed_attempts_are_paced_by_retry_delay() {
        let mut fx = Fixture::new(test_config().with_retry_delay(Duration::from_millis(5_000)));
        fx.client().refuse_with = Some(-2);

        fx.poll(0);
        fx.poll(1_000);
        fx.poll(5_000);
        assert_eq!(fx.client().connect_calls, 1);

        fx.poll(5_001);
        assert_eq!(fx.client().connect_calls, 2);
        assert_eq!(fx.state.last_session_attempt, Some(at(5_001)));
        assert!(!fx.state.session_up);
    }

    #[test]
    fn successful_connect_is_an_established_edge() {
        let mut fx = Fixture::new(test_config());

        assert_eq!(fx.poll(0), SessionTransition::Established);
        assert!(fx.state.session_up);
        assert_eq!(fx.poll(10), SessionTransition::Unchanged);
        assert_eq!(fx.client().connect_calls, 1);
        assert_eq!(fx.client().serviced, 1);
    }

    #[test]
    fn loss_clears_registry_and_reconnects_immediately() {
        let mut fx = Fixture::new(test_config());
        fx.poll(0);
        fx.registry.insert("a", &NOOP).unwrap();

        fx.client().connected = false;
        fx.client().refuse_with = Some(-4);
        assert_eq!(fx.poll(100), SessionTransition::Lost);
        assert!(fx.registry.is_empty());
        assert_eq!(fx.client().connect_calls, 2);
        assert!(!fx.state.session_up);
    }

    #[test]
    fn replay_policy_keeps_and_resubscribes_entries() {
        let mut fx = Fixture::new(test_config().with_resubscribe(ResubscribePolicy::Replay));
        fx.poll(0);
        fx.registry.insert("a", &NOOP).unwrap();
        fx.registry.insert("b", &NOOP).unwrap();

        fx.client().connected = false;
        assert_eq!(fx.poll(100), SessionTransition::Established);
        assert_eq!(fx.registry.len(), 2);
        assert_eq!(fx.client().subscribed, ["a", "b"]);
    }

    #[test]
    fn surviving_client_session_is_adopted() {
        let mut fx = Fixture::new(test_config());
        fx.poll(0);
        fx.session
            .teardown(&mut fx.state, &fx.config, &mut fx.registry);

        assert_eq!(fx.poll(10), SessionTransition::Established);
        assert!(fx.state.session_up);
        assert_eq!(fx.client().connect_calls, 1);
    }

    #[test]
    fn teardown_resets_pacing() {
        let mut fx = Fixture::new(test_config());
        fx.client().refuse_with = Some(5);
        fx.poll(0);

        fx.session
            .teardown(&mut fx.state, &fx.config, &mut fx.registry);
        assert_eq!(fx.state.last_session_attempt, None);

        fx.poll(1);
        assert_eq!(fx.client().connect_calls, 2);
    }
}
