//! # Link-Layer Manager
//!
//! Tracks wireless association and decides when to (re)associate.
//!
//! Link retries are edge-triggered: an association request is issued once at
//! startup and once after every observed drop, never on a timer. The radio
//! stack is expected to keep trying on its own in between. An optional
//! `link_attempt_timeout` re-issues the request if association never completes.

use embassy_net::Ipv4Address;
use embassy_time::Instant;

use crate::config::{ADMIN_PORT, ADMIN_PROTOCOL, ADMIN_SERVICE, ConnectionConfig};
use crate::state::ConnectionState;
use crate::transport::{AdminEndpoint, Radio};

/// What changed on the link during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkTransition {
    Unchanged,
    Established,
    Lost,
}

/// Owns the radio and the optional management endpoint.
pub struct LinkManager<R, A> {
    radio: R,
    admin: A,
}

impl<R: Radio, A: AdminEndpoint> LinkManager<R, A> {
    pub fn new(radio: R, admin: A) -> Self {
        Self { radio, admin }
    }

    /// Swap in a different management endpoint, keeping the radio.
    pub fn with_admin<A2: AdminEndpoint>(self, admin: A2) -> LinkManager<R, A2> {
        LinkManager {
            radio: self.radio,
            admin,
        }
    }

    /// Reconcile the recorded link state with the radio.
    ///
    /// On the disconnect edge `state.link_up` is cleared and the radio is told
    /// to disassociate; clearing the dependent session state is left to the
    /// caller, which owns the session manager.
    pub fn poll(
        &mut self,
        state: &mut ConnectionState,
        config: &ConnectionConfig,
        now: Instant,
    ) -> LinkTransition {
        let diag = config.diagnostics;

        if self.radio.is_associated() {
            if state.link_up {
                return LinkTransition::Unchanged;
            }
            state.link_up = true;
            state.last_link_success = Some(now);
            match self.radio.local_address() {
                Some(addr) => info!(diag, "wifi: connected, ip {}", addr),
                None => info!(diag, "wifi: connected"),
            }
            if config.admin_endpoint {
                self.start_admin(config);
            }
            return LinkTransition::Established;
        }

        let mut transition = LinkTransition::Unchanged;
        if state.link_up {
            warn!(diag, "wifi: connection lost");
            state.link_up = false;
            self.radio.disassociate();
            transition = LinkTransition::Lost;
        }

        if Self::should_attempt(state, config, now) {
            self.associate(state, config, now);
        }
        transition
    }

    /// Service the management endpoint. Only meaningful while the link is up.
    pub fn service_admin(&mut self, config: &ConnectionConfig) {
        if config.admin_endpoint {
            self.admin.service();
        }
    }

    pub fn local_address(&self) -> Option<Ipv4Address> {
        self.radio.local_address()
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn admin_mut(&mut self) -> &mut A {
        &mut self.admin
    }

    fn should_attempt(state: &ConnectionState, config: &ConnectionConfig, now: Instant) -> bool {
        match (state.last_link_attempt, state.last_link_success) {
            (None, _) => true,
            // Equal instants mean the success was observed after the attempt.
            (Some(attempt), Some(success)) if success >= attempt => true,
            (Some(attempt), _) => config
                .link_attempt_timeout
                .is_some_and(|timeout| now.saturating_duration_since(attempt) > timeout),
        }
    }

    fn associate(&mut self, state: &mut ConnectionState, config: &ConnectionConfig, now: Instant) {
        info!(config.diagnostics, "wifi: connecting to {}", config.wifi.ssid);
        self.radio.associate(config.wifi.ssid, config.wifi.password);
        state.last_link_attempt = Some(now);
    }

    fn start_admin(&mut self, config: &ConnectionConfig) {
        let broker = &config.broker;
        self.admin.bind_alias(broker.client_id);
        self.admin
            .start(ADMIN_PORT, broker.username, broker.password);
        self.admin.advertise(ADMIN_SERVICE, ADMIN_PROTOCOL, ADMIN_PORT);
        info!(
            config.diagnostics,
            "admin: ready at http://{}.local (user '{}')",
            broker.client_id,
            broker.username
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockAdmin, MockRadio, test_config};
    use embassy_time::Duration;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn manager() -> LinkManager<MockRadio, MockAdmin> {
        LinkManager::new(MockRadio::default(), MockAdmin::default())
    }

    #[test]
    fn first_poll_attempts_association() {
        let mut link = manager();
        let mut state = ConnectionState::new();
        let config = test_config();

        assert_eq!(link.poll(&mut state, &config, at(0)), LinkTransition::Unchanged);
        assert_eq!(link.radio().associate_calls, 1);
        assert_eq!(state.last_link_attempt, Some(at(0)));
    }

    #[test]
    fn no_retry_until_a_drop_is_observed() {
        let mut link = manager();
        let mut state = ConnectionState::new();
        let config = test_config();

        for ms in [0, 1_000, 60_000, 600_000] {
            link.poll(&mut state, &config, at(ms));
        }
        assert_eq!(link.radio().associate_calls, 1);

        link.radio_mut().associated = true;
        assert_eq!(link.poll(&mut state, &config, at(600_100)), LinkTransition::Established);
        link.poll(&mut state, &config, at(700_000));
        assert_eq!(link.radio().associate_calls, 1);

        link.radio_mut().associated = false;
        assert_eq!(link.poll(&mut state, &config, at(700_100)), LinkTransition::Lost);
        assert_eq!(link.radio().disassociate_calls, 1);
        assert_eq!(link.radio().associate_calls, 2);

        link.poll(&mut state, &config, at(800_000));
        assert_eq!(link.radio().associate_calls, 2);
    }

    #[test]
    fn success_in_the_same_instant_as_attempt_still_rearms() {
        let mut link = manager();
        let mut state = ConnectionState::new();
        let config = test_config();

        link.poll(&mut state, &config, at(0));
        link.radio_mut().associated = true;
        link.poll(&mut state, &config, at(0));
        link.radio_mut().associated = false;
        link.poll(&mut state, &config, at(0));

        assert_eq!(link.radio().associate_calls, 2);
    }

    #[test]
    fn attempt_timeout_reissues_association() {
        let mut link = manager();
        let mut state = ConnectionState::new();
        let config = test_config().with_link_attempt_timeout(Duration::from_secs(30));

        link.poll(&mut state, &config, at(0));
        link.poll(&mut state, &config, at(30_000));
        assert_eq!(link.radio().associate_calls, 1);

        link.poll(&mut state, &config, at(30_001));
        assert_eq!(link.radio().associate_calls, 2);
    }

    #[test]
    fn admin_endpoint_starts_once_per_link_edge() {
        let mut link = manager();
        let mut state = ConnectionState::new();
        let config = test_config().with_admin_endpoint(true);

        link.radio_mut().associated = true;
        link.poll(&mut state, &config, at(0));
        link.poll(&mut state, &config, at(10));
        assert_eq!(link.admin_mut().started, 1);
        assert_eq!(link.admin_mut().alias.as_deref(), Some("device-1"));
        assert_eq!(link.admin_mut().advertised, 1);

        link.radio_mut().associated = false;
        link.poll(&mut state, &config, at(20));
        link.radio_mut().associated = true;
        link.poll(&mut state, &config, at(30));
        assert_eq!(link.admin_mut().started, 2);
    }

    #[test]
    fn admin_endpoint_disabled_is_never_touched() {
        let mut link = manager();
        let mut state = ConnectionState::new();
        let config = test_config();

        link.radio_mut().associated = true;
        link.poll(&mut state, &config, at(0));
        link.service_admin(&config);

        assert_eq!(link.admin_mut().started, 0);
        assert_eq!(link.admin_mut().serviced, 0);
    }
}
