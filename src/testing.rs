//! Host-side collaborators for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use embassy_net::Ipv4Address;
use embassy_time::{Duration, Instant};

use crate::config::{BrokerConfig, ConnectionConfig, WifiCredentials};
use crate::error::ConnectFailure;
use crate::runtime::{Handler, Outbox, Task};
use crate::transport::{AdminEndpoint, Clock, InboundSink, Radio, SessionClient};

fn ignore_message(_payload: &str, _outbox: &mut dyn Outbox) {}

fn ignore_outbox(_outbox: &mut dyn Outbox) {}

pub(crate) static NOOP: fn(&str, &mut dyn Outbox) = ignore_message;

pub(crate) static NOOP_TASK: fn(&mut dyn Outbox) = ignore_outbox;

pub(crate) fn test_config() -> ConnectionConfig {
    ConnectionConfig::new(
        WifiCredentials::new("test-ssid", "test-pass"),
        BrokerConfig::new("10.0.0.1", 1883, "device-1").with_auth("user", "secret"),
    )
}

#[derive(Debug, Default)]
pub(crate) struct MockRadio {
    pub associated: bool,
    pub associate_calls: usize,
    pub disassociate_calls: usize,
    pub last_ssid: Option<String>,
}

impl Radio for MockRadio {
    fn is_associated(&self) -> bool {
        self.associated
    }

    fn associate(&mut self, ssid: &str, _password: &str) {
        self.associate_calls += 1;
        self.last_ssid = Some(ssid.to_string());
    }

    fn disassociate(&mut self) {
        self.disassociate_calls += 1;
    }

    fn local_address(&self) -> Option<Ipv4Address> {
        self.associated.then(|| Ipv4Address::new(10, 0, 0, 42))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WireError;

/// Session client that connects instantly unless told to refuse.
#[derive(Debug, Default)]
pub(crate) struct MockSession {
    pub connected: bool,
    /// State code reported by the next connect attempts, `None` to accept.
    pub refuse_with: Option<i8>,
    /// Reject publish, subscribe and unsubscribe.
    pub reject_wire: bool,
    pub connect_calls: usize,
    pub serviced: usize,
    pub published: Vec<(String, Vec<u8>, bool)>,
    pub subscribed: Vec<String>,
    pub unsubscribed: Vec<String>,
    pub inbound: VecDeque<(String, Vec<u8>)>,
}

impl MockSession {
    pub fn push_inbound(&mut self, topic: &str, payload: &[u8]) {
        self.inbound.push_back((topic.to_string(), payload.to_vec()));
    }
}

impl SessionClient for MockSession {
    type Error = WireError;

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn connect(&mut self, _client_id: &str, _username: &str, _password: &str) -> Result<(), ConnectFailure> {
        self.connect_calls += 1;
        match self.refuse_with {
            Some(code) => Err(ConnectFailure::from(code)),
            None => {
                self.connected = true;
                Ok(())
            }
        }
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), WireError> {
        if self.reject_wire {
            return Err(WireError);
        }
        self.published
            .push((topic.to_string(), payload.to_vec(), retain));
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), WireError> {
        if self.reject_wire {
            return Err(WireError);
        }
        self.subscribed.push(topic.to_string());
        Ok(())
    }

    fn unsubscribe(&mut self, topic: &str) -> Result<(), WireError> {
        if self.reject_wire {
            return Err(WireError);
        }
        self.unsubscribed.push(topic.to_string());
        Ok(())
    }

    fn service(&mut self, sink: &mut dyn InboundSink) {
        self.serviced += 1;
        while let Some((topic, payload)) = self.inbound.pop_front() {
            sink.deliver(&topic, &payload);
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct MockAdmin {
    pub alias: Option<String>,
    pub started: usize,
    pub advertised: usize,
    pub serviced: usize,
}

impl AdminEndpoint for MockAdmin {
    fn bind_alias(&mut self, name: &str) {
        self.alias = Some(name.to_string());
    }

    fn start(&mut self, _port: u16, _username: &str, _password: &str) {
        self.started += 1;
    }

    fn advertise(&mut self, _service: &str, _protocol: &str, _port: u16) {
        self.advertised += 1;
    }

    fn service(&mut self) {
        self.serviced += 1;
    }
}

/// Clock advanced by hand. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub(crate) struct ManualClock {
    millis: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn set(&self, ms: u64) {
        self.millis.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.millis.set(self.millis.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        Instant::from_millis(self.millis.get())
    }
}

/// Shared log of handler and task invocations.
#[derive(Debug, Clone, Default)]
pub(crate) struct Recorder {
    log: Rc<RefCell<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler logging every payload it receives.
    pub fn handler(&self) -> Handler {
        let log = self.log.clone();
        Box::leak(Box::new(move |payload: &str, _: &mut dyn Outbox| {
            log.borrow_mut().push(payload.to_string());
        }))
    }

    /// A handler logging `tag:payload`.
    pub fn tagged(&self, tag: &'static str) -> Handler {
        let log = self.log.clone();
        Box::leak(Box::new(move |payload: &str, _: &mut dyn Outbox| {
            log.borrow_mut().push(format!("{tag}:{payload}"));
        }))
    }

    /// A deferred task logging `tag` when it runs.
    pub fn task(&self, tag: &'static str) -> Task {
        let log = self.log.clone();
        Box::leak(Box::new(move |_: &mut dyn Outbox| {
            log.borrow_mut().push(tag.to_string());
        }))
    }

    pub fn messages(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.log.borrow().iter().filter(|e| *e == entry).count()
    }
}

pub(crate) fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
