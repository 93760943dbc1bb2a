//! Connection state shared by the link and session managers.

use embassy_time::Instant;

/// Observed connectivity and retry bookkeeping.
///
/// Owned by the [`ConnectionManager`](crate::ConnectionManager) and handed by
/// reference to the link and session managers on every tick. Application code
/// can only read it.
///
/// Invariant: `session_up` implies `link_up`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionState {
    pub link_up: bool,
    pub session_up: bool,
    pub last_link_attempt: Option<Instant>,
    pub last_link_success: Option<Instant>,
    pub last_session_attempt: Option<Instant>,
}

/// The reconciliation loop's position in its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkPhase {
    LinkDown,
    LinkUpSessionDown,
    LinkUpSessionUp,
}

impl ConnectionState {
    pub const fn new() -> Self {
        Self {
            link_up: false,
            session_up: false,
            last_link_attempt: None,
            last_link_success: None,
            last_session_attempt: None,
        }
    }

    pub fn phase(&self) -> LinkPhase {
        match (self.link_up, self.session_up) {
            (false, _) => LinkPhase::LinkDown,
            (true, false) => LinkPhase::LinkUpSessionDown,
            (true, true) => LinkPhase::LinkUpSessionUp,
        }
    }

    /// Both the link and the broker session are up.
    pub fn is_connected(&self) -> bool {
        self.link_up && self.session_up
    }
}
