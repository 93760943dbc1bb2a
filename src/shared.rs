//! Sharing a manager between executors or interrupt contexts.
//!
//! The manager itself is single-threaded: one logical thread of control calls
//! `poll` and the application API. When several executors need access, wrap it
//! in a [`SharedConnectionManager`], which serializes every access through an
//! `embassy-sync` blocking mutex.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;

/// A manager guarded by a blocking mutex.
///
/// Pick the raw mutex to match the deployment: `NoopRawMutex` when all users
/// live on one executor, `CriticalSectionRawMutex` when interrupts or other
/// cores are involved.
///
/// ```ignore
/// static MANAGER: StaticCell<SharedConnectionManager<CriticalSectionRawMutex, Manager>> =
///     StaticCell::new();
///
/// let shared = MANAGER.init(SharedConnectionManager::new(manager));
/// shared.with(|m| m.poll());
/// ```
pub struct SharedConnectionManager<M: RawMutex, T> {
    inner: Mutex<M, RefCell<T>>,
}

impl<M: RawMutex, T> SharedConnectionManager<M, T> {
    pub const fn new(manager: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(manager)),
        }
    }

    /// Run `f` with exclusive access to the manager.
    ///
    /// Returns `None` if the manager is already borrowed further up the call
    /// stack, e.g. when called from a handler running inside `poll`.
    pub fn with<U>(&self, f: impl FnOnce(&mut T) -> U) -> Option<U> {
        self.inner.lock(|cell| {
            let mut manager = cell.try_borrow_mut().ok()?;
            Some(f(&mut manager))
        })
    }

    /// Consume the wrapper and return the manager.
    pub fn into_inner(self) -> T {
        self.inner.into_inner().into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConnectionManager;
    use crate::testing::{ManualClock, MockRadio, MockSession, test_config};
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    type Manager = ConnectionManager<MockRadio, MockSession, crate::NoAdminEndpoint, ManualClock, 2, 2>;

    #[test]
    fn polls_through_the_lock() {
        let manager: Manager = ConnectionManager::new(
            test_config(),
            MockRadio {
                associated: true,
                ..MockRadio::default()
            },
            MockSession::default(),
            ManualClock::default(),
        );
        let shared = SharedConnectionManager::<NoopRawMutex, _>::new(manager);

        assert_eq!(shared.with(|m| m.poll()), Some(()));
        assert_eq!(shared.with(|m| m.is_connected()), Some(true));
    }

    #[test]
    fn nested_access_is_refused() {
        let manager: Manager = ConnectionManager::new(
            test_config(),
            MockRadio::default(),
            MockSession::default(),
            ManualClock::default(),
        );
        let shared = SharedConnectionManager::<NoopRawMutex, _>::new(manager);

        let nested = shared.with(|_| shared.with(|m| m.is_connected()));
        assert_eq!(nested, Some(None));
    }
}
