//! Standard host services backed by Rust's `std` library.
//!
//! This crate provides the concrete [`PassScheduler`] a host uses to learn
//! that a session wants another pass, and a [`StdHost`] bundling it with
//! session construction.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use stagehand_core::{PageRegistry, PassScheduler, RegistryError, Session, SessionConfig, SlotApplier};

type Waker = Arc<dyn Fn() + Send + Sync + 'static>;

/// Scheduler that records pass requests in an atomic flag.
pub struct StdScheduler {
    pass_requested: AtomicBool,
    pass_waker: RwLock<Option<Waker>>,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self {
            pass_requested: AtomicBool::new(false),
            pass_waker: RwLock::new(None),
        }
    }

    /// Returns whether a pass has been requested since the last call.
    pub fn take_pass_request(&self) -> bool {
        self.pass_requested.swap(false, Ordering::SeqCst)
    }

    /// Peeks at the request flag without clearing it.
    pub fn is_pass_requested(&self) -> bool {
        self.pass_requested.load(Ordering::SeqCst)
    }

    /// Registers a waker that will be invoked whenever a new pass is requested.
    pub fn set_pass_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        let mut slot = self
            .pass_waker
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(Arc::new(waker));
    }

    /// Clears any registered pass waker.
    pub fn clear_pass_waker(&self) {
        let mut slot = self
            .pass_waker
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = None;
    }

    fn wake(&self) {
        let waker = self
            .pass_waker
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field("pass_requested", &self.is_pass_requested())
            .finish()
    }
}

impl PassScheduler for StdScheduler {
    fn request_pass(&self) {
        if !self.pass_requested.swap(true, Ordering::SeqCst) {
            log::trace!("pass requested");
        }
        self.wake();
    }
}

/// Host-side bundle of a scheduler and the sessions it serves.
///
/// Each host wakes one driver; a shell serving several users keeps one host
/// per session so pass requests stay attributable.
#[derive(Clone, Default)]
pub struct StdHost {
    scheduler: Arc<StdScheduler>,
}

impl StdHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the scheduler implementation.
    pub fn scheduler(&self) -> Arc<StdScheduler> {
        Arc::clone(&self.scheduler)
    }

    /// Creates a session whose pass requests land on this host.
    pub fn open_session(
        &self,
        config: SessionConfig,
        registry: Arc<PageRegistry>,
        applier: impl SlotApplier + 'static,
    ) -> Result<Session, RegistryError> {
        Session::with_config(config, registry, applier, self.scheduler())
    }

    /// Returns whether a pass was requested since the last poll.
    pub fn take_pass_request(&self) -> bool {
        self.scheduler.take_pass_request()
    }

    /// Registers a waker to be called when a session requests a pass.
    pub fn set_pass_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.scheduler.set_pass_waker(waker);
    }

    /// Clears any previously registered pass waker.
    pub fn clear_pass_waker(&self) {
        self.scheduler.clear_pass_waker();
    }
}

impl fmt::Debug for StdHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdHost")
            .field("scheduler", &self.scheduler)
            .finish()
    }
}
