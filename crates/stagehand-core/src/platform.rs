//! Host hooks the coordinator relies on.

/// Asks the host to run another pass for a session.
pub trait PassScheduler: Send + Sync {
    /// Request that the host schedule a new pass. Requests may be coalesced.
    fn request_pass(&self);
}

/// Scheduler that drops every request. Used when the host drives passes by hand.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultScheduler;

impl PassScheduler for DefaultScheduler {
    fn request_pass(&self) {}
}
