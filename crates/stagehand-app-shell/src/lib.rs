use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use stagehand_core::{
    IdentityToken, MemorySlotApplier, NavigationError, PageRegistry, PassOutcome, RegistryError,
    Session, SessionConfig,
};
use stagehand_runtime_std::StdHost;

/// Passes one session may run per [`AppShell::update`] before the shell
/// moves on and leaves the remaining request for the next update.
pub const MAX_SETTLE_PASSES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub session: SessionConfig,
    pub max_settle_passes: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            max_settle_passes: MAX_SETTLE_PASSES,
        }
    }
}

impl ShellConfig {
    pub fn with_session_config(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    pub fn with_max_settle_passes(mut self, passes: usize) -> Self {
        self.max_settle_passes = passes.max(1);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShellError {
    #[error("{id} is not open")]
    UnknownSession { id: SessionId },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
}

struct SessionSlot {
    host: StdHost,
    session: Session,
    applier: MemorySlotApplier,
}

pub struct AppShell {
    config: ShellConfig,
    registry: Arc<PageRegistry>,
    sessions: IndexMap<SessionId, SessionSlot>,
    next_id: u64,
}

impl AppShell {
    pub fn new(registry: PageRegistry) -> Self {
        Self::with_config(Arc::new(registry), ShellConfig::default())
    }

    pub fn with_config(registry: Arc<PageRegistry>, config: ShellConfig) -> Self {
        Self {
            config,
            registry,
            sessions: IndexMap::new(),
            next_id: 1,
        }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Opens a session and runs its first pass.
    pub fn open_session(&mut self) -> Result<SessionId, ShellError> {
        let host = StdHost::new();
        let applier = MemorySlotApplier::new();
        let session = host.open_session(
            self.config.session.clone(),
            Arc::clone(&self.registry),
            applier.clone(),
        )?;
        let id = SessionId(self.next_id);
        self.next_id += 1;
        if let PassOutcome::Completed(report) = session.run_pass() {
            for failure in &report.failures {
                log::error!("{id}: initial pass failed: {failure}");
            }
        }
        log::debug!("{id} opened on `{}`", session.selection());
        self.sessions.insert(
            id,
            SessionSlot {
                host,
                session,
                applier,
            },
        );
        Ok(id)
    }

    pub fn close_session(&mut self, id: SessionId) -> bool {
        let closed = self.sessions.shift_remove(&id).is_some();
        if closed {
            log::debug!("{id} closed");
        }
        closed
    }

    pub fn session_ids(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.sessions.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id).map(|slot| &slot.session)
    }

    pub fn applier(&self, id: SessionId) -> Option<&MemorySlotApplier> {
        self.sessions.get(&id).map(|slot| &slot.applier)
    }

    fn slot(&self, id: SessionId) -> Result<&SessionSlot, ShellError> {
        self.sessions
            .get(&id)
            .ok_or(ShellError::UnknownSession { id })
    }

    pub fn select_page(&self, id: SessionId, page: &str) -> Result<bool, ShellError> {
        Ok(self.slot(id)?.session.select_page(page)?)
    }

    pub fn select_sub_page(&self, id: SessionId, sub_page: &str) -> Result<bool, ShellError> {
        Ok(self.slot(id)?.session.select_sub_page(sub_page)?)
    }

    pub fn interact<T: 'static>(
        &self,
        id: SessionId,
        token: &IdentityToken,
        value: T,
    ) -> Result<(), ShellError> {
        self.slot(id)?.session.interact(token, value);
        Ok(())
    }

    pub fn should_render(&self) -> bool {
        self.sessions
            .values()
            .any(|slot| slot.host.scheduler().is_pass_requested())
    }

    /// Runs the passes sessions asked for. Each session settles for at most
    /// `max_settle_passes` passes. Returns how many passes ran.
    pub fn update(&mut self) -> usize {
        let started = Instant::now();
        let limit = self.config.max_settle_passes;
        let mut total = 0;
        for (id, slot) in &self.sessions {
            let mut passes = 0;
            while passes < limit && slot.host.take_pass_request() {
                passes += 1;
                match slot.session.run_pass() {
                    PassOutcome::Completed(report) => {
                        for failure in &report.failures {
                            log::error!("{id}: {failure}");
                        }
                    }
                    PassOutcome::Skipped(reason) => {
                        log::debug!("{id}: pass skipped ({reason:?})");
                    }
                }
            }
            if slot.host.scheduler().is_pass_requested() {
                log::warn!("{id} still requests passes after {limit}; deferring to the next update");
            }
            total += passes;
        }
        if total > 0 {
            log::trace!("update ran {total} pass(es) in {:?}", started.elapsed());
        }
        total
    }

    pub fn log_debug_info(&self) {
        println!("\n\n");
        println!("════════════════════════════════════════════════════════");
        println!("           DEBUG: SESSION STATE");
        println!("════════════════════════════════════════════════════════");

        if self.sessions.is_empty() {
            println!("No open sessions");
        }
        for (id, slot) in &self.sessions {
            println!("── {id} ──");
            print!("{}", slot.session.debug_info());
            print!("{}", slot.applier.dump());
        }

        println!("════════════════════════════════════════════════════════");
        println!("\n\n");
    }
}
