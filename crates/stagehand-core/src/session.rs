//! Per-user session: owns every store the coordinator works on.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::applier::SlotApplier;
use crate::cleanup::CleanupScheduler;
use crate::coordinator::{CoordinatorPhase, PassOutcome, RenderCoordinator, RendererFailure, SkipReason};
use crate::element::Element;
use crate::error::{NavigationError, RegistryError, StateError, TargetError};
use crate::identity::IdentityToken;
use crate::navigation::{NavigationSelection, NavigationStateStore, PageId, SubPageId};
use crate::page::PageRegistry;
use crate::platform::{DefaultScheduler, PassScheduler};
use crate::state::SessionState;
use crate::target::{RenderTarget, RenderTargetCache, TargetId, WriteOutcome};
use crate::PassId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub default_page: PageId,
    pub header_target: TargetId,
    pub footer_target: TargetId,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_page: PageId::new("home"),
            header_target: TargetId::header(),
            footer_target: TargetId::footer(),
        }
    }
}

impl SessionConfig {
    pub fn with_default_page(mut self, page: impl Into<PageId>) -> Self {
        self.default_page = page.into();
        self
    }

    pub fn with_header_target(mut self, target: impl Into<TargetId>) -> Self {
        self.header_target = target.into();
        self
    }

    pub fn with_footer_target(mut self, target: impl Into<TargetId>) -> Self {
        self.footer_target = target.into();
        self
    }
}

pub(crate) struct SessionInner {
    weak_self: Weak<SessionInner>,
    pub(crate) config: SessionConfig,
    pub(crate) registry: Arc<PageRegistry>,
    scheduler: Arc<dyn PassScheduler>,
    pub(crate) navigation: RefCell<NavigationStateStore>,
    pub(crate) state: RefCell<SessionState>,
    pub(crate) cleanup: RefCell<CleanupScheduler>,
    pub(crate) targets: RefCell<RenderTargetCache>,
    pub(crate) coordinator: RenderCoordinator,
    pub(crate) last_failure: RefCell<Option<RendererFailure>>,
}

impl SessionInner {
    pub(crate) fn handle(&self) -> SessionHandle {
        SessionHandle(self.weak_self.clone())
    }

    pub(crate) fn request_pass(&self) {
        self.scheduler.request_pass();
    }

    pub(crate) fn write_target(
        &self,
        target: &TargetId,
        pass: PassId,
        element: Element,
    ) -> Result<WriteOutcome, TargetError> {
        self.targets.borrow_mut().write(target, pass, element)
    }

    pub(crate) fn read_state<T: Clone + 'static>(&self, key: &str) -> Result<Option<T>, StateError> {
        Ok(self.state.borrow().get::<T>(key)?.cloned())
    }

    /// Stores `value`, taking `key` back from the cleanup queue first.
    pub(crate) fn write_state<T: 'static>(&self, key: String, value: T) -> bool {
        self.cleanup.borrow_mut().reclaim(&key);
        self.state.borrow_mut().insert(key, value)
    }
}

/// One user's navigation, state and render targets.
///
/// A session is single-threaded; hosts serving several users keep one
/// session per user and share only the [`PageRegistry`].
pub struct Session {
    inner: Rc<SessionInner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("selection", &self.inner.navigation.borrow().peek())
            .field("phase", &self.inner.coordinator.phase())
            .finish()
    }
}

impl Session {
    pub fn new(
        registry: Arc<PageRegistry>,
        applier: impl SlotApplier + 'static,
    ) -> Result<Self, RegistryError> {
        Self::with_config(
            SessionConfig::default(),
            registry,
            applier,
            Arc::new(DefaultScheduler),
        )
    }

    pub fn with_config(
        config: SessionConfig,
        registry: Arc<PageRegistry>,
        applier: impl SlotApplier + 'static,
        scheduler: Arc<dyn PassScheduler>,
    ) -> Result<Self, RegistryError> {
        registry.ensure_page(&config.default_page)?;
        if config.header_target == config.footer_target {
            return Err(RegistryError::TargetCollision {
                selection: "footer".to_owned(),
                target: config.footer_target,
            });
        }
        registry.ensure_targets_free(&[&config.header_target, &config.footer_target])?;
        let inner = Rc::new_cyclic(|weak_self| SessionInner {
            weak_self: weak_self.clone(),
            navigation: RefCell::new(NavigationStateStore::new(config.default_page.clone())),
            config,
            registry,
            scheduler,
            state: RefCell::new(SessionState::new()),
            cleanup: RefCell::new(CleanupScheduler::new()),
            targets: RefCell::new(RenderTargetCache::new(applier)),
            coordinator: RenderCoordinator::default(),
            last_failure: RefCell::new(None),
        });
        Ok(Self { inner })
    }

    pub fn handle(&self) -> SessionHandle {
        self.inner.handle()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &Arc<PageRegistry> {
        &self.inner.registry
    }

    /// Runs one pass. A call made while a pass is already running is
    /// rejected without touching anything.
    pub fn run_pass(&self) -> PassOutcome {
        self.inner.coordinator.run(&self.inner)
    }

    pub fn selection(&self) -> NavigationSelection {
        self.inner.navigation.borrow_mut().selection()
    }

    /// Commits a validated selection. Requests a pass when it changed.
    pub fn set_selection(&self, selection: NavigationSelection) -> Result<bool, NavigationError> {
        self.inner.registry.validate(&selection)?;
        let changed = self.inner.navigation.borrow_mut().set_selection(selection);
        if changed {
            self.inner.request_pass();
        }
        Ok(changed)
    }

    /// Selects `page` with no sub-page.
    pub fn select_page(&self, page: impl Into<PageId>) -> Result<bool, NavigationError> {
        self.set_selection(NavigationSelection::page(page))
    }

    /// Selects a sub-page of the current page.
    pub fn select_sub_page(&self, sub_page: impl Into<SubPageId>) -> Result<bool, NavigationError> {
        let page = self.selection().page_id;
        self.set_selection(NavigationSelection::page(page).with_sub_page(sub_page))
    }

    /// Delivers a value to the widget identified by `token` and requests a pass.
    pub fn interact<T: 'static>(&self, token: &IdentityToken, value: T) -> bool {
        let replaced = self.inner.write_state(token.as_str().to_owned(), value);
        self.inner.request_pass();
        replaced
    }

    pub fn value<T: Clone + 'static>(&self, key: &str) -> Result<Option<T>, StateError> {
        self.inner.read_state(key)
    }

    pub fn with_state<R>(&self, read: impl FnOnce(&SessionState) -> R) -> R {
        read(&self.inner.state.borrow())
    }

    /// Drops every stored key and the cleanup queue, then requests a pass.
    pub fn reset_state(&self) -> usize {
        let removed = self.inner.state.borrow_mut().clear();
        self.inner.cleanup.borrow_mut().clear();
        log::debug!("session state reset, {removed} key(s) dropped");
        self.inner.request_pass();
        removed
    }

    pub fn last_failure(&self) -> Option<RendererFailure> {
        self.inner.last_failure.borrow().clone()
    }

    pub fn phase(&self) -> CoordinatorPhase {
        self.inner.coordinator.phase()
    }

    pub fn is_locked(&self) -> bool {
        self.inner.coordinator.is_locked()
    }

    pub fn passes_run(&self) -> u64 {
        self.inner.coordinator.completed_passes()
    }

    pub fn target(&self, id: &TargetId) -> Option<RenderTarget> {
        self.inner.targets.borrow().get(id).cloned()
    }

    pub fn debug_info(&self) -> SessionDebugInfo {
        let inner = &self.inner;
        SessionDebugInfo {
            selection: self.selection(),
            stored_keys: inner.state.borrow().len(),
            pending_cleanup: inner.cleanup.borrow().len(),
            targets: inner
                .targets
                .borrow()
                .targets()
                .map(|target| (target.id().clone(), target.populated()))
                .collect(),
            passes_run: inner.coordinator.completed_passes(),
            navigation_changes: inner.navigation.borrow().change_count(),
            last_failure: inner
                .last_failure
                .borrow()
                .as_ref()
                .map(ToString::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDebugInfo {
    pub selection: NavigationSelection,
    pub stored_keys: usize,
    pub pending_cleanup: usize,
    /// Every known target and whether it currently shows content.
    pub targets: Vec<(TargetId, bool)>,
    pub passes_run: u64,
    pub navigation_changes: u64,
    pub last_failure: Option<String>,
}

impl fmt::Display for SessionDebugInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "selection: {}", self.selection)?;
        writeln!(
            f,
            "passes: {}, navigation changes: {}",
            self.passes_run, self.navigation_changes
        )?;
        writeln!(
            f,
            "stored keys: {}, pending cleanup: {}",
            self.stored_keys, self.pending_cleanup
        )?;
        for (target, populated) in &self.targets {
            let marker = if *populated { "populated" } else { "empty" };
            writeln!(f, "  target {target}: {marker}")?;
        }
        match &self.last_failure {
            Some(failure) => writeln!(f, "last failure: {failure}"),
            None => writeln!(f, "last failure: none"),
        }
    }
}

/// Weak reference to a [`Session`], safe to hold from inside renderers.
#[derive(Clone)]
pub struct SessionHandle(Weak<SessionInner>);

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionHandle").field(&self.is_alive()).finish()
    }
}

impl SessionHandle {
    pub(crate) fn upgrade(&self) -> Option<Rc<SessionInner>> {
        self.0.upgrade()
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    pub fn run_pass(&self) -> PassOutcome {
        match self.upgrade() {
            Some(inner) => inner.coordinator.run(&inner),
            None => PassOutcome::Skipped(SkipReason::SessionClosed),
        }
    }

    pub fn request_pass(&self) {
        if let Some(inner) = self.upgrade() {
            inner.request_pass();
        }
    }

    /// Coordinator phase, or `None` once the session is gone.
    pub fn phase(&self) -> Option<CoordinatorPhase> {
        self.upgrade().map(|inner| inner.coordinator.phase())
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
