//! Pass orchestration.
//!
//! A pass locks the coordinator, reads the current selection, clears targets
//! the selection no longer uses, queues the departed pages' state for
//! cleanup, renders header, page and footer, then processes the cleanup
//! queue and unlocks. The unlock happens on every exit path, including a
//! renderer that panicked.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::cleanup::CleanupReport;
use crate::context::RenderContext;
use crate::element::{Element, NoticeLevel};
use crate::error::RenderError;
use crate::identity::{IdentityKeyGenerator, IssuedKeys};
use crate::navigation::NavigationSelection;
use crate::page::{PageRenderer, Route, CHROME_CONTEXT_PREFIX};
use crate::session::SessionInner;
use crate::target::{KeepSet, TargetId};
use crate::PassId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinatorPhase {
    #[default]
    Idle,
    Locked,
    /// A page, header or footer renderer is running.
    RenderingChild,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another pass of the same session was already running.
    Reentrant,
    SessionClosed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RendererFailure {
    pub pass: PassId,
    pub target: TargetId,
    pub selection: NavigationSelection,
    pub error: RenderError,
}

impl fmt::Display for RendererFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pass {} rendering `{}` into `{}`: {}",
            self.pass, self.selection, self.target, self.error
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    pub pass: PassId,
    pub selection: NavigationSelection,
    /// Whether the selection changed since the previous pass.
    pub navigated: bool,
    pub cleared_targets: Vec<TargetId>,
    /// Targets repopulated this pass, in render order.
    pub rendered: Vec<TargetId>,
    pub failures: Vec<RendererFailure>,
    pub cleanup: CleanupReport,
}

impl PassReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    Completed(PassReport),
    Skipped(SkipReason),
}

impl PassOutcome {
    pub fn report(&self) -> Option<&PassReport> {
        match self {
            PassOutcome::Completed(report) => Some(report),
            PassOutcome::Skipped(_) => None,
        }
    }

    pub fn into_report(self) -> Option<PassReport> {
        match self {
            PassOutcome::Completed(report) => Some(report),
            PassOutcome::Skipped(_) => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, PassOutcome::Skipped(_))
    }
}

#[derive(Debug, Default)]
pub(crate) struct RenderCoordinator {
    locked: Cell<bool>,
    phase: Cell<CoordinatorPhase>,
    next_pass: Cell<PassId>,
    completed: Cell<u64>,
}

impl RenderCoordinator {
    pub(crate) fn phase(&self) -> CoordinatorPhase {
        self.phase.get()
    }

    pub(crate) fn is_locked(&self) -> bool {
        self.locked.get()
    }

    pub(crate) fn completed_passes(&self) -> u64 {
        self.completed.get()
    }

    pub(crate) fn run(&self, session: &SessionInner) -> PassOutcome {
        if self.locked.replace(true) {
            log::debug!("pass rejected: a pass is already running");
            return PassOutcome::Skipped(SkipReason::Reentrant);
        }
        self.phase.set(CoordinatorPhase::Locked);
        let guard = PassGuard {
            coordinator: self,
            session,
            finished: false,
        };

        let pass = self.next_pass.get() + 1;
        self.next_pass.set(pass);
        session.targets.borrow_mut().advance(pass);

        let (selection, change) = {
            let mut navigation = session.navigation.borrow_mut();
            (navigation.selection(), navigation.take_change())
        };
        let registry = session.registry.as_ref();
        let config = &session.config;
        let page_target = registry.target_for(&selection);
        log::trace!("pass {pass}: rendering `{selection}` into `{page_target}`");

        let mut cleared_targets = Vec::new();
        if let Some(change) = &change {
            let keep: KeepSet = [
                config.header_target.clone(),
                config.footer_target.clone(),
                page_target.clone(),
            ]
            .into_iter()
            .collect();
            let cleared = session.targets.borrow_mut().clear_all_except(&keep);
            match cleared {
                Ok(cleared) => cleared_targets = cleared,
                Err(err) => log::error!("pass {pass}: clearing stale targets failed: {err}"),
            }
            let prefixes: Vec<String> = change
                .departed
                .iter()
                .map(NavigationSelection::owned_state_prefix)
                .collect();
            let queued = session
                .cleanup
                .borrow_mut()
                .enqueue(&prefixes, &session.state.borrow());
            log::trace!(
                "pass {pass}: left {} selection(s), {queued} key(s) queued for cleanup",
                change.departed.len()
            );
        }

        let mut run = ChildRun {
            coordinator: self,
            session,
            selection: &selection,
            pass,
            issued: IssuedKeys::default(),
            rendered: Vec::new(),
            failures: Vec::new(),
        };

        if let Some(header) = registry.header() {
            run.render(&config.header_target, chrome_keys(&config.header_target), header);
        }
        match registry.resolve(&selection) {
            Ok(Route::Renderer(renderer)) => {
                run.render(
                    &page_target,
                    IdentityKeyGenerator::for_context(selection.context()),
                    renderer,
                );
            }
            Ok(Route::UnderConstruction { title }) => {
                run.placeholder(
                    &page_target,
                    Element::notice(
                        NoticeLevel::Warning,
                        format!("{title} is under construction"),
                    ),
                );
            }
            Ok(Route::AwaitingSubPage { title, sub_pages }) => {
                run.placeholder(
                    &page_target,
                    Element::notice(
                        NoticeLevel::Info,
                        format!("{title}: select a sub-page ({})", sub_pages.join(", ")),
                    ),
                );
            }
            Err(err) => run.fail(&page_target, err.into()),
        }
        if let Some(footer) = registry.footer() {
            run.render(&config.footer_target, chrome_keys(&config.footer_target), footer);
        }

        let ChildRun {
            rendered, failures, ..
        } = run;
        let cleanup = guard.finish();
        if !cleanup.removed.is_empty() {
            log::trace!("pass {pass}: cleanup removed {} key(s)", cleanup.removed.len());
        }
        if let Some(failure) = failures.last() {
            *session.last_failure.borrow_mut() = Some(failure.clone());
        }
        self.completed.set(self.completed.get() + 1);

        PassOutcome::Completed(PassReport {
            pass,
            selection,
            navigated: change.is_some(),
            cleared_targets,
            rendered,
            failures,
            cleanup,
        })
    }
}

fn chrome_keys(target: &TargetId) -> IdentityKeyGenerator {
    IdentityKeyGenerator::for_context(format!("{CHROME_CONTEXT_PREFIX}{target}"))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

/// Renderer invocations of a single pass.
struct ChildRun<'a> {
    coordinator: &'a RenderCoordinator,
    session: &'a SessionInner,
    selection: &'a NavigationSelection,
    pass: PassId,
    issued: IssuedKeys,
    rendered: Vec<TargetId>,
    failures: Vec<RendererFailure>,
}

impl ChildRun<'_> {
    fn render(&mut self, target: &TargetId, keys: IdentityKeyGenerator, renderer: &dyn PageRenderer) {
        let claimed = self.session.targets.borrow_mut().begin(target, self.pass);
        if let Err(err) = claimed {
            self.fail(target, err.into());
            return;
        }
        self.coordinator.phase.set(CoordinatorPhase::RenderingChild);
        // No session borrow may be held here: renderers re-enter the session.
        let result = {
            let mut ctx = RenderContext::new(
                self.session,
                self.selection,
                target,
                self.pass,
                keys,
                &mut self.issued,
            );
            panic::catch_unwind(AssertUnwindSafe(|| renderer.render(&mut ctx))).unwrap_or_else(
                |payload| {
                    Err(RenderError::Panicked {
                        message: panic_message(payload.as_ref()),
                    })
                },
            )
        };
        self.coordinator.phase.set(CoordinatorPhase::Locked);
        if let Err(err) = result {
            self.fail(target, err);
        }
        self.session.targets.borrow_mut().finish(target);
        self.rendered.push(target.clone());
    }

    fn placeholder(&mut self, target: &TargetId, element: Element) {
        let result = self
            .session
            .targets
            .borrow_mut()
            .render_into(target, self.pass, |scope| scope.emit(element))
            .and_then(|written| written);
        match result {
            Ok(_) => self.rendered.push(target.clone()),
            Err(err) => self.fail(target, err.into()),
        }
    }

    /// Records a failure and shows it in `target`, replacing nothing the
    /// renderer already wrote.
    fn fail(&mut self, target: &TargetId, error: RenderError) {
        log::error!(
            "pass {}: renderer for `{}` in `{target}` failed: {error}",
            self.pass,
            self.selection
        );
        let shown = Element::Error {
            message: error.to_string(),
            detail: error.detail(),
        };
        let mut targets = self.session.targets.borrow_mut();
        targets.get_or_create(target);
        if let Err(err) = targets.write(target, self.pass, shown) {
            log::error!("pass {}: could not display failure in `{target}`: {err}", self.pass);
        }
        self.failures.push(RendererFailure {
            pass: self.pass,
            target: target.clone(),
            selection: self.selection.clone(),
            error,
        });
    }
}

/// Runs cleanup and unlocks the coordinator when the pass ends, however it ends.
struct PassGuard<'a> {
    coordinator: &'a RenderCoordinator,
    session: &'a SessionInner,
    finished: bool,
}

impl PassGuard<'_> {
    fn finish(mut self) -> CleanupReport {
        self.finished = true;
        self.release()
    }

    fn release(&self) -> CleanupReport {
        let report = match (
            self.session.state.try_borrow_mut(),
            self.session.cleanup.try_borrow_mut(),
        ) {
            (Ok(mut state), Ok(mut cleanup)) => cleanup.process(&mut state),
            _ => {
                log::error!("cleanup skipped: session store is still borrowed");
                CleanupReport::default()
            }
        };
        if let Ok(mut targets) = self.session.targets.try_borrow_mut() {
            targets.release_all();
        }
        self.coordinator.phase.set(CoordinatorPhase::Idle);
        self.coordinator.locked.set(false);
        report
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.release();
        }
    }
}

#[cfg(test)]
#[path = "tests/coordinator_tests.rs"]
mod tests;
