use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use stagehand_core::{
    Element, MemorySlotApplier, NavigationSelection, PageEntry, PageRegistry, PageRenderer,
    PassOutcome, PassReport, PassScheduler, RenderContext, RenderError, Session, SessionConfig,
    SubPageEntry, TargetId,
};

/// Counts calls shared between a renderer and the test that owns it.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn bump(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Writes a fixed line of text and records every selection it saw.
#[derive(Clone)]
pub struct RecordingPage {
    text: String,
    calls: CallCounter,
    seen: Arc<Mutex<Vec<NavigationSelection>>>,
}

impl RecordingPage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            calls: CallCounter::default(),
            seen: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn seen(&self) -> Vec<NavigationSelection> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

impl PageRenderer for RecordingPage {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<(), RenderError> {
        self.calls.bump();
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(ctx.current_selection().clone());
        }
        ctx.text(self.text.clone())?;
        Ok(())
    }
}

/// Writes a line, then fails with `message`.
#[derive(Clone)]
pub struct FailingPage {
    message: String,
    calls: CallCounter,
}

impl FailingPage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            calls: CallCounter::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl PageRenderer for FailingPage {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<(), RenderError> {
        self.calls.bump();
        ctx.text("partial output")?;
        Err(RenderError::failed(self.message.clone()))
    }
}

pub struct PanickingPage;

impl PageRenderer for PanickingPage {
    fn render(&self, _ctx: &mut RenderContext<'_>) -> Result<(), RenderError> {
        panic!("renderer exploded");
    }
}

/// Asks for another pass until it has rendered `limit` times. A limit of
/// `usize::MAX` never settles.
#[derive(Clone)]
pub struct RerunRequestingPage {
    limit: usize,
    calls: CallCounter,
}

impl RerunRequestingPage {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            calls: CallCounter::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl PageRenderer for RerunRequestingPage {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<(), RenderError> {
        let calls = self.calls.bump();
        ctx.text(format!("render {calls}"))?;
        if calls < self.limit {
            ctx.request_rerun();
        }
        Ok(())
    }
}

/// Tries to run a nested pass from inside the renderer and records the result.
#[derive(Clone, Default)]
pub struct ReentrantPage {
    calls: CallCounter,
    nested: Arc<Mutex<Vec<PassOutcome>>>,
}

impl ReentrantPage {
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn nested_outcomes(&self) -> Vec<PassOutcome> {
        self.nested
            .lock()
            .map(|nested| nested.clone())
            .unwrap_or_default()
    }
}

impl PageRenderer for ReentrantPage {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<(), RenderError> {
        self.calls.bump();
        let outcome = ctx.session().run_pass();
        if let Ok(mut nested) = self.nested.lock() {
            nested.push(outcome);
        }
        ctx.text("reentrant")?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CountingScheduler {
    requests: AtomicUsize,
}

impl CountingScheduler {
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Returns and resets the request count.
    pub fn take(&self) -> usize {
        self.requests.swap(0, Ordering::SeqCst)
    }
}

impl PassScheduler for CountingScheduler {
    fn request_pass(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

/// Registry with a handful of pages covering every route kind:
/// `home` and `widgets` render text, `broken` fails, `course` has sub-pages
/// (`intro` renders, `quiz` is under construction), `about` has no renderer.
pub fn sample_registry() -> PageRegistry {
    PageRegistry::builder()
        .page(PageEntry::new("home", "Home").renderer(RecordingPage::new("home page")))
        .page(PageEntry::new("widgets", "Widgets").renderer(RecordingPage::new("widgets page")))
        .page(PageEntry::new("broken", "Broken").renderer(FailingPage::new("boom")))
        .page(
            PageEntry::new("course", "Course")
                .sub_page(SubPageEntry::new("intro", "Intro").renderer(RecordingPage::new("intro")))
                .sub_page(SubPageEntry::new("quiz", "Quiz")),
        )
        .page(PageEntry::new("about", "About"))
        .build()
        .expect("sample registry is valid")
}

/// A session wired to an inspectable applier and a counting scheduler.
pub struct SessionHarness {
    session: Session,
    applier: MemorySlotApplier,
    scheduler: Arc<CountingScheduler>,
}

impl SessionHarness {
    pub fn new(registry: PageRegistry) -> Result<Self, stagehand_core::RegistryError> {
        Self::with_config(registry, SessionConfig::default())
    }

    pub fn with_config(
        registry: PageRegistry,
        config: SessionConfig,
    ) -> Result<Self, stagehand_core::RegistryError> {
        let applier = MemorySlotApplier::new();
        let scheduler = Arc::new(CountingScheduler::default());
        let session = Session::with_config(
            config,
            Arc::new(registry),
            applier.clone(),
            scheduler.clone(),
        )?;
        Ok(Self {
            session,
            applier,
            scheduler,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn applier(&self) -> &MemorySlotApplier {
        &self.applier
    }

    pub fn scheduler(&self) -> &CountingScheduler {
        &self.scheduler
    }

    /// Runs a pass and returns its report, or `None` if it was skipped.
    pub fn pass(&self) -> Option<PassReport> {
        self.session.run_pass().into_report()
    }

    pub fn elements(&self, target: &str) -> Vec<Element> {
        self.applier.elements(&TargetId::new(target))
    }

    pub fn texts(&self, target: &str) -> Vec<String> {
        self.applier.texts(&TargetId::new(target))
    }

    pub fn dump(&self) -> String {
        self.applier.dump()
    }
}
