use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::applier::MemorySlotApplier;
use crate::page::{page_fn, PageEntry, SubPageEntry};

#[derive(Default)]
struct CountingScheduler(AtomicUsize);

impl PassScheduler for CountingScheduler {
    fn request_pass(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

impl CountingScheduler {
    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

fn registry() -> Arc<PageRegistry> {
    let registry = PageRegistry::builder()
        .page(PageEntry::new("home", "Home").renderer(page_fn(|ctx| {
            let visits = ctx.remember("visits", || 0u32)?;
            ctx.set_state("visits", visits + 1);
            ctx.text(format!("visit {}", visits + 1))?;
            Ok(())
        })))
        .page(PageEntry::new("widgets", "Widgets").renderer(page_fn(|ctx| {
            let token = ctx.widget("name", None, "Name")?;
            let name: Option<String> = ctx.value(&token)?;
            ctx.text(format!("hello {}", name.unwrap_or_default()))?;
            Ok(())
        })))
        .page(
            PageEntry::new("course", "Course")
                .sub_page(SubPageEntry::new("intro", "Intro"))
                .sub_page(SubPageEntry::new("quiz", "Quiz")),
        )
        .build()
        .expect("registry");
    Arc::new(registry)
}

fn session() -> (Session, MemorySlotApplier, Arc<CountingScheduler>) {
    let applier = MemorySlotApplier::new();
    let scheduler = Arc::new(CountingScheduler::default());
    let session = Session::with_config(
        SessionConfig::default(),
        registry(),
        applier.clone(),
        scheduler.clone(),
    )
    .expect("session");
    (session, applier, scheduler)
}

#[test]
fn default_page_must_be_registered() {
    let result = Session::with_config(
        SessionConfig::default().with_default_page("missing"),
        registry(),
        MemorySlotApplier::new(),
        Arc::new(DefaultScheduler),
    );
    assert_eq!(
        result.err(),
        Some(RegistryError::MissingDefault {
            page: "missing".into()
        })
    );
}

#[test]
fn page_targets_must_not_overlap_chrome() {
    let registry = PageRegistry::builder()
        .header(page_fn(|ctx| {
            ctx.text("site header")?;
            Ok(())
        }))
        .page(PageEntry::new("home", "Home").target("header"))
        .build()
        .expect("registry");
    let result = Session::new(Arc::new(registry), MemorySlotApplier::new());
    assert_eq!(
        result.err(),
        Some(RegistryError::TargetCollision {
            selection: "home".into(),
            target: TargetId::header(),
        })
    );
}

#[test]
fn sub_page_default_target_is_checked_against_custom_chrome() {
    let config = SessionConfig::default().with_footer_target("main:course/quiz");
    let result = Session::with_config(
        config,
        registry(),
        MemorySlotApplier::new(),
        Arc::new(DefaultScheduler),
    );
    assert_eq!(
        result.err(),
        Some(RegistryError::TargetCollision {
            selection: "course/quiz".into(),
            target: TargetId::new("main:course/quiz"),
        })
    );

    let shared = SessionConfig::default().with_footer_target("header");
    let result = Session::with_config(
        shared,
        registry(),
        MemorySlotApplier::new(),
        Arc::new(DefaultScheduler),
    );
    assert!(matches!(
        result,
        Err(RegistryError::TargetCollision { .. })
    ));
}

#[test]
fn selection_changes_request_a_pass_only_when_different() {
    let (session, _, scheduler) = session();
    assert_eq!(session.selection(), NavigationSelection::page("home"));

    assert_eq!(session.select_page("home"), Ok(false));
    assert_eq!(scheduler.count(), 0);
    assert_eq!(session.select_page("widgets"), Ok(true));
    assert_eq!(scheduler.count(), 1);
    assert_eq!(session.select_page("widgets"), Ok(false));
    assert_eq!(scheduler.count(), 1);
}

#[test]
fn invalid_selections_are_rejected_before_commit() {
    let (session, _, scheduler) = session();
    assert_eq!(
        session.select_page("nope"),
        Err(NavigationError::UnknownPage { page: "nope".into() })
    );
    assert_eq!(
        session.select_sub_page("intro"),
        Err(NavigationError::NoSubPages { page: "home".into() })
    );
    session.select_page("course").expect("select");
    assert_eq!(session.select_sub_page("quiz"), Ok(true));
    assert_eq!(
        session.selection(),
        NavigationSelection::page("course").with_sub_page("quiz")
    );
    assert_eq!(scheduler.count(), 2);
}

#[test]
fn page_state_is_cleaned_up_after_leaving() {
    let (session, applier, _) = session();
    session.run_pass();
    session.run_pass();
    assert_eq!(applier.texts(&TargetId::new("main:home")), vec!["visit 2"]);
    assert_eq!(session.value::<u32>("home::visits::"), Ok(Some(2)));

    session.select_page("widgets").expect("select");
    let report = session.run_pass().into_report().expect("report");
    assert!(report.navigated);
    assert_eq!(report.cleanup.removed, vec!["home::visits::".to_string()]);
    assert_eq!(session.value::<u32>("home::visits::"), Ok(None));

    // Coming back starts over.
    session.select_page("home").expect("select");
    session.run_pass();
    assert_eq!(applier.texts(&TargetId::new("main:home")), vec!["visit 1"]);
}

#[test]
fn interaction_value_reaches_the_widget() {
    let (session, applier, scheduler) = session();
    session.select_page("widgets").expect("select");
    session.run_pass();
    let token = crate::identity::derive("widgets", "name", None);

    assert!(!session.interact(&token, String::from("Ada")));
    assert_eq!(scheduler.count(), 2);
    session.run_pass();
    assert_eq!(
        applier.texts(&TargetId::new("main:widgets")),
        vec!["hello Ada"]
    );
}

#[test]
fn reset_state_drops_keys_and_queue() {
    let (session, _, scheduler) = session();
    session.run_pass();
    assert_eq!(session.with_state(SessionState::len), 1);
    assert_eq!(session.reset_state(), 1);
    assert_eq!(session.with_state(SessionState::len), 0);
    assert_eq!(scheduler.count(), 1);
}

#[test]
fn debug_info_summarizes_the_session() {
    let (session, _, _) = session();
    session.run_pass();
    let info = session.debug_info();
    assert_eq!(info.selection, NavigationSelection::page("home"));
    assert_eq!(info.passes_run, 1);
    assert_eq!(info.stored_keys, 1);
    assert_eq!(info.pending_cleanup, 0);
    assert_eq!(info.targets, vec![(TargetId::new("main:home"), true)]);
    assert!(info.to_string().contains("last failure: none"));
}

#[test]
fn handle_outlives_session() {
    let (session, _, _) = session();
    let handle = session.handle();
    assert!(handle.is_alive());
    drop(session);
    assert!(!handle.is_alive());
    assert_eq!(
        handle.run_pass(),
        PassOutcome::Skipped(SkipReason::SessionClosed)
    );
    assert_eq!(handle.phase(), None);
}
