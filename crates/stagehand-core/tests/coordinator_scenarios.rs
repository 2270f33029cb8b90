use stagehand_core::{
    page_fn, CoordinatorPhase, Element, NavigationSelection, PageEntry, PageRegistry,
    PassOutcome, RenderError, SessionConfig, SkipReason,
};
use stagehand_testing::prelude::*;

fn stateful_registry(
    home: RecordingPage,
    broken: FailingPage,
    reentrant: ReentrantPage,
) -> PageRegistry {
    PageRegistry::builder()
        .header(RecordingPage::new("site header"))
        .page(PageEntry::new("home", "Home").renderer(home))
        .page(PageEntry::new("notes", "Notes").renderer(page_fn(|ctx| {
            let draft = ctx.remember("draft", || String::from("empty"))?;
            ctx.text(format!("draft: {draft}"))?;
            Ok(())
        })))
        .page(PageEntry::new("broken", "Broken").renderer(broken))
        .page(PageEntry::new("loop", "Loop").renderer(reentrant))
        .build()
        .expect("registry")
}

#[test]
fn session_starts_on_home_and_repeated_selection_is_a_no_op() {
    let harness = SessionHarness::new(sample_registry()).expect("harness");
    let session = harness.session();

    assert_eq!(session.selection(), NavigationSelection::page("home"));
    assert_eq!(session.select_page("widgets"), Ok(true));
    assert_eq!(session.select_page("widgets"), Ok(false));
    assert_eq!(harness.scheduler().requests(), 1);

    let report = harness.pass().expect("pass");
    assert!(report.navigated);
    assert_eq!(harness.texts("main:widgets"), vec!["widgets page"]);
}

#[test]
fn reentrant_pass_runs_no_second_renderer_and_leaves_navigation_alone() {
    let reentrant = ReentrantPage::default();
    let harness = SessionHarness::new(stateful_registry(
        RecordingPage::new("home"),
        FailingPage::new("boom"),
        reentrant.clone(),
    ))
    .expect("harness");
    let session = harness.session();
    session.select_page("loop").expect("select");
    let before = session.debug_info().navigation_changes;

    let report = harness.pass().expect("pass");
    assert!(report.is_clean());
    assert_eq!(reentrant.calls(), 1);
    assert_eq!(
        reentrant.nested_outcomes(),
        vec![PassOutcome::Skipped(SkipReason::Reentrant)]
    );
    assert_eq!(session.selection(), NavigationSelection::page("loop"));
    assert_eq!(session.debug_info().navigation_changes, before);
    assert_eq!(session.passes_run(), 1);
}

#[test]
fn failing_renderer_returns_to_idle_runs_cleanup_and_recovers() {
    let home = RecordingPage::new("home again");
    let broken = FailingPage::new("boom");
    let harness = SessionHarness::new(stateful_registry(
        home.clone(),
        broken.clone(),
        ReentrantPage::default(),
    ))
    .expect("harness");
    let session = harness.session();

    session.select_page("notes").expect("select");
    harness.pass().expect("notes pass");
    assert_eq!(session.value::<String>("notes::draft::"), Ok(Some("empty".into())));

    session.select_page("broken").expect("select");
    let report = harness.pass().expect("broken pass");
    assert_eq!(broken.calls(), 1);
    assert_eq!(session.phase(), CoordinatorPhase::Idle);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].error, RenderError::failed("boom"));
    assert_eq!(report.cleanup.removed, vec!["notes::draft::".to_string()]);
    assert_eq!(
        harness.elements("main:broken"),
        vec![
            Element::text("partial output"),
            Element::Error {
                message: "boom".into(),
                detail: None,
            },
        ]
    );

    session.select_page("home").expect("select");
    let next = harness.pass().expect("home pass");
    assert!(next.is_clean());
    assert_eq!(home.calls(), 1);
    assert_eq!(harness.texts("main:home"), vec!["home again"]);
    assert!(harness.elements("main:broken").is_empty());
    assert_eq!(harness.texts("header"), vec!["site header"]);
    // The failure stays visible for diagnostics.
    assert!(session.last_failure().is_some());
}

#[test]
fn navigation_clears_every_target_but_chrome_and_current_page() {
    let harness = SessionHarness::new(stateful_registry(
        RecordingPage::new("home"),
        FailingPage::new("boom"),
        ReentrantPage::default(),
    ))
    .expect("harness");
    let session = harness.session();
    harness.pass().expect("home pass");
    session.select_page("notes").expect("select");
    let report = harness.pass().expect("notes pass");

    assert_eq!(report.cleared_targets, vec![TargetId::new("main:home")]);
    assert_eq!(
        report.rendered,
        vec![TargetId::new("header"), TargetId::new("main:notes")]
    );
    for (target, populated) in session.debug_info().targets {
        let expected = target != TargetId::new("main:home");
        assert_eq!(populated, expected, "target {target}");
    }
}

#[test]
fn sub_pages_get_their_own_targets_and_state_prefixes() {
    let harness = SessionHarness::new(sample_registry()).expect("harness");
    let session = harness.session();
    session.select_page("course").expect("select");
    harness.pass().expect("course pass");
    assert_eq!(harness.texts("main:course"), Vec::<String>::new());
    assert_eq!(harness.elements("main:course").len(), 1);

    assert_eq!(session.select_sub_page("intro"), Ok(true));
    harness.pass().expect("intro pass");
    assert_eq!(harness.texts("main:course/intro"), vec!["intro"]);
    assert!(harness.elements("main:course").is_empty());

    session.select_sub_page("quiz").expect("select");
    let report = harness.pass().expect("quiz pass");
    assert!(report.is_clean());
    assert_eq!(harness.elements("main:course/quiz").len(), 1);
}

#[test]
fn custom_chrome_targets_are_kept() {
    let registry = PageRegistry::builder()
        .header(RecordingPage::new("top"))
        .footer(RecordingPage::new("bottom"))
        .page(PageEntry::new("start", "Start").renderer(RecordingPage::new("start")))
        .page(PageEntry::new("next", "Next").renderer(RecordingPage::new("next")))
        .build()
        .expect("registry");
    let config = SessionConfig::default()
        .with_default_page("start")
        .with_header_target("banner")
        .with_footer_target("legal");
    let harness = SessionHarness::with_config(registry, config).expect("harness");

    harness.pass().expect("first pass");
    harness.session().select_page("next").expect("select");
    let report = harness.pass().expect("second pass");
    assert_eq!(report.cleared_targets, vec![TargetId::new("main:start")]);
    assert_eq!(harness.texts("banner"), vec!["top"]);
    assert_eq!(harness.texts("legal"), vec!["bottom"]);
}

#[test]
fn panicking_page_does_not_block_later_navigation() {
    let home = RecordingPage::new("home");
    let registry = PageRegistry::builder()
        .page(PageEntry::new("home", "Home").renderer(home.clone()))
        .page(PageEntry::new("explode", "Explode").renderer(PanickingPage))
        .build()
        .expect("registry");
    let harness = SessionHarness::new(registry).expect("harness");
    let session = harness.session();

    session.select_page("explode").expect("select");
    let report = harness.pass().expect("explode pass");
    assert_eq!(
        report.failures[0].error,
        RenderError::Panicked {
            message: "renderer exploded".into()
        }
    );
    assert!(harness.dump().contains("ERROR renderer panicked: renderer exploded"));
    assert!(!session.is_locked());

    session.select_page("home").expect("select");
    assert!(harness.pass().expect("home pass").is_clean());
    assert_eq!(home.seen(), vec![NavigationSelection::page("home")]);
}
