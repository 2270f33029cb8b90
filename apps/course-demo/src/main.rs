use stagehand_app_shell::{AppShell, SessionId, ShellError};
use stagehand_core::identity::derive;
use stagehand_core::{
    page_fn, NoticeLevel, PageEntry, PageRegistry, RegistryError, RenderContext, RenderError,
    SubPageEntry,
};

fn header(ctx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    ctx.text("Rerun UI course")?;
    let selection = ctx.current_selection().clone();
    ctx.text(format!("Module: {}", selection.page_id))?;
    if let Some(lesson) = &selection.sub_page_id {
        ctx.text(format!("Lesson: {lesson}"))?;
    }
    Ok(())
}

fn footer(ctx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    ctx.text(format!("pass {}", ctx.pass()))?;
    Ok(())
}

fn welcome(ctx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    let visits = ctx.remember("visits", || 0u32)? + 1;
    ctx.set_state("visits", visits);
    ctx.text("Welcome! Pick a module to start.")?;
    ctx.notice(NoticeLevel::Info, format!("You have opened this page {visits} time(s)"))?;
    Ok(())
}

fn hello(ctx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    ctx.text("Hello! Every interaction reruns the page from the top.")?;
    Ok(())
}

fn basic_widgets(ctx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    let name = ctx.widget("name", None, "What is your name?")?;
    let name = ctx.value::<String>(&name)?;
    for level in ["beginner", "intermediate", "advanced"] {
        ctx.widget("level", Some(level), level)?;
    }
    match name {
        Some(name) => ctx.notice(NoticeLevel::Success, format!("Nice to meet you, {name}"))?,
        None => ctx.notice(NoticeLevel::Info, "Type your name above")?,
    };
    Ok(())
}

fn charts(ctx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    let points = ctx.remember("points", || vec![3u32, 7, 4, 9])?;
    for (index, value) in points.iter().enumerate() {
        ctx.text(format!("{index:>2} {}", "#".repeat(*value as usize)))?;
    }
    Ok(())
}

fn data_handling(_ctx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    Err(RenderError::with_detail(
        "sample dataset unavailable",
        "data/sales.csv not found",
    ))
}

fn registry() -> Result<PageRegistry, RegistryError> {
    PageRegistry::builder()
        .header(page_fn(header))
        .footer(page_fn(footer))
        .page(PageEntry::new("home", "Home").renderer(page_fn(welcome)))
        .page(
            PageEntry::new("fundamentals", "Module 1: Fundamentals")
                .sub_page(SubPageEntry::new("hello", "Hello").renderer(page_fn(hello)))
                .sub_page(
                    SubPageEntry::new("widgets", "Basic widgets").renderer(page_fn(basic_widgets)),
                )
                .sub_page(SubPageEntry::new("layout", "Sidebar and layout")),
        )
        .page(
            PageEntry::new("visualization", "Module 2: Visualization")
                .sub_page(SubPageEntry::new("charts", "Basic charts").renderer(page_fn(charts)))
                .sub_page(SubPageEntry::new("dashboards", "Interactive dashboards")),
        )
        .page(
            PageEntry::new("interactivity", "Module 3: Interactivity")
                .sub_page(
                    SubPageEntry::new("data", "Data handling").renderer(page_fn(data_handling)),
                ),
        )
        .page(PageEntry::new("deployment", "Module 5: Deployment"))
        .build()
}

fn show(shell: &AppShell, id: SessionId, step: &str) {
    let Some(session) = shell.session(id) else {
        return;
    };
    let Some(applier) = shell.applier(id) else {
        return;
    };
    let main = session.registry().target_for(&session.selection());
    println!("── {step} ({}) ──", session.selection());
    for element in applier.elements(&main) {
        println!("  {element}");
    }
}

fn run() -> Result<(), ShellError> {
    let registry = registry()?;
    let mut shell = AppShell::new(registry);
    let id = shell.open_session()?;
    show(&shell, id, "start");

    shell.select_page(id, "fundamentals")?;
    shell.update();
    show(&shell, id, "open module 1");

    shell.select_sub_page(id, "widgets")?;
    shell.update();
    show(&shell, id, "basic widgets");

    shell.interact(id, &derive("fundamentals/widgets", "name", None), String::from("Ada"))?;
    shell.update();
    show(&shell, id, "typed a name");

    shell.select_page(id, "interactivity")?;
    shell.select_sub_page(id, "data")?;
    shell.update();
    show(&shell, id, "failing lesson");

    shell.select_page(id, "deployment")?;
    shell.update();
    show(&shell, id, "under construction");

    shell.select_page(id, "home")?;
    shell.update();
    show(&shell, id, "back home");

    shell.log_debug_info();
    Ok(())
}

fn main() {
    env_logger::init();

    println!("=== Stagehand course demo ===");
    println!("Scripted navigation through a course catalog.");
    println!("Set RUST_LOG=debug to see pass bookkeeping.");
    println!();

    if let Err(err) = run() {
        log::error!("demo failed: {err}");
        std::process::exit(1);
    }
}
