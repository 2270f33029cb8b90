use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stagehand_core::identity::derive;
use stagehand_core::{page_fn, MemorySlotApplier, PageEntry, PageRegistry, Session};

const WIDGET_COUNTS: &[usize] = &[8, 64, 256];

fn registry(widgets: usize) -> Arc<PageRegistry> {
    let page = move |name: &'static str| {
        PageEntry::new(name, name).renderer(page_fn(move |ctx| {
            for index in 0..widgets {
                let discriminator = index.to_string();
                ctx.widget("row", Some(&discriminator), format!("{name} {index}"))?;
            }
            let visits = ctx.remember("visits", || 0u64)?;
            ctx.set_state("visits", visits + 1);
            Ok(())
        }))
    };
    let registry = PageRegistry::builder()
        .page(page("home"))
        .page(page("widgets"))
        .build()
        .expect("registry");
    Arc::new(registry)
}

fn bench_derive(c: &mut Criterion) {
    c.bench_function("identity_derive", |b| {
        b.iter(|| {
            for index in 0..64 {
                let discriminator = index.to_string();
                black_box(derive(
                    black_box("widgets/sub:page"),
                    black_box("row"),
                    Some(&discriminator),
                ));
            }
        });
    });
}

fn bench_steady_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("steady_pass");
    for &widgets in WIDGET_COUNTS {
        let session = Session::new(registry(widgets), MemorySlotApplier::new()).expect("session");
        group.bench_with_input(BenchmarkId::from_parameter(widgets), &widgets, |b, _| {
            b.iter(|| black_box(session.run_pass()));
        });
    }
    group.finish();
}

fn bench_navigating_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("navigating_pass");
    for &widgets in WIDGET_COUNTS {
        let session = Session::new(registry(widgets), MemorySlotApplier::new()).expect("session");
        let mut pages = ["home", "widgets"].into_iter().cycle();
        group.bench_with_input(BenchmarkId::from_parameter(widgets), &widgets, |b, _| {
            b.iter(|| {
                if let Some(page) = pages.next() {
                    let _ = session.select_page(page);
                }
                black_box(session.run_pass())
            });
        });
    }
    group.finish();
}

criterion_group!(pass, bench_derive, bench_steady_pass, bench_navigating_pass);
criterion_main!(pass);
