//! Matching engine benchmarks
//!
//! The extension consults the matcher on every navigation and on every
//! content-script text probe, so both paths should stay well under a
//! microsecond per call for realistic rule counts.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fockey_core::{BlockMatcher, DayMask, RuleKind, RuleSet, RuleSource, Schedule, Settings, TimeWindow};

fn generate_rules(count: usize) -> RuleSet {
    let mut rules = RuleSet::new();
    for i in 0..count {
        rules.insert(RuleKind::Domain, &format!("site-{i}.example.com")).unwrap();
        if i % 10 == 0 {
            rules.insert(RuleKind::UrlKeyword, &format!("keyword{i}")).unwrap();
            rules.insert(RuleKind::ContentKeyword, &format!("topic {i}")).unwrap();
        }
    }
    rules
}

fn matcher_with(count: usize) -> BlockMatcher {
    let mut matcher = BlockMatcher::new();
    matcher.add_rules(&generate_rules(count), RuleSource::QuickBlock);
    matcher
}

fn match_url_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_url");

    for count in [10, 100, 1000] {
        let matcher = matcher_with(count);
        group.bench_with_input(BenchmarkId::new("allowed", count), &matcher, |b, matcher| {
            b.iter(|| black_box(matcher.match_url(black_box("https://docs.rs/serde/latest/serde/"))));
        });
        group.bench_with_input(BenchmarkId::new("blocked", count), &matcher, |b, matcher| {
            b.iter(|| black_box(matcher.match_url(black_box("https://a.b.site-7.example.com/x"))));
        });
    }

    group.finish();
}

fn match_content_benchmark(c: &mut Criterion) {
    let matcher = matcher_with(1000);
    let title = "Ten hours of relaxing rain sounds for deep focus and studying";

    c.bench_function("match_content_1000", |b| {
        b.iter(|| black_box(matcher.match_content(black_box(title))));
    });
}

fn build_matcher_benchmark(c: &mut Criterion) {
    let schedules: Vec<Schedule> = (0..20)
        .map(|i| {
            Schedule::new(
                format!("s{i}"),
                format!("Schedule {i}"),
                DayMask::EVERY_DAY,
                vec![TimeWindow::all_day()],
                0,
            )
            .with_rules(generate_rules(50))
        })
        .collect();
    let settings = Settings { schedules, ..Settings::default() };

    c.bench_function("settings_matcher_20x50", |b| {
        b.iter(|| black_box(settings.matcher(black_box(3_600_000), 0)));
    });
}

criterion_group!(benches, match_url_benchmark, match_content_benchmark, build_matcher_benchmark);
criterion_main!(benches);
