//! Matcher and highlight throughput

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tf_core::{highlight_spans, FilterState, MatchType, Matcher};

fn rules(match_type: MatchType) -> FilterState {
    FilterState {
        keywords: ["rust", "tokio", "async", "wasm", "react", "go", "zig", "c++"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        channels: vec!["Acme".to_string(), "Fireship".to_string()],
        match_type,
        ..FilterState::default()
    }
}

fn titles() -> Vec<(String, String)> {
    (0..200)
        .map(|i| {
            (
                format!("Episode {} - building things with tools and friends", i),
                format!("Channel number {}", i % 17),
            )
        })
        .collect()
}

fn bench_should_show(c: &mut Criterion) {
    let titles = titles();
    for (name, match_type) in [
        ("should_show_contains", MatchType::Contains),
        ("should_show_whole_word", MatchType::WholeWord),
    ] {
        let matcher = Matcher::new(&rules(match_type)).unwrap();
        c.bench_function(name, |b| {
            b.iter(|| {
                titles
                    .iter()
                    .filter(|(title, channel)| matcher.should_show(black_box(title), black_box(channel)))
                    .count()
            });
        });
    }
}

fn bench_highlight(c: &mut Criterion) {
    let keywords = ["rust", "async", "web"];
    c.bench_function("highlight_spans", |b| {
        b.iter(|| {
            highlight_spans(
                black_box("Async Rust on the web: Rust, WASM and async runtimes"),
                &keywords,
                "tf-highlight",
            )
        });
    });
}

criterion_group!(benches, bench_should_show, bench_highlight);
criterion_main!(benches);
