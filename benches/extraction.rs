use criterion::{Criterion, criterion_group, criterion_main};
use k6_docs_index::docs::{extract_metadata, parse_front_matter_str};
use std::hint::black_box;
use std::path::Path;

const PAGE: &str = "---
title: 'Thresholds'
description: 'Thresholds are pass/fail criteria for your test metrics'
weight: 40
---

# Thresholds

Thresholds are the pass/fail criteria that you define for your test metrics.
If the performance of the system under test does not meet the conditions of
your threshold, the test finishes with a failed status.
";

pub fn criterion_benchmark(c: &mut Criterion) {
    let base = Path::new("/home/user/k6-docs/docs/sources");
    let paths: Vec<_> = [
        "k6/v1.0.x/using-k6/thresholds.md",
        "k6/next/javascript-api/k6-http/request.md",
        "k6-studio/set-up/installation.md",
        "v0.57.x/examples/get-started.md",
        "shared/some-partial.md",
    ]
    .iter()
    .map(|relative| base.join(relative))
    .collect();

    c.bench_function("path_metadata", |b| {
        b.iter(|| {
            for path in &paths {
                black_box(extract_metadata(black_box(path), black_box(base)));
            }
        });
    });

    c.bench_function("front_matter", |b| {
        b.iter(|| parse_front_matter_str(black_box(PAGE)));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
