//! Benchmarks for offset translation and matching.
//!
//! Measures the cost of mapping engine byte offsets back to UTF-16 indices for subjects of
//! different character widths, and a full compile-once match loop for comparison.

extern crate nativeregex;

use criterion::{criterion_group, criterion_main, Criterion};
use nativeregex::{
    backend::default_backend, map_offsets_to_indices, Code, CompileOptions, MatchData,
    MatchOptions,
};
use std::hint::black_box;
use widestring::U16String;

fn subject(unit: &str, repeat: usize) -> U16String {
    U16String::from_str(&unit.repeat(repeat))
}

/// Benchmark translating a match spanning an ASCII subject.
fn bench_ascii(c: &mut Criterion) {
    let text = subject("user@example.com ", 256);
    let end = text.len() as i64;
    let ovector = [0, end, 0, 4, 5, 16];

    c.bench_function("offsets_ascii", |b| {
        b.iter(|| {
            let indices = map_offsets_to_indices(black_box(&text), black_box(&ovector)).unwrap();
            black_box(indices)
        });
    });
}

/// Benchmark translating a match over mixed 2-, 3- and 4-byte characters.
fn bench_mixed_width(c: &mut Criterion) {
    let text = subject("é€🌐a", 256);
    let end = String::from_utf16(text.as_slice()).unwrap().len() as i64;
    let ovector = [0, end, 2, 5, -1, -1];

    c.bench_function("offsets_mixed_width", |b| {
        b.iter(|| {
            let indices = map_offsets_to_indices(black_box(&text), black_box(&ovector)).unwrap();
            black_box(indices)
        });
    });
}

/// Benchmark a compile-once match loop, including subject transcoding.
fn bench_captures(c: &mut Criterion) {
    let backend = default_backend();
    let code = Code::compile(
        &backend,
        widestring::u16str!(r"(\w+)@(\w+\.\w+)"),
        CompileOptions::UTF,
        None,
    )
    .unwrap();
    let mut match_data = MatchData::from_code(&code).unwrap();
    let text = U16String::from_str(&format!("{}user@example.com", "🌐 ".repeat(64)));

    c.bench_function("captures_after_wide_prefix", |b| {
        b.iter(|| {
            let caps = code
                .captures(black_box(&text), 0, MatchOptions::empty(), &mut match_data, None)
                .unwrap();
            black_box(caps)
        });
    });
}

criterion_group!(benches, bench_ascii, bench_mixed_width, bench_captures);
criterion_main!(benches);
