//! 工具函数性能基准测试

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use keygate::storage::{KeyRecord, KeyStats};
use keygate::utils::url_validator::validate_url;
use keygate::utils::{constant_time_eq, generate_key_id, generate_random_code};

// ============== key id 生成 ==============

fn bench_generate_key_id(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/generate_key_id");

    group.bench_function("default", |b| {
        b.iter(|| black_box(generate_key_id()));
    });

    for len in [6, 12, 32] {
        group.bench_with_input(BenchmarkId::new("random_code", len), &len, |b, &len| {
            b.iter(|| black_box(generate_random_code(len)));
        });
    }

    group.finish();
}

// ============== validate_url ==============

fn bench_validate_url(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/validate_url");

    group.bench_function("valid_https", |b| {
        b.iter(|| assert!(validate_url(black_box("https://example.com/a?x=1")).is_ok()));
    });

    group.bench_function("dangerous_scheme", |b| {
        b.iter(|| assert!(validate_url(black_box("javascript:alert(1)")).is_err()));
    });

    let long_url = format!("https://example.com/{}", "segment/".repeat(200));
    group.bench_function("long_path", |b| {
        b.iter(|| assert!(validate_url(black_box(&long_url)).is_ok()));
    });

    group.finish();
}

// ============== token 比较 / 计数 ==============

fn bench_token_compare(c: &mut Criterion) {
    let token = "a".repeat(64);
    let other = format!("{}b", "a".repeat(63));

    c.bench_function("utils/constant_time_eq", |b| {
        b.iter(|| black_box(constant_time_eq(black_box(&token), black_box(&other))));
    });
}

fn bench_key_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("storage/key_stats");
    let now = chrono::Utc::now();

    for size in [100usize, 10_000] {
        let records: Vec<KeyRecord> = (0..size)
            .map(|i| {
                let mut r = KeyRecord::new(
                    format!("key{}", i),
                    "https://example.com",
                    "https://s.example/x",
                    now,
                );
                if i % 3 == 0 {
                    r.mark_used(now);
                }
                r
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| black_box(KeyStats::from_records(records)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_generate_key_id,
    bench_validate_url,
    bench_token_compare,
    bench_key_stats
);
criterion_main!(benches);
