//! Benchmarks for the per-pair hot paths: correlation over a growing method
//! pool and the static detection cascade.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::path::Path;
use testverdict::detection::expression::evaluate;
use testverdict::testkit::sample_pair;
use testverdict::{correlate, parse_source, DetectionInput, DivergenceDetector};

/// A Java class with `methods` small methods and a test class calling each.
fn generate_project(methods: usize) -> (String, String) {
    let mut source = String::from("public class Pricing {\n");
    let mut tests = String::from(
        "import org.junit.jupiter.api.Test;\nimport static org.junit.jupiter.api.Assertions.*;\n\nclass PricingTest {\n",
    );
    for i in 0..methods {
        source.push_str(&format!(
            "    public double rate{i}(double price) {{\n        return price * 0.{:02};\n    }}\n\n",
            (i % 90) + 10
        ));
        tests.push_str(&format!(
            "    @Test\n    void checksCase{i}() {{\n        Pricing p = new Pricing();\n        assertEquals({}, p.rate{i}(100));\n    }}\n\n",
            (i % 90) + 10
        ));
    }
    source.push_str("}\n");
    tests.push_str("}\n");
    (source, tests)
}

fn bench_correlation(c: &mut Criterion) {
    let mut group = c.benchmark_group("correlation");
    for size in [10, 100, 500] {
        let (source, tests) = generate_project(size);
        let methods = parse_source(&source, Path::new("Pricing.java")).methods;
        let cases = parse_source(&tests, Path::new("PricingTest.java")).tests;
        group.throughput(Throughput::Elements(cases.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| correlate(black_box(&cases), black_box(&methods)))
        });
    }
    group.finish();
}

fn bench_parsing(c: &mut Criterion) {
    let (source, tests) = generate_project(200);
    c.bench_function("parse_java_source", |b| {
        b.iter(|| parse_source(black_box(&source), Path::new("Pricing.java")))
    });
    c.bench_function("parse_java_tests", |b| {
        b.iter(|| parse_source(black_box(&tests), Path::new("PricingTest.java")))
    });
}

fn bench_detection(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");
    let detector = DivergenceDetector::new(None);
    let pairs = [
        (
            "rate_mismatch",
            sample_pair("assertEquals(90, calc.calculate(100));", "return price * 0.85;"),
        ),
        (
            "consistent",
            sample_pair("assertEquals(10, calc.calculate(1));", "return 10;"),
        ),
    ];
    let mut group = c.benchmark_group("static_cascade");
    for (name, pair) in &pairs {
        group.bench_function(*name, |b| {
            b.iter(|| runtime.block_on(detector.detect(&DetectionInput::new(black_box(pair)))))
        });
    }
    group.finish();
}

fn bench_expression(c: &mut Criterion) {
    c.bench_function("evaluate_expression", |b| {
        b.iter(|| evaluate(black_box("(100 - 15) * 2 / (3 + 1)")))
    });
}

criterion_group!(
    benches,
    bench_correlation,
    bench_parsing,
    bench_detection,
    bench_expression
);
criterion_main!(benches);
