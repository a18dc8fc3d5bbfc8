//! Benchmarks for the soaap-graph results pipeline.
//!
//! Run with: `cargo bench`
//!
//! - JSON report parse vs. binary cache load at several scales
//! - Per-analysis extraction and the union of the extracted graphs

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use soaap_graph::domain::analysis::{extract_all, Analysis};
use soaap_graph::domain::results::{CallSite, PrivateAccess, Results, Trace, Vulnerability};
use soaap_graph::infrastructure::report_parser::parse_report;
use soaap_graph::infrastructure::results_store::ResultsStore;
use tempfile::tempdir;

// ═══════════════════════════════════════════════════════════════════════════
// Synthetic Data Generators
// ═══════════════════════════════════════════════════════════════════════════

fn frame(function: String) -> CallSite {
    CallSite {
        function,
        sandbox: "worker".to_string(),
        location: None,
    }
}

/// Create synthetic results with `num_traces` traces of `depth` frames.
/// Traces share prefixes so extraction exercises node reuse.
fn create_synthetic_results(num_traces: usize, depth: usize) -> Results {
    let mut results = Results::default();

    for t in 0..num_traces {
        let mut frames: Vec<CallSite> = (0..depth - 1)
            .map(|d| frame(format!("fn_{}_{}", d, t % (d + 1))))
            .collect();
        let sink = format!("sink_{}", t);
        frames.push(frame(sink.clone()));
        results.traces.push(Trace::new(frames));

        if t % 2 == 0 {
            results.vulnerabilities.push(Vulnerability {
                function: sink,
                sandbox: "worker".to_string(),
                location: None,
                cve: vec![format!("CVE-2021-{:05}", t)],
                trace_ref: Some(t),
            });
        } else {
            results.private_accesses.push(PrivateAccess {
                function: sink,
                variable: format!("secret_{}", t),
                sandbox: "worker".to_string(),
                location: None,
                trace_ref: Some(t),
            });
        }
    }

    results
}

fn to_report_json(results: &Results) -> String {
    serde_json::json!({
        "soaap": {
            "vulnerability_warning": results.vulnerabilities,
            "private_access": results.private_accesses,
            "traces": results.traces,
        }
    })
    .to_string()
}

// ═══════════════════════════════════════════════════════════════════════════
// Parse vs Cache Load
// ═══════════════════════════════════════════════════════════════════════════

fn bench_parse_vs_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("results/parse_vs_cache");

    for num_traces in [100, 1_000, 10_000].iter() {
        let results = create_synthetic_results(*num_traces, 8);
        let json = to_report_json(&results);

        let dir = tempdir().unwrap();
        let path = dir.path().join("bench.bin");
        ResultsStore::save_path(&results, &path).unwrap();

        group.throughput(Throughput::Elements(*num_traces as u64));

        group.bench_with_input(BenchmarkId::new("json_parse", num_traces), &json, |b, json| {
            b.iter(|| parse_report(black_box(json.as_bytes()), |_| {}).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("cache_load", num_traces), &path, |b, path| {
            b.iter(|| ResultsStore::load_path(black_box(path)).unwrap())
        });
    }

    group.finish();
}

// ═══════════════════════════════════════════════════════════════════════════
// Extraction + Union
// ═══════════════════════════════════════════════════════════════════════════

fn bench_extract_and_union(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/extract_union");
    group.sample_size(30);

    for num_traces in [1_000, 10_000].iter() {
        let results = create_synthetic_results(*num_traces, 12);

        group.bench_with_input(
            BenchmarkId::new("vuln_only", num_traces),
            &results,
            |b, results| b.iter(|| Analysis::Vulnerabilities.extract(black_box(results))),
        );

        group.bench_with_input(
            BenchmarkId::new("all_analyses", num_traces),
            &results,
            |b, results| b.iter(|| extract_all(black_box(results), &Analysis::ALL).unwrap()),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_parse_vs_cache, bench_extract_and_union);
criterion_main!(benches);
