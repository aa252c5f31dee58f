//! Benchmarks for fingerprinting and diffing large snapshots.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use mcp_toolbox_introspector::{Snapshot, ToolDefinition, TransportDescriptor};
use mcp_toolbox_snapshot::{diff_snapshots, schema_fingerprint};
use serde_json::json;
use std::hint::black_box;

fn build_snapshot(tool_count: usize, variant: &str) -> Snapshot {
    let tools = (0..tool_count)
        .map(|i| {
            ToolDefinition::new(
                format!("tool_{i}"),
                format!("Tool number {i}"),
                json!({
                    "type": "object",
                    "properties": {
                        "id": {"type": "string", "description": "Identifier"},
                        "limit": {"type": "integer"},
                        "mode": {"type": if i % 7 == 0 { variant } else { "string" }},
                        "tags": {"type": "array", "items": {"type": "string"}}
                    },
                    "required": ["id"]
                }),
            )
        })
        .collect();

    Snapshot {
        server_name: "bench".to_string(),
        version: "1.0.0".to_string(),
        retrieved_at: "2025-01-01T00:00:00.000Z".to_string(),
        transport: TransportDescriptor::Stdio {
            command: "bench".to_string(),
            args: vec![],
        },
        tools,
    }
}

/// Benchmarks schema fingerprinting by tool count
fn bench_schema_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("schema_fingerprint");

    for count in [10, 100, 1000] {
        let snapshot = build_snapshot(count, "string");
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &snapshot, |b, snapshot| {
            b.iter(|| schema_fingerprint(black_box(snapshot)));
        });
    }

    group.finish();
}

/// Benchmarks diffing snapshots where every seventh tool changed
fn bench_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff_snapshots");

    for count in [10, 100, 1000] {
        let old = build_snapshot(count, "string");
        let new = build_snapshot(count, "number");
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(count),
            &(old, new),
            |b, (old, new)| {
                b.iter(|| diff_snapshots(black_box(old), black_box(new)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_schema_fingerprint, bench_diff);
criterion_main!(benches);
