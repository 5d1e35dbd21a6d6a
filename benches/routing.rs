//! Inbound routing benchmark suite.
//!
//! Measures frame parsing and classification for the frame shapes the
//! remote sends most often:
//! - keep-alive
//! - console lines of growing length
//! - doubly-encoded status updates
//!
//! Run with: cargo bench --bench routing
//! Results saved to: target/criterion/

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::json;

use aternos_hermes::protocol::{InboundMessage, OutboundFrame};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const LINE_LENGTHS: &[usize] = &[32, 256, 4096];

// ============================================================================
// Benchmark: Inbound Routing
// ============================================================================

fn bench_route_keep_alive(c: &mut Criterion) {
    let frame = json!({"type": "keep-alive"}).to_string();

    c.bench_function("route/keep_alive", |b| {
        b.iter(|| {
            InboundMessage::from_text(black_box(&frame)).and_then(InboundMessage::route)
        });
    });
}

fn bench_route_console_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("route/console_line");

    for &len in LINE_LENGTHS {
        let frame = json!({
            "type": "line",
            "stream": "console",
            "data": "x".repeat(len),
        })
        .to_string();

        group.throughput(Throughput::Bytes(frame.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &frame, |b, frame| {
            b.iter(|| InboundMessage::from_text(black_box(frame)).and_then(InboundMessage::route));
        });
    }

    group.finish();
}

fn bench_route_status(c: &mut Criterion) {
    let status = json!({
        "id": "AbC123",
        "name": "survival",
        "status": 1,
        "class": "online",
        "label": "Online",
        "players": 3,
        "slots": 20,
        "software": "Paper",
        "version": "1.21.4",
        "ram": 2048,
        "maxram": 4096,
    });
    let frame = json!({"type": "status", "message": status.to_string()}).to_string();

    c.bench_function("route/status", |b| {
        b.iter(|| InboundMessage::from_text(black_box(&frame)).and_then(InboundMessage::route));
    });
}

// ============================================================================
// Benchmark: Outbound Encoding
// ============================================================================

fn bench_encode_start(c: &mut Criterion) {
    c.bench_function("encode/start", |b| {
        b.iter(|| {
            OutboundFrame::new(black_box("console"), "start", Some(json!({"lines": 100}))).to_text()
        });
    });
}

// ============================================================================
// Criterion Setup
// ============================================================================

criterion_group!(
    benches,
    bench_route_keep_alive,
    bench_route_console_line,
    bench_route_status,
    bench_encode_start,
);
criterion_main!(benches);
