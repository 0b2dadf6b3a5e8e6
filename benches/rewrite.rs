//! Rewrite throughput benchmarks.
//!
//! Measures the per-message cost of the engine on matching and
//! non-matching traffic in both directions.
//!
//! Run with: cargo bench --bench rewrite
//! Results saved to: target/criterion/

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ws_interceptor::{ChannelId, Interceptor, Payload, RewriteConfig};

// ============================================================================
// Fixtures
// ============================================================================

const WRITE_END: &str = r#"{"Action":"useraction","path":"_Writefileend","action":"{\"SuccessAction\":\"notify\",\"Id\":42}"}"#;
const PLAIN: &str = r#"{"Action":"useraction","path":"_Click","action":"{\"Target\":\"btnSave\"}"}"#;
const SAVE: &str = r#"[{"Act":"DO","Fn":"FileFastSave","Pars":["^mtempPrt(1042,\"ACT\",2,\"Q1\",\"PDF\",\"A4\")","C:\\orig\\report.pdf"]}]"#;

fn command_array(len: usize) -> String {
    let filler = r#"{"Act":"DO","Fn":"SetValue","Pars":["field","value"]}"#;
    let mut items = vec![filler; len];
    items.push(&SAVE[1..SAVE.len() - 1]);
    format!("[{}]", items.join(","))
}

// ============================================================================
// Benchmark: Outbound
// ============================================================================

fn bench_outbound(c: &mut Criterion) {
    let interceptor = Interceptor::new(RewriteConfig::default());
    let id = ChannelId::generate();

    let mut group = c.benchmark_group("outbound");
    for (name, text) in [("write_end", WRITE_END), ("plain", PLAIN), ("not_json", "ping")] {
        let payload = Payload::from(text);
        group.bench_with_input(BenchmarkId::new("process", name), &payload, |b, payload| {
            b.iter(|| interceptor.process_outbound(id, black_box(payload)));
        });
    }
    group.finish();
}

// ============================================================================
// Benchmark: Inbound
// ============================================================================

fn bench_inbound(c: &mut Criterion) {
    let interceptor = Interceptor::new(RewriteConfig::redirect(r"D:\out"));
    let id = ChannelId::generate();

    let mut group = c.benchmark_group("inbound");
    for len in [0usize, 10, 100] {
        let text = command_array(len);
        group.bench_with_input(BenchmarkId::new("array", len), &text, |b, text| {
            b.iter(|| interceptor.process_inbound_text(id, black_box(text)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_outbound, bench_inbound);
criterion_main!(benches);
