//! Per-insert block benchmarks plus the send processors.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use morfo_effects::{InsertId, MasterLimiter, SendDelay, SendReverb, build_insert};

fn bench_inserts(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_block_256");
    for id in InsertId::ALL {
        group.bench_function(id.label(), |b| {
            let mut fx = build_insert(id, 48000.0);
            fx.set_enabled(true);
            let mut l = [0.25f32; 256];
            let mut r = [0.25f32; 256];
            b.iter(|| fx.process(black_box(&mut l), black_box(&mut r)));
        });
    }
    group.finish();
}

fn bench_sends(c: &mut Criterion) {
    c.bench_function("send_delay_block_256", |b| {
        let mut fx = SendDelay::new(48000.0);
        let in_l = [0.25f32; 256];
        let in_r = [0.25f32; 256];
        let mut out_l = [0.0f32; 256];
        let mut out_r = [0.0f32; 256];
        b.iter(|| fx.render(&in_l, &in_r, black_box(&mut out_l), black_box(&mut out_r)));
    });
    c.bench_function("send_reverb_block_256", |b| {
        let mut fx = SendReverb::new(48000.0);
        let in_l = [0.25f32; 256];
        let in_r = [0.25f32; 256];
        let mut out_l = [0.0f32; 256];
        let mut out_r = [0.0f32; 256];
        b.iter(|| fx.render(&in_l, &in_r, black_box(&mut out_l), black_box(&mut out_r)));
    });
}

fn bench_limiter(c: &mut Criterion) {
    c.bench_function("limiter_block_256", |b| {
        let mut lim = MasterLimiter::new(48000.0);
        let mut l = [0.9f32; 256];
        let mut r = [0.9f32; 256];
        b.iter(|| lim.process(black_box(&mut l), black_box(&mut r)));
    });
}

criterion_group!(benches, bench_inserts, bench_sends, bench_limiter);
criterion_main!(benches);
