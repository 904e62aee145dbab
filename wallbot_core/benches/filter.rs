use criterion::{Criterion, black_box, criterion_group, criterion_main};
use wallbot_core::config::RangingCfg;
use wallbot_core::distance::DistanceFilter;
use wallbot_core::ranging::{EdgeCapture, RangingSnapshot};
use wallbot_traits::LineLevels;

fn bench_read_dist(c: &mut Criterion) {
    let cfg = RangingCfg::default();
    let mut filter = DistanceFilter::new(&cfg);
    let snap = RangingSnapshot {
        front_us: vec![2_850; cfg.window],
        rear_us: vec![3_100; cfg.window],
        ..RangingSnapshot::seeded(&cfg)
    };
    c.bench_function("read_dist", |b| {
        b.iter(|| black_box(filter.read_dist(black_box(&snap))))
    });
}

fn bench_edge_capture(c: &mut Criterion) {
    let cfg = RangingCfg::default();
    c.bench_function("edge_capture_echo_pair", |b| {
        let mut cap = EdgeCapture::new(&cfg);
        let mut t = 0u64;
        b.iter(|| {
            t += 3_000;
            cap.on_edge(
                LineLevels {
                    front_echo: true,
                    ..LineLevels::default()
                },
                t,
                t / 1_000,
            );
            t += 1_500;
            cap.on_edge(LineLevels::default(), t, t / 1_000);
            black_box(cap.snapshot())
        })
    });
}

criterion_group!(benches, bench_read_dist, bench_edge_capture);
criterion_main!(benches);
