use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use lite_thread::counter::{CounterKind, SharedCounter};
use lite_thread::thread::{DisposalPolicy, ThreadHandle};
use std::sync::Arc;

/// Benchmark: contended increments (atomic vs plain)
/// 基准测试：竞争下的自增（原子 vs 普通）
fn bench_counter_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("counter_contended");

    for kind in [CounterKind::Atomic, CounterKind::Plain] {
        for threads in [1, 4].iter() {
            group.bench_with_input(
                BenchmarkId::new(format!("{kind:?}"), threads),
                threads,
                |b, &threads| {
                    b.iter(|| {
                        let counter = Arc::new(SharedCounter::new(kind));
                        let pool: Vec<ThreadHandle> = (0..threads)
                            .map(|_| {
                                let counter = Arc::clone(&counter);
                                ThreadHandle::spawn(DisposalPolicy::Join, move || {
                                    for _ in 0..10_000 {
                                        counter.increment();
                                    }
                                })
                                .unwrap()
                            })
                            .collect();
                        drop(pool);
                        counter.load()
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_counter_contended);
criterion_main!(benches);
