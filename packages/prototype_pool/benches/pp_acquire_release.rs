//! Acquire and release cycles of the `prototype_pool` crate.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::num::NonZero;

use criterion::{Criterion, criterion_group, criterion_main};
use prototype_pool::{Host, PoolGroup, RingQueue, SinglePool};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

/// A host whose instances are plain numbers, so only the pool bookkeeping is measured.
#[derive(Clone, Debug, Default)]
struct Numbers {
    next: u64,
}

impl Host for Numbers {
    type Prototype = u32;
    type Instance = u64;
    type Placement = ();

    fn instantiate(&mut self, prototype: &u32, _context: Option<&()>) -> u64 {
        self.next = self.next.wrapping_add(1);
        (u64::from(*prototype) << 32) | self.next
    }

    fn destroy(&mut self, _instance: u64) {}
}

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("pp_acquire_release");

    group.bench_function("ring_queue_cycle", |b| {
        let mut queue = RingQueue::new(NonZero::new(64).unwrap());

        b.iter(|| {
            queue.enqueue(black_box(42_u64)).unwrap();
            black_box(queue.dequeue().unwrap());
        });
    });

    group.bench_function("single_reuse", |b| {
        let pool = SinglePool::builder(Numbers::default(), 1)
            .pre_warm(1)
            .auto_expand(false)
            .build()
            .unwrap();

        b.iter(|| {
            let instance = pool.acquire().unwrap();
            black_box(pool.release(black_box(instance)).unwrap());
        });
    });

    group.bench_function("single_double_release", |b| {
        let pool = SinglePool::builder(Numbers::default(), 1)
            .pre_warm(1)
            .build()
            .unwrap();
        let instance = pool.acquire().unwrap();
        pool.release(instance).unwrap();

        b.iter(|| {
            black_box(pool.release(black_box(instance)).unwrap());
        });
    });

    group.bench_function("group_reuse_4_prototypes", |b| {
        let pools = PoolGroup::builder(Numbers::default()).pre_warm(1).build();
        let prototypes = [1_u32, 2, 3, 4];

        b.iter(|| {
            for prototype in &prototypes {
                let instance = pools.acquire(prototype).unwrap();
                black_box(pools.release(black_box(instance)).unwrap());
            }
        });
    });

    group.finish();
}
