use std::collections::BTreeMap;
use std::hint::black_box;
use std::time::{Duration, Instant};

use bench::{
    KeyOrder, apply_medium_runtime_config, apply_small_runtime_config, default_rng, even_keys,
    seed_for_iter,
};
use criterion::measurement::Measurement;
use criterion::{BenchmarkGroup, BenchmarkId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use avl_tree::{AvlTreeMap, BinarySearchTree, OrderedMap};

const SIZES: [usize; 4] = [1_000, 4_000, 16_000, 64_000];
const OPS_PER_ITER: usize = 200;
const GET_HIT_RATE_PERCENT: u32 = 80;

#[derive(Clone, Copy)]
enum ReadOp {
    Get { key: u64 },
    LowerBound { key: u64 },
}

fn filled<M: OrderedMap<Key = u64, Value = u64>>(keys: &[u64]) -> M {
    let mut map = M::new();
    for &k in keys {
        black_box(map.insert(k, k ^ 0xA5A5));
    }
    map
}

/// Time to insert every key into an empty map.
pub fn bench_build<M, T>(group: &mut BenchmarkGroup<'_, T>, label: &str, order: KeyOrder)
where
    T: Measurement<Value = Duration>,
    M: OrderedMap<Key = u64, Value = u64>,
{
    for &size in &SIZES {
        apply_medium_runtime_config(group);
        let keys = even_keys(size, order, &mut default_rng());
        let id = BenchmarkId::new(format!("{label}/{}", order.label()), size);
        group.bench_function(id, |bencher| {
            bencher.iter(|| {
                let map = filled::<M>(&keys);
                black_box(map.len())
            })
        });
    }
}

pub fn bench_read<M, T>(group: &mut BenchmarkGroup<'_, T>, label: &str)
where
    T: Measurement<Value = Duration>,
    M: OrderedMap<Key = u64, Value = u64>,
{
    for &size in &SIZES {
        apply_small_runtime_config(group);
        let keys = even_keys(size, KeyOrder::Shuffled, &mut default_rng());
        let mut map = filled::<M>(&keys);

        group.bench_function(BenchmarkId::new(label, size), |bencher| {
            bencher.iter_custom(|iters| {
                let mut total = Duration::ZERO;
                for iter in 0..iters {
                    let mut rng = StdRng::seed_from_u64(seed_for_iter(size as u64, iter));
                    let ops = generate_read_ops(&keys, &mut rng);
                    let start = Instant::now();
                    for op in &ops {
                        match *op {
                            ReadOp::Get { key } => {
                                black_box(map.get(&key).copied());
                            }
                            ReadOp::LowerBound { key } => {
                                black_box(map.lower_bound(&key).map(|(k, v)| (*k, *v)));
                            }
                        }
                    }
                    total += start.elapsed();
                }
                total
            })
        });
    }
}

/// Each op removes a live key and inserts a fresh random even key, so the
/// size holds and the plain tree does not drift into a sorted spine.
pub fn bench_churn<M, T>(group: &mut BenchmarkGroup<'_, T>, label: &str)
where
    T: Measurement<Value = Duration>,
    M: OrderedMap<Key = u64, Value = u64>,
{
    for &size in &SIZES {
        apply_small_runtime_config(group);
        let keys = even_keys(size, KeyOrder::Shuffled, &mut default_rng());
        let mut map = filled::<M>(&keys);
        let mut live = keys.clone();

        group.bench_function(BenchmarkId::new(label, size), |bencher| {
            bencher.iter_custom(|iters| {
                let mut total = Duration::ZERO;
                for iter in 0..iters {
                    let mut rng = StdRng::seed_from_u64(seed_for_iter(!(size as u64), iter));
                    let mut ops = Vec::with_capacity(OPS_PER_ITER);
                    for _ in 0..OPS_PER_ITER {
                        let idx = rng.random_range(0..live.len());
                        let fresh = rng.random::<u64>() & !1;
                        let old = std::mem::replace(&mut live[idx], fresh);
                        ops.push((old, fresh));
                    }
                    let start = Instant::now();
                    for &(old, new) in &ops {
                        black_box(map.remove(&old));
                        black_box(map.insert(new, new));
                    }
                    total += start.elapsed();
                }
                total
            })
        });
    }
}

fn generate_read_ops(keys: &[u64], rng: &mut StdRng) -> Vec<ReadOp> {
    let mut ops = Vec::with_capacity(OPS_PER_ITER);
    for _ in 0..OPS_PER_ITER {
        let hit = rng.random_range(0..100) < GET_HIT_RATE_PERCENT;
        let key = if hit {
            keys[rng.random_range(0..keys.len())]
        } else {
            rng.random::<u64>() | 1
        };
        if rng.random::<bool>() {
            ops.push(ReadOp::Get { key });
        } else {
            ops.push(ReadOp::LowerBound { key });
        }
    }
    ops
}

pub fn bench_all_build<T>(group: &mut BenchmarkGroup<'_, T>)
where
    T: Measurement<Value = Duration>,
{
    for order in [KeyOrder::Ascending, KeyOrder::Shuffled] {
        bench_build::<BTreeMap<u64, u64>, _>(group, "std_btree", order);
        bench_build::<AvlTreeMap<u64, u64>, _>(group, "avl", order);
    }
    // Sorted input makes the plain tree quadratic; only the shuffled run is useful.
    bench_build::<BinarySearchTree<u64, u64>, _>(group, "bst", KeyOrder::Shuffled);
}

pub fn bench_all_read<T>(group: &mut BenchmarkGroup<'_, T>)
where
    T: Measurement<Value = Duration>,
{
    bench_read::<BTreeMap<u64, u64>, _>(group, "std_btree");
    bench_read::<AvlTreeMap<u64, u64>, _>(group, "avl");
    bench_read::<BinarySearchTree<u64, u64>, _>(group, "bst");
}

pub fn bench_all_churn<T>(group: &mut BenchmarkGroup<'_, T>)
where
    T: Measurement<Value = Duration>,
{
    bench_churn::<BTreeMap<u64, u64>, _>(group, "std_btree");
    bench_churn::<AvlTreeMap<u64, u64>, _>(group, "avl");
    bench_churn::<BinarySearchTree<u64, u64>, _>(group, "bst");
}
