use std::time::Instant;

use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::Vector3;
use ndarray::Array1;
use polyalign::kdtree::KdTree;
use pprof::criterion::{Output, PProfProfiler};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

fn kdtree_benchmark(c: &mut Criterion) {
    const N: usize = 500000;

    let ordered_points = (0..N)
        .map(|i| {
            let x = (i * 3) as f32;
            Vector3::new(x, x + 1.0, x + 2.0)
        })
        .collect::<Array1<_>>();

    let randomized_points = {
        let mut random_indices = (0..N).collect::<Vec<usize>>();
        let seed: [u8; 32] = [5; 32];
        random_indices.shuffle(&mut SmallRng::from_seed(seed));

        let mut randomized_points = ordered_points.clone();
        for (i, random_index) in random_indices.iter().enumerate() {
            randomized_points[*random_index] = ordered_points[i];
        }
        randomized_points
    };

    c.bench_function("kdtree creation", |b| {
        b.iter(|| KdTree::new(&randomized_points.view()));
    });

    c.bench_function("kdtree search", |b| {
        let tree = KdTree::new(&randomized_points.view());
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _i in 0..iters {
                for point in ordered_points.iter().take(1000) {
                    tree.nearest(point);
                }
            }
            start.elapsed()
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)));
    targets = kdtree_benchmark
}

criterion_main!(benches);
