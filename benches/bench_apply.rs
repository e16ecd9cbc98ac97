use std::{hint::black_box, time::Duration};

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use rand::{SeedableRng, rngs::StdRng};

use resource_patch::{
    codec::{deserialize, serialize},
    compress::CompressionType,
    config::{Config, LogConfig, init_config},
    diff::PatchTree,
    node::ResourceNode,
    util::test::{create_test_tree, mutate_tree},
};

fn build_forest(seed: u64, trees: u64) -> ResourceNode {
    (0..trees).fold(ResourceNode::new("root", []), |root, i| {
        root.with_child(create_test_tree(seed + i))
    })
}

fn criterion_benchmark(c: &mut Criterion) {
    init_config(Config {
        log_config: LogConfig::NoLog,
        compression_type: CompressionType::Zlib,
    });
    let mut rng = StdRng::seed_from_u64(114514);
    let old = build_forest(1919810, 200);
    let new = mutate_tree(&old, &mut rng);
    let patch = PatchTree::from_compare(&old, &new);

    c.bench_function("patch_revert", |b| {
        b.iter_batched(
            || old.clone(),
            |mut target| {
                patch.patch(black_box(&mut target)).unwrap();
                patch.revert(black_box(&mut target)).unwrap();
                black_box(target)
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("patch_codec", |b| {
        b.iter(|| {
            let bytes = serialize(black_box(&patch), CompressionType::Zlib).unwrap();
            black_box(deserialize(&bytes).unwrap());
        })
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(20))
        .sample_size(30)
        .warm_up_time(Duration::from_secs(5))
        .noise_threshold(0.1);
    targets = criterion_benchmark
}
criterion_main!(benches);
