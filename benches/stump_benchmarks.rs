use std::hint::black_box;

use criterion::criterion_group;
use criterion::criterion_main;
use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::Throughput;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use utreexo_stump::accumulator::node_hash::BitcoinNodeHash;
use utreexo_stump::accumulator::proof::Proof;
use utreexo_stump::accumulator::stump::Stump;

fn generate_test_hashes(count: usize, seed: u64) -> Vec<BitcoinNodeHash> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let mut bytes = [0u8; 32];
            rng.fill(&mut bytes);
            BitcoinNodeHash::new(bytes)
        })
        .collect()
}

/// A stump holding `size` leaves, plus a proof for every `step`th of them
fn setup(size: usize, step: usize) -> (Stump, Proof, Vec<BitcoinNodeHash>) {
    let hashes = generate_test_hashes(size, 42);
    let (stump, update_data) = Stump::new()
        .modify(&hashes, &[], &Proof::default())
        .unwrap();
    let remembers = (0..size as u64).step_by(step).collect();
    let (proof, cached) = Proof::default()
        .update(vec![], hashes, vec![], remembers, update_data)
        .unwrap();

    (stump, proof, cached)
}

fn stump_modify_add_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("stump_modify_add_only");

    for size in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("add_elements", size), size, |b, &size| {
            let hashes = generate_test_hashes(size, 42);
            let empty_proof = Proof::default();

            b.iter(|| {
                let stump = Stump::new();
                let result =
                    stump.modify(black_box(&hashes), black_box(&[]), black_box(&empty_proof));
                black_box(result.unwrap())
            });
        });
    }
    group.finish();
}

fn stump_modify_with_deletions(c: &mut Criterion) {
    let mut group = c.benchmark_group("stump_modify_with_deletions");
    let new_utxos = generate_test_hashes(100, 7);

    for step in [100, 10, 2].iter() {
        let (stump, proof, del_hashes) = setup(1000, *step);

        group.throughput(Throughput::Elements(proof.n_targets() as u64));
        group.bench_with_input(
            BenchmarkId::new("delete_and_add", proof.n_targets()),
            step,
            |b, _| {
                b.iter(|| {
                    let result = stump.modify(
                        black_box(&new_utxos),
                        black_box(&del_hashes),
                        black_box(&proof),
                    );
                    black_box(result.unwrap())
                });
            },
        );
    }
    group.finish();
}

fn stump_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("stump_verify");

    for step in [1000, 100, 10].iter() {
        let (stump, proof, del_hashes) = setup(1000, *step);

        group.throughput(Throughput::Elements(proof.n_targets() as u64));
        group.bench_with_input(
            BenchmarkId::new("verify_proof", proof.n_targets()),
            step,
            |b, _| {
                b.iter(|| {
                    let result = stump.verify(black_box(&proof), black_box(&del_hashes));
                    black_box(result)
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    stump_modify_add_only,
    stump_modify_with_deletions,
    stump_verify
);
criterion_main!(benches);
