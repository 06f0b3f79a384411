//! Link clustering on synthetic ring-of-cliques graphs.
//!
//! ```bash
//! cargo bench --bench hlc
//! ```

use clics_core::community::Hlc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// `cliques` cliques of size `k`, consecutive cliques joined by one edge.
fn ring_of_cliques(cliques: usize, k: usize) -> (usize, Vec<(usize, usize)>) {
    let mut edges = Vec::new();
    for c in 0..cliques {
        let base = c * k;
        for i in 0..k {
            for j in i + 1..k {
                edges.push((base + i, base + j));
            }
        }
        let next = ((c + 1) % cliques) * k;
        if cliques > 1 {
            edges.push((base + k - 1, next));
        }
    }
    (cliques * k, edges)
}

fn bench_hlc(c: &mut Criterion) {
    let mut group = c.benchmark_group("hlc");
    for cliques in [10, 40, 160] {
        let (n, edges) = ring_of_cliques(cliques, 5);
        group.bench_with_input(BenchmarkId::new("density_cut", cliques), &edges, |b, edges| {
            b.iter(|| {
                let mut hlc = Hlc::new(n, edges.clone());
                black_box(hlc.run(None).count())
            })
        });
        group.bench_with_input(BenchmarkId::new("fixed_threshold", cliques), &edges, |b, edges| {
            b.iter(|| {
                let mut hlc = Hlc::new(n, edges.clone());
                black_box(hlc.run(Some(0.5)).count())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_hlc);
criterion_main!(benches);
