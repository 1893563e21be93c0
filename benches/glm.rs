use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use linfa::prelude::*;
use linfa_glm::Glm;
use ndarray::{Array1, Array2};
use ndarray_rand::rand_distr::{Poisson, Uniform};
use ndarray_rand::RandomExt;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

fn poisson_dataset(num_rows: usize, num_feats: usize) -> Dataset<f64, f64, ndarray::Ix1> {
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let records = Array2::random_using((num_rows, num_feats), Uniform::new(-1f64, 1.), &mut rng);
    let coef = Array1::linspace(-0.5, 0.5, num_feats);
    let targets = (records.dot(&coef) + 1.0)
        .mapv(|z: f64| rng.sample(Poisson::new(z.exp()).unwrap()));
    Dataset::new(records, targets)
}

fn bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("Linfa_glm");
    let sizes: [usize; 3] = [1_000, 10_000, 100_000];
    for size in sizes.iter() {
        let dataset = poisson_dataset(*size, 5);
        let params = Glm::params().learning_rate(0.1).max_iterations(100);
        group.bench_with_input(BenchmarkId::new("Poisson", size), &dataset, |b, dataset| {
            b.iter(|| params.fit(dataset).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench);
criterion_main!(benches);
