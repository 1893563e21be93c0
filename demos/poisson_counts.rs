use linfa::prelude::*;
use linfa_glm::{Glm, GlmError};
use ndarray::{array, Array2, Axis};
use ndarray_rand::rand_distr::{Poisson, Uniform};
use ndarray_rand::RandomExt;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

fn main() -> Result<(), GlmError> {
    // simulate counts with log-mean 1.0 + 0.8 x_0 - 0.5 x_1, the third feature is noise
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let coef = array![0.8f64, -0.5, 0.0];
    let records = Array2::random_using((1000, 3), Uniform::new(-1f64, 1.), &mut rng);
    let targets = (records.dot(&coef) + 1.0).mapv(|z: f64| match Poisson::new(z.exp()) {
        Ok(poisson) => rng.sample(poisson),
        Err(_) => 0.0,
    });
    let (train, valid) = Dataset::new(records, targets).split_with_ratio(0.8);

    // a mostly lasso penalty drives the weight of the noise feature towards zero
    let model = Glm::params()
        .penalty(0.01)
        .l1_ratio(0.9)
        .learning_rate(0.1)
        .max_iterations(5000)
        .fit(&train)?;

    println!(
        "converged: {} after {} iterations",
        model.converged(),
        model.n_iterations()
    );
    println!("bias:    {}", model.bias());
    println!("weights: {}", model.weights());

    // compare predicted means with the observed counts of the validation set
    let pred = model.predict(&valid);
    let mae = (valid.targets() - &pred).mapv(f64::abs).mean();
    println!("mean absolute error: {:?}", mae);

    let first = valid.records().select(Axis(0), &[0, 1, 2]);
    println!("first means: {}", model.apply_regression(Some(first.view()))?);

    Ok(())
}
