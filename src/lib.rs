//! # Regularized Generalized Linear Models
//!
//! ## The Big Picture
//!
//! `linfa-glm` is a crate in the [`linfa`](https://crates.io/crates/linfa) ecosystem, an effort to
//! create a toolkit for classical Machine Learning implemented in pure Rust, akin to Python's
//! `scikit-learn`.
//!
//! ## Current state
//!
//! `linfa-glm` provides an elastic-net regularized [Generalized Linear Model](Glm) fitted with
//! proximal gradient descent. The Poisson family is implemented; the remaining
//! [distribution families](Distribution) are recognized but report
//! [`NotImplemented`](GlmError::NotImplemented) when evaluated.
//!
//! The building blocks of the solver are public so that a fit can also be driven step by step:
//! - [`CostFunction`] computes the link, its derivative, the gradients and the loss
//! - [`ElasticNetPenalty`] provides the ridge subgradient and the proximal operator
//! - [`ConstantLearningRate`] and [`GradientDescent`] perform the gradient step
//! - [`IterativeSolver`] runs initialization, iterations and the convergence check
//!
//! ## Examples
//!
//! There is an usage example in the `demos/` directory. To run, use:
//!
//! ```bash
//! $ cargo run --example poisson_counts
//! ```
use linfa::Float;
use ndarray::Array1;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

mod algorithm;
mod cost;
mod distribution;
mod error;
mod hyperparams;
mod penalty;
mod updater;

pub use algorithm::{IterativeSolver, SolverState};
pub use cost::CostFunction;
pub use distribution::Distribution;
pub use error::{GlmError, Result};
pub use hyperparams::{GlmParams, GlmValidParams};
pub use penalty::ElasticNetPenalty;
pub use updater::{ConstantLearningRate, GradientDescent, GradientUpdater, LearningRate};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
/// Regularized Generalized Linear Model
///
/// This struct contains the parameters of a fitted GLM: the weights of the linear predictor,
/// the (optional) bias, the distribution family with its linearization threshold and the
/// number of iterations needed in the computation.
///
/// ## Model implementation
///
/// The penalized negative log-likelihood is minimized with proximal gradient descent. Every
/// iteration takes a gradient step on the likelihood and the ridge part of the penalty, then
/// applies soft-thresholding for the lasso part. This cycles until the relative change of the
/// weights drops below the tolerance or the maximum number of iterations is reached.
///
/// Predictions map the linear predictor `x @ w + bias` through the mean function of the family,
/// for Poisson an exponential which continues linearly above `eta`.
///
/// See also:
/// * [pyglmnet](https://github.com/glm-tools/pyglmnet)
/// * [Regularization Paths for Generalized Linear Models via Coordinate
/// Descent](http://www.jstatsoft.org/v33/i01/paper)
#[derive(Clone, Debug, PartialEq)]
pub struct Glm<F> {
    weights: Array1<F>,
    bias: F,
    distribution: Distribution,
    eta: F,
    n_iterations: usize,
    converged: bool,
}

impl<F: Float> Glm<F> {
    /// Create a default parameter set for construction of a GLM
    ///
    /// By default a Poisson model with intercept is fitted, see [`GlmParams`] for the remaining
    /// defaults.
    pub fn params() -> GlmParams<F> {
        GlmParams::new()
    }

    /// Create a ridge only model
    pub fn ridge() -> GlmParams<F> {
        GlmParams::new().l1_ratio(F::zero())
    }

    /// Create a LASSO only model
    pub fn lasso() -> GlmParams<F> {
        GlmParams::new().l1_ratio(F::one())
    }
}
