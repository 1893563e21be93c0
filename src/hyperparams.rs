use linfa::{Float, ParamGuard};
use ndarray::Array1;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::distribution::Distribution;
use crate::error::{GlmError, Result};

/// A verified hyper-parameter set ready for the estimation of a GLM
///
/// See [`GlmParams`](crate::GlmParams) for more information.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct GlmValidParams<F, R> {
    pub(crate) distribution: Distribution,
    pub(crate) penalty: F,
    pub(crate) l1_ratio: F,
    pub(crate) learning_rate: F,
    pub(crate) max_iterations: usize,
    pub(crate) tolerance: F,
    pub(crate) eta: F,
    pub(crate) with_intercept: bool,
    pub(crate) initial_weights: Option<Array1<F>>,
    pub(crate) initial_bias: Option<F>,
    pub(crate) rng: R,
}

impl<F: Float, R> GlmValidParams<F, R> {
    pub fn distribution(&self) -> Distribution {
        self.distribution
    }

    pub fn penalty(&self) -> F {
        self.penalty
    }

    pub fn l1_ratio(&self) -> F {
        self.l1_ratio
    }

    pub fn learning_rate(&self) -> F {
        self.learning_rate
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn tolerance(&self) -> F {
        self.tolerance
    }

    pub fn eta(&self) -> F {
        self.eta
    }

    pub fn with_intercept(&self) -> bool {
        self.with_intercept
    }

    pub fn initial_weights(&self) -> Option<&Array1<F>> {
        self.initial_weights.as_ref()
    }

    pub fn initial_bias(&self) -> Option<F> {
        self.initial_bias
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }
}

/// A hyper-parameter set for a regularized Generalized Linear Model
///
/// Configures and minimizes the penalized negative log-likelihood
/// ```ignore
/// -1 / n_samples * sum(log p(y | mu(X @ w + bias)))
///     + penalty * l1_ratio * ||w||_1
///     + 0.5 * penalty * (1 - l1_ratio) * ||w||^2_2
/// ```
/// with proximal gradient descent: a gradient step on the smooth part followed by
/// soft-thresholding for the L1 part.
///
/// The parameter set can be verified into a [`GlmValidParams`] by calling
/// [ParamGuard::check](Self::check). It is also possible to directly fit a model with
/// [Fit::fit](linfa::traits::Fit::fit) which implicitely verifies the parameter set prior to the
/// model estimation and forwards any error.
///
/// # Parameters
/// | Name | Default | Purpose | Range |
/// | :--- | :--- | :---| :--- |
/// | [distribution](Self::distribution) | `Poisson` | Distribution family of the targets | only `Poisson` is implemented |
/// | [penalty](Self::penalty) | `0.1` | Overall regularization strength | `[0, inf)` |
/// | [l1_ratio](Self::l1_ratio) | `0.5` | Distribution of penalty to L1 and L2 regularizations | `[0.0, 1.0]` |
/// | [learning_rate](Self::learning_rate) | `0.2` | Step size of the gradient step | `(0, inf)` |
/// | [max_iterations](Self::max_iterations) | `1000` | Maximum number of iterations | `[0, inf)` |
/// | [tolerance](Self::tolerance) | `1e-6` | Relative change of the weights below which the fit stops | `(0, inf)` |
/// | [eta](Self::eta) | `2.0` | Threshold above which `exp` is linearized | finite |
/// | [with_intercept](Self::with_intercept) | `true` | Enable intercept | `false`, `true` |
///
/// # Errors
///
/// Returns [`InvalidPenalty`](GlmError::InvalidPenalty) if the penalty is negative.
///
/// Returns [`InvalidL1Ratio`](GlmError::InvalidL1Ratio) if the L1 ratio is not in unit range.
///
/// Returns [`InvalidLearningRate`](GlmError::InvalidLearningRate) if the learning rate is not
/// positive.
///
/// Returns [`InvalidTolerance`](GlmError::InvalidTolerance) if the tolerance is not positive.
///
/// Returns [`InvalidEta`](GlmError::InvalidEta) if eta is not finite.
///
/// # Example
///
/// ```rust
/// use linfa_glm::{Glm, GlmError};
/// use linfa::prelude::*;
/// use ndarray::array;
///
/// let ds = Dataset::new(array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]], array![3.0, 2.0, 4.0]);
///
/// // create a new parameter set with a lighter penalty
/// let unchecked_params = Glm::params().penalty(1e-3);
///
/// // fit model with unchecked parameter set
/// let model = unchecked_params.fit(&ds)?;
///
/// // transform into a verified parameter set
/// let checked_params = unchecked_params.check()?;
///
/// // Regenerate model with the verified parameters, this only returns
/// // errors originating from the fitting process
/// let model = checked_params.fit(&ds)?;
/// # Ok::<(), GlmError>(())
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct GlmParams<F, R = Xoshiro256Plus>(pub(crate) GlmValidParams<F, R>);

impl<F: Float> Default for GlmParams<F, Xoshiro256Plus> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> GlmParams<F, Xoshiro256Plus> {
    /// Create default GLM hyper parameters
    ///
    /// Weights which are not given explicitly are drawn from a `Xoshiro256Plus` generator seeded
    /// with `42`, use [`with_rng`](Self::with_rng) for a different generator.
    pub fn new() -> Self {
        Self::new_with_rng(Xoshiro256Plus::seed_from_u64(42))
    }
}

impl<F: Float, R: Rng + Clone> GlmParams<F, R> {
    /// Create default GLM hyper parameters drawing the initial weights from `rng`
    pub fn new_with_rng(rng: R) -> Self {
        Self(GlmValidParams {
            distribution: Distribution::Poisson,
            penalty: F::cast(0.1),
            l1_ratio: F::cast(0.5),
            learning_rate: F::cast(0.2),
            max_iterations: 1000,
            tolerance: F::cast(1e-6),
            eta: F::cast(2.0),
            with_intercept: true,
            initial_weights: None,
            initial_bias: None,
            rng,
        })
    }

    /// Change the random number generator used for the initial weights
    pub fn with_rng<R2: Rng + Clone>(self, rng: R2) -> GlmParams<F, R2> {
        let p = self.0;
        GlmParams(GlmValidParams {
            distribution: p.distribution,
            penalty: p.penalty,
            l1_ratio: p.l1_ratio,
            learning_rate: p.learning_rate,
            max_iterations: p.max_iterations,
            tolerance: p.tolerance,
            eta: p.eta,
            with_intercept: p.with_intercept,
            initial_weights: p.initial_weights,
            initial_bias: p.initial_bias,
            rng,
        })
    }

    /// Set the distribution family of the targets.
    ///
    /// Defaults to `Poisson`, the only family which can currently be fitted.
    pub fn distribution(mut self, distribution: Distribution) -> Self {
        self.0.distribution = distribution;
        self
    }

    /// Set the overall regularization strength, often called `lambda`.
    /// Use `l1_ratio` to configure how the penalty is distributed to L1 and L2
    /// regularization.
    pub fn penalty(mut self, penalty: F) -> Self {
        self.0.penalty = penalty;
        self
    }

    /// Set l1_ratio parameter of the elastic net, often called `alpha`. Setting `l1_ratio` to
    /// 1.0 is equivalent to a "Lasso" penalization, setting it to 0.0 is equivalent to "Ridge"
    /// penalization.
    ///
    /// Defaults to `0.5` if not set
    pub fn l1_ratio(mut self, l1_ratio: F) -> Self {
        self.0.l1_ratio = l1_ratio;
        self
    }

    /// Set the constant step size of the gradient descent.
    ///
    /// Defaults to `0.2` if not set
    pub fn learning_rate(mut self, learning_rate: F) -> Self {
        self.0.learning_rate = learning_rate;
        self
    }

    /// Set the maximum number of iterations for the optimization routine.
    ///
    /// Defaults to `1000` if not set
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.0.max_iterations = max_iterations;
        self
    }

    /// Set the tolerance on the relative change of the weights,
    /// `||w_new - w_old|| / ||w_new||`, below which the optimization stops.
    ///
    /// Defaults to `1e-6` if not set
    pub fn tolerance(mut self, tolerance: F) -> Self {
        self.0.tolerance = tolerance;
        self
    }

    /// Set the threshold above which the exponential non-linearity is continued linearly.
    ///
    /// Defaults to `2.0` if not set
    pub fn eta(mut self, eta: F) -> Self {
        self.0.eta = eta;
        self
    }

    /// Configure the model to fit an intercept.
    /// Defaults to `true` if not set.
    pub fn with_intercept(mut self, with_intercept: bool) -> Self {
        self.0.with_intercept = with_intercept;
        self
    }

    /// Start the optimization from the given weights instead of random ones
    pub fn initial_weights(mut self, weights: Array1<F>) -> Self {
        self.0.initial_weights = Some(weights);
        self
    }

    /// Start the optimization from the given bias instead of a random one
    pub fn initial_bias(mut self, bias: F) -> Self {
        self.0.initial_bias = Some(bias);
        self
    }
}

impl<F: Float, R> ParamGuard for GlmParams<F, R> {
    type Checked = GlmValidParams<F, R>;
    type Error = GlmError;

    /// Validate the hyper parameters
    fn check_ref(&self) -> Result<&Self::Checked> {
        let p = &self.0;
        if !p.penalty.is_finite() || p.penalty.is_negative() {
            Err(GlmError::InvalidPenalty(p.penalty.to_f32().unwrap_or(f32::NAN)))
        } else if !(F::zero()..=F::one()).contains(&p.l1_ratio) {
            Err(GlmError::InvalidL1Ratio(p.l1_ratio.to_f32().unwrap_or(f32::NAN)))
        } else if !p.learning_rate.is_finite() || p.learning_rate <= F::zero() {
            Err(GlmError::InvalidLearningRate(
                p.learning_rate.to_f32().unwrap_or(f32::NAN),
            ))
        } else if !p.tolerance.is_finite() || p.tolerance <= F::zero() {
            Err(GlmError::InvalidTolerance(
                p.tolerance.to_f32().unwrap_or(f32::NAN),
            ))
        } else if !p.eta.is_finite() {
            Err(GlmError::InvalidEta(p.eta.to_f32().unwrap_or(f32::NAN)))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Glm;

    #[test]
    fn defaults_are_valid() {
        let params = Glm::<f64>::params().check().unwrap();
        assert_eq!(params.distribution(), Distribution::Poisson);
        assert_eq!(params.max_iterations(), 1000);
        assert!(params.with_intercept());
        assert!(params.initial_weights().is_none());
        assert!(params.initial_bias().is_none());
    }

    #[test]
    fn invalid_penalty() {
        let res = Glm::<f64>::params().penalty(-1.0).check();
        assert!(matches!(res, Err(GlmError::InvalidPenalty(_))));
    }

    #[test]
    fn invalid_l1_ratio() {
        let res = Glm::<f64>::params().l1_ratio(1.5).check();
        assert!(matches!(res, Err(GlmError::InvalidL1Ratio(_))));
        let res = Glm::<f64>::params().l1_ratio(-0.1).check();
        assert!(matches!(res, Err(GlmError::InvalidL1Ratio(_))));
    }

    #[test]
    fn invalid_learning_rate() {
        let res = Glm::<f64>::params().learning_rate(0.0).check();
        assert!(matches!(res, Err(GlmError::InvalidLearningRate(_))));
    }

    #[test]
    fn invalid_tolerance() {
        let res = Glm::<f64>::params().tolerance(-1e-3).check();
        assert!(matches!(res, Err(GlmError::InvalidTolerance(_))));
    }

    #[test]
    fn invalid_eta() {
        let res = Glm::<f64>::params().eta(f64::INFINITY).check();
        assert!(matches!(res, Err(GlmError::InvalidEta(_))));
    }

    #[test]
    fn swapping_rng_keeps_settings() {
        let params = Glm::<f64>::params()
            .penalty(0.3)
            .initial_bias(0.5)
            .with_rng(rand_xoshiro::Xoshiro256PlusPlus::seed_from_u64(7))
            .check()
            .unwrap();
        assert_eq!(params.penalty(), 0.3);
        assert_eq!(params.initial_bias(), Some(0.5));
    }
}
