use linfa::dataset::AsSingleTargets;
use linfa::traits::{Fit, PredictInplace};
use linfa::{DatasetBase, Float};
use log::{debug, log_enabled, trace, warn, Level};
use ndarray::{Array1, ArrayBase, ArrayView1, ArrayView2, Data, Ix2};
use ndarray_rand::rand_distr::StandardNormal;
use ndarray_rand::RandomExt;
use rand::Rng;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::cost::CostFunction;
use crate::distribution::Distribution;
use crate::error::{GlmError, Result};
use crate::hyperparams::GlmValidParams;
use crate::penalty::ElasticNetPenalty;
use crate::updater::{ConstantLearningRate, GradientDescent, GradientUpdater, LearningRate};
use crate::Glm;

impl<F, R, D, T> Fit<ArrayBase<D, Ix2>, T, GlmError> for GlmValidParams<F, R>
where
    F: Float,
    R: Rng + Clone,
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = F>,
{
    type Object = Glm<F>;

    /// Fit a GLM given a feature matrix `x` and a target variable `y`.
    ///
    /// The feature matrix `x` must have shape `(n_samples, n_features)`
    ///
    /// The target variable `y` must have shape `(n_samples)`
    ///
    /// Returns a fitted `Glm` object which contains the fitted
    /// parameters and can be used to `predict` values of the target variable
    /// for new feature values.
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let x = dataset.records().view();
        let y = dataset.as_single_targets();

        let mut rng = self.rng().clone();
        let mut solver = IterativeSolver::new(self, x, y)?;
        solver.init_model(&mut rng);
        solver.run()
    }
}

/// Progress of an [`IterativeSolver`]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolverState {
    /// Data is bound, weights are not yet initialized
    Uninitialized,
    /// Weights and bias are being drawn or copied from the initial guess
    Initializing,
    Iterating,
    /// The relative change of the weights dropped below the tolerance
    Converged,
    MaxIterReached,
}

/// Proximal gradient descent on the penalized negative log-likelihood
///
/// The solver borrows the training data and owns the parameters while they are optimized.
/// [`Fit`] drives it to completion, but it can also be stepped manually:
///
/// ```rust
/// use linfa::ParamGuard;
/// use linfa_glm::{Glm, IterativeSolver, SolverState};
/// use ndarray::array;
/// use rand::SeedableRng;
/// use rand_xoshiro::Xoshiro256Plus;
///
/// let x = array![[0.0, 1.0], [1.0, 0.0], [1.0, 1.0], [0.5, -0.5]];
/// let y = array![2.0, 3.0, 3.0, 2.0];
/// let params = Glm::params().learning_rate(0.1).check()?;
///
/// let mut solver = IterativeSolver::new(&params, x.view(), y.view())?;
/// solver.init_model(&mut Xoshiro256Plus::seed_from_u64(3));
/// while solver.state() == SolverState::Iterating && solver.n_iterations() < 10 {
///     solver.iteration()?;
/// }
/// assert_eq!(solver.n_iterations(), 10);
/// # Ok::<(), linfa_glm::GlmError>(())
/// ```
pub struct IterativeSolver<'a, F> {
    x: ArrayView2<'a, F>,
    y: ArrayView1<'a, F>,
    cost: CostFunction<F>,
    penalty: ElasticNetPenalty<F>,
    learning_rate: ConstantLearningRate<F>,
    updater: GradientDescent,
    max_iterations: usize,
    tolerance: F,
    with_intercept: bool,
    initial_weights: Option<Array1<F>>,
    initial_bias: Option<F>,
    weights: Array1<F>,
    bias: F,
    previous_weights: Array1<F>,
    relative_change: Option<F>,
    iteration: usize,
    state: SolverState,
}

impl<'a, F: Float> IterativeSolver<'a, F> {
    /// Bind the training data to a new solver
    ///
    /// Fails if the data is empty, the number of records and targets differs, any value is not
    /// finite, a target is outside the support of the distribution or the initial weights do not
    /// match the number of features.
    pub fn new<R>(
        params: &GlmValidParams<F, R>,
        x: ArrayView2<'a, F>,
        y: ArrayView1<'a, F>,
    ) -> Result<Self> {
        let (n_samples, n_features) = x.dim();
        if n_samples == 0 {
            return Err(GlmError::NotEnoughSamples);
        }
        if n_samples != y.len() {
            return Err(GlmError::MismatchedShapes(n_samples, y.len()));
        }
        if x.iter().any(|v| !v.is_finite()) || y.iter().any(|v| !v.is_finite()) {
            return Err(GlmError::InvalidValues);
        }
        if !params.distribution().in_range(&y) {
            return Err(GlmError::InvalidTargetRange(params.distribution()));
        }
        if let Some(w) = params.initial_weights() {
            if w.len() != n_features {
                return Err(GlmError::InvalidInitialWeightsSize(n_features, w.len()));
            }
            if w.iter().any(|v| !v.is_finite()) {
                return Err(GlmError::InvalidValues);
            }
        }
        if let Some(bias) = params.initial_bias() {
            if !bias.is_finite() {
                return Err(GlmError::InvalidValues);
            }
        }

        Ok(IterativeSolver {
            x,
            y,
            cost: CostFunction::new(params.distribution(), params.eta()),
            penalty: ElasticNetPenalty::new(params.penalty(), params.l1_ratio()),
            learning_rate: ConstantLearningRate::new(params.learning_rate()),
            updater: GradientDescent,
            max_iterations: params.max_iterations(),
            tolerance: params.tolerance(),
            with_intercept: params.with_intercept(),
            initial_weights: params.initial_weights().cloned(),
            initial_bias: params.initial_bias(),
            weights: Array1::zeros(0),
            bias: F::zero(),
            previous_weights: Array1::zeros(n_features),
            relative_change: None,
            iteration: 0,
            state: SolverState::Uninitialized,
        })
    }

    /// Initialize weights and bias and reset the iteration state
    ///
    /// Parameters without an initial guess are drawn from a standard normal distribution scaled
    /// by `1 / (n_features + 1)`. The bias stays zero if no intercept is fitted.
    pub fn init_model<R: Rng>(&mut self, rng: &mut R) {
        self.state = SolverState::Initializing;
        let n_features = self.x.ncols();
        let scale = F::one() / F::cast(n_features + 1);

        self.weights = match &self.initial_weights {
            Some(w) => w.clone(),
            None => Array1::<f64>::random_using(n_features, StandardNormal, &mut *rng)
                .mapv(|v| F::cast(v) * scale),
        };
        self.bias = match (self.with_intercept, self.initial_bias) {
            (false, _) => F::zero(),
            (true, Some(bias)) => bias,
            (true, None) => F::cast(rng.sample::<f64, _>(StandardNormal)) * scale,
        };
        self.previous_weights = self.weights.clone();
        self.relative_change = None;
        self.iteration = 0;

        debug!(
            "initialized {} model with {} samples, {} features, bias {}",
            self.cost.distribution(),
            self.x.nrows(),
            n_features,
            self.bias
        );
        self.state = SolverState::Iterating;
    }

    /// Perform a single proximal gradient step
    ///
    /// Marks the solver as converged once the relative change of the weights falls below the
    /// tolerance in any but the first iteration.
    pub fn iteration(&mut self) -> Result<()> {
        assert!(
            self.state != SolverState::Uninitialized && self.state != SolverState::Initializing,
            "The model must be initialized before iterating."
        );

        let rate = self.learning_rate.learning_rate(self.iteration);
        self.previous_weights.assign(&self.weights);

        let (gradient_w, gradient_bias) =
            self.cost
                .gradient(&self.x, &self.y, &self.weights, self.bias, &self.penalty)?;

        self.updater.update(&mut self.weights, &gradient_w, rate);
        if self.with_intercept {
            self.bias = self.updater.update_scalar(self.bias, gradient_bias, rate);
        }

        let threshold = self.penalty.proximal_threshold();
        self.penalty.proximal_update(&mut self.weights, threshold);

        if !self.bias.is_finite() || self.weights.iter().any(|v| !v.is_finite()) {
            return Err(GlmError::Diverged {
                iteration: self.iteration,
            });
        }

        let change = relative_change(&self.weights, &self.previous_weights);
        self.relative_change = Some(change);

        if log_enabled!(Level::Trace) {
            let loss = self.loss()?;
            trace!(
                "iteration {}: loss {}, relative change {}",
                self.iteration,
                loss,
                change
            );
        }

        if self.iteration > 0 && change < self.tolerance {
            self.state = SolverState::Converged;
        }
        self.iteration += 1;

        Ok(())
    }

    /// Iterate until convergence or `max_iterations` and return the fitted model
    pub fn run(mut self) -> Result<Glm<F>> {
        while self.state == SolverState::Iterating {
            if self.iteration >= self.max_iterations {
                self.state = SolverState::MaxIterReached;
                break;
            }
            self.iteration()?;
        }

        if self.state == SolverState::Converged {
            debug!("converged after {} iterations", self.iteration);
        } else {
            warn!(
                "stopped after {} iterations without reaching tolerance {}",
                self.iteration, self.tolerance
            );
        }

        Ok(Glm {
            weights: self.weights,
            bias: self.bias,
            distribution: self.cost.distribution(),
            eta: self.cost.eta(),
            n_iterations: self.iteration,
            converged: self.state == SolverState::Converged,
        })
    }

    /// Penalized negative log-likelihood of the current parameters
    pub fn loss(&self) -> Result<F> {
        self.cost
            .loss(&self.x, &self.y, &self.weights, self.bias, &self.penalty)
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        matches!(
            self.state,
            SolverState::Converged | SolverState::MaxIterReached
        )
    }

    /// Number of iterations performed since initialization
    pub fn n_iterations(&self) -> usize {
        self.iteration
    }

    /// `||w_new - w_old|| / ||w_new||` of the last iteration
    pub fn relative_change(&self) -> Option<F> {
        self.relative_change
    }

    pub fn weights(&self) -> &Array1<F> {
        &self.weights
    }

    pub fn bias(&self) -> F {
        self.bias
    }
}

// an all-zero update of all-zero weights counts as no change
fn relative_change<F: Float>(new: &Array1<F>, old: &Array1<F>) -> F {
    let norm_update = (new - old).mapv(|v| v * v).sum().sqrt();
    let norm_new = new.dot(new).sqrt();
    if norm_new > F::zero() {
        norm_update / norm_new
    } else if norm_update > F::zero() {
        F::infinity()
    } else {
        F::zero()
    }
}

/// View the fitted parameters and make predictions with a fitted GLM
impl<F: Float> Glm<F> {
    /// Get the fitted weights
    pub fn weights(&self) -> &Array1<F> {
        &self.weights
    }

    /// Get the fitted bias, 0. if no intercept was fitted
    pub fn bias(&self) -> F {
        self.bias
    }

    pub fn distribution(&self) -> Distribution {
        self.distribution
    }

    pub fn eta(&self) -> F {
        self.eta
    }

    /// Get the number of iterations taken in the optimization algorithm
    pub fn n_iterations(&self) -> usize {
        self.n_iterations
    }

    /// Returns `true` if the fit stopped on the tolerance rather than on `max_iterations`
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Map the records `x` to the mean of the target distribution
    ///
    /// Returns an empty array if no records are given. Fails with
    /// [`FeatureMismatch`](GlmError::FeatureMismatch) if `x` has a different number of features
    /// than the model was fitted with.
    pub fn apply_regression(&self, x: Option<ArrayView2<F>>) -> Result<Array1<F>> {
        let x = match x {
            Some(x) if x.nrows() > 0 => x,
            _ => return Ok(Array1::zeros(0)),
        };
        if x.ncols() != self.weights.len() {
            return Err(GlmError::FeatureMismatch {
                expected: self.weights.len(),
                got: x.ncols(),
            });
        }

        let cost = CostFunction::new(self.distribution, self.eta);
        cost.non_linearity(&cost.linear_score(&x, &self.weights, self.bias))
    }
}

impl<F: Float, D: Data<Elem = F>> PredictInplace<ArrayBase<D, Ix2>, Array1<F>> for Glm<F> {
    /// Given an input matrix `X`, with shape `(n_samples, n_features)`,
    /// `predict` returns the mean of the target variable according to the
    /// parameters learned from the training data distribution.
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<F>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );
        assert_eq!(
            x.ncols(),
            self.weights.len(),
            "Number of data features must match the number of features the model was trained with."
        );

        match self.apply_regression(Some(x.view())) {
            Ok(mu) => *y = mu,
            Err(err) => panic!("The model cannot be applied: {}", err),
        }
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<F> {
        Array1::zeros(x.nrows())
    }
}
