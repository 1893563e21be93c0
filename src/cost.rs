//! Cost function of the penalized GLM
//!
//! All quantities are computed from the weights, bias and data passed in, the cost function
//! itself only carries the distribution family and the linearization threshold `eta`.
use linfa::Float;
use ndarray::{Array1, ArrayBase, Data, Ix1, Ix2, Zip};

use crate::distribution::Distribution;
use crate::error::{GlmError, Result};
use crate::penalty::ElasticNetPenalty;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CostFunction<F> {
    distribution: Distribution,
    eta: F,
}

impl<F: Float> CostFunction<F> {
    pub fn new(distribution: Distribution, eta: F) -> Self {
        CostFunction { distribution, eta }
    }

    pub fn distribution(&self) -> Distribution {
        self.distribution
    }

    pub fn eta(&self) -> F {
        self.eta
    }

    /// Linear predictor `x @ w + bias` of every sample
    pub fn linear_score<D1, D2>(
        &self,
        x: &ArrayBase<D1, Ix2>,
        w: &ArrayBase<D2, Ix1>,
        bias: F,
    ) -> Array1<F>
    where
        D1: Data<Elem = F>,
        D2: Data<Elem = F>,
    {
        x.dot(w) + bias
    }

    /// Maps the linear predictor to the mean of the distribution
    ///
    /// For the Poisson family this is `exp(z)`, replaced above `eta` by its tangent
    /// `z * exp(eta) + (1 - eta) * exp(eta)` so that large scores cannot overflow.
    pub fn non_linearity<D: Data<Elem = F>>(&self, z: &ArrayBase<D, Ix1>) -> Result<Array1<F>> {
        match self.distribution {
            Distribution::Poisson => {
                let eta = self.eta;
                let exp_eta = num_traits::Float::exp(eta);
                let offset = (F::one() - eta) * exp_eta;
                Ok(z.mapv(|z| {
                    if z > eta {
                        z * exp_eta + offset
                    } else {
                        num_traits::Float::exp(z)
                    }
                }))
            }
            other => Err(GlmError::NotImplemented(other)),
        }
    }

    /// Derivative of [`non_linearity`](Self::non_linearity) with respect to `z`
    pub fn gradient_non_linearity<D: Data<Elem = F>>(
        &self,
        z: &ArrayBase<D, Ix1>,
    ) -> Result<Array1<F>> {
        match self.distribution {
            Distribution::Poisson => {
                let eta = self.eta;
                let exp_eta = num_traits::Float::exp(eta);
                Ok(z.mapv(|z| {
                    if z > eta {
                        exp_eta
                    } else {
                        num_traits::Float::exp(z)
                    }
                }))
            }
            other => Err(GlmError::NotImplemented(other)),
        }
    }

    /// Gradient of the penalized negative log-likelihood with respect to the weights
    ///
    /// The data term is averaged over the samples, the ridge part of `penalty` is added to
    /// every component. The L1 part is left to the proximal step.
    pub fn gradient_weights<D1, D2, D3>(
        &self,
        x: &ArrayBase<D1, Ix2>,
        y: &ArrayBase<D2, Ix1>,
        w: &ArrayBase<D3, Ix1>,
        bias: F,
        penalty: &ElasticNetPenalty<F>,
    ) -> Result<Array1<F>>
    where
        D1: Data<Elem = F>,
        D2: Data<Elem = F>,
        D3: Data<Elem = F>,
    {
        let residual = self.residual(x, y, w, bias)?;
        Ok(self.weights_from_residual(x, &residual, w, penalty))
    }

    /// Gradient of the negative log-likelihood with respect to the bias
    pub fn gradient_bias<D1, D2, D3>(
        &self,
        x: &ArrayBase<D1, Ix2>,
        y: &ArrayBase<D2, Ix1>,
        w: &ArrayBase<D3, Ix1>,
        bias: F,
    ) -> Result<F>
    where
        D1: Data<Elem = F>,
        D2: Data<Elem = F>,
        D3: Data<Elem = F>,
    {
        let residual = self.residual(x, y, w, bias)?;
        Ok(residual.sum() / F::cast(residual.len()))
    }

    /// Weight and bias gradients sharing a single pass over the data
    pub fn gradient<D1, D2, D3>(
        &self,
        x: &ArrayBase<D1, Ix2>,
        y: &ArrayBase<D2, Ix1>,
        w: &ArrayBase<D3, Ix1>,
        bias: F,
        penalty: &ElasticNetPenalty<F>,
    ) -> Result<(Array1<F>, F)>
    where
        D1: Data<Elem = F>,
        D2: Data<Elem = F>,
        D3: Data<Elem = F>,
    {
        let residual = self.residual(x, y, w, bias)?;
        let gradient_bias = residual.sum() / F::cast(residual.len());
        let gradient_w = self.weights_from_residual(x, &residual, w, penalty);
        Ok((gradient_w, gradient_bias))
    }

    /// Penalized negative log-likelihood, averaged over the samples
    ///
    /// ```ignore
    /// -1 / n_samples * sum(y * ln(mu) - mu) + penalty(w)
    /// ```
    pub fn loss<D1, D2, D3>(
        &self,
        x: &ArrayBase<D1, Ix2>,
        y: &ArrayBase<D2, Ix1>,
        w: &ArrayBase<D3, Ix1>,
        bias: F,
        penalty: &ElasticNetPenalty<F>,
    ) -> Result<F>
    where
        D1: Data<Elem = F>,
        D2: Data<Elem = F>,
        D3: Data<Elem = F>,
    {
        check_samples(x, y)?;
        let mu = self.non_linearity(&self.linear_score(x, w, bias))?;
        let log_likelihood = match self.distribution {
            // zero counts skip `ln(mu)`, which is `-inf` once `exp` underflows
            Distribution::Poisson => Zip::from(y)
                .and(&mu)
                .fold(F::zero(), |acc, &y, &mu| {
                    if y > F::zero() {
                        acc + y * num_traits::Float::ln(mu) - mu
                    } else {
                        acc - mu
                    }
                }),
            other => return Err(GlmError::NotImplemented(other)),
        };

        Ok(-log_likelihood / F::cast(y.len()) + penalty.value(w))
    }

    // derivative of the per-sample negative log-likelihood w.r.t. the linear score
    fn residual<D1, D2, D3>(
        &self,
        x: &ArrayBase<D1, Ix2>,
        y: &ArrayBase<D2, Ix1>,
        w: &ArrayBase<D3, Ix1>,
        bias: F,
    ) -> Result<Array1<F>>
    where
        D1: Data<Elem = F>,
        D2: Data<Elem = F>,
        D3: Data<Elem = F>,
    {
        check_samples(x, y)?;
        let z = self.linear_score(x, w, bias);
        let mu = self.non_linearity(&z)?;
        let grad_mu = self.gradient_non_linearity(&z)?;

        let eta = self.eta;
        match self.distribution {
            // below `eta` the ratio `grad_mu / mu` is one, dividing would give `0 / 0` when
            // `exp(z)` underflows
            Distribution::Poisson => Ok(Zip::from(&z)
                .and(&grad_mu)
                .and(&mu)
                .and(y)
                .map_collect(|&z, &grad_mu, &mu, &y| {
                    if z > eta {
                        grad_mu - y * grad_mu / mu
                    } else {
                        grad_mu - y
                    }
                })),
            other => Err(GlmError::NotImplemented(other)),
        }
    }

    fn weights_from_residual<D1, D3>(
        &self,
        x: &ArrayBase<D1, Ix2>,
        residual: &Array1<F>,
        w: &ArrayBase<D3, Ix1>,
        penalty: &ElasticNetPenalty<F>,
    ) -> Array1<F>
    where
        D1: Data<Elem = F>,
        D3: Data<Elem = F>,
    {
        let n_samples = F::cast(x.nrows());
        let mut gradient = residual.dot(x) / n_samples;
        Zip::from(&mut gradient)
            .and(w)
            .for_each(|grad, &weight| *grad = penalty.subgradient(weight, *grad));
        gradient
    }
}

fn check_samples<F, D1, D2>(x: &ArrayBase<D1, Ix2>, y: &ArrayBase<D2, Ix1>) -> Result<()>
where
    D1: Data<Elem = F>,
    D2: Data<Elem = F>,
{
    if x.nrows() == 0 {
        return Err(GlmError::NotEnoughSamples);
    }
    if x.nrows() != y.len() {
        return Err(GlmError::MismatchedShapes(x.nrows(), y.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    fn train_data() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [0.71307143, -0.67054885, -0.24406853],
            [-0.79774475, -1.65627891, 0.95675428],
            [0.96709333, 1.81672959, 0.20911922],
            [2.1912712, 0.23820139, 1.07501177],
            [-0.58427793, -0.61855905, 1.27687684]
        ];
        let y = Array1::from_elem(5, 7.23514031);
        (x, y)
    }

    #[test]
    fn non_linearity_is_exp_below_eta() {
        let cost = CostFunction::new(Distribution::Poisson, 2.0);
        let z = array![-3.0, 0.0, 1.0, 2.0];
        let mu = cost.non_linearity(&z).unwrap();
        let grad_mu = cost.gradient_non_linearity(&z).unwrap();

        assert_abs_diff_eq!(mu, z.mapv(f64::exp), epsilon = 1e-12);
        assert_abs_diff_eq!(grad_mu, z.mapv(f64::exp), epsilon = 1e-12);
    }

    #[test]
    fn non_linearity_is_linear_above_eta() {
        let cost = CostFunction::new(Distribution::Poisson, 2.0);
        let z = array![3.0, 50.0, 1000.0];
        let mu = cost.non_linearity(&z).unwrap();
        let grad_mu = cost.gradient_non_linearity(&z).unwrap();

        let e2 = 2.0f64.exp();
        assert_abs_diff_eq!(mu[0], 14.778112197861299, epsilon = 1e-10);
        assert_abs_diff_eq!(mu[2], 999.0 * e2, epsilon = 1e-6);
        assert!(mu.iter().all(|v| v.is_finite()));
        assert_abs_diff_eq!(grad_mu, Array1::from_elem(3, e2), epsilon = 1e-12);
    }

    #[test]
    fn non_linearity_is_continuous_at_eta() {
        let cost = CostFunction::new(Distribution::Poisson, 2.0);
        let below = cost.non_linearity(&array![2.0]).unwrap()[0];
        let above = cost.non_linearity(&array![2.0 + 1e-9]).unwrap()[0];
        assert_abs_diff_eq!(below, above, epsilon = 1e-7);

        let grad_below = cost.gradient_non_linearity(&array![2.0]).unwrap()[0];
        let grad_above = cost.gradient_non_linearity(&array![2.5]).unwrap()[0];
        assert_abs_diff_eq!(grad_below, grad_above, epsilon = 1e-12);
    }

    #[test]
    fn poisson_gradient_matches_reference() {
        let (x, y) = train_data();
        let cost = CostFunction::new(Distribution::Poisson, 2.0);
        let penalty = ElasticNetPenalty::new(0.1, 0.5);
        let w = array![0.295102, 0.423805, -0.125878];
        let bias = -0.347144;

        let grad_w = cost.gradient_weights(&x, &y, &w, bias, &penalty).unwrap();
        let grad_bias = cost.gradient_bias(&x, &y, &w, bias).unwrap();

        assert_abs_diff_eq!(
            grad_w,
            array![-2.62183289, 1.87007061, -4.26700914],
            epsilon = 1e-7
        );
        assert_abs_diff_eq!(grad_bias, -6.31650804, epsilon = 1e-7);

        let (joint_w, joint_bias) = cost.gradient(&x, &y, &w, bias, &penalty).unwrap();
        assert_abs_diff_eq!(joint_w, grad_w, epsilon = 1e-12);
        assert_abs_diff_eq!(joint_bias, grad_bias, epsilon = 1e-12);
    }

    #[test]
    fn poisson_loss_matches_reference() {
        let (x, y) = train_data();
        let cost = CostFunction::new(Distribution::Poisson, 2.0);
        let penalty = ElasticNetPenalty::new(0.1, 0.5);
        let w = array![0.295102, 0.423805, -0.125878];

        let loss = cost.loss(&x, &y, &w, -0.347144, &penalty).unwrap();
        assert_abs_diff_eq!(loss, 3.558918085190269, epsilon = 1e-9);
    }

    #[test]
    fn underflowing_scores_keep_gradient_finite() {
        let cost = CostFunction::new(Distribution::Poisson, 2.0);
        let penalty = ElasticNetPenalty::new(0.1, 0.5);
        let x = array![[1.0], [-800.0]];
        let y = array![1.0, 0.0];
        let w = array![1.0];

        assert_eq!(cost.non_linearity(&array![-800.0]).unwrap()[0], 0.0);

        let (grad_w, grad_bias) = cost.gradient(&x, &y, &w, 0.0, &penalty).unwrap();
        let e = 1.0f64.exp();
        assert_abs_diff_eq!(grad_w, array![(e - 1.0) / 2.0 + 0.05], epsilon = 1e-12);
        assert_abs_diff_eq!(grad_bias, (e - 1.0) / 2.0, epsilon = 1e-12);

        let loss = cost.loss(&x, &y, &w, 0.0, &penalty).unwrap();
        assert_abs_diff_eq!(loss, (e - 1.0) / 2.0 + 0.075, epsilon = 1e-12);
    }

    #[test]
    fn unsupported_family_is_not_implemented() {
        let (x, y) = train_data();
        let cost = CostFunction::new(Distribution::Gamma, 2.0);
        let penalty = ElasticNetPenalty::new(0.1, 0.5);
        let w = array![0.1, 0.2, 0.3];

        assert!(matches!(
            cost.non_linearity(&array![1.0]),
            Err(GlmError::NotImplemented(Distribution::Gamma))
        ));
        assert!(matches!(
            cost.gradient_non_linearity(&array![1.0]),
            Err(GlmError::NotImplemented(Distribution::Gamma))
        ));
        assert!(matches!(
            cost.gradient_weights(&x, &y, &w, 0.0, &penalty),
            Err(GlmError::NotImplemented(Distribution::Gamma))
        ));
        assert!(matches!(
            cost.gradient_bias(&x, &y, &w, 0.0),
            Err(GlmError::NotImplemented(Distribution::Gamma))
        ));
    }

    #[test]
    fn empty_or_mismatched_data_is_rejected() {
        let cost = CostFunction::new(Distribution::Poisson, 2.0);
        let w = array![0.1, 0.2];

        let empty = Array2::<f64>::zeros((0, 2));
        assert!(matches!(
            cost.gradient_bias(&empty, &Array1::zeros(0), &w, 0.0),
            Err(GlmError::NotEnoughSamples)
        ));

        let x = array![[1.0, 2.0], [3.0, 4.0]];
        assert!(matches!(
            cost.gradient_bias(&x, &array![1.0], &w, 0.0),
            Err(GlmError::MismatchedShapes(2, 1))
        ));
    }
}
