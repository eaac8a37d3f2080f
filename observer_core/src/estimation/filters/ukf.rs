// observer_core/src/estimation/filters/ukf.rs

use nalgebra::{Cholesky, SMatrix};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{EstimationError, NumericalIssue, Stage};
use crate::estimation::filters::invert_innovation;
use crate::estimation::{Estimator, RecursiveEstimator, StateEstimate};
use crate::models::estimation::dynamics::SystemModel;
use crate::models::estimation::measurement::MeasurementModel;
use crate::types::{ControlVector, OutputCovariance, OutputVector, StateMatrix, StateVector, Time};
use crate::utils::numerics::ensure_finite;

/// Configuration parameters for the UKF's sigma point generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UkfParams {
    pub alpha: f64, // Spreading of sigma points (usually 1e-3)
    pub beta: f64,  // Incorporates prior knowledge of distribution (2.0 is optimal for Gaussian)
    pub kappa: f64, // Secondary scaling parameter (often 0.0 or 3-n)
}

impl Default for UkfParams {
    fn default() -> Self {
        Self {
            alpha: 1e-3,
            beta: 2.0,
            kappa: 0.0,
        }
    }
}

/// A concrete implementation of an Unscented Kalman Filter.
///
/// Uses the same discrete model contracts as the EKF. Only the noise
/// Jacobians `L` and `M` are read from the models; the mean and covariance
/// are carried through the nonlinear functions by `2n + 1` sigma points.
#[derive(Debug, Clone)]
pub struct UnscentedKalmanFilter<const N: usize> {
    estimate: StateEstimate<N>,
    covariance: StateMatrix<N>,
    params: UkfParams,

    // --- UKF-specific internal state ---
    /// Weights for calculating the mean from sigma points.
    weights_m: Vec<f64>,
    /// Weights for calculating the covariance from sigma points.
    weights_c: Vec<f64>,
}

impl<const N: usize> UnscentedKalmanFilter<N> {
    pub fn new(x0: StateVector<N>, p0: StateMatrix<N>, params: UkfParams) -> Self {
        let n = N as f64;
        let lambda = Self::lambda_for(&params);

        // Calculate the weights for the 2n+1 sigma points.
        let mut weights_m = vec![0.5 / (n + lambda); 2 * N + 1];
        let mut weights_c = weights_m.clone();
        weights_m[0] = lambda / (n + lambda);
        weights_c[0] = weights_m[0] + (1.0 - params.alpha.powi(2) + params.beta);

        Self {
            estimate: StateEstimate::new(x0),
            covariance: p0,
            params,
            weights_m,
            weights_c,
        }
    }

    pub fn params(&self) -> &UkfParams {
        &self.params
    }

    fn lambda_for(params: &UkfParams) -> f64 {
        let n = N as f64;
        params.alpha.powi(2) * (n + params.kappa) - n
    }

    /// Generates the `2n+1` sigma points around the current estimate.
    fn generate_sigma_points(&self, stage: Stage) -> Result<Vec<StateVector<N>>, EstimationError> {
        let x = self.estimate.estimate();

        // P = L Lᵀ. No fallback: an indefinite covariance is reported.
        let cholesky = Cholesky::new(self.covariance).ok_or(EstimationError::numerical(
            stage,
            "covariance",
            NumericalIssue::NotPositiveDefinite,
        ))?;
        let scale = (N as f64 + Self::lambda_for(&self.params)).sqrt();
        let scaled_l = cholesky.l() * scale;

        let mut sigma_points = Vec::with_capacity(2 * N + 1);
        sigma_points.push(*x);
        for i in 0..N {
            sigma_points.push(x + scaled_l.column(i));
        }
        for i in 0..N {
            sigma_points.push(x - scaled_l.column(i));
        }
        Ok(sigma_points)
    }

    fn weighted_mean<const D: usize>(&self, points: &[SMatrix<f64, D, 1>]) -> SMatrix<f64, D, 1> {
        points
            .iter()
            .zip(&self.weights_m)
            .fold(SMatrix::zeros(), |acc, (p, w)| acc + p * *w)
    }
}

impl<const N: usize> Estimator<N> for UnscentedKalmanFilter<N> {
    fn estimate(&self) -> &StateVector<N> {
        self.estimate.estimate()
    }
}

impl<const N: usize> RecursiveEstimator<N> for UnscentedKalmanFilter<N> {
    fn covariance(&self) -> &StateMatrix<N> {
        &self.covariance
    }

    fn predict<const M: usize, F>(
        &mut self,
        f: &mut F,
        u: &ControlVector<M>,
        q: &StateMatrix<N>,
        t: Time,
    ) -> Result<&StateVector<N>, EstimationError>
    where
        F: SystemModel<N, M> + ?Sized,
    {
        let x = *self.estimate.estimate();
        f.update_jacobians(&x, u, t)?;
        let l_jac = f.process_noise_jacobian();
        ensure_finite(l_jac, Stage::Predict, "process noise jacobian")?;

        // --- 1. Generate sigma points and push each through the NON-LINEAR model ---
        let propagated: Vec<StateVector<N>> = self
            .generate_sigma_points(Stage::Predict)?
            .iter()
            .map(|point| f.compute_dynamics(point, u, t))
            .collect();
        for point in &propagated {
            ensure_finite(point, Stage::Predict, "propagated sigma point")?;
        }

        // --- 2. Recombine into mean and covariance ---
        let x_pred = self.weighted_mean(&propagated);
        let mut p_pred = l_jac * q * l_jac.transpose();
        for (point, w) in propagated.iter().zip(&self.weights_c) {
            let dx = point - x_pred;
            p_pred += dx * dx.transpose() * *w;
        }

        trace!(t, trace_p = p_pred.trace(), "ukf predict");
        self.covariance = p_pred;
        Ok(self.estimate.set(x_pred))
    }

    fn update<const O: usize, H>(
        &mut self,
        y: &OutputVector<O>,
        h: &mut H,
        r: &OutputCovariance<O>,
    ) -> Result<&StateVector<N>, EstimationError>
    where
        H: MeasurementModel<O, N> + ?Sized,
    {
        let x = *self.estimate.estimate();
        h.update_jacobians(&x)?;
        let m_jac = h.measurement_noise_jacobian();
        ensure_finite(m_jac, Stage::Update, "measurement noise jacobian")?;

        let sigma_points = self.generate_sigma_points(Stage::Update)?;
        let predicted: Vec<OutputVector<O>> = sigma_points
            .iter()
            .map(|point| h.compute_measurement(point))
            .collect();
        for z in &predicted {
            ensure_finite(z, Stage::Update, "predicted measurement")?;
        }
        let y_pred = self.weighted_mean(&predicted);

        // Innovation covariance and state/measurement cross covariance.
        let mut s = m_jac * r * m_jac.transpose();
        let mut p_xy = SMatrix::<f64, N, O>::zeros();
        for ((point, z), w) in sigma_points.iter().zip(&predicted).zip(&self.weights_c) {
            let dx = point - x;
            let dz = z - y_pred;
            s += dz * dz.transpose() * *w;
            p_xy += dx * dz.transpose() * *w;
        }

        let s_inv = invert_innovation(&s)?;
        let k_gain = p_xy * s_inv;

        let innovation = y - y_pred;
        let x_new = x + k_gain * innovation;
        ensure_finite(&x_new, Stage::Update, "corrected state")?;

        trace!(innovation_norm = innovation.norm(), "ukf update");
        self.covariance -= k_gain * s * k_gain.transpose();
        Ok(self.estimate.set(x_new))
    }
}
