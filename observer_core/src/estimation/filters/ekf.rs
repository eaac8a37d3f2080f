// observer_core/src/estimation/filters/ekf.rs

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{EstimationError, Stage};
use crate::estimation::filters::invert_innovation;
use crate::estimation::{Estimator, RecursiveEstimator, StateEstimate};
use crate::models::estimation::dynamics::SystemModel;
use crate::models::estimation::measurement::MeasurementModel;
use crate::types::{ControlVector, OutputCovariance, OutputVector, StateMatrix, StateVector, Time};
use crate::utils::numerics::{ensure_finite, symmetrize};

/// How the covariance is corrected after a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CovarianceUpdate {
    /// `P − K H P`. Cheapest; can drift from symmetry over long runs.
    #[default]
    Simple,
    /// The simple form followed by `(P + Pᵀ) / 2`.
    Symmetrized,
    /// `(I − K H) P (I − K H)ᵀ + K M R Mᵀ Kᵀ`.
    Joseph,
}

/// A concrete implementation of an Extended Kalman Filter.
///
/// Linearization is delegated entirely to the model objects passed into
/// `predict` and `update`; the filter only consumes their Jacobians.
#[derive(Debug, Clone)]
pub struct ExtendedKalmanFilter<const N: usize> {
    /// The current state estimate (x).
    estimate: StateEstimate<N>,
    /// The estimate covariance (P).
    covariance: StateMatrix<N>,
    covariance_update: CovarianceUpdate,
}

impl<const N: usize> ExtendedKalmanFilter<N> {
    /// Creates a new EKF instance.
    pub fn new(x0: StateVector<N>, p0: StateMatrix<N>) -> Self {
        Self {
            estimate: StateEstimate::new(x0),
            covariance: p0,
            covariance_update: CovarianceUpdate::default(),
        }
    }

    /// Starts from `x0` with identity covariance.
    pub fn with_state(x0: StateVector<N>) -> Self {
        Self::new(x0, StateMatrix::identity())
    }

    pub fn with_covariance_update(mut self, covariance_update: CovarianceUpdate) -> Self {
        self.covariance_update = covariance_update;
        self
    }

    pub fn covariance_update(&self) -> CovarianceUpdate {
        self.covariance_update
    }
}

impl<const N: usize> Default for ExtendedKalmanFilter<N> {
    fn default() -> Self {
        Self::new(StateVector::zeros(), StateMatrix::identity())
    }
}

impl<const N: usize> Estimator<N> for ExtendedKalmanFilter<N> {
    fn estimate(&self) -> &StateVector<N> {
        self.estimate.estimate()
    }
}

impl<const N: usize> RecursiveEstimator<N> for ExtendedKalmanFilter<N> {
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

        // 1. Relinearize at the current point.
        f.update_jacobians(&x, u, t)?;
        let f_jac = f.state_jacobian();
        let l_jac = f.process_noise_jacobian();
        ensure_finite(f_jac, Stage::Predict, "state jacobian")?;
        ensure_finite(l_jac, Stage::Predict, "process noise jacobian")?;

        // 2. Propagate the state through the full nonlinear model.
        let x_pred = f.compute_dynamics(&x, u, t);
        ensure_finite(&x_pred, Stage::Predict, "propagated state")?;

        // 3. P = F P Fᵀ + L Q Lᵀ
        let p_pred =
            f_jac * self.covariance * f_jac.transpose() + l_jac * q * l_jac.transpose();
        ensure_finite(&p_pred, Stage::Predict, "predicted covariance")?;

        trace!(t, trace_p = p_pred.trace(), "ekf predict");
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
        let p = self.covariance;

        // 1. Relinearize the sensor at the current estimate.
        h.update_jacobians(&x)?;
        let h_jac = h.observation_jacobian();
        let m_jac = h.measurement_noise_jacobian();
        ensure_finite(h_jac, Stage::Update, "observation jacobian")?;
        ensure_finite(m_jac, Stage::Update, "measurement noise jacobian")?;

        let y_pred = h.compute_measurement(&x);
        ensure_finite(&y_pred, Stage::Update, "predicted measurement")?;

        // 2. Innovation covariance (S) and Kalman gain (K).
        let noise = m_jac * r * m_jac.transpose();
        let s = h_jac * p * h_jac.transpose() + noise;
        let s_inv = invert_innovation(&s)?;
        let k_gain = p * h_jac.transpose() * s_inv;

        // 3. Correct the state and covariance.
        let innovation = y - y_pred;
        let x_new = x + k_gain * innovation;
        ensure_finite(&x_new, Stage::Update, "corrected state")?;

        let p_new = match self.covariance_update {
            CovarianceUpdate::Simple => p - k_gain * h_jac * p,
            CovarianceUpdate::Symmetrized => symmetrize(&(p - k_gain * h_jac * p)),
            CovarianceUpdate::Joseph => {
                let i_kh = StateMatrix::<N>::identity() - k_gain * h_jac;
                i_kh * p * i_kh.transpose() + k_gain * noise * k_gain.transpose()
            }
        };

        trace!(innovation_norm = innovation.norm(), "ekf update");
        self.covariance = p_new;
        Ok(self.estimate.set(x_new))
    }
}
