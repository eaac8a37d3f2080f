// observer_core/tests/ekf_properties.rs

use approx::assert_relative_eq;
use nalgebra::SMatrix;
use observer_core::prelude::*;
use observer_core::utils::numerics::max_asymmetry;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const N: usize = 4;
const M: usize = 2;
const O: usize = 2;
const TRIALS: usize = 1000;
const STEPS: usize = 10;

fn random_matrix<const R: usize, const C: usize>(rng: &mut ChaCha8Rng, scale: f64) -> SMatrix<f64, R, C> {
    SMatrix::from_fn(|_, _| rng.gen_range(-scale..scale))
}

fn random_covariance<const D: usize>(rng: &mut ChaCha8Rng) -> SMatrix<f64, D, D> {
    let g = random_matrix::<D, D>(rng, 1.0);
    g * g.transpose() + SMatrix::<f64, D, D>::identity() * 0.1
}

/// Runs the EKF prediction against the closed-form linear recursion.
fn check_prediction(
    a: StateMatrix<N>,
    b: ControlMatrix<N, M>,
    x0: StateVector<N>,
    p0: StateMatrix<N>,
    q: StateMatrix<N>,
    controls: &[ControlVector<M>],
) {
    let mut model = LinearSystemModel::new(a, b);
    let mut ekf = ExtendedKalmanFilter::new(x0, p0);

    let mut x = x0;
    let mut p = p0;
    for (k, u) in controls.iter().enumerate() {
        ekf.predict(&mut model, u, &q, k as f64).unwrap();
        x = a * x + b * u;
        p = a * p * a.transpose() + q;

        assert_relative_eq!(*ekf.estimate(), x, epsilon = 1e-9, max_relative = 1e-9);
        assert_relative_eq!(*ekf.covariance(), p, epsilon = 1e-9, max_relative = 1e-9);
    }
}

#[test]
fn prediction_only_matches_linear_recursion() {
    // Degenerate case first: everything zero.
    check_prediction(
        StateMatrix::zeros(),
        ControlMatrix::zeros(),
        StateVector::zeros(),
        StateMatrix::zeros(),
        StateMatrix::zeros(),
        &[ControlVector::zeros(); STEPS],
    );

    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for _ in 0..TRIALS {
        let a = random_matrix::<N, N>(&mut rng, 0.5);
        let b = random_matrix::<N, M>(&mut rng, 1.0);
        let x0 = random_matrix::<N, 1>(&mut rng, 1.0);
        let p0 = random_covariance::<N>(&mut rng);
        let q = random_covariance::<N>(&mut rng) * 0.01;
        let controls: Vec<ControlVector<M>> =
            (0..STEPS).map(|_| random_matrix::<M, 1>(&mut rng, 1.0)).collect();

        check_prediction(a, b, x0, p0, q, &controls);
    }
}

#[test]
fn covariance_stays_symmetric_through_predict_and_update() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    for form in [
        CovarianceUpdate::Simple,
        CovarianceUpdate::Symmetrized,
        CovarianceUpdate::Joseph,
    ] {
        for _ in 0..100 {
            let mut model = LinearSystemModel::new(
                random_matrix::<N, N>(&mut rng, 0.5),
                random_matrix::<N, M>(&mut rng, 1.0),
            );
            let mut sensor = LinearMeasurementModel::new(random_matrix::<O, N>(&mut rng, 1.0));
            let q = random_covariance::<N>(&mut rng) * 0.01;
            let r = random_covariance::<O>(&mut rng);

            let mut ekf = ExtendedKalmanFilter::new(
                random_matrix::<N, 1>(&mut rng, 1.0),
                random_covariance::<N>(&mut rng),
            )
            .with_covariance_update(form);

            for k in 0..STEPS {
                let u = random_matrix::<M, 1>(&mut rng, 1.0);
                ekf.predict(&mut model, &u, &q, k as f64).unwrap();
                let p = ekf.covariance();
                assert!(max_asymmetry(p) <= 1e-9 * p.amax().max(1.0));

                let y = random_matrix::<O, 1>(&mut rng, 1.0);
                ekf.update(&y, &mut sensor, &r).unwrap();
                let p = ekf.covariance();
                assert!(max_asymmetry(p) <= 1e-9 * p.amax().max(1.0));
            }
        }
    }
}

#[test]
fn zero_innovation_leaves_state_unchanged() {
    let mut rng = ChaCha8Rng::seed_from_u64(23);
    for _ in 0..TRIALS {
        let x0 = random_matrix::<N, 1>(&mut rng, 1.0);
        let p0 = random_covariance::<N>(&mut rng);
        let mut sensor = LinearMeasurementModel::new(random_matrix::<O, N>(&mut rng, 1.0));
        let r = random_covariance::<O>(&mut rng);
        let mut ekf = ExtendedKalmanFilter::new(x0, p0);

        // A measurement equal to the prediction carries no information about the mean.
        let y = sensor.compute_measurement(&x0);
        let x = *ekf.update(&y, &mut sensor, &r).unwrap();

        assert_relative_eq!(x, x0, epsilon = 1e-12);
        // The covariance still shrinks.
        assert!(ekf.covariance().trace() <= p0.trace());
    }
}
