// observer_core/tests/linearization.rs

use std::sync::Arc;

use approx::assert_abs_diff_eq;
use nalgebra::{Matrix4, Matrix4x2, Vector2, Vector4};
use observer_core::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Uniform};

const SAMPLES: usize = 1000;

/// Two pendulums joined by a spring. The first is torqued through a
/// configuration-dependent gain; the first input also damps the second
/// pendulum in proportion to its rate, so `B` depends on the state and `A`
/// depends on the control.
#[derive(Debug)]
struct CoupledPendulums {
    spring: f64,
}

impl Dynamics<4, 2> for CoupledPendulums {
    fn get_derivatives(&self, x: &StateVector<4>, u: &ControlVector<2>, _t: Time) -> StateVector<4> {
        let (q1, q2, w1, w2) = (x[0], x[1], x[2], x[3]);
        let k = self.spring;
        Vector4::new(
            w1,
            w2,
            -q1.sin() + k * (q2 - q1) + u[0] * q1.cos(),
            -q2.sin() - k * (q2 - q1) + u[1] + 0.1 * u[0] * w2,
        )
    }

    fn calculate_jacobian(
        &self,
        x: &StateVector<4>,
        u: &ControlVector<2>,
        _t: Time,
    ) -> Option<(StateMatrix<4>, ControlMatrix<4, 2>)> {
        let (q1, q2, w2) = (x[0], x[1], x[3]);
        let k = self.spring;

        #[rustfmt::skip]
        let a = Matrix4::new(
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
            -q1.cos() - k - u[0] * q1.sin(), k, 0.0, 0.0,
            k, -q2.cos() - k, 0.0, 0.1 * u[0],
        );
        #[rustfmt::skip]
        let b = Matrix4x2::new(
            0.0, 0.0,
            0.0, 0.0,
            q1.cos(), 0.0,
            0.1 * w2, 1.0,
        );
        Some((a, b))
    }
}

fn compare(scheme: DifferenceScheme, seed: u64) {
    let system: Arc<dyn Dynamics<4, 2>> = Arc::new(CoupledPendulums { spring: 0.8 });
    let analytic = AnalyticLinearizer::new(system.clone()).unwrap();
    let numeric = NumDiffLinearizer::with_scheme(system, scheme);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let unit = Uniform::new_inclusive(-1.0, 1.0);

    for _ in 0..SAMPLES {
        let x = Vector4::from_fn(|_, _| unit.sample(&mut rng));
        let u = Vector2::from_fn(|_, _| unit.sample(&mut rng));
        let t = unit.sample(&mut rng);

        let (a_exact, b_exact) = analytic.linearize(&x, &u, t).unwrap();
        let (a_num, b_num) = numeric.linearize(&x, &u, t).unwrap();

        assert_abs_diff_eq!(a_num, a_exact, epsilon = 1e-5);
        assert_abs_diff_eq!(b_num, b_exact, epsilon = 1e-4);
    }
}

#[test]
fn central_differences_match_analytic_jacobians() {
    compare(DifferenceScheme::Central, 3);
}

#[test]
fn forward_differences_match_analytic_jacobians() {
    compare(DifferenceScheme::Forward, 5);
}

#[test]
fn analytic_linearizer_rejects_system_without_jacobians() {
    #[derive(Debug)]
    struct Opaque;

    impl Dynamics<4, 2> for Opaque {
        fn get_derivatives(&self, x: &StateVector<4>, _u: &ControlVector<2>, _t: Time) -> StateVector<4> {
            -x
        }
    }

    let err = AnalyticLinearizer::new(Arc::new(Opaque) as Arc<dyn Dynamics<4, 2>>).unwrap_err();
    assert_eq!(err, ConfigError::MissingJacobian("dynamics model"));
    assert!(EstimationError::from(err).is_configuration());
}
