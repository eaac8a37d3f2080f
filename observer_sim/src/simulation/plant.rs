// observer_sim/src/simulation/plant.rs

use nalgebra::{Matrix2, Vector2};
use observer_core::prelude::*;

use crate::simulation::config::PlantConfig;

/// A mass on a spring with viscous damping, pushed by a force input.
///
/// State: `[position, velocity]`. Input: `[force]`.
#[derive(Debug, Clone, Copy)]
pub struct MassSpringDamper {
    pub mass: f64,
    pub stiffness: f64,
    pub damping: f64,
}

impl MassSpringDamper {
    pub fn from_config(config: &PlantConfig) -> Self {
        Self {
            mass: config.mass,
            stiffness: config.stiffness,
            damping: config.damping,
        }
    }

    /// Resting position under a constant force.
    pub fn equilibrium(&self, force: f64) -> f64 {
        force / self.stiffness
    }
}

impl Dynamics<2, 1> for MassSpringDamper {
    fn get_derivatives(&self, x: &StateVector<2>, u: &ControlVector<1>, _t: Time) -> StateVector<2> {
        let acceleration = (u[0] - self.stiffness * x[0] - self.damping * x[1]) / self.mass;
        Vector2::new(x[1], acceleration)
    }

    fn calculate_jacobian(
        &self,
        _x: &StateVector<2>,
        _u: &ControlVector<1>,
        _t: Time,
    ) -> Option<(StateMatrix<2>, ControlMatrix<2, 1>)> {
        let a = Matrix2::new(
            0.0,
            1.0,
            -self.stiffness / self.mass,
            -self.damping / self.mass,
        );
        let b = Vector2::new(0.0, 1.0 / self.mass);
        Some((a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector1;

    #[test]
    fn test_settles_at_equilibrium() {
        let plant = MassSpringDamper {
            mass: 1.0,
            stiffness: 2.0,
            damping: 1.5,
        };
        let force = Vector1::new(0.5);
        let x = plant.propagate(&Vector2::zeros(), &force, 0.0, 30.0, 3000, &RK4);

        assert_abs_diff_eq!(x[0], plant.equilibrium(0.5), epsilon = 1e-6);
        assert_abs_diff_eq!(x[1], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_jacobian_matches_numerical() {
        let plant = MassSpringDamper {
            mass: 2.0,
            stiffness: 3.0,
            damping: 0.4,
        };
        let (a, b) = plant
            .calculate_jacobian(&Vector2::zeros(), &Vector1::zeros(), 0.0)
            .unwrap();

        let numeric = NumDiffLinearizer::new(std::sync::Arc::new(plant) as std::sync::Arc<dyn Dynamics<2, 1>>);
        let (a_num, b_num) = numeric
            .linearize(&Vector2::new(0.3, -0.1), &Vector1::new(0.2), 0.0)
            .unwrap();
        assert_abs_diff_eq!(a, a_num, epsilon = 1e-8);
        assert_abs_diff_eq!(b, b_num, epsilon = 1e-8);
    }
}
