// observer_core/src/types.rs

use nalgebra::{SMatrix, SVector};

// --- Core Type Aliases ---
// Every dimension is a const generic, so a mismatched model or noise matrix
// is a type error rather than a runtime panic.
pub type Time = f64;
pub type StateVector<const N: usize> = SVector<f64, N>;
pub type ControlVector<const M: usize> = SVector<f64, M>;
pub type OutputVector<const O: usize> = SVector<f64, O>;

pub type StateMatrix<const N: usize> = SMatrix<f64, N, N>;
pub type ControlMatrix<const N: usize, const M: usize> = SMatrix<f64, N, M>;
pub type OutputMatrix<const O: usize, const N: usize> = SMatrix<f64, O, N>;
pub type OutputCovariance<const O: usize> = SMatrix<f64, O, O>;
