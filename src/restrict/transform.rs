use nalgebra::*;
use crate::prob::{Transform, Result};
use crate::calc;
use super::Restriction;

/// Applies a transform defined over the full parameter space to the dims_to_sample
/// entries only. Inputs are re-inserted into the condition, transformed as full vectors,
/// and projected back.
///
/// The Jacobian is taken over the full reconstructed vectors, so it carries the
/// (constant) contribution of the fixed dimensions, which samplers ignore.
///
/// # Panics
///
/// forward, inverse and log_abs_det_jacobian panic when their input does not have one
/// column per sampled dimension. Use Restriction::reconstruct to check the width of
/// samples beforehand.
#[derive(Debug, Clone)]
pub struct RestrictedTransform<T> {

    full_transform : T,

    restriction : Restriction

}

impl<T> RestrictedTransform<T>
where
    T : Transform
{

    pub fn new(full_transform : T, condition : DVector<f64>, dims_to_sample : Vec<usize>) -> Result<Self> {
        Ok(Self { full_transform, restriction : Restriction::new(condition, dims_to_sample)? })
    }

    pub fn restriction(&self) -> &Restriction {
        &self.restriction
    }

    fn full(&self, theta : &DMatrix<f64>) -> DMatrix<f64> {
        calc::scatter_columns(self.restriction.condition(), theta, self.restriction.dims_to_sample())
    }

}

impl<T> Transform for RestrictedTransform<T>
where
    T : Transform
{

    fn forward(&self, theta : &DMatrix<f64>) -> DMatrix<f64> {
        let full_theta = self.full(theta);
        self.restriction.project(&self.full_transform.forward(&full_theta))
    }

    fn inverse(&self, theta : &DMatrix<f64>) -> DMatrix<f64> {
        let full_theta = self.full(theta);
        self.restriction.project(&self.full_transform.inverse(&full_theta))
    }

    fn log_abs_det_jacobian(&self, theta1 : &DMatrix<f64>, theta2 : &DMatrix<f64>) -> DVector<f64> {
        let full_theta1 = self.full(theta1);
        let full_theta2 = self.full(theta2);
        self.full_transform.log_abs_det_jacobian(&full_theta1, &full_theta2)
    }

}
