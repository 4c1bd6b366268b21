use nalgebra::*;
use super::*;
use serde::{Serialize, Deserialize};
use crate::calc::Variate;

/// A bijection between two parameter spaces of the same dimension, applied
/// independently to each row of a sample matrix.
pub trait Transform {

    /// Maps rows from the domain to the codomain.
    fn forward(&self, theta : &DMatrix<f64>) -> DMatrix<f64>;

    /// Maps rows from the codomain back to the domain.
    fn inverse(&self, theta : &DMatrix<f64>) -> DMatrix<f64>;

    /// log|d theta2 / d theta1| for each row, where theta2 = forward(theta1).
    fn log_abs_det_jacobian(&self, theta1 : &DMatrix<f64>, theta2 : &DMatrix<f64>) -> DVector<f64>;

}

#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransform;

impl Transform for IdentityTransform {

    fn forward(&self, theta : &DMatrix<f64>) -> DMatrix<f64> {
        theta.clone()
    }

    fn inverse(&self, theta : &DMatrix<f64>) -> DMatrix<f64> {
        theta.clone()
    }

    fn log_abs_det_jacobian(&self, theta1 : &DMatrix<f64>, _theta2 : &DMatrix<f64>) -> DVector<f64> {
        DVector::zeros(theta1.nrows())
    }

}

/// Elementwise affine map: forward(theta) = theta * scale + shift.
/// This is the layer density estimators use to standardize their inputs, in which case
/// shift = -mean / std and scale = 1 / std.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffineTransform {

    pub shift : DVector<f64>,

    pub scale : DVector<f64>

}

impl AffineTransform {

    pub fn new(shift : DVector<f64>, scale : DVector<f64>) -> Result<Self> {
        if shift.nrows() != scale.nrows() {
            return Err(Error::Shape(format!(
                "Affine transform with shift of size {} and scale of size {}",
                shift.nrows(),
                scale.nrows()
            )));
        }
        if scale.iter().any(|s| *s == 0.0 || !s.is_finite() ) {
            return Err(Error::Shape(String::from("Affine scale must be finite and non-zero")));
        }
        Ok(Self { shift, scale })
    }

    /// Standardizing transform for variables with the informed means and standard deviations.
    pub fn standardizing(mean : &DVector<f64>, std : &DVector<f64>) -> Result<Self> {
        let scale = std.map(|s| 1. / s );
        let shift = -mean.component_mul(&scale);
        Self::new(shift, scale)
    }

}

impl Transform for AffineTransform {

    fn forward(&self, theta : &DMatrix<f64>) -> DMatrix<f64> {
        DMatrix::from_fn(theta.nrows(), theta.ncols(), |i, j| theta[(i, j)] * self.scale[j] + self.shift[j] )
    }

    fn inverse(&self, theta : &DMatrix<f64>) -> DMatrix<f64> {
        DMatrix::from_fn(theta.nrows(), theta.ncols(), |i, j| (theta[(i, j)] - self.shift[j]) / self.scale[j] )
    }

    fn log_abs_det_jacobian(&self, theta1 : &DMatrix<f64>, _theta2 : &DMatrix<f64>) -> DVector<f64> {
        let ladj = self.scale.iter().map(|s| s.abs().ln() ).sum();
        DVector::from_element(theta1.nrows(), ladj)
    }

}

/// Maps the real line into the interval (low, high) in each dimension:
/// forward(z) = low + (high - low) * sigmoid(z), inverse(theta) = logit((theta - low) / (high - low)).
/// This lets samplers move in unconstrained space while the prior is a box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxTransform {

    low : DVector<f64>,

    high : DVector<f64>

}

impl BoxTransform {

    pub fn new(low : DVector<f64>, high : DVector<f64>) -> Result<Self> {
        if low.nrows() != high.nrows() || low.iter().zip(high.iter()).any(|(l, h)| !(l < h) ) {
            return Err(Error::Shape(String::from("Box transform requires low < high at every dimension")));
        }
        Ok(Self { low, high })
    }

    /// Transform to the support of the informed box-uniform prior.
    pub fn from_prior(prior : &BoxUniform) -> Self {
        Self { low : prior.low().clone(), high : prior.high().clone() }
    }

}

impl Transform for BoxTransform {

    fn forward(&self, theta : &DMatrix<f64>) -> DMatrix<f64> {
        DMatrix::from_fn(theta.nrows(), theta.ncols(), |i, j| {
            self.low[j] + (self.high[j] - self.low[j]) * theta[(i, j)].sigmoid()
        })
    }

    fn inverse(&self, theta : &DMatrix<f64>) -> DMatrix<f64> {
        DMatrix::from_fn(theta.nrows(), theta.ncols(), |i, j| {
            ((theta[(i, j)] - self.low[j]) / (self.high[j] - self.low[j])).logit()
        })
    }

    // d/dz [low + w sigmoid(z)] = w sigmoid(z) sigmoid(-z)
    fn log_abs_det_jacobian(&self, theta1 : &DMatrix<f64>, _theta2 : &DMatrix<f64>) -> DVector<f64> {
        DVector::from_fn(theta1.nrows(), |i, _| {
            (0..theta1.ncols()).map(|j| {
                let z = theta1[(i, j)];
                (self.high[j] - self.low[j]).ln() + z.log_sigmoid() + (-z).log_sigmoid()
            }).sum()
        })
    }

}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn box_transform_round_trip() {
        let tf = BoxTransform::new(
            DVector::from_column_slice(&[-1., 0.]),
            DVector::from_column_slice(&[1., 10.])
        ).unwrap();
        let z = DMatrix::from_row_slice(2, 2, &[0.3, -2., 4., 0.]);
        let theta = tf.forward(&z);
        assert!(theta.column(1).iter().all(|t| *t > 0. && *t < 10. ));
        assert_relative_eq!(tf.inverse(&theta), z, epsilon = 1E-8);
    }

    #[test]
    fn box_jacobian_matches_finite_difference() {
        let tf = BoxTransform::new(DVector::from_element(1, 2.), DVector::from_element(1, 5.)).unwrap();
        let h = 1E-6;
        let z = DMatrix::from_element(1, 1, 0.7);
        let dz = DMatrix::from_element(1, 1, 0.7 + h);
        let fd = (tf.forward(&dz)[(0, 0)] - tf.forward(&z)[(0, 0)]) / h;
        assert_relative_eq!(tf.log_abs_det_jacobian(&z, &tf.forward(&z))[0], fd.ln(), epsilon = 1E-5);
    }

    #[test]
    fn standardizing_maps_mean_to_zero() {
        let mean = DVector::from_column_slice(&[3., -2.]);
        let std = DVector::from_column_slice(&[2., 0.5]);
        let tf = AffineTransform::standardizing(&mean, &std).unwrap();
        let out = tf.forward(&DMatrix::from_row_slice(1, 2, &[3., -2.]));
        assert_relative_eq!(out, DMatrix::zeros(1, 2), epsilon = 1E-12);
        let back = tf.inverse(&DMatrix::from_row_slice(1, 2, &[1., 1.]));
        assert_relative_eq!(back, DMatrix::from_row_slice(1, 2, &[5., -1.5]), epsilon = 1E-12);
    }

}
