use nalgebra::*;
use serde::{Serialize, Deserialize};
use crate::prob::{Error, Result};
use crate::calc;

/// Potential evaluated over a subset of the parameters, with the remaining ones pinned.
mod potential;

pub use potential::*;

mod prior;

pub use prior::*;

mod transform;

pub use transform::*;

/// A full-dimensional condition and the (ordered) dimensions exposed to a sampler. The
/// entries of condition at dims_to_sample are placeholders that are overwritten by the
/// sampled values; the remaining entries are held fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restriction {

    condition : DVector<f64>,

    dims_to_sample : Vec<usize>

}

impl Restriction {

    pub fn new(condition : DVector<f64>, dims_to_sample : Vec<usize>) -> Result<Self> {
        calc::valid_dims(&dims_to_sample, condition.nrows()).map_err(Error::Shape)?;
        Ok(Self { condition, dims_to_sample })
    }

    pub fn condition(&self) -> &DVector<f64> {
        &self.condition
    }

    pub fn dims_to_sample(&self) -> &[usize] {
        &self.dims_to_sample[..]
    }

    /// Dimensions held fixed, in ascending order.
    pub fn fixed_dims(&self) -> Vec<usize> {
        calc::complement(&self.dims_to_sample, self.condition.nrows())
    }

    /// Full-dimensional samples (one per row of theta) holding the condition at the fixed
    /// dimensions and the columns of theta at the sampled ones.
    pub fn reconstruct(&self, theta : &DMatrix<f64>) -> Result<DMatrix<f64>> {
        if theta.ncols() != self.dims_to_sample.len() {
            return Err(Error::Shape(format!(
                "Restricted samples should have {} columns, but have {}",
                self.dims_to_sample.len(),
                theta.ncols()
            )));
        }
        Ok(calc::scatter_columns(&self.condition, theta, &self.dims_to_sample))
    }

    /// Columns of full-dimensional samples at the sampled dimensions.
    pub fn project(&self, theta : &DMatrix<f64>) -> DMatrix<f64> {
        calc::select_columns(theta, &self.dims_to_sample)
    }

}

#[test]
fn restriction_validates_dims() {
    let cond = DVector::from_column_slice(&[1., 2., 3.]);
    assert!(Restriction::new(cond.clone(), vec![0, 3]).is_err());
    assert!(Restriction::new(cond.clone(), vec![1, 1]).is_err());
    let r = Restriction::new(cond, vec![2, 0]).unwrap();
    assert_eq!(r.fixed_dims(), vec![1]);
    let full = r.reconstruct(&DMatrix::from_row_slice(2, 2, &[10., 20., 30., 40.])).unwrap();
    assert_eq!(full, DMatrix::from_row_slice(2, 3, &[20., 2., 10., 40., 2., 30.]));
    assert_eq!(r.project(&full), DMatrix::from_row_slice(2, 2, &[10., 20., 30., 40.]));
    assert!(r.reconstruct(&DMatrix::zeros(1, 3)).is_err());
}
