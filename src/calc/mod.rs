use nalgebra::*;
use num_traits::Float;
use std::collections::HashSet;

/// Functions applicable to scalar realizations and parameters that map between
/// a bounded interval and the real line.
pub trait Variate {

    // natural logarithm of the odds.
    fn logit(&self) -> Self;

    // Converts a logit on [-inf, inf] back to a probability on [0,1]
    fn sigmoid(&self) -> Self;

    /// Natural logarithm of the sigmoid, evaluated without overflowing
    /// for large negative arguments.
    fn log_sigmoid(&self) -> Self;

}

impl Variate for f64 {

    // The logit or log-odds of a probability p \in [0,1]
    // is the natural log of the ratio p/(1-p)
    fn logit(&self) -> Self {
        let p = if *self == 0.0 {
            f64::EPSILON
        } else {
            *self
        };
        (p / (1. - p)).ln()
    }

    // The sigmoid is the inverse of the logit (or log-odds function).
    // and is given by 1 / (1 + exp(-logit))
    fn sigmoid(&self) -> Self {
        if *self >= 0.0 {
            1. / (1. + (-1. * (*self)).exp() )
        } else {
            let e = self.exp();
            e / (1. + e)
        }
    }

    fn log_sigmoid(&self) -> Self {
        if *self >= 0.0 {
            -(-self).exp().ln_1p()
        } else {
            *self - self.exp().ln_1p()
        }
    }

}

/// Returns n evenly-spaced points in the closed interval [start, end]. A single
/// point resolves to start.
pub fn linspace(start : f64, end : f64, n : usize) -> DVector<f64> {
    match n {
        0 => DVector::zeros(0),
        1 => DVector::from_element(1, start),
        _ => {
            let step = (end - start) / (n - 1) as f64;
            DVector::from_fn(n, |i, _| if i == n - 1 { end } else { start + step * i as f64 })
        }
    }
}

/// Log of the sum of exponentials, shifted by the maximum so that no term overflows.
/// Empty iterators and iterators holding only -inf evaluate to -inf.
pub fn logsumexp<F>(vals : impl IntoIterator<Item=F>) -> F
where
    F : Float
{
    let vals : Vec<F> = vals.into_iter().collect();
    let max = vals.iter().fold(F::neg_infinity(), |m, v| if *v > m { *v } else { m });
    if max == F::neg_infinity() {
        return F::neg_infinity();
    }
    if max == F::infinity() {
        return F::infinity();
    }
    max + vals.iter().fold(F::zero(), |acc, v| acc + (*v - max).exp() ).ln()
}

/// Indices in [0, n) that are not in dims, in ascending order.
pub fn complement(dims : &[usize], n : usize) -> Vec<usize> {
    let kept : HashSet<usize> = dims.iter().copied().collect();
    (0..n).filter(|i| !kept.contains(i) ).collect()
}

/// Verifies dims can index a vector of size n and holds no repeated entries.
pub fn valid_dims(dims : &[usize], n : usize) -> Result<(), String> {
    let mut seen = HashSet::new();
    for d in dims {
        if *d >= n {
            return Err(format!("Dimension {} outside parameter space of size {}", d, n));
        }
        if !seen.insert(*d) {
            return Err(format!("Dimension {} informed more than once", d));
        }
    }
    Ok(())
}

/// Copies the informed columns of theta (in the order of dims) into a new matrix.
pub fn select_columns(theta : &DMatrix<f64>, dims : &[usize]) -> DMatrix<f64> {
    DMatrix::from_fn(theta.nrows(), dims.len(), |i, j| theta[(i, dims[j])] )
}

/// Copies the informed entries of v (in the order of dims) into a new vector.
pub fn select_entries(v : &DVector<f64>, dims : &[usize]) -> DVector<f64> {
    DVector::from_fn(dims.len(), |i, _| v[dims[i]] )
}

/// Copies the informed sub-block rows x cols of m into a new matrix.
pub fn select_block(m : &DMatrix<f64>, rows : &[usize], cols : &[usize]) -> DMatrix<f64> {
    DMatrix::from_fn(rows.len(), cols.len(), |i, j| m[(rows[i], cols[j])] )
}

/// Builds a fresh full-dimensional matrix with one row per row of reduced, holding
/// the entries of condition everywhere except at the dims columns, which receive
/// the columns of reduced. The condition is never written to.
pub fn scatter_columns(
    condition : &DVector<f64>,
    reduced : &DMatrix<f64>,
    dims : &[usize]
) -> DMatrix<f64> {
    assert!(
        reduced.ncols() == dims.len(),
        "scatter_columns: {} columns informed for {} dimensions",
        reduced.ncols(),
        dims.len()
    );
    let mut full = DMatrix::from_fn(reduced.nrows(), condition.nrows(), |_, j| condition[j] );
    for (j, d) in dims.iter().enumerate() {
        full.set_column(*d, &reduced.column(j));
    }
    full
}
