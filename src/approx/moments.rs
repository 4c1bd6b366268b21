use nalgebra::*;
use crate::prob::{Error, Result};
use crate::calc;
use super::ProbGrid;

/// Normalized marginal vectors of a probability grid. A Line grid is its own
/// (single) marginal; a Plane has one marginal for each axis.
#[derive(Debug, Clone, PartialEq)]
pub enum Marginals {
    Single(DVector<f64>),
    Pair(DVector<f64>, DVector<f64>)
}

/// Function of a single grid coordinate: f(x) = x.
pub fn identity(coords : &[f64]) -> f64 {
    coords[0]
}

/// Function of a single grid coordinate: f(x) = x^2. Used to compute variances.
pub fn square(coords : &[f64]) -> f64 {
    coords[0] * coords[0]
}

/// Product of all grid coordinates: f(x, y) = x * y. Used to compute covariances.
pub fn product(coords : &[f64]) -> f64 {
    coords.iter().product()
}

fn check_limits(probs : &ProbGrid, limits : &DMatrix<f64>) -> Result<()> {
    if limits.ncols() != 2 || limits.nrows() != probs.n_axes() {
        return Err(Error::Shape(format!(
            "Grid with {} axes requires limits of shape ({}, 2), but received {:?}",
            probs.n_axes(),
            probs.n_axes(),
            limits.shape()
        )));
    }
    Ok(())
}

/// Product of the spans (upper - lower) of all rows of limits.
fn volume(limits : &DMatrix<f64>) -> f64 {
    limits.row_iter().map(|r| r[1] - r[0] ).product()
}

fn axis_limits(limits : &DMatrix<f64>, axis : usize) -> DMatrix<f64> {
    DMatrix::from_row_slice(1, 2, &[limits[(axis, 0)], limits[(axis, 1)]])
}

fn normalize_line(v : &DVector<f64>, lower : f64, upper : f64) -> Result<DVector<f64>> {
    let sum = v.sum();
    if sum == 0.0 || !sum.is_finite() {
        return Err(Error::DegenerateGrid);
    }
    Ok(v * (v.nrows() as f64 / (upper - lower) / sum))
}

fn plane_marginals(m : &DMatrix<f64>, limits : &DMatrix<f64>) -> Result<(DVector<f64>, DVector<f64>)> {
    let marginal_x = DVector::from_fn(m.nrows(), |i, _| m.row(i).sum() );
    let marginal_y = DVector::from_fn(m.ncols(), |j, _| m.column(j).sum() );
    Ok((
        normalize_line(&marginal_x, limits[(0, 0)], limits[(0, 1)])?,
        normalize_line(&marginal_y, limits[(1, 0)], limits[(1, 1)])?
    ))
}

/// Given a vector or matrix of probabilities, returns them rescaled so that their
/// integral over the grid within limits equals one:
/// probs * count / (volume * sum(probs)).
/// A grid without mass cannot be normalized and yields Error::DegenerateGrid; the
/// caller must supply a condition and limits where the density has non-negligible mass.
pub fn normalize(probs : &ProbGrid, limits : &DMatrix<f64>) -> Result<ProbGrid> {
    check_limits(probs, limits)?;
    let sum = probs.sum();
    if sum == 0.0 || !sum.is_finite() {
        return Err(Error::DegenerateGrid);
    }
    let factor = probs.count() as f64 / volume(limits) / sum;
    Ok(probs.map(|p| p * factor ))
}

/// Given a matrix of probabilities, returns the normalized marginal vectors (the first
/// is over the row axis; the second over the column axis). A vector of probabilities is
/// just normalized.
pub fn marginals(probs : &ProbGrid, limits : &DMatrix<f64>) -> Result<Marginals> {
    check_limits(probs, limits)?;
    match probs {
        ProbGrid::Plane(m) => {
            let (marginal_x, marginal_y) = plane_marginals(m, limits)?;
            Ok(Marginals::Pair(marginal_x, marginal_y))
        },
        ProbGrid::Line(v) => {
            Ok(Marginals::Single(normalize_line(v, limits[(0, 0)], limits[(0, 1)])?))
        }
    }
}

/// Returns the expected value of a function of the grid coordinates, E[f(X_1, .. X_k)],
/// from evaluations of a (normalized) density over the grid. The coordinates of axis k are
/// evenly spaced over row k of limits, and f receives the coordinates of one grid cell.
/// The integral is approximated by the Riemann sum sum(f(grid) * probs) * volume / count.
pub fn expected_value<F>(probs : &ProbGrid, limits : &DMatrix<f64>, f : F) -> Result<f64>
where
    F : Fn(&[f64]) -> f64
{
    check_limits(probs, limits)?;
    let axes : Vec<DVector<f64>> = (0..probs.n_axes())
        .map(|k| calc::linspace(limits[(k, 0)], limits[(k, 1)], probs.axis_len(k)) )
        .collect();
    let total = match probs {
        ProbGrid::Line(v) => {
            v.iter().enumerate().map(|(i, p)| f(&[axes[0][i]][..]) * p ).sum::<f64>()
        },
        ProbGrid::Plane(m) => {
            let mut total = 0.0;
            for j in 0..m.ncols() {
                for i in 0..m.nrows() {
                    total += f(&[axes[0][i], axes[1][j]][..]) * m[(i, j)];
                }
            }
            total
        }
    };
    Ok(total * volume(limits) / probs.count() as f64)
}

/// Returns the covariance between the grid variables from evaluations of their density,
/// Cov(X,Y) = E[X*Y] - E[X] * E[Y] for f = product. For a general f, this is
/// E[f(X,Y)] - f(E[X], E[Y]), where each expectation on the right is taken with respect to
/// the normalized marginal of the respective axis. For a Line grid and f = square, this is
/// the variance Var(X) = E[X^2] - E[X]^2.
pub fn covariance<F>(probs : &ProbGrid, limits : &DMatrix<f64>, f : F) -> Result<f64>
where
    F : Fn(&[f64]) -> f64
{
    let expected_value_of_joint = expected_value(probs, limits, &f)?;
    let expected_values_of_marginals = match marginals(probs, limits)? {
        Marginals::Single(x) => {
            vec![expected_value(&ProbGrid::Line(x), limits, identity)?]
        },
        Marginals::Pair(x, y) => {
            vec![
                expected_value(&ProbGrid::Line(x), &axis_limits(limits, 0), identity)?,
                expected_value(&ProbGrid::Line(y), &axis_limits(limits, 1), identity)?
            ]
        }
    };
    Ok(expected_value_of_joint - f(&expected_values_of_marginals[..]))
}

/// Given a matrix of (unnormalized) evaluations of a 2D density within limits, returns
/// the Pearson correlation coefficient between the two grid variables.
pub fn corrcoeff(probs : &ProbGrid, limits : &DMatrix<f64>) -> Result<f64> {
    check_limits(probs, limits)?;
    let normalized_probs = match normalize(probs, limits)? {
        ProbGrid::Plane(m) => m,
        ProbGrid::Line(_) => {
            return Err(Error::Shape(String::from("Correlation requires a two-dimensional grid")));
        }
    };
    let (marginal_x, marginal_y) = plane_marginals(&normalized_probs, limits)?;
    let covariance_xy = covariance(&ProbGrid::Plane(normalized_probs), limits, product)?;
    let variance_x = covariance(&ProbGrid::Line(marginal_x), &axis_limits(limits, 0), square)?;
    let variance_y = covariance(&ProbGrid::Line(marginal_y), &axis_limits(limits, 1), square)?;
    Ok(covariance_xy / (variance_x * variance_y).sqrt())
}
