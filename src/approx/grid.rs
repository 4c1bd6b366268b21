use nalgebra::*;
use serde::{Serialize, Deserialize};
use crate::prob::{Density, Error, Result};
use crate::calc;

/// Settings of the regular grid over which conditional densities are evaluated.
/// Settings can be built by chaining the setters over the default value, or
/// read from a JSON object whose missing fields take the defaults:
///
/// ```
/// use bayes_cond::approx::GridSettings;
/// let s = GridSettings::from_json(r#"{ "resolution" : 20 }"#).unwrap();
/// assert_eq!(s, GridSettings::default().resolution(20));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {

    /// Number of grid points along each evaluated dimension.
    pub resolution : usize,

    /// The first dimension is evaluated from lower + eps_margins1 up to upper - eps_margins1,
    /// which avoids evaluations exactly at the prior bounds.
    pub eps_margins1 : f64,

    /// Same as eps_margins1, for the second dimension.
    pub eps_margins2 : f64,

    /// If true, the grid holds the log-probabilities as returned by the density. Otherwise,
    /// it holds exp(log_prob - max log_prob).
    pub return_raw_log_prob : bool

}

impl Default for GridSettings {

    fn default() -> Self {
        Self {
            resolution : 50,
            eps_margins1 : 1E-32,
            eps_margins2 : 1E-32,
            return_raw_log_prob : false
        }
    }

}

impl GridSettings {

    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolution(mut self, resolution : usize) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn margins(mut self, eps_margins1 : f64, eps_margins2 : f64) -> Self {
        self.eps_margins1 = eps_margins1;
        self.eps_margins2 = eps_margins2;
        self
    }

    pub fn raw_log_prob(mut self, raw : bool) -> Self {
        self.return_raw_log_prob = raw;
        self
    }

    pub fn from_json(src : &str) -> Result<Self> {
        serde_json::from_str(src)
            .map_err(|e| Error::Shape(format!("Invalid grid settings: {}", e)))
    }

}

/// Density evaluations over a regular grid. The dimensionality is explicit: a Line
/// holds evaluations along a single dimension; a Plane holds evaluations over two
/// dimensions, where entry (i, j) is the i-th point of the first dimension and
/// the j-th point of the second dimension.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbGrid {
    Line(DVector<f64>),
    Plane(DMatrix<f64>)
}

impl ProbGrid {

    /// Number of grid axes (1 or 2).
    pub fn n_axes(&self) -> usize {
        match self {
            ProbGrid::Line(_) => 1,
            ProbGrid::Plane(_) => 2
        }
    }

    /// Number of points along the informed axis.
    pub fn axis_len(&self, axis : usize) -> usize {
        match (self, axis) {
            (ProbGrid::Line(v), 0) => v.nrows(),
            (ProbGrid::Plane(m), 0) => m.nrows(),
            (ProbGrid::Plane(m), 1) => m.ncols(),
            _ => 0
        }
    }

    /// Total number of grid cells.
    pub fn count(&self) -> usize {
        self.values().len()
    }

    pub fn sum(&self) -> f64 {
        self.values().iter().sum()
    }

    pub fn max(&self) -> f64 {
        self.values().iter().fold(f64::NEG_INFINITY, |m, v| m.max(*v) )
    }

    /// Grid entries in column-major order (the first axis varies fastest).
    pub fn values(&self) -> &[f64] {
        match self {
            ProbGrid::Line(v) => v.as_slice(),
            ProbGrid::Plane(m) => m.as_slice()
        }
    }

    pub fn map<F>(&self, f : F) -> ProbGrid
    where
        F : Fn(f64) -> f64
    {
        match self {
            ProbGrid::Line(v) => ProbGrid::Line(v.map(f)),
            ProbGrid::Plane(m) => ProbGrid::Plane(m.map(f))
        }
    }

    pub fn as_line(&self) -> Option<&DVector<f64>> {
        match self {
            ProbGrid::Line(v) => Some(v),
            _ => None
        }
    }

    pub fn as_plane(&self) -> Option<&DMatrix<f64>> {
        match self {
            ProbGrid::Plane(m) => Some(m),
            _ => None
        }
    }

}

fn check_grid_args(
    condition : &DVector<f64>,
    limits : &DMatrix<f64>,
    dim1 : usize,
    dim2 : usize,
    resolution : usize
) -> Result<()> {
    if limits.ncols() != 2 {
        return Err(Error::Shape(format!("Limits should have 2 columns, but have {}", limits.ncols())));
    }
    if condition.nrows() != limits.nrows() {
        return Err(Error::Shape(format!(
            "Condition has {} entries but limits cover {} dimensions",
            condition.nrows(),
            limits.nrows()
        )));
    }
    if dim1 >= limits.nrows() || dim2 >= limits.nrows() {
        return Err(Error::Shape(format!(
            "Dimensions ({}, {}) outside parameter space of size {}",
            dim1,
            dim2,
            limits.nrows()
        )));
    }
    if resolution == 0 {
        return Err(Error::Shape(String::from("Grid resolution should be at least 1")));
    }
    Ok(())
}

/// Returns the unnormalized conditional along dim1, dim2 given the parameter vector
/// condition, by evaluating the joint density p(x1, x2 | rest) ∝ p(x1, x2, rest) over an
/// evenly spaced grid within the limits (a dim_theta x 2 matrix of lower and upper
/// bounds). The entries of condition at dim1 and dim2 are ignored.
///
/// If dim1 == dim2, the result is a Line with settings.resolution entries; otherwise it
/// is a resolution x resolution Plane (dim1 over rows, dim2 over columns). All grid points
/// are evaluated with a single call to density.log_prob, with dim1 varying fastest.
pub fn eval_conditional_density<D>(
    density : &D,
    condition : &DVector<f64>,
    limits : &DMatrix<f64>,
    dim1 : usize,
    dim2 : usize,
    settings : &GridSettings
) -> Result<ProbGrid>
where
    D : Density + ?Sized
{
    let res = settings.resolution;
    check_grid_args(condition, limits, dim1, dim2, res)?;
    let grid_dim1 = calc::linspace(
        limits[(dim1, 0)] + settings.eps_margins1,
        limits[(dim1, 1)] - settings.eps_margins1,
        res
    );
    let grid_dim2 = calc::linspace(
        limits[(dim2, 0)] + settings.eps_margins2,
        limits[(dim2, 1)] - settings.eps_margins2,
        res
    );

    let n_evals = if dim1 == dim2 { res } else { res * res };
    log::debug!("Evaluating conditional over dims ({}, {}): {} grid points", dim1, dim2, n_evals);

    let repeated_condition = if dim1 == dim2 {
        DMatrix::from_fn(res, condition.nrows(), |r, c| {
            if c == dim1 { grid_dim1[r] } else { condition[c] }
        })
    } else {
        DMatrix::from_fn(res * res, condition.nrows(), |r, c| {
            if c == dim1 {
                grid_dim1[r % res]
            } else if c == dim2 {
                grid_dim2[r / res]
            } else {
                condition[c]
            }
        })
    };

    let log_probs = density.log_prob(&repeated_condition)?;
    if log_probs.nrows() != n_evals {
        return Err(Error::Shape(format!(
            "Density returned {} log-probabilities for {} grid points",
            log_probs.nrows(),
            n_evals
        )));
    }

    let log_probs_on_grid = if dim1 == dim2 {
        ProbGrid::Line(log_probs)
    } else {
        ProbGrid::Plane(DMatrix::from_column_slice(res, res, log_probs.as_slice()))
    };

    if settings.return_raw_log_prob {
        Ok(log_probs_on_grid)
    } else {
        // Subtract maximum for numerical stability
        let max = log_probs_on_grid.max();
        Ok(log_probs_on_grid.map(|lp| (lp - max).exp() ))
    }
}
