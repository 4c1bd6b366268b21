/// Evaluation of conditional densities over regular grids of one or two dimensions.
mod grid;

pub use grid::*;

/// Normalization, marginals and moments of densities evaluated over grids.
pub mod moments;

pub use moments::{normalize, marginals, expected_value, covariance, corrcoeff, Marginals};

/// Conditional correlation matrices.
mod corr;

pub use corr::*;
