use nalgebra::*;
use rand::Rng;
use thiserror::Error;
use anyhow;

mod multinormal;

pub use multinormal::*;

/// Mixture of multivariate normals parametrized by precision factors.
mod mixture;

pub use mixture::*;

mod uniform;

pub use uniform::*;

/// Bijective transforms between an unbounded and a constrained parameter space.
mod transform;

pub use transform::*;

// nalgebra also exports a Transform type from its root.
pub use transform::Transform;

/// Failures of the conditional density routines. Errors produced by user-supplied
/// densities, priors and potentials travel as anyhow::Error and are wrapped into
/// the Evaluation variant.
#[derive(Debug, Error)]
pub enum Error {

    #[error("Density evaluation failed: {0}")]
    Evaluation(#[from] anyhow::Error),

    #[error("Probability grid has no mass (sum of probabilities is zero or not finite)")]
    DegenerateGrid,

    #[error("Precision block of mixture component {component} is singular")]
    Singular { component : usize },

    #[error("No observed data is available.")]
    NoObservation,

    #[error("Shape mismatch: {0}")]
    Shape(String)

}

pub type Result<T> = std::result::Result<T, Error>;

/// Any object that can evaluate a (possibly unnormalized) log-density. Samples are
/// arranged over the rows of theta, and the output holds one log-density per row.
pub trait Density {

    fn log_prob(&self, theta : &DMatrix<f64>) -> anyhow::Result<DVector<f64>>;

}

/// A prior over the full parameter space. Samples are arranged over rows.
pub trait Prior {

    /// Draws n independent samples, one per row.
    fn sample<R : Rng + ?Sized>(&self, rng : &mut R, n : usize) -> DMatrix<f64>;

    /// Log-density of each row of theta; -inf outside the prior support.
    fn log_prob(&self, theta : &DMatrix<f64>) -> anyhow::Result<DVector<f64>>;

}

/// Unnormalized posterior log-density used to drive samplers. Evaluation is
/// made with respect to an observation x_o, that must be set before any call.
pub trait Potential {

    /// Log-potential of each row of theta; -inf outside the prior support.
    fn log_prob(&self, theta : &DMatrix<f64>, track_gradients : bool) -> anyhow::Result<DVector<f64>>;

    fn observation(&self) -> Option<&DMatrix<f64>>;

    fn set_observation(&mut self, x_o : Option<DMatrix<f64>>);

}

impl<D> Density for &D
where
    D : Density + ?Sized
{

    fn log_prob(&self, theta : &DMatrix<f64>) -> anyhow::Result<DVector<f64>> {
        (**self).log_prob(theta)
    }

}
