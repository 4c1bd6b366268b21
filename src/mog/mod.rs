use nalgebra::*;
use crate::prob::AffineTransform;
use anyhow;

/// Extraction of the mixture emitted by a density network, in the original parameter space.
mod extract;

pub use extract::*;

/// Exact conditioning of a mixture of Gaussians over a subset of its variables.
mod condition;

pub use condition::*;

/// Posterior potential backed by a mixture density network.
mod potential;

pub use potential::*;

/// Raw mixture parameters emitted by the mixture head of a density network for a
/// single context, in the standardized parameter space.
#[derive(Debug, Clone)]
pub struct MixtureComponents {

    /// Unnormalized log mixture weights (k).
    pub logits : DVector<f64>,

    /// Component means over rows (k x p).
    pub means : DMatrix<f64>,

    /// Upper-triangular precision factors (k matrices of size p x p).
    pub precfs : Vec<DMatrix<f64>>,

    /// Sum of the log-diagonal of each precision factor (k). Recomputed on extraction,
    /// since it changes with the standardization.
    pub sumlogdiag : DVector<f64>

}

/// A trained mixture density network estimating p(theta | x), where theta is standardized
/// by an affine layer before reaching the mixture head.
///
/// The supported architecture has exactly one global affine layer as the first element
/// of its parameter transform (the one returned by standardizer()). Networks with any other
/// composition of transforms over theta are not supported by extract_mog.
pub trait MixtureDensityNet {

    /// Encodes the context (one observation per row) into the features consumed by the
    /// mixture head.
    fn embed(&self, context : &DMatrix<f64>) -> anyhow::Result<DMatrix<f64>>;

    /// Mixture parameters for each row of the embedded context.
    fn mixture_components(&self, embedded : &DMatrix<f64>) -> anyhow::Result<Vec<MixtureComponents>>;

    /// Affine layer mapping theta into the space of the mixture head:
    /// z = theta * scale + shift.
    fn standardizer(&self) -> &AffineTransform;

}
