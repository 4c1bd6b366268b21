use nalgebra::*;
use crate::prob::{Mog, Error, Result};
use super::{MixtureDensityNet, MixtureComponents};

// Row sign flips leave U^T U unchanged, so a factor can always be taken
// with a positive diagonal.
fn with_positive_diagonal(mut u : DMatrix<f64>) -> DMatrix<f64> {
    for i in 0..u.nrows() {
        if u[(i, i)] < 0.0 {
            let neg = -u.row(i);
            u.set_row(i, &neg);
        }
    }
    u
}

/// Maps the mixture of one context from the standardized space z = theta * scale + shift
/// back to the parameter space, and normalizes its logits.
fn unstandardize(comps : MixtureComponents, shift : &DVector<f64>, scale : &DVector<f64>) -> Result<Mog> {
    let (k, p) = comps.means.shape();
    if shift.nrows() != p {
        return Err(Error::Shape(format!(
            "Standardizing transform has dimension {} but mixture has dimension {}",
            shift.nrows(),
            p
        )));
    }
    let means_transformed = DMatrix::from_fn(k, p, |i, j| (comps.means[(i, j)] - shift[j]) / scale[j] );

    // z - mu_z = diag(scale) (theta - mu_theta), thus the precision over theta is
    // diag(scale) U^T U diag(scale), with factor U diag(scale).
    let a = DMatrix::from_diagonal(scale);
    let precfs_transformed = comps.precfs.iter()
        .map(|u| with_positive_diagonal(u * &a) )
        .collect();
    Ok(Mog::new(comps.logits, means_transformed, precfs_transformed)?.normalized())
}

/// Extracts the mixture of Gaussians represented by a mixture density network at each
/// row of the context, expressed over the original (non-standardized) parameters.
///
/// For each context, the returned mixture has normalized logits (they sum to unity at
/// the probability scale), means recentered and rescaled by the network standardizer,
/// rescaled precision factors, and their recomputed log-diagonal sums. Its density equals
/// the density the network assigns to theta, including the Jacobian of the standardization.
pub fn extract_mog<N>(net : &N, context : &DMatrix<f64>) -> Result<Vec<Mog>>
where
    N : MixtureDensityNet + ?Sized
{
    let encoded_x = net.embed(context)?;
    let comps = net.mixture_components(&encoded_x)?;
    if comps.len() != context.nrows() {
        return Err(Error::Shape(format!(
            "Network returned {} mixtures for {} contexts",
            comps.len(),
            context.nrows()
        )));
    }
    let tf = net.standardizer();
    log::debug!("Extracting {} mixtures from density network", comps.len());
    comps.into_iter()
        .map(|c| unstandardize(c, &tf.shift, &tf.scale) )
        .collect()
}
