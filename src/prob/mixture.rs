use nalgebra::*;
use super::*;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;
use rand::distributions::WeightedIndex;
use rand_distr::StandardNormal;
use crate::calc;

/// A mixture of k multivariate normals over a p-dimensional space. Each component
/// is parametrized by its mean and by an upper-triangular precision factor U (Σ^-1 = U^T U),
/// which guarantees the implied precision is positive-definite. The mixture weights
/// are held as logits (log-weights), which sum to unity on the probability scale
/// once normalized.
///
/// This is the representation emitted by mixture density networks, and the one
/// in which conditioning over a subset of the variables can be performed
/// exactly (see mog::condition_mog).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mog {

    /// Log mixture weights (k).
    logits : DVector<f64>,

    /// Component means, arranged over rows (k x p).
    means : DMatrix<f64>,

    /// Component precision factors (k matrices of size p x p).
    precfs : Vec<DMatrix<f64>>,

    /// Sum of the log of the diagonal of each precision factor (k), which equals
    /// 0.5 * ln|Σ^-1| for triangular factors.
    sumlogdiag : DVector<f64>

}

impl Mog {

    /// Builds a mixture from its log-weights, means (components over rows) and precision
    /// factors. The logits are kept as informed; call normalized() to have them sum to
    /// unity on the probability scale.
    pub fn new(logits : DVector<f64>, means : DMatrix<f64>, precfs : Vec<DMatrix<f64>>) -> Result<Self> {
        let k = logits.nrows();
        if means.nrows() != k || precfs.len() != k {
            return Err(Error::Shape(format!(
                "Mixture with {} logits received {} means and {} precision factors",
                k,
                means.nrows(),
                precfs.len()
            )));
        }
        let p = means.ncols();
        for (i, precf) in precfs.iter().enumerate() {
            if precf.nrows() != p || precf.ncols() != p {
                return Err(Error::Shape(format!(
                    "Precision factor {} has shape {:?} but mixture dimension is {}",
                    i,
                    precf.shape(),
                    p
                )));
            }
            if precf.diagonal().iter().any(|d| !(*d > 0.0) ) {
                return Err(Error::Singular { component : i });
            }
        }
        let sumlogdiag = DVector::from_iterator(k, precfs.iter().map(|u| sumlogdiag(u) ));
        Ok(Self { logits, means, precfs, sumlogdiag })
    }

    /// Shifts the logits by their log-sum-exp, so that the weights sum to one.
    pub fn normalized(mut self) -> Self {
        let lse = calc::logsumexp(self.logits.iter().copied());
        self.logits.add_scalar_mut(-lse);
        self
    }

    pub fn logits(&self) -> &DVector<f64> {
        &self.logits
    }

    pub fn means(&self) -> &DMatrix<f64> {
        &self.means
    }

    pub fn precfs(&self) -> &[DMatrix<f64>] {
        &self.precfs[..]
    }

    pub fn sumlogdiag(&self) -> &DVector<f64> {
        &self.sumlogdiag
    }

    pub fn n_mixtures(&self) -> usize {
        self.logits.nrows()
    }

    pub fn dim(&self) -> usize {
        self.means.ncols()
    }

    /// Mixture weights on the probability scale.
    pub fn weights(&self) -> DVector<f64> {
        let lse = calc::logsumexp(self.logits.iter().copied());
        self.logits.map(|l| (l - lse).exp() )
    }

    /// Mean vector of the k-th component.
    pub fn mean(&self, k : usize) -> DVector<f64> {
        self.means.row(k).transpose()
    }

    /// Returns the k-th component as a standalone multivariate normal.
    pub fn component(&self, k : usize) -> anyhow::Result<MultiNormal> {
        MultiNormal::from_precision_factor(self.mean(k), &self.precfs[k])
    }

    /// Draws n samples from the mixture (one per row), by first drawing a component
    /// from the categorical defined by the weights and then drawing from the component
    /// as μ + U^-1 z, with z standard normal.
    pub fn sample<R : Rng + ?Sized>(&self, rng : &mut R, n : usize) -> Result<DMatrix<f64>> {
        let cat = WeightedIndex::new(self.weights().iter().copied())
            .map_err(|e| Error::Shape(format!("Invalid mixture weights: {}", e)))?;
        let p = self.dim();
        let mut dst = DMatrix::zeros(n, p);
        let mut z = DVector::<f64>::zeros(p);
        for i in 0..n {
            let k = rng.sample(&cat);
            z.iter_mut().for_each(|zi| *zi = rng.sample(StandardNormal) );
            let dev = self.precfs[k].solve_upper_triangular(&z)
                .ok_or(Error::Singular { component : k })?;
            let x = self.mean(k) + dev;
            dst.row_mut(i).copy_from(&x.transpose());
        }
        Ok(dst)
    }

}

impl Density for Mog {

    fn log_prob(&self, theta : &DMatrix<f64>) -> anyhow::Result<DVector<f64>> {
        if theta.ncols() != self.dim() {
            return Err(anyhow::Error::msg(format!(
                "Sample has {} columns but mixture has dimension {}",
                theta.ncols(),
                self.dim()
            )));
        }
        Ok(log_prob_mog(theta, &self.logits, &self.means, &self.precfs, &self.sumlogdiag))
    }

}

/// Sum of the log-diagonal of a (triangular) precision factor.
pub fn sumlogdiag(precf : &DMatrix<f64>) -> f64 {
    precf.diagonal().iter().map(|d| d.ln() ).sum()
}

/// Log-density of x under N(mu, (U^T U)^-1), where U is the precision factor:
/// -p/2 ln(2π) + Σ ln(diag U) - 0.5 |U (x - mu)|^2
pub fn log_prob_gaussian(
    x : &DVector<f64>,
    mu : &DVector<f64>,
    precf : &DMatrix<f64>,
    sumlogdiag : f64
) -> f64 {
    let dev = precf * (x - mu);
    -0.5 * x.nrows() as f64 * (2. * PI).ln() + sumlogdiag - 0.5 * dev.norm_squared()
}

/// Log-density of each row of theta under the mixture defined by the (not necessarily
/// normalized) logits, component means (over rows) and precision factors. This is the
/// log-sum-exp over components of logit + component log-density, minus the log-sum-exp
/// of the logits.
pub fn log_prob_mog(
    theta : &DMatrix<f64>,
    logits : &DVector<f64>,
    means : &DMatrix<f64>,
    precfs : &[DMatrix<f64>],
    sumlogdiag : &DVector<f64>
) -> DVector<f64> {
    let norm = calc::logsumexp(logits.iter().copied());
    let mus : Vec<DVector<f64>> = means.row_iter().map(|r| r.transpose() ).collect();
    DVector::from_fn(theta.nrows(), |i, _| {
        let x = theta.row(i).transpose();
        let comps : Vec<f64> = (0..logits.nrows())
            .map(|k| logits[k] + log_prob_gaussian(&x, &mus[k], &precfs[k], sumlogdiag[k]) )
            .collect();
        calc::logsumexp(comps.iter().copied()) - norm
    })
}
