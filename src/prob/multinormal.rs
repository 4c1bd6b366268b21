use nalgebra::*;
use super::*;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;
use std::fmt::{self, Display};
use std::ops::SubAssign;
use rand_distr::StandardNormal;
use anyhow;
use crate::calc;

/// Multivariate normal parametrized by μ (px1) and Σ (pxp). While the public API always
/// work by receiving covariance matrices, this structure holds both the covariance and
/// the precision (inverse covariance) matrices internally, as well as the lower Cholesky
/// factor of the covariance used for sampling. Re-building the distribution is potentially
/// a costly operation, since a Cholesky decomposition and inversion are performed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiNormal {

    mu : DVector<f64>,

    sigma : DMatrix<f64>,

    sigma_inv : DMatrix<f64>,

    sigma_low : DMatrix<f64>,

    /// -0.5 * ln|2π Σ|
    log_part : f64

}

impl MultiNormal {

    /// Builds a new multivariate distribution from a mu vector and positive-definite
    /// covariance matrix sigma.
    pub fn new(mu : DVector<f64>, sigma : DMatrix<f64>) -> anyhow::Result<Self> {
        if mu.nrows() != sigma.nrows() || mu.nrows() != sigma.ncols() {
            return Err(anyhow::Error::msg("Mismatch between mean vector and sigma covariance sizes"));
        }
        if !is_symmetric(&sigma) {
            return Err(anyhow::Error::msg("Informed matrix is not symmetric"));
        }
        let chol = Cholesky::new(sigma.clone())
            .ok_or(anyhow::Error::msg("Informed matrix is not positive-definite"))?;
        let sigma_low = chol.l();
        let sigma_inv = chol.inverse();
        let log_det = 2. * sigma_low.diagonal().iter().map(|d| d.ln() ).sum::<f64>();
        let log_part = -0.5 * (mu.nrows() as f64 * (2. * PI).ln() + log_det);
        Ok(Self { mu, sigma, sigma_inv, sigma_low, log_part })
    }

    /// Creates a centered multinormal with identity covariance of size p.
    pub fn new_standard(p : usize) -> Self {
        let mu = DVector::zeros(p);
        let sigma = DMatrix::identity(p, p);
        Self {
            mu,
            sigma : sigma.clone(),
            sigma_inv : sigma.clone(),
            sigma_low : sigma,
            log_part : -0.5 * p as f64 * (2. * PI).ln()
        }
    }

    /// Builds the distribution from its mean and an upper-triangular precision
    /// factor U such that Σ^-1 = U^T U.
    pub fn from_precision_factor(mu : DVector<f64>, precf : &DMatrix<f64>) -> anyhow::Result<Self> {
        let prec = precf.transpose() * precf;
        let sigma = Cholesky::new(prec)
            .ok_or(anyhow::Error::msg("Precision factor is singular"))?
            .inverse();
        Self::new(mu, build_symmetric(sigma))
    }

    /// Rescales a covariance matrix by the inverse of the standard deviations, yielding
    /// the correlation matrix.
    pub fn corr_from(mut cov : DMatrix<f64>) -> DMatrix<f64> {
        assert!(cov.nrows() == cov.ncols());
        let mut diag_m = DMatrix::zeros(cov.nrows(), cov.ncols());
        let diag = cov.diagonal().map(|d| 1. / d.sqrt() );
        diag_m.set_diagonal(&diag);
        cov *= &diag_m;
        diag_m *= cov;
        diag_m
    }

    pub fn mean(&self) -> &DVector<f64> {
        &self.mu
    }

    pub fn cov(&self) -> &DMatrix<f64> {
        &self.sigma
    }

    pub fn prec(&self) -> &DMatrix<f64> {
        &self.sigma_inv
    }

    pub fn dim(&self) -> usize {
        self.mu.nrows()
    }

    /// Upper-triangular factor U of the precision matrix, such that Σ^-1 = U^T U.
    pub fn precision_factor(&self) -> anyhow::Result<DMatrix<f64>> {
        Cholesky::new(build_symmetric(self.sigma_inv.clone()))
            .map(|chol| chol.l().transpose() )
            .ok_or(anyhow::Error::msg("Precision matrix lost positive-definiteness"))
    }

    /// Returns the reduced multivariate normal over the entries at dims, by conditioning
    /// over the remaining entries held at the corresponding positions of value (a
    /// full-sized vector; its entries at dims are ignored). Conditioning is done on
    /// the covariance scale:
    /// μ_x + Σ_xy Σ_yy^-1 (y - μ_y); Σ_xx - Σ_xy Σ_yy^-1 Σ_yx
    pub fn conditional(&self, dims : &[usize], value : &DVector<f64>) -> anyhow::Result<MultiNormal> {
        calc::valid_dims(dims, self.dim()).map_err(anyhow::Error::msg)?;
        if value.nrows() != self.dim() {
            return Err(anyhow::Error::msg("Conditioning value does not match distribution dimension"));
        }
        let fixed = calc::complement(dims, self.dim());
        let marg_mu = calc::select_entries(&self.mu, dims);
        if fixed.is_empty() {
            return Self::new(marg_mu, calc::select_block(&self.sigma, dims, dims));
        }
        let fix_mu = calc::select_entries(&self.mu, &fixed);
        let marg_sigma = calc::select_block(&self.sigma, dims, dims);
        let upper_cross_cov = calc::select_block(&self.sigma, dims, &fixed);
        let lower_cross_cov = calc::select_block(&self.sigma, &fixed, dims);
        let partial_sigma_inv = Cholesky::new(calc::select_block(&self.sigma, &fixed, &fixed))
            .ok_or(anyhow::Error::msg("Fixed covariance block is not positive-definite"))?
            .inverse();

        let mut y = calc::select_entries(value, &fixed);
        y.sub_assign(&fix_mu);
        let cond_mu = marg_mu + &upper_cross_cov * &partial_sigma_inv * y;

        let mut cond_sigma = marg_sigma;
        cond_sigma.sub_assign(&(upper_cross_cov * partial_sigma_inv * lower_cross_cov));
        Self::new(cond_mu, build_symmetric(cond_sigma))
    }

    /// Writes independent draws into the rows of dst.
    pub fn sample_into<R : Rng + ?Sized>(&self, rng : &mut R, mut dst : DMatrixSliceMut<'_, f64>) {
        assert!(
            dst.ncols() == self.mu.nrows(),
            "sample_into: destination has {} columns but distribution has dimension {}",
            dst.ncols(),
            self.mu.nrows()
        );
        let mut z = DVector::<f64>::zeros(self.mu.nrows());
        for mut row in dst.row_iter_mut() {
            z.iter_mut().for_each(|zi| *zi = rng.sample(StandardNormal) );

            // Scale samples by lower Cholesky factor of covariance matrix (matrix square root)
            // then offset by mu.
            let x = &self.sigma_low * &z + &self.mu;
            row.copy_from(&x.transpose());
        }
    }

}

impl Density for MultiNormal {

    fn log_prob(&self, theta : &DMatrix<f64>) -> anyhow::Result<DVector<f64>> {
        if theta.ncols() != self.mu.nrows() {
            return Err(anyhow::Error::msg(format!(
                "Sample has {} columns but distribution has dimension {}",
                theta.ncols(),
                self.mu.nrows()
            )));
        }
        Ok(DVector::from_fn(theta.nrows(), |i, _| {
            let dev = theta.row(i).transpose() - &self.mu;
            self.log_part - 0.5 * dev.dot(&(&self.sigma_inv * &dev))
        }))
    }

}

impl Prior for MultiNormal {

    fn sample<R : Rng + ?Sized>(&self, rng : &mut R, n : usize) -> DMatrix<f64> {
        let mut dst = DMatrix::zeros(n, self.mu.nrows());
        self.sample_into(rng, dst.slice_mut((0, 0), (n, self.mu.nrows())));
        dst
    }

    fn log_prob(&self, theta : &DMatrix<f64>) -> anyhow::Result<DVector<f64>> {
        Density::log_prob(self, theta)
    }

}

impl Display for MultiNormal {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MNorm({})", self.mu.nrows())
    }

}

const EPS : f64 = 1E-8;

/// Verifies if the informed matrix is square and symmetric up to a small tolerance.
pub fn is_symmetric(m : &DMatrix<f64>) -> bool {
    m.nrows() == m.ncols() && (m - m.transpose()).amax() < EPS * (1. + m.amax())
}

/// Builds a symmetric matrix from M as (1/2)*(M + M^T)
pub fn build_symmetric(m : DMatrix<f64>) -> DMatrix<f64> {
    assert!(m.nrows() == m.ncols(), "build_symmetric: Informed non-square matrix");
    let mt = m.transpose();
    (m + mt).scale(0.5)
}
