use nalgebra::*;
use rand::Rng;
use crate::prob::{Prior, Error, Result};
use crate::calc;

/// Prior over the dims_to_sample entries of a full prior. Samples are drawn from the full
/// prior and projected, so they are draws from its marginal (not from the conditional
/// given the fixed entries). log_prob is the log-density of the full prior, and expects
/// full-dimensional samples.
#[derive(Debug, Clone)]
pub struct RestrictedPrior<P> {

    full_prior : P,

    dims_to_sample : Vec<usize>

}

impl<P> RestrictedPrior<P>
where
    P : Prior
{

    /// Restricts a prior over n_dims parameters to the informed dimensions.
    pub fn new(full_prior : P, n_dims : usize, dims_to_sample : Vec<usize>) -> Result<Self> {
        calc::valid_dims(&dims_to_sample, n_dims).map_err(Error::Shape)?;
        Ok(Self { full_prior, dims_to_sample })
    }

    pub fn full_prior(&self) -> &P {
        &self.full_prior
    }

    pub fn dims_to_sample(&self) -> &[usize] {
        &self.dims_to_sample[..]
    }

}

impl<P> Prior for RestrictedPrior<P>
where
    P : Prior
{

    fn sample<R : Rng + ?Sized>(&self, rng : &mut R, n : usize) -> DMatrix<f64> {
        let full_samples = self.full_prior.sample(rng, n);
        calc::select_columns(&full_samples, &self.dims_to_sample)
    }

    fn log_prob(&self, theta : &DMatrix<f64>) -> anyhow::Result<DVector<f64>> {
        self.full_prior.log_prob(theta)
    }

}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::prob::{BoxUniform, MultiNormal};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn variance(col : &[f64]) -> f64 {
        let m = col.iter().sum::<f64>() / col.len() as f64;
        col.iter().map(|x| (x - m).powi(2) ).sum::<f64>() / col.len() as f64
    }

    #[test]
    fn samples_are_projected() {
        let full = BoxUniform::new(
            DVector::from_column_slice(&[0., 10., -5.]),
            DVector::from_column_slice(&[1., 11., -4.])
        ).unwrap();
        let prior = RestrictedPrior::new(full, 3, vec![2, 1]).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let s = prior.sample(&mut rng, 500);
        assert_eq!(s.shape(), (500, 2));
        assert!(s.column(0).iter().all(|x| *x >= -5. && *x <= -4. ));
        assert!(s.column(1).iter().all(|x| *x >= 10. && *x <= 11. ));

        // log_prob is the full-dimensional density.
        let lp = prior.log_prob(&DMatrix::from_row_slice(1, 3, &[0.5, 10.5, -4.5])).unwrap();
        assert_eq!(lp[0], 0.0);
    }

    #[test]
    fn columns_follow_full_marginals() {
        let full = MultiNormal::new(
            DVector::from_column_slice(&[1., -2., 5.]),
            DMatrix::from_diagonal(&DVector::from_column_slice(&[1., 4., 0.25]))
        ).unwrap();
        let prior = RestrictedPrior::new(full, 3, vec![2, 0]).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let s = prior.sample(&mut rng, 20_000);
        assert_eq!(s.shape(), (20_000, 2));
        let c0 : Vec<f64> = s.column(0).iter().copied().collect();
        let c1 : Vec<f64> = s.column(1).iter().copied().collect();
        assert!((s.column(0).mean() - 5.).abs() < 0.03);
        assert!((variance(&c0) - 0.25).abs() < 0.02);
        assert!((s.column(1).mean() - 1.).abs() < 0.05);
        assert!((variance(&c1) - 1.).abs() < 0.06);
    }

    #[test]
    fn dims_are_validated() {
        let full = MultiNormal::new_standard(2);
        assert!(RestrictedPrior::new(full.clone(), 2, vec![0, 0]).is_err());
        assert!(RestrictedPrior::new(full.clone(), 2, vec![2]).is_err());
        assert_eq!(RestrictedPrior::new(full, 2, vec![1]).unwrap().dims_to_sample(), &[1]);
    }

}
