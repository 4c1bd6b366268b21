use nalgebra::*;
use crate::prob::{Density, Prior, Potential, Error};
use super::{MixtureDensityNet, extract_mog};

/// Posterior potential of a mixture density network: the log-density of the mixture the
/// network emits at the observation x_o, restricted to the support of the prior.
/// Evaluation does not build any gradient tape, so track_gradients has no effect.
#[derive(Debug, Clone)]
pub struct MdnPotential<N, P> {

    net : N,

    prior : P,

    x_o : Option<DMatrix<f64>>

}

impl<N, P> MdnPotential<N, P>
where
    N : MixtureDensityNet,
    P : Prior
{

    pub fn new(net : N, prior : P) -> Self {
        Self { net, prior, x_o : None }
    }

    pub fn net(&self) -> &N {
        &self.net
    }

    pub fn prior(&self) -> &P {
        &self.prior
    }

}

impl<N, P> Potential for MdnPotential<N, P>
where
    N : MixtureDensityNet,
    P : Prior
{

    fn log_prob(&self, theta : &DMatrix<f64>, _track_gradients : bool) -> anyhow::Result<DVector<f64>> {
        let x_o = self.x_o.as_ref().ok_or(Error::NoObservation)?;
        if x_o.nrows() != 1 {
            return Err(Error::Shape(format!("Potential requires a single observation, but received {}", x_o.nrows())).into());
        }
        let mogs = extract_mog(&self.net, x_o)?;
        let mut lp = mogs[0].log_prob(theta)?;
        let prior_lp = self.prior.log_prob(theta)?;
        for (l, pl) in lp.iter_mut().zip(prior_lp.iter()) {
            if !pl.is_finite() {
                *l = f64::NEG_INFINITY;
            }
        }
        Ok(lp)
    }

    fn observation(&self) -> Option<&DMatrix<f64>> {
        self.x_o.as_ref()
    }

    fn set_observation(&mut self, x_o : Option<DMatrix<f64>>) {
        self.x_o = x_o;
    }

}
