use nalgebra::*;
use crate::prob::{Density, Potential, Error, Result};
use super::Restriction;

/// Wraps a potential over the full parameter space so that it can be evaluated over the
/// dims_to_sample entries only, with the remaining entries held at the condition. This is
/// what lets an external sampler draw from a conditional posterior.
#[derive(Debug, Clone)]
pub struct ConditionedPotential<P> {

    potential : P,

    restriction : Restriction

}

impl<P> ConditionedPotential<P>
where
    P : Potential
{

    pub fn new(potential : P, condition : DVector<f64>, dims_to_sample : Vec<usize>) -> Result<Self> {
        let restriction = Restriction::new(condition, dims_to_sample)?;
        Ok(Self { potential, restriction })
    }

    /// Log-potential of the samples over the rows of theta (with len(dims_to_sample) columns),
    /// evaluated after re-inserting them into a fresh copy of the condition.
    pub fn call(&self, theta : &DMatrix<f64>, track_gradients : bool) -> Result<DVector<f64>> {
        let theta_condition = self.restriction.reconstruct(theta)?;
        let lp = self.potential.log_prob(&theta_condition, track_gradients)?;
        if lp.nrows() != theta.nrows() {
            return Err(Error::Shape(format!(
                "Potential returned {} values for {} samples",
                lp.nrows(),
                theta.nrows()
            )));
        }
        Ok(lp)
    }

    /// Sets the observation of the wrapped potential. Only a single observation is
    /// supported (iid batches of observations are rejected).
    pub fn set_x(&mut self, x_o : Option<DMatrix<f64>>) -> Result<()> {
        if let Some(x) = &x_o {
            if x.nrows() != 1 {
                return Err(Error::Shape(format!(
                    "Conditioned potential accepts a single observation, but received {}",
                    x.nrows()
                )));
            }
        }
        self.potential.set_observation(x_o);
        Ok(())
    }

    pub fn x_o(&self) -> Result<&DMatrix<f64>> {
        self.potential.observation().ok_or(Error::NoObservation)
    }

    /// Same as x_o, but returns None when no observation is set.
    pub fn return_x_o(&self) -> Option<&DMatrix<f64>> {
        self.potential.observation()
    }

    pub fn restriction(&self) -> &Restriction {
        &self.restriction
    }

    pub fn potential(&self) -> &P {
        &self.potential
    }

}

impl<P> Density for ConditionedPotential<P>
where
    P : Potential
{

    fn log_prob(&self, theta : &DMatrix<f64>) -> anyhow::Result<DVector<f64>> {
        Ok(self.call(theta, false)?)
    }

}
