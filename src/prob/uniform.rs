use nalgebra::*;
use super::*;
use serde::{Serialize, Deserialize};
use rand::distributions::Uniform;

/// Independent uniform distributions over a box [low_i, high_i) in each dimension.
/// Used as the prior for bounded parameter spaces: its log-density is -inf outside
/// the box, which is how potentials mask regions outside the prior support.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxUniform {

    low : DVector<f64>,

    high : DVector<f64>,

    log_vol : f64

}

impl BoxUniform {

    pub fn new(low : DVector<f64>, high : DVector<f64>) -> Result<Self> {
        if low.nrows() != high.nrows() {
            return Err(Error::Shape(format!(
                "Box has {} lower bounds but {} upper bounds",
                low.nrows(),
                high.nrows()
            )));
        }
        if low.iter().zip(high.iter()).any(|(l, h)| !(l < h) ) {
            return Err(Error::Shape(String::from("Box lower bounds must be smaller than upper bounds")));
        }
        let log_vol = low.iter().zip(high.iter()).map(|(l, h)| (h - l).ln() ).sum();
        Ok(Self { low, high, log_vol })
    }

    pub fn low(&self) -> &DVector<f64> {
        &self.low
    }

    pub fn high(&self) -> &DVector<f64> {
        &self.high
    }

    pub fn dim(&self) -> usize {
        self.low.nrows()
    }

    /// Bounds arranged as a (dim x 2) matrix of lower and upper limits.
    pub fn limits(&self) -> DMatrix<f64> {
        DMatrix::from_columns(&[self.low.clone(), self.high.clone()])
    }

    fn contains(&self, theta : &DMatrix<f64>, i : usize) -> bool {
        (0..self.dim()).all(|j| theta[(i, j)] >= self.low[j] && theta[(i, j)] < self.high[j] )
    }

}

impl Prior for BoxUniform {

    fn sample<R : Rng + ?Sized>(&self, rng : &mut R, n : usize) -> DMatrix<f64> {
        let sides : Vec<Uniform<f64>> = self.low.iter().zip(self.high.iter())
            .map(|(l, h)| Uniform::new(*l, *h) )
            .collect();
        DMatrix::from_fn(n, self.dim(), |_, j| rng.sample(&sides[j]) )
    }

    fn log_prob(&self, theta : &DMatrix<f64>) -> anyhow::Result<DVector<f64>> {
        if theta.ncols() != self.dim() {
            return Err(anyhow::Error::msg(format!(
                "Sample has {} columns but prior has dimension {}",
                theta.ncols(),
                self.dim()
            )));
        }
        Ok(DVector::from_fn(theta.nrows(), |i, _| {
            if self.contains(theta, i) { -self.log_vol } else { f64::NEG_INFINITY }
        }))
    }

}

#[test]
fn box_uniform_support() {
    use rand::SeedableRng;

    let prior = BoxUniform::new(
        DVector::from_column_slice(&[0., -1.]),
        DVector::from_column_slice(&[2., 1.])
    ).unwrap();
    let mut rng = rand::rngs::StdRng::seed_from_u64(11);
    let s = prior.sample(&mut rng, 500);
    assert_eq!(s.shape(), (500, 2));
    let lp = prior.log_prob(&s).unwrap();
    assert!(lp.iter().all(|l| (*l + 4f64.ln()).abs() < 1E-12 ));
    let outside = DMatrix::from_row_slice(1, 2, &[3., 0.]);
    assert_eq!(prior.log_prob(&outside).unwrap()[0], f64::NEG_INFINITY);
    assert!(BoxUniform::new(DVector::from_element(1, 1.), DVector::from_element(1, 1.)).is_err());
}
