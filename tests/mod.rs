use nalgebra::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use approx::assert_relative_eq;
use bayes_cond::prob::*;
use bayes_cond::approx::*;
use bayes_cond::mog::*;
use bayes_cond::restrict::*;
use bayes_cond::prob::Transform;
use bayes_cond::approx::normalize;

fn box_limits(dim : usize, lower : f64, upper : f64) -> DMatrix<f64> {
    DMatrix::from_fn(dim, 2, |_, j| if j == 0 { lower } else { upper } )
}

fn bivariate(rho : f64) -> MultiNormal {
    MultiNormal::new(
        DVector::zeros(2),
        DMatrix::from_row_slice(2, 2, &[1., rho, rho, 1.])
    ).unwrap()
}

/// Three-dimensional mixture with two correlated components.
fn trimodal() -> Mog {
    let a = MultiNormal::new(
        DVector::from_column_slice(&[-1., 0., 0.5]),
        DMatrix::from_row_slice(3, 3, &[1.0, 0.4, 0.2, 0.4, 0.8, -0.1, 0.2, -0.1, 0.6])
    ).unwrap();
    let b = MultiNormal::new(
        DVector::from_column_slice(&[1.5, -0.5, 0.]),
        DMatrix::from_row_slice(3, 3, &[0.7, -0.3, 0.1, -0.3, 1.2, 0.2, 0.1, 0.2, 0.9])
    ).unwrap();
    Mog::new(
        DVector::from_column_slice(&[0.35f64.ln(), 0.65f64.ln()]),
        DMatrix::from_row_slice(2, 3, &[-1., 0., 0.5, 1.5, -0.5, 0.]),
        vec![a.precision_factor().unwrap(), b.precision_factor().unwrap()]
    ).unwrap()
}

/// Mixture network over a two-dimensional parameter whose first component mean follows the
/// observation. Parameters reach the mixture head standardized.
struct LinearMdn {
    tf : AffineTransform
}

impl LinearMdn {

    fn new() -> Self {
        let tf = AffineTransform::standardizing(
            &DVector::from_column_slice(&[0.5, 2.]),
            &DVector::from_column_slice(&[0.5, 3.])
        ).unwrap();
        Self { tf }
    }

}

impl MixtureDensityNet for LinearMdn {

    fn embed(&self, context : &DMatrix<f64>) -> anyhow::Result<DMatrix<f64>> {
        Ok(context.map(|x| 0.5 * x ))
    }

    fn mixture_components(&self, embedded : &DMatrix<f64>) -> anyhow::Result<Vec<MixtureComponents>> {
        Ok(embedded.row_iter().map(|e| {
            MixtureComponents {
                logits : DVector::from_column_slice(&[0.2, -0.4]),
                means : DMatrix::from_row_slice(2, 2, &[e[0], e[1], -0.5, 0.5]),
                precfs : vec![
                    DMatrix::from_row_slice(2, 2, &[1.2, -0.5, 0., 0.9]),
                    DMatrix::from_row_slice(2, 2, &[2.0, 0.3, 0., 1.4])
                ],
                sumlogdiag : DVector::zeros(2)
            }
        }).collect())
    }

    fn standardizer(&self) -> &AffineTransform {
        &self.tf
    }

}

#[test]
fn bivariate_gaussian_correlation() {
    let limits = box_limits(2, -5., 5.);
    let cond = DMatrix::zeros(1, 2);
    let mn = bivariate(0.5);
    let corr = conditional_corrcoeff(&mn, &limits, &cond, None, 200).unwrap();
    let expected = MultiNormal::corr_from(mn.cov().clone());
    assert!((corr[(0, 1)] - expected[(0, 1)]).abs() < 0.02);
    assert_eq!(corr[(0, 0)], 1.0);
    assert_eq!(corr[(1, 1)], 1.0);
}

#[test]
fn correlation_matrix_over_batch() {
    let mog = trimodal();
    let limits = box_limits(3, -6., 6.);
    let cond = DMatrix::from_row_slice(3, 3, &[
        0., 0., 0.,
        1., -1., 0.5,
        -0.5, 0.3, 1.
    ]);
    let corr = conditional_corrcoeff(&mog, &limits, &cond, None, 60).unwrap();
    assert_eq!(corr.shape(), (3, 3));
    for i in 0..3 {
        assert_eq!(corr[(i, i)], 1.0);
        for j in 0..3 {
            assert_eq!(corr[(i, j)], corr[(j, i)]);
            assert!(corr[(i, j)] >= -1. && corr[(i, j)] <= 1.);
        }
    }

    // The average over the batch equals the average of single-condition matrices.
    let single : Vec<DMatrix<f64>> = (0..cond.nrows())
        .map(|i| conditional_corrcoeff(&mog, &limits, &cond.rows(i, 1).into_owned(), None, 60).unwrap() )
        .collect();
    let mean = single.iter().fold(DMatrix::zeros(3, 3), |acc, c| acc + c ) / 3.;
    assert_relative_eq!(corr, mean, epsilon = 1E-9);
}

#[test]
fn grid_peaks_at_one() {
    let mog = trimodal();
    let limits = box_limits(3, -4., 4.);
    let cond = DVector::from_column_slice(&[0.2, 0.1, -0.3]);
    for (dim1, dim2) in &[(0, 0), (0, 2), (2, 1)] {
        let grid = eval_conditional_density(&mog, &cond, &limits, *dim1, *dim2, &GridSettings::default()).unwrap();
        assert_eq!(grid.max(), 1.0);
        let normed = normalize(&grid, &calc_limits(&limits, *dim1, *dim2)).unwrap();
        assert!(normed.values().iter().all(|p| p.is_finite() && *p >= 0. ));
    }
}

fn calc_limits(limits : &DMatrix<f64>, dim1 : usize, dim2 : usize) -> DMatrix<f64> {
    if dim1 == dim2 {
        DMatrix::from_row_slice(1, 2, &[limits[(dim1, 0)], limits[(dim1, 1)]])
    } else {
        DMatrix::from_row_slice(2, 2, &[limits[(dim1, 0)], limits[(dim1, 1)], limits[(dim2, 0)], limits[(dim2, 1)]])
    }
}

#[test]
fn analytic_conditional_matches_grid() {
    let mog = trimodal();
    let limits = box_limits(3, -5., 5.);
    let cond = DVector::from_column_slice(&[0., 0., 0.8]);
    let settings = GridSettings::default().resolution(30);
    let joint_grid = eval_conditional_density(&mog, &cond, &limits, 0, 1, &settings).unwrap();

    let cond_mog = condition_mog(&cond, &[0, 1], &mog).unwrap();
    assert_eq!(cond_mog.dim(), 2);
    assert_relative_eq!(cond_mog.weights().sum(), 1.0, epsilon = 1E-12);
    let reduced_limits = box_limits(2, -5., 5.);
    let cond_grid = eval_conditional_density(&cond_mog, &DVector::zeros(2), &reduced_limits, 0, 1, &settings).unwrap();
    assert_relative_eq!(
        joint_grid.as_plane().unwrap().clone(),
        cond_grid.as_plane().unwrap().clone(),
        epsilon = 1E-9
    );
}

#[test]
fn conditioned_mixture_samples() {
    let cond_mog = condition_mog(&DVector::from_column_slice(&[0., 0., 0.8]), &[2, 0], &trimodal()).unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    let s = cond_mog.sample(&mut rng, 20_000).unwrap();
    let w = cond_mog.weights();
    let expected = cond_mog.means().transpose() * &w;
    assert!((s.column(0).mean() - expected[0]).abs() < 0.05);
    assert!((s.column(1).mean() - expected[1]).abs() < 0.05);
}

#[test]
fn network_posterior_conditioning() {
    let net = LinearMdn::new();
    let x_o = DMatrix::from_row_slice(1, 2, &[0.4, -0.6]);
    let mogs = extract_mog(&net, &x_o).unwrap();
    assert_eq!(mogs.len(), 1);
    let condition = DVector::from_column_slice(&[0.3, 2.5]);
    let cond_mog = condition_mog(&condition, &[1], &mogs[0]).unwrap();

    let prior = BoxUniform::new(DVector::from_element(2, -10.), DVector::from_element(2, 10.)).unwrap();
    let mut potential = MdnPotential::new(LinearMdn::new(), prior);
    potential.set_observation(Some(x_o));
    let mut conditioned = ConditionedPotential::new(potential, condition.clone(), vec![1]).unwrap();
    assert!(conditioned.x_o().is_ok());
    assert!(conditioned.set_x(Some(DMatrix::zeros(3, 2))).is_err());

    // The conditioned potential and the analytic conditional differ by the marginal
    // log-density of the fixed entry, which does not depend on the sampled one.
    let theta = DMatrix::from_row_slice(4, 1, &[-1., 0.5, 2., 4.]);
    let lp_pot = conditioned.call(&theta, false).unwrap();
    let lp_cond = cond_mog.log_prob(&theta).unwrap();
    let diff = lp_pot - lp_cond;
    for i in 1..4 {
        assert_relative_eq!(diff[i], diff[0], epsilon = 1E-9);
    }

    // Out of the prior support.
    let lp = conditioned.call(&DMatrix::from_element(1, 1, 11.), false).unwrap();
    assert_eq!(lp[0], f64::NEG_INFINITY);
}

#[test]
fn restricted_prior_and_transform() {
    let prior = BoxUniform::new(
        DVector::from_column_slice(&[0., -2., 1.]),
        DVector::from_column_slice(&[1., 2., 5.])
    ).unwrap();
    let tf = BoxTransform::from_prior(&prior);
    let condition = DVector::from_column_slice(&[0.5, 0., 3.]);
    let dims = vec![2, 1];
    let restricted_prior = RestrictedPrior::new(prior.clone(), 3, dims.clone()).unwrap();
    let restricted_tf = RestrictedTransform::new(tf, condition.clone(), dims).unwrap();

    let mut rng = StdRng::seed_from_u64(1);
    let theta = restricted_prior.sample(&mut rng, 100);
    assert_eq!(theta.shape(), (100, 2));
    let z = restricted_tf.inverse(&theta);
    assert!(z.iter().all(|v| v.is_finite() ));
    assert_relative_eq!(restricted_tf.forward(&z), theta, epsilon = 1E-9);
    assert_eq!(restricted_tf.restriction().condition(), &condition);
    assert!(RestrictedPrior::new(prior, 3, vec![0, 0]).is_err());
}
