use nalgebra::*;
use crate::prob::{Density, Error, Result};
use crate::calc;
use super::{eval_conditional_density, corrcoeff, GridSettings};

/// Tolerance beyond [-1, 1] attributed to the grid approximation.
const CORR_TOL : f64 = 1E-6;

/// Returns the conditional correlation matrix of a distribution.
///
/// All parameters but two are held at the values of a condition, and the Pearson
/// correlation coefficient between the remaining two is computed under density
/// (evaluated over a resolution x resolution grid within limits). This is done for
/// every pair of dimensions in subset (or all dimensions if subset is None), building
/// a matrix of conditional correlations in the order of subset.
///
/// The condition is a batch (conditions over rows): one correlation matrix is computed
/// for each condition, and the average matrix is returned. The output is symmetric, with a
/// unit diagonal, and has size len(subset) x len(subset).
pub fn conditional_corrcoeff<D>(
    density : &D,
    limits : &DMatrix<f64>,
    condition : &DMatrix<f64>,
    subset : Option<&[usize]>,
    resolution : usize
) -> Result<DMatrix<f64>>
where
    D : Density + ?Sized
{
    if condition.nrows() == 0 {
        return Err(Error::Shape(String::from("At least one condition is required")));
    }
    let subset : Vec<usize> = match subset {
        Some(dims) => dims.to_vec(),
        None => (0..condition.ncols()).collect()
    };
    calc::valid_dims(&subset, condition.ncols()).map_err(Error::Shape)?;
    let settings = GridSettings::default().resolution(resolution);
    let k = subset.len();
    log::debug!(
        "Conditional correlations: {} conditions x {} pairs at resolution {}",
        condition.nrows(),
        k * k.saturating_sub(1) / 2,
        resolution
    );

    let mut av_correlation_matrix = DMatrix::<f64>::zeros(k, k);
    for cond in condition.row_iter() {
        let cond = cond.transpose();
        for a in 0..k {
            for b in (a + 1)..k {
                let (dim1, dim2) = if subset[a] < subset[b] {
                    (subset[a], subset[b])
                } else {
                    (subset[b], subset[a])
                };
                let probs = eval_conditional_density(density, &cond, limits, dim1, dim2, &settings)?;
                let pair_limits = calc::select_block(limits, &[dim1, dim2], &[0, 1]);
                let rho = corrcoeff(&probs, &pair_limits)?;
                if !rho.is_finite() || rho.abs() > 1. + CORR_TOL {
                    log::warn!("Conditional correlation between dims {} and {} evaluated to {}", dim1, dim2, rho);
                }
                av_correlation_matrix[(a, b)] += rho;
            }
        }
    }
    av_correlation_matrix /= condition.nrows() as f64;

    // Make the matrix symmetric by copying upper diagonal to lower diagonal.
    for a in 0..k {
        for b in (a + 1)..k {
            av_correlation_matrix[(b, a)] = av_correlation_matrix[(a, b)];
        }
    }
    av_correlation_matrix.fill_diagonal(1.0);
    Ok(av_correlation_matrix)
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::prob::MultiNormal;

    #[test]
    fn subset_follows_informed_order() {
        let sigma = DMatrix::from_row_slice(3, 3, &[
            1.0, 0.0, 0.6,
            0.0, 1.0, 0.0,
            0.6, 0.0, 1.0
        ]);
        let mn = MultiNormal::new(DVector::zeros(3), sigma).unwrap();
        let limits = DMatrix::from_row_slice(3, 2, &[-5., 5., -5., 5., -5., 5.]);
        let cond = DMatrix::zeros(1, 3);
        let corr = conditional_corrcoeff(&mn, &limits, &cond, Some(&[2, 0][..]), 60).unwrap();
        assert_eq!(corr.shape(), (2, 2));
        assert_eq!(corr[(0, 0)], 1.0);
        assert!((corr[(0, 1)] - 0.6).abs() < 0.02);
        assert_eq!(corr[(0, 1)], corr[(1, 0)]);
    }

    #[test]
    fn empty_batch_is_rejected() {
        let mn = MultiNormal::new_standard(2);
        let limits = DMatrix::from_row_slice(2, 2, &[-1., 1., -1., 1.]);
        let r = conditional_corrcoeff(&mn, &limits, &DMatrix::zeros(0, 2), None, 10);
        assert!(matches!(r, Err(Error::Shape(_))));
        let r = conditional_corrcoeff(&mn, &limits, &DMatrix::zeros(1, 2), Some(&[0, 2][..]), 10);
        assert!(matches!(r, Err(Error::Shape(_))));
    }

}
