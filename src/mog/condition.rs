use nalgebra::*;
use crate::prob::{self, Mog, Error, Result};
use crate::prob::build_symmetric;
use crate::calc;

/// Weight above which a conditioned mixture is reported as collapsed onto a single component.
const COLLAPSE_WEIGHT : f64 = 1. - 1E-9;

/// Returns the mixture of Gaussians over the entries at dims, conditional on the remaining
/// entries held at the corresponding positions of condition (a full-sized parameter vector;
/// its entries at dims are ignored). The entries of dims are kept in the informed order.
///
/// With P = U^T U the precision of a component, split over the kept (x) and fixed (y) entries,
/// the conditional component has precision P_xx (whose upper Cholesky factor is the returned
/// precision factor) and mean mu_x - P_xx^-1 P_xy (y - mu_y). Each logit is updated with the
/// log-density of y under the marginal of its component, whose precision is the Schur complement
/// P_yy - P_yx P_xx^-1 P_xy, and the logits are then renormalized.
pub fn condition_mog(condition : &DVector<f64>, dims : &[usize], mog : &Mog) -> Result<Mog> {
    let n_dims = mog.dim();
    calc::valid_dims(dims, n_dims).map_err(Error::Shape)?;
    if dims.is_empty() {
        return Err(Error::Shape(String::from("At least one dimension should be kept")));
    }
    if condition.nrows() != n_dims {
        return Err(Error::Shape(format!(
            "Condition has {} entries but mixture has dimension {}",
            condition.nrows(),
            n_dims
        )));
    }
    let fixed = calc::complement(dims, n_dims);
    let y = calc::select_entries(condition, &fixed);

    let k = mog.n_mixtures();
    let mut logits = DVector::zeros(k);
    let mut means = DMatrix::zeros(k, dims.len());
    let mut precfs = Vec::with_capacity(k);
    for (i, precf) in mog.precfs().iter().enumerate() {
        let prec = precf.transpose() * precf;
        let prec_xx = calc::select_block(&prec, dims, dims);
        let prec_xy = calc::select_block(&prec, dims, &fixed);
        let chol_xx = Cholesky::new(build_symmetric(prec_xx))
            .ok_or(Error::Singular { component : i })?;

        let mu = mog.mean(i);
        let mu_x = calc::select_entries(&mu, dims);
        let mu_y = calc::select_entries(&mu, &fixed);
        let cond_mu = mu_x - chol_xx.solve(&(&prec_xy * (&y - &mu_y)));
        means.row_mut(i).copy_from(&cond_mu.transpose());

        let lp_y = if fixed.is_empty() {
            0.0
        } else {
            let prec_yy = calc::select_block(&prec, &fixed, &fixed);
            let schur = prec_yy - prec_xy.transpose() * chol_xx.solve(&prec_xy);
            let marg_precf = Cholesky::new(build_symmetric(schur))
                .ok_or(Error::Singular { component : i })?
                .l()
                .transpose();
            prob::log_prob_gaussian(&y, &mu_y, &marg_precf, prob::sumlogdiag(&marg_precf))
        };
        logits[i] = mog.logits()[i] + lp_y;
        precfs.push(chol_xx.l().transpose());
    }

    let cond_mog = Mog::new(logits, means, precfs)?.normalized();
    if k > 1 && cond_mog.weights().max() > COLLAPSE_WEIGHT {
        log::warn!("Conditioned mixture collapsed onto a single of its {} components", k);
    }
    log::debug!("Conditioned mixture over {} of {} dimensions", dims.len(), n_dims);
    Ok(cond_mog)
}
