/// Small numerical utilities: evenly spaced grids, log-sum-exp, sigmoid/logit and
/// selection of parameter columns.
pub mod calc;

/// Contracts for densities, priors, potentials and transforms consumed by the
/// conditional routines, the crate error type, and a few concrete distributions
/// (multivariate normal, mixture of Gaussians and box-uniform).
pub mod prob;

/// Grid-based approximation of conditional densities, their moments and their
/// pairwise correlations.
pub mod approx;

/// Mixtures of Gaussians emitted by mixture density networks, and their exact
/// conditioning over subsets of the parameters.
pub mod mog;

/// Adapters that expose a subset of the parameters of a potential, prior or transform
/// to an external sampler, holding the remaining parameters fixed.
pub mod restrict;
