//! Solving many independent chains at once (e.g., all legs of a spider).
//!
//! Chains never share state, so with the `rayon` feature they are distributed over a thread pool.
//! The passes within one chain always run sequentially.

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use tracing::warn;

use crate::{ChainIkSolver, PoseProvider, SolveInfo, TendrilError};

/// Result of solving a single rig
pub type RigResult = Result<Option<SolveInfo>, TendrilError>;

fn solve_rig<P>(index: usize, solver: &mut ChainIkSolver, poses: &mut P) -> RigResult
where
    P: PoseProvider,
{
    let result = solver.solve(poses);
    if let Err(error) = &result {
        warn!(rig = index, %error, "failed to solve chain");
    }
    result
}

/// Solves every `(solver, poses)` pair in order. Results are returned in input order.
pub fn solve_all<P>(rigs: &mut [(ChainIkSolver, P)]) -> Vec<RigResult>
where
    P: PoseProvider,
{
    rigs.iter_mut()
        .enumerate()
        .map(|(index, (solver, poses))| solve_rig(index, solver, poses))
        .collect()
}

/// Like [solve_all] but solves the rigs in parallel.
#[cfg(feature = "rayon")]
pub fn par_solve_all<P>(rigs: &mut [(ChainIkSolver, P)]) -> Vec<RigResult>
where
    P: PoseProvider + Send,
{
    rigs.par_iter_mut()
        .enumerate()
        .map(|(index, (solver, poses))| solve_rig(index, solver, poses))
        .collect()
}
