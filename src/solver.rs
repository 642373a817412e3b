//! FABRIK (forward and backward reaching) solver with pole correction.
//!
//! [Chain::solve] is the stateless core operating on an already built [Chain]. [ChainIkSolver] is the
//! stateful component that owns configuration, target/pole bindings and the cached chain, and rebuilds
//! the latter whenever the configured chain length or the length of the pose provider changes.
//!
//! Solving must happen once per simulation step, after the base and target have been moved and
//! before anything reads the link poses.

use nalgebra::{Unit, UnitQuaternion, Vector3};
use tracing::{debug, trace};
use tracing_attributes::instrument;

use crate::geometry::{
    any_orthogonal, from_to_rotation, normalize_or, project_on_plane, rotate_about, signed_angle,
    DEGENERATE_EPSILON,
};
use crate::{Chain, Pose, PoseProvider, TendrilError};

/// Configuration of a [ChainIkSolver].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Number of links excluding the base (the chain holds `chain_length + 1` poses)
    pub chain_length: usize,
    /// Maximal number of backward/forward passes
    pub iterations: u32,
    /// Distance from the target below which iteration stops
    pub tolerance: f32,
    /// Reserved. Validated to lie in `[0, 1]` but has no effect on the solution.
    pub snap_back_strength: f32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            chain_length: 2,
            iterations: 10,
            tolerance: 0.001,
            snap_back_strength: 1.0,
        }
    }
}

impl SolverConfig {
    pub fn new(chain_length: usize) -> Self {
        Self {
            chain_length,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), TendrilError> {
        if self.chain_length < 1 {
            return Err(TendrilError::InvalidChainLength(self.chain_length));
        }
        if self.iterations < 1 {
            return Err(TendrilError::InvalidConfiguration(
                "at least one iteration is required".into(),
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(TendrilError::InvalidConfiguration(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if !(0.0..=1.0).contains(&self.snap_back_strength) {
            return Err(TendrilError::InvalidConfiguration(format!(
                "snap back strength must be in [0, 1], got {}",
                self.snap_back_strength
            )));
        }
        Ok(())
    }
}

/// Information about the outcome of a solve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveInfo {
    /// `false` if the target was out of reach and the chain was stretched toward it
    pub reachable: bool,
    /// Number of iterations run (0 for the stretched chain)
    pub iteration_count: u32,
    /// Final squared distance between effector and target
    pub squared_error: f32,
}

impl Chain {
    /// Solves the chain for `target` and writes the new link poses to `poses`.
    ///
    /// `poses` must be the provider the chain was built from (or one with the same layout). Its
    /// current positions are the starting point; positions and rotations of all links are
    /// overwritten. The base is never moved.
    ///
    /// Fails with [TendrilError::ChainLengthMismatch] and writes nothing if `poses` does not hold
    /// exactly one pose per link.
    #[instrument(level = "trace", skip_all)]
    pub fn solve<P>(
        &mut self,
        poses: &mut P,
        target: &Pose,
        pole: Option<&Vector3<f32>>,
        config: &SolverConfig,
    ) -> Result<SolveInfo, TendrilError>
    where
        P: PoseProvider + ?Sized,
    {
        self.reset(&*poses)?;

        let target_position = target.position;
        let base = self.links[0].position;
        let reachable = (target_position - base).norm_squared() < self.total_length * self.total_length;

        let iteration_count = if reachable {
            self.reach(&target_position, pole, config)
        } else {
            self.stretch(&target_position);
            0
        };

        let squared_error = (self.effector() - target_position).norm_squared();
        trace!(reachable, iteration_count, squared_error, "solved chain");

        self.commit(poses, target);

        Ok(SolveInfo {
            reachable,
            iteration_count,
            squared_error,
        })
    }

    fn effector(&self) -> Vector3<f32> {
        self.links[self.links.len() - 1].position
    }

    /// Copies the last applied positions into the scratch buffer.
    fn reset<P>(&mut self, poses: &P) -> Result<(), TendrilError>
    where
        P: PoseProvider + ?Sized,
    {
        let mismatch = TendrilError::ChainLengthMismatch {
            expected: self.links.len(),
            available: poses.len(),
        };
        if poses.len() != self.links.len() {
            return Err(mismatch);
        }
        for (index, link) in self.links.iter_mut().enumerate() {
            link.position = poses.pose(index).ok_or_else(|| mismatch.clone())?.position;
        }
        Ok(())
    }

    /// Extends the chain in a straight line toward an unreachable target.
    fn stretch(&mut self, target: &Vector3<f32>) {
        let direction = normalize_or(&(target - self.links[0].position), &self.links[0].rest_direction);
        for i in 1..self.links.len() {
            self.links[i].position = self.links[i - 1].position + direction * self.links[i - 1].length;
        }
    }

    /// Iterates backward, forward and pole passes until the effector is within tolerance.
    /// Returns the number of iterations run.
    fn reach(&mut self, target: &Vector3<f32>, pole: Option<&Vector3<f32>>, config: &SolverConfig) -> u32 {
        let last = self.links.len() - 1;
        let tolerance_squared = config.tolerance * config.tolerance;
        self.unfold(target, pole);

        for iteration in 1..=config.iterations {
            self.backward(target);
            self.forward();
            if let Some(pole) = pole {
                self.bend_toward(pole);
            }

            let squared_error = (self.links[last].position - target).norm_squared();
            trace!(iteration, squared_error);
            if squared_error < tolerance_squared {
                return iteration;
            }
        }
        config.iterations
    }

    /// Bends a chain whose interior joints all lie on the line from the base through the target off
    /// that line, toward the pole if there is one. The passes cannot leave such a line on their own.
    fn unfold(&mut self, target: &Vector3<f32>, pole: Option<&Vector3<f32>>) {
        let last = self.links.len() - 1;
        let base = self.links[0].position;
        let axis = normalize_or(&(target - base), &self.links[0].rest_direction);
        let off_axis = |point: &Vector3<f32>| {
            let offset = point - base;
            offset - axis * axis.dot(&offset)
        };

        let straight = self.links[1..last]
            .iter()
            .all(|link| off_axis(&link.position).norm() <= DEGENERATE_EPSILON);
        if last < 2 || !straight {
            return;
        }
        let bend = pole
            .and_then(|pole| off_axis(pole).try_normalize(DEGENERATE_EPSILON))
            .unwrap_or_else(|| any_orthogonal(&axis).into_inner());
        trace!(?bend, "unfolding straight chain");
        for i in 1..last {
            let length = self.links[i - 1].length;
            self.links[i].position += bend * length;
        }
    }

    /// Pulls the effector onto the target, propagating toward (but not moving) the base.
    fn backward(&mut self, target: &Vector3<f32>) {
        let last = self.links.len() - 1;
        self.links[last].position = *target;
        for i in (1..last).rev() {
            let next = self.links[i + 1].position;
            let link = &mut self.links[i];
            let direction = normalize_or(&(link.position - next), &-link.rest_direction);
            link.position = next + direction * link.length;
        }
    }

    /// Re-anchors the chain at the base, propagating toward the effector.
    fn forward(&mut self) {
        for i in 1..self.links.len() {
            let previous = &self.links[i - 1];
            let (anchor, length) = (previous.position, previous.length);
            let direction = normalize_or(&(self.links[i].position - anchor), &previous.rest_direction);
            self.links[i].position = anchor + direction * length;
        }
    }

    /// Rotates every interior joint about the axis through its neighbours so it lies on the side of
    /// the pole. Lengths, base and effector are unchanged.
    fn bend_toward(&mut self, pole: &Vector3<f32>) {
        for i in 1..self.links.len() - 1 {
            let anchor = self.links[i - 1].position;
            let Some(normal) = Unit::try_new(self.links[i + 1].position - anchor, DEGENERATE_EPSILON) else {
                continue;
            };
            let joint = self.links[i].position;
            let projected_pole = project_on_plane(pole, &anchor, &normal);
            let projected_joint = project_on_plane(&joint, &anchor, &normal);
            let angle = signed_angle(&(projected_joint - anchor), &(projected_pole - anchor), &normal);
            self.links[i].position = rotate_about(&joint, &anchor, &normal, angle);
        }
    }

    /// Derives orientations from the solved positions and writes all poses back.
    fn commit<P>(&self, poses: &mut P, target: &Pose)
    where
        P: PoseProvider + ?Sized,
    {
        let target_delta = target.rotation * self.target_rest_orientation.inverse();
        for (index, link) in self.links.iter().enumerate() {
            let rotation: UnitQuaternion<f32> = if link.is_leaf {
                target_delta * link.rest_orientation
            } else {
                let direction = self.links[index + 1].position - link.position;
                from_to_rotation(&link.rest_direction, &direction) * link.rest_orientation
            };
            let written = poses.set_pose(index, Pose::new(link.position, rotation));
            // `reset` checked the provider length
            debug_assert!(written, "pose {index} out of bounds");
        }
    }
}

/// Stateful IK component for a single chain.
///
/// Holds the configuration, the bound target and pole, and the chain built from the poses on
/// first use. Without a bound target, [ChainIkSolver::solve] is a no-op.
#[derive(Debug, Clone)]
pub struct ChainIkSolver {
    config: SolverConfig,
    target: Option<Pose>,
    pole: Option<Vector3<f32>>,
    chain: Option<Chain>,
}

impl ChainIkSolver {
    pub fn new(config: SolverConfig) -> Result<Self, TendrilError> {
        config.validate()?;
        Ok(Self {
            config,
            target: None,
            pole: None,
            chain: None,
        })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Replaces the configuration. A changed chain length causes a rebuild on the next solve.
    pub fn set_config(&mut self, config: SolverConfig) -> Result<(), TendrilError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn set_chain_length(&mut self, chain_length: usize) -> Result<(), TendrilError> {
        self.set_config(SolverConfig {
            chain_length,
            ..self.config
        })
    }

    pub fn target(&self) -> Option<&Pose> {
        self.target.as_ref()
    }

    pub fn bind_target(&mut self, target: Pose) {
        self.target = Some(target);
    }

    /// Mutable access to the bound target, e.g., to move it before the next solve.
    pub fn target_mut(&mut self) -> Option<&mut Pose> {
        self.target.as_mut()
    }

    pub fn unbind_target(&mut self) -> Option<Pose> {
        self.target.take()
    }

    pub fn pole(&self) -> Option<&Vector3<f32>> {
        self.pole.as_ref()
    }

    pub fn bind_pole(&mut self, pole: Vector3<f32>) {
        self.pole = Some(pole);
    }

    pub fn unbind_pole(&mut self) -> Option<Vector3<f32>> {
        self.pole.take()
    }

    /// The cached chain holding the positions of the last solve.
    pub fn chain(&self) -> Option<&Chain> {
        self.chain.as_ref()
    }

    /// Whether the cached chain is missing or does not match the configured length or the number
    /// of `poses`.
    pub fn needs_rebuild<P>(&self, poses: &P) -> bool
    where
        P: PoseProvider + ?Sized,
    {
        self.chain.as_ref().map_or(true, |chain| {
            let links = chain.links().len();
            links != self.config.chain_length + 1 || links != poses.len()
        })
    }

    /// Rebuilds the chain from the current `poses` and the bound target.
    ///
    /// On failure the previously built chain (if any) stays in place.
    #[instrument(level = "debug", skip_all, fields(chain_length = self.config.chain_length))]
    pub fn rebuild<P>(&mut self, poses: &P) -> Result<(), TendrilError>
    where
        P: PoseProvider + ?Sized,
    {
        let target = self.target.as_ref().ok_or(TendrilError::TargetNotBound)?;
        let chain = Chain::build(self.config.chain_length, poses, target)?;
        debug!(total_length = chain.total_length(), "rebuilt chain");
        self.chain = Some(chain);
        Ok(())
    }

    /// Solves the chain for the bound target and pole and writes the result into `poses`.
    ///
    /// Returns `Ok(None)` if no target is bound. Rebuilds the chain first if necessary; a failing
    /// rebuild is returned as an error and nothing is written.
    #[instrument(level = "trace", skip_all)]
    pub fn solve<P>(&mut self, poses: &mut P) -> Result<Option<SolveInfo>, TendrilError>
    where
        P: PoseProvider + ?Sized,
    {
        let Some(target) = self.target else {
            return Ok(None);
        };
        if self.needs_rebuild(&*poses) {
            self.rebuild(&*poses)?;
        }
        self.chain
            .as_mut()
            .map(|chain| chain.solve(poses, &target, self.pole.as_ref(), &self.config))
            .transpose()
    }
}
