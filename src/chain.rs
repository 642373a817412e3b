//! The per-chain state derived from a pose snapshot: link lengths, rest directions and orientations.
//!
//! A [Chain] is built once (see [Chain::build]) and then solved repeatedly. Apart from the scratch
//! positions of its links, it does not change between solves.

use itertools::Itertools;
use nalgebra::{UnitQuaternion, Vector3};
use tracing::debug;
use tracing_attributes::instrument;

use crate::geometry::normalize_or_zero;
use crate::{Pose, PoseProvider, TendrilError};

/// One joint of a chain, including the end-effector.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    /// Distance to the next link toward the effector (0 for the leaf)
    pub(crate) length: f32,
    pub(crate) is_leaf: bool,
    /// Scratch world position. Only meaningful during and right after a solve
    pub(crate) position: Vector3<f32>,
    /// Unit direction toward the next link at build time (toward the target for the leaf)
    pub(crate) rest_direction: Vector3<f32>,
    /// World orientation at build time
    pub(crate) rest_orientation: UnitQuaternion<f32>,
}

impl Link {
    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    pub fn position(&self) -> &Vector3<f32> {
        &self.position
    }

    pub fn rest_direction(&self) -> &Vector3<f32> {
        &self.rest_direction
    }

    pub fn rest_orientation(&self) -> &UnitQuaternion<f32> {
        &self.rest_orientation
    }
}

/// An ordered sequence of links from the base (index 0) to the end-effector (last index).
///
/// Each chain exclusively owns its links; chains share no state and can be solved independently.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub(crate) links: Vec<Link>,
    pub(crate) total_length: f32,
    pub(crate) target_rest_orientation: UnitQuaternion<f32>,
    pub(crate) base_rest_orientation: UnitQuaternion<f32>,
}

impl Chain {
    /// Captures a chain of `chain_length` links (`chain_length + 1` poses) from `poses`.
    ///
    /// The provider must hold exactly `chain_length + 1` poses ordered from the base to the
    /// effector. `target` is the target's current pose; its orientation becomes the reference
    /// for the effector's orientation in later solves.
    #[instrument(level = "debug", skip_all, fields(chain_length = chain_length))]
    pub fn build<P>(chain_length: usize, poses: &P, target: &Pose) -> Result<Self, TendrilError>
    where
        P: PoseProvider + ?Sized,
    {
        if chain_length < 1 {
            return Err(TendrilError::InvalidChainLength(chain_length));
        }
        let available = poses.len();
        if available < 2 {
            return Err(TendrilError::InsufficientPoses(available));
        }
        if available != chain_length + 1 {
            return Err(TendrilError::ChainLengthMismatch {
                expected: chain_length + 1,
                available,
            });
        }

        let snapshot = (0..available)
            .map(|index| poses.pose(index).ok_or(TendrilError::UnknownNode(index)))
            .collect::<Result<Vec<_>, _>>()?;

        let last = snapshot.len() - 1;
        let links = snapshot
            .iter()
            .enumerate()
            .map(|(index, pose)| {
                if index == last {
                    Link {
                        length: 0.0,
                        is_leaf: true,
                        position: pose.position,
                        rest_direction: normalize_or_zero(&(target.position - pose.position)),
                        rest_orientation: pose.rotation,
                    }
                } else {
                    let offset = snapshot[index + 1].position - pose.position;
                    Link {
                        length: offset.norm(),
                        is_leaf: false,
                        position: pose.position,
                        rest_direction: normalize_or_zero(&offset),
                        rest_orientation: pose.rotation,
                    }
                }
            })
            .collect_vec();

        let total_length: f32 = links.iter().map(|link| link.length).sum();
        debug!(links = links.len(), total_length, "built chain");

        Ok(Self {
            base_rest_orientation: links[0].rest_orientation,
            links,
            total_length,
            target_rest_orientation: target.rotation,
        })
    }

    /// Number of links (excluding the base)
    pub fn chain_length(&self) -> usize {
        self.links.len() - 1
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Sum of all link lengths, i.e., the maximal reach from the base.
    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    pub fn target_rest_orientation(&self) -> &UnitQuaternion<f32> {
        &self.target_rest_orientation
    }

    /// Orientation of the base at build time. Not used by the solver.
    pub fn base_rest_orientation(&self) -> &UnitQuaternion<f32> {
        &self.base_rest_orientation
    }

    /// Positions committed by the last solve (or captured at build time).
    pub fn positions(&self) -> impl Iterator<Item = &Vector3<f32>> {
        self.links.iter().map(|link| &link.position)
    }

    /// Consecutive pairs of link positions with the length of the connecting bone, e.g., for drawing.
    pub fn segments(&self) -> impl Iterator<Item = (&Vector3<f32>, &Vector3<f32>, f32)> {
        self.links
            .iter()
            .tuple_windows()
            .map(|(from, to)| (&from.position, &to.position, from.length))
    }
}
