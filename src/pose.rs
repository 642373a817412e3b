/*! Defines world-space poses and the [PoseProvider] seam through which the solver reads and writes them */

use nalgebra::{UnitQuaternion, Vector3};

/// Position and orientation of a rigid link in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

impl Pose {
    pub fn new(position: Vector3<f32>, rotation: UnitQuaternion<f32>) -> Self {
        Self { position, rotation }
    }

    /// A pose at `position` with identity rotation.
    pub fn from_position(position: Vector3<f32>) -> Self {
        Self::new(position, UnitQuaternion::identity())
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::from_position(Vector3::zeros())
    }
}

/// An ordered source (and sink) of world-space poses, from the base of a chain (index 0) to its
/// end-effector (last index).
///
/// Decouples the solver from any particular scene graph. See [crate::arena::PoseArena] for a
/// hierarchy-backed implementor.
pub trait PoseProvider {
    /// Number of poses available
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The pose at `index` or `None` if out of bounds
    fn pose(&self, index: usize) -> Option<Pose>;

    /// Overwrites the pose at `index`. Returns `false` if the index is out of bounds.
    fn set_pose(&mut self, index: usize, pose: Pose) -> bool;
}

impl PoseProvider for [Pose] {
    fn len(&self) -> usize {
        <[Pose]>::len(self)
    }

    fn pose(&self, index: usize) -> Option<Pose> {
        self.get(index).copied()
    }

    fn set_pose(&mut self, index: usize, pose: Pose) -> bool {
        self.get_mut(index).map(|slot| *slot = pose).is_some()
    }
}

impl PoseProvider for Vec<Pose> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn pose(&self, index: usize) -> Option<Pose> {
        self.as_slice().pose(index)
    }

    fn set_pose(&mut self, index: usize, pose: Pose) -> bool {
        self.as_mut_slice().set_pose(index, pose)
    }
}

impl<P> PoseProvider for &mut P
where
    P: PoseProvider + ?Sized,
{
    fn len(&self) -> usize {
        (**self).len()
    }

    fn pose(&self, index: usize) -> Option<Pose> {
        (**self).pose(index)
    }

    fn set_pose(&mut self, index: usize, pose: Pose) -> bool {
        (**self).set_pose(index, pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_provider() {
        let mut poses = vec![Pose::default(), Pose::from_position(Vector3::x())];

        assert_eq!(PoseProvider::len(&poses), 2);
        assert_eq!(poses.pose(1).map(|p| p.position), Some(Vector3::x()));
        assert_eq!(poses.pose(2), None);

        assert!(poses.set_pose(0, Pose::from_position(Vector3::y())));
        assert!(!poses.set_pose(5, Pose::default()));
        assert_eq!(poses[0].position, Vector3::y());
    }

    #[test]
    fn test_borrowed_provider() {
        fn shift<P: PoseProvider>(mut poses: P) {
            for index in 0..poses.len() {
                let pose = poses.pose(index).unwrap();
                poses.set_pose(index, Pose::from_position(pose.position + Vector3::z()));
            }
        }

        let mut poses = vec![Pose::default(); 2];
        shift(&mut poses);
        shift(&mut poses[..1]);

        assert_eq!(poses[0].position, Vector3::new(0.0, 0.0, 2.0));
        assert_eq!(poses[1].position, Vector3::z());
    }
}
