/*! Placement of a target on the environment, run as its own step before solving.
 *
 * A typical frame moves the body, snaps each foot target to the ground with [GroundSnap::snap],
 * and only then calls [crate::ChainIkSolver::solve].
 */

use nalgebra::Vector3;
use tracing::trace;

use crate::Pose;

/// Something that can be hit by a ray cast straight down (along `-y`).
pub trait GroundProbe {
    /// The first hit below `origin`, if any.
    fn cast_down(&self, origin: &Vector3<f32>) -> Option<Vector3<f32>>;
}

/// An infinite horizontal plane at `height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatGround {
    pub height: f32,
}

impl GroundProbe for FlatGround {
    fn cast_down(&self, origin: &Vector3<f32>) -> Option<Vector3<f32>> {
        (origin.y >= self.height).then(|| Vector3::new(origin.x, self.height, origin.z))
    }
}

/// Terrain given by a height function of `(x, z)`. `None` marks holes.
pub struct HeightField<F>(pub F)
where
    F: Fn(f32, f32) -> Option<f32>;

impl<F> GroundProbe for HeightField<F>
where
    F: Fn(f32, f32) -> Option<f32>,
{
    fn cast_down(&self, origin: &Vector3<f32>) -> Option<Vector3<f32>> {
        let height = (self.0)(origin.x, origin.z)?;
        (origin.y >= height).then(|| Vector3::new(origin.x, height, origin.z))
    }
}

/// Places targets on the ground below them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundSnap {
    /// How far above the target the ray starts
    pub probe_height: f32,
    /// How far below the hit point the target ends up
    pub sink_depth: f32,
}

impl Default for GroundSnap {
    fn default() -> Self {
        Self {
            probe_height: 10.0,
            sink_depth: 0.5,
        }
    }
}

impl GroundSnap {
    /// Casts down from above `target` and moves it to the hit point, lowered by `sink_depth`.
    /// Returns `false` and leaves the target untouched if nothing was hit.
    pub fn snap<G>(&self, target: &mut Pose, ground: &G) -> bool
    where
        G: GroundProbe + ?Sized,
    {
        let up = Vector3::y();
        let origin = target.position + up * self.probe_height;
        match ground.cast_down(&origin) {
            Some(hit) => {
                target.position = hit - up * self.sink_depth;
                trace!(x = hit.x, y = hit.y, z = hit.z, "snapped target to ground");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_snap_to_flat_ground() {
        let mut target = Pose::from_position(Vector3::new(1.0, 3.0, 2.0));
        assert!(GroundSnap::default().snap(&mut target, &FlatGround { height: 1.0 }));
        assert_abs_diff_eq!(target.position, Vector3::new(1.0, 0.5, 2.0));

        // The probe starts above the target, so a target below the ground comes back up
        let mut target = Pose::from_position(Vector3::new(0.0, -4.0, 0.0));
        assert!(GroundSnap::default().snap(&mut target, &FlatGround { height: 0.0 }));
        assert_abs_diff_eq!(target.position, Vector3::new(0.0, -0.5, 0.0));
    }

    #[test]
    fn test_snap_misses() {
        let snap = GroundSnap {
            probe_height: 1.0,
            sink_depth: 0.0,
        };
        let mut target = Pose::from_position(Vector3::new(0.0, 0.0, 0.0));
        assert!(!snap.snap(&mut target, &FlatGround { height: 5.0 }));
        assert_eq!(target.position, Vector3::zeros());

        let holes = HeightField(|x: f32, _z: f32| if x < 0.0 { None } else { Some(x) });
        let mut target = Pose::from_position(Vector3::new(-1.0, 0.0, 0.0));
        assert!(!snap.snap(&mut target, &holes));
    }

    #[test]
    fn test_snap_to_height_field() {
        let slope = HeightField(|x: f32, z: f32| Some(0.5 * x + z));
        let mut target = Pose::from_position(Vector3::new(2.0, 0.0, 1.0));
        assert!(GroundSnap::default().snap(&mut target, &slope));
        assert_abs_diff_eq!(target.position, Vector3::new(2.0, 1.5, 1.0), epsilon = 1e-6);
    }
}
