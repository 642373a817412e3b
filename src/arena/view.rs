//! An ordered window onto a [PoseArena] that implements [PoseProvider].

use super::{ArenaIndex, PoseArena};
use crate::{Pose, PoseProvider};

/// A chain of arena nodes ordered from the base to the effector.
///
/// Writes through the view go straight into the arena.
#[derive(Debug)]
pub struct ChainView<'a> {
    arena: &'a mut PoseArena,
    indices: Vec<ArenaIndex>,
}

impl<'a> ChainView<'a> {
    pub(super) fn new(arena: &'a mut PoseArena, indices: Vec<ArenaIndex>) -> Self {
        Self { arena, indices }
    }

    /// The arena indices covered by the view
    pub fn indices(&self) -> &[ArenaIndex] {
        &self.indices
    }
}

impl PoseProvider for ChainView<'_> {
    fn len(&self) -> usize {
        self.indices.len()
    }

    fn pose(&self, index: usize) -> Option<Pose> {
        let arena_index = self.indices.get(index)?;
        self.arena.pose(*arena_index).copied()
    }

    fn set_pose(&mut self, index: usize, pose: Pose) -> bool {
        let Some(&arena_index) = self.indices.get(index) else {
            return false;
        };
        self.arena.set_pose(arena_index, pose).is_ok()
    }
}
