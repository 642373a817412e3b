//! [Arena memory allocated](https://en.wikipedia.org/wiki/Region-based_memory_management)
//! hierarchy of world-space poses.
//!
//! The solver itself only needs an ordered [crate::PoseProvider]. This module offers a simple
//! scene hierarchy from which such an ordered view can be extracted by walking from an effector
//! up to its ancestors (see [PoseArena::chain]).

pub mod directed;
pub mod view;

pub use directed::{ArenaIndex, ArenaNode, PoseArena};
pub use view::ChainView;
