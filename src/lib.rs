//! ## About
//!
//! This crate contains an iterative inverse kinematics solver for articulated chains of rigid links
//! (e.g., the legs of a spider or the arm of a character). Given a fixed base, a target pose and an
//! optional pole that decides in which direction the joints bend, it finds new positions and
//! orientations for all links with the FABRIK (forward and backward reaching) algorithm.
//!
//! See [ChainIkSolver] to get started. The solver reads and writes poses through the
//! [PoseProvider] trait, which is implemented for plain vectors of [Pose]s and for chains extracted
//! from a [PoseArena] hierarchy.
//!
//! ## Reading list
//!
//! * [FABRIK](https://www.andreasaristidou.com/FABRIK.html): Aristidou and Lasenby, *FABRIK: A fast,
//!   iterative solver for the Inverse Kinematics problem*, Graphical Models, 2011
//! * [Lecture on Inverse Kinematics](https://cseweb.ucsd.edu/classes/wi17/cse169-a/sessions.html)
//!
//! ## Naming conventions
//! * Traits – adjectives or agent nouns that indicate capability and behavior
//! * Structs – substantives that indicate entities implementing a behavior
//! * Methods – imperative forms with the exception of getters and factories, which
//!             use substantives (i.e., omit a `get_` prefix) much like the standard library.

pub mod arena;
pub mod batch;
pub mod chain;
pub mod environment;
pub mod errors;
pub mod geometry;
pub mod pose;
pub mod solver;

pub use arena::{ArenaIndex, ArenaNode, ChainView, PoseArena};
pub use chain::{Chain, Link};
pub use environment::{FlatGround, GroundProbe, GroundSnap, HeightField};
pub use errors::TendrilError;
pub use pose::{Pose, PoseProvider};
pub use solver::{ChainIkSolver, SolveInfo, SolverConfig};

// Parallel solving of independent chains
#[cfg(feature = "rayon")]
pub use batch::par_solve_all;
pub use batch::solve_all;
