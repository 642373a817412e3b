//! Provides the error type used throughout this crate.

use thiserror::Error;

/// The error type used throughout this crate.
///
/// Degenerate geometry is never reported here; the solver recovers from it locally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TendrilError {
    // Configuration errors
    #[error("Chain length must be at least 1, got {0}")]
    InvalidChainLength(usize),
    #[error("At least two poses are required to build a chain, got {0}")]
    InsufficientPoses(usize),
    #[error("Chain length mismatch: expected {expected} poses, provider has {available}")]
    ChainLengthMismatch { expected: usize, available: usize },
    #[error("Invalid solver configuration: {0}")]
    InvalidConfiguration(String),
    #[error("No target bound to the solver")]
    TargetNotBound,
    // Errors raised by the pose hierarchy
    #[error("Node reference {0} is out of bound")]
    UnknownNode(usize),
    #[error("No root node set")]
    RootNotSet,
    #[error("Name not unique: {0}")]
    NotUnique(String),
    #[error("Chain of length {requested} exceeds the depth {depth} of the effector")]
    ChainTooLong { requested: usize, depth: usize },
}
