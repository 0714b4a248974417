//! Error types for the k-terminal cut solver.

use thiserror::Error;

/// Result type alias for solver operations
pub type Result<T> = std::result::Result<T, KtcError>;

/// Main error type for the solver
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KtcError {
    /// Malformed input, such as merging a vertex into itself or repeating a terminal
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A vertex label that is not part of the graph
    #[error("Vertex {0} is not in the graph")]
    VertexNotFound(usize),

    /// The fractional relaxation could not be solved
    #[error("Relaxation solver failed: {0}")]
    Relaxation(String),
}
