use crate::grid::Position;

/// Conditions that stop a search before it starts.
///
/// Running out of placements is not an error: the solver reports it as `None`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("shape {name:?} has no cells")]
    EmptyShape { name: String },

    #[error("shape {name:?} lists cell {position} more than once")]
    DuplicateCell { name: String, position: Position },

    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidGridDimensions { width: usize, height: usize },
}
