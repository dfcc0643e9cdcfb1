//! Checks a candidate placement must pass before the solver commits it.

use std::collections::BTreeSet;

use crate::grid::{are_adjacent, GridSettings, GridState, Position};

/// Why a candidate placement was turned down.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("cell {position} lies outside the grid")]
    OutOfBounds { position: Position },

    #[error("node {node} cannot be placed at {anchor} without overflowing")]
    CoordinateOverflow { anchor: Position, node: Position },

    #[error("cell {position} is already occupied")]
    Overlap { position: Position },

    #[error(transparent)]
    AdjacencyMismatch(#[from] AdjacencyMismatch),
}

/// The first cell whose neighbors changed between local and placed coordinates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cell {index} is adjacent to {expected:?} locally but to {actual:?} once placed")]
pub struct AdjacencyMismatch {
    pub index: usize,
    pub expected: BTreeSet<usize>,
    pub actual: BTreeSet<usize>,
}

/// The first placed cell outside a `settings`-sized grid.
pub fn out_of_bounds(placed: &[Position], settings: GridSettings) -> Option<Position> {
    placed.iter().copied().find(|pos| {
        !(usize::try_from(pos.x).map_or(false, |x| x < settings.width)
            && usize::try_from(pos.y).map_or(false, |y| y < settings.height))
    })
}

/// The first in-bounds placed cell that is already taken.
pub fn overlap(placed: &[Position], grid: &GridState) -> Option<Position> {
    placed
        .iter()
        .copied()
        .find(|pos| grid.is_within_bounds(*pos) && !grid.is_empty(*pos))
}

fn adjacent_indices(cells: &[Position], i: usize) -> BTreeSet<usize> {
    (0..cells.len())
        .filter(|&j| j != i && are_adjacent(cells[i], cells[j]))
        .collect()
}

/// Compares the neighbor graph of `local` against that of `placed`, index by index.
pub fn adjacency_mismatch(local: &[Position], placed: &[Position]) -> Option<AdjacencyMismatch> {
    (0..local.len()).find_map(|index| {
        let expected = adjacent_indices(local, index);
        let actual = adjacent_indices(placed, index);
        if expected == actual {
            None
        } else {
            Some(AdjacencyMismatch {
                index,
                expected,
                actual,
            })
        }
    })
}

/// Runs the bounds, overlap and adjacency checks in that order.
pub fn validate(local: &[Position], placed: &[Position], grid: &GridState) -> Result<(), Rejection> {
    if let Some(position) = out_of_bounds(placed, grid.settings()) {
        return Err(Rejection::OutOfBounds { position });
    }

    if let Some(position) = overlap(placed, grid) {
        return Err(Rejection::Overlap { position });
    }

    if let Some(mismatch) = adjacency_mismatch(local, placed) {
        log::debug!("adjacency mismatch: {}", mismatch);
        return Err(mismatch.into());
    }

    Ok(())
}
