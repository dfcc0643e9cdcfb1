use crate::error::Error;
use crate::validate::Rejection;

/// A cell address in odd-q offset coordinates: `x` is the column, `y` the row.
///
/// Odd columns sit half a cell lower than even ones, so which rows count as
/// neighbors depends on the parity of `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub x: isize,
    pub y: isize,
}

impl Position {
    pub const fn new(x: isize, y: isize) -> Self {
        Self { x, y }
    }

    fn column_is_odd(self) -> bool {
        self.x.rem_euclid(2) == 1
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

const EVEN_COLUMN_NEIGHBORS: [(isize, isize); 6] =
    [(1, 0), (1, -1), (0, -1), (-1, -1), (-1, 0), (0, 1)];

const ODD_COLUMN_NEIGHBORS: [(isize, isize); 6] =
    [(1, 1), (1, 0), (0, -1), (-1, 0), (-1, 1), (0, 1)];

/// The cells sharing an edge with `pos`: six, minus any past the edge of `isize`.
pub fn neighbors(pos: Position) -> impl Iterator<Item = Position> {
    let offsets = if pos.column_is_odd() {
        ODD_COLUMN_NEIGHBORS
    } else {
        EVEN_COLUMN_NEIGHBORS
    };
    offsets.into_iter().filter_map(move |(dx, dy)| {
        Some(Position::new(pos.x.checked_add(dx)?, pos.y.checked_add(dy)?))
    })
}

pub fn are_adjacent(a: Position, b: Position) -> bool {
    neighbors(a).any(|n| n == b)
}

/// Maps local shape offsets onto absolute cells under `anchor`.
///
/// An odd anchor column pushes every odd local column one row down; otherwise
/// offsets are added as-is. The result is index-aligned with `nodes`. A cell
/// whose coordinates do not fit in `isize` can never be on a grid, so it is
/// rejected as [`Rejection::CoordinateOverflow`].
pub fn place_shape(nodes: &[Position], anchor: Position) -> Result<Vec<Position>, Rejection> {
    nodes
        .iter()
        .map(|&node| {
            let shift = if anchor.column_is_odd() && node.column_is_odd() {
                1
            } else {
                0
            };
            anchor
                .x
                .checked_add(node.x)
                .zip(
                    anchor
                        .y
                        .checked_add(node.y)
                        .and_then(|y| y.checked_add(shift)),
                )
                .map(|(x, y)| Position::new(x, y))
                .ok_or(Rejection::CoordinateOverflow { anchor, node })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSettings {
    pub width: usize,
    pub height: usize,
}

impl GridSettings {
    /// Both sides and the cell count must be non-zero and fit in `isize`.
    pub fn validate(&self) -> Result<(), Error> {
        let fits = |n: usize| n > 0 && isize::try_from(n).is_ok();
        let cell_count = self.width.checked_mul(self.height);
        if !fits(self.width) || !fits(self.height) || !cell_count.map_or(false, fits) {
            return Err(Error::InvalidGridDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// One shape committed to the grid.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub shape_index: usize,
    pub anchor: Position,
    /// Absolute cells, index-aligned with the shape's nodes.
    pub cells: Vec<Position>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Placed(usize),
}

/// Occupancy of a bounded grid plus the log of placements that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct GridState {
    cells: ndarray::Array2<Cell>,
    placements: Vec<Placement>,
}

impl GridState {
    pub fn new(settings: GridSettings) -> Result<Self, Error> {
        settings.validate()?;
        Ok(Self {
            cells: ndarray::Array2::from_elem((settings.height, settings.width), Cell::Empty),
            placements: vec![],
        })
    }

    pub fn settings(&self) -> GridSettings {
        let (h, w) = self.cells.dim();
        GridSettings {
            width: w,
            height: h,
        }
    }

    fn index(&self, pos: Position) -> Option<[usize; 2]> {
        let (h, w) = self.cells.dim();
        let x = usize::try_from(pos.x).ok()?;
        let y = usize::try_from(pos.y).ok()?;
        if x < w && y < h {
            Some([y, x])
        } else {
            None
        }
    }

    pub fn is_within_bounds(&self, pos: Position) -> bool {
        self.index(pos).is_some()
    }

    /// Out-of-bounds cells are never empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        matches!(self.cell(pos), Some(Cell::Empty))
    }

    pub fn cell(&self, pos: Position) -> Option<Cell> {
        self.index(pos).map(|i| self.cells[i])
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn occupied_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| matches!(cell, Cell::Placed(_)))
            .count()
    }

    /// Marks every cell of `placement` as taken and appends it to the log.
    ///
    /// Nothing is written unless all cells are in bounds and empty.
    pub fn commit(&mut self, placement: Placement) -> Result<(), Rejection> {
        for &position in &placement.cells {
            match self.cell(position) {
                None => return Err(Rejection::OutOfBounds { position }),
                Some(Cell::Placed(_)) => return Err(Rejection::Overlap { position }),
                Some(Cell::Empty) => {}
            }
        }

        for &position in &placement.cells {
            if let Some(i) = self.index(position) {
                self.cells[i] = Cell::Placed(placement.shape_index);
            }
        }

        log::trace!(
            "commit shape {} at {}",
            placement.shape_index,
            placement.anchor
        );
        self.placements.push(placement);
        Ok(())
    }

    /// Reverses a previous `commit` of the same placement.
    ///
    /// Returns the removed log entry, or `None` if `placement` was never committed.
    pub fn undo(&mut self, placement: &Placement) -> Option<Placement> {
        let log_idx = self.placements.iter().rposition(|p| p == placement)?;

        for &position in &placement.cells {
            if let Some(i) = self.index(position) {
                if self.cells[i] == Cell::Placed(placement.shape_index) {
                    self.cells[i] = Cell::Empty;
                }
            }
        }

        log::trace!(
            "undo shape {} at {}",
            placement.shape_index,
            placement.anchor
        );
        Some(self.placements.remove(log_idx))
    }

    /// Row-major shape index per cell.
    pub fn occupancy(&self) -> Vec<Option<usize>> {
        self.cells
            .iter()
            .map(|cell| match cell {
                Cell::Empty => None,
                Cell::Placed(shape_idx) => Some(*shape_idx),
            })
            .collect()
    }
}

impl std::fmt::Display for GridState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (y, row) in self.cells.rows().into_iter().enumerate() {
            if y > 0 {
                writeln!(f)?;
            }
            let line = row
                .iter()
                .map(|cell| match cell {
                    Cell::Empty => '.',
                    Cell::Placed(shape_idx) => {
                        std::char::from_digit((*shape_idx % 36) as u32, 36).unwrap_or('#')
                    }
                })
                .map(String::from)
                .collect::<Vec<_>>()
                .join(" ");
            f.write_str(&line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    fn grid(width: usize, height: usize) -> GridState {
        GridState::new(GridSettings { width, height }).unwrap()
    }

    fn triangle_at(shape_index: usize, anchor: Position) -> Placement {
        let nodes = [Position::new(0, 0), Position::new(1, 0), Position::new(0, 1)];
        Placement {
            shape_index,
            anchor,
            cells: place_shape(&nodes, anchor).unwrap(),
        }
    }

    #[test]
    fn test_grid_rejects_zero_dimensions() {
        assert_matches!(
            GridState::new(GridSettings {
                width: 0,
                height: 5
            }),
            Err(Error::InvalidGridDimensions {
                width: 0,
                height: 5
            })
        );
        assert_matches!(
            GridState::new(GridSettings {
                width: 6,
                height: 0
            }),
            Err(Error::InvalidGridDimensions { .. })
        );
    }

    #[test]
    fn test_grid_rejects_dimensions_past_isize() {
        assert_matches!(
            GridState::new(GridSettings {
                width: usize::MAX,
                height: 2
            }),
            Err(Error::InvalidGridDimensions { .. })
        );
        assert_matches!(
            GridState::new(GridSettings {
                width: 1,
                height: isize::MAX as usize + 1
            }),
            Err(Error::InvalidGridDimensions { .. })
        );
        assert_matches!(
            GridSettings {
                width: 1 << (usize::BITS / 2),
                height: 1 << (usize::BITS / 2),
            }
            .validate(),
            Err(Error::InvalidGridDimensions { .. })
        );
    }

    #[test]
    fn test_bounds() {
        let grid = grid(6, 5);
        assert!(grid.is_within_bounds(Position::new(0, 0)));
        assert!(grid.is_within_bounds(Position::new(5, 4)));
        assert!(!grid.is_within_bounds(Position::new(6, 0)));
        assert!(!grid.is_within_bounds(Position::new(0, 5)));
        assert!(!grid.is_within_bounds(Position::new(-1, 0)));
        assert!(!grid.is_empty(Position::new(10, 10)));
    }

    #[test]
    fn test_place_shape_even_anchor_is_translation() {
        let nodes = [Position::new(0, 0), Position::new(1, 0), Position::new(0, 1)];
        assert_eq!(
            place_shape(&nodes, Position::new(2, 1)).unwrap(),
            vec![Position::new(2, 1), Position::new(3, 1), Position::new(2, 2)]
        );
    }

    #[test]
    fn test_place_shape_odd_anchor_shifts_odd_columns() {
        let nodes = [
            Position::new(0, 0),
            Position::new(1, 0),
            Position::new(0, 1),
            Position::new(-1, 0),
        ];
        assert_eq!(
            place_shape(&nodes, Position::new(1, 0)).unwrap(),
            vec![
                Position::new(1, 0),
                Position::new(2, 1),
                Position::new(1, 1),
                Position::new(0, 1),
            ]
        );
    }

    #[test]
    fn test_place_shape_overflow() {
        let nodes = [Position::new(0, 0), Position::new(1, 0)];

        assert_eq!(
            place_shape(&nodes, Position::new(isize::MAX, 0)),
            Err(Rejection::CoordinateOverflow {
                anchor: Position::new(isize::MAX, 0),
                node: Position::new(1, 0),
            })
        );
        assert_matches!(
            place_shape(&[Position::new(1, isize::MAX)], Position::new(1, 0)),
            Err(Rejection::CoordinateOverflow { .. })
        );
    }

    #[test]
    fn test_neighbors_at_isize_edge() {
        let corner = Position::new(isize::MAX, isize::MAX);
        assert_eq!(
            neighbors(corner).collect::<Vec<_>>(),
            vec![
                Position::new(isize::MAX, isize::MAX - 1),
                Position::new(isize::MAX - 1, isize::MAX),
            ]
        );
    }

    #[test]
    fn test_neighbors_by_parity() {
        assert_eq!(
            neighbors(Position::new(2, 2)).collect::<Vec<_>>(),
            vec![
                Position::new(3, 2),
                Position::new(3, 1),
                Position::new(2, 1),
                Position::new(1, 1),
                Position::new(1, 2),
                Position::new(2, 3),
            ]
        );
        assert_eq!(
            neighbors(Position::new(1, 2)).collect::<Vec<_>>(),
            vec![
                Position::new(2, 3),
                Position::new(2, 2),
                Position::new(1, 1),
                Position::new(0, 2),
                Position::new(0, 3),
                Position::new(1, 3),
            ]
        );
    }

    #[test]
    fn test_negative_columns_use_euclidean_parity() {
        assert_eq!(
            neighbors(Position::new(-1, 0)).collect::<Vec<_>>(),
            neighbors(Position::new(1, 0))
                .map(|p| Position::new(p.x - 2, p.y))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_commit_and_undo() {
        let mut grid = grid(6, 5);
        let placement = triangle_at(0, Position::new(1, 1));
        grid.commit(placement.clone()).unwrap();

        assert_eq!(grid.occupied_count(), 3);
        assert_eq!(grid.placements(), &[placement.clone()]);
        assert_eq!(grid.cell(Position::new(2, 2)), Some(Cell::Placed(0)));

        assert_eq!(grid.undo(&placement), Some(placement));
        assert_eq!(grid, self::grid(6, 5));
    }

    #[test]
    fn test_commit_overlap_does_not_mutate() {
        let mut grid = grid(6, 5);
        grid.commit(triangle_at(0, Position::new(1, 1))).unwrap();
        let before = grid.clone();

        assert_matches!(
            grid.commit(triangle_at(1, Position::new(1, 1))),
            Err(Rejection::Overlap { position }) if position == Position::new(1, 1)
        );
        assert_eq!(grid, before);
    }

    #[test]
    fn test_commit_out_of_bounds_does_not_mutate() {
        let mut grid = grid(2, 2);

        assert_matches!(
            grid.commit(triangle_at(0, Position::new(1, 1))),
            Err(Rejection::OutOfBounds { .. })
        );
        assert_eq!(grid.occupied_count(), 0);
        assert!(grid.placements().is_empty());
    }

    #[test]
    fn test_undo_unknown_placement() {
        let mut grid = grid(6, 5);
        grid.commit(triangle_at(0, Position::new(0, 0))).unwrap();

        assert_eq!(grid.undo(&triangle_at(0, Position::new(2, 0))), None);
        assert_eq!(grid.occupied_count(), 3);
    }

    #[test]
    fn test_display() {
        let mut grid = grid(4, 3);
        grid.commit(triangle_at(0, Position::new(0, 0))).unwrap();
        grid.commit(triangle_at(1, Position::new(2, 1))).unwrap();

        assert_eq!(
            grid.to_string(),
            "0 0 . .\n0 . 1 1\n. . 1 ."
        );
    }

    proptest! {
        #[test]
        fn neighbor_relation_is_symmetric(x in -8isize..8, y in -8isize..8) {
            let pos = Position::new(x, y);
            for n in neighbors(pos) {
                prop_assert!(are_adjacent(n, pos));
            }
        }

        #[test]
        fn commit_then_undo_restores_grid(
            first in (0isize..6, 0isize..5),
            second in (0isize..6, 0isize..5),
        ) {
            let mut grid = grid(6, 5);
            let _ = grid.commit(triangle_at(0, Position::new(first.0, first.1)));
            let before = grid.clone();

            let placement = triangle_at(1, Position::new(second.0, second.1));
            if grid.commit(placement.clone()).is_ok() {
                prop_assert_eq!(grid.undo(&placement), Some(placement));
            }
            prop_assert_eq!(grid, before);
        }
    }
}
