use genawaiter::yield_;

use crate::error::Error;
use crate::grid::{place_shape, GridSettings, GridState, Placement, Position};
use crate::shape::Shape;
use crate::validate::{validate, Rejection};

/// One placement per input shape, in input order.
pub type Solution = Vec<Placement>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaceAllError {
    #[error(transparent)]
    Invalid(#[from] Error),

    #[error("got {anchors} anchors for {shapes} shapes")]
    AnchorCount { shapes: usize, anchors: usize },

    #[error("shape {shape_index} cannot be placed: {rejection}")]
    Rejected {
        shape_index: usize,
        rejection: Rejection,
    },
}

fn check_inputs(shapes: &[Shape], grid_settings: GridSettings) -> Result<(), Error> {
    grid_settings.validate()?;
    for shape in shapes {
        shape.validate()?;
    }
    Ok(())
}

/// Every anchor in the grid, columns outer and rows inner.
///
/// Validated settings always fit in `isize`.
fn anchors(grid_settings: GridSettings) -> impl Iterator<Item = Position> {
    let w = isize::try_from(grid_settings.width).unwrap_or(0);
    let h = isize::try_from(grid_settings.height).unwrap_or(0);
    (0..w).flat_map(move |x| (0..h).map(move |y| Position::new(x, y)))
}

fn search_from(
    shapes: std::rc::Rc<Vec<Shape>>,
    grid: std::rc::Rc<std::cell::RefCell<GridState>>,
    shape_idx: usize,
) -> Box<dyn Iterator<Item = Solution>> {
    Box::new(
        genawaiter::rc::gen!({
            let shape = if let Some(shape) = shapes.get(shape_idx) {
                shape
            } else {
                let solution = grid.borrow().placements().to_vec();
                yield_!(solution);
                return;
            };

            let grid_settings = grid.borrow().settings();
            for anchor in anchors(grid_settings) {
                let verdict = place_shape(&shape.nodes, anchor).and_then(|cells| {
                    validate(&shape.nodes, &cells, &grid.borrow())?;
                    Ok(cells)
                });
                let cells = match verdict {
                    Ok(cells) => cells,
                    Err(rejection) => {
                        log::trace!("shape {} at {}: {}", shape_idx, anchor, rejection);
                        continue;
                    }
                };

                let placement = Placement {
                    shape_index: shape_idx,
                    anchor,
                    cells,
                };
                if grid.borrow_mut().commit(placement.clone()).is_err() {
                    continue;
                }

                for solution in search_from(shapes.clone(), grid.clone(), shape_idx + 1) {
                    yield_!(solution);
                }

                grid.borrow_mut().undo(&placement);
            }
        })
        .into_iter(),
    )
}

/// Lazily enumerates every way to place all `shapes`, in anchor scan order.
///
/// Shapes are placed in input order; the grid is shared by the whole search and
/// each level undoes its own commit before moving to the next anchor.
pub fn solutions(
    shapes: Vec<Shape>,
    grid_settings: GridSettings,
) -> Result<impl Iterator<Item = Solution> + 'static, Error> {
    check_inputs(&shapes, grid_settings)?;
    let grid = GridState::new(grid_settings)?;
    let num_shapes = shapes.len();
    let search = search_from(
        std::rc::Rc::new(shapes),
        std::rc::Rc::new(std::cell::RefCell::new(grid)),
        0,
    );

    Ok(genawaiter::rc::gen!({
        let start_time = instant::Instant::now();
        let mut num_solutions = 0usize;

        for solution in search {
            num_solutions += 1;
            if num_solutions == 1 {
                log::info!(
                    "first solution for {} shapes on {}x{} took {:?}",
                    num_shapes,
                    grid_settings.width,
                    grid_settings.height,
                    instant::Instant::now() - start_time
                );
            }
            yield_!(solution);
        }

        log::info!(
            "search for {} shapes on {}x{} exhausted after {:?} with {} solutions",
            num_shapes,
            grid_settings.width,
            grid_settings.height,
            instant::Instant::now() - start_time,
            num_solutions
        );
    })
    .into_iter())
}

/// Finds the first placement of all `shapes`, or `None` once every anchor is exhausted.
pub fn solve(shapes: Vec<Shape>, grid_settings: GridSettings) -> Result<Option<Solution>, Error> {
    Ok(solutions(shapes, grid_settings)?.next())
}

/// Commits each shape at its given anchor, in order, and returns the filled grid.
pub fn place_all(
    shapes: &[Shape],
    anchors: &[Position],
    grid_settings: GridSettings,
) -> Result<GridState, PlaceAllError> {
    check_inputs(shapes, grid_settings)?;
    if shapes.len() != anchors.len() {
        return Err(PlaceAllError::AnchorCount {
            shapes: shapes.len(),
            anchors: anchors.len(),
        });
    }

    let mut grid = GridState::new(grid_settings)?;
    for (shape_idx, (shape, &anchor)) in shapes.iter().zip(anchors).enumerate() {
        let placed = place_shape(&shape.nodes, anchor).and_then(|cells| {
            validate(&shape.nodes, &cells, &grid)?;
            grid.commit(Placement {
                shape_index: shape_idx,
                anchor,
                cells,
            })
        });
        if let Err(rejection) = placed {
            return Err(PlaceAllError::Rejected {
                shape_index: shape_idx,
                rejection,
            });
        }
    }

    Ok(grid)
}
