pub mod error;
pub mod grid;
pub mod shape;
pub mod solver;
pub mod validate;

pub use error::Error;
pub use grid::{GridSettings, GridState, Placement, Position};
pub use shape::Shape;

use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn main_js() {
    console_error_panic_hook::set_once();
    wasm_log::init(wasm_log::Config::default());
}

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

#[wasm_bindgen]
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveArgs {
    shapes: Vec<shape::Shape>,
    grid_settings: grid::GridSettings,
}

#[wasm_bindgen]
impl SolveArgs {
    #[wasm_bindgen(js_name = fromJs)]
    pub fn from_js(v: JsValue) -> Result<SolveArgs, serde_wasm_bindgen::Error> {
        serde_wasm_bindgen::from_value(v)
    }
}

#[wasm_bindgen]
pub struct Solution(solver::Solution);

#[wasm_bindgen]
impl Solution {
    #[wasm_bindgen(js_name = toJs)]
    pub fn to_js(self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.0).map_err(to_js_error)
    }
}

#[wasm_bindgen]
pub struct SolutionIterator(Box<dyn Iterator<Item = solver::Solution>>);

#[wasm_bindgen]
impl SolutionIterator {
    pub fn next(&mut self) -> Option<Solution> {
        self.0.next().map(Solution)
    }
}

#[wasm_bindgen]
pub fn solve(args: SolveArgs) -> Result<SolutionIterator, JsValue> {
    let solutions = solver::solutions(args.shapes, args.grid_settings).map_err(to_js_error)?;
    Ok(SolutionIterator(Box::new(solutions)))
}

#[wasm_bindgen]
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceAllArgs {
    shapes: Vec<shape::Shape>,
    anchors: Vec<grid::Position>,
    grid_settings: grid::GridSettings,
}

#[wasm_bindgen]
impl PlaceAllArgs {
    #[wasm_bindgen(js_name = fromJs)]
    pub fn from_js(v: JsValue) -> Result<PlaceAllArgs, serde_wasm_bindgen::Error> {
        serde_wasm_bindgen::from_value(v)
    }
}

/// Row-major shape index per cell, or `null` if some shape cannot go where it was asked.
#[wasm_bindgen(js_name = placeAll)]
pub fn place_all(args: PlaceAllArgs) -> Result<JsValue, JsValue> {
    let occupancy = match solver::place_all(&args.shapes, &args.anchors, args.grid_settings) {
        Ok(grid) => Some(grid.occupancy()),
        Err(solver::PlaceAllError::Rejected {
            shape_index,
            rejection,
        }) => {
            log::info!("shape {} rejected: {}", shape_index, rejection);
            None
        }
        Err(err) => return Err(to_js_error(err)),
    };
    serde_wasm_bindgen::to_value(&occupancy).map_err(to_js_error)
}

#[wasm_bindgen(js_name = loadShapes)]
pub fn load_shapes(json: &str) -> Result<JsValue, JsValue> {
    let shapes = shape::load_shapes(json).map_err(|err| to_js_error(format!("{:#}", err)))?;
    serde_wasm_bindgen::to_value(&shapes).map_err(to_js_error)
}
