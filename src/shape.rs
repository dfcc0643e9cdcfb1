use anyhow::Context;

use crate::error::Error;
use crate::grid::Position;

/// A drawn link between two nodes of a shape. Only used for presentation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Connection {
    pub from: Position,
    pub to: Position,
}

/// A rigid polyhex given as cell offsets in its own local space.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub name: String,
    pub nodes: Vec<Position>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub color: Option<String>,
}

impl Shape {
    pub fn new(name: impl Into<String>, nodes: Vec<Position>) -> Self {
        Self {
            name: name.into(),
            nodes,
            connections: vec![],
            color: None,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.nodes.is_empty() {
            return Err(Error::EmptyShape {
                name: self.name.clone(),
            });
        }

        let mut seen = std::collections::HashSet::with_capacity(self.nodes.len());
        for &position in &self.nodes {
            if !seen.insert(position) {
                return Err(Error::DuplicateCell {
                    name: self.name.clone(),
                    position,
                });
            }
        }

        Ok(())
    }

    /// `(min_x, max_x, min_y, max_y)` over the local nodes, or `None` for an empty shape.
    pub fn bounds(&self) -> Option<(isize, isize, isize, isize)> {
        let first = self.nodes.first()?;
        Some(self.nodes.iter().fold(
            (first.x, first.x, first.y, first.y),
            |(min_x, max_x, min_y, max_y), p| {
                (min_x.min(p.x), max_x.max(p.x), min_y.min(p.y), max_y.max(p.y))
            },
        ))
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
struct ShapeFile {
    #[serde(default)]
    shapes: Vec<Shape>,
}

/// Parses a `{"shapes": [...]}` document and checks every shape in it.
pub fn load_shapes(json: &str) -> anyhow::Result<Vec<Shape>> {
    let file: ShapeFile = serde_json::from_str(json).context("malformed shape file")?;
    check_shapes(file.shapes)
}

pub fn load_shapes_from_reader(reader: impl std::io::Read) -> anyhow::Result<Vec<Shape>> {
    let file: ShapeFile = serde_json::from_reader(reader).context("malformed shape file")?;
    check_shapes(file.shapes)
}

fn check_shapes(shapes: Vec<Shape>) -> anyhow::Result<Vec<Shape>> {
    for (i, shape) in shapes.iter().enumerate() {
        shape
            .validate()
            .with_context(|| format!("invalid shape at index {}", i))?;
    }
    Ok(shapes)
}
