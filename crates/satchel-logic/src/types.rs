//! Small value types shared by every module: grid coordinates, placement ids,
//! shape ids and the placement rejection reasons.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A grid coordinate. `x` grows to the right, `y` grows downward.
///
/// Signed so that pointer positions dragged off the grid can still be
/// represented; such cells never validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const ORIGIN: Cell = Cell { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: u32, dy: u32) -> Cell {
        Cell {
            x: self.x.saturating_add(dx as i32),
            y: self.y.saturating_add(dy as i32),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Identity of one placement on one grid. Allocated by the grid and stable
/// while the item stays on it, including while it is held by a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Catalog identity of an item shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(pub String);

impl ShapeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShapeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Why a placement was refused. These are ordinary outcomes that UI code
/// branches on ("too heavy" vs "doesn't fit"), never panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum Rejection {
    #[error("item footprint leaves the grid")]
    OutOfBounds,
    #[error("item footprint overlaps another item")]
    Overlap,
    #[error("item would exceed the weight capacity")]
    WeightExceeded,
    #[error("no free position fits the item")]
    NoValidPosition,
}
