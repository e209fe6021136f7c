//! Item shapes, the immutable footprint descriptors supplied by the catalog.
//!
//! A shape is a bounding box plus an optional occupancy mask. The mask is
//! honoured by collision tests: a cell marked empty in the mask stays free for
//! other items even though it lies inside the bounding box. Rotation turns the
//! mask 90° clockwise, so the rotated footprint of an L-shaped item is a real
//! rotated L and not just a box with swapped sides.
//!
//! Shapes are validated once, here, at construction. Code downstream (grid,
//! solver, drag) assumes positive sizes and a sane stack limit.
//!
//! ```
//! use satchel_logic::shape::ShapeDef;
//!
//! let pistol = ShapeDef::rect("pistol", 2, 2)
//!     .mask(&["##", "#."])
//!     .weight(1.2)
//!     .rotatable()
//!     .build()
//!     .unwrap();
//! assert_eq!(pistol.footprint(false).cell_count(), 3);
//! assert!(!pistol.footprint(true).contains(0, 1));
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::MAX_GRID_SIDE;
use crate::types::ShapeId;

/// Mask character for a filled cell.
pub const MASK_FILLED: char = '#';
/// Mask character for an empty cell.
pub const MASK_EMPTY: char = '.';

/// Rejected shape data. Raised at the catalog boundary, never by the solver.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeError {
    #[error("shape `{id}` has non-positive size {width}×{height}")]
    NonPositiveSize { id: ShapeId, width: u32, height: u32 },
    #[error("shape `{id}` is {width}×{height}, larger than any grid (max side {MAX_GRID_SIDE})")]
    TooLarge { id: ShapeId, width: u32, height: u32 },
    #[error("shape `{id}` has invalid weight {weight}")]
    InvalidWeight { id: ShapeId, weight: f64 },
    #[error("shape `{id}` has a max stack size of zero")]
    ZeroStackSize { id: ShapeId },
    #[error("shape `{id}` mask is {found_w}×{found_h}, expected {width}×{height}")]
    MaskSizeMismatch {
        id: ShapeId,
        width: u32,
        height: u32,
        found_w: u32,
        found_h: u32,
    },
    #[error("shape `{id}` mask has no filled cells")]
    EmptyMask { id: ShapeId },
    #[error("shape `{id}` mask contains unexpected character {ch:?}")]
    InvalidMaskChar { id: ShapeId, ch: char },
}

fn default_stack_size() -> u32 {
    1
}

/// Raw shape record as the catalog stores it. Turned into an [`ItemShape`]
/// by [`ItemShape::new`], which validates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDef {
    pub id: ShapeId,
    pub width: u32,
    pub height: u32,
    /// Rows of `#` (filled) and `.` (empty), top row first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<Vec<String>>,
    #[serde(default)]
    pub allow_rotation: bool,
    #[serde(default)]
    pub weight: f64,
    #[serde(default = "default_stack_size")]
    pub max_stack_size: u32,
}

impl ShapeDef {
    /// A filled rectangle, weightless, not rotatable, stack size 1.
    pub fn rect(id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: ShapeId::new(id),
            width,
            height,
            mask: None,
            allow_rotation: false,
            weight: 0.0,
            max_stack_size: 1,
        }
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn rotatable(mut self) -> Self {
        self.allow_rotation = true;
        self
    }

    pub fn max_stack(mut self, max_stack_size: u32) -> Self {
        self.max_stack_size = max_stack_size;
        self
    }

    pub fn mask(mut self, rows: &[&str]) -> Self {
        self.mask = Some(rows.iter().map(|r| r.to_string()).collect());
        self
    }

    pub fn build(self) -> Result<Arc<ItemShape>, ShapeError> {
        ItemShape::new(self).map(Arc::new)
    }
}

/// A `width × height` grid of booleans, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyMask {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl OccupancyMask {
    /// Every cell filled.
    pub fn filled(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![true; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.cells[(y * self.width + x) as usize]
    }

    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }

    /// The mask turned 90° clockwise: width and height swap, and the new cell
    /// `(x, y)` comes from the old cell `(y, height - 1 - x)`.
    pub fn rotated_cw(&self) -> Self {
        let (w, h) = (self.height, self.width);
        let mut cells = Vec::with_capacity(self.cells.len());
        for y in 0..h {
            for x in 0..w {
                cells.push(self.get(y, self.height - 1 - x));
            }
        }
        Self {
            width: w,
            height: h,
            cells,
        }
    }

    fn parse(id: &ShapeId, rows: &[String]) -> Result<Self, ShapeError> {
        let height = rows.len() as u32;
        let width = rows.first().map(|r| r.chars().count() as u32).unwrap_or(0);
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for row in rows {
            if row.chars().count() as u32 != width {
                return Err(ShapeError::MaskSizeMismatch {
                    id: id.clone(),
                    width,
                    height,
                    found_w: row.chars().count() as u32,
                    found_h: height,
                });
            }
            for ch in row.chars() {
                match ch {
                    MASK_FILLED => cells.push(true),
                    MASK_EMPTY => cells.push(false),
                    other => {
                        return Err(ShapeError::InvalidMaskChar {
                            id: id.clone(),
                            ch: other,
                        })
                    }
                }
            }
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }
}

/// Effective occupancy of a shape in one orientation, with the filled cells
/// pre-listed so collision loops do not rescan the mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footprint {
    mask: OccupancyMask,
    offsets: Vec<(u32, u32)>,
}

impl Footprint {
    fn from_mask(mask: OccupancyMask) -> Self {
        let mut offsets = Vec::with_capacity(mask.filled_count());
        for y in 0..mask.height {
            for x in 0..mask.width {
                if mask.get(x, y) {
                    offsets.push((x, y));
                }
            }
        }
        Self { mask, offsets }
    }

    /// A fully filled `width × height` footprint.
    pub fn rect(width: u32, height: u32) -> Self {
        Self::from_mask(OccupancyMask::filled(width, height))
    }

    pub fn width(&self) -> u32 {
        self.mask.width
    }

    pub fn height(&self) -> u32 {
        self.mask.height
    }

    /// Bounding-box area, used for packing order.
    pub fn area(&self) -> u32 {
        self.mask.width * self.mask.height
    }

    pub fn contains(&self, dx: u32, dy: u32) -> bool {
        self.mask.get(dx, dy)
    }

    /// Relative offsets of filled cells, row-major.
    pub fn cells(&self) -> &[(u32, u32)] {
        &self.offsets
    }

    pub fn cell_count(&self) -> usize {
        self.offsets.len()
    }
}

/// Immutable item descriptor. Shared between placements as `Arc<ItemShape>`.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemShape {
    id: ShapeId,
    width: u32,
    height: u32,
    masked: bool,
    allow_rotation: bool,
    weight: f64,
    max_stack_size: u32,
    /// `[unrotated, rotated]`
    footprints: [Footprint; 2],
}

impl ItemShape {
    /// Validate a raw record and precompute both orientations.
    pub fn new(def: ShapeDef) -> Result<Self, ShapeError> {
        let ShapeDef {
            id,
            width,
            height,
            mask,
            allow_rotation,
            weight,
            max_stack_size,
        } = def;

        if width == 0 || height == 0 {
            return Err(ShapeError::NonPositiveSize { id, width, height });
        }
        if width > MAX_GRID_SIDE || height > MAX_GRID_SIDE {
            return Err(ShapeError::TooLarge { id, width, height });
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(ShapeError::InvalidWeight { id, weight });
        }
        if max_stack_size == 0 {
            return Err(ShapeError::ZeroStackSize { id });
        }

        let masked = mask.is_some();
        let mask = match mask {
            Some(rows) => {
                let parsed = OccupancyMask::parse(&id, &rows)?;
                if parsed.width != width || parsed.height != height {
                    return Err(ShapeError::MaskSizeMismatch {
                        id,
                        width,
                        height,
                        found_w: parsed.width,
                        found_h: parsed.height,
                    });
                }
                if parsed.filled_count() == 0 {
                    return Err(ShapeError::EmptyMask { id });
                }
                parsed
            }
            None => OccupancyMask::filled(width, height),
        };

        let rotated = Footprint::from_mask(mask.rotated_cw());
        let upright = Footprint::from_mask(mask);

        Ok(Self {
            id,
            width,
            height,
            masked,
            allow_rotation,
            weight,
            max_stack_size,
            footprints: [upright, rotated],
        })
    }

    pub fn id(&self) -> &ShapeId {
        &self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the shape declared an explicit mask.
    pub fn is_masked(&self) -> bool {
        self.masked
    }

    pub fn allow_rotation(&self) -> bool {
        self.allow_rotation
    }

    /// Weight of a single unit.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn max_stack_size(&self) -> u32 {
        self.max_stack_size
    }

    /// Bounding-box area in cells.
    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    /// Effective occupancy, turned 90° clockwise when `rotated`.
    pub fn footprint(&self, rotated: bool) -> &Footprint {
        &self.footprints[rotated as usize]
    }

    /// `(width, height)` after rotation.
    pub fn effective_size(&self, rotated: bool) -> (u32, u32) {
        if rotated {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }
}
