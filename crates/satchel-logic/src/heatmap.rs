//! Local occupancy density, for feedback overlays only.
//!
//! Each cell gets the share of occupied cells in its 3×3 neighborhood,
//! clipped at the grid edges, so a corner cell averages over 4 cells and an
//! interior cell over 9. Placement never reads this.

use serde::{Deserialize, Serialize};

use crate::grid::GridModel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heatmap {
    width: u32,
    height: u32,
    /// Row-major, each in `0.0..=1.0`.
    values: Vec<f32>,
}

impl Heatmap {
    pub fn generate(grid: &GridModel) -> Self {
        let (w, h) = (grid.width(), grid.height());
        let mut values = Vec::with_capacity((w * h) as usize);
        for y in 0..h {
            for x in 0..w {
                let mut occupied = 0u32;
                let mut total = 0u32;
                for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                    for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                        total += 1;
                        if grid.is_occupied(nx, ny) {
                            occupied += 1;
                        }
                    }
                }
                values.push(occupied as f32 / total as f32);
            }
        }
        Self {
            width: w,
            height: h,
            values,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.values[(y * self.width + x) as usize])
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn max(&self) -> f32 {
        self.values.iter().copied().fold(0.0, f32::max)
    }
}
