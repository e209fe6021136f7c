//! Drag-and-drop of a single placed item.
//!
//! ```text
//! Idle ──pick_up──▶ Holding(NoCandidate)
//! Holding ──pointer_move / rotate──▶ Holding(Valid | Invalid)   (no grid mutation)
//! Holding(Valid)   ──release──▶ Committed ─▶ Idle
//! Holding(Invalid) ──release──▶ Cancelled ─▶ Idle   (or first fit when auto-arrange-on-drop)
//! Holding          ──cancel───▶ Cancelled ─▶ Idle   (or Dropped if no spot is left)
//! ```
//!
//! While holding, the item is genuinely off the grid: its old cells are free,
//! so it can be dropped onto a spot that overlaps where it came from. The
//! grid remembers the held id, and starting a second drag on the same grid
//! panics.
//!
//! A move never changes the grid's total weight, so previews, drops and
//! restores check geometry only. An item lifted from a grid whose capacity
//! was lowered under load can still be put down again.
//!
//! The pointer cell is taken as the candidate origin (top-left of the rotated
//! bounding box). Grab offsets are a front-end concern.

use serde::{Deserialize, Serialize};

use crate::grid::{GridModel, PlacedItem};
use crate::solver::{self, Placement};
use crate::types::{Cell, InstanceId, Rejection};

/// Validity of the current drop candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Preview {
    /// Picked up, pointer has not moved yet.
    NoCandidate,
    Valid,
    Invalid(Rejection),
}

impl Preview {
    pub fn is_valid(self) -> bool {
        self == Preview::Valid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Holding(Preview),
}

/// How a drag ended. The session is idle again afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// Placed at the drop position, or by first fit when auto-arrange-on-drop
    /// rescued an invalid drop.
    Committed(PlacedItem),
    /// Put back. `relocated` is set when the original spot was gone and
    /// first fit chose a new one.
    Cancelled { item: PlacedItem, relocated: bool },
    /// Nowhere to put the item back. It is no longer on the grid and the
    /// caller owns it.
    Dropped(PlacedItem),
}

impl DragOutcome {
    pub fn item(&self) -> &PlacedItem {
        match self {
            DragOutcome::Committed(item) | DragOutcome::Dropped(item) => item,
            DragOutcome::Cancelled { item, .. } => item,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DragError {
    #[error("no item is being held")]
    NotHolding,
    #[error("an item is already being held by this session")]
    AlreadyHolding,
    #[error("item {0} is not on the grid")]
    UnknownItem(InstanceId),
    #[error("this item cannot be rotated")]
    RotationNotAllowed,
}

#[derive(Debug, Clone)]
struct Held {
    item: PlacedItem,
    home: Placement,
    candidate: Option<Cell>,
    rotated: bool,
    preview: Preview,
}

impl Held {
    fn evaluate(&mut self, grid: &GridModel) -> Preview {
        self.preview = match self.candidate {
            None => Preview::NoCandidate,
            Some(cell) => {
                let footprint = self.item.shape.footprint(self.rotated);
                match grid.check_occupy(cell, footprint, None) {
                    Ok(()) => Preview::Valid,
                    Err(reason) => Preview::Invalid(reason),
                }
            }
        };
        self.preview
    }
}

/// Interaction state for moving one item at a time on one grid.
#[derive(Debug, Clone, Default)]
pub struct DragSession {
    held: Option<Held>,
    auto_arrange_on_drop: bool,
}

impl DragSession {
    pub fn new(auto_arrange_on_drop: bool) -> Self {
        Self {
            held: None,
            auto_arrange_on_drop,
        }
    }

    pub fn state(&self) -> DragState {
        match &self.held {
            None => DragState::Idle,
            Some(held) => DragState::Holding(held.preview),
        }
    }

    pub fn is_holding(&self) -> bool {
        self.held.is_some()
    }

    /// The lifted item as it was on the grid.
    pub fn held(&self) -> Option<&PlacedItem> {
        self.held.as_ref().map(|h| &h.item)
    }

    pub fn candidate(&self) -> Option<Cell> {
        self.held.as_ref().and_then(|h| h.candidate)
    }

    /// Current orientation of the held item.
    pub fn held_rotated(&self) -> Option<bool> {
        self.held.as_ref().map(|h| h.rotated)
    }

    pub fn auto_arrange_on_drop(&self) -> bool {
        self.auto_arrange_on_drop
    }

    pub fn set_auto_arrange_on_drop(&mut self, enabled: bool) {
        self.auto_arrange_on_drop = enabled;
    }

    /// Lift `id` off the grid.
    ///
    /// # Panics
    ///
    /// If another session already holds an item on this grid.
    pub fn pick_up(&mut self, grid: &mut GridModel, id: InstanceId) -> Result<(), DragError> {
        if self.held.is_some() {
            return Err(DragError::AlreadyHolding);
        }
        if !grid.contains(id) {
            return Err(DragError::UnknownItem(id));
        }
        grid.begin_drag(id);
        let Some(item) = grid.release_placement(id) else {
            grid.end_drag();
            return Err(DragError::UnknownItem(id));
        };
        log::debug!("picked up {} from {}", id, item.origin);
        self.held = Some(Held {
            home: Placement {
                origin: item.origin,
                rotated: item.rotated,
            },
            rotated: item.rotated,
            candidate: None,
            preview: Preview::NoCandidate,
            item,
        });
        Ok(())
    }

    /// Move the drop candidate and re-evaluate it. Does not touch the grid.
    pub fn pointer_move(&mut self, grid: &GridModel, cell: Cell) -> Result<Preview, DragError> {
        let held = self.held.as_mut().ok_or(DragError::NotHolding)?;
        held.candidate = Some(cell);
        Ok(held.evaluate(grid))
    }

    /// Toggle orientation of the held item and re-evaluate the same candidate.
    pub fn rotate(&mut self, grid: &GridModel) -> Result<Preview, DragError> {
        let held = self.held.as_mut().ok_or(DragError::NotHolding)?;
        if !held.item.shape.allow_rotation() {
            return Err(DragError::RotationNotAllowed);
        }
        held.rotated = !held.rotated;
        Ok(held.evaluate(grid))
    }

    /// Drop the item. The candidate is re-checked against the grid as it is
    /// now, so a preview computed before other mutations is never trusted.
    pub fn release(&mut self, grid: &mut GridModel) -> Result<DragOutcome, DragError> {
        let mut held = self.held.take().ok_or(DragError::NotHolding)?;

        if let (Preview::Valid, Some(origin)) = (held.evaluate(grid), held.candidate) {
            let item = PlacedItem {
                origin,
                rotated: held.rotated,
                ..held.item
            };
            grid.end_drag();
            grid.reseat(item.clone());
            log::debug!("dropped {} at {}", item.id, origin);
            return Ok(DragOutcome::Committed(item));
        }

        if self.auto_arrange_on_drop {
            if let Some(placement) = solver::find_position(grid, &held.item.shape, None) {
                let item = PlacedItem {
                    origin: placement.origin,
                    rotated: placement.rotated,
                    ..held.item
                };
                grid.end_drag();
                grid.reseat(item.clone());
                log::debug!("invalid drop of {}, first fit at {}", item.id, item.origin);
                return Ok(DragOutcome::Committed(item));
            }
        }

        Ok(Self::restore(grid, held))
    }

    /// Abandon the drag and put the item back where it was.
    pub fn cancel(&mut self, grid: &mut GridModel) -> Result<DragOutcome, DragError> {
        let held = self.held.take().ok_or(DragError::NotHolding)?;
        Ok(Self::restore(grid, held))
    }

    fn restore(grid: &mut GridModel, held: Held) -> DragOutcome {
        grid.end_drag();
        let Held { item, home, .. } = held;

        if grid.try_occupy(home.origin, item.shape.footprint(home.rotated), None) {
            let item = PlacedItem {
                origin: home.origin,
                rotated: home.rotated,
                ..item
            };
            grid.reseat(item.clone());
            return DragOutcome::Cancelled {
                item,
                relocated: false,
            };
        }

        match solver::find_position(grid, &item.shape, None) {
            Some(placement) => {
                let item = PlacedItem {
                    origin: placement.origin,
                    rotated: placement.rotated,
                    ..item
                };
                log::debug!(
                    "original spot of {} is gone, restored at {}",
                    item.id,
                    item.origin
                );
                grid.reseat(item.clone());
                DragOutcome::Cancelled {
                    item,
                    relocated: true,
                }
            }
            None => {
                log::warn!(
                    "{} (`{}`) could not be put back and was dropped",
                    item.id,
                    item.shape.id()
                );
                DragOutcome::Dropped(item)
            }
        }
    }
}
