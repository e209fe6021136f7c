//! Grid occupancy state: which item owns which cell, and the running weight.
//!
//! `GridModel` owns no item metadata beyond the placement records themselves;
//! shapes are shared `Arc`s from the catalog. It answers occupancy queries and
//! applies mutations that the solver has already validated.
//!
//! Invariants held after every mutating call:
//! - no cell is claimed by two placements (masks included)
//! - every footprint's bounding box lies inside the grid
//! - `current_weight()` is the sum of `stack_count × weight` over all items,
//!   recomputed from the item list so it cannot drift
//!
//! Committing a placement that fails these checks is a bug in the caller and
//! panics. Releasing an unknown id is logged and ignored.

use std::sync::Arc;

use crate::config::MAX_GRID_SIDE;
use crate::shape::{Footprint, ItemShape};
use crate::types::{Cell, InstanceId, Rejection};

/// Slack for comparing summed `f64` weights against the capacity.
pub const WEIGHT_EPSILON: f64 = 1e-9;

/// One item (or stack of items) sitting on a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedItem {
    pub id: InstanceId,
    pub shape: Arc<ItemShape>,
    /// Top-left of the (rotated) bounding box.
    pub origin: Cell,
    pub rotated: bool,
    pub stack_count: u32,
}

impl PlacedItem {
    pub fn new(
        id: InstanceId,
        shape: Arc<ItemShape>,
        origin: Cell,
        rotated: bool,
        stack_count: u32,
    ) -> Self {
        assert!(
            (1..=shape.max_stack_size()).contains(&stack_count),
            "stack count {} outside 1..={} for `{}`",
            stack_count,
            shape.max_stack_size(),
            shape.id()
        );
        Self {
            id,
            shape,
            origin,
            rotated,
            stack_count,
        }
    }

    pub fn footprint(&self) -> &Footprint {
        self.shape.footprint(self.rotated)
    }

    pub fn stack_weight(&self) -> f64 {
        self.shape.weight() * self.stack_count as f64
    }

    /// Absolute grid cells covered by this item.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let origin = self.origin;
        self.footprint()
            .cells()
            .iter()
            .map(move |&(dx, dy)| origin.offset(dx, dy))
    }
}

/// Mutable occupancy state for one inventory.
#[derive(Debug, Clone)]
pub struct GridModel {
    width: u32,
    height: u32,
    /// Row-major, `y * width + x`.
    cells: Vec<Option<InstanceId>>,
    weight_capacity: f64,
    current_weight: f64,
    /// Insertion order is kept; it breaks ties in auto-arrange.
    items: Vec<PlacedItem>,
    next_id: u64,
    active_drag: Option<InstanceId>,
}

impl GridModel {
    pub fn new(width: u32, height: u32, weight_capacity: f64) -> Self {
        assert!(width > 0 && height > 0, "grid must be at least 1×1");
        assert!(
            width <= MAX_GRID_SIDE && height <= MAX_GRID_SIDE,
            "grid {width}×{height} exceeds the maximum side of {MAX_GRID_SIDE}"
        );
        assert!(
            weight_capacity.is_finite() && weight_capacity >= 0.0,
            "weight capacity must be finite and non-negative, got {weight_capacity}"
        );
        Self {
            width,
            height,
            cells: vec![None; (width * height) as usize],
            weight_capacity,
            current_weight: 0.0,
            items: Vec::new(),
            next_id: 1,
            active_drag: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn weight_capacity(&self) -> f64 {
        self.weight_capacity
    }

    pub fn current_weight(&self) -> f64 {
        self.current_weight
    }

    pub fn remaining_capacity(&self) -> f64 {
        (self.weight_capacity - self.current_weight).max(0.0)
    }

    /// Placed items in insertion order.
    pub fn placed_items(&self) -> &[PlacedItem] {
        &self.items
    }

    pub fn get(&self, id: InstanceId) -> Option<&PlacedItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.get(id).is_some()
    }

    /// The item claiming `cell`, if any. Off-grid cells report `None`.
    pub fn occupant(&self, cell: Cell) -> Option<InstanceId> {
        self.index(cell).and_then(|i| self.cells[i])
    }

    pub fn is_occupied(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.cells[(y * self.width + x) as usize].is_some()
    }

    /// Number of claimed cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Item currently lifted by a drag session, if any.
    pub fn active_drag(&self) -> Option<InstanceId> {
        self.active_drag
    }

    /// Hand out a fresh id. Ids are never reused on one grid.
    pub fn allocate_id(&mut self) -> InstanceId {
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        id
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        if cell.x < 0 || cell.y < 0 {
            return None;
        }
        let (x, y) = (cell.x as u32, cell.y as u32);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y * self.width + x) as usize)
    }

    fn in_bounds(&self, origin: Cell, footprint: &Footprint) -> bool {
        origin.x >= 0
            && origin.y >= 0
            && origin.x as i64 + footprint.width() as i64 <= self.width as i64
            && origin.y as i64 + footprint.height() as i64 <= self.height as i64
    }

    /// Whether `footprint` at `origin` stays on the grid and only touches cells
    /// that are free or owned by `exclude`. Pure query.
    pub fn try_occupy(&self, origin: Cell, footprint: &Footprint, exclude: Option<InstanceId>) -> bool {
        self.check_occupy(origin, footprint, exclude).is_ok()
    }

    /// [`try_occupy`](Self::try_occupy) with the reason for a refusal.
    pub fn check_occupy(
        &self,
        origin: Cell,
        footprint: &Footprint,
        exclude: Option<InstanceId>,
    ) -> Result<(), Rejection> {
        if !self.in_bounds(origin, footprint) {
            return Err(Rejection::OutOfBounds);
        }
        let (ox, oy) = (origin.x as u32, origin.y as u32);
        for &(dx, dy) in footprint.cells() {
            let idx = ((oy + dy) * self.width + ox + dx) as usize;
            match self.cells[idx] {
                Some(owner) if Some(owner) != exclude => return Err(Rejection::Overlap),
                _ => {}
            }
        }
        Ok(())
    }

    /// Whether adding `additional` weight fits, ignoring the stack of `exclude`.
    pub fn weight_fits(&self, additional: f64, exclude: Option<InstanceId>) -> bool {
        let excluded = exclude
            .and_then(|id| self.get(id))
            .map(PlacedItem::stack_weight)
            .unwrap_or(0.0);
        self.current_weight - excluded + additional <= self.weight_capacity + WEIGHT_EPSILON
    }

    /// Put a validated placement on the grid.
    ///
    /// # Panics
    ///
    /// If the id is already placed, the footprint is blocked or off-grid, or
    /// the weight would exceed capacity. Validate with the solver first.
    pub fn commit_placement(&mut self, item: PlacedItem) {
        self.assert_free(&item);
        assert!(
            self.weight_fits(item.stack_weight(), None),
            "commit of {} exceeds weight capacity ({} + {} > {})",
            item.id,
            self.current_weight,
            item.stack_weight(),
            self.weight_capacity
        );
        self.occupy(item);
    }

    /// Put back an item whose weight this grid already carried before it was
    /// lifted (a drag or a repack). Only occupancy is checked, so an
    /// over-budget grid can still move what it holds.
    ///
    /// # Panics
    ///
    /// If the id is already placed or the footprint is blocked or off-grid.
    pub(crate) fn reseat(&mut self, item: PlacedItem) {
        self.assert_free(&item);
        self.occupy(item);
    }

    fn assert_free(&self, item: &PlacedItem) {
        assert!(
            !self.contains(item.id),
            "placement {} is already on the grid",
            item.id
        );
        if let Err(reason) = self.check_occupy(item.origin, item.footprint(), None) {
            panic!(
                "commit of {} at {} without a valid occupancy check: {reason}",
                item.id, item.origin
            );
        }
    }

    fn occupy(&mut self, item: PlacedItem) {
        for cell in item.cells() {
            if let Some(idx) = self.index(cell) {
                self.cells[idx] = Some(item.id);
            }
        }
        self.next_id = self.next_id.max(item.id.0 + 1);
        self.items.push(item);
        self.recompute_weight();
    }

    /// Take an item off the grid. Unknown ids mean the caller's view of the
    /// grid is out of sync; that is logged and nothing changes.
    pub fn release_placement(&mut self, id: InstanceId) -> Option<PlacedItem> {
        let Some(pos) = self.items.iter().position(|item| item.id == id) else {
            log::error!("release of {id} which is not on the grid");
            return None;
        };
        let item = self.items.remove(pos);
        for cell in item.cells() {
            if let Some(idx) = self.index(cell) {
                self.cells[idx] = None;
            }
        }
        self.recompute_weight();
        Some(item)
    }

    /// Remove every item, returning them in insertion order.
    pub fn clear(&mut self) -> Vec<PlacedItem> {
        self.cells.iter_mut().for_each(|c| *c = None);
        let items = std::mem::take(&mut self.items);
        self.recompute_weight();
        items
    }

    /// Replace the cell array with a `width × height` one. Items that no
    /// longer fit entirely are removed and returned; the rest keep their cells.
    pub fn resize(&mut self, width: u32, height: u32) -> Vec<PlacedItem> {
        assert!(width > 0 && height > 0, "grid must be at least 1×1");
        assert!(
            width <= MAX_GRID_SIDE && height <= MAX_GRID_SIDE,
            "grid {width}×{height} exceeds the maximum side of {MAX_GRID_SIDE}"
        );
        let (kept, dropped): (Vec<_>, Vec<_>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|item| {
                item.origin.x as i64 + item.footprint().width() as i64 <= width as i64
                    && item.origin.y as i64 + item.footprint().height() as i64 <= height as i64
            });

        self.width = width;
        self.height = height;
        self.cells = vec![None; (width * height) as usize];
        for item in &kept {
            for cell in item.cells() {
                if let Some(idx) = self.index(cell) {
                    self.cells[idx] = Some(item.id);
                }
            }
        }
        self.items = kept;
        self.recompute_weight();

        if !dropped.is_empty() {
            log::info!(
                "resize to {}×{} dropped {} item(s), weight now {:.2}",
                width,
                height,
                dropped.len(),
                self.current_weight
            );
        }
        dropped
    }

    /// Change the weight budget. Lowering it below the current load evicts
    /// nothing; it only blocks further additions.
    pub fn set_weight_capacity(&mut self, weight_capacity: f64) {
        assert!(
            weight_capacity.is_finite() && weight_capacity >= 0.0,
            "weight capacity must be finite and non-negative, got {weight_capacity}"
        );
        self.weight_capacity = weight_capacity;
    }

    /// Change the unit count of a placed stack. Growing is checked against the
    /// weight budget; shrinking always succeeds.
    ///
    /// # Panics
    ///
    /// If `id` is not placed or `count` is outside `1..=max_stack_size`.
    pub fn set_stack_count(&mut self, id: InstanceId, count: u32) -> Result<(), Rejection> {
        let Some(pos) = self.items.iter().position(|item| item.id == id) else {
            panic!("stack update for {id} which is not on the grid");
        };
        let item = &self.items[pos];
        assert!(
            (1..=item.shape.max_stack_size()).contains(&count),
            "stack count {} outside 1..={} for `{}`",
            count,
            item.shape.max_stack_size(),
            item.shape.id()
        );
        let new_weight = item.shape.weight() * count as f64;
        if count > item.stack_count && !self.weight_fits(new_weight, Some(id)) {
            return Err(Rejection::WeightExceeded);
        }
        self.items[pos].stack_count = count;
        self.recompute_weight();
        Ok(())
    }

    pub(crate) fn begin_drag(&mut self, id: InstanceId) {
        if let Some(held) = self.active_drag {
            panic!("drag of {id} started while {held} is already held on this grid");
        }
        self.active_drag = Some(id);
    }

    pub(crate) fn end_drag(&mut self) {
        self.active_drag = None;
    }

    fn recompute_weight(&mut self) {
        self.current_weight = self.items.iter().map(PlacedItem::stack_weight).sum();
    }
}
