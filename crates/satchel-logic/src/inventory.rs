//! One inventory context: a grid, its drag session and an event sink.
//!
//! This is the layer a game or editor talks to. It resolves catalog ids,
//! merges stacks, forwards drag input and reports every change through
//! [`PlacementEvents`]. There is no shared state between inventories; build
//! one `Inventory` per container.
//!
//! ```
//! use satchel_logic::catalog::MemoryCatalog;
//! use satchel_logic::config::GridConfig;
//! use satchel_logic::events::EventLog;
//! use satchel_logic::inventory::Inventory;
//!
//! let catalog = MemoryCatalog::from_json_str(
//!     r#"[{"id":"arrows","width":1,"height":1,"weight":0.1,"max_stack_size":20}]"#,
//! ).unwrap();
//! let mut bag = Inventory::new(&GridConfig::new(4, 4, 10.0), EventLog::new()).unwrap();
//! bag.add_item(&catalog, "arrows", 12).unwrap();
//! bag.add_item(&catalog, "arrows", 12).unwrap();
//! assert_eq!(bag.grid().placed_items().len(), 2);
//! assert_eq!(bag.grid().placed_items()[0].stack_count, 20);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::ShapeCatalog;
use crate::config::{validate_config, ConfigError, GridConfig, MAX_GRID_SIDE};
use crate::drag::{DragError, DragOutcome, DragSession, DragState, Preview};
use crate::events::PlacementEvents;
use crate::grid::{GridModel, PlacedItem};
use crate::heatmap::Heatmap;
use crate::shape::ItemShape;
use crate::solver::{self, ArrangeReport};
use crate::types::{Cell, InstanceId, Rejection, ShapeId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InventoryError {
    #[error("unknown item `{0}`")]
    UnknownItem(String),
    #[error("stack of {count} is outside 1..={max} for `{shape}`")]
    InvalidStackCount { shape: ShapeId, count: u32, max: u32 },
    #[error("item {0} is not in this inventory")]
    UnknownInstance(InstanceId),
    #[error("`{0}` cannot be rotated")]
    RotationNotAllowed(ShapeId),
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error(transparent)]
    Drag(#[from] DragError),
}

/// Where the units of an insert ended up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertOutcome {
    /// Existing stacks that were topped up, with the units each received.
    pub merged: Vec<(InstanceId, u32)>,
    /// New stack for whatever did not fit into existing ones.
    pub placed: Option<PlacedItem>,
}

#[derive(Debug)]
pub struct Inventory<E: PlacementEvents> {
    grid: GridModel,
    drag: DragSession,
    events: E,
}

impl<E: PlacementEvents> Inventory<E> {
    pub fn new(config: &GridConfig, events: E) -> Result<Self, Vec<ConfigError>> {
        let errors = validate_config(config);
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Self {
            grid: GridModel::new(config.width, config.height, config.weight_capacity),
            drag: DragSession::new(config.auto_arrange_on_drop),
            events,
        })
    }

    pub fn grid(&self) -> &GridModel {
        &self.grid
    }

    pub fn drag(&self) -> &DragSession {
        &self.drag
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut E {
        &mut self.events
    }

    /// Fresh density map of the current grid.
    pub fn heatmap(&self) -> Heatmap {
        Heatmap::generate(&self.grid)
    }

    /// Units of `shape` on the grid, across all stacks. Held items excluded.
    pub fn total_units(&self, shape: &ShapeId) -> u32 {
        self.grid
            .placed_items()
            .iter()
            .filter(|item| item.shape.id() == shape)
            .map(|item| item.stack_count)
            .sum()
    }

    fn reject<T>(&mut self, reason: Rejection) -> Result<T, InventoryError> {
        self.events.on_placement_rejected(reason);
        Err(reason.into())
    }

    fn check_count(shape: &ItemShape, count: u32) -> Result<(), InventoryError> {
        if count == 0 || count > shape.max_stack_size() {
            log::warn!(
                "rejected stack of {} for `{}` (max {})",
                count,
                shape.id(),
                shape.max_stack_size()
            );
            return Err(InventoryError::InvalidStackCount {
                shape: shape.id().clone(),
                count,
                max: shape.max_stack_size(),
            });
        }
        Ok(())
    }

    /// Resolve `item_id` through the catalog and [`insert`](Self::insert) it.
    pub fn add_item(
        &mut self,
        catalog: &dyn ShapeCatalog,
        item_id: &str,
        count: u32,
    ) -> Result<InsertOutcome, InventoryError> {
        let Some(shape) = catalog.get_shape(item_id) else {
            log::warn!("catalog has no item `{item_id}`");
            return Err(InventoryError::UnknownItem(item_id.to_string()));
        };
        self.insert(shape, count)
    }

    /// Add `count` units: top up existing stacks of the same shape in
    /// insertion order, then place the rest as one new stack by first fit.
    ///
    /// All or nothing: on rejection the grid is unchanged.
    pub fn insert(
        &mut self,
        shape: Arc<ItemShape>,
        count: u32,
    ) -> Result<InsertOutcome, InventoryError> {
        Self::check_count(&shape, count)?;
        if !self.grid.weight_fits(shape.weight() * count as f64, None) {
            return self.reject(Rejection::WeightExceeded);
        }

        let mut remaining = count;
        let mut plan = Vec::new();
        for item in self.grid.placed_items() {
            if remaining == 0 {
                break;
            }
            if item.shape.id() != shape.id() || item.stack_count >= shape.max_stack_size() {
                continue;
            }
            let take = remaining.min(shape.max_stack_size() - item.stack_count);
            plan.push((item.id, item.stack_count + take, take));
            remaining -= take;
        }

        let placement = if remaining > 0 {
            match solver::find_position(&self.grid, &shape, None) {
                Some(p) => Some(p),
                None => return self.reject(Rejection::NoValidPosition),
            }
        } else {
            None
        };

        let mut outcome = InsertOutcome::default();
        for (id, new_count, take) in plan {
            self.grid.set_stack_count(id, new_count)?;
            self.events.on_stack_changed(id, new_count);
            outcome.merged.push((id, take));
        }
        if let Some(p) = placement {
            let id = self.grid.allocate_id();
            let item = PlacedItem::new(id, shape, p.origin, p.rotated, remaining);
            self.grid.commit_placement(item.clone());
            self.events.on_item_placed(&item);
            outcome.placed = Some(item);
        }
        Ok(outcome)
    }

    /// Place a new stack at a chosen spot, without merging.
    pub fn insert_at(
        &mut self,
        shape: Arc<ItemShape>,
        count: u32,
        origin: Cell,
        rotated: bool,
    ) -> Result<PlacedItem, InventoryError> {
        Self::check_count(&shape, count)?;
        if rotated && !shape.allow_rotation() {
            return Err(InventoryError::RotationNotAllowed(shape.id().clone()));
        }
        match solver::place_at(&mut self.grid, &shape, origin, rotated, count) {
            Ok(item) => {
                self.events.on_item_placed(&item);
                Ok(item)
            }
            Err(reason) => self.reject(reason),
        }
    }

    pub fn remove(&mut self, id: InstanceId) -> Result<PlacedItem, InventoryError> {
        if !self.grid.contains(id) {
            return Err(InventoryError::UnknownInstance(id));
        }
        let item = self
            .grid
            .release_placement(id)
            .ok_or(InventoryError::UnknownInstance(id))?;
        self.events.on_item_removed(id);
        Ok(item)
    }

    /// Move `count` units out of a stack into a new stack placed by first fit.
    pub fn split_stack(&mut self, id: InstanceId, count: u32) -> Result<PlacedItem, InventoryError> {
        let source = self
            .grid
            .get(id)
            .cloned()
            .ok_or(InventoryError::UnknownInstance(id))?;
        if count == 0 || count >= source.stack_count {
            return Err(InventoryError::InvalidStackCount {
                shape: source.shape.id().clone(),
                count,
                max: source.stack_count.saturating_sub(1),
            });
        }
        // Total weight is unchanged by a split, but an over-budget grid
        // (capacity lowered under load) must not gain new placements.
        if !self.grid.weight_fits(0.0, None) {
            return self.reject(Rejection::WeightExceeded);
        }
        let Some(placement) = solver::find_position(&self.grid, &source.shape, None) else {
            return self.reject(Rejection::NoValidPosition);
        };

        let kept = source.stack_count - count;
        self.grid.set_stack_count(id, kept)?;
        self.events.on_stack_changed(id, kept);

        let new_id = self.grid.allocate_id();
        let item = PlacedItem::new(
            new_id,
            source.shape,
            placement.origin,
            placement.rotated,
            count,
        );
        self.grid.commit_placement(item.clone());
        self.events.on_item_placed(&item);
        Ok(item)
    }

    /// Repack everything largest first. Items that moved are re-announced;
    /// items left without a spot are removed and returned in the report.
    pub fn auto_arrange(&mut self) -> ArrangeReport {
        let before: HashMap<InstanceId, (Cell, bool)> = self
            .grid
            .placed_items()
            .iter()
            .map(|item| (item.id, (item.origin, item.rotated)))
            .collect();

        let report = solver::auto_arrange(&mut self.grid);
        for item in &report.arranged {
            if before.get(&item.id) != Some(&(item.origin, item.rotated)) {
                self.events.on_item_placed(item);
            }
        }
        for item in &report.unplaced {
            self.events.on_item_removed(item.id);
        }
        report
    }

    /// Resize the grid. Items that no longer fit are removed and returned so
    /// the caller can re-offer them.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<Vec<PlacedItem>, ConfigError> {
        if width == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        if height == 0 {
            return Err(ConfigError::ZeroHeight);
        }
        if width > MAX_GRID_SIDE || height > MAX_GRID_SIDE {
            return Err(ConfigError::GridTooLarge(width, height));
        }
        let dropped = self.grid.resize(width, height);
        for item in &dropped {
            self.events.on_item_removed(item.id);
        }
        Ok(dropped)
    }

    pub fn set_weight_capacity(&mut self, weight_capacity: f64) -> Result<(), ConfigError> {
        if !weight_capacity.is_finite() || weight_capacity < 0.0 {
            return Err(ConfigError::InvalidCapacity(weight_capacity));
        }
        self.grid.set_weight_capacity(weight_capacity);
        Ok(())
    }

    pub fn set_auto_arrange_on_drop(&mut self, enabled: bool) {
        self.drag.set_auto_arrange_on_drop(enabled);
    }

    pub fn pick_up(&mut self, id: InstanceId) -> Result<(), InventoryError> {
        self.drag.pick_up(&mut self.grid, id)?;
        self.events.on_item_removed(id);
        Ok(())
    }

    pub fn pointer_move(&mut self, cell: Cell) -> Result<Preview, InventoryError> {
        Ok(self.drag.pointer_move(&self.grid, cell)?)
    }

    pub fn rotate_held(&mut self) -> Result<Preview, InventoryError> {
        Ok(self.drag.rotate(&self.grid)?)
    }

    /// Drop the held item. A refused drop reports its reason before the item
    /// is put back.
    pub fn release(&mut self) -> Result<DragOutcome, InventoryError> {
        let preview = match self.drag.state() {
            DragState::Holding(preview) => preview,
            DragState::Idle => return Err(DragError::NotHolding.into()),
        };
        let outcome = self.drag.release(&mut self.grid)?;
        if let Preview::Invalid(reason) = preview {
            self.events.on_placement_rejected(reason);
        }
        self.announce(&outcome);
        Ok(outcome)
    }

    pub fn cancel_drag(&mut self) -> Result<DragOutcome, InventoryError> {
        let outcome = self.drag.cancel(&mut self.grid)?;
        self.announce(&outcome);
        Ok(outcome)
    }

    fn announce(&mut self, outcome: &DragOutcome) {
        match outcome {
            DragOutcome::Committed(item) | DragOutcome::Cancelled { item, .. } => {
                self.events.on_item_placed(item);
            }
            DragOutcome::Dropped(_) => self.events.on_placement_rejected(Rejection::NoValidPosition),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::events::{EventLog, PlacementEvent};
    use crate::shape::ShapeDef;

    const CATALOG: &str = r#"[
        { "id": "arrows", "width": 1, "height": 1, "weight": 0.5, "max_stack_size": 10 },
        { "id": "bedroll", "width": 3, "height": 1, "weight": 2.0, "allow_rotation": true },
        { "id": "cauldron", "width": 2, "height": 2, "weight": 9.0 }
    ]"#;

    fn setup(width: u32, height: u32, capacity: f64) -> (MemoryCatalog, Inventory<EventLog>) {
        let catalog = MemoryCatalog::from_json_str(CATALOG).unwrap();
        let inv = Inventory::new(&GridConfig::new(width, height, capacity), EventLog::new())
            .unwrap();
        (catalog, inv)
    }

    #[test]
    fn test_invalid_config_rejected() {
        let errors = Inventory::new(&GridConfig::new(0, 3, 1.0), EventLog::new())
            .err()
            .unwrap();
        assert_eq!(errors, vec![ConfigError::ZeroWidth]);
    }

    #[test]
    fn test_add_item_places_and_announces() {
        let (catalog, mut inv) = setup(4, 4, 100.0);
        let outcome = inv.add_item(&catalog, "cauldron", 1).unwrap();
        let item = outcome.placed.unwrap();
        assert_eq!(item.origin, Cell::ORIGIN);
        assert!(outcome.merged.is_empty());
        assert!(matches!(
            inv.events().events[0],
            PlacementEvent::Placed { id, .. } if id == item.id
        ));
    }

    #[test]
    fn test_unknown_item() {
        let (catalog, mut inv) = setup(4, 4, 100.0);
        assert_eq!(
            inv.add_item(&catalog, "dragon", 1),
            Err(InventoryError::UnknownItem("dragon".into()))
        );
    }

    #[test]
    fn test_stack_count_bounds() {
        let (catalog, mut inv) = setup(4, 4, 100.0);
        assert!(matches!(
            inv.add_item(&catalog, "arrows", 11),
            Err(InventoryError::InvalidStackCount { count: 11, max: 10, .. })
        ));
        assert!(matches!(
            inv.add_item(&catalog, "arrows", 0),
            Err(InventoryError::InvalidStackCount { count: 0, .. })
        ));
        assert!(inv.grid().placed_items().is_empty());
    }

    #[test]
    fn test_stacks_merge_before_placing() {
        let (catalog, mut inv) = setup(4, 4, 100.0);
        let first = inv.add_item(&catalog, "arrows", 6).unwrap().placed.unwrap();
        let second = inv.add_item(&catalog, "arrows", 7).unwrap();
        assert_eq!(second.merged, vec![(first.id, 4)]);
        assert_eq!(second.placed.as_ref().unwrap().stack_count, 3);
        assert_eq!(inv.total_units(&ShapeId::new("arrows")), 13);
        assert!((inv.grid().current_weight() - 6.5).abs() < 1e-9);
    }

    #[test]
    fn test_merge_fully_absorbed() {
        let (catalog, mut inv) = setup(4, 4, 100.0);
        inv.add_item(&catalog, "arrows", 2).unwrap();
        let outcome = inv.add_item(&catalog, "arrows", 3).unwrap();
        assert!(outcome.placed.is_none());
        assert_eq!(inv.grid().placed_items().len(), 1);
        assert_eq!(inv.grid().placed_items()[0].stack_count, 5);
    }

    #[test]
    fn test_insert_is_all_or_nothing() {
        let (catalog, mut inv) = setup(1, 1, 100.0);
        inv.add_item(&catalog, "arrows", 8).unwrap();
        let err = inv.add_item(&catalog, "arrows", 5).unwrap_err();
        assert_eq!(err, InventoryError::Rejected(Rejection::NoValidPosition));
        assert_eq!(inv.grid().placed_items()[0].stack_count, 8);
        assert_eq!(
            inv.events().rejections().collect::<Vec<_>>(),
            vec![Rejection::NoValidPosition]
        );
    }

    #[test]
    fn test_weight_rejection_reported() {
        let (catalog, mut inv) = setup(4, 4, 10.0);
        inv.add_item(&catalog, "cauldron", 1).unwrap();
        let err = inv.add_item(&catalog, "bedroll", 1).unwrap_err();
        assert_eq!(err, InventoryError::Rejected(Rejection::WeightExceeded));
        assert!((inv.grid().current_weight() - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_insert_at_reasons() {
        let (catalog, mut inv) = setup(4, 4, 100.0);
        let cauldron = catalog.get_shape("cauldron").unwrap();
        inv.insert_at(cauldron.clone(), 1, Cell::new(1, 1), false).unwrap();
        assert_eq!(
            inv.insert_at(cauldron.clone(), 1, Cell::new(2, 2), false),
            Err(InventoryError::Rejected(Rejection::Overlap))
        );
        assert_eq!(
            inv.insert_at(cauldron.clone(), 1, Cell::new(3, 0), false),
            Err(InventoryError::Rejected(Rejection::OutOfBounds))
        );
        assert_eq!(
            inv.insert_at(cauldron, 1, Cell::new(0, 0), true),
            Err(InventoryError::RotationNotAllowed(ShapeId::new("cauldron")))
        );
    }

    #[test]
    fn test_remove() {
        let (catalog, mut inv) = setup(4, 4, 100.0);
        let item = inv.add_item(&catalog, "bedroll", 1).unwrap().placed.unwrap();
        inv.remove(item.id).unwrap();
        assert_eq!(inv.grid().current_weight(), 0.0);
        assert_eq!(
            inv.remove(item.id),
            Err(InventoryError::UnknownInstance(item.id))
        );
        assert_eq!(
            inv.events().events.last(),
            Some(&PlacementEvent::Removed(item.id))
        );
    }

    #[test]
    fn test_split_stack() {
        let (catalog, mut inv) = setup(4, 4, 100.0);
        let stack = inv.add_item(&catalog, "arrows", 9).unwrap().placed.unwrap();
        let split = inv.split_stack(stack.id, 4).unwrap();
        assert_eq!(split.stack_count, 4);
        assert_eq!(split.origin, Cell::new(1, 0));
        assert_eq!(inv.grid().get(stack.id).unwrap().stack_count, 5);
        assert!((inv.grid().current_weight() - 4.5).abs() < 1e-9);

        assert!(matches!(
            inv.split_stack(stack.id, 5),
            Err(InventoryError::InvalidStackCount { .. })
        ));
    }

    #[test]
    fn test_split_without_room() {
        let (catalog, mut inv) = setup(1, 1, 100.0);
        let stack = inv.add_item(&catalog, "arrows", 9).unwrap().placed.unwrap();
        assert_eq!(
            inv.split_stack(stack.id, 3),
            Err(InventoryError::Rejected(Rejection::NoValidPosition))
        );
        assert_eq!(inv.grid().get(stack.id).unwrap().stack_count, 9);
    }

    #[test]
    fn test_auto_arrange_announces_moves_only() {
        let (catalog, mut inv) = setup(4, 4, 100.0);
        let arrows = catalog.get_shape("arrows").unwrap();
        let cauldron = catalog.get_shape("cauldron").unwrap();
        let a = inv.insert_at(arrows, 1, Cell::new(0, 0), false).unwrap();
        let c = inv.insert_at(cauldron, 1, Cell::new(2, 2), false).unwrap();
        inv.events_mut().drain();

        let report = inv.auto_arrange();
        assert!(report.unplaced.is_empty());
        let moved: Vec<_> = inv
            .events()
            .events
            .iter()
            .filter_map(|e| match e {
                PlacementEvent::Placed { id, .. } => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(moved, vec![c.id, a.id]);
    }

    #[test]
    fn test_resize_reports_dropped() {
        let (catalog, mut inv) = setup(4, 4, 100.0);
        let cauldron = catalog.get_shape("cauldron").unwrap();
        let far = inv.insert_at(cauldron, 1, Cell::new(2, 2), false).unwrap();
        let dropped = inv.resize(3, 3).unwrap();
        assert_eq!(dropped.len(), 1);
        assert_eq!(
            inv.events().events.last(),
            Some(&PlacementEvent::Removed(far.id))
        );
        assert_eq!(inv.resize(0, 3), Err(ConfigError::ZeroWidth));
    }

    #[test]
    fn test_capacity_change() {
        let (catalog, mut inv) = setup(4, 4, 100.0);
        inv.add_item(&catalog, "cauldron", 1).unwrap();
        inv.set_weight_capacity(5.0).unwrap();
        assert_eq!(inv.grid().placed_items().len(), 1);
        assert_eq!(
            inv.add_item(&catalog, "arrows", 1),
            Err(InventoryError::Rejected(Rejection::WeightExceeded))
        );
        assert!(inv.set_weight_capacity(f64::NAN).is_err());
    }

    #[test]
    fn test_drag_flow_events() {
        let (catalog, mut inv) = setup(4, 4, 100.0);
        let bed = inv.add_item(&catalog, "bedroll", 1).unwrap().placed.unwrap();
        inv.events_mut().drain();

        inv.pick_up(bed.id).unwrap();
        assert_eq!(inv.pointer_move(Cell::new(3, 0)).unwrap(), Preview::Invalid(Rejection::OutOfBounds));
        assert_eq!(inv.rotate_held().unwrap(), Preview::Valid);
        let outcome = inv.release().unwrap();
        assert!(matches!(outcome, DragOutcome::Committed(_)));

        let events = inv.events_mut().drain();
        assert_eq!(events[0], PlacementEvent::Removed(bed.id));
        assert!(matches!(
            events[1],
            PlacementEvent::Placed { rotated: true, origin: Cell { x: 3, y: 0 }, .. }
        ));
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_refused_drop_reports_reason() {
        let (catalog, mut inv) = setup(4, 4, 100.0);
        let bed = inv.add_item(&catalog, "bedroll", 1).unwrap().placed.unwrap();
        inv.pick_up(bed.id).unwrap();
        inv.pointer_move(Cell::new(2, 3)).unwrap();
        let outcome = inv.release().unwrap();
        assert!(matches!(outcome, DragOutcome::Cancelled { relocated: false, .. }));
        assert_eq!(
            inv.events().rejections().collect::<Vec<_>>(),
            vec![Rejection::OutOfBounds]
        );
        assert_eq!(inv.grid().get(bed.id).unwrap().origin, Cell::ORIGIN);
    }

    #[test]
    fn test_cancel_drag_restores() {
        let (catalog, mut inv) = setup(4, 4, 100.0);
        let bed = inv.add_item(&catalog, "bedroll", 1).unwrap().placed.unwrap();
        inv.pick_up(bed.id).unwrap();
        assert_eq!(inv.grid().current_weight(), 0.0);
        inv.cancel_drag().unwrap();
        assert!((inv.grid().current_weight() - 2.0).abs() < 1e-9);
        assert_eq!(inv.release(), Err(InventoryError::Drag(DragError::NotHolding)));
    }

    #[test]
    fn test_heatmap_tracks_grid() {
        let (catalog, mut inv) = setup(3, 3, 100.0);
        assert_eq!(inv.heatmap().max(), 0.0);
        inv.add_item(&catalog, "cauldron", 1).unwrap();
        assert!((inv.heatmap().get(0, 0).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rotated_insert_when_only_vertical_room() {
        let (catalog, mut inv) = setup(2, 3, 100.0);
        let bedroll = catalog.get_shape("bedroll").unwrap();
        let outcome = inv.insert(bedroll, 1).unwrap();
        assert!(outcome.placed.unwrap().rotated);
    }

    #[test]
    fn test_insert_prebuilt_shape() {
        let (_, mut inv) = setup(4, 4, 100.0);
        let lantern = ShapeDef::rect("lantern", 1, 2).weight(1.0).build().unwrap();
        let outcome = inv.insert(lantern, 1).unwrap();
        assert_eq!(outcome.placed.unwrap().origin, Cell::ORIGIN);
        assert_eq!(inv.total_units(&ShapeId::new("lantern")), 1);
    }
}
