//! Placement solver: validity checks, first-fit search and auto-arrange.
//!
//! Everything here is a free function over a borrowed [`GridModel`]; the
//! solver keeps no state and can serve any number of grids.
//!
//! Search order is part of the contract: origins are scanned row-major
//! (`y` outer, `x` inner, both ascending), the unrotated orientation first and
//! the rotated one only if nothing fits upright. The same grid and shape
//! always yield the same answer.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::grid::{GridModel, PlacedItem};
use crate::shape::{Footprint, ItemShape};
use crate::types::{Cell, InstanceId, Rejection};

/// Where and how an item can go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub origin: Cell,
    pub rotated: bool,
}

/// Result of [`auto_arrange`].
#[derive(Debug, Clone, Default)]
pub struct ArrangeReport {
    /// Items back on the grid, in the order they were re-inserted.
    pub arranged: Vec<PlacedItem>,
    /// Items that found no position. They are no longer on the grid.
    pub unplaced: Vec<PlacedItem>,
}

/// Check a candidate placement: bounds, then overlap, then weight.
///
/// `exclude` names a placement whose cells and weight are ignored, so an item
/// can be tested against a spot it partly overlaps itself. Never mutates.
pub fn check_placement(
    grid: &GridModel,
    shape: &ItemShape,
    origin: Cell,
    rotated: bool,
    stack_count: u32,
    exclude: Option<InstanceId>,
) -> Result<(), Rejection> {
    grid.check_occupy(origin, shape.footprint(rotated), exclude)?;
    if !grid.weight_fits(stack_weight(shape, stack_count), exclude) {
        return Err(Rejection::WeightExceeded);
    }
    Ok(())
}

/// Boolean form of [`check_placement`].
pub fn can_place(
    grid: &GridModel,
    shape: &ItemShape,
    origin: Cell,
    rotated: bool,
    stack_count: u32,
    exclude: Option<InstanceId>,
) -> bool {
    check_placement(grid, shape, origin, rotated, stack_count, exclude).is_ok()
}

/// First valid placement in row-major order, upright before rotated.
pub fn find_first_fit(grid: &GridModel, shape: &ItemShape, stack_count: u32) -> Option<Placement> {
    find_first_fit_excluding(grid, shape, stack_count, None)
}

/// [`find_first_fit`] ignoring the cells and weight of `exclude`.
pub fn find_first_fit_excluding(
    grid: &GridModel,
    shape: &ItemShape,
    stack_count: u32,
    exclude: Option<InstanceId>,
) -> Option<Placement> {
    if !grid.weight_fits(stack_weight(shape, stack_count), exclude) {
        return None;
    }
    find_position(grid, shape, exclude)
}

/// Geometry-only first fit: same scan order as [`find_first_fit`], no weight
/// check. For moves that do not change the grid's total weight.
pub fn find_position(
    grid: &GridModel,
    shape: &ItemShape,
    exclude: Option<InstanceId>,
) -> Option<Placement> {
    let upright = shape.footprint(false);
    if let Some(origin) = scan(grid, upright, exclude) {
        return Some(Placement {
            origin,
            rotated: false,
        });
    }

    let rotated = shape.footprint(true);
    // A full square turns into itself; the second scan would repeat the first.
    if shape.allow_rotation() && rotated != upright {
        if let Some(origin) = scan(grid, rotated, exclude) {
            return Some(Placement {
                origin,
                rotated: true,
            });
        }
    }
    None
}

fn scan(grid: &GridModel, footprint: &Footprint, exclude: Option<InstanceId>) -> Option<Cell> {
    if footprint.width() > grid.width() || footprint.height() > grid.height() {
        return None;
    }
    for y in 0..=(grid.height() - footprint.height()) {
        for x in 0..=(grid.width() - footprint.width()) {
            let origin = Cell::new(x as i32, y as i32);
            if grid.try_occupy(origin, footprint, exclude) {
                return Some(origin);
            }
        }
    }
    None
}

fn stack_weight(shape: &ItemShape, stack_count: u32) -> f64 {
    shape.weight() * stack_count as f64
}

/// Find the first fit for a new stack and commit it.
///
/// `WeightExceeded` when the budget alone rules the item out,
/// `NoValidPosition` when no free spot exists in either orientation.
pub fn place(
    grid: &mut GridModel,
    shape: &Arc<ItemShape>,
    stack_count: u32,
) -> Result<PlacedItem, Rejection> {
    if !grid.weight_fits(stack_weight(shape, stack_count), None) {
        return Err(Rejection::WeightExceeded);
    }
    let placement = find_first_fit(grid, shape, stack_count).ok_or(Rejection::NoValidPosition)?;
    let id = grid.allocate_id();
    let item = PlacedItem::new(
        id,
        shape.clone(),
        placement.origin,
        placement.rotated,
        stack_count,
    );
    grid.commit_placement(item.clone());
    Ok(item)
}

/// Validate and commit a new stack at a chosen position.
///
/// # Panics
///
/// If `rotated` is requested for a shape that does not allow rotation.
pub fn place_at(
    grid: &mut GridModel,
    shape: &Arc<ItemShape>,
    origin: Cell,
    rotated: bool,
    stack_count: u32,
) -> Result<PlacedItem, Rejection> {
    assert!(
        !rotated || shape.allow_rotation(),
        "`{}` cannot be rotated",
        shape.id()
    );
    check_placement(grid, shape, origin, rotated, stack_count, None)?;
    let id = grid.allocate_id();
    let item = PlacedItem::new(id, shape.clone(), origin, rotated, stack_count);
    grid.commit_placement(item.clone());
    Ok(item)
}

/// Packing order: bounding area desc, stack weight desc, insertion order asc.
fn packing_order(a: &(usize, PlacedItem), b: &(usize, PlacedItem)) -> Ordering {
    b.1.shape
        .area()
        .cmp(&a.1.shape.area())
        .then_with(|| b.1.stack_weight().total_cmp(&a.1.stack_weight()))
        .then_with(|| a.0.cmp(&b.0))
}

/// Lift every item off the grid and re-insert them largest first.
///
/// Greedy, not optimal, but deterministic and bounded by
/// `items × cells × footprint`. Ids and stack counts survive; positions and
/// rotations are recomputed by first fit. Repacking keeps the total weight, so
/// only geometry decides whether an item comes back, even on a grid whose
/// capacity was lowered under load.
pub fn auto_arrange(grid: &mut GridModel) -> ArrangeReport {
    let mut order: Vec<(usize, PlacedItem)> = grid.clear().into_iter().enumerate().collect();
    order.sort_by(packing_order);

    let mut report = ArrangeReport::default();
    for (_, item) in order {
        match find_position(grid, &item.shape, None) {
            Some(placement) => {
                let moved = PlacedItem {
                    origin: placement.origin,
                    rotated: placement.rotated,
                    ..item
                };
                grid.reseat(moved.clone());
                report.arranged.push(moved);
            }
            None => report.unplaced.push(item),
        }
    }

    log::debug!(
        "auto-arrange placed {} item(s), {} unplaced, {} cells in use",
        report.arranged.len(),
        report.unplaced.len(),
        grid.occupied_cells()
    );
    report
}
