//! Property-based invariant tests for grid placement.
//!
//! These tests drive random operation sequences and check that:
//!
//! 1. No two placed items share a cell, and every item stays on the grid.
//! 2. `current_weight` equals the sum of stack weights and never exceeds capacity.
//! 3. `find_first_fit` is deterministic for identical grids.
//! 4. Pick-up followed by cancel restores occupancy and weight exactly.
//! 5. `can_place` never mutates the grid.
//! 6. Auto-arrange accounts for every item, and keeps the occupied-cell
//!    count whenever nothing is left over.
//! 7. Lowering capacity under load never costs an item: cancel still restores
//!    the exact grid and auto-arrange packs exactly as with room to spare.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use proptest::prelude::*;
use satchel_logic::drag::{DragOutcome, DragSession};
use satchel_logic::grid::{GridModel, PlacedItem};
use satchel_logic::shape::{ItemShape, ShapeDef};
use satchel_logic::solver;
use satchel_logic::types::{Cell, InstanceId};

// ── Helpers ─────────────────────────────────────────────────────────────

fn palette() -> Vec<Arc<ItemShape>> {
    vec![
        ShapeDef::rect("pebble", 1, 1).weight(0.5).max_stack(5).build().unwrap(),
        ShapeDef::rect("stick", 2, 1).weight(1.0).rotatable().build().unwrap(),
        ShapeDef::rect("quad", 2, 2).weight(2.0).build().unwrap(),
        ShapeDef::rect("plank", 3, 1).weight(1.5).rotatable().build().unwrap(),
        ShapeDef::rect("ell", 2, 2)
            .mask(&["##", "#."])
            .weight(1.2)
            .rotatable()
            .build()
            .unwrap(),
        ShapeDef::rect("tee", 3, 2)
            .mask(&["###", ".#."])
            .weight(3.0)
            .rotatable()
            .build()
            .unwrap(),
    ]
}

#[derive(Debug, Clone)]
enum Op {
    Place { shape: usize, count: u32 },
    PlaceAt { shape: usize, x: i32, y: i32, rotated: bool },
    Remove { pick: usize },
    Arrange,
    Drag { pick: usize, x: i32, y: i32, rotate: bool, commit: bool },
    /// Cap the budget at a share of the current load.
    LowerCapacity { percent: u32 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..6, 1u32..=3).prop_map(|(shape, count)| Op::Place { shape, count }),
        3 => (0usize..6, -1i32..7, -1i32..7, any::<bool>())
            .prop_map(|(shape, x, y, rotated)| Op::PlaceAt { shape, x, y, rotated }),
        1 => (0usize..16).prop_map(|pick| Op::Remove { pick }),
        1 => Just(Op::Arrange),
        2 => (0usize..16, -1i32..7, -1i32..7, any::<bool>(), any::<bool>())
            .prop_map(|(pick, x, y, rotate, commit)| Op::Drag { pick, x, y, rotate, commit }),
        1 => (10u32..100).prop_map(|percent| Op::LowerCapacity { percent }),
    ]
}

fn pick_id(grid: &GridModel, pick: usize) -> Option<InstanceId> {
    let items = grid.placed_items();
    if items.is_empty() {
        None
    } else {
        Some(items[pick % items.len()].id)
    }
}

fn apply(grid: &mut GridModel, shapes: &[Arc<ItemShape>], op: &Op) {
    match *op {
        Op::Place { shape, count } => {
            let shape = &shapes[shape];
            let count = count.min(shape.max_stack_size());
            let _ = solver::place(grid, shape, count);
        }
        Op::PlaceAt { shape, x, y, rotated } => {
            let shape = &shapes[shape];
            let rotated = rotated && shape.allow_rotation();
            let _ = solver::place_at(grid, shape, Cell::new(x, y), rotated, 1);
        }
        Op::Remove { pick } => {
            if let Some(id) = pick_id(grid, pick) {
                grid.release_placement(id);
            }
        }
        Op::Arrange => {
            let before = grid.placed_items().len();
            let report = solver::auto_arrange(grid);
            assert_eq!(report.arranged.len() + report.unplaced.len(), before);
        }
        Op::Drag { pick, x, y, rotate, commit } => {
            let Some(id) = pick_id(grid, pick) else { return };
            let mut drag = DragSession::default();
            drag.pick_up(grid, id).unwrap();
            drag.pointer_move(grid, Cell::new(x, y)).unwrap();
            if rotate {
                let _ = drag.rotate(grid);
            }
            let outcome = if commit {
                drag.release(grid).unwrap()
            } else {
                drag.cancel(grid).unwrap()
            };
            assert!(
                !matches!(outcome, DragOutcome::Dropped(_)),
                "item dropped without a resize"
            );
        }
        Op::LowerCapacity { percent } => {
            lower_capacity(grid, percent);
        }
    }
}

fn lower_capacity(grid: &mut GridModel, percent: u32) {
    let capped = grid.current_weight() * percent as f64 / 100.0;
    if capped < grid.weight_capacity() {
        grid.set_weight_capacity(capped);
    }
}

/// `load_before` is the weight before the last operation: a grid already
/// over budget may keep its load but must not gain any.
fn check_invariants(grid: &GridModel, load_before: f64) -> Result<(), TestCaseError> {
    let mut seen = HashSet::new();
    let mut weight = 0.0;
    for item in grid.placed_items() {
        for cell in item.cells() {
            prop_assert!(cell.x >= 0 && cell.y >= 0);
            prop_assert!((cell.x as u32) < grid.width() && (cell.y as u32) < grid.height());
            prop_assert!(seen.insert(cell), "cell {} claimed twice", cell);
            prop_assert_eq!(grid.occupant(cell), Some(item.id));
        }
        weight += item.stack_weight();
    }
    prop_assert_eq!(grid.occupied_cells(), seen.len());
    prop_assert!((grid.current_weight() - weight).abs() < 1e-6);
    prop_assert!(
        grid.current_weight() <= grid.weight_capacity() + 1e-6
            || grid.current_weight() <= load_before + 1e-6,
        "load grew from {} to {} past capacity {}",
        load_before,
        grid.current_weight(),
        grid.weight_capacity()
    );
    Ok(())
}

fn snapshot(grid: &GridModel) -> BTreeMap<(i32, i32), InstanceId> {
    let mut map = BTreeMap::new();
    for y in 0..grid.height() as i32 {
        for x in 0..grid.width() as i32 {
            if let Some(id) = grid.occupant(Cell::new(x, y)) {
                map.insert((x, y), id);
            }
        }
    }
    map
}

fn layout(items: &[PlacedItem]) -> Vec<(InstanceId, Cell, bool)> {
    items.iter().map(|i| (i.id, i.origin, i.rotated)).collect()
}

fn build(ops: &[Op], capacity: f64) -> GridModel {
    let shapes = palette();
    let mut grid = GridModel::new(6, 6, capacity);
    for op in ops {
        apply(&mut grid, &shapes, op);
    }
    grid
}

// ═════════════════════════════════════════════════════════════════════════
// 1–2. No overlap, bounds, weight sum under random operation sequences
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn random_sequences_hold_invariants(
        ops in proptest::collection::vec(op_strategy(), 1..60),
        capacity in 5.0f64..40.0,
    ) {
        let shapes = palette();
        let mut grid = GridModel::new(6, 6, capacity);
        for op in &ops {
            let load = grid.current_weight();
            apply(&mut grid, &shapes, op);
            check_invariants(&grid, load)?;
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Determinism of first fit
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn first_fit_is_deterministic(
        ops in proptest::collection::vec(op_strategy(), 0..30),
        shape in 0usize..6,
    ) {
        let a = build(&ops, 30.0);
        let b = build(&ops, 30.0);
        prop_assert_eq!(snapshot(&a), snapshot(&b));

        let shapes = palette();
        let first = solver::find_first_fit(&a, &shapes[shape], 1);
        let again = solver::find_first_fit(&a, &shapes[shape], 1);
        let other = solver::find_first_fit(&b, &shapes[shape], 1);
        prop_assert_eq!(first, again);
        prop_assert_eq!(first, other);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Pick-up then cancel is a full round trip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn cancel_round_trips(
        ops in proptest::collection::vec(op_strategy(), 1..30),
        pick in 0usize..16,
        moves in proptest::collection::vec((-2i32..8, -2i32..8), 0..6),
    ) {
        let mut grid = build(&ops, 30.0);
        let Some(id) = pick_id(&grid, pick) else { return Ok(()) };
        let cells = snapshot(&grid);
        let weight = grid.current_weight();

        let mut drag = DragSession::default();
        drag.pick_up(&mut grid, id).unwrap();
        for (x, y) in moves {
            drag.pointer_move(&grid, Cell::new(x, y)).unwrap();
            let _ = drag.rotate(&grid);
        }
        let outcome = drag.cancel(&mut grid).unwrap();
        let restored_home = matches!(outcome, DragOutcome::Cancelled { relocated: false, .. });
        prop_assert!(restored_home);
        prop_assert_eq!(snapshot(&grid), cells);
        prop_assert!((grid.current_weight() - weight).abs() < 1e-9);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. can_place is a pure query
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn can_place_never_mutates(
        ops in proptest::collection::vec(op_strategy(), 0..30),
        shape in 0usize..6,
        x in -3i32..9,
        y in -3i32..9,
        rotated in any::<bool>(),
        count in 1u32..=5,
    ) {
        let grid = build(&ops, 20.0);
        let before = snapshot(&grid);
        let weight = grid.current_weight();
        let shapes = palette();
        let _ = solver::can_place(&grid, &shapes[shape], Cell::new(x, y), rotated, count, None);
        let _ = solver::check_placement(&grid, &shapes[shape], Cell::new(x, y), rotated, count, None);
        prop_assert_eq!(snapshot(&grid), before);
        prop_assert_eq!(grid.current_weight(), weight);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Auto-arrange accounts for every item
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn arrange_keeps_totals(ops in proptest::collection::vec(op_strategy(), 1..40)) {
        let mut grid = build(&ops, 40.0);
        let count = grid.placed_items().len();
        let cells = grid.occupied_cells();
        let weight = grid.current_weight();

        let report = solver::auto_arrange(&mut grid);
        prop_assert_eq!(report.arranged.len() + report.unplaced.len(), count);
        prop_assert_eq!(grid.placed_items().len(), report.arranged.len());
        if report.unplaced.is_empty() {
            prop_assert_eq!(grid.occupied_cells(), cells);
            prop_assert!((grid.current_weight() - weight).abs() < 1e-9);
        }
        check_invariants(&grid, weight)?;
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Capacity lowered under load
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn cancel_round_trips_after_capacity_drop(
        ops in proptest::collection::vec(op_strategy(), 1..30),
        pick in 0usize..16,
        percent in 0u32..100,
        target in (-2i32..8, -2i32..8),
    ) {
        let mut grid = build(&ops, 30.0);
        let Some(id) = pick_id(&grid, pick) else { return Ok(()) };
        let cells = snapshot(&grid);
        let weight = grid.current_weight();

        let mut drag = DragSession::default();
        drag.pick_up(&mut grid, id).unwrap();
        lower_capacity(&mut grid, percent);
        drag.pointer_move(&grid, Cell::new(target.0, target.1)).unwrap();
        let outcome = drag.cancel(&mut grid).unwrap();

        let restored_home = matches!(outcome, DragOutcome::Cancelled { relocated: false, .. });
        prop_assert!(restored_home);
        prop_assert_eq!(snapshot(&grid), cells);
        prop_assert!((grid.current_weight() - weight).abs() < 1e-9);
    }

    #[test]
    fn arrange_ignores_capacity_drop(
        ops in proptest::collection::vec(op_strategy(), 1..40),
        percent in 0u32..100,
    ) {
        let mut roomy = build(&ops, 40.0);
        let mut tight = roomy.clone();
        lower_capacity(&mut tight, percent);

        let expected = solver::auto_arrange(&mut roomy);
        let report = solver::auto_arrange(&mut tight);
        prop_assert_eq!(layout(&report.arranged), layout(&expected.arranged));
        prop_assert_eq!(report.unplaced.len(), expected.unplaced.len());
        prop_assert_eq!(snapshot(&tight), snapshot(&roomy));
        prop_assert!((tight.current_weight() - roomy.current_weight()).abs() < 1e-9);
    }
}
