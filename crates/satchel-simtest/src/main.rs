//! Satchel Headless Placement Harness
//!
//! Validates the item catalog and the pure placement logic without a
//! front end. Runs entirely in-process: no window, no input devices, no saves.
//!
//! Usage:
//!   cargo run -p satchel-simtest
//!   cargo run -p satchel-simtest -- --verbose
//!   cargo run -p satchel-simtest -- --seed 42 --rounds 500

use std::collections::HashSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use satchel_logic::catalog::{MemoryCatalog, ShapeCatalog};
use satchel_logic::config::GridConfig;
use satchel_logic::drag::{DragError, DragOutcome, Preview};
use satchel_logic::events::{EventLog, PlacementEvent};
use satchel_logic::grid::{GridModel, PlacedItem};
use satchel_logic::heatmap::Heatmap;
use satchel_logic::inventory::{Inventory, InventoryError};
use satchel_logic::shape::{ItemShape, ShapeDef};
use satchel_logic::solver::{self, Placement};
use satchel_logic::types::{Cell, Rejection, ShapeId};

// ── Item catalog (same JSON a front end would ship) ─────────────────────
const CATALOG_JSON: &str = include_str!("../../../data/item_shapes.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

struct Options {
    verbose: bool,
    seed: u64,
    rounds: usize,
}

fn parse_args() -> Options {
    let args: Vec<String> = std::env::args().collect();
    let value_of = |flag: &str| {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .and_then(|v| v.parse::<u64>().ok())
    };
    Options {
        verbose: args.iter().any(|a| a == "--verbose"),
        seed: value_of("--seed").unwrap_or(0x5a7c_4e1),
        rounds: value_of("--rounds").map_or(300, |r| r as usize),
    }
}

fn main() {
    let opts = parse_args();
    let filter = if opts.verbose { "debug" } else { "warn" };
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(filter));

    println!("=== Satchel Placement Harness ===\n");

    let catalog = match MemoryCatalog::from_json_str(CATALOG_JSON) {
        Ok(c) => c,
        Err(e) => {
            println!("  ✗ catalog_parse: {}", e);
            println!("\n=== RESULT: 0/1 passed, 1 failed ===");
            std::process::exit(1);
        }
    };

    let mut results = Vec::new();

    // 1. Catalog validation
    results.extend(validate_catalog(&catalog, opts.verbose));

    // 2. Named placement scenarios
    results.extend(validate_scenarios(opts.verbose));

    // 3. Drag & drop behaviour
    results.extend(validate_drag(&catalog, opts.verbose));

    // 4. Stack merge & split
    results.extend(validate_stacks(&catalog, opts.verbose));

    // 5. Heatmap
    results.extend(validate_heatmap(opts.verbose));

    // 6. Randomized operation sweep
    results.extend(validate_random_sweep(
        &catalog,
        opts.seed,
        opts.rounds,
        opts.verbose,
    ));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || opts.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

/// First violated grid invariant, if any.
fn check_grid(grid: &GridModel) -> Option<String> {
    let mut seen = HashSet::new();
    let mut weight = 0.0;
    for item in grid.placed_items() {
        for cell in item.cells() {
            if cell.x < 0
                || cell.y < 0
                || cell.x as u32 >= grid.width()
                || cell.y as u32 >= grid.height()
            {
                return Some(format!("{} leaves the grid at {}", item.id, cell));
            }
            if !seen.insert(cell) {
                return Some(format!("cell {} claimed twice", cell));
            }
            if grid.occupant(cell) != Some(item.id) {
                return Some(format!("cell {} does not point back at {}", cell, item.id));
            }
        }
        weight += item.stack_weight();
    }
    if grid.occupied_cells() != seen.len() {
        return Some(format!(
            "{} occupied cells, {} covered by items",
            grid.occupied_cells(),
            seen.len()
        ));
    }
    if (grid.current_weight() - weight).abs() > 1e-6 {
        return Some(format!(
            "weight {} but items sum to {}",
            grid.current_weight(),
            weight
        ));
    }
    None
}

fn invariant_result(name: &str, grid: &GridModel) -> TestResult {
    let violation = check_grid(grid);
    TestResult {
        name: name.into(),
        passed: violation.is_none(),
        detail: violation.unwrap_or_else(|| {
            format!(
                "{} items, {} cells, weight {:.2}/{:.2}",
                grid.placed_items().len(),
                grid.occupied_cells(),
                grid.current_weight(),
                grid.weight_capacity()
            )
        }),
    }
}

// ── 1. Catalog ──────────────────────────────────────────────────────────

fn validate_catalog(catalog: &MemoryCatalog, verbose: bool) -> Vec<TestResult> {
    println!("--- Item Catalog ---");
    let mut results = Vec::new();

    // Every raw record must survive validation
    let raw: Vec<ShapeDef> = serde_json::from_str(CATALOG_JSON).unwrap_or_default();
    results.push(TestResult {
        name: "catalog_all_records_valid".into(),
        passed: !raw.is_empty() && raw.len() == catalog.len(),
        detail: format!("{} records, {} shapes accepted", raw.len(), catalog.len()),
    });

    // Ids are unique
    let unique: HashSet<&ShapeId> = raw.iter().map(|d| &d.id).collect();
    results.push(TestResult {
        name: "catalog_unique_ids".into(),
        passed: unique.len() == raw.len(),
        detail: format!("{} unique ids", unique.len()),
    });

    // Masks leave at least one hole, otherwise they should be plain rectangles
    let masked: Vec<_> = catalog.shapes().filter(|s| s.is_masked()).collect();
    let solid_masks: Vec<_> = masked
        .iter()
        .filter(|s| s.footprint(false).cell_count() as u32 == s.area())
        .map(|s| s.id().to_string())
        .collect();
    results.push(TestResult {
        name: "catalog_masks_have_holes".into(),
        passed: !masked.is_empty() && solid_masks.is_empty(),
        detail: if solid_masks.is_empty() {
            format!("{} masked shapes", masked.len())
        } else {
            format!("fully filled masks: {}", solid_masks.join(", "))
        },
    });

    // Rotation keeps the cell count and swaps the bounding box
    let mut rotation_ok = true;
    for shape in catalog.shapes() {
        let up = shape.footprint(false);
        let rot = shape.footprint(true);
        if up.cell_count() != rot.cell_count()
            || up.width() != rot.height()
            || up.height() != rot.width()
        {
            rotation_ok = false;
            if verbose {
                println!("    rotation mismatch for `{}`", shape.id());
            }
        }
    }
    results.push(TestResult {
        name: "catalog_rotation_consistent".into(),
        passed: rotation_ok,
        detail: "rotated footprints keep cell count and swap sides".into(),
    });

    // Weights are finite and non-negative
    let bad_weight: Vec<_> = catalog
        .shapes()
        .filter(|s| !s.weight().is_finite() || s.weight() < 0.0)
        .collect();
    results.push(TestResult {
        name: "catalog_weights_valid".into(),
        passed: bad_weight.is_empty(),
        detail: format!("{} shapes with bad weight", bad_weight.len()),
    });

    // Lookup of a missing id is a miss, not an error
    results.push(TestResult {
        name: "catalog_unknown_lookup".into(),
        passed: catalog.get_shape("unobtainium").is_none(),
        detail: "unknown id resolves to None".into(),
    });

    if verbose {
        for shape in catalog.shapes() {
            println!(
                "    {:<16} {}×{} cells={} weight={:.2} stack={} rot={}",
                shape.id().as_str(),
                shape.width(),
                shape.height(),
                shape.footprint(false).cell_count(),
                shape.weight(),
                shape.max_stack_size(),
                shape.allow_rotation()
            );
        }
    }

    results
}

// ── 2. Scenarios ────────────────────────────────────────────────────────

fn rect(id: &str, w: u32, h: u32, weight: f64) -> Option<Arc<ItemShape>> {
    ShapeDef::rect(id, w, h).weight(weight).build().ok()
}

fn validate_scenarios(_verbose: bool) -> Vec<TestResult> {
    println!("--- Placement Scenarios ---");
    let mut results = Vec::new();

    let (Some(box2), Some(quad), Some(pebble), Some(ingot), Some(chest)) = (
        rect("box", 2, 2, 5.0),
        rect("quad", 2, 2, 1.0),
        rect("pebble", 1, 1, 0.1),
        rect("ingot", 1, 1, 6.0),
        rect("chest", 2, 3, 0.0),
    ) else {
        results.push(TestResult {
            name: "scenario_shapes".into(),
            passed: false,
            detail: "could not build scenario shapes".into(),
        });
        return results;
    };

    // A: first placement on an empty grid lands at the origin
    let mut grid = GridModel::new(4, 4, 100.0);
    let a = solver::place(&mut grid, &box2, 1);
    results.push(TestResult {
        name: "scenario_a_empty_grid".into(),
        passed: matches!(&a, Ok(item) if item.origin == Cell::ORIGIN)
            && (grid.current_weight() - 5.0).abs() < 1e-9,
        detail: format!("{:?}", a.map(|i| i.origin)),
    });

    // B: a full grid rejects even the smallest item
    let mut grid = GridModel::new(4, 4, 100.0);
    for _ in 0..4 {
        let _ = solver::place(&mut grid, &quad, 1);
    }
    let b = solver::place(&mut grid, &pebble, 1);
    results.push(TestResult {
        name: "scenario_b_full_grid".into(),
        passed: grid.occupied_cells() == 16 && b == Err(Rejection::NoValidPosition),
        detail: format!("{} cells, pebble: {:?}", grid.occupied_cells(), b.map(|i| i.id)),
    });

    // C: weight ceiling
    let mut grid = GridModel::new(4, 4, 10.0);
    let _ = solver::place(&mut grid, &ingot, 1);
    let c = solver::place(&mut grid, &ingot, 1);
    results.push(TestResult {
        name: "scenario_c_weight_ceiling".into(),
        passed: c == Err(Rejection::WeightExceeded) && (grid.current_weight() - 6.0).abs() < 1e-9,
        detail: format!("second ingot: {:?}", c.map(|i| i.id)),
    });

    // D: a rotatable plank drops into the one vertical slot left
    let mut grid = GridModel::new(3, 4, 100.0);
    let fit = match ShapeDef::rect("plank", 3, 1).rotatable().build() {
        Ok(plank) => {
            let _ = solver::place_at(&mut grid, &plank, Cell::ORIGIN, false, 1);
            let _ = solver::place_at(&mut grid, &chest, Cell::new(0, 1), false, 1);
            solver::find_first_fit(&grid, &plank, 1)
        }
        Err(_) => None,
    };
    results.push(TestResult {
        name: "scenario_d_rotation".into(),
        passed: fit
            == Some(Placement {
                origin: Cell::new(2, 1),
                rotated: true,
            }),
        detail: format!("{:?}", fit),
    });

    // E: auto-arrange keeps every item, cell and unit of weight
    let mut grid = GridModel::new(6, 6, 100.0);
    let scattered = [
        (rect("pebble", 1, 1, 0.5), Cell::new(0, 0)),
        (rect("quad", 2, 2, 3.0), Cell::new(2, 0)),
        (rect("stick", 2, 1, 1.0), Cell::new(4, 5)),
        (rect("slab", 3, 2, 4.0), Cell::new(0, 3)),
        (rect("crate", 3, 3, 8.0), Cell::new(3, 2)),
    ];
    for (shape, origin) in &scattered {
        if let Some(shape) = shape {
            let _ = solver::place_at(&mut grid, shape, *origin, false, 1);
        }
    }
    let cells = grid.occupied_cells();
    let weight = grid.current_weight();
    let report = solver::auto_arrange(&mut grid);
    results.push(TestResult {
        name: "scenario_e_auto_arrange".into(),
        passed: report.unplaced.is_empty()
            && report.arranged.len() == 5
            && grid.occupied_cells() == cells
            && (grid.current_weight() - weight).abs() < 1e-9,
        detail: format!(
            "{} arranged, {} unplaced, largest `{}` at {}",
            report.arranged.len(),
            report.unplaced.len(),
            report
                .arranged
                .first()
                .map_or("-", |i| i.shape.id().as_str()),
            report.arranged.first().map_or(Cell::ORIGIN, |i| i.origin)
        ),
    });
    results.push(invariant_result("scenario_e_invariants", &grid));

    results
}

// ── 3. Drag & drop ──────────────────────────────────────────────────────

fn validate_drag(catalog: &MemoryCatalog, _verbose: bool) -> Vec<TestResult> {
    println!("--- Drag & Drop ---");
    let mut results = Vec::new();

    let mut inv = match Inventory::new(&GridConfig::new(6, 4, 30.0), EventLog::new()) {
        Ok(inv) => inv,
        Err(errors) => {
            results.push(TestResult {
                name: "drag_inventory".into(),
                passed: false,
                detail: format!("{} config errors", errors.len()),
            });
            return results;
        }
    };

    let kit = inv
        .add_item(catalog, "first_aid_kit", 1)
        .ok()
        .and_then(|o| o.placed);
    let bar = inv.add_item(catalog, "crowbar", 1).ok().and_then(|o| o.placed);
    let (Some(kit), Some(bar)) = (kit, bar) else {
        results.push(TestResult {
            name: "drag_setup".into(),
            passed: false,
            detail: "could not place kit and crowbar".into(),
        });
        return results;
    };
    results.push(TestResult {
        name: "drag_setup".into(),
        passed: kit.origin == Cell::ORIGIN && bar.origin == Cell::new(2, 0) && !bar.rotated,
        detail: format!("kit at {}, crowbar at {}", kit.origin, bar.origin),
    });
    inv.events_mut().drain();

    // Overlapping drop bounces back home and reports why
    let _ = inv.pick_up(kit.id);
    let preview = inv.pointer_move(Cell::new(2, 0));
    let outcome = inv.release();
    let events = inv.events_mut().drain();
    results.push(TestResult {
        name: "drag_invalid_drop_restores".into(),
        passed: preview == Ok(Preview::Invalid(Rejection::Overlap))
            && matches!(&outcome, Ok(DragOutcome::Cancelled { item, relocated: false }) if item.origin == Cell::ORIGIN)
            && events.contains(&PlacementEvent::Rejected(Rejection::Overlap)),
        detail: format!("preview {:?}, {} events", preview, events.len()),
    });

    // Off-grid candidate
    let _ = inv.pick_up(kit.id);
    let off = inv.pointer_move(Cell::new(-1, 3));
    results.push(TestResult {
        name: "drag_off_grid_preview".into(),
        passed: off == Ok(Preview::Invalid(Rejection::OutOfBounds)),
        detail: format!("{:?}", off),
    });

    // A second pick-up while holding is refused
    let again = inv.pick_up(bar.id);
    results.push(TestResult {
        name: "drag_single_item".into(),
        passed: again == Err(InventoryError::Drag(DragError::AlreadyHolding)),
        detail: format!("{:?}", again),
    });

    // Kits do not rotate
    let turn = inv.rotate_held();
    results.push(TestResult {
        name: "drag_rotation_locked".into(),
        passed: turn == Err(InventoryError::Drag(DragError::RotationNotAllowed)),
        detail: format!("{:?}", turn),
    });

    // Valid move keeps the instance id
    let valid = inv.pointer_move(Cell::new(4, 2));
    let moved = inv.release();
    results.push(TestResult {
        name: "drag_valid_move".into(),
        passed: valid == Ok(Preview::Valid)
            && matches!(&moved, Ok(DragOutcome::Committed(item)) if item.id == kit.id && item.origin == Cell::new(4, 2)),
        detail: format!("{:?}", moved.as_ref().map(|o| o.item().origin)),
    });

    // Rotating a held crowbar lays it flat
    let _ = inv.pick_up(bar.id);
    let _ = inv.pointer_move(Cell::new(0, 3));
    let flat = inv.rotate_held();
    let laid = inv.release();
    results.push(TestResult {
        name: "drag_rotate_and_drop".into(),
        passed: flat == Ok(Preview::Valid)
            && matches!(&laid, Ok(DragOutcome::Committed(item)) if item.rotated),
        detail: format!("{:?}", flat),
    });

    // Releasing with nothing held is an error, not a panic
    let idle = inv.release();
    results.push(TestResult {
        name: "drag_release_idle".into(),
        passed: idle == Err(InventoryError::Drag(DragError::NotHolding)),
        detail: format!("{:?}", idle.map(|o| o.item().id)),
    });

    results.push(invariant_result("drag_invariants", inv.grid()));
    results
}

// ── 4. Stacks ───────────────────────────────────────────────────────────

fn validate_stacks(catalog: &MemoryCatalog, _verbose: bool) -> Vec<TestResult> {
    println!("--- Stacks ---");
    let mut results = Vec::new();

    let Ok(mut inv) = Inventory::new(&GridConfig::new(6, 4, 30.0), EventLog::new()) else {
        results.push(TestResult {
            name: "stacks_inventory".into(),
            passed: false,
            detail: "default grid rejected".into(),
        });
        return results;
    };
    let bandage = ShapeId::new("bandage");

    let first = inv.add_item(catalog, "bandage", 7);
    let second = inv.add_item(catalog, "bandage", 6);
    results.push(TestResult {
        name: "stacks_merge_then_overflow".into(),
        passed: matches!(&second, Ok(o) if o.merged.len() == 1 && o.merged[0].1 == 3 && o.placed.as_ref().map(|p| p.stack_count) == Some(3))
            && inv.total_units(&bandage) == 13,
        detail: format!(
            "{} units in {} stacks",
            inv.total_units(&bandage),
            inv.grid().placed_items().len()
        ),
    });

    let oversized = inv.add_item(catalog, "bandage", 11);
    results.push(TestResult {
        name: "stacks_oversized_rejected".into(),
        passed: matches!(oversized, Err(InventoryError::InvalidStackCount { count: 11, max: 10, .. })),
        detail: format!("{:?}", oversized.map(|o| o.merged.len())),
    });

    let split = first
        .ok()
        .and_then(|o| o.placed)
        .map(|full| inv.split_stack(full.id, 4));
    results.push(TestResult {
        name: "stacks_split".into(),
        passed: matches!(&split, Some(Ok(item)) if item.stack_count == 4)
            && inv.total_units(&bandage) == 13
            && (inv.grid().current_weight() - 1.3).abs() < 1e-9,
        detail: format!(
            "{} stacks, weight {:.2}",
            inv.grid().placed_items().len(),
            inv.grid().current_weight()
        ),
    });

    let missing = inv.add_item(catalog, "unobtainium", 1);
    results.push(TestResult {
        name: "stacks_unknown_item".into(),
        passed: missing == Err(InventoryError::UnknownItem("unobtainium".into())),
        detail: format!("{:?}", missing.map(|o| o.merged.len())),
    });

    results.push(invariant_result("stacks_invariants", inv.grid()));
    results
}

// ── 5. Heatmap ──────────────────────────────────────────────────────────

fn validate_heatmap(verbose: bool) -> Vec<TestResult> {
    println!("--- Heatmap ---");
    let mut results = Vec::new();

    let mut grid = GridModel::new(3, 3, 10.0);
    let empty = Heatmap::generate(&grid);
    results.push(TestResult {
        name: "heatmap_empty_zero".into(),
        passed: empty.values().iter().all(|v| *v == 0.0),
        detail: format!("{} values", empty.values().len()),
    });

    if let Some(pebble) = rect("pebble", 1, 1, 0.1) {
        let _ = solver::place(&mut grid, &pebble, 1);
    }
    let one = Heatmap::generate(&grid);
    let corner = one.get(0, 0).unwrap_or(-1.0);
    let center = one.get(1, 1).unwrap_or(-1.0);
    let far = one.get(2, 2).unwrap_or(-1.0);
    results.push(TestResult {
        name: "heatmap_edge_clipping".into(),
        passed: (corner - 0.25).abs() < 1e-6 && (center - 1.0 / 9.0).abs() < 1e-6 && far == 0.0,
        detail: format!("corner={:.3} center={:.3} far={:.3}", corner, center, far),
    });

    let mut full = GridModel::new(4, 2, 10.0);
    if let Some(slab) = rect("slab", 4, 2, 1.0) {
        let _ = solver::place(&mut full, &slab, 1);
    }
    let saturated = Heatmap::generate(&full);
    results.push(TestResult {
        name: "heatmap_full_saturated".into(),
        passed: saturated.values().iter().all(|v| (*v - 1.0).abs() < 1e-6),
        detail: format!("max={:.3}", saturated.max()),
    });

    if verbose {
        for y in 0..one.height() {
            let row: Vec<String> = (0..one.width())
                .map(|x| format!("{:.2}", one.get(x, y).unwrap_or(0.0)))
                .collect();
            println!("    {}", row.join(" "));
        }
    }

    results
}

// ── 6. Random sweep ─────────────────────────────────────────────────────

fn pick(rng: &mut StdRng, inv: &Inventory<EventLog>) -> Option<PlacedItem> {
    let items = inv.grid().placed_items();
    if items.is_empty() {
        None
    } else {
        Some(items[rng.gen_range(0..items.len())].clone())
    }
}

fn validate_random_sweep(
    catalog: &MemoryCatalog,
    seed: u64,
    rounds: usize,
    verbose: bool,
) -> Vec<TestResult> {
    println!("--- Random Sweep (seed {:#x}, {} rounds) ---", seed, rounds);
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(seed);

    let ids: Vec<String> = catalog.ids().map(|id| id.to_string()).collect();
    let Ok(mut inv) = Inventory::new(&GridConfig::new(8, 6, 25.0), EventLog::new()) else {
        results.push(TestResult {
            name: "sweep_inventory".into(),
            passed: false,
            detail: "sweep grid rejected".into(),
        });
        return results;
    };

    let mut first_violation: Option<String> = None;
    let mut over_budget = 0usize;
    let mut drops = 0usize;
    let mut ops = [0usize; 7];

    for round in 0..rounds {
        let op = rng.gen_range(0..ops.len());
        ops[op] += 1;
        match op {
            0 | 1 => {
                let id = &ids[rng.gen_range(0..ids.len())];
                let max = catalog.get_shape(id).map_or(1, |s| s.max_stack_size());
                let _ = inv.add_item(catalog, id, rng.gen_range(1..=max));
            }
            2 => {
                if let Some(item) = pick(&mut rng, &inv) {
                    let _ = inv.remove(item.id);
                }
            }
            3 => {
                if let Some(item) = pick(&mut rng, &inv) {
                    let w = inv.grid().width() as i32;
                    let h = inv.grid().height() as i32;
                    let _ = inv.pick_up(item.id);
                    let _ = inv.pointer_move(Cell::new(rng.gen_range(-1..=w), rng.gen_range(-1..=h)));
                    if item.shape.allow_rotation() && rng.gen_bool(0.4) {
                        let _ = inv.rotate_held();
                    }
                    let outcome = if rng.gen_bool(0.8) {
                        inv.release()
                    } else {
                        inv.cancel_drag()
                    };
                    if matches!(outcome, Ok(DragOutcome::Dropped(_))) {
                        drops += 1;
                    }
                }
            }
            4 => {
                if let Some(item) = pick(&mut rng, &inv) {
                    if item.stack_count > 1 {
                        let _ = inv.split_stack(item.id, rng.gen_range(1..item.stack_count));
                    }
                }
            }
            5 => {
                let _ = inv.auto_arrange();
            }
            _ => {
                let _ = inv.resize(rng.gen_range(6..=10), rng.gen_range(4..=8));
            }
        }

        if inv.drag().is_holding() && first_violation.is_none() {
            first_violation = Some(format!("round {}: drag left open", round));
        }
        if let Some(v) = check_grid(inv.grid()) {
            first_violation.get_or_insert(format!("round {}: {}", round, v));
        }
        if inv.grid().current_weight() > inv.grid().weight_capacity() + 1e-6 {
            over_budget += 1;
        }
        inv.events_mut().drain();
    }

    results.push(TestResult {
        name: "sweep_invariants".into(),
        passed: first_violation.is_none(),
        detail: first_violation.unwrap_or_else(|| format!("{} rounds clean", rounds)),
    });
    results.push(TestResult {
        name: "sweep_weight_budget".into(),
        passed: over_budget == 0,
        detail: format!("{} rounds over capacity", over_budget),
    });
    results.push(TestResult {
        name: "sweep_no_lost_drags".into(),
        passed: drops == 0,
        detail: format!("{} items dropped by drag", drops),
    });

    if verbose {
        println!(
            "    ops: add={} remove={} drag={} split={} arrange={} resize={}",
            ops[0] + ops[1],
            ops[2],
            ops[3],
            ops[4],
            ops[5],
            ops[6]
        );
        println!(
            "    final: {}×{} with {} items, weight {:.2}",
            inv.grid().width(),
            inv.grid().height(),
            inv.grid().placed_items().len(),
            inv.grid().current_weight()
        );
    }

    results
}
