//! Pure inventory placement logic for Satchel.
//!
//! This crate contains the grid inventory engine independent of any
//! renderer, editor or save system. Functions take plain data and return
//! results, so everything is unit-testable and can sit behind any front end.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`catalog`] | Shape lookup by item id, JSON-backed in-memory catalog |
//! | [`config`] | Grid size / weight capacity configuration and validation |
//! | [`drag`] | Pick-up, preview, drop and cancel of one held item |
//! | [`events`] | Placement notifications for renderers and effects |
//! | [`grid`] | Cell occupancy, placed items, weight accounting |
//! | [`heatmap`] | 3×3 occupancy density for feedback overlays |
//! | [`inventory`] | One inventory context: grid + drag + events + stacks |
//! | [`shape`] | Item footprints, occupancy masks, rotation |
//! | [`solver`] | Placement checks, first-fit search, auto-arrange |
//! | [`types`] | Cells, ids, rejection reasons |

pub mod catalog;
pub mod config;
pub mod drag;
pub mod events;
pub mod grid;
pub mod heatmap;
pub mod inventory;
pub mod shape;
pub mod solver;
pub mod types;
