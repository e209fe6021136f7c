//! Item catalog lookup.
//!
//! The engine only reads shapes; where they come from is up to the caller.
//! `MemoryCatalog` covers the common case of a JSON array of shape records:
//!
//! ```json
//! [
//!   { "id": "canteen", "width": 1, "height": 2, "weight": 1.5, "allow_rotation": true },
//!   { "id": "arrows", "width": 1, "height": 1, "weight": 0.1, "max_stack_size": 20 },
//!   { "id": "pickaxe", "width": 3, "height": 2, "mask": ["###", ".#."], "weight": 4.0 }
//! ]
//! ```
//!
//! Records that fail validation are logged and skipped so one bad entry does
//! not take the whole catalog down.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::shape::{ItemShape, ShapeDef};
use crate::types::ShapeId;

pub trait ShapeCatalog {
    fn get_shape(&self, item_id: &str) -> Option<Arc<ItemShape>>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("malformed catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate shape id `{0}`")]
    DuplicateId(ShapeId),
}

/// Shapes held in memory, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    shapes: BTreeMap<ShapeId, Arc<ItemShape>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and collect records. Invalid records are skipped with a
    /// warning; a repeated id is an error.
    pub fn from_defs(defs: impl IntoIterator<Item = ShapeDef>) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for def in defs {
            let id = def.id.clone();
            if catalog.shapes.contains_key(&id) {
                return Err(CatalogError::DuplicateId(id));
            }
            match ItemShape::new(def) {
                Ok(shape) => {
                    catalog.shapes.insert(id, Arc::new(shape));
                }
                Err(err) => log::warn!("skipping catalog entry: {err}"),
            }
        }
        Ok(catalog)
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let defs: Vec<ShapeDef> = serde_json::from_str(json)?;
        Self::from_defs(defs)
    }

    /// Add or replace a shape, returning the one it replaced.
    pub fn insert(&mut self, shape: Arc<ItemShape>) -> Option<Arc<ItemShape>> {
        self.shapes.insert(shape.id().clone(), shape)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Shape ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &ShapeId> {
        self.shapes.keys()
    }

    pub fn shapes(&self) -> impl Iterator<Item = &Arc<ItemShape>> {
        self.shapes.values()
    }
}

impl ShapeCatalog for MemoryCatalog {
    fn get_shape(&self, item_id: &str) -> Option<Arc<ItemShape>> {
        self.shapes.get(&ShapeId::from(item_id)).cloned()
    }
}
