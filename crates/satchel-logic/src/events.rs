//! Placement notifications for the front end.
//!
//! Renderers, sound and particle effects observe these instead of living
//! inside the grid logic. Every method has an empty default body so a sink
//! only implements what it cares about.

use serde::{Deserialize, Serialize};

use crate::grid::PlacedItem;
use crate::types::{Cell, InstanceId, Rejection, ShapeId};

pub trait PlacementEvents {
    /// An item landed on the grid, or moved to a new spot.
    fn on_item_placed(&mut self, _item: &PlacedItem) {}
    /// An item left the grid (removed, picked up, dropped by resize).
    fn on_item_removed(&mut self, _id: InstanceId) {}
    fn on_placement_rejected(&mut self, _reason: Rejection) {}
    /// A stack's unit count changed without it moving.
    fn on_stack_changed(&mut self, _id: InstanceId, _stack_count: u32) {}
}

/// Sink that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEvents;

impl PlacementEvents for NoEvents {}

/// Recorded form of one notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlacementEvent {
    Placed {
        id: InstanceId,
        shape: ShapeId,
        origin: Cell,
        rotated: bool,
        stack_count: u32,
    },
    Removed(InstanceId),
    Rejected(Rejection),
    StackChanged {
        id: InstanceId,
        stack_count: u32,
    },
}

/// Sink that keeps every notification in order. Handy for tests and replays.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub events: Vec<PlacementEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&mut self) -> Vec<PlacementEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn rejections(&self) -> impl Iterator<Item = Rejection> + '_ {
        self.events.iter().filter_map(|e| match e {
            PlacementEvent::Rejected(reason) => Some(*reason),
            _ => None,
        })
    }
}

impl PlacementEvents for EventLog {
    fn on_item_placed(&mut self, item: &PlacedItem) {
        self.events.push(PlacementEvent::Placed {
            id: item.id,
            shape: item.shape.id().clone(),
            origin: item.origin,
            rotated: item.rotated,
            stack_count: item.stack_count,
        });
    }

    fn on_item_removed(&mut self, id: InstanceId) {
        self.events.push(PlacementEvent::Removed(id));
    }

    fn on_placement_rejected(&mut self, reason: Rejection) {
        self.events.push(PlacementEvent::Rejected(reason));
    }

    fn on_stack_changed(&mut self, id: InstanceId, stack_count: u32) {
        self.events
            .push(PlacementEvent::StackChanged { id, stack_count });
    }
}
