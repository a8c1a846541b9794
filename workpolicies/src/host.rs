//! Seams to the host game. The manager never reaches into game objects
//! directly; callers hand it implementations of these traits.

use crate::model::{ColonistId, MapId, Priority, WorkTypeId};

/// A colonist's live work settings.
pub trait Colonist {
    fn id(&self) -> &ColonistId;
    fn priority(&self, work: &WorkTypeId) -> Priority;
    fn set_priority(&mut self, work: &WorkTypeId, priority: Priority);
}

/// Lookup of colonists that are not part of the current live list.
pub trait ColonistRegistry {
    /// False when the colonist is dead or no longer exists at all.
    fn is_alive(&self, id: &ColonistId) -> bool;
}

/// Ordered list of every known work type.
pub trait WorkCatalog {
    fn work_types(&self) -> &[WorkTypeId];
}

pub trait MapProvider {
    fn live_maps(&self) -> Vec<MapId>;
    /// `None` while the player is not looking at any map.
    fn current_map(&self) -> Option<MapId>;
}

impl WorkCatalog for [WorkTypeId] {
    fn work_types(&self) -> &[WorkTypeId] {
        self
    }
}

impl WorkCatalog for Vec<WorkTypeId> {
    fn work_types(&self) -> &[WorkTypeId] {
        self
    }
}
