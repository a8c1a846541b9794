//! In-memory host: colonists, maps and a work-type catalog that implement
//! every trait in [`crate::host`]. Worlds are seeded from YAML.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{ManagerConfig, DEFAULT_MAX_PRIORITY};
use crate::error::PolicyError;
use crate::host::{Colonist, ColonistRegistry, MapProvider, WorkCatalog};
use crate::model::{ColonistId, MapId, Priority, WorkTypeId};

fn default_max_priority() -> Priority {
    DEFAULT_MAX_PRIORITY
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColonistRecord {
    pub id: ColonistId,
    #[serde(default)]
    pub name: String,
    pub map: MapId,
    #[serde(default)]
    pub dead: bool,
    #[serde(default)]
    pub priorities: BTreeMap<WorkTypeId, Priority>,
    #[serde(skip, default = "default_max_priority")]
    max_priority: Priority,
}

impl ColonistRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, map: MapId) -> Self {
        Self {
            id: ColonistId::new(id),
            name: name.into(),
            map,
            dead: false,
            priorities: BTreeMap::new(),
            max_priority: DEFAULT_MAX_PRIORITY,
        }
    }
}

impl Colonist for ColonistRecord {
    fn id(&self) -> &ColonistId {
        &self.id
    }

    fn priority(&self, work: &WorkTypeId) -> Priority {
        self.priorities.get(work).copied().unwrap_or(0)
    }

    fn set_priority(&mut self, work: &WorkTypeId, priority: Priority) {
        let clamped = if priority > self.max_priority {
            warn!(
                colonist = %self.id,
                work = %work,
                priority,
                max = self.max_priority,
                "priority clamped"
            );
            self.max_priority
        } else {
            priority
        };
        self.priorities.insert(work.clone(), clamped);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct World {
    pub work_types: Vec<WorkTypeId>,
    #[serde(default)]
    pub maps: Vec<MapId>,
    #[serde(default)]
    pub current_map: Option<MapId>,
    #[serde(default)]
    pub colonists: Vec<ColonistRecord>,
}

impl World {
    pub fn from_yaml(raw: &str) -> Result<Self, PolicyError> {
        let mut world: World = serde_yaml::from_str(raw)?;
        if world.current_map.is_none() {
            world.current_map = world.maps.first().copied();
        }
        Ok(world)
    }

    /// Apply the configured priority ceiling to every colonist, lowering
    /// stored priorities that already exceed it.
    pub fn apply_config(&mut self, config: &ManagerConfig) {
        for colonist in &mut self.colonists {
            colonist.max_priority = config.max_priority;
            for (work, priority) in colonist.priorities.iter_mut() {
                if *priority > config.max_priority {
                    warn!(
                        colonist = %colonist.id,
                        work = %work,
                        priority = *priority,
                        max = config.max_priority,
                        "stored priority clamped"
                    );
                    *priority = config.max_priority;
                }
            }
        }
    }

    pub fn colonist(&self, id: &ColonistId) -> Option<&ColonistRecord> {
        self.colonists.iter().find(|c| &c.id == id)
    }

    pub fn colonist_mut(&mut self, id: &ColonistId) -> Option<&mut ColonistRecord> {
        self.colonists.iter_mut().find(|c| &c.id == id)
    }

    /// Living colonists standing on `map`.
    pub fn free_colonists(&self, map: MapId) -> impl Iterator<Item = &ColonistRecord> + '_ {
        self.colonists
            .iter()
            .filter(move |c| c.map == map && !c.dead)
    }

    pub fn free_colonists_mut(
        &mut self,
        map: MapId,
    ) -> impl Iterator<Item = &mut ColonistRecord> + '_ {
        self.colonists
            .iter_mut()
            .filter(move |c| c.map == map && !c.dead)
    }

    pub fn living_colonists(&self) -> impl Iterator<Item = &ColonistRecord> + '_ {
        self.colonists.iter().filter(|c| !c.dead)
    }

    pub fn kill(&mut self, id: &ColonistId) -> bool {
        match self.colonist_mut(id) {
            Some(c) => {
                c.dead = true;
                true
            }
            None => false,
        }
    }

    pub fn remove_colonist(&mut self, id: &ColonistId) -> bool {
        let before = self.colonists.len();
        self.colonists.retain(|c| &c.id != id);
        before != self.colonists.len()
    }

    pub fn add_map(&mut self, map: MapId) {
        if !self.maps.contains(&map) {
            self.maps.push(map);
        }
        if self.current_map.is_none() {
            self.current_map = Some(map);
        }
    }

    /// Move a colonist onto a known map.
    pub fn move_colonist(&mut self, id: &ColonistId, map: MapId) -> bool {
        if !self.maps.contains(&map) {
            return false;
        }
        match self.colonist_mut(id) {
            Some(c) => {
                c.map = map;
                true
            }
            None => false,
        }
    }

    /// Abandon a map. Its dead are left behind; the living travel to the
    /// current map, or keep their old map id while no map remains.
    pub fn remove_map(&mut self, map: MapId) -> bool {
        if !self.maps.contains(&map) {
            return false;
        }
        self.maps.retain(|m| *m != map);
        if self.current_map == Some(map) || self.current_map.is_none() {
            self.current_map = self.maps.first().copied();
        }
        self.colonists.retain(|c| c.map != map || !c.dead);
        if let Some(destination) = self.current_map {
            for colonist in self.colonists.iter_mut().filter(|c| c.map == map) {
                colonist.map = destination;
            }
        }
        true
    }

    pub fn set_current_map(&mut self, map: MapId) -> bool {
        if self.maps.contains(&map) {
            self.current_map = Some(map);
            true
        } else {
            false
        }
    }
}

impl WorkCatalog for World {
    fn work_types(&self) -> &[WorkTypeId] {
        &self.work_types
    }
}

impl MapProvider for World {
    fn live_maps(&self) -> Vec<MapId> {
        self.maps.clone()
    }

    fn current_map(&self) -> Option<MapId> {
        self.current_map
    }
}

impl ColonistRegistry for World {
    fn is_alive(&self, id: &ColonistId) -> bool {
        self.colonist(id).map(|c| !c.dead).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = r#"
workTypes: [Firefighter, Cooking, Hauling]
maps: [7, 9]
colonists:
  - id: Thing_Human1
    name: Ada
    map: 7
    priorities: { Cooking: 1 }
  - id: Thing_Human2
    name: Bo
    map: 9
"#;

    #[test]
    fn seed_defaults_current_map_to_first_map() {
        let world = World::from_yaml(SEED).unwrap();
        assert_eq!(world.current_map(), Some(MapId(7)));
        assert_eq!(world.work_types().len(), 3);
        assert_eq!(world.free_colonists(MapId(7)).count(), 1);
    }

    #[test]
    fn set_priority_clamps_to_configured_ceiling() {
        let mut world = World::from_yaml(SEED).unwrap();
        world.apply_config(&ManagerConfig {
            max_priority: 2,
            ..ManagerConfig::default()
        });
        let id = ColonistId::new("Thing_Human1");
        let cooking = WorkTypeId::new("Cooking");
        world.colonist_mut(&id).unwrap().set_priority(&cooking, 4);
        assert_eq!(world.colonist(&id).unwrap().priority(&cooking), 2);
    }

    #[test]
    fn dead_and_removed_colonists_are_not_alive() {
        let mut world = World::from_yaml(SEED).unwrap();
        let ada = ColonistId::new("Thing_Human1");
        let bo = ColonistId::new("Thing_Human2");
        assert!(world.kill(&ada));
        assert!(world.remove_colonist(&bo));
        assert!(!world.is_alive(&ada));
        assert!(!world.is_alive(&bo));
        assert_eq!(world.free_colonists(MapId(7)).count(), 0);
    }

    #[test]
    fn apply_config_lowers_seeded_priorities_above_the_ceiling() {
        let seed = r#"
workTypes: [Cooking, Hauling]
maps: [1]
colonists:
  - id: Thing_Human5
    map: 1
    priorities: { Cooking: 9, Hauling: 2 }
"#;
        let mut world = World::from_yaml(seed).unwrap();
        world.apply_config(&ManagerConfig::default());
        let colonist = world.colonist(&ColonistId::new("Thing_Human5")).unwrap();
        assert_eq!(colonist.priority(&WorkTypeId::new("Cooking")), 4);
        assert_eq!(colonist.priority(&WorkTypeId::new("Hauling")), 2);
    }

    #[test]
    fn removing_current_map_moves_view_and_survivors_to_remaining_map() {
        let mut world = World::from_yaml(SEED).unwrap();
        assert!(world.remove_map(MapId(7)));
        assert_eq!(world.current_map(), Some(MapId(9)));
        let ada = world.colonist(&ColonistId::new("Thing_Human1")).unwrap();
        assert_eq!(ada.map, MapId(9));
        assert_eq!(world.free_colonists(MapId(9)).count(), 2);
    }

    #[test]
    fn removing_a_map_leaves_its_dead_behind() {
        let mut world = World::from_yaml(SEED).unwrap();
        world.kill(&ColonistId::new("Thing_Human1"));
        assert!(world.remove_map(MapId(7)));
        assert!(world.colonist(&ColonistId::new("Thing_Human1")).is_none());
        assert!(!world.remove_map(MapId(7)));
    }

    #[test]
    fn removing_the_last_map_keeps_living_colonists_in_transit() {
        let mut world = World::from_yaml(SEED).unwrap();
        world.remove_map(MapId(9));
        world.remove_map(MapId(7));
        assert_eq!(world.current_map(), None);
        assert_eq!(world.colonists.len(), 2);
        assert!(world.colonists.iter().all(|c| c.map == MapId(7)));

        world.add_map(MapId(11));
        let ada = ColonistId::new("Thing_Human1");
        assert!(world.move_colonist(&ada, MapId(11)));
        assert!(!world.move_colonist(&ada, MapId(12)));
        assert_eq!(world.free_colonists(MapId(11)).count(), 1);
    }
}
