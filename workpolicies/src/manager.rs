use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::config::ManagerConfig;
use crate::error::PolicyError;
use crate::host::{Colonist, ColonistRegistry, MapProvider, WorkCatalog};
use crate::model::{Clipboard, ColonistId, MapActivePolicy, MapId, Policy, PolicyId, WorkLink};

/// Outcome of [`WorkManager::clean_dead_maps`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapCleanup {
    /// `(stale, live)` pairs whose settings were moved to the surviving map.
    pub migrated: Vec<(MapId, MapId)>,
    pub removed: Vec<MapId>,
}

/// Owns every policy, work link and per-map active policy of a game session.
#[derive(Debug, Clone)]
pub struct WorkManager {
    pub(crate) policies: Vec<Policy>,
    pub(crate) links: Vec<WorkLink>,
    pub(crate) active_policies: Vec<MapActivePolicy>,
    pub(crate) next_policy_id: u32,
    clipboard: Clipboard,
    dirty: bool,
}

impl WorkManager {
    pub fn new(config: &ManagerConfig) -> Self {
        Self::from_parts(
            vec![Policy::new(
                PolicyId::DEFAULT,
                config.default_policy_name.clone(),
            )],
            Vec::new(),
            Vec::new(),
            PolicyId::DEFAULT.0 + 1,
        )
    }

    pub(crate) fn from_parts(
        policies: Vec<Policy>,
        links: Vec<WorkLink>,
        active_policies: Vec<MapActivePolicy>,
        next_policy_id: u32,
    ) -> Self {
        Self {
            policies,
            links,
            active_policies,
            next_policy_id,
            clipboard: Clipboard::default(),
            dirty: false,
        }
    }

    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    pub fn policy(&self, id: PolicyId) -> Option<&Policy> {
        self.policies.iter().find(|p| p.id == id)
    }

    pub fn policy_by_name(&self, name: &str) -> Option<&Policy> {
        self.policies.iter().find(|p| p.name == name)
    }

    pub fn links(&self) -> &[WorkLink] {
        &self.links
    }

    pub fn links_for(&self, policy: PolicyId) -> impl Iterator<Item = &WorkLink> + '_ {
        self.links.iter().filter(move |l| l.policy == policy)
    }

    pub fn active_policies(&self) -> &[MapActivePolicy] {
        &self.active_policies
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    /// Set whenever a map's active policy was changed behind the UI's back.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read and clear the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn add_policy(&mut self, name: impl Into<String>) -> Result<PolicyId, PolicyError> {
        let id = PolicyId(self.next_policy_id);
        self.next_policy_id = self
            .next_policy_id
            .checked_add(1)
            .ok_or(PolicyError::PolicyIdExhausted { last: id })?;
        let policy = Policy::new(id, name);
        info!(policy = %id, name = %policy.name, "policy.added");
        self.policies.push(policy);
        Ok(id)
    }

    pub fn rename_policy(&mut self, id: PolicyId, name: impl Into<String>) -> bool {
        match self.policies.iter_mut().find(|p| p.id == id) {
            Some(policy) => {
                policy.name = name.into();
                info!(policy = %id, name = %policy.name, "policy.renamed");
                true
            }
            None => {
                debug!(policy = %id, "rename skipped: unknown policy");
                false
            }
        }
    }

    /// Active policy of `map`, falling back to the default policy.
    pub fn active_policy_on(&self, map: MapId) -> PolicyId {
        self.active_policies
            .iter()
            .find(|r| r.map == map)
            .map(|r| r.policy)
            .unwrap_or(PolicyId::DEFAULT)
    }

    /// Active policy of the current map; the default policy when no map is shown.
    pub fn active_policy(&self, maps: &impl MapProvider) -> PolicyId {
        maps.current_map()
            .map(|m| self.active_policy_on(m))
            .unwrap_or(PolicyId::DEFAULT)
    }

    /// Active policy of `map`, recording the default policy for it on first use.
    fn ensure_active_policy(&mut self, map: MapId) -> PolicyId {
        if let Some(record) = self.active_policies.iter().find(|r| r.map == map) {
            return record.policy;
        }
        debug!(map = %map, "map.active_policy.created");
        self.active_policies.push(MapActivePolicy {
            map,
            policy: PolicyId::DEFAULT,
        });
        PolicyId::DEFAULT
    }

    pub fn set_active_policy(&mut self, map: MapId, policy: PolicyId) -> bool {
        if self.policy(policy).is_none() {
            warn!(policy = %policy, map = %map, "cannot activate unknown policy");
            return false;
        }
        match self.active_policies.iter_mut().find(|r| r.map == map) {
            Some(record) => record.policy = policy,
            None => self.active_policies.push(MapActivePolicy { map, policy }),
        }
        debug!(policy = %policy, map = %map, "map.active_policy.set");
        true
    }

    /// Remove a policy and everything stored under it. Maps that had it
    /// active fall back to the default policy and the dirty flag is raised.
    /// The default policy is never removed.
    pub fn delete_policy(&mut self, id: PolicyId) -> bool {
        if id.is_default() {
            debug!("delete skipped: default policy is permanent");
            return false;
        }

        let before = self.links.len();
        self.links.retain(|l| l.policy != id);
        let removed_links = before - self.links.len();

        let existed = match self.policies.iter().position(|p| p.id == id) {
            Some(pos) => {
                self.policies.remove(pos);
                true
            }
            None => false,
        };

        for record in self.active_policies.iter_mut().filter(|r| r.policy == id) {
            record.policy = PolicyId::DEFAULT;
            self.dirty = true;
        }

        info!(policy = %id, removed_links, existed, "policy.deleted");
        existed
    }

    pub fn delete_links_in_map(&mut self, map: MapId) -> usize {
        let before = self.links.len();
        self.links.retain(|l| l.map != map);
        before - self.links.len()
    }

    pub fn delete_map(&mut self, map: MapId) -> bool {
        let before = self.active_policies.len();
        self.active_policies.retain(|r| r.map != map);
        before != self.active_policies.len()
    }

    /// Move `from`'s links to `to`. Links already on `to` for the same
    /// colonist and policy are replaced by the moved ones.
    pub fn move_links_to_map(&mut self, from: MapId, to: MapId) -> usize {
        if from == to {
            return 0;
        }
        let incoming: HashSet<(ColonistId, PolicyId)> = self
            .links
            .iter()
            .filter(|l| l.map == from)
            .map(|l| (l.colonist.clone(), l.policy))
            .collect();
        self.links
            .retain(|l| l.map != to || !incoming.contains(&(l.colonist.clone(), l.policy)));

        let mut moved = 0;
        for link in self.links.iter_mut().filter(|l| l.map == from) {
            link.map = to;
            moved += 1;
        }
        moved
    }

    /// Snapshot the live priorities of `colonists` into the active policy of `map`.
    pub fn save_current_state<'a, C, I>(
        &mut self,
        colonists: I,
        catalog: &(impl WorkCatalog + ?Sized),
        map: MapId,
    ) where
        C: Colonist + 'a,
        I: IntoIterator<Item = &'a C>,
    {
        let policy = self.ensure_active_policy(map);
        let mut saved = 0usize;
        for colonist in colonists {
            let idx = match self
                .links
                .iter()
                .position(|l| l.matches(colonist.id(), policy, map))
            {
                Some(idx) => idx,
                None => {
                    debug!(colonist = %colonist.id(), policy = %policy, map = %map, "link.created");
                    self.links
                        .push(WorkLink::new(colonist.id().clone(), policy, map));
                    self.links.len() - 1
                }
            };
            Self::save_pawn_priorities(colonist, &mut self.links[idx], catalog);
            saved += 1;
        }
        debug!(policy = %policy, map = %map, saved, "state.saved");
    }

    /// Drop links of colonists that are gone. A colonist missing from the
    /// live list but still alive elsewhere keeps its links.
    pub fn clean_dead_colonists<'a, C, I>(
        &mut self,
        colonists: I,
        registry: &impl ColonistRegistry,
    ) -> usize
    where
        C: Colonist + 'a,
        I: IntoIterator<Item = &'a C>,
    {
        let live: HashSet<_> = colonists.into_iter().map(|c| c.id().clone()).collect();
        let before = self.links.len();
        self.links
            .retain(|l| live.contains(&l.colonist) || registry.is_alive(&l.colonist));
        let removed = before - self.links.len();
        if removed > 0 {
            info!(removed, "links.dead_colonists.removed");
        }
        removed
    }

    pub fn active_policies_contains_valid_map(&self, maps: &impl MapProvider) -> bool {
        let live = maps.live_maps();
        self.references_any(&live)
    }

    fn references_any(&self, maps: &[MapId]) -> bool {
        self.active_policies.iter().any(|r| maps.contains(&r.map))
    }

    /// Resolve active-policy records whose map no longer exists.
    ///
    /// When the only live map has no record yet, the player resettled
    /// without a base: the stale record and its links move to that map.
    /// Otherwise the stale map's links and record are dropped. Each stale
    /// record is judged against the records as they stand after the
    /// previous decisions.
    pub fn clean_dead_maps(&mut self, maps: &impl MapProvider) -> MapCleanup {
        let live = maps.live_maps();
        let stale: Vec<MapId> = self
            .active_policies
            .iter()
            .filter(|r| !live.contains(&r.map))
            .map(|r| r.map)
            .collect();

        let mut outcome = MapCleanup::default();
        for map in stale {
            if live.len() == 1 && !self.references_any(&live) {
                let target = live[0];
                let moved = self.move_links_to_map(map, target);
                if let Some(record) = self.active_policies.iter_mut().find(|r| r.map == map) {
                    record.map = target;
                }
                info!(from = %map, to = %target, moved, "map.migrated");
                outcome.migrated.push((map, target));
            } else {
                let removed_links = self.delete_links_in_map(map);
                self.delete_map(map);
                info!(map = %map, removed_links, "map.removed");
                outcome.removed.push(map);
            }
        }
        outcome
    }

    /// Restore `policy` onto `colonists` on `map` and make it the map's
    /// active policy. Unknown policies are ignored.
    pub fn load_state<'a, C, I>(&mut self, colonists: I, map: MapId, policy: PolicyId) -> bool
    where
        C: Colonist + 'a,
        I: IntoIterator<Item = &'a mut C>,
    {
        if self.policy(policy).is_none() {
            warn!(policy = %policy, "load skipped: unknown policy");
            return false;
        }
        let restored = apply_links(&self.links, map, policy, colonists);
        self.set_active_policy(map, policy);
        info!(policy = %policy, map = %map, restored, "state.loaded");
        true
    }

    /// Save the live priorities under the current policy, then load `policy`.
    pub fn switch_policy<'a, C, I>(
        &mut self,
        colonists: I,
        catalog: &(impl WorkCatalog + ?Sized),
        map: MapId,
        policy: PolicyId,
    ) -> bool
    where
        C: Colonist + 'a,
        I: IntoIterator<Item = &'a mut C>,
    {
        if self.policy(policy).is_none() {
            warn!(policy = %policy, "switch skipped: unknown policy");
            return false;
        }
        let mut colonists: Vec<&'a mut C> = colonists.into_iter().collect();
        self.save_current_state(colonists.iter().map(|c| &**c), catalog, map);
        self.load_state(colonists.iter_mut().map(|c| &mut **c), map, policy)
    }

    /// Write every catalog work type's live priority into `link`, adding
    /// keys for work types the link has not seen yet.
    pub fn save_pawn_priorities<C: Colonist + ?Sized>(
        colonist: &C,
        link: &mut WorkLink,
        catalog: &(impl WorkCatalog + ?Sized),
    ) {
        for work in catalog.work_types() {
            link.settings.insert(work.clone(), colonist.priority(work));
        }
    }

    /// Replay only the priorities recorded in `link`.
    pub fn load_pawn_priorities<C: Colonist + ?Sized>(colonist: &mut C, link: &WorkLink) {
        for (work, priority) in &link.settings {
            colonist.set_priority(work, *priority);
        }
    }

    /// Replace the clipboard with copies of the active policy's links.
    pub fn copy_to_clipboard(&mut self, map: MapId) -> usize {
        let policy = self.ensure_active_policy(map);
        let entries: Vec<WorkLink> = self.links_for(policy).cloned().collect();
        let copied = entries.len();
        self.clipboard.fill(policy, entries);
        info!(policy = %policy, copied, "clipboard.copied");
        copied
    }

    /// Replace the active policy's links with the clipboard contents and
    /// apply them to `colonists`. Does nothing for an empty clipboard or
    /// when the clipboard came from the active policy itself.
    pub fn paste_to_active_policy<'a, C, I>(&mut self, colonists: I, map: MapId) -> usize
    where
        C: Colonist + 'a,
        I: IntoIterator<Item = &'a mut C>,
    {
        let policy = self.active_policy_on(map);
        if self.clipboard.is_empty() {
            debug!("paste skipped: clipboard is empty");
            return 0;
        }
        if self.clipboard.source() == Some(policy) {
            debug!(policy = %policy, "paste skipped: clipboard came from the active policy");
            return 0;
        }

        self.ensure_active_policy(map);
        self.links.retain(|l| l.policy != policy);
        let pasted: Vec<WorkLink> = self
            .clipboard
            .entries()
            .iter()
            .map(|l| l.retargeted(policy))
            .collect();
        let count = pasted.len();
        self.links.extend(pasted);
        info!(policy = %policy, pasted = count, "clipboard.pasted");

        self.load_state(colonists, map, policy);
        count
    }
}

/// Apply the links stored for `policy` on `map` to every matching colonist.
/// Returns how many colonists had a link.
pub fn apply_links<'a, C, I>(
    links: &[WorkLink],
    map: MapId,
    policy: PolicyId,
    colonists: I,
) -> usize
where
    C: Colonist + 'a,
    I: IntoIterator<Item = &'a mut C>,
{
    let scoped: Vec<&WorkLink> = links
        .iter()
        .filter(|l| l.map == map)
        .filter(|l| l.policy == policy)
        .collect();

    let mut restored = 0;
    for colonist in colonists {
        let id = colonist.id().clone();
        let mut found = false;
        for link in scoped.iter().filter(|l| l.colonist == id) {
            WorkManager::load_pawn_priorities(&mut *colonist, link);
            found = true;
        }
        if found {
            restored += 1;
        }
    }
    restored
}
