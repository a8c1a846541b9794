use anyhow::{bail, Context, Result};
use serde_json::json;
use std::fs;
use std::path::Path;
use tracing::info;
use workpolicies::{
    Colonist, ColonistId, ColonistRecord, ManagerConfig, MapId, MapProvider, PolicyId,
    PolicySnapshot, WorkManager, WorkTypeId, World,
};

use crate::session::Session;

fn with_session<F>(path: &Path, config: &ManagerConfig, f: F) -> Result<()>
where
    F: FnOnce(&mut Session) -> Result<()>,
{
    let mut session = Session::load(path, config)?;
    f(&mut session)?;
    session.save(path)
}

/// Accepts a numeric policy id or an exact policy name.
fn resolve_policy(manager: &WorkManager, key: &str) -> Result<PolicyId> {
    if let Ok(raw) = key.parse::<u32>() {
        if let Some(p) = manager.policy(PolicyId(raw)) {
            return Ok(p.id);
        }
    }
    match manager.policy_by_name(key) {
        Some(p) => Ok(p.id),
        None => bail!("Unknown policy: {}", key),
    }
}

fn current_map(world: &World) -> Result<MapId> {
    world
        .current_map()
        .context("No current map. Use `map add` or `map switch` first")
}

pub fn init(path: &Path, seed: &Path, force: bool, config: &ManagerConfig) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Session file {} already exists (use --force to overwrite)",
            path.display()
        );
    }
    let raw = fs::read_to_string(seed)
        .with_context(|| format!("reading world seed: {}", seed.display()))?;
    let world = World::from_yaml(&raw).with_context(|| "parsing world yaml")?;
    let session = Session::new(world, config);
    session.save(path)?;
    info!(path = %path.display(), "session.created");
    println!(
        "Created session {} ({} maps, {} colonists)",
        path.display(),
        session.world.maps.len(),
        session.world.colonists.len()
    );
    Ok(())
}

pub fn show(path: &Path, as_json: bool, config: &ManagerConfig) -> Result<()> {
    let session = Session::load(path, config)?;
    let world = &session.world;
    let manager = &session.manager;

    if as_json {
        let policies: Vec<_> = manager
            .policies()
            .iter()
            .map(|p| {
                json!({
                    "id": p.id,
                    "name": p.name,
                    "links": manager.links_for(p.id).count(),
                })
            })
            .collect();
        let out = json!({
            "currentMap": world.current_map(),
            "maps": world.maps,
            "activePolicies": manager.active_policies(),
            "policies": policies,
            "links": manager.links(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    match world.current_map() {
        Some(map) => println!("Current map: {}", map),
        None => println!("Current map: none"),
    }
    for map in &world.maps {
        let active = manager.active_policy_on(*map);
        let name = manager
            .policy(active)
            .map(|p| p.name.as_str())
            .unwrap_or("?");
        println!("Map {}: active policy {} ({})", map, active, name);
    }
    print_policies(manager);
    for colonist in &world.colonists {
        let status = if colonist.dead { " [dead]" } else { "" };
        let work: Vec<String> = world
            .work_types
            .iter()
            .map(|w| format!("{}={}", w, colonist.priority(w)))
            .collect();
        println!(
            "Colonist {} ({}) on map {}{}: {}",
            colonist.id,
            colonist.name,
            colonist.map,
            status,
            work.join(" ")
        );
    }
    Ok(())
}

fn print_policies(manager: &WorkManager) {
    for policy in manager.policies() {
        println!(
            "Policy {}: {} ({} links)",
            policy.id,
            policy.name,
            manager.links_for(policy.id).count()
        );
    }
}

pub fn show_policies(path: &Path, config: &ManagerConfig) -> Result<()> {
    let session = Session::load(path, config)?;
    print_policies(&session.manager);
    Ok(())
}

pub fn policy_add(path: &Path, name: &str, config: &ManagerConfig) -> Result<()> {
    with_session(path, config, |s| {
        if s.manager.policy_by_name(name).is_some() {
            bail!("Policy named '{}' already exists", name);
        }
        let id = s.manager.add_policy(name)?;
        println!("Added policy {}: {}", id, name);
        Ok(())
    })
}

pub fn policy_rename(path: &Path, key: &str, name: &str, config: &ManagerConfig) -> Result<()> {
    with_session(path, config, |s| {
        let id = resolve_policy(&s.manager, key)?;
        s.manager.rename_policy(id, name);
        println!("Renamed policy {} to {}", id, name);
        Ok(())
    })
}

pub fn policy_delete(path: &Path, key: &str, config: &ManagerConfig) -> Result<()> {
    with_session(path, config, |s| {
        let id = resolve_policy(&s.manager, key)?;
        if id.is_default() {
            bail!("The default policy cannot be deleted");
        }
        s.manager.delete_policy(id);
        println!("Deleted policy {}", id);
        if s.manager.take_dirty() {
            println!("Maps that used it fell back to the default policy");
        }
        Ok(())
    })
}

pub fn policy_export(path: &Path, file: &Path, config: &ManagerConfig) -> Result<()> {
    let session = Session::load(path, config)?;
    session
        .manager
        .snapshot()
        .save_to_file(file)
        .with_context(|| format!("exporting policies to {}", file.display()))?;
    println!("Exported policies to {}", file.display());
    Ok(())
}

pub fn policy_import(path: &Path, file: &Path, config: &ManagerConfig) -> Result<()> {
    with_session(path, config, |s| {
        let snapshot = PolicySnapshot::load_from_file(file)?;
        s.manager = WorkManager::restore(snapshot)
            .with_context(|| format!("importing policies from {}", file.display()))?;
        println!(
            "Imported {} policies from {}",
            s.manager.policies().len(),
            file.display()
        );
        Ok(())
    })
}

pub fn map_add(path: &Path, map: u32, config: &ManagerConfig) -> Result<()> {
    with_session(path, config, |s| {
        s.world.add_map(MapId(map));
        println!("Added map {}", map);
        Ok(())
    })
}

pub fn map_switch(path: &Path, map: u32, config: &ManagerConfig) -> Result<()> {
    with_session(path, config, |s| {
        if !s.world.set_current_map(MapId(map)) {
            bail!("Unknown map: {}", map);
        }
        println!("Current map is now {}", map);
        Ok(())
    })
}

pub fn map_abandon(path: &Path, map: u32, config: &ManagerConfig) -> Result<()> {
    with_session(path, config, |s| {
        if !s.world.remove_map(MapId(map)) {
            bail!("Unknown map: {}", map);
        }
        match s.world.current_map() {
            Some(current) => {
                println!("Abandoned map {}; survivors moved to map {}", map, current)
            }
            None => println!("Abandoned map {}; no map left to settle", map),
        }
        Ok(())
    })
}

pub fn colonist_add(
    path: &Path,
    id: &str,
    name: Option<&str>,
    map: u32,
    config: &ManagerConfig,
) -> Result<()> {
    with_session(path, config, |s| {
        if s.world.colonist(&ColonistId::new(id)).is_some() {
            bail!("Colonist {} already exists", id);
        }
        if !s.world.maps.contains(&MapId(map)) {
            bail!("Unknown map: {}", map);
        }
        s.world
            .colonists
            .push(ColonistRecord::new(id, name.unwrap_or(id), MapId(map)));
        s.world.apply_config(config);
        println!("Added colonist {} on map {}", id, map);
        Ok(())
    })
}

pub fn colonist_set(
    path: &Path,
    id: &str,
    work: &str,
    priority: u8,
    config: &ManagerConfig,
) -> Result<()> {
    with_session(path, config, |s| {
        let work = WorkTypeId::new(work);
        if !s.world.work_types.contains(&work) {
            bail!("Unknown work type: {}", work);
        }
        let colonist = s
            .world
            .colonist_mut(&ColonistId::new(id))
            .with_context(|| format!("Unknown colonist: {}", id))?;
        colonist.set_priority(&work, priority);
        println!("{} {} = {}", id, work, colonist.priority(&work));
        Ok(())
    })
}

pub fn colonist_move(path: &Path, id: &str, map: u32, config: &ManagerConfig) -> Result<()> {
    with_session(path, config, |s| {
        let colonist = ColonistId::new(id);
        if s.world.colonist(&colonist).is_none() {
            bail!("Unknown colonist: {}", id);
        }
        if !s.world.move_colonist(&colonist, MapId(map)) {
            bail!("Unknown map: {}", map);
        }
        println!("{} moved to map {}", id, map);
        Ok(())
    })
}

pub fn colonist_kill(path: &Path, id: &str, config: &ManagerConfig) -> Result<()> {
    with_session(path, config, |s| {
        if !s.world.kill(&ColonistId::new(id)) {
            bail!("Unknown colonist: {}", id);
        }
        println!("{} died", id);
        Ok(())
    })
}

pub fn colonist_remove(path: &Path, id: &str, config: &ManagerConfig) -> Result<()> {
    with_session(path, config, |s| {
        if !s.world.remove_colonist(&ColonistId::new(id)) {
            bail!("Unknown colonist: {}", id);
        }
        println!("{} left the world", id);
        Ok(())
    })
}

pub fn save(path: &Path, config: &ManagerConfig) -> Result<()> {
    with_session(path, config, |s| {
        let map = current_map(&s.world)?;
        s.manager
            .save_current_state(s.world.free_colonists(map), &s.world, map);
        let policy = s.manager.active_policy_on(map);
        println!("Saved map {} into policy {}", map, policy);
        Ok(())
    })
}

pub fn load(path: &Path, key: &str, config: &ManagerConfig) -> Result<()> {
    with_session(path, config, |s| {
        let map = current_map(&s.world)?;
        let policy = resolve_policy(&s.manager, key)?;
        s.manager
            .load_state(s.world.free_colonists_mut(map), map, policy);
        println!("Loaded policy {} on map {}", policy, map);
        Ok(())
    })
}

pub fn switch(path: &Path, key: &str, config: &ManagerConfig) -> Result<()> {
    with_session(path, config, |s| {
        let map = current_map(&s.world)?;
        let policy = resolve_policy(&s.manager, key)?;
        let previous = s.manager.active_policy_on(map);
        let catalog = s.world.work_types.clone();
        s.manager
            .switch_policy(s.world.free_colonists_mut(map), &catalog, map, policy);
        println!("Switched map {} from policy {} to {}", map, previous, policy);
        Ok(())
    })
}

pub fn paste(path: &Path, from: &str, config: &ManagerConfig) -> Result<()> {
    with_session(path, config, |s| {
        let map = current_map(&s.world)?;
        let source = resolve_policy(&s.manager, from)?;
        let target = s.manager.active_policy_on(map);
        if source == target {
            println!("Nothing to paste: policy {} is already active", source);
            return Ok(());
        }

        s.manager.set_active_policy(map, source);
        let copied = s.manager.copy_to_clipboard(map);
        s.manager.set_active_policy(map, target);
        let pasted = s
            .manager
            .paste_to_active_policy(s.world.free_colonists_mut(map), map);
        println!(
            "Pasted {} of {} links from policy {} into policy {}",
            pasted, copied, source, target
        );
        Ok(())
    })
}

pub fn clean(path: &Path, config: &ManagerConfig) -> Result<()> {
    with_session(path, config, |s| {
        // Maps first: migrated links must exist before liveness is checked.
        let outcome = s.manager.clean_dead_maps(&s.world);
        let removed = s
            .manager
            .clean_dead_colonists(s.world.living_colonists(), &s.world);
        println!("Removed {} links of dead colonists", removed);
        for (from, to) in &outcome.migrated {
            println!("Moved settings of map {} to map {}", from, to);
        }
        for map in &outcome.removed {
            println!("Removed settings of map {}", map);
        }
        Ok(())
    })
}
