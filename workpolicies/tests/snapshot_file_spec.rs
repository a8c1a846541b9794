use tempfile::TempDir;
use workpolicies::{
    ManagerConfig, MapId, MapProvider, PolicyError, PolicySnapshot, WorkManager, World,
};

fn seeded() -> (World, WorkManager) {
    let world = World::from_yaml(
        r#"
workTypes: [Cooking, Hauling]
maps: [3]
colonists:
  - { id: Thing_Human1, map: 3, priorities: { Cooking: 1, Hauling: 2 } }
"#,
    )
    .unwrap();
    let mut manager = WorkManager::new(&ManagerConfig::default());
    let map = world.current_map().unwrap();
    manager.save_current_state(world.free_colonists(map), &world, map);
    let evening = manager.add_policy("Evening").unwrap();
    manager.set_active_policy(MapId(3), evening);
    (world, manager)
}

#[test]
fn given_saved_snapshot_when_loaded_then_manager_is_equivalent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/policies.json");
    let (_world, manager) = seeded();

    manager.snapshot().save_to_file(&path).unwrap();
    let snapshot = PolicySnapshot::load_from_file(&path).unwrap();
    let restored = WorkManager::restore(snapshot).unwrap();

    assert_eq!(restored.policies(), manager.policies());
    assert_eq!(restored.links(), manager.links());
    assert_eq!(restored.active_policy_on(MapId(3)), manager.active_policy_on(MapId(3)));
}

#[test]
fn given_missing_file_when_loaded_then_io_error() {
    let dir = TempDir::new().unwrap();
    let err = PolicySnapshot::load_from_file(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, PolicyError::IoError { .. }));
}

#[test]
fn given_garbage_when_parsed_then_json_error() {
    let err = PolicySnapshot::from_json("{ not json").unwrap_err();
    assert!(matches!(err, PolicyError::JsonParsingFailed { .. }));
}

#[test]
fn given_snapshot_without_links_when_parsed_then_defaults_apply() {
    let raw = r#"{
        "version": 1,
        "nextPolicyId": 1,
        "policies": [ { "id": 0, "name": "Default" } ]
    }"#;
    let manager = WorkManager::restore(PolicySnapshot::from_json(raw).unwrap()).unwrap();
    assert!(manager.links().is_empty());
    assert!(manager.active_policies().is_empty());
}
