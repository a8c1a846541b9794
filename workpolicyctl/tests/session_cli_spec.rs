use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SEED: &str = r#"
workTypes: [Firefighter, Cooking, Hauling]
maps: [1]
colonists:
  - id: Thing_Human1
    name: Ada
    map: 1
    priorities: { Firefighter: 1, Cooking: 2 }
  - id: Thing_Human2
    name: Bo
    map: 1
    priorities: { Hauling: 3 }
"#;

fn setup() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let seed = dir.path().join("world.yaml");
    fs::write(&seed, SEED).unwrap();
    let session = dir.path().join("session.json");
    ctl(&session)
        .args(["init", "--world"])
        .arg(&seed)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 maps, 2 colonists"));
    (dir, session)
}

fn ctl(session: &Path) -> Command {
    let mut cmd = Command::cargo_bin("workpolicyctl").unwrap();
    cmd.env_remove("WORKPOLICY_DEFAULT_NAME")
        .env_remove("WORKPOLICY_MAX_PRIORITY")
        .arg("--session")
        .arg(session);
    cmd
}

fn state(session: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(session).unwrap()).unwrap()
}

fn priority(session: &Path, colonist: &str, work: &str) -> u64 {
    let v = state(session);
    v["world"]["colonists"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["id"] == colonist)
        .unwrap()["priorities"][work]
        .as_u64()
        .unwrap_or(0)
}

#[test]
fn given_existing_session_when_init_without_force_then_error() {
    let (dir, session) = setup();
    ctl(&session)
        .args(["init", "--world"])
        .arg(dir.path().join("world.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn given_two_policies_when_switching_then_priorities_follow_policy() {
    let (_dir, session) = setup();
    ctl(&session).args(["policy", "add", "Night"]).assert().success();

    ctl(&session).args(["switch", "Night"]).assert().success();
    ctl(&session)
        .args(["colonist", "set", "Thing_Human1", "Cooking", "4"])
        .assert()
        .success();
    ctl(&session).args(["switch", "Default"]).assert().success();
    assert_eq!(priority(&session, "Thing_Human1", "Cooking"), 2);

    ctl(&session).args(["switch", "1"]).assert().success();
    assert_eq!(priority(&session, "Thing_Human1", "Cooking"), 4);
}

#[test]
fn given_unknown_policy_when_load_then_error() {
    let (_dir, session) = setup();
    ctl(&session)
        .args(["load", "Weekend"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown policy: Weekend"));
}

#[test]
fn given_default_policy_when_delete_then_refused() {
    let (_dir, session) = setup();
    ctl(&session)
        .args(["policy", "delete", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be deleted"));
}

#[test]
fn given_active_policy_deleted_then_map_falls_back_to_default() {
    let (_dir, session) = setup();
    ctl(&session).args(["policy", "add", "Night"]).assert().success();
    ctl(&session).args(["switch", "Night"]).assert().success();
    ctl(&session)
        .args(["policy", "delete", "Night"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fell back to the default policy"));

    let v = state(&session);
    assert_eq!(v["policies"]["activePolicies"][0]["policy"], 0);
    assert_eq!(v["policies"]["policies"].as_array().unwrap().len(), 1);
}

#[test]
fn given_saved_policy_when_pasted_then_target_gets_copies() {
    let (_dir, session) = setup();
    ctl(&session).args(["save"]).assert().success();
    ctl(&session).args(["policy", "add", "Copy"]).assert().success();
    ctl(&session).args(["load", "Copy"]).assert().success();
    ctl(&session)
        .args(["paste", "--from", "Default"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pasted 2 of 2 links"));

    let v = state(&session);
    let links = v["policies"]["links"].as_array().unwrap();
    assert_eq!(links.iter().filter(|l| l["policy"] == 1).count(), 2);
    assert_eq!(links.iter().filter(|l| l["policy"] == 0).count(), 2);
}

#[test]
fn given_dead_colonist_when_clean_then_links_removed() {
    let (_dir, session) = setup();
    ctl(&session).args(["save"]).assert().success();
    ctl(&session)
        .args(["colonist", "kill", "Thing_Human2"])
        .assert()
        .success();
    ctl(&session)
        .args(["clean"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 links of dead colonists"));
}

#[test]
fn given_resettled_colony_when_clean_then_settings_move() {
    let (_dir, session) = setup();
    ctl(&session).args(["save"]).assert().success();
    ctl(&session).args(["map", "add", "8"]).assert().success();
    ctl(&session)
        .args(["colonist", "add", "Thing_Human3", "--map", "8"])
        .assert()
        .success();
    ctl(&session)
        .args(["map", "abandon", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("survivors moved to map 8"));
    ctl(&session)
        .args(["clean"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Moved settings of map 1 to map 8"))
        .stdout(predicate::str::contains("Removed 0 links of dead colonists"));

    let v = state(&session);
    assert_eq!(v["policies"]["activePolicies"][0]["map"], 8);
    let links = v["policies"]["links"].as_array().unwrap();
    assert_eq!(links.len(), 2);
    assert!(links.iter().all(|l| l["map"] == 8));
    assert!(v["world"]["colonists"]
        .as_array()
        .unwrap()
        .iter()
        .all(|c| c["map"] == 8));
}

#[test]
fn given_resettled_colony_when_loaded_then_survivors_get_saved_settings() {
    let (_dir, session) = setup();
    ctl(&session).args(["save"]).assert().success();
    ctl(&session).args(["map", "add", "8"]).assert().success();
    ctl(&session).args(["map", "abandon", "1"]).assert().success();
    ctl(&session).args(["clean"]).assert().success();
    ctl(&session)
        .args(["colonist", "set", "Thing_Human1", "Cooking", "4"])
        .assert()
        .success();

    ctl(&session).args(["load", "Default"]).assert().success();
    assert_eq!(priority(&session, "Thing_Human1", "Cooking"), 2);
}

#[test]
fn given_colonist_when_moved_to_unknown_map_then_fails() {
    let (_dir, session) = setup();
    ctl(&session)
        .args(["colonist", "move", "Thing_Human1", "--map", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown map: 5"));
    ctl(&session).args(["map", "add", "5"]).assert().success();
    ctl(&session)
        .args(["colonist", "move", "Thing_Human1", "--map", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Thing_Human1 moved to map 5"));
}

#[test]
fn given_priority_above_ceiling_when_set_then_clamped() {
    let (_dir, session) = setup();
    ctl(&session)
        .env("WORKPOLICY_MAX_PRIORITY", "3")
        .args(["colonist", "set", "Thing_Human1", "Hauling", "9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Thing_Human1 Hauling = 3"));
}

#[test]
fn given_export_when_imported_then_policies_restored() {
    let (dir, session) = setup();
    let export = dir.path().join("policies.json");
    ctl(&session).args(["policy", "add", "Harvest"]).assert().success();
    ctl(&session).args(["policy", "export"]).arg(&export).assert().success();
    ctl(&session).args(["policy", "delete", "Harvest"]).assert().success();
    ctl(&session).args(["policy", "import"]).arg(&export).assert().success();

    ctl(&session)
        .args(["policy", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Policy 1: Harvest"));
}

#[test]
fn given_show_json_then_reports_policies_and_current_map() {
    let (_dir, session) = setup();
    let out = ctl(&session).args(["show", "--json"]).output().unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["currentMap"], 1);
    assert_eq!(v["policies"][0]["name"], "Default");
}
