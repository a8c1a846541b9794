use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;
use workpolicies::{ManagerConfig, PolicySnapshot, WorkManager, World};

/// On-disk session: the host world plus the manager's persisted state.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFile {
    pub saved_at: DateTime<Utc>,
    pub world: World,
    pub policies: PolicySnapshot,
}

pub struct Session {
    pub world: World,
    pub manager: WorkManager,
}

impl Session {
    pub fn new(mut world: World, config: &ManagerConfig) -> Self {
        world.apply_config(config);
        Self {
            world,
            manager: WorkManager::new(config),
        }
    }

    pub fn load(path: &Path, config: &ManagerConfig) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading session file: {}", path.display()))?;
        let file: SessionFile = serde_json::from_str(&raw)
            .with_context(|| format!("parsing session file: {}", path.display()))?;
        let manager =
            WorkManager::restore(file.policies).context("restoring policy state")?;
        let mut world = file.world;
        world.apply_config(config);
        debug!(path = %path.display(), saved_at = %file.saved_at, "session.loaded");
        Ok(Self { world, manager })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = SessionFile {
            saved_at: Utc::now(),
            world: self.world.clone(),
            policies: self.manager.snapshot(),
        };
        let text = serde_json::to_string_pretty(&file).context("serializing session")?;
        fs::write(path, text)
            .with_context(|| format!("writing session file: {}", path.display()))?;
        debug!(path = %path.display(), "session.saved");
        Ok(())
    }
}
