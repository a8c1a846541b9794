//! Durable form of a [`WorkManager`]. The clipboard and the dirty flag are
//! session-only and never written out.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::PolicyError;
use crate::manager::WorkManager;
use crate::model::{MapActivePolicy, Policy, PolicyId, WorkLink};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySnapshot {
    pub version: u32,
    pub next_policy_id: u32,
    pub policies: Vec<Policy>,
    #[serde(default)]
    pub links: Vec<WorkLink>,
    #[serde(default)]
    pub active_policies: Vec<MapActivePolicy>,
}

impl WorkManager {
    pub fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot {
            version: SNAPSHOT_VERSION,
            next_policy_id: self.next_policy_id,
            policies: self.policies.clone(),
            links: self.links.clone(),
            active_policies: self.active_policies.clone(),
        }
    }

    /// Rebuild a manager from a snapshot, rejecting snapshots that break the
    /// manager's invariants.
    pub fn restore(snapshot: PolicySnapshot) -> Result<Self, PolicyError> {
        snapshot.validate()?;
        let mut next_policy_id = snapshot.next_policy_id;
        for policy in &snapshot.policies {
            let after = policy
                .id
                .0
                .checked_add(1)
                .ok_or(PolicyError::PolicyIdExhausted { last: policy.id })?;
            next_policy_id = next_policy_id.max(after);
        }
        debug!(
            policies = snapshot.policies.len(),
            links = snapshot.links.len(),
            "snapshot.restored"
        );
        Ok(WorkManager::from_parts(
            snapshot.policies,
            snapshot.links,
            snapshot.active_policies,
            next_policy_id,
        ))
    }
}

impl PolicySnapshot {
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(PolicyError::UnsupportedVersion {
                version: self.version,
            });
        }

        let mut ids = HashSet::new();
        for policy in &self.policies {
            if !ids.insert(policy.id) {
                return Err(PolicyError::DuplicatePolicy { id: policy.id });
            }
            if policy.id.0 == u32::MAX {
                return Err(PolicyError::PolicyIdExhausted { last: policy.id });
            }
        }
        if !ids.contains(&PolicyId::DEFAULT) {
            return Err(PolicyError::MissingDefaultPolicy);
        }

        let mut triples = HashSet::new();
        for link in &self.links {
            if !ids.contains(&link.policy) {
                return Err(PolicyError::UnknownPolicy { id: link.policy });
            }
            if !triples.insert((&link.colonist, link.policy, link.map)) {
                return Err(PolicyError::DuplicateLink {
                    colonist: link.colonist.clone(),
                    policy: link.policy,
                    map: link.map,
                });
            }
        }

        let mut maps = HashSet::new();
        for record in &self.active_policies {
            if !ids.contains(&record.policy) {
                return Err(PolicyError::UnknownPolicy { id: record.policy });
            }
            if !maps.insert(record.map) {
                return Err(PolicyError::DuplicateMapRecord { map: record.map });
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, PolicyError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, PolicyError> {
        Ok(serde_json::from_str(raw)?)
    }

    #[instrument(skip(self))]
    pub fn save_to_file(&self, path: &Path) -> Result<(), PolicyError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        debug!("snapshot written");
        Ok(())
    }

    #[instrument]
    pub fn load_from_file(path: &Path) -> Result<Self, PolicyError> {
        let raw = fs::read_to_string(path).map_err(|e| PolicyError::IoError {
            message: format!("Failed to read snapshot {}: {}", path.display(), e),
        })?;
        Self::from_json(&raw)
    }
}
