use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Numeric work priority; 0 means the work type is disabled.
pub type Priority = u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyId(pub u32);

impl PolicyId {
    /// The built-in policy every map falls back to. It can never be deleted.
    pub const DEFAULT: PolicyId = PolicyId(0);

    pub fn is_default(self) -> bool {
        self == Self::DEFAULT
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapId(pub u32);

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColonistId(pub String);

impl ColonistId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColonistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catalog name of a work type, e.g. `Cooking` or `Mining`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkTypeId(pub String);

impl WorkTypeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub id: PolicyId,
    pub name: String,
}

impl Policy {
    pub fn new(id: PolicyId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Stored priorities of one colonist under one policy on one map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkLink {
    pub colonist: ColonistId,
    pub policy: PolicyId,
    pub map: MapId,
    #[serde(default)]
    pub settings: BTreeMap<WorkTypeId, Priority>,
}

impl WorkLink {
    pub fn new(colonist: ColonistId, policy: PolicyId, map: MapId) -> Self {
        Self {
            colonist,
            policy,
            map,
            settings: BTreeMap::new(),
        }
    }

    pub fn matches(&self, colonist: &ColonistId, policy: PolicyId, map: MapId) -> bool {
        self.policy == policy && self.map == map && &self.colonist == colonist
    }

    /// Deep copy of this link under another policy.
    pub fn retargeted(&self, policy: PolicyId) -> Self {
        Self {
            policy,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapActivePolicy {
    pub map: MapId,
    pub policy: PolicyId,
}

/// Value snapshots of one policy's links, taken by a copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clipboard {
    source: Option<PolicyId>,
    entries: Vec<WorkLink>,
}

impl Clipboard {
    pub(crate) fn fill(&mut self, source: PolicyId, entries: Vec<WorkLink>) {
        self.source = Some(source);
        self.entries = entries;
    }

    pub fn source(&self) -> Option<PolicyId> {
        self.source
    }

    pub fn entries(&self) -> &[WorkLink] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
