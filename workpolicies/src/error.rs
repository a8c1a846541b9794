use thiserror::Error;

use crate::model::{ColonistId, MapId, PolicyId};

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Invalid config value for {key}: {message}")]
    InvalidConfig { key: String, message: String },

    #[error("Unsupported snapshot version: {version}")]
    UnsupportedVersion { version: u32 },

    #[error("Snapshot is missing the default policy")]
    MissingDefaultPolicy,

    #[error("No policy ids left after {last}")]
    PolicyIdExhausted { last: PolicyId },

    #[error("Duplicate policy id: {id}")]
    DuplicatePolicy { id: PolicyId },

    #[error("Duplicate work link for colonist {colonist} in policy {policy} on map {map}")]
    DuplicateLink {
        colonist: ColonistId,
        policy: PolicyId,
        map: MapId,
    },

    #[error("Record references unknown policy: {id}")]
    UnknownPolicy { id: PolicyId },

    #[error("Duplicate active policy record for map {map}")]
    DuplicateMapRecord { map: MapId },

    #[error("JSON parsing failed: {message}")]
    JsonParsingFailed { message: String },

    #[error("YAML parsing failed: {message}")]
    YamlParsingFailed { message: String },

    #[error("IO error: {message}")]
    IoError { message: String },
}

impl From<serde_json::Error> for PolicyError {
    fn from(e: serde_json::Error) -> Self {
        PolicyError::JsonParsingFailed {
            message: e.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for PolicyError {
    fn from(e: serde_yaml::Error) -> Self {
        PolicyError::YamlParsingFailed {
            message: e.to_string(),
        }
    }
}

impl From<std::io::Error> for PolicyError {
    fn from(e: std::io::Error) -> Self {
        PolicyError::IoError {
            message: e.to_string(),
        }
    }
}
