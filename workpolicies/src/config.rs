use crate::error::PolicyError;
use crate::model::Priority;

pub const DEFAULT_POLICY_NAME: &str = "Default";
pub const DEFAULT_MAX_PRIORITY: Priority = 4;

const ENV_DEFAULT_NAME: &str = "WORKPOLICY_DEFAULT_NAME";
const ENV_MAX_PRIORITY: &str = "WORKPOLICY_MAX_PRIORITY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    pub default_policy_name: String,
    /// Highest priority a colonist may hold; 0 stays "disabled".
    pub max_priority: Priority,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            default_policy_name: DEFAULT_POLICY_NAME.to_string(),
            max_priority: DEFAULT_MAX_PRIORITY,
        }
    }
}

pub fn load_from_env() -> Result<ManagerConfig, PolicyError> {
    let mut cfg = ManagerConfig::default();

    if let Ok(raw) = std::env::var(ENV_DEFAULT_NAME) {
        let name = raw.trim();
        if name.is_empty() {
            return Err(PolicyError::InvalidConfig {
                key: ENV_DEFAULT_NAME.to_string(),
                message: "must not be empty".to_string(),
            });
        }
        cfg.default_policy_name = name.to_string();
    }

    if let Ok(raw) = std::env::var(ENV_MAX_PRIORITY) {
        cfg.max_priority = parse_max_priority(&raw)?;
    }

    Ok(cfg)
}

fn parse_max_priority(raw: &str) -> Result<Priority, PolicyError> {
    let value: Priority = raw.trim().parse().map_err(|_| PolicyError::InvalidConfig {
        key: ENV_MAX_PRIORITY.to_string(),
        message: format!("'{}' is not an integer between 1 and {}", raw, Priority::MAX),
    })?;
    if value == 0 {
        return Err(PolicyError::InvalidConfig {
            key: ENV_MAX_PRIORITY.to_string(),
            message: "must be at least 1".to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_priority_accepts_padded_integers() {
        assert_eq!(parse_max_priority(" 9 ").unwrap(), 9);
    }

    #[test]
    fn max_priority_rejects_zero_and_garbage() {
        assert!(matches!(
            parse_max_priority("0"),
            Err(PolicyError::InvalidConfig { .. })
        ));
        assert!(parse_max_priority("four").is_err());
        assert!(parse_max_priority("300").is_err());
    }
}
