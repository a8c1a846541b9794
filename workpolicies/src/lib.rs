//! Work-priority policies for colony maps.
//!
//! A [`manager::WorkManager`] keeps named policies of per-colonist work
//! priorities, scoped per map. Live priorities are snapshotted into the
//! active policy, restored when a policy is loaded, and pruned when
//! colonists die or maps go away. The host game is reached only through
//! the traits in [`host`].

pub mod config;
pub mod error;
pub mod host;
pub mod manager;
pub mod model;
pub mod state;
pub mod world;

pub use config::{load_from_env, ManagerConfig};
pub use error::PolicyError;
pub use host::{Colonist, ColonistRegistry, MapProvider, WorkCatalog};
pub use manager::{apply_links, MapCleanup, WorkManager};
pub use model::{
    Clipboard, ColonistId, MapActivePolicy, MapId, Policy, PolicyId, Priority, WorkLink,
    WorkTypeId,
};
pub use state::PolicySnapshot;
pub use world::{ColonistRecord, World};
