// Inscriptions - Competition enrollment registry
// Competitions, candidates (individuals and teams) and who is enrolled where

pub mod config;
pub mod entities;
pub mod error;
pub mod registry;
pub mod snapshot;
pub mod store;

// Re-export commonly used types
pub use config::{ModeCheck, RegistryConfig, DEFAULT_SNAPSHOT_FILE};
pub use entities::{today, Candidate, CandidateKind, Competition, Person, Team};
pub use error::{RegistryError, Result};
pub use registry::Registry;
pub use snapshot::SnapshotData;
pub use store::{Event, NullStore, SqliteStore, Store};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Open the store named in `config` (if any) and load the configured
/// snapshot on top of it.
pub fn open(config: RegistryConfig) -> anyhow::Result<Registry> {
    let store: Box<dyn Store> = match &config.database_path {
        Some(path) => Box::new(SqliteStore::open(path)?),
        None => Box::new(NullStore),
    };
    let snapshot_path = config.snapshot_path.clone();

    Ok(snapshot::load(&snapshot_path, store, config))
}
