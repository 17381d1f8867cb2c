// 💾 Snapshot - Whole-registry save/load
//
// One JSON file holds everything: competitions, candidates, enrollments.
// The payload is checksummed (SHA-256) so a truncated or hand-edited file
// is treated like a missing one.
//
// - save: written to a temp file in the same directory, then renamed over
//   the previous snapshot; errors are returned to the caller
// - load: any failure yields an empty registry (logged, not returned)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::config::RegistryConfig;
use crate::entities::{Candidate, Competition};
use crate::error::{RegistryError, Result};
use crate::registry::Registry;
use crate::store::Store;

/// Bumped whenever the payload layout changes
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotData {
    pub competitions: Vec<Competition>,
    pub candidates: Vec<Candidate>,
    /// (competition, candidate)
    pub enrollments: Vec<(String, String)>,
}

impl SnapshotData {
    pub fn from_registry(registry: &Registry) -> Self {
        SnapshotData {
            competitions: registry.competitions().cloned().collect(),
            candidates: registry.candidates().cloned().collect(),
            enrollments: registry
                .enrollments()
                .map(|(competition, candidate)| (competition.to_string(), candidate.to_string()))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    saved_at: DateTime<Utc>,
    checksum: String,
    data: serde_json::Value,
}

fn compute_checksum(payload: &serde_json::Value) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(payload)?);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Write the registry to `path`, replacing any previous snapshot
pub fn save(registry: &Registry, path: &Path) -> Result<()> {
    let data = serde_json::to_value(SnapshotData::from_registry(registry))?;
    let envelope = Envelope {
        version: FORMAT_VERSION,
        saved_at: Utc::now(),
        checksum: compute_checksum(&data)?,
        data,
    };

    write_atomically(path, &serde_json::to_vec_pretty(&envelope)?)?;

    info!(
        path = %path.display(),
        competitions = registry.competitions().count(),
        candidates = registry.candidates().count(),
        "snapshot saved"
    );
    Ok(())
}

/// The previous file at `path` stays intact until the new content is
/// fully on disk
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Save to the path from the registry's own configuration
pub fn save_default(registry: &Registry) -> Result<()> {
    save(registry, &registry.config().snapshot_path)
}

/// Read the registry saved at `path`.
///
/// Missing, unreadable or corrupt snapshots give an empty registry.
/// The store is not called: it already holds what the snapshot holds.
pub fn load(path: &Path, store: Box<dyn Store>, config: RegistryConfig) -> Registry {
    let data = match read(path) {
        Ok(data) => data,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "no usable snapshot, starting empty");
            return Registry::new(store, config);
        }
    };

    let mut registry = Registry::new(store, config);
    if let Err(e) = registry.restore(data.competitions, data.candidates, data.enrollments) {
        warn!(path = %path.display(), error = %e, "inconsistent snapshot, starting empty");
        return registry;
    }

    info!(path = %path.display(), "snapshot loaded");
    registry
}

fn read(path: &Path) -> Result<SnapshotData> {
    let bytes = fs::read(path)?;
    let envelope: Envelope = serde_json::from_slice(&bytes)?;

    if envelope.version != FORMAT_VERSION {
        return Err(RegistryError::Persistence(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("unsupported snapshot version {}", envelope.version),
        )));
    }
    if compute_checksum(&envelope.data)? != envelope.checksum {
        return Err(RegistryError::Persistence(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "snapshot checksum mismatch",
        )));
    }

    Ok(serde_json::from_value(envelope.data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModeCheck;
    use crate::store::NullStore;
    use chrono::NaiveDate;

    fn sample_registry() -> Registry {
        let mut registry = Registry::in_memory();
        let closing = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        registry.create_competition("Relay", Some(closing), true).unwrap();
        registry.create_competition("Sprint", None, false).unwrap();
        registry
            .create_individual("Durand", "Alice", "alice@example.org")
            .unwrap();
        registry.create_team("Falcons").unwrap();
        registry.enroll("Sprint", "Durand").unwrap();
        registry.enroll("Relay", "Falcons").unwrap();
        registry
    }

    #[test]
    fn test_save_and_load_keeps_enrollments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inscriptions.json");
        let registry = sample_registry();

        save(&registry, &path).unwrap();
        let loaded = load(&path, Box::new(NullStore), RegistryConfig::default());

        assert_eq!(
            SnapshotData::from_registry(&loaded),
            SnapshotData::from_registry(&registry)
        );
        assert!(loaded.is_enrolled("Relay", "Falcons"));
        assert_eq!(
            loaded.candidate("Durand").unwrap().as_person().unwrap().email(),
            "alice@example.org"
        );
    }

    #[test]
    fn test_load_uses_given_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inscriptions.json");
        save(&sample_registry(), &path).unwrap();

        let config = RegistryConfig::default().with_mode_check(ModeCheck::Always);
        let loaded = load(&path, Box::new(NullStore), config);

        assert_eq!(loaded.config().mode_check, ModeCheck::Always);
    }

    #[test]
    fn test_missing_file_gives_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let registry = load(
            &dir.path().join("absent.json"),
            Box::new(NullStore),
            RegistryConfig::default(),
        );

        assert_eq!(registry.competitions().count(), 0);
        assert_eq!(registry.candidates().count(), 0);
    }

    #[test]
    fn test_corrupt_file_gives_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inscriptions.json");
        fs::write(&path, b"{ not json").unwrap();

        let registry = load(&path, Box::new(NullStore), RegistryConfig::default());
        assert_eq!(registry.competitions().count(), 0);
    }

    #[test]
    fn test_tampered_payload_gives_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inscriptions.json");
        save(&sample_registry(), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        fs::write(&path, text.replace("Falcons", "Eagles")).unwrap();

        let registry = load(&path, Box::new(NullStore), RegistryConfig::default());
        assert_eq!(registry.candidates().count(), 0);
    }

    #[test]
    fn test_unknown_version_gives_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inscriptions.json");
        save(&sample_registry(), &path).unwrap();

        let mut envelope: Envelope = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        envelope.version = FORMAT_VERSION + 1;
        fs::write(&path, serde_json::to_vec(&envelope).unwrap()).unwrap();

        assert!(matches!(read(&path), Err(RegistryError::Persistence(_))));
        let registry = load(&path, Box::new(NullStore), RegistryConfig::default());
        assert_eq!(registry.competitions().count(), 0);
    }

    #[test]
    fn test_interrupted_save_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inscriptions.json");
        save(&sample_registry(), &path).unwrap();

        // A save cut short: half the new content in a temp file, never renamed
        let mut next = Registry::in_memory();
        next.create_team("Eagles").unwrap();
        let data = serde_json::to_vec_pretty(&SnapshotData::from_registry(&next)).unwrap();
        {
            let mut tmp = NamedTempFile::new_in(dir.path()).unwrap();
            tmp.write_all(&data[..data.len() / 2]).unwrap();
        }

        let loaded = load(&path, Box::new(NullStore), RegistryConfig::default());
        assert!(loaded.is_enrolled("Relay", "Falcons"));
        assert!(loaded.candidate("Eagles").is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_save_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inscriptions.json");
        save(&sample_registry(), &path).unwrap();

        // The rename cannot replace a non-empty directory
        let blocked = dir.path().join("blocked");
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("keep"), b"x").unwrap();

        let mut next = Registry::in_memory();
        next.create_team("Eagles").unwrap();
        let err = save(&next, &blocked).unwrap_err();
        assert!(matches!(err, RegistryError::Persistence(_)));

        // No temp file left behind, earlier snapshot untouched
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
        let loaded = load(&path, Box::new(NullStore), RegistryConfig::default());
        assert!(loaded.is_enrolled("Relay", "Falcons"));
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inscriptions.json");
        save(&sample_registry(), &path).unwrap();

        let mut next = Registry::in_memory();
        next.create_team("Eagles").unwrap();
        save(&next, &path).unwrap();

        let loaded = load(&path, Box::new(NullStore), RegistryConfig::default());
        assert!(loaded.candidate("Eagles").is_some());
        assert!(loaded.candidate("Falcons").is_none());
    }

    #[test]
    fn test_dangling_enrollment_gives_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inscriptions.json");

        let data = serde_json::to_value(SnapshotData {
            competitions: vec![],
            candidates: vec![],
            enrollments: vec![("Relay".to_string(), "Falcons".to_string())],
        })
        .unwrap();
        let envelope = Envelope {
            version: FORMAT_VERSION,
            saved_at: Utc::now(),
            checksum: compute_checksum(&data).unwrap(),
            data,
        };
        fs::write(&path, serde_json::to_vec(&envelope).unwrap()).unwrap();

        let registry = load(&path, Box::new(NullStore), RegistryConfig::default());
        assert_eq!(registry.enrollment_count(), 0);
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("inscriptions.json");

        let err = save(&sample_registry(), &path).unwrap_err();
        assert!(matches!(err, RegistryError::Persistence(_)));
    }

    #[test]
    fn test_save_default_uses_config_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = RegistryConfig {
            snapshot_path: dir.path().join("configured.json"),
            ..Default::default()
        };
        let mut registry = Registry::new(Box::new(NullStore), config);
        registry.create_team("Falcons").unwrap();

        save_default(&registry).unwrap();

        assert!(dir.path().join("configured.json").exists());
    }
}
