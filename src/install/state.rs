//! Tracks whether the header cache is complete and current.
//!
//! `install-state.json` at the install root records the suite versions and
//! every dependency whose headers have been fetched into the cache. The cache
//! is shared by all projects, so the recorded set only ever grows until the
//! suite versions or the marker schema change.

use crate::config::{NI_VERSION, WPILIB_VERSION};
use crate::types::{DependencySpec, InstallMarker};
use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

pub const MARKER_FILE_NAME: &str = "install-state.json";
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    /// No usable marker: the whole cache has to be rebuilt.
    NeedsInstall,
    /// The cache is current but some dependencies were never fetched.
    Incomplete,
    Ready,
}

pub fn marker_path(install_root: &Path) -> PathBuf {
    install_root.join(MARKER_FILE_NAME)
}

/// Sorted, de-duplicated identities of `specs`.
pub fn fingerprint(specs: &[DependencySpec]) -> Vec<String> {
    let mut prints: Vec<String> = specs.iter().map(DependencySpec::fingerprint).collect();
    prints.sort();
    prints.dedup();
    prints
}

pub fn read_marker(install_root: &Path) -> Option<InstallMarker> {
    let path = marker_path(install_root);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!("No install marker at {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(marker) => Some(marker),
        Err(e) => {
            tracing::warn!("Ignoring unreadable install marker {}: {}", path.display(), e);
            None
        }
    }
}

/// The marker, if it was written by this schema for the current suites.
pub fn current_marker(install_root: &Path) -> Option<InstallMarker> {
    let marker = read_marker(install_root)?;

    if marker.schema_version != SCHEMA_VERSION {
        tracing::info!(
            "Install marker schema {} differs from {}",
            marker.schema_version,
            SCHEMA_VERSION
        );
        return None;
    }

    if marker.ni_version != NI_VERSION || marker.wpilib_version != WPILIB_VERSION {
        tracing::info!(
            "Cached headers are for NI {} / WPILib {}, want NI {} / WPILib {}",
            marker.ni_version,
            marker.wpilib_version,
            NI_VERSION,
            WPILIB_VERSION
        );
        return None;
    }

    tracing::debug!("Headers installed at {}", marker.installed_at.to_rfc3339());
    Some(marker)
}

/// Specs whose fingerprint the marker does not record, in input order.
pub fn missing_dependencies(
    marker: &InstallMarker,
    specs: &[DependencySpec],
) -> Vec<DependencySpec> {
    specs
        .iter()
        .filter(|spec| !marker.dependencies.contains(&spec.fingerprint()))
        .cloned()
        .collect()
}

fn save(install_root: &Path, marker: &InstallMarker) -> Result<()> {
    fs::create_dir_all(install_root)
        .with_context(|| format!("Could not create {}", install_root.display()))?;
    let path = marker_path(install_root);
    let content = serde_json::to_string_pretty(marker)?;
    fs::write(&path, content)
        .with_context(|| format!("Could not write install marker {}", path.display()))?;
    tracing::debug!("Wrote install marker {}", path.display());
    Ok(())
}

/// Replace the marker with one recording exactly `specs`.
pub fn write_marker(install_root: &Path, specs: &[DependencySpec]) -> Result<()> {
    save(
        install_root,
        &InstallMarker {
            schema_version: SCHEMA_VERSION,
            ni_version: NI_VERSION.to_string(),
            wpilib_version: WPILIB_VERSION.to_string(),
            dependencies: fingerprint(specs),
            installed_at: Utc::now(),
        },
    )
}

/// Add `specs` to an existing marker's dependency set.
pub fn merge_marker(
    install_root: &Path,
    mut marker: InstallMarker,
    specs: &[DependencySpec],
) -> Result<()> {
    marker.dependencies.extend(fingerprint(specs));
    marker.dependencies.sort();
    marker.dependencies.dedup();
    marker.installed_at = Utc::now();
    save(install_root, &marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::core_dependencies;
    use tempfile::TempDir;

    /// What `ensure_installed` would do for `specs`.
    fn current_state(install_root: &Path, specs: &[DependencySpec]) -> InstallState {
        match current_marker(install_root) {
            None => InstallState::NeedsInstall,
            Some(marker) if missing_dependencies(&marker, specs).is_empty() => InstallState::Ready,
            Some(_) => InstallState::Incomplete,
        }
    }

    #[test]
    fn test_missing_root_needs_install() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("absent");
        assert_eq!(
            current_state(&root, &core_dependencies()),
            InstallState::NeedsInstall
        );
    }

    #[test]
    fn test_root_without_marker_needs_install() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("headers/ni/visa")).unwrap();
        assert_eq!(
            current_state(dir.path(), &core_dependencies()),
            InstallState::NeedsInstall
        );
    }

    #[test]
    fn test_written_marker_is_ready() {
        let dir = TempDir::new().unwrap();
        let specs = core_dependencies();
        write_marker(dir.path(), &specs).unwrap();
        assert_eq!(current_state(dir.path(), &specs), InstallState::Ready);
    }

    fn widget() -> DependencySpec {
        DependencySpec {
            url: "https://maven.example.com/com/example".to_string(),
            category: "example".to_string(),
            name: "widget-cpp".to_string(),
            version: "1.0.0".to_string(),
            shared: true,
        }
    }

    #[test]
    fn test_new_dependency_is_incomplete_not_stale() {
        let dir = TempDir::new().unwrap();
        let mut specs = core_dependencies();
        write_marker(dir.path(), &specs).unwrap();

        specs.push(widget());
        assert_eq!(current_state(dir.path(), &specs), InstallState::Incomplete);

        let marker = current_marker(dir.path()).unwrap();
        assert_eq!(missing_dependencies(&marker, &specs), vec![widget()]);
    }

    #[test]
    fn test_subset_of_recorded_dependencies_is_ready() {
        let dir = TempDir::new().unwrap();
        let mut specs = core_dependencies();
        specs.push(widget());
        write_marker(dir.path(), &specs).unwrap();

        assert_eq!(
            current_state(dir.path(), &core_dependencies()),
            InstallState::Ready
        );
    }

    #[test]
    fn test_merge_marker_keeps_recorded_dependencies() {
        let dir = TempDir::new().unwrap();
        let core = core_dependencies();
        write_marker(dir.path(), &core).unwrap();

        let marker = current_marker(dir.path()).unwrap();
        merge_marker(dir.path(), marker, &[widget()]).unwrap();

        let merged = read_marker(dir.path()).unwrap();
        assert_eq!(merged.dependencies.len(), core.len() + 1);
        assert!(merged.dependencies.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(current_state(dir.path(), &core), InstallState::Ready);
        assert_eq!(current_state(dir.path(), &[widget()]), InstallState::Ready);
    }

    #[test]
    fn test_other_suite_version_is_stale() {
        let dir = TempDir::new().unwrap();
        let specs = core_dependencies();
        write_marker(dir.path(), &specs).unwrap();

        let mut marker = read_marker(dir.path()).unwrap();
        marker.wpilib_version = "2021.3.1".to_string();
        fs::write(
            marker_path(dir.path()),
            serde_json::to_string(&marker).unwrap(),
        )
        .unwrap();
        assert_eq!(current_state(dir.path(), &specs), InstallState::NeedsInstall);
    }

    #[test]
    fn test_old_schema_is_stale() {
        let dir = TempDir::new().unwrap();
        let specs = core_dependencies();
        write_marker(dir.path(), &specs).unwrap();

        let mut marker = read_marker(dir.path()).unwrap();
        marker.schema_version = 0;
        fs::write(
            marker_path(dir.path()),
            serde_json::to_string(&marker).unwrap(),
        )
        .unwrap();
        assert_eq!(current_state(dir.path(), &specs), InstallState::NeedsInstall);
    }

    #[test]
    fn test_garbage_marker_needs_install() {
        let dir = TempDir::new().unwrap();
        fs::write(marker_path(dir.path()), "{ nope").unwrap();
        assert_eq!(
            current_state(dir.path(), &core_dependencies()),
            InstallState::NeedsInstall
        );
    }

    #[test]
    fn test_fingerprint_sorted_and_deduplicated() {
        let mut specs = core_dependencies();
        specs.push(specs[0].clone());
        let prints = fingerprint(&specs);
        assert_eq!(prints.len(), core_dependencies().len());
        assert!(prints.windows(2).all(|w| w[0] < w[1]));
        assert!(prints.contains(&format!("wpilib/wpilibc@{}", WPILIB_VERSION)));
    }
}
