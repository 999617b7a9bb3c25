//! Builds the list of dependencies to install: the built-in NI and WPILib
//! suites followed by every vendor manifest found on disk.

use crate::config::*;
use crate::types::{DependencySpec, VendorManifest};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not read vendor manifest {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed vendor manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("vendor manifest '{name}' lists no maven URL for {artifact}")]
    NoBaseUrl { name: String, artifact: String },
}

pub fn core_dependencies() -> Vec<DependencySpec> {
    let ni = NI_LIBRARIES.iter().map(|library| DependencySpec {
        url: ni_libraries_url(),
        category: NI_CATEGORY.to_string(),
        name: library.to_string(),
        version: NI_VERSION.to_string(),
        shared: true,
    });

    let wpilib = WPILIB_LIBRARIES.iter().map(|library| DependencySpec {
        url: wpilib_library_url(library),
        category: WPILIB_CATEGORY.to_string(),
        name: format!("{}{}", library, WPILIB_ARTIFACT_SUFFIX),
        version: WPILIB_VERSION.to_string(),
        shared: false,
    });

    ni.chain(wpilib).collect()
}

/// Everything up to (not including) the first `-` of the lower-cased
/// display name: `CTRE-Phoenix` -> `ctre`, `REVLib` -> `revlib`.
pub fn vendor_category(display_name: &str) -> String {
    let lower = display_name.to_lowercase();
    match lower.find('-') {
        Some(idx) => lower[..idx].to_string(),
        None => lower,
    }
}

/// Resolve every C++ dependency of one manifest.
///
/// Either all of the manifest's dependencies resolve or none are returned.
pub fn resolve_vendor_manifest(
    manifest: &VendorManifest,
) -> Result<Vec<DependencySpec>, ManifestError> {
    let category = vendor_category(&manifest.name);
    let base_url = manifest
        .maven_urls
        .first()
        .map(|url| url.trim_end_matches('/').to_string());

    manifest
        .cpp_dependencies
        .iter()
        .map(|dep| -> Result<DependencySpec, ManifestError> {
            let (url, version) = if dep.version == WPILIB_VERSION_SENTINEL {
                (wpilib_new_commands_url(), WPILIB_VERSION.to_string())
            } else {
                let base = base_url.as_ref().ok_or_else(|| ManifestError::NoBaseUrl {
                    name: manifest.name.clone(),
                    artifact: dep.artifact_id.clone(),
                })?;
                (
                    format!("{}/{}", base, dep.group_id.replace('.', "/")),
                    dep.version.clone(),
                )
            };

            Ok(DependencySpec {
                url,
                category: category.clone(),
                name: dep.artifact_id.clone(),
                version,
                shared: dep.shared_library,
            })
        })
        .collect()
}

pub fn parse_vendor_manifest(path: &Path) -> Result<VendorManifest, ManifestError> {
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// `*.json` files directly inside `dir`, in file-name order.
fn manifest_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Could not list vendor manifests in {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn load_vendor_dependencies(dirs: &[PathBuf]) -> Result<Vec<DependencySpec>> {
    let mut dependencies = Vec::new();

    for dir in dirs {
        if !dir.is_dir() {
            tracing::debug!("Vendor manifest directory {} does not exist", dir.display());
            continue;
        }

        for path in manifest_files(dir)? {
            let resolved =
                parse_vendor_manifest(&path).and_then(|manifest| resolve_vendor_manifest(&manifest));
            match resolved {
                Ok(specs) => {
                    tracing::info!(
                        "Loaded {} dependencies from {}",
                        specs.len(),
                        path.display()
                    );
                    dependencies.extend(specs);
                }
                Err(e) => tracing::warn!("Skipping vendor manifest: {}", e),
            }
        }
    }

    Ok(dependencies)
}

/// Built-in suites first, then vendor dependencies.
pub fn load_dependencies(vendordeps_dirs: &[PathBuf]) -> Result<Vec<DependencySpec>> {
    let mut dependencies = core_dependencies();
    dependencies.extend(load_vendor_dependencies(vendordeps_dirs)?);
    Ok(dependencies)
}
