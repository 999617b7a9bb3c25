//! Header installation
//!
//! Downloads each dependency's `-headers.zip` and unpacks it into
//! `<install root>/headers/<category>/<library>/`. A missing archive is
//! normal (many artifacts ship no headers) and never stops the run.

pub mod state;

pub use state::InstallState;

use crate::config::headers_dir;
use crate::download::{download_archive, extract_zip, ExtractError, FetchError};
use crate::types::DependencySpec;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const HEADERS_PART: &str = "headers";

/// Source of dependency archives.
pub(crate) trait ArchiveFetcher {
    async fn fetch(&self, url: &str, label: &str) -> Result<Vec<u8>, FetchError>;
}

impl ArchiveFetcher for reqwest::Client {
    async fn fetch(&self, url: &str, label: &str) -> Result<Vec<u8>, FetchError> {
        download_archive(self, url, label).await
    }
}

/// `floor(100 * index / total)`
pub fn progress_percent(index: usize, total: usize) -> usize {
    if total == 0 {
        return 100;
    }
    index * 100 / total
}

/// Fetch and unpack the headers of one dependency.
///
/// Returns `Ok(false)` when no usable archive exists. Only filesystem
/// failures are errors.
pub async fn install_dependency<F: ArchiveFetcher>(
    fetcher: &F,
    spec: &DependencySpec,
    headers: &Path,
) -> Result<bool> {
    println!("Installing {}", spec);

    let url = spec.archive_url(HEADERS_PART);
    tracing::debug!("{} {} (shared: {}) from {}", spec, spec.version, spec.shared, url);
    let bytes = match fetcher.fetch(&url, &spec.to_string()).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::info!("No headers for {}: {}", spec, e);
            return Ok(false);
        }
    };

    let dest = spec.install_dir(headers);
    match extract_zip(bytes, &dest) {
        Ok(count) => {
            tracing::info!("Extracted {} files for {} into {}", count, spec, dest.display());
            Ok(true)
        }
        Err(ExtractError::Archive(e)) => {
            tracing::warn!("Headers archive for {} is unusable: {}", spec, e);
            Ok(false)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to install headers for {}", spec)),
    }
}

/// Install every spec in order. Returns how many archives were unpacked.
pub async fn install_all<F: ArchiveFetcher>(
    fetcher: &F,
    specs: &[DependencySpec],
    install_root: &Path,
) -> Result<usize> {
    let headers = headers_dir(install_root);
    let total = specs.len();
    let mut installed = 0;

    for (index, spec) in specs.iter().enumerate() {
        println!("Progress: {}%", progress_percent(index, total));
        if install_dependency(fetcher, spec, &headers).await? {
            installed += 1;
        }
    }

    tracing::info!("Installed headers for {} of {} dependencies", installed, total);
    Ok(installed)
}

/// Bring the header cache up to date with `specs`.
///
/// Without a current marker the whole cache is rebuilt in a staging
/// directory and only swapped in once at least one archive installed, so a
/// failed run leaves the previous headers in place. With a current marker
/// only dependencies it does not record are fetched, on top of the existing
/// tree.
///
/// Returns the state found before any work was done.
pub async fn ensure_installed<F: ArchiveFetcher>(
    fetcher: &F,
    install_root: &Path,
    specs: &[DependencySpec],
) -> Result<InstallState> {
    let Some(marker) = state::current_marker(install_root) else {
        rebuild(fetcher, install_root, specs).await?;
        return Ok(InstallState::NeedsInstall);
    };

    let missing = state::missing_dependencies(&marker, specs);
    if missing.is_empty() {
        tracing::info!("Headers already installed in {}", install_root.display());
        return Ok(InstallState::Ready);
    }

    tracing::info!("Adding headers for {} new dependencies", missing.len());
    let installed = install_all(fetcher, &missing, install_root).await?;
    if installed > 0 {
        state::merge_marker(install_root, marker, &missing)?;
    } else {
        tracing::warn!("No new headers could be downloaded; they will be retried next run");
    }

    Ok(InstallState::Incomplete)
}

async fn rebuild<F: ArchiveFetcher>(
    fetcher: &F,
    install_root: &Path,
    specs: &[DependencySpec],
) -> Result<()> {
    fs::create_dir_all(install_root)
        .with_context(|| format!("Could not create {}", install_root.display()))?;
    let staging_dir = TempDir::new_in(install_root)
        .with_context(|| format!("Could not stage headers in {}", install_root.display()))?;

    let installed = install_all(fetcher, specs, staging_dir.path()).await?;
    if installed == 0 {
        tracing::warn!("No headers could be downloaded; installation will be retried next run");
        return Ok(());
    }

    let headers = headers_dir(install_root);
    if headers.exists() {
        tracing::info!("Replacing stale headers in {}", headers.display());
        fs::remove_dir_all(&headers)
            .with_context(|| format!("Could not remove {}", headers.display()))?;
    }

    let staged = headers_dir(staging_dir.path());
    if staged.is_dir() {
        fs::rename(&staged, &headers).with_context(|| {
            format!("Could not move {} to {}", staged.display(), headers.display())
        })?;
    } else {
        fs::create_dir_all(&headers)
            .with_context(|| format!("Could not create {}", headers.display()))?;
    }

    state::write_marker(install_root, specs)
}
