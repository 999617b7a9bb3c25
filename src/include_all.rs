//! Generates `IncludeAll.h`, a header that includes every installed header.
//!
//! Headers are referenced relative to their library's include root, so
//! `headers/wpilib/wpilibc/frc/TimedRobot.h` becomes `<frc/TimedRobot.h>`.

use anyhow::{Context, Result};
use std::fmt::Write;
use std::fs;
use std::path::{Component, Path};
use walkdir::{DirEntry, WalkDir};

pub const INCLUDE_ALL_FILE_NAME: &str = "IncludeAll.h";
pub const GENERATED_WARNING: &str =
    "/* THIS IS AN AUTOMATICALLY GENERATED FILE. YOU SHOULDN'T EDIT IT. */";

const HEADER_EXTENSION: &str = ".h";

/// Directories whose whole subtree is left out.
const PRUNED_DIRS: &[&str] = &["Eigen", "ntcore", "cscore"];

/// Where a header lives, relative to the headers root.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderLocation {
    /// Library directory (second segment), if the header is that deep.
    library: Option<String>,
    /// Directory relative to the library's include root, `/`-separated.
    root: String,
}

impl HeaderLocation {
    fn of_dir(relative_dir: &Path) -> Self {
        let segments: Vec<String> = relative_dir
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        HeaderLocation {
            library: segments.get(1).cloned(),
            root: segments.iter().skip(2).cloned().collect::<Vec<_>>().join("/"),
        }
    }

    fn include_path(&self, file_name: &str) -> String {
        if self.root.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", self.root, file_name)
        }
    }
}

fn is_pruned(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && PRUNED_DIRS
            .iter()
            .any(|name| entry.file_name().to_str() == Some(*name))
}

fn is_excluded(file_name: &str, location: &HeaderLocation) -> bool {
    if !file_name.ends_with(HEADER_EXTENSION) {
        return true;
    }

    match file_name {
        "WPILibVersion.h" => return true,
        "MovingAverage.h" if location.root == "ctre/phoenix/signals" => return true,
        "uv.h"
            if location.root == "wpiutil"
                || (location.root.is_empty() && location.library.as_deref() == Some("wpiutil")) =>
        {
            return true
        }
        _ => {}
    }

    location.root.starts_with("uv") || file_name.to_lowercase().contains("jni")
}

/// Include paths for every eligible header under `headers_root`, in walk order.
pub fn collect_includes(headers_root: &Path) -> Result<Vec<String>> {
    let mut includes = Vec::new();
    if !headers_root.is_dir() {
        tracing::warn!("No headers installed at {}", headers_root.display());
        return Ok(includes);
    }

    let walker = WalkDir::new(headers_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_pruned(e));

    for entry in walker {
        let entry = entry.with_context(|| format!("Could not walk {}", headers_root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(file_name) = entry.file_name().to_str() else {
            tracing::debug!("Skipping non UTF-8 file name {}", entry.path().display());
            continue;
        };
        let relative_dir = entry
            .path()
            .parent()
            .and_then(|dir| dir.strip_prefix(headers_root).ok())
            .unwrap_or_else(|| Path::new(""));
        let location = HeaderLocation::of_dir(relative_dir);

        if is_excluded(file_name, &location) {
            continue;
        }
        includes.push(location.include_path(file_name));
    }

    Ok(includes)
}

pub fn render(includes: &[String]) -> String {
    let mut out = String::from(GENERATED_WARNING);
    out.push('\n');
    for include in includes {
        let _ = writeln!(out, "#include <{}>", include);
    }
    out
}

/// Write `IncludeAll.h` into `target_dir`, replacing any previous one.
///
/// Does nothing if `target_dir` is not an existing directory.
pub fn generate(target_dir: &Path, headers_root: &Path) -> Result<()> {
    if !target_dir.is_dir() {
        tracing::warn!(
            "{} is not a directory; skipping {}",
            target_dir.display(),
            INCLUDE_ALL_FILE_NAME
        );
        return Ok(());
    }

    let includes = collect_includes(headers_root)?;
    let path = target_dir.join(INCLUDE_ALL_FILE_NAME);
    fs::write(&path, render(&includes))
        .with_context(|| format!("Could not write {}", path.display()))?;
    tracing::info!("Wrote {} includes to {}", includes.len(), path.display());
    Ok(())
}
