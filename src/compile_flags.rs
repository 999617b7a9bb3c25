//! Generates `compile_flags.txt` for clangd and friends.
//!
//! The same file is written to the project directory and into every
//! installed library, so each cached library can be opened on its own.

use crate::config::forward_slashes;
use anyhow::{Context, Result};
use regex::Regex;
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

pub const COMPILE_FLAGS_FILE_NAME: &str = "compile_flags.txt";
pub const BUILD_DESCRIPTOR_FILE_NAME: &str = "build.gradle";
pub const TRAILER_FLAGS: &[&str] = &["-std=c++17", "-xc++"];

const EXPORTED_HEADERS_TOKEN: &str = "exportedHeaders";

/// Subdirectories of `dir`, sorted by name.
fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Could not list {}", dir.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Every `<headers>/<category>/<library>` directory.
pub fn library_dirs(headers_root: &Path) -> Result<Vec<PathBuf>> {
    if !headers_root.is_dir() {
        tracing::warn!("No headers installed at {}", headers_root.display());
        return Ok(Vec::new());
    }

    let mut libraries = Vec::new();
    for category in subdirectories(headers_root)? {
        libraries.extend(subdirectories(&category)?);
    }
    Ok(libraries)
}

/// Quoted paths inside the first `exportedHeaders { ... }` block.
///
/// Best-effort: anything that does not look like that block yields nothing.
pub fn exported_headers(build_script: &str) -> Vec<String> {
    let Some(start) = build_script.find(EXPORTED_HEADERS_TOKEN) else {
        tracing::debug!("No {} block in build script", EXPORTED_HEADERS_TOKEN);
        return Vec::new();
    };
    let block = &build_script[start + EXPORTED_HEADERS_TOKEN.len()..];
    let Some(end) = block.find('}') else {
        tracing::debug!("Unterminated {} block in build script", EXPORTED_HEADERS_TOKEN);
        return Vec::new();
    };

    let Ok(quoted) = Regex::new(r#""([^"\n]*)"|'([^'\n]*)'"#) else {
        return Vec::new();
    };
    quoted
        .captures_iter(&block[..end])
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Project include directories named by `<project_dir>/build.gradle`.
pub fn project_include_dirs(project_dir: &Path) -> Vec<PathBuf> {
    let path = project_dir.join(BUILD_DESCRIPTOR_FILE_NAME);
    match fs::read_to_string(&path) {
        Ok(script) => exported_headers(&script)
            .into_iter()
            .map(|relative| project_dir.join(relative))
            .collect(),
        Err(e) => {
            tracing::debug!("Not reading {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

pub fn render(libraries: &[PathBuf], project_dirs: &[PathBuf]) -> String {
    let mut contents = String::new();
    for dir in libraries.iter().chain(project_dirs) {
        let _ = writeln!(contents, "-I{}", forward_slashes(dir));
    }
    for flag in TRAILER_FLAGS {
        let _ = writeln!(contents, "{}", flag);
    }
    contents
}

/// Write `compile_flags.txt` to `project_dir` and to every installed library.
pub fn generate(project_dir: &Path, headers_root: &Path) -> Result<()> {
    let libraries = library_dirs(headers_root)?;
    let project_dirs = project_include_dirs(project_dir);
    let contents = render(&libraries, &project_dirs);

    for dir in std::iter::once(project_dir).chain(libraries.iter().map(PathBuf::as_path)) {
        let path = dir.join(COMPILE_FLAGS_FILE_NAME);
        fs::write(&path, &contents)
            .with_context(|| format!("Could not write {}", path.display()))?;
        tracing::debug!("Wrote {}", path.display());
    }

    tracing::info!(
        "Generated {} with {} library and {} project include directories",
        COMPILE_FLAGS_FILE_NAME,
        libraries.len(),
        project_dirs.len()
    );
    Ok(())
}
