use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "wpilib-headers";
pub const INSTALL_DIR_NAME: &str = ".wpilib-headers";
pub const HEADERS_DIR_NAME: &str = "headers";
pub const VENDORDEPS_DIR_NAME: &str = "vendordeps";

pub const INSTALL_ROOT_ENV: &str = "WPILIB_HEADERS_ROOT";
pub const VENDORDEPS_ENV: &str = "WPILIB_HEADERS_VENDORDEPS";

pub const NI_CATEGORY: &str = "ni";
pub const NI_VERSION: &str = "2022.2.3";
pub const NI_LIBRARIES: &[&str] = &["visa", "runtime", "netcomm", "chipobject"];

pub const WPILIB_CATEGORY: &str = "wpilib";
pub const WPILIB_VERSION: &str = "2022.1.1-beta-2";
pub const WPILIB_LIBRARIES: &[&str] = &[
    "wpilibc",
    "wpiutil",
    "wpimath",
    "ntcore",
    "cscore",
    "hal",
    "cameraserver",
];
pub const WPILIB_ARTIFACT_SUFFIX: &str = "-cpp";

/// Vendor manifests use this version to mean "whatever WPILib version is in use".
pub const WPILIB_VERSION_SENTINEL: &str = "wpilib";

const FRC_MAVEN_BASE: &str =
    "https://frcmaven.wpi.edu/ui/api/v1/download?repoKey=release&path=edu/wpi/first";

pub fn ni_libraries_url() -> String {
    format!("{}/ni-libraries", FRC_MAVEN_BASE)
}

pub fn wpilib_library_url(library: &str) -> String {
    format!("{}/{}", FRC_MAVEN_BASE, library)
}

pub fn wpilib_new_commands_url() -> String {
    wpilib_library_url("wpilibNewCommands")
}

/// Root of the header cache, `~/.wpilib-headers` unless overridden.
pub fn get_install_root() -> Result<PathBuf> {
    if let Some(root) = env::var_os(INSTALL_ROOT_ENV).filter(|v| !v.is_empty()) {
        let path = absolutize(Path::new(&root))?;
        tracing::debug!("Install root (from {}): {}", INSTALL_ROOT_ENV, path.display());
        return Ok(path);
    }

    let path = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
        .join(INSTALL_DIR_NAME);
    tracing::debug!("Install root: {}", path.display());
    Ok(path)
}

pub fn headers_dir(install_root: &Path) -> PathBuf {
    install_root.join(HEADERS_DIR_NAME)
}

/// Directories scanned for vendor manifests.
///
/// `WPILIB_HEADERS_VENDORDEPS` replaces the defaults entirely. Otherwise the
/// `vendordeps` directory next to the executable and the one inside the
/// project are used, whichever exist.
pub fn get_vendordeps_dirs(project_dir: &Path) -> Vec<PathBuf> {
    if let Some(dir) = env::var_os(VENDORDEPS_ENV).filter(|v| !v.is_empty()) {
        return vec![PathBuf::from(dir)];
    }

    let mut candidates = Vec::new();
    if let Some(exe_dir) = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(exe_dir.join(VENDORDEPS_DIR_NAME));
    }
    candidates.push(project_dir.join(VENDORDEPS_DIR_NAME));

    let mut dirs: Vec<PathBuf> = Vec::new();
    for candidate in candidates {
        if !candidate.is_dir() {
            continue;
        }
        let canonical = candidate.canonicalize().unwrap_or(candidate);
        if !dirs.contains(&canonical) {
            dirs.push(canonical);
        }
    }
    tracing::debug!("Vendor manifest directories: {:?}", dirs);
    dirs
}

pub fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().context("Could not determine current directory")?;
    Ok(cwd.join(path))
}

/// Render a path for compiler flags and include directives.
pub fn forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
