use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// One library whose headers archive may be fetched from a maven repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    pub url: String,
    pub category: String,
    pub name: String,
    pub version: String,
    pub shared: bool,
}

impl DependencySpec {
    /// `<url>/<name>/<version>/<name>-<version>-<part>.zip`
    pub fn archive_url(&self, part: &str) -> String {
        format!(
            "{}/{}/{}/{}-{}-{}.zip",
            self.url, self.name, self.version, self.name, self.version, part
        )
    }

    /// Directory name inside the category, e.g. `wpilibc-cpp` -> `wpilibc`.
    pub fn install_name(&self) -> String {
        self.name.replace("-cpp", "").to_lowercase()
    }

    pub fn install_dir(&self, headers_dir: &Path) -> PathBuf {
        headers_dir.join(&self.category).join(self.install_name())
    }

    /// Identity recorded in the install marker.
    pub fn fingerprint(&self) -> String {
        format!("{}/{}@{}", self.category, self.install_name(), self.version)
    }
}

impl fmt::Display for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.category, self.name)
    }
}

/// A vendor dependency descriptor (`vendordeps/*.json`).
///
/// Only the fields needed for header installation are modelled; anything
/// else in the document is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VendorManifest {
    pub name: String,
    pub maven_urls: Vec<String>,
    pub cpp_dependencies: Vec<VendorDependency>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VendorDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub shared_library: bool,
}

/// Contents of `install-state.json` at the install root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallMarker {
    pub schema_version: u32,
    pub ni_version: String,
    pub wpilib_version: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub installed_at: DateTime<Utc>,
}
