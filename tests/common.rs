use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const NI_VERSION: &str = "2022.2.3";
pub const WPILIB_VERSION: &str = "2022.1.1-beta-2";
pub const NI_LIBRARIES: &[&str] = &["visa", "runtime", "netcomm", "chipobject"];
pub const WPILIB_LIBRARIES: &[&str] = &[
    "wpilibc",
    "wpiutil",
    "wpimath",
    "ntcore",
    "cscore",
    "hal",
    "cameraserver",
];

// Not every test binary uses every helper.
#[allow(dead_code)]
pub struct TestContext {
    pub _temp_dir: TempDir,
    pub install_root: PathBuf,
    pub vendordeps_dir: PathBuf,
    pub project_dir: PathBuf,
    pub bin_path: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let install_root = temp_dir.path().join("root");
        let vendordeps_dir = temp_dir.path().join("vendordeps");
        let project_dir = temp_dir.path().join("project");
        fs::create_dir_all(&vendordeps_dir).expect("Failed to create vendordeps dir");
        fs::create_dir_all(&project_dir).expect("Failed to create project dir");

        let bin_path = PathBuf::from(env!("CARGO_BIN_EXE_wpilib-headers"));

        Self {
            _temp_dir: temp_dir,
            install_root,
            vendordeps_dir,
            project_dir,
            bin_path,
        }
    }

    pub fn headers_dir(&self) -> PathBuf {
        self.install_root.join("headers")
    }

    /// Command isolated from the real home directory, run inside the project.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        cmd.current_dir(&self.project_dir);
        cmd.env("HOME", self._temp_dir.path());
        cmd.env("WPILIB_HEADERS_ROOT", &self.install_root);
        cmd.env("WPILIB_HEADERS_VENDORDEPS", &self.vendordeps_dir);
        cmd.env_remove("RUST_LOG");
        cmd
    }

    pub fn touch_header(&self, relative: &str) {
        let path = self.headers_dir().join(relative);
        fs::create_dir_all(path.parent().unwrap()).expect("Failed to create header dir");
        fs::write(path, "#pragma once\n").expect("Failed to write header");
    }

    /// Mark the install root as holding a complete install of the built-in
    /// libraries so no download is attempted.
    pub fn write_ready_marker(&self) {
        let mut dependencies: Vec<String> = NI_LIBRARIES
            .iter()
            .map(|lib| format!("ni/{}@{}", lib, NI_VERSION))
            .chain(
                WPILIB_LIBRARIES
                    .iter()
                    .map(|lib| format!("wpilib/{}@{}", lib, WPILIB_VERSION)),
            )
            .collect();
        dependencies.sort();

        let marker = serde_json::json!({
            "schema_version": 1,
            "ni_version": NI_VERSION,
            "wpilib_version": WPILIB_VERSION,
            "dependencies": dependencies,
            "installed_at": "2024-01-01T00:00:00Z",
        });
        fs::create_dir_all(&self.install_root).expect("Failed to create install root");
        fs::write(
            self.install_root.join("install-state.json"),
            serde_json::to_string_pretty(&marker).unwrap(),
        )
        .expect("Failed to write marker");
    }

    pub fn read(&self, path: &Path) -> String {
        fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
    }
}

#[allow(dead_code)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.status.success() {
            panic!(
                "Command failed with status {:?}\nstdout: {}\nstderr: {}",
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stdout_lacks(&self, text: &str) -> &Self {
        assert!(
            !self.stdout.contains(text),
            "Stdout unexpectedly contained '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }
}
