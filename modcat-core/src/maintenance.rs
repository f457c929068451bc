//! Local maintenance of a mirrored module repository.
//!
//! A mirror working tree looks like:
//!
//! ```text
//! <root>/json/modules.json   manifest written by the mirroring tool
//! <root>/modules/<id>/...    materialized module artifacts (*.zip)
//! ```
//!
//! [`Workspace::run`] prunes module directories holding an archive too large
//! for the hosting limit, runs the mirroring tool's upgrade, stages everything
//! and commits with a message stamped from the manifest's `timestamp`.
//! External programs go through [`CommandRunner`] so the sequence can be
//! tested without git.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::MaintenanceError;

pub const JSON_DIR: &str = "json";
pub const MODULES_DIR: &str = "modules";
pub const MODULES_JSON: &str = "modules.json";

/// Hosting limit for a single file: 50 MiB.
pub const MAX_ARTIFACT_SIZE: u64 = 50 * 1024 * 1024;

pub const MIRROR_TOOL: &str = "mrepo";
pub const GIT: &str = "git";

/// Runs an external program to completion in `cwd`.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait CommandRunner: Send + Sync {
    fn run(&self, cwd: &Path, program: &str, args: Vec<String>) -> Result<(), MaintenanceError>;
}

/// [`CommandRunner`] backed by `std::process::Command`, inheriting stdio.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cwd: &Path, program: &str, args: Vec<String>) -> Result<(), MaintenanceError> {
        let command = format!("{program} {}", args.join(" "));
        info!(cwd = %cwd.display(), command = %command, "Running command");
        let status = Command::new(program)
            .args(&args)
            .current_dir(cwd)
            .status()
            .map_err(|source| MaintenanceError::Spawn {
                program: program.to_string(),
                source,
            })?;
        if status.success() {
            debug!(command = %command, "Command succeeded");
            Ok(())
        } else {
            Err(MaintenanceError::CommandFailed {
                command,
                status: status.to_string(),
            })
        }
    }
}

/// Whether `module_dir` directly contains a `*.zip` of at least `limit` bytes.
pub fn is_oversized(module_dir: &Path, limit: u64) -> Result<bool, MaintenanceError> {
    let io_err = |source| MaintenanceError::Io {
        path: module_dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(module_dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("zip") {
            continue;
        }
        let metadata = fs::metadata(&path).map_err(|source| MaintenanceError::Io {
            path: path.clone(),
            source,
        })?;
        if metadata.is_file() && metadata.len() >= limit {
            debug!(path = %path.display(), size = metadata.len(), "Oversized artifact");
            return Ok(true);
        }
    }
    Ok(false)
}

/// Removes every non-hidden module directory holding an oversized archive.
///
/// Directories are visited in name order. Returns the removed paths; a
/// directory that cannot be removed is logged and left in place.
pub fn prune_oversized(modules_dir: &Path, limit: u64) -> Result<Vec<PathBuf>, MaintenanceError> {
    if !modules_dir.is_dir() {
        debug!(path = %modules_dir.display(), "No modules directory, nothing to prune");
        return Ok(Vec::new());
    }

    let io_err = |source| MaintenanceError::Io {
        path: modules_dir.to_path_buf(),
        source,
    };
    let mut candidates = Vec::new();
    for entry in fs::read_dir(modules_dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let hidden = path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(true, |name| name.starts_with('.'));
        if path.is_dir() && !hidden {
            candidates.push(path);
        }
    }
    candidates.sort();

    let mut removed = Vec::new();
    for module_dir in candidates {
        if !is_oversized(&module_dir, limit)? {
            continue;
        }
        let name = module_dir.file_name().unwrap_or_default().to_string_lossy();
        info!(module = %name, "remove: {name}");
        match fs::remove_dir_all(&module_dir) {
            Ok(()) => removed.push(module_dir),
            Err(e) => warn!(error = ?e, path = %module_dir.display(), "Failed to remove module directory"),
        }
    }
    Ok(removed)
}

/// Reads the `timestamp` (milliseconds since epoch) from a manifest.
pub fn read_manifest_timestamp(path: &Path) -> Result<DateTime<Utc>, MaintenanceError> {
    let content = fs::read_to_string(path).map_err(|source| MaintenanceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let manifest: Value =
        serde_json::from_str(&content).map_err(|source| MaintenanceError::Manifest {
            path: path.to_path_buf(),
            source,
        })?;
    let millis = manifest
        .get("timestamp")
        .and_then(Value::as_f64)
        .ok_or_else(|| MaintenanceError::MissingTimestamp {
            path: path.to_path_buf(),
        })?;
    timestamp_from_millis(millis)
}

pub fn timestamp_from_millis(millis: f64) -> Result<DateTime<Utc>, MaintenanceError> {
    if !millis.is_finite() {
        return Err(MaintenanceError::InvalidTimestamp(millis));
    }
    let micros = (millis * 1000.0).round();
    if micros.abs() >= i64::MAX as f64 {
        return Err(MaintenanceError::InvalidTimestamp(millis));
    }
    DateTime::<Utc>::from_timestamp_micros(micros as i64)
        .ok_or(MaintenanceError::InvalidTimestamp(millis))
}

/// `Update by CLI (2024-05-01 12:00:00+00:00)`; sub-second digits appear
/// only when non-zero.
pub fn commit_message(time: DateTime<Utc>) -> String {
    let stamp = if time.timestamp_subsec_micros() == 0 {
        time.format("%Y-%m-%d %H:%M:%S+00:00")
    } else {
        time.format("%Y-%m-%d %H:%M:%S%.6f+00:00")
    };
    format!("Update by CLI ({stamp})")
}

/// A mirror working tree and the runner used to drive external tools in it.
pub struct Workspace<R> {
    root: PathBuf,
    runner: R,
    size_limit: u64,
}

impl<R: CommandRunner> Workspace<R> {
    pub fn new(root: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            root: root.into(),
            runner,
            size_limit: MAX_ARTIFACT_SIZE,
        }
    }

    pub fn with_size_limit(mut self, size_limit: u64) -> Self {
        self.size_limit = size_limit;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn modules_dir(&self) -> PathBuf {
        self.root.join(MODULES_DIR)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(JSON_DIR).join(MODULES_JSON)
    }

    pub fn prune(&self) -> Result<Vec<PathBuf>, MaintenanceError> {
        prune_oversized(&self.modules_dir(), self.size_limit)
    }

    pub fn upgrade(&self) -> Result<(), MaintenanceError> {
        self.runner.run(
            &self.root,
            MIRROR_TOOL,
            vec!["upgrade".into(), "--pretty".into()],
        )
    }

    pub fn add(&self) -> Result<(), MaintenanceError> {
        self.runner
            .run(&self.root, GIT, vec!["add".into(), "--all".into()])
    }

    /// Commits staged changes; returns the commit message used.
    pub fn commit(&self) -> Result<String, MaintenanceError> {
        let time = read_manifest_timestamp(&self.manifest_path())?;
        let message = commit_message(time);
        self.runner.run(
            &self.root,
            GIT,
            vec!["commit".into(), "-m".into(), message.clone()],
        )?;
        info!(message = %message, "Committed mirror update");
        Ok(message)
    }

    /// prune → upgrade → add → commit, stopping at the first failure.
    pub fn run(&self) -> Result<String, MaintenanceError> {
        let removed = self.prune()?;
        info!(removed = removed.len(), "Pruned oversized modules");
        self.upgrade()?;
        self.add()?;
        self.commit()
    }
}
