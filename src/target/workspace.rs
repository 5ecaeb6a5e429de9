//! Scratch directory lifecycle
//!
//! A probe owns its directory exclusively for the duration of the attempt:
//! leftovers from earlier (possibly crashed) runs are removed, the directory
//! is created fresh, and it is removed again when the attempt ends.
//!
//! Removing a multi-gigabyte data set can take seconds, so async callers go
//! through [`Workspace::create`] and [`Workspace::remove`], which run the
//! filesystem work on tokio's blocking pool.

use crate::error::{ProbeError, WorkspaceAction};
use std::fs::{self, DirBuilder};
use std::io;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};
use tokio::runtime::Handle;
use tokio::task::{self, JoinError};
use tracing::{debug, warn};

const DIR_MODE: u32 = 0o755;

/// Scratch directory owned by an in-flight probe
///
/// Call [`Workspace::teardown`] to remove the directory and observe the
/// outcome. A workspace dropped without teardown (early return, panic,
/// cancelled future) is removed on a best-effort basis.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    armed: bool,
}

impl Workspace {
    /// Clear out anything at `path` and create it fresh
    pub fn prepare(path: &Path) -> Result<Self, ProbeError> {
        if path.as_os_str().is_empty() {
            return Err(ProbeError::workspace(
                WorkspaceAction::Create,
                path,
                io::Error::new(io::ErrorKind::InvalidInput, "working directory unspecified"),
            ));
        }

        // Nuke left-over state, if any, so storage use doesn't accrete across runs.
        remove_all(path).map_err(|e| ProbeError::workspace(WorkspaceAction::Remove, path, e))?;

        DirBuilder::new()
            .recursive(true)
            .mode(DIR_MODE)
            .create(path)
            .map_err(|e| ProbeError::workspace(WorkspaceAction::Create, path, e))?;

        debug!(path = %path.display(), "prepared probe workspace");
        Ok(Self {
            path: path.to_path_buf(),
            armed: true,
        })
    }

    /// [`Workspace::prepare`] on the blocking pool
    pub async fn create(path: &Path) -> Result<Self, ProbeError> {
        let owned = path.to_path_buf();
        task::spawn_blocking(move || Self::prepare(&owned))
            .await
            .map_err(|e| join_failed(WorkspaceAction::Create, path, e))?
    }

    /// [`Workspace::teardown`] on the blocking pool
    pub async fn remove(self) -> Result<(), ProbeError> {
        let path = self.path.clone();
        task::spawn_blocking(move || self.teardown())
            .await
            .map_err(|e| join_failed(WorkspaceAction::Remove, &path, e))?
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory and everything in it
    pub fn teardown(mut self) -> Result<(), ProbeError> {
        self.armed = false;
        remove_all(&self.path).map_err(|e| ProbeError::workspace(WorkspaceAction::Remove, &self.path, e))?;
        debug!(path = %self.path.display(), "removed probe workspace");
        Ok(())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let path = std::mem::take(&mut self.path);
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove_abandoned(&path));
            }
            Err(_) => remove_abandoned(&path),
        }
    }
}

fn remove_abandoned(path: &Path) {
    match remove_all(path) {
        Ok(()) => debug!(path = %path.display(), "removed abandoned probe workspace"),
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove abandoned probe workspace"),
    }
}

fn join_failed(action: WorkspaceAction, path: &Path, e: JoinError) -> ProbeError {
    ProbeError::workspace(action, path, io::Error::new(io::ErrorKind::Other, e))
}

/// Recursively remove whatever is at `path`; a missing path is not an error
fn remove_all(path: &Path) -> io::Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
