//! Free-space precondition

use crate::error::{ProbeError, WorkspaceAction};
use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// Bytes available to unprivileged users on the filesystem backing `path`
pub fn available_space(path: &Path) -> io::Result<u64> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }

    Ok((stat.f_bavail as u64).saturating_mul(stat.f_frsize as u64))
}

/// Fail unless `available` covers `footprint` plus `margin`
pub fn check_free_space(available: u64, footprint: u64, margin: u64) -> Result<(), ProbeError> {
    let required = footprint.saturating_add(margin);
    if available < required {
        return Err(ProbeError::InsufficientSpace { available, required });
    }
    Ok(())
}

/// Query the filesystem at `path` and check it can hold the probe's data set
pub fn ensure_free_space(path: &Path, footprint: u64, margin: u64) -> Result<u64, ProbeError> {
    let available =
        available_space(path).map_err(|e| ProbeError::workspace(WorkspaceAction::QueryFreeSpace, path, e))?;
    check_free_space(available, footprint, margin)?;
    Ok(available)
}
