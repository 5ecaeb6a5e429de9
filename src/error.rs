//! Probe error taxonomy
//!
//! Every failure of a probe attempt is terminal and surfaces as a
//! [`ProbeError`]. Callers that only care about the broad class of failure
//! (e.g. to decide whether a retry makes sense) can use
//! [`ProbeError::category`].

use crate::util::units::format_ibytes;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors returned by a probe attempt
#[derive(Debug, Error)]
pub enum ProbeError {
    /// No probe kind was configured
    #[error("probe kind unspecified")]
    MissingKind,

    /// A probe kind string did not name a known kind
    #[error("invalid kind: {0}")]
    InvalidKind(String),

    /// Preparing, querying or removing the working directory failed
    #[error("failed to {action} {}: {source}", .path.display())]
    Workspace {
        action: WorkspaceAction,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The filesystem backing the working directory is too small
    #[error("insufficient disk space: {}, want {}", ibytes(.available), ibytes(.required))]
    InsufficientSpace { available: u64, required: u64 },

    /// The benchmark tool could not be started
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Waiting on the benchmark tool or reading its output failed
    #[error("failed to collect output of {program}: {source}")]
    Output {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The benchmark tool ran but exited unsuccessfully
    #[error("{program} failed: {status}")]
    ToolFailed { program: String, status: ExitStatus },

    /// The governing cancellation token fired while the tool was running
    #[error("probe cancelled")]
    Cancelled,

    /// The tool's output was not the expected JSON report
    #[error("failed to parse benchmark report: {0}")]
    Parse(#[from] serde_json::Error),

    /// The report parsed but carried no job records
    #[error("no job data returned")]
    NoJobData,

    /// Workspace teardown failed after the probe itself had already failed
    #[error(transparent)]
    Compound(Box<CompoundError>),
}

fn ibytes(bytes: &u64) -> String {
    format_ibytes(*bytes)
}

/// Filesystem step that produced a [`ProbeError::Workspace`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceAction {
    Remove,
    Create,
    QueryFreeSpace,
}

impl fmt::Display for WorkspaceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkspaceAction::Remove => write!(f, "remove"),
            WorkspaceAction::Create => write!(f, "create"),
            WorkspaceAction::QueryFreeSpace => write!(f, "query free space of"),
        }
    }
}

/// Both the teardown failure and the probe failure that preceded it
#[derive(Debug, Error)]
#[error("{cleanup}: {probe}")]
pub struct CompoundError {
    pub cleanup: ProbeError,
    pub probe: ProbeError,
}

/// Broad classes of probe failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Workspace,
    Resource,
    Invocation,
    Cancellation,
    Parse,
    InvalidKind,
}

impl ProbeError {
    /// Class of this failure
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProbeError::MissingKind => ErrorCategory::Configuration,
            ProbeError::InvalidKind(_) => ErrorCategory::InvalidKind,
            ProbeError::Workspace { .. } | ProbeError::Compound(_) => ErrorCategory::Workspace,
            ProbeError::InsufficientSpace { .. } => ErrorCategory::Resource,
            ProbeError::Launch { .. } | ProbeError::Output { .. } | ProbeError::ToolFailed { .. } => {
                ErrorCategory::Invocation
            }
            ProbeError::Cancelled => ErrorCategory::Cancellation,
            ProbeError::Parse(_) | ProbeError::NoJobData => ErrorCategory::Parse,
        }
    }

    pub(crate) fn workspace(action: WorkspaceAction, path: impl Into<PathBuf>, source: io::Error) -> Self {
        ProbeError::Workspace {
            action,
            path: path.into(),
            source,
        }
    }

    /// Merge the outcome of a probe with the outcome of its workspace teardown
    ///
    /// A teardown failure is never dropped: it replaces a successful result, or
    /// is paired with the probe's own error.
    pub fn combine<T>(result: Result<T, ProbeError>, cleanup: Result<(), ProbeError>) -> Result<T, ProbeError> {
        match (result, cleanup) {
            (result, Ok(())) => result,
            (Ok(_), Err(cleanup)) => Err(cleanup),
            (Err(probe), Err(cleanup)) => Err(ProbeError::Compound(Box::new(CompoundError { cleanup, probe }))),
        }
    }
}
