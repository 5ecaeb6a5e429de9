//! diskprobe - on-demand disk capability probes
//!
//! diskprobe measures what a volume can sustain (sequential read/write
//! bandwidth, random read/write IOPS) by running [fio] against a scratch
//! directory and reducing its JSON report to a single number.
//!
//! # Architecture
//!
//! - **config**: probe kinds and the options builder
//! - **target**: scratch directory lifecycle and free-space precondition
//! - **engine**: fio argument construction and cancellable execution
//! - **stats**: fio report schema and metric extraction
//! - **diagnostics**: where fio's raw output goes when it fails
//!
//! # Example
//!
//! ```no_run
//! use diskprobe::{probe, ProbeKind, ProbeOptions};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), diskprobe::ProbeError> {
//! let cancel = CancellationToken::new();
//! let iops = probe(
//!     &cancel,
//!     ProbeOptions::new()
//!         .kind(ProbeKind::WriteIops)
//!         .directory("/mnt/data/probe")
//!         .duration(Duration::from_secs(10)),
//! )
//! .await?;
//! println!("write iops = {iops}");
//! # Ok(())
//! # }
//! ```
//!
//! [fio]: https://github.com/axboe/fio

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod output;
pub mod stats;
pub mod target;
pub mod util;

pub use config::{ProbeConfig, ProbeKind, ProbeOptions};
pub use diagnostics::{DiagnosticSink, Discard, MemorySink, TracingSink, WriterSink};
pub use error::{ErrorCategory, ProbeError};

use engine::FioJob;
use std::path::Path;
use target::Workspace;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Result type used throughout diskprobe
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Whether fio is installed and resolvable on `PATH`
pub fn supported() -> bool {
    supported_binary(config::DEFAULT_FIO_BINARY)
}

/// Whether `binary` resolves to an executable
pub fn supported_binary(binary: impl AsRef<Path>) -> bool {
    which::which(binary.as_ref()).is_ok()
}

// TODO: Add a controller that observes the current aggregate bandwidth and
// probes upward in small steps while it stays stable, backing off when I/O
// latencies become unacceptable.

/// Probe a volume for its capacity, i.e. {read,write} {bandwidth,IOPS}
///
/// The scratch directory is wiped and recreated before fio runs and removed
/// afterwards on every path. Firing `cancel` kills fio and fails the probe with
/// [`ProbeError::Cancelled`].
pub async fn probe(cancel: &CancellationToken, options: ProbeOptions) -> Result<u64> {
    let mut config = options.build()?;

    let workspace = Workspace::create(config.directory()).await?;
    let result = run_in_workspace(cancel, &mut config).await;
    let cleanup = workspace.remove().await;

    ProbeError::combine(result, cleanup)
}

async fn run_in_workspace(cancel: &CancellationToken, config: &mut ProbeConfig) -> Result<u64> {
    let kind = config.kind();
    let job = FioJob::new(config);

    let available = target::ensure_free_space(config.directory(), job.footprint(), config.space_margin())?;
    debug!(
        %kind,
        available,
        footprint = job.footprint(),
        command = %job.command_line(&config.fio_binary().display().to_string()),
        "launching probe"
    );

    let output = engine::run(config.fio_binary(), job.args(), cancel).await?;
    if !output.success() {
        // Best effort; the exit status is what the caller gets.
        let _ = config.sink_mut().write_diagnostics(output.combined());
        return Err(ProbeError::ToolFailed {
            program: config.fio_binary().display().to_string(),
            status: output.status,
        });
    }

    let report = stats::parse_report(&output.stdout)?;
    let metric = stats::extract_metric(&report, kind)?;
    info!(
        %kind,
        metric,
        unit = kind.unit(),
        fio_version = report.fio_version.as_deref().unwrap_or("unknown"),
        "probe complete"
    );
    Ok(metric)
}
