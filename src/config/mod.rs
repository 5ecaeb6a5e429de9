//! Probe configuration
//!
//! A probe attempt is described by a [`ProbeOptions`] builder. Options are
//! applied in call order (the last call for a field wins) and validated once by
//! [`ProbeOptions::build`], which produces the immutable [`ProbeConfig`] the
//! rest of the crate works from.
//!
//! The CLI front end (`cli`, `cli_convert`, `toml`) maps flags and config files
//! onto the same builder.

pub mod cli;
pub mod cli_convert;
pub mod toml;

use crate::diagnostics::{DiagnosticSink, Discard};
use crate::error::ProbeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default measurement window
pub const DEFAULT_DURATION: Duration = Duration::from_secs(60);

/// Default ramp-up period excluded from measurement
pub const DEFAULT_RAMP: Duration = Duration::from_secs(2);

/// Default data-set size across all jobs (10 GiB)
pub const DEFAULT_SIZE: u64 = 10 << 30;

/// Free space required on top of the data set (5 GiB)
pub const DEFAULT_SPACE_MARGIN: u64 = 5 << 30;

/// Benchmark tool invoked when no explicit binary is configured
pub const DEFAULT_FIO_BINARY: &str = "fio";

/// Kind of probe; one of {read,write} {bandwidth,IOPS}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    ReadBandwidth,
    WriteBandwidth,
    ReadIops,
    WriteIops,
}

impl ProbeKind {
    pub const ALL: [ProbeKind; 4] = [
        ProbeKind::ReadBandwidth,
        ProbeKind::WriteBandwidth,
        ProbeKind::ReadIops,
        ProbeKind::WriteIops,
    ];

    /// Stable string form, also used as the fio job name
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeKind::ReadBandwidth => "read_bandwidth",
            ProbeKind::WriteBandwidth => "write_bandwidth",
            ProbeKind::ReadIops => "read_iops",
            ProbeKind::WriteIops => "write_iops",
        }
    }

    /// Sequential, large-block, multi-job probes
    pub fn is_bandwidth(&self) -> bool {
        matches!(self, ProbeKind::ReadBandwidth | ProbeKind::WriteBandwidth)
    }

    pub fn is_read(&self) -> bool {
        matches!(self, ProbeKind::ReadBandwidth | ProbeKind::ReadIops)
    }

    /// Unit of the metric this kind reports
    pub fn unit(&self) -> &'static str {
        if self.is_bandwidth() {
            "B/s"
        } else {
            "IOPS"
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProbeKind {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ProbeKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ProbeError::InvalidKind(s.to_string()))
    }
}

/// Builder for a single probe attempt
///
/// ```
/// use diskprobe::{ProbeKind, ProbeOptions};
/// use std::time::Duration;
///
/// let config = ProbeOptions::new()
///     .kind(ProbeKind::WriteIops)
///     .directory("dir")
///     .duration(Duration::from_secs(10))
///     .size(5 << 30)
///     .build()
///     .unwrap();
/// assert_eq!(config.kind(), ProbeKind::WriteIops);
/// ```
pub struct ProbeOptions {
    kind: Option<ProbeKind>,
    directory: PathBuf,
    duration: Duration,
    ramp: Duration,
    size: u64,
    max_rate: u64,
    logging_to: Box<dyn DiagnosticSink>,
    fio_binary: PathBuf,
    space_margin: u64,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            kind: None,
            directory: PathBuf::new(),
            duration: DEFAULT_DURATION,
            ramp: DEFAULT_RAMP,
            size: DEFAULT_SIZE,
            max_rate: 0,
            logging_to: Box::new(Discard),
            fio_binary: PathBuf::from(DEFAULT_FIO_BINARY),
            space_margin: DEFAULT_SPACE_MARGIN,
        }
    }
}

impl ProbeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kind of probe; required
    pub fn kind(mut self, kind: ProbeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Scratch directory; the volume backing it is what gets measured
    pub fn directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directory = dir.into();
        self
    }

    /// How long measurements are recorded for
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Ramp-up period before measurements start
    pub fn ramp(mut self, ramp: Duration) -> Self {
        self.ramp = ramp;
        self
    }

    /// Total bytes of data laid out on disk during the probe
    pub fn size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Upper bound on bandwidth (bandwidth kinds) or IOPS (IOPS kinds); 0 is unlimited
    pub fn max_rate(mut self, rate: u64) -> Self {
        self.max_rate = rate;
        self
    }

    /// Where fio's raw output goes when it fails
    pub fn logging_to(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.logging_to = Box::new(sink);
        self
    }

    /// Benchmark binary, resolved on `PATH` unless it contains a separator
    pub fn fio_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.fio_binary = binary.into();
        self
    }

    /// Free space required beyond the data set itself
    pub fn space_margin(mut self, margin: u64) -> Self {
        self.space_margin = margin;
        self
    }

    /// Validate the accumulated options
    pub fn build(self) -> Result<ProbeConfig, ProbeError> {
        let kind = self.kind.ok_or(ProbeError::MissingKind)?;

        Ok(ProbeConfig {
            kind,
            directory: self.directory,
            duration: self.duration,
            ramp: self.ramp,
            size: self.size,
            max_rate: self.max_rate,
            logging_to: self.logging_to,
            fio_binary: self.fio_binary,
            space_margin: self.space_margin,
        })
    }
}

impl fmt::Debug for ProbeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeOptions")
            .field("kind", &self.kind)
            .field("directory", &self.directory)
            .field("duration", &self.duration)
            .field("ramp", &self.ramp)
            .field("size", &self.size)
            .field("max_rate", &self.max_rate)
            .field("fio_binary", &self.fio_binary)
            .field("space_margin", &self.space_margin)
            .finish_non_exhaustive()
    }
}

/// Validated configuration of one probe attempt
pub struct ProbeConfig {
    kind: ProbeKind,
    directory: PathBuf,
    duration: Duration,
    ramp: Duration,
    size: u64,
    max_rate: u64,
    logging_to: Box<dyn DiagnosticSink>,
    fio_binary: PathBuf,
    space_margin: u64,
}

impl ProbeConfig {
    pub fn kind(&self) -> ProbeKind {
        self.kind
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn ramp(&self) -> Duration {
        self.ramp
    }

    /// Configured total size, before any per-job split
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn max_rate(&self) -> u64 {
        self.max_rate
    }

    pub fn fio_binary(&self) -> &Path {
        &self.fio_binary
    }

    pub fn space_margin(&self) -> u64 {
        self.space_margin
    }

    pub(crate) fn sink_mut(&mut self) -> &mut dyn DiagnosticSink {
        self.logging_to.as_mut()
    }
}

impl fmt::Debug for ProbeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeConfig")
            .field("kind", &self.kind)
            .field("directory", &self.directory)
            .field("duration", &self.duration)
            .field("ramp", &self.ramp)
            .field("size", &self.size)
            .field("max_rate", &self.max_rate)
            .field("fio_binary", &self.fio_binary)
            .field("space_margin", &self.space_margin)
            .finish_non_exhaustive()
    }
}
