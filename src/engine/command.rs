//! fio argument construction
//!
//! Bandwidth probes run sequential I/O with 8 parallel jobs and 1 MiB blocks;
//! IOPS probes run random I/O from a single job with 4 KiB blocks. Both use
//! direct I/O at queue depth 64 with verification off. Equivalent to:
//!
//! ```text
//! fio --name=write_bandwidth --directory=$DIR --size=1342177280 \
//!   --time_based --runtime=60s --ramp_time=2s --ioengine=libaio \
//!   --direct=1 --verify=0 --iodepth=64 --group_reporting=1 \
//!   --output-format=json --numjobs=8 --rw=write --bs=1048576
//!
//! fio --name=read_iops --directory=$DIR --size=10737418240 \
//!   --time_based --runtime=60s --ramp_time=2s --ioengine=libaio \
//!   --direct=1 --verify=0 --iodepth=64 --group_reporting=1 \
//!   --output-format=json --rw=randread --bs=4096
//! ```

use super::IoEngine;
use crate::config::{ProbeConfig, ProbeKind};
use crate::util::units::fio_seconds;
use std::fmt::Display;

/// Parallel jobs used by bandwidth probes
pub const BANDWIDTH_JOBS: u64 = 8;

/// Block size of bandwidth probes (1 MiB)
pub const BANDWIDTH_BLOCK_SIZE: u64 = 1 << 20;

/// Block size of IOPS probes (4 KiB)
pub const IOPS_BLOCK_SIZE: u64 = 4 << 10;

/// Outstanding I/Os per job
pub const QUEUE_DEPTH: u32 = 64;

/// A fully-resolved fio invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FioJob {
    args: Vec<String>,
    jobs: u64,
    per_job_size: u64,
}

impl FioJob {
    /// Derive the fio invocation for a validated configuration
    pub fn new(config: &ProbeConfig) -> Self {
        Self::for_kind(config, config.kind())
    }

    /// Derive the fio invocation for `kind`, taking every other setting from `config`
    pub fn for_kind(config: &ProbeConfig, kind: ProbeKind) -> Self {
        let engine = IoEngine::platform_default();

        // Bandwidth probes spread the data set across parallel jobs so the
        // aggregate stays within the configured size.
        let jobs = if kind.is_bandwidth() { BANDWIDTH_JOBS } else { 1 };
        let per_job_size = config.size() / jobs;

        let mut args = FioArgs::default();
        args.flag("--name", kind.as_str());
        args.flag("--directory", config.directory().display());
        args.flag("--size", per_job_size);
        args.switch("--time_based");
        args.flag("--runtime", fio_seconds(config.duration()));
        args.flag("--ramp_time", fio_seconds(config.ramp()));
        args.flag("--ioengine", engine.as_str());
        args.flag("--direct", 1);
        args.flag("--verify", 0);
        args.flag("--iodepth", QUEUE_DEPTH);
        args.switch("--group_reporting=1");
        args.flag("--output-format", "json");

        if kind.is_bandwidth() {
            args.flag("--numjobs", jobs);
        }

        let rw = match kind {
            ProbeKind::ReadBandwidth => "read",
            ProbeKind::WriteBandwidth => "write",
            ProbeKind::ReadIops => "randread",
            ProbeKind::WriteIops => "randwrite",
        };
        args.flag("--rw", rw);

        let block_size = if kind.is_bandwidth() {
            BANDWIDTH_BLOCK_SIZE
        } else {
            IOPS_BLOCK_SIZE
        };
        args.flag("--bs", block_size);

        if config.max_rate() != 0 {
            if kind.is_bandwidth() {
                // fio rate limits apply per job.
                args.flag("--rate", config.max_rate() / jobs);
            } else {
                args.flag("--rate_iops", config.max_rate());
            }
        }

        Self {
            args: args.0,
            jobs,
            per_job_size,
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Number of parallel fio jobs
    pub fn jobs(&self) -> u64 {
        self.jobs
    }

    /// Data-set size of each job
    pub fn per_job_size(&self) -> u64 {
        self.per_job_size
    }

    /// Disk space occupied by all jobs' data sets together
    pub fn footprint(&self) -> u64 {
        self.per_job_size.saturating_mul(self.jobs)
    }

    /// Value passed for `flag`, if present
    pub fn arg_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|arg| arg == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// Shell-like rendering for logs
    pub fn command_line(&self, program: &str) -> String {
        let mut line = program.to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

#[derive(Default)]
struct FioArgs(Vec<String>);

impl FioArgs {
    fn flag(&mut self, name: &str, value: impl Display) {
        self.0.push(name.to_string());
        self.0.push(value.to_string());
    }

    fn switch(&mut self, name: &str) {
        self.0.push(name.to_string());
    }
}
