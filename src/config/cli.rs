//! CLI argument parsing using clap

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Probe kind as accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Sequential reads, 8 jobs, 1 MiB blocks
    ReadBandwidth,
    /// Sequential writes, 8 jobs, 1 MiB blocks
    WriteBandwidth,
    /// Random reads, 1 job, 4 KiB blocks
    ReadIops,
    /// Random writes, 1 job, 4 KiB blocks
    WriteIops,
    /// All four kinds, bandwidth first
    All,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// diskprobe - measure disk bandwidth and IOPS with fio
#[derive(Parser, Debug)]
#[command(name = "diskprobe")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Probe kind; repeat to run several probes in order
    #[arg(short = 'k', long = "kind", value_enum)]
    pub kinds: Vec<KindArg>,

    /// Scratch directory on the volume to measure (wiped before and after)
    #[arg(short = 'd', long)]
    pub directory: Option<PathBuf>,

    /// Measurement window (e.g., 60s, 5m)
    #[arg(long)]
    pub duration: Option<String>,

    /// Ramp-up period excluded from measurement (e.g., 2s)
    #[arg(long)]
    pub ramp: Option<String>,

    /// Total data-set size (e.g., 10G, 512M)
    #[arg(short = 's', long)]
    pub size: Option<String>,

    /// Rate cap: bytes/sec for bandwidth probes (e.g., 80M), ops/sec for IOPS probes
    #[arg(long)]
    pub max_rate: Option<String>,

    /// fio binary to run
    #[arg(long, env = "DISKPROBE_FIO")]
    pub fio: Option<PathBuf>,

    /// Free space required beyond the data set (e.g., 5G)
    #[arg(long)]
    pub space_margin: Option<String>,

    /// Cancel the run after this long (e.g., 10m)
    #[arg(long)]
    pub timeout: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// TOML file with a [probe] table; flags override its values
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Report whether fio is available and exit
    #[arg(long)]
    pub check: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate argument combinations clap can't express
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.check && !self.kinds.is_empty() {
            anyhow::bail!("--check cannot be combined with --kind");
        }
        Ok(())
    }
}
