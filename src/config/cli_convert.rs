//! CLI to probe options conversion utilities

use super::toml::ProbeFile;
use super::{ProbeKind, ProbeOptions, DEFAULT_DURATION, DEFAULT_FIO_BINARY, DEFAULT_RAMP, DEFAULT_SIZE, DEFAULT_SPACE_MARGIN};
use crate::config::cli::{Cli, KindArg};
use crate::error::ProbeError;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Parse a size string (e.g., "1G", "100M", "4k") to bytes
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_lowercase();

    let (num_str, multiplier) = if s.ends_with('k') || s.ends_with("kb") || s.ends_with("kib") {
        (s.trim_end_matches("ib").trim_end_matches('b').trim_end_matches('k'), 1u64 << 10)
    } else if s.ends_with('m') || s.ends_with("mb") || s.ends_with("mib") {
        (s.trim_end_matches("ib").trim_end_matches('b').trim_end_matches('m'), 1 << 20)
    } else if s.ends_with('g') || s.ends_with("gb") || s.ends_with("gib") {
        (s.trim_end_matches("ib").trim_end_matches('b').trim_end_matches('g'), 1 << 30)
    } else if s.ends_with('t') || s.ends_with("tb") || s.ends_with("tib") {
        (s.trim_end_matches("ib").trim_end_matches('b').trim_end_matches('t'), 1 << 40)
    } else {
        (s.trim_end_matches('b'), 1)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .with_context(|| format!("Invalid size format: {}", s))?;

    num.checked_mul(multiplier)
        .with_context(|| format!("Size out of range: {}", s))
}

/// Parse a duration string (e.g., "60s", "5m", "1h")
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();

    let (num_str, multiplier) = if s.ends_with("ms") {
        (s.trim_end_matches("ms"), 0)
    } else if s.ends_with("sec") || s.ends_with('s') {
        (s.trim_end_matches("sec").trim_end_matches('s'), 1u64)
    } else if s.ends_with("min") || s.ends_with('m') {
        (s.trim_end_matches("min").trim_end_matches('m'), 60)
    } else if s.ends_with("hr") || s.ends_with('h') {
        (s.trim_end_matches("hr").trim_end_matches('h'), 3600)
    } else {
        (s.as_str(), 1)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .with_context(|| format!("Invalid duration format: {}", s))?;

    if multiplier == 0 {
        return Ok(Duration::from_millis(num));
    }
    Ok(Duration::from_secs(num.saturating_mul(multiplier)))
}

/// Expand CLI kinds into probe kinds, preserving order and dropping repeats
pub fn convert_kinds(args: &[KindArg]) -> Vec<ProbeKind> {
    let mut kinds = Vec::new();
    for arg in args {
        let expanded: &[ProbeKind] = match arg {
            KindArg::ReadBandwidth => &[ProbeKind::ReadBandwidth],
            KindArg::WriteBandwidth => &[ProbeKind::WriteBandwidth],
            KindArg::ReadIops => &[ProbeKind::ReadIops],
            KindArg::WriteIops => &[ProbeKind::WriteIops],
            KindArg::All => &ProbeKind::ALL,
        };
        for kind in expanded {
            if !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }
    }
    kinds
}

/// Resolved settings for a CLI run of one or more probes
#[derive(Debug, Clone, PartialEq)]
pub struct ProbePlan {
    pub kinds: Vec<ProbeKind>,
    pub directory: PathBuf,
    pub duration: Duration,
    pub ramp: Duration,
    pub size: u64,
    pub max_rate: u64,
    pub fio: PathBuf,
    pub space_margin: u64,
    pub timeout: Option<Duration>,
}

impl Default for ProbePlan {
    fn default() -> Self {
        Self {
            kinds: Vec::new(),
            directory: PathBuf::new(),
            duration: DEFAULT_DURATION,
            ramp: DEFAULT_RAMP,
            size: DEFAULT_SIZE,
            max_rate: 0,
            fio: PathBuf::from(DEFAULT_FIO_BINARY),
            space_margin: DEFAULT_SPACE_MARGIN,
            timeout: None,
        }
    }
}

impl ProbePlan {
    /// Probe options for one kind of this plan
    pub fn options(&self, kind: ProbeKind) -> ProbeOptions {
        ProbeOptions::new()
            .kind(kind)
            .directory(&self.directory)
            .duration(self.duration)
            .ramp(self.ramp)
            .size(self.size)
            .max_rate(self.max_rate)
            .fio_binary(&self.fio)
            .space_margin(self.space_margin)
    }
}

/// Build a plan from an optional config file overlaid with CLI flags
pub fn build_plan(cli: &Cli, file: Option<ProbeFile>) -> Result<ProbePlan> {
    let mut plan = ProbePlan::default();

    if let Some(file) = file {
        file.apply(&mut plan)?;
    }

    if !cli.kinds.is_empty() {
        plan.kinds = convert_kinds(&cli.kinds);
    }
    if let Some(ref directory) = cli.directory {
        plan.directory = directory.clone();
    }
    if let Some(ref duration) = cli.duration {
        plan.duration = parse_duration(duration)?;
    }
    if let Some(ref ramp) = cli.ramp {
        plan.ramp = parse_duration(ramp)?;
    }
    if let Some(ref size) = cli.size {
        plan.size = parse_size(size)?;
    }
    if let Some(ref max_rate) = cli.max_rate {
        plan.max_rate = parse_size(max_rate)?;
    }
    if let Some(ref fio) = cli.fio {
        plan.fio = fio.clone();
    }
    if let Some(ref margin) = cli.space_margin {
        plan.space_margin = parse_size(margin)?;
    }
    if let Some(ref timeout) = cli.timeout {
        plan.timeout = Some(parse_duration(timeout)?);
    }

    if plan.kinds.is_empty() {
        return Err(ProbeError::MissingKind).context("pass --kind or set probe.kinds in the config file");
    }

    Ok(plan)
}
