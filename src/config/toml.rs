//! TOML configuration file parsing
//!
//! ```toml
//! [probe]
//! kinds = ["write_bandwidth", "write_iops"]
//! directory = "/mnt/data/probe"
//! duration = "30s"
//! ramp = "2s"
//! size = "4G"
//! max_rate = "200M"
//! ```
//!
//! Sizes and rates may be given as integers (bytes, or ops/sec) or as strings
//! with a unit suffix.

use super::cli_convert::{parse_duration, parse_size, ProbePlan};
use super::ProbeKind;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Contents of a probe config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeFile {
    #[serde(default)]
    pub probe: ProbeSection,
}

/// The `[probe]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeSection {
    #[serde(default)]
    pub kinds: Vec<String>,
    pub directory: Option<PathBuf>,
    pub duration: Option<String>,
    pub ramp: Option<String>,
    pub size: Option<ByteValue>,
    pub max_rate: Option<ByteValue>,
    pub fio: Option<PathBuf>,
    pub space_margin: Option<ByteValue>,
    pub timeout: Option<String>,
}

/// A quantity given either as a plain integer or as a suffixed string
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ByteValue {
    Exact(u64),
    Text(String),
}

impl ByteValue {
    pub fn resolve(&self) -> Result<u64> {
        match self {
            ByteValue::Exact(value) => Ok(*value),
            ByteValue::Text(text) => parse_size(text),
        }
    }
}

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<ProbeFile> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<ProbeFile> {
    let file: ProbeFile = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(file)
}

impl ProbeFile {
    /// Overwrite plan fields with the values this file sets
    pub fn apply(&self, plan: &mut ProbePlan) -> Result<()> {
        let section = &self.probe;

        if !section.kinds.is_empty() {
            plan.kinds = section
                .kinds
                .iter()
                .map(|kind| kind.parse::<ProbeKind>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .context("Invalid probe.kinds entry")?;
        }
        if let Some(ref directory) = section.directory {
            plan.directory = directory.clone();
        }
        if let Some(ref duration) = section.duration {
            plan.duration = parse_duration(duration).context("Invalid probe.duration")?;
        }
        if let Some(ref ramp) = section.ramp {
            plan.ramp = parse_duration(ramp).context("Invalid probe.ramp")?;
        }
        if let Some(ref size) = section.size {
            plan.size = size.resolve().context("Invalid probe.size")?;
        }
        if let Some(ref max_rate) = section.max_rate {
            plan.max_rate = max_rate.resolve().context("Invalid probe.max_rate")?;
        }
        if let Some(ref fio) = section.fio {
            plan.fio = fio.clone();
        }
        if let Some(ref margin) = section.space_margin {
            plan.space_margin = margin.resolve().context("Invalid probe.space_margin")?;
        }
        if let Some(ref timeout) = section.timeout {
            plan.timeout = Some(parse_duration(timeout).context("Invalid probe.timeout")?);
        }

        Ok(())
    }
}
