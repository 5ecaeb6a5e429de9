//! Rendering probe results for the command line

pub mod json;
pub mod text;

use crate::config::ProbeKind;
use crate::util::units::{format_iops, format_throughput};

/// Metric produced by one successful probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    pub kind: ProbeKind,
    pub value: u64,
}

impl ProbeResult {
    pub fn new(kind: ProbeKind, value: u64) -> Self {
        Self { kind, value }
    }

    /// Value with units, e.g. `1.50 GiB/s` or `375.19K IOPS`
    pub fn human(&self) -> String {
        if self.kind.is_bandwidth() {
            format_throughput(self.value)
        } else {
            format_iops(self.value)
        }
    }
}
