//! JSON output formatting
//!
//! Results are emitted as an array so that multi-kind runs produce a single
//! document:
//!
//! ```text
//! [
//!   { "kind": "write_iops", "value": 375191, "unit": "IOPS", "human": "375.19K IOPS" }
//! ]
//! ```

use super::ProbeResult;
use crate::config::ProbeKind;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Serialized form of a [`ProbeResult`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonProbeResult {
    pub kind: ProbeKind,
    pub value: u64,
    pub unit: String,
    pub human: String,
}

impl From<&ProbeResult> for JsonProbeResult {
    fn from(result: &ProbeResult) -> Self {
        Self {
            kind: result.kind,
            value: result.value,
            unit: result.kind.unit().to_string(),
            human: result.human(),
        }
    }
}

/// Write all results as a pretty-printed JSON array
pub fn write_results<W: Write>(writer: &mut W, results: &[ProbeResult]) -> serde_json::Result<()> {
    let json: Vec<JsonProbeResult> = results.iter().map(JsonProbeResult::from).collect();
    serde_json::to_writer_pretty(&mut *writer, &json)?;
    writeln!(writer).map_err(serde_json::Error::io)
}
