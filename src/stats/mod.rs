//! Reducing a fio report to the single requested metric

pub mod report;

use crate::config::ProbeKind;
use crate::error::ProbeError;
use report::BenchmarkReport;

/// Parse fio's JSON output
pub fn parse_report(output: &[u8]) -> Result<BenchmarkReport, ProbeError> {
    Ok(serde_json::from_slice(output)?)
}

/// Extract the metric for `kind` from the first job record
///
/// Bandwidth kinds yield bytes per second, IOPS kinds yield operations per
/// second truncated toward zero.
pub fn extract_metric(report: &BenchmarkReport, kind: ProbeKind) -> Result<u64, ProbeError> {
    let job = report.jobs.first().ok_or(ProbeError::NoJobData)?;

    let metric = match kind {
        ProbeKind::ReadBandwidth => job.read.bw_bytes,
        ProbeKind::WriteBandwidth => job.write.bw_bytes,
        ProbeKind::ReadIops => job.read.iops as u64,
        ProbeKind::WriteIops => job.write.iops as u64,
    };
    Ok(metric)
}
