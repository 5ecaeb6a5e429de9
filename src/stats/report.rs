//! fio JSON report schema
//!
//! Only the aggregate bandwidth and IOPS summaries are modelled. fio emits far
//! more (latency histograms, percentiles, per-depth distributions, CPU usage);
//! serde ignores every field not listed here. An abbreviated report:
//!
//! ```text
//! {
//!   "fio version" : "fio-3.30",
//!   "timestamp" : 1690585048,
//!   "jobs" : [
//!     {
//!       "jobname" : "write_bandwidth",
//!       "groupid" : 0,
//!       "error" : 0,
//!       "job options" : { "numjobs" : "8", "bs" : "1048576", "rw" : "write", ... },
//!       "read" : { "io_bytes" : 0, "bw_bytes" : 0, "iops" : 0.000000, ... },
//!       "write" : {
//!         "io_bytes" : 12455510016,
//!         "bw_bytes" : 1243064870,
//!         "bw" : 1213930,
//!         "iops" : 1185.478386,
//!         "bw_min" : 994304, "bw_max" : 1433600, "bw_agg" : 100.0,
//!         "bw_mean" : 1215003.2, "bw_dev" : 8121.9, "bw_samples" : 160,
//!         "iops_min" : 971, "iops_max" : 1400, "iops_mean" : 1186.5,
//!         "iops_stddev" : 7.9, "iops_samples" : 160,
//!         "slat_ns" : { ... }, "clat_ns" : { "percentile" : { ... } }, ...
//!       },
//!       "usr_cpu" : 1.2, "sys_cpu" : 3.4, ...
//!     }
//!   ],
//!   "disk_util" : [ ... ]
//! }
//! ```
//!
//! With `--group_reporting=1` fio folds all parallel jobs into the first job
//! record, so `jobs[0]` carries the aggregate figures.

use serde::{Deserialize, Serialize};

/// Top-level fio report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchmarkReport {
    #[serde(rename = "fio version", default, skip_serializing_if = "Option::is_none")]
    pub fio_version: Option<String>,
    pub jobs: Vec<JobReport>,
}

/// Per-job (or, with group reporting, aggregate) record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobReport {
    #[serde(default)]
    pub jobname: String,
    pub read: IoStats,
    pub write: IoStats,
}

/// Bandwidth and IOPS summary for one direction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IoStats {
    /// Aggregate bandwidth in bytes per second
    pub bw_bytes: u64,
    /// Aggregate operations per second
    pub iops: f64,

    // Bandwidth samples are reported in KiB/s.
    #[serde(default)]
    pub bw_min: i64,
    #[serde(default)]
    pub bw_max: i64,
    #[serde(default)]
    pub bw_agg: f64,
    #[serde(default)]
    pub bw_mean: f64,
    #[serde(default)]
    pub bw_dev: f64,
    #[serde(default)]
    pub bw_samples: i64,

    #[serde(default)]
    pub iops_min: i64,
    #[serde(default)]
    pub iops_max: i64,
    #[serde(default)]
    pub iops_mean: f64,
    #[serde(default)]
    pub iops_stddev: f64,
    #[serde(default)]
    pub iops_samples: i64,
}
