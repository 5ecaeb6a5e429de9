//! End-to-end probe tests against a scripted stand-in for fio

use diskprobe::{probe, ErrorCategory, MemorySink, ProbeError, ProbeKind, ProbeOptions};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const REPORT: &str = r#"{
  "fio version" : "fio-3.30",
  "timestamp" : 1690585048,
  "jobs" : [
    {
      "jobname" : "probe",
      "groupid" : 0,
      "error" : 0,
      "read" : {
        "io_bytes" : 21474836480,
        "bw_bytes" : 2147483648,
        "iops" : 2048.7,
        "bw_min" : 2000000, "bw_max" : 2200000, "bw_agg" : 100.0,
        "bw_mean" : 2097152.0, "bw_dev" : 1000.0, "bw_samples" : 80,
        "clat_ns" : { "percentile" : { "99.000000" : 123456 } }
      },
      "write" : {
        "io_bytes" : 15007867904,
        "bw_bytes" : 1536786432,
        "iops" : 375191.38,
        "iops_min" : 360000, "iops_max" : 390000, "iops_mean" : 375000.0,
        "iops_stddev" : 12.5, "iops_samples" : 80
      },
      "usr_cpu" : 12.1,
      "sys_cpu" : 40.2
    }
  ],
  "disk_util" : [ { "name" : "nvme0n1", "util" : 99.9 } ]
}"#;

/// Scratch area holding the fake fio, its side-channel files and the probe directory
struct Harness {
    root: TempDir,
}

impl Harness {
    fn new() -> Self {
        Self {
            root: TempDir::new().unwrap(),
        }
    }

    fn probe_dir(&self) -> PathBuf {
        self.root.path().join("dir")
    }

    fn args_file(&self) -> PathBuf {
        self.root.path().join("args")
    }

    fn launched_marker(&self) -> PathBuf {
        self.root.path().join("launched")
    }

    /// Install a fake fio whose body runs after it records its arguments
    fn fake_fio(&self, body: &str) -> PathBuf {
        let path = self.root.path().join("fake-fio");
        let script = format!(
            "#!/bin/sh\ntouch '{launched}'\nprintf '%s\\n' \"$@\" > '{args}'\n{body}\n",
            launched = self.launched_marker().display(),
            args = self.args_file().display(),
            body = body,
        );
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Fake fio that checks it runs against a fresh scratch directory, then reports
    fn reporting_fio(&self) -> PathBuf {
        let body = format!(
            "for a in \"$@\"; do if [ \"$prev\" = \"--directory\" ]; then dir=\"$a\"; fi; prev=\"$a\"; done\n\
             [ -d \"$dir\" ] || exit 9\n\
             [ -z \"$(ls -A \"$dir\")\" ] || exit 8\n\
             touch \"$dir/probe.0.0\"\n\
             cat <<'EOF'\n{}\nEOF",
            REPORT
        );
        self.fake_fio(&body)
    }

    fn options(&self, fio: &Path, kind: ProbeKind) -> ProbeOptions {
        ProbeOptions::new()
            .kind(kind)
            .directory(self.probe_dir())
            .duration(Duration::from_secs(10))
            .ramp(Duration::from_secs(2))
            .size(4 << 20)
            .space_margin(0)
            .fio_binary(fio)
    }

    fn recorded_args(&self) -> Vec<String> {
        fs::read_to_string(self.args_file())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

#[tokio::test]
async fn test_each_kind_returns_metric_and_cleans_up() {
    let expected = [
        (ProbeKind::ReadBandwidth, 2_147_483_648),
        (ProbeKind::WriteBandwidth, 1_536_786_432),
        (ProbeKind::ReadIops, 2048),
        (ProbeKind::WriteIops, 375_191),
    ];

    for (kind, want) in expected {
        let harness = Harness::new();
        let fio = harness.reporting_fio();
        let cancel = CancellationToken::new();

        let metric = probe(&cancel, harness.options(&fio, kind)).await.unwrap();
        assert_eq!(metric, want, "{kind}");
        assert!(metric > 0);
        assert!(!harness.probe_dir().exists(), "{kind} left its directory behind");
    }
}

#[tokio::test]
async fn test_write_iops_scenario() {
    let harness = Harness::new();
    let fio = harness.reporting_fio();
    let cancel = CancellationToken::new();

    // The full-size argument list is covered by the command builder's tests;
    // a small data set keeps this runnable on any temp volume.
    let options = harness.options(&fio, ProbeKind::WriteIops).size(64 << 20);

    let iops = probe(&cancel, options).await.unwrap();
    assert_eq!(iops, 375_191);

    let args = harness.recorded_args();
    assert_eq!(arg_value(&args, "--name"), Some("write_iops"));
    assert_eq!(arg_value(&args, "--size"), Some("67108864"));
    assert_eq!(arg_value(&args, "--runtime"), Some("10s"));
    assert_eq!(arg_value(&args, "--ramp_time"), Some("2s"));
    assert_eq!(arg_value(&args, "--rw"), Some("randwrite"));
    assert_eq!(arg_value(&args, "--bs"), Some("4096"));
    assert_eq!(arg_value(&args, "--iodepth"), Some("64"));
    assert_eq!(arg_value(&args, "--output-format"), Some("json"));
    assert_eq!(arg_value(&args, "--numjobs"), None);
    assert!(args.iter().any(|a| a == "--group_reporting=1"));
    assert!(args.iter().any(|a| a == "--time_based"));
}

#[tokio::test]
async fn test_rate_caps_reach_fio() {
    let harness = Harness::new();
    let fio = harness.reporting_fio();
    let cancel = CancellationToken::new();

    probe(&cancel, harness.options(&fio, ProbeKind::WriteBandwidth).max_rate(80 << 20))
        .await
        .unwrap();
    let args = harness.recorded_args();
    assert_eq!(arg_value(&args, "--numjobs"), Some("8"));
    assert_eq!(arg_value(&args, "--rate"), Some("10485760"));
    assert_eq!(arg_value(&args, "--size"), Some("524288"));

    probe(&cancel, harness.options(&fio, ProbeKind::ReadIops).max_rate(1000))
        .await
        .unwrap();
    let args = harness.recorded_args();
    assert_eq!(arg_value(&args, "--rate_iops"), Some("1000"));
    assert_eq!(arg_value(&args, "--rate"), None);
}

#[tokio::test]
async fn test_stale_directory_is_wiped_before_run() {
    let harness = Harness::new();
    let fio = harness.reporting_fio();
    fs::create_dir_all(harness.probe_dir().join("leftover")).unwrap();
    fs::write(harness.probe_dir().join("write_iops.0.0"), b"stale").unwrap();

    let cancel = CancellationToken::new();
    // The fake fio exits non-zero if the directory is not empty.
    probe(&cancel, harness.options(&fio, ProbeKind::WriteIops)).await.unwrap();
    assert!(!harness.probe_dir().exists());
}

#[tokio::test]
async fn test_insufficient_space_fails_before_launch() {
    let harness = Harness::new();
    let fio = harness.reporting_fio();
    let cancel = CancellationToken::new();

    let err = probe(&cancel, harness.options(&fio, ProbeKind::WriteIops).size(u64::MAX))
        .await
        .unwrap_err();

    assert!(matches!(err, ProbeError::InsufficientSpace { .. }), "{err}");
    assert_eq!(err.category(), ErrorCategory::Resource);
    assert!(err.to_string().starts_with("insufficient disk space: "));
    assert!(!harness.launched_marker().exists());
    assert!(!harness.probe_dir().exists());
}

#[tokio::test]
async fn test_default_margin_is_enforced() {
    let harness = Harness::new();
    let fio = harness.reporting_fio();
    let cancel = CancellationToken::new();

    let available = diskprobe::target::available_space(harness.root.path()).unwrap();
    // A data set that fits on its own but not with the 5 GiB margin on top.
    let size = available.saturating_sub(1 << 30);
    let options = ProbeOptions::new()
        .kind(ProbeKind::ReadIops)
        .directory(harness.probe_dir())
        .size(size)
        .fio_binary(&fio);

    let err = probe(&cancel, options).await.unwrap_err();
    assert!(matches!(err, ProbeError::InsufficientSpace { .. }), "{err}");
    assert!(!harness.launched_marker().exists());
}

#[tokio::test]
async fn test_tool_failure_forwards_output_to_sink() {
    let harness = Harness::new();
    let fio = harness.fake_fio("echo 'fio: engine libaio not loadable'\nsleep 0.1\necho 'fio: failed to load engine' >&2\nexit 1");
    let sink = MemorySink::new();
    let cancel = CancellationToken::new();

    let err = probe(&cancel, harness.options(&fio, ProbeKind::ReadIops).logging_to(sink.clone()))
        .await
        .unwrap_err();

    match err {
        ProbeError::ToolFailed { ref status, .. } => assert_eq!(status.code(), Some(1)),
        ref other => panic!("expected tool failure, got {other:?}"),
    }
    assert_eq!(err.category(), ErrorCategory::Invocation);
    assert_eq!(
        sink.contents_lossy(),
        "fio: engine libaio not loadable\nfio: failed to load engine\n"
    );
    assert!(!harness.probe_dir().exists());
}

#[tokio::test]
async fn test_missing_binary_is_invocation_error() {
    let harness = Harness::new();
    let cancel = CancellationToken::new();
    let missing = harness.root.path().join("no-fio-here");

    let err = probe(&cancel, harness.options(&missing, ProbeKind::ReadIops)).await.unwrap_err();
    assert!(matches!(err, ProbeError::Launch { .. }), "{err}");
    assert_eq!(err.category(), ErrorCategory::Invocation);
    assert!(!harness.probe_dir().exists());
}

#[tokio::test]
async fn test_malformed_output_is_parse_error() {
    let harness = Harness::new();
    let fio = harness.fake_fio("printf '{\"jobs\": [{\"read\": {\"bw_bytes\": 1'");
    let cancel = CancellationToken::new();

    let err = probe(&cancel, harness.options(&fio, ProbeKind::ReadBandwidth)).await.unwrap_err();
    assert!(matches!(err, ProbeError::Parse(_)), "{err}");
    assert_eq!(err.category(), ErrorCategory::Parse);
    assert!(!harness.probe_dir().exists());
}

#[tokio::test]
async fn test_empty_job_list_is_parse_error() {
    let harness = Harness::new();
    let fio = harness.fake_fio("echo '{\"fio version\": \"fio-3.30\", \"jobs\": []}'");
    let cancel = CancellationToken::new();

    let err = probe(&cancel, harness.options(&fio, ProbeKind::WriteIops)).await.unwrap_err();
    assert!(matches!(err, ProbeError::NoJobData), "{err}");
    assert_eq!(err.category(), ErrorCategory::Parse);
}

/// Whether `pid` names a live (non-zombie) process; `None` without procfs
fn process_alive(pid: u32) -> Option<bool> {
    if !Path::new("/proc/self/stat").exists() {
        return None;
    }
    let stat = match fs::read_to_string(format!("/proc/{pid}/stat")) {
        Ok(stat) => stat,
        Err(_) => return Some(false),
    };
    // pid (comm) state ...
    let state = stat.rsplit(')').next().and_then(|rest| rest.split_whitespace().next());
    Some(state != Some("Z"))
}

#[tokio::test]
async fn test_cancellation_kills_tool_and_cleans_up() {
    let harness = Harness::new();
    let bg_pid_file = harness.root.path().join("bg-pid");
    let fio = harness.fake_fio(&format!(
        "sleep 30 &\necho $! > '{}'\nsleep 30\nwait",
        bg_pid_file.display()
    ));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = probe(&cancel, harness.options(&fio, ProbeKind::WriteBandwidth)).await.unwrap_err();

    assert!(matches!(err, ProbeError::Cancelled), "{err}");
    assert_eq!(err.category(), ErrorCategory::Cancellation);
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(!harness.probe_dir().exists());

    // Processes forked by the tool must not outlive the probe.
    let bg_pid: u32 = fs::read_to_string(&bg_pid_file).unwrap().trim().parse().unwrap();
    let deadline = Instant::now() + Duration::from_secs(2);
    while process_alive(bg_pid) == Some(true) && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_ne!(process_alive(bg_pid), Some(true), "forked process {bg_pid} survived cancellation");
}

#[tokio::test]
async fn test_cancellation_after_tool_exits_with_forked_writer() {
    let harness = Harness::new();
    // The tool exits immediately, leaving a child that still holds stdout.
    let fio = harness.fake_fio("sleep 20 &\nexit 0");

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = probe(&cancel, harness.options(&fio, ProbeKind::ReadIops)).await.unwrap_err();

    assert!(matches!(err, ProbeError::Cancelled), "{err}");
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(!harness.probe_dir().exists());
}

#[tokio::test]
async fn test_dropped_probe_kills_forked_processes() {
    let harness = Harness::new();
    let bg_pid_file = harness.root.path().join("bg-pid");
    let fio = harness.fake_fio(&format!(
        "sleep 30 >/dev/null 2>&1 &\necho $! > '{}'\nsleep 30\nwait",
        bg_pid_file.display()
    ));
    let cancel = CancellationToken::new();

    let outcome = tokio::time::timeout(
        Duration::from_millis(500),
        probe(&cancel, harness.options(&fio, ProbeKind::WriteIops)),
    )
    .await;
    assert!(outcome.is_err(), "fake tool finished before the timeout");

    let bg_pid: u32 = fs::read_to_string(&bg_pid_file).unwrap().trim().parse().unwrap();
    let deadline = Instant::now() + Duration::from_secs(2);
    while (process_alive(bg_pid) == Some(true) || harness.probe_dir().exists()) && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_ne!(process_alive(bg_pid), Some(true), "forked process {bg_pid} outlived the dropped probe");
    assert!(!harness.probe_dir().exists());
}

#[tokio::test]
async fn test_missing_kind_has_no_side_effects() {
    let harness = Harness::new();
    let fio = harness.reporting_fio();
    let cancel = CancellationToken::new();

    let options = ProbeOptions::new()
        .directory(harness.probe_dir())
        .size(1 << 20)
        .fio_binary(&fio);
    let err = probe(&cancel, options).await.unwrap_err();

    assert!(matches!(err, ProbeError::MissingKind));
    assert!(!harness.probe_dir().exists());
    assert!(!harness.launched_marker().exists());
}

#[test]
fn test_supported_is_false_for_absent_tool() {
    assert!(!diskprobe::supported_binary("diskprobe-absent-benchmark"));
}
