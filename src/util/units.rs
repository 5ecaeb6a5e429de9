//! Human-readable formatting for byte counts and rates
//!
//! All byte quantities use binary (IEC) multiples, matching the units the
//! probe sizes are configured in.

use std::time::Duration;

const IEC_UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

/// Format a byte count using IEC units
///
/// Values below ten of a unit keep one decimal place, larger values are
/// rounded to whole units.
///
/// # Examples
///
/// ```
/// use diskprobe::util::units::format_ibytes;
///
/// assert_eq!(format_ibytes(512), "512 B");
/// assert_eq!(format_ibytes(3 << 30), "3.0 GiB");
/// assert_eq!(format_ibytes(15 << 30), "15 GiB");
/// ```
pub fn format_ibytes(bytes: u64) -> String {
    let mut scaled = bytes as f64;
    let mut exp = 0;
    while scaled >= 1024.0 && exp < IEC_UNITS.len() - 1 {
        scaled /= 1024.0;
        exp += 1;
    }

    if exp == 0 {
        return format!("{} B", bytes);
    }

    let rounded = (scaled * 10.0 + 0.5).floor() / 10.0;
    if rounded < 10.0 {
        format!("{:.1} {}", rounded, IEC_UNITS[exp])
    } else {
        format!("{:.0} {}", rounded, IEC_UNITS[exp])
    }
}

/// Format a bandwidth in bytes per second
///
/// # Examples
///
/// ```
/// use diskprobe::util::units::format_throughput;
///
/// assert_eq!(format_throughput(500), "500.00 B/s");
/// assert_eq!(format_throughput(2_621_440), "2.50 MiB/s");
/// ```
pub fn format_throughput(bytes_per_sec: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;
    const TIB: f64 = GIB * 1024.0;

    let rate = bytes_per_sec as f64;
    if rate >= TIB {
        format!("{:.2} TiB/s", rate / TIB)
    } else if rate >= GIB {
        format!("{:.2} GiB/s", rate / GIB)
    } else if rate >= MIB {
        format!("{:.2} MiB/s", rate / MIB)
    } else if rate >= KIB {
        format!("{:.2} KiB/s", rate / KIB)
    } else {
        format!("{:.2} B/s", rate)
    }
}

/// Format an operation rate
pub fn format_iops(ops_per_sec: u64) -> String {
    let rate = ops_per_sec as f64;
    if rate < 1_000.0 {
        format!("{} IOPS", ops_per_sec)
    } else if rate < 1_000_000.0 {
        format!("{:.2}K IOPS", rate / 1_000.0)
    } else {
        format!("{:.2}M IOPS", rate / 1_000_000.0)
    }
}

/// Format a duration the way fio expects it on the command line
///
/// Only whole seconds are passed; anything below a second is truncated.
pub fn fio_seconds(duration: Duration) -> String {
    format!("{}s", duration.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ibytes() {
        assert_eq!(format_ibytes(0), "0 B");
        assert_eq!(format_ibytes(1023), "1023 B");
        assert_eq!(format_ibytes(1024), "1.0 KiB");
        assert_eq!(format_ibytes(1536), "1.5 KiB");
        assert_eq!(format_ibytes(5 << 30), "5.0 GiB");
        assert_eq!(format_ibytes(15 << 30), "15 GiB");
        assert_eq!(format_ibytes(10 << 40), "10 TiB");
    }

    #[test]
    fn test_format_throughput() {
        assert_eq!(format_throughput(500), "500.00 B/s");
        assert_eq!(format_throughput(1536), "1.50 KiB/s");
        assert_eq!(format_throughput(1536 * 1024), "1.50 MiB/s");
        assert_eq!(format_throughput(1536 * 1024 * 1024), "1.50 GiB/s");
    }

    #[test]
    fn test_format_iops() {
        assert_eq!(format_iops(500), "500 IOPS");
        assert_eq!(format_iops(375_191), "375.19K IOPS");
        assert_eq!(format_iops(2_500_000), "2.50M IOPS");
    }

    #[test]
    fn test_fio_seconds_truncates() {
        assert_eq!(fio_seconds(Duration::from_secs(60)), "60s");
        assert_eq!(fio_seconds(Duration::from_millis(2999)), "2s");
        assert_eq!(fio_seconds(Duration::ZERO), "0s");
    }
}
