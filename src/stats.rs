//! Per-request statistics for `-c` mode

use std::collections::HashMap;
use std::io::{self, Write};

/// Statistics for a single request name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestStats {
    /// Number of calls observed
    pub count: u64,
    /// Calls that returned an error
    pub errors: u64,
    /// Total time between entry and exit (microseconds)
    pub total_time_us: u64,
}

/// Summary totals over all requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatTotals {
    pub total_calls: u64,
    pub total_errors: u64,
    pub total_time_us: u64,
}

/// Tracks statistics for every request name seen
#[derive(Debug, Default)]
pub struct StatsTracker {
    stats: HashMap<String, RequestStats>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed ioctl.
    pub fn record(&mut self, request: &str, failed: bool, duration_us: u64) {
        let entry = self.stats.entry(request.to_string()).or_default();
        entry.count += 1;
        entry.total_time_us += duration_us;
        if failed {
            entry.errors += 1;
        }
    }

    pub fn get(&self, request: &str) -> Option<&RequestStats> {
        self.stats.get(request)
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn totals(&self) -> StatTotals {
        self.stats.values().fold(
            StatTotals {
                total_calls: 0,
                total_errors: 0,
                total_time_us: 0,
            },
            |acc, s| StatTotals {
                total_calls: acc.total_calls + s.count,
                total_errors: acc.total_errors + s.errors,
                total_time_us: acc.total_time_us + s.total_time_us,
            },
        )
    }

    /// Rows sorted by call count (descending), then name.
    fn sorted(&self) -> Vec<(&String, &RequestStats)> {
        let mut sorted: Vec<_> = self.stats.iter().collect();
        sorted.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(b.0)));
        sorted
    }

    /// Write the strace-style summary table.
    pub fn write_summary<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.stats.is_empty() {
            return writeln!(out, "No ioctls traced.");
        }

        let totals = self.totals();

        writeln!(out, "% time     seconds  usecs/call     calls    errors request")?;
        writeln!(out, "------ ----------- ----------- --------- --------- ----------------")?;

        for (name, stats) in self.sorted() {
            let time_percent = if totals.total_time_us > 0 {
                (stats.total_time_us as f64 / totals.total_time_us as f64) * 100.0
            } else {
                0.0
            };
            let seconds = stats.total_time_us as f64 / 1_000_000.0;
            let usecs_per_call = stats.total_time_us.checked_div(stats.count).unwrap_or(0);

            writeln!(
                out,
                "{:6.2} {:>11.6} {:>11} {:>9} {:>9} {}",
                time_percent,
                seconds,
                usecs_per_call,
                stats.count,
                blank_if_zero(stats.errors),
                name
            )?;
        }

        writeln!(out, "------ ----------- ----------- --------- --------- ----------------")?;
        writeln!(
            out,
            "100.00 {:>11.6} {:>11} {:>9} {:>9} total",
            totals.total_time_us as f64 / 1_000_000.0,
            totals.total_time_us.checked_div(totals.total_calls).unwrap_or(0),
            totals.total_calls,
            blank_if_zero(totals.total_errors)
        )
    }

    /// Print the summary to stderr (matching strace behavior)
    pub fn print_summary(&self) {
        let stderr = io::stderr();
        let _ = self.write_summary(&mut stderr.lock());
    }
}

fn blank_if_zero(value: u64) -> String {
    if value > 0 {
        value.to_string()
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_calls() {
        let mut tracker = StatsTracker::new();
        tracker.record("DRM_IOCTL_VERSION", false, 100);
        tracker.record("DRM_IOCTL_GET_CAP", false, 50);
        tracker.record("DRM_IOCTL_GET_CAP", false, 75);

        assert_eq!(tracker.get("DRM_IOCTL_VERSION").unwrap().count, 1);
        assert_eq!(tracker.get("DRM_IOCTL_GET_CAP").unwrap().count, 2);
        assert_eq!(tracker.get("DRM_IOCTL_GET_CAP").unwrap().total_time_us, 125);
    }

    #[test]
    fn test_records_errors() {
        let mut tracker = StatsTracker::new();
        tracker.record("DRM_IOCTL_SET_MASTER", true, 10);
        tracker.record("DRM_IOCTL_SET_MASTER", false, 10);
        assert_eq!(tracker.get("DRM_IOCTL_SET_MASTER").unwrap().errors, 1);
    }

    #[test]
    fn test_totals() {
        let mut tracker = StatsTracker::new();
        tracker.record("A", false, 10);
        tracker.record("B", true, 30);
        assert_eq!(
            tracker.totals(),
            StatTotals {
                total_calls: 2,
                total_errors: 1,
                total_time_us: 40
            }
        );
    }

    #[test]
    fn test_summary_table() {
        let mut tracker = StatsTracker::new();
        tracker.record("DRM_IOCTL_GET_CAP", false, 20);
        tracker.record("DRM_IOCTL_GET_CAP", true, 20);
        tracker.record("DRM_IOCTL_VERSION", false, 60);

        let mut out = Vec::new();
        tracker.write_summary(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].ends_with("request"));
        // most frequent first
        assert!(lines[2].ends_with("DRM_IOCTL_GET_CAP"));
        assert!(lines[2].starts_with(" 40.00"));
        assert!(lines[3].ends_with("DRM_IOCTL_VERSION"));
        assert!(lines[5].ends_with("total"));
        assert!(lines[5].contains("        3         1 "));
    }

    #[test]
    fn test_empty_summary() {
        let mut out = Vec::new();
        StatsTracker::new().write_summary(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No ioctls traced.\n");
    }
}
