use std::io::Write;

use crate::printer::humanize;
use crate::state::Statistics;

/// Generate an aligned plain-text report from the final snapshot
pub fn generate_report<W: Write>(stats: &Statistics, mut writer: W) -> std::io::Result<()> {
    writeln!(
        writer,
        "knock report for {} ({}) port {}",
        stats.target.original, stats.target.resolved, stats.target.port
    )?;
    writeln!(
        writer,
        "Started: {}",
        stats.start_time.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    if let Some(end) = stats.end_time {
        writeln!(writer, "Ended:   {}", end.format("%Y-%m-%d %H:%M:%S UTC"))?;
    }
    writeln!(writer)?;

    writeln!(
        writer,
        "{:<12} {} sent, {} ok, {} failed ({:.1}% loss)",
        "Probes:",
        stats.total_probes(),
        stats.total_successful,
        stats.total_unsuccessful,
        stats.loss_pct()
    )?;

    let longest_up = stats
        .longest_up
        .map(|w| format!(", longest {}", humanize(w.duration)))
        .unwrap_or_default();
    writeln!(
        writer,
        "{:<12} {} total{}",
        "Uptime:",
        humanize(stats.total_uptime),
        longest_up
    )?;

    let longest_down = stats
        .longest_down
        .map(|w| format!(", longest {}", humanize(w.duration)))
        .unwrap_or_default();
    writeln!(
        writer,
        "{:<12} {} total{}",
        "Downtime:",
        humanize(stats.total_downtime),
        longest_down
    )?;

    if let Some(rtt) = stats.rtt_summary() {
        writeln!(
            writer,
            "{:<12} min {:.2} ms / avg {:.2} ms / max {:.2} ms",
            "RTT:", rtt.min, rtt.avg, rtt.max
        )?;
    }

    if stats.resolution_retries > 0 || stats.resolved_addresses.len() > 1 {
        writeln!(
            writer,
            "{:<12} {} retries, {} address(es) seen",
            "Resolution:",
            stats.resolution_retries,
            stats.resolved_addresses.len()
        )?;
    }

    Ok(())
}

/// Generate report to string
#[allow(dead_code)]
pub fn generate_report_string(stats: &Statistics) -> String {
    let mut buf = Vec::new();
    generate_report(stats, &mut buf).expect("writing to Vec cannot fail");
    String::from_utf8(buf).expect("report is valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IpFamily;
    use crate::state::{ProbeOutcome, Target};
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    #[test]
    fn test_report_contains_counters() {
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let target = Target::new(
            "example.com".into(),
            "192.0.2.1".parse().unwrap(),
            22,
            IpFamily::Any,
        );
        let mut stats = Statistics::new(target, t0);
        stats.fold(
            ProbeOutcome::Success {
                elapsed: Duration::from_millis(3),
            },
            t0,
        );
        stats.fold(ProbeOutcome::Failure, t0 + chrono::Duration::seconds(1));
        stats.finalize(t0 + chrono::Duration::seconds(2));

        let report = generate_report_string(&stats);
        assert!(report.contains("example.com (192.0.2.1) port 22"));
        assert!(report.contains("2 sent, 1 ok, 1 failed (50.0% loss)"));
        assert!(report.contains("RTT:"));
    }
}
