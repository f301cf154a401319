use anyhow::Result;
use std::io::Write;

use crate::state::Statistics;

/// Export the final statistics snapshot as a one-row CSV summary
pub fn export_csv<W: Write>(stats: &Statistics, mut writer: W) -> Result<()> {
    writeln!(
        writer,
        "host,ip,port,started,ended,probes,successful,failed,loss_pct,\
         min_ms,avg_ms,max_ms,uptime_s,downtime_s,longest_up_s,longest_down_s,resolve_retries"
    )?;

    let (min, avg, max) = match stats.rtt_summary() {
        Some(rtt) => (
            format!("{:.3}", rtt.min),
            format!("{:.3}", rtt.avg),
            format!("{:.3}", rtt.max),
        ),
        None => (String::new(), String::new(), String::new()),
    };

    let longest_up = stats
        .longest_up
        .map(|w| format!("{:.3}", w.duration.as_secs_f64()))
        .unwrap_or_default();
    let longest_down = stats
        .longest_down
        .map(|w| format!("{:.3}", w.duration.as_secs_f64()))
        .unwrap_or_default();

    writeln!(
        writer,
        "{},{},{},{},{},{},{},{},{:.1},{},{},{},{:.3},{:.3},{},{},{}",
        escape_csv(&stats.target.original),
        stats.target.resolved,
        stats.target.port,
        stats.start_time.to_rfc3339(),
        stats.end_time.map(|t| t.to_rfc3339()).unwrap_or_default(),
        stats.total_probes(),
        stats.total_successful,
        stats.total_unsuccessful,
        stats.loss_pct(),
        min,
        avg,
        max,
        stats.total_uptime.as_secs_f64(),
        stats.total_downtime.as_secs_f64(),
        longest_up,
        longest_down,
        stats.resolution_retries
    )?;

    Ok(())
}

/// Escape a string for CSV (quote if contains comma, quote, or newline)
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IpFamily;
    use crate::state::{ProbeOutcome, Target};
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
    }

    #[test]
    fn test_export_has_header_and_one_row() {
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let target = Target::new(
            "example.com".into(),
            "192.0.2.1".parse().unwrap(),
            443,
            IpFamily::Any,
        );
        let mut stats = Statistics::new(target, t0);
        stats.fold(
            ProbeOutcome::Success {
                elapsed: Duration::from_millis(5),
            },
            t0,
        );
        stats.finalize(t0 + chrono::Duration::seconds(1));

        let mut buf = Vec::new();
        export_csv(&stats, &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("host,ip,port"));
        assert!(lines[1].starts_with("example.com,192.0.2.1,443,"));
        assert!(lines[1].contains(",1,1,0,0.0,"));
    }
}
