use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::IpAddr;
use std::time::Duration;

use crate::config::IpFamily;

/// Target being probed
///
/// Immutable after resolution, except that a mid-run re-resolution may
/// replace `resolved` (see [`Statistics::record_resolution`]).
#[derive(Debug, Clone, Serialize)]
pub struct Target {
    /// Host as given on the command line (may equal the IP's text form)
    pub original: String,
    /// Currently resolved address
    pub resolved: IpAddr,
    /// TCP port probed
    pub port: u16,
    /// Address-family constraint the resolution honored
    #[serde(skip)]
    pub family: IpFamily,
}

impl Target {
    pub fn new(original: String, resolved: IpAddr, port: u16, family: IpFamily) -> Self {
        Self {
            original,
            resolved,
            port,
            family,
        }
    }

    /// True when the user gave a literal IP, so re-resolution is pointless
    pub fn is_literal(&self) -> bool {
        self.original.parse::<IpAddr>().is_ok()
    }
}

/// Result of a single connect attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Connection established; `elapsed` is the connect RTT
    Success { elapsed: Duration },
    /// Connection refused, unreachable, or timed out
    Failure,
}

impl ProbeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success { .. })
    }
}

/// Availability boundary crossed by a fold, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    /// First failure after a run of successes (or at run start)
    WentDown,
    /// First success after a run of failures; carries the closed window's length
    CameBackUp { downtime: Duration },
}

/// A closed run of consecutive same-outcome probes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

/// RTT summary in milliseconds, derived from the latency samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RttSummary {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

/// An address recorded at resolution time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedAddr {
    pub addr: IpAddr,
    pub at: DateTime<Utc>,
}

/// Running availability statistics for one probe run
///
/// Owned exclusively by the scheduler loop; observers only ever see `&self`
/// between folds. All mutation goes through [`fold`](Self::fold),
/// [`finalize`](Self::finalize) and the resolution bookkeeping methods.
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub target: Target,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,

    pub total_successful: u64,
    pub total_unsuccessful: u64,
    pub ongoing_successful_streak: u64,
    pub ongoing_unsuccessful_streak: u64,

    /// True iff the most recent probe failed and downtime tracking is open
    pub dest_was_down: bool,
    /// Start of the current unbroken up run (None = not started)
    pub start_of_uptime: Option<DateTime<Utc>>,
    /// Start of the current unbroken down run (None = not started)
    pub start_of_downtime: Option<DateTime<Utc>>,

    #[serde(with = "duration_ms")]
    pub total_uptime: Duration,
    #[serde(with = "duration_ms")]
    pub total_downtime: Duration,
    pub longest_up: Option<Window>,
    pub longest_down: Option<Window>,

    /// Connect RTTs of successful probes, in probe order
    #[serde(serialize_with = "duration_ms::serialize_vec")]
    pub latency_samples: Vec<Duration>,

    pub resolution_retries: u64,
    /// Addresses the target resolved to, deduplicated against the last entry
    pub resolved_addresses: Vec<ResolvedAddr>,
}

impl Statistics {
    pub fn new(target: Target, now: DateTime<Utc>) -> Self {
        let initial = ResolvedAddr {
            addr: target.resolved,
            at: now,
        };
        Self {
            target,
            start_time: now,
            end_time: None,
            total_successful: 0,
            total_unsuccessful: 0,
            ongoing_successful_streak: 0,
            ongoing_unsuccessful_streak: 0,
            dest_was_down: false,
            start_of_uptime: None,
            start_of_downtime: None,
            total_uptime: Duration::ZERO,
            total_downtime: Duration::ZERO,
            longest_up: None,
            longest_down: None,
            latency_samples: Vec::new(),
            resolution_retries: 0,
            resolved_addresses: vec![initial],
        }
    }

    /// Fold one probe outcome into the aggregate.
    ///
    /// Totals and longest-window fields are only touched at transition
    /// boundaries; the currently open window stays open until the outcome
    /// flips or the run is finalized.
    pub fn fold(&mut self, outcome: ProbeOutcome, now: DateTime<Utc>) -> Transition {
        match outcome {
            ProbeOutcome::Success { elapsed } => {
                self.ongoing_unsuccessful_streak = 0;
                self.ongoing_successful_streak += 1;
                self.total_successful += 1;
                self.latency_samples.push(elapsed);

                if self.dest_was_down {
                    let downtime = self.close_downtime_window(now);
                    self.dest_was_down = false;
                    self.start_of_uptime = Some(now);
                    Transition::CameBackUp { downtime }
                } else {
                    if self.start_of_uptime.is_none() {
                        self.start_of_uptime = Some(now);
                    }
                    Transition::None
                }
            }
            ProbeOutcome::Failure => {
                self.ongoing_successful_streak = 0;
                self.ongoing_unsuccessful_streak += 1;
                self.total_unsuccessful += 1;

                if self.dest_was_down {
                    Transition::None
                } else {
                    self.close_uptime_window(now);
                    self.start_of_downtime = Some(now);
                    self.dest_was_down = true;
                    Transition::WentDown
                }
            }
        }
    }

    /// Close whichever window is open and stamp the run end.
    ///
    /// Invoked from every scheduler exit path; safe to call more than once
    /// because closing a window clears its start marker, so a second call at
    /// the same boundary is a no-op.
    pub fn finalize(&mut self, now: DateTime<Utc>) {
        self.close_uptime_window(now);
        self.close_downtime_window(now);
        if self.end_time.is_none() {
            self.end_time = Some(now);
        }
    }

    /// Note a retry-triggered re-resolution attempt.
    ///
    /// Resets the failure streak so the next retry requires a fresh full
    /// run of consecutive failures rather than firing on every tick.
    pub fn note_resolution_retry(&mut self) {
        self.resolution_retries += 1;
        self.ongoing_unsuccessful_streak = 0;
    }

    /// Record the outcome of a (re-)resolution.
    ///
    /// Appends to the address history only when the address differs from the
    /// last recorded one, and points the target at the new address either way.
    pub fn record_resolution(&mut self, addr: IpAddr, at: DateTime<Utc>) {
        if self.resolved_addresses.last().map(|r| r.addr) != Some(addr) {
            self.resolved_addresses.push(ResolvedAddr { addr, at });
        }
        self.target.resolved = addr;
    }

    /// Total probes attempted so far
    pub fn total_probes(&self) -> u64 {
        self.total_successful + self.total_unsuccessful
    }

    /// Percentage of probes that failed
    pub fn loss_pct(&self) -> f64 {
        let total = self.total_probes();
        if total == 0 {
            0.0
        } else {
            self.total_unsuccessful as f64 / total as f64 * 100.0
        }
    }

    /// Min/max/average connect RTT, or None before the first success
    pub fn rtt_summary(&self) -> Option<RttSummary> {
        if self.latency_samples.is_empty() {
            return None;
        }
        let mut min = f64::INFINITY;
        let mut max = 0.0f64;
        let mut sum = 0.0f64;
        for sample in &self.latency_samples {
            let ms = sample.as_secs_f64() * 1000.0;
            min = min.min(ms);
            max = max.max(ms);
            sum += ms;
        }
        Some(RttSummary {
            min,
            max,
            avg: sum / self.latency_samples.len() as f64,
        })
    }

    fn close_uptime_window(&mut self, now: DateTime<Utc>) {
        if let Some(start) = self.start_of_uptime.take() {
            let duration = span(start, now);
            self.total_uptime += duration;
            update_longest(
                &mut self.longest_up,
                Window {
                    start,
                    end: now,
                    duration,
                },
            );
        }
    }

    fn close_downtime_window(&mut self, now: DateTime<Utc>) -> Duration {
        if let Some(start) = self.start_of_downtime.take() {
            let duration = span(start, now);
            self.total_downtime += duration;
            update_longest(
                &mut self.longest_down,
                Window {
                    start,
                    end: now,
                    duration,
                },
            );
            duration
        } else {
            Duration::ZERO
        }
    }
}

/// Wall-clock span between two timestamps, clamped at zero for skew
fn span(start: DateTime<Utc>, end: DateTime<Utc>) -> Duration {
    end.signed_duration_since(start)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Replace the stored longest window on a ≥ tie-break, so the most recent
/// run of equal length wins
fn update_longest(slot: &mut Option<Window>, candidate: Window) {
    match slot {
        Some(current) if candidate.duration < current.duration => {}
        _ => *slot = Some(candidate),
    }
}

/// Serde helpers for Duration as fractional milliseconds
pub(crate) mod duration_ms {
    use serde::{Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_secs_f64() * 1000.0).serialize(serializer)
    }

    pub fn serialize_vec<S>(samples: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(samples.iter().map(|d| d.as_secs_f64() * 1000.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::net::Ipv4Addr;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn test_stats() -> Statistics {
        let target = Target::new(
            "example.com".to_string(),
            IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34)),
            443,
            IpFamily::Any,
        );
        Statistics::new(target, t(0))
    }

    fn ok() -> ProbeOutcome {
        ProbeOutcome::Success {
            elapsed: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_streak_exclusivity() {
        let mut stats = test_stats();
        let outcomes = [
            ok(),
            ProbeOutcome::Failure,
            ProbeOutcome::Failure,
            ok(),
            ok(),
            ProbeOutcome::Failure,
        ];

        for (i, outcome) in outcomes.into_iter().enumerate() {
            stats.fold(outcome, t(i as i64));
            let up = stats.ongoing_successful_streak;
            let down = stats.ongoing_unsuccessful_streak;
            assert!(
                up == 0 || down == 0,
                "both streaks non-zero after probe {}: up={} down={}",
                i,
                up,
                down
            );
        }
    }

    #[test]
    fn test_scenario_ok_ok_fail_fail_ok() {
        let mut stats = test_stats();
        let outcomes = [ok(), ok(), ProbeOutcome::Failure, ProbeOutcome::Failure, ok()];
        for (i, outcome) in outcomes.into_iter().enumerate() {
            stats.fold(outcome, t(i as i64));
        }

        assert_eq!(stats.total_successful, 3);
        assert_eq!(stats.total_unsuccessful, 2);
        assert_eq!(stats.ongoing_successful_streak, 1);
        assert_eq!(stats.ongoing_unsuccessful_streak, 0);
        assert!(!stats.dest_was_down);

        // One closed downtime window from t2 (first failure) to t4 (recovery)
        let down = stats.longest_down.expect("downtime window closed");
        assert_eq!(down.start, t(2));
        assert_eq!(down.end, t(4));
        assert_eq!(down.duration, Duration::from_secs(2));
        assert_eq!(stats.total_downtime, Duration::from_secs(2));
    }

    #[test]
    fn test_transitions_reported_at_boundaries() {
        let mut stats = test_stats();
        assert_eq!(stats.fold(ok(), t(0)), Transition::None);
        assert_eq!(stats.fold(ProbeOutcome::Failure, t(1)), Transition::WentDown);
        assert_eq!(stats.fold(ProbeOutcome::Failure, t(2)), Transition::None);
        assert_eq!(
            stats.fold(ok(), t(3)),
            Transition::CameBackUp {
                downtime: Duration::from_secs(2)
            }
        );
    }

    #[test]
    fn test_first_probe_failure_opens_downtime() {
        let mut stats = test_stats();
        assert_eq!(stats.fold(ProbeOutcome::Failure, t(0)), Transition::WentDown);
        assert!(stats.dest_was_down);
        assert_eq!(stats.start_of_downtime, Some(t(0)));
        assert_eq!(stats.start_of_uptime, None);
        assert_eq!(stats.total_uptime, Duration::ZERO);
    }

    #[test]
    fn test_longest_tie_break_prefers_later_window() {
        let mut stats = test_stats();
        // Two downtime windows of 2s each: t1..t3 and t5..t7
        stats.fold(ok(), t(0));
        stats.fold(ProbeOutcome::Failure, t(1));
        stats.fold(ok(), t(3));
        stats.fold(ProbeOutcome::Failure, t(5));
        stats.fold(ok(), t(7));

        let down = stats.longest_down.expect("downtime windows closed");
        assert_eq!(down.duration, Duration::from_secs(2));
        assert_eq!(down.start, t(5), "equal-length later window must win");

        // A strictly shorter window must not displace it
        stats.fold(ProbeOutcome::Failure, t(8));
        stats.fold(ok(), t(9));
        assert_eq!(stats.longest_down.unwrap().start, t(5));
    }

    #[test]
    fn test_finalize_closes_open_window_once() {
        let mut stats = test_stats();
        stats.fold(ok(), t(0));
        stats.finalize(t(5));

        assert_eq!(stats.total_uptime, Duration::from_secs(5));
        assert_eq!(stats.end_time, Some(t(5)));
        let up = stats.longest_up.unwrap();
        assert_eq!(up.start, t(0));
        assert_eq!(up.end, t(5));

        // Second call at the same instant must not double-add
        stats.finalize(t(5));
        assert_eq!(stats.total_uptime, Duration::from_secs(5));
        assert_eq!(stats.longest_up.unwrap().duration, Duration::from_secs(5));
        assert_eq!(stats.total_downtime, Duration::ZERO);
    }

    #[test]
    fn test_uptime_downtime_conservation() {
        let mut stats = test_stats();
        let outcomes = [
            ok(),
            ok(),
            ProbeOutcome::Failure,
            ProbeOutcome::Failure,
            ProbeOutcome::Failure,
            ok(),
            ProbeOutcome::Failure,
        ];
        for (i, outcome) in outcomes.into_iter().enumerate() {
            stats.fold(outcome, t(i as i64));
        }
        stats.finalize(t(10));

        // Windows partition the run: up t0..t2, down t2..t5, up t5..t6, down t6..t10
        assert_eq!(
            stats.total_uptime + stats.total_downtime,
            Duration::from_secs(10)
        );
        assert_eq!(stats.total_uptime, Duration::from_secs(3));
        assert_eq!(stats.total_downtime, Duration::from_secs(7));
    }

    #[test]
    fn test_rtt_summary_empty_and_populated() {
        let mut stats = test_stats();
        assert!(stats.rtt_summary().is_none());

        stats.fold(
            ProbeOutcome::Success {
                elapsed: Duration::from_micros(1500),
            },
            t(0),
        );
        stats.fold(
            ProbeOutcome::Success {
                elapsed: Duration::from_micros(2500),
            },
            t(1),
        );

        let summary = stats.rtt_summary().unwrap();
        assert!((summary.min - 1.5).abs() < 1e-9, "sub-ms precision kept");
        assert!((summary.max - 2.5).abs() < 1e-9);
        assert!((summary.avg - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_counters_monotonic() {
        let mut stats = test_stats();
        let mut last = (0, 0);
        for i in 0..20 {
            let outcome = if i % 3 == 0 { ProbeOutcome::Failure } else { ok() };
            stats.fold(outcome, t(i));
            let cur = (stats.total_successful, stats.total_unsuccessful);
            assert!(cur.0 >= last.0 && cur.1 >= last.1);
            last = cur;
        }
        assert_eq!(stats.total_probes(), 20);
    }

    #[test]
    fn test_record_resolution_dedups_unchanged_address() {
        let mut stats = test_stats();
        let initial = stats.target.resolved;

        stats.record_resolution(initial, t(1));
        assert_eq!(stats.resolved_addresses.len(), 1);

        let changed = IpAddr::V4(Ipv4Addr::new(198, 51, 100, 7));
        stats.record_resolution(changed, t(2));
        assert_eq!(stats.resolved_addresses.len(), 2);
        assert_eq!(stats.target.resolved, changed);

        // Flapping back counts as a change again
        stats.record_resolution(initial, t(3));
        assert_eq!(stats.resolved_addresses.len(), 3);
    }

    #[test]
    fn test_loss_pct() {
        let mut stats = test_stats();
        assert_eq!(stats.loss_pct(), 0.0);
        stats.fold(ok(), t(0));
        stats.fold(ProbeOutcome::Failure, t(1));
        stats.fold(ProbeOutcome::Failure, t(2));
        stats.fold(ok(), t(3));
        assert!((stats.loss_pct() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_target_literal_detection() {
        let literal = Target::new("192.0.2.1".into(), "192.0.2.1".parse().unwrap(), 80, IpFamily::Any);
        assert!(literal.is_literal());
        let named = Target::new("example.com".into(), "192.0.2.1".parse().unwrap(), 80, IpFamily::Any);
        assert!(!named.is_literal());
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut stats = test_stats();
        stats.fold(ok(), t(0));
        stats.finalize(t(1));

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["total_successful"], 1);
        assert_eq!(json["latency_samples"][0], 10.0);
        assert_eq!(json["target"]["port"], 443);
    }
}
