use std::fmt;
use std::time::Duration;

use crate::cli::Args;

/// Address family constraint for resolution and source binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IpFamily {
    #[default]
    Any,
    V4,
    V6,
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpFamily::Any => write!(f, "IP"),
            IpFamily::V4 => write!(f, "IPv4"),
            IpFamily::V6 => write!(f, "IPv6"),
        }
    }
}

/// Runtime configuration derived from CLI args
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of probes to send (None = until stopped)
    pub count: Option<u64>,
    /// Interval between probes
    pub interval: Duration,
    /// Per-probe connect timeout; independent of `run_timeout` and kept
    /// below `interval` by default so probes never overlap
    pub probe_timeout: Duration,
    /// Overall bound on the run (None = unbounded)
    pub run_timeout: Option<Duration>,
    /// Hostname resolution timeout
    pub resolve_timeout: Duration,
    /// Address family constraint
    pub family: IpFamily,
    /// Re-resolve the hostname once this many consecutive probes have
    /// failed (None = never)
    pub retry_resolve_after: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            count: None,
            interval: Duration::from_secs(1),
            probe_timeout: Duration::from_millis(500),
            run_timeout: None,
            resolve_timeout: Duration::from_secs(2),
            family: IpFamily::Any,
            retry_resolve_after: None,
        }
    }
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        let family = if args.ipv4 {
            IpFamily::V4
        } else if args.ipv6 {
            IpFamily::V6
        } else {
            IpFamily::Any
        };

        Self {
            count: if args.count == 0 { None } else { Some(args.count) },
            interval: args.interval_duration(),
            probe_timeout: args.timeout_duration(),
            run_timeout: args.run_timeout.map(Duration::from_secs_f64),
            resolve_timeout: Duration::from_secs_f64(args.resolve_timeout),
            family,
            retry_resolve_after: if args.retry_resolve_after == 0 {
                None
            } else {
                Some(args.retry_resolve_after)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_config_from_args() {
        let args = Args::parse_from([
            "knock", "-c", "5", "-i", "0.2", "-t", "0.1", "-r", "3", "-6", "example.com", "443",
        ]);
        let config = Config::from(&args);

        assert_eq!(config.count, Some(5));
        assert_eq!(config.interval, Duration::from_millis(200));
        assert_eq!(config.probe_timeout, Duration::from_millis(100));
        assert_eq!(config.retry_resolve_after, Some(3));
        assert_eq!(config.family, IpFamily::V6);
        assert_eq!(config.run_timeout, None);
    }

    #[test]
    fn test_zero_count_means_unbounded() {
        let args = Args::parse_from(["knock", "example.com", "443"]);
        let config = Config::from(&args);
        assert_eq!(config.count, None);
        assert_eq!(config.retry_resolve_after, None);
    }

    #[test]
    fn test_default_probe_timeout_below_interval() {
        let config = Config::default();
        assert!(config.probe_timeout < config.interval);
    }
}
