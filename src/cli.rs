use clap::Parser;
use std::net::IpAddr;
use std::time::Duration;

/// TCP connect prober with uptime/downtime and latency statistics
#[derive(Parser, Debug, Clone)]
#[command(name = "knock")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Target host (IP address or hostname)
    #[arg(required = true)]
    pub host: String,

    /// Target TCP port
    #[arg(required = true)]
    pub port: u16,

    /// Number of probes to send (0 = until stopped)
    #[arg(short = 'c', long = "count", default_value = "0")]
    pub count: u64,

    /// Interval between probes in seconds
    #[arg(short = 'i', long = "interval", default_value = "1.0")]
    pub interval: f64,

    /// Per-probe connect timeout in seconds
    #[arg(short = 't', long = "timeout", default_value = "0.5")]
    pub timeout: f64,

    /// Stop the whole run after this many seconds
    #[arg(long = "run-timeout")]
    pub run_timeout: Option<f64>,

    /// Hostname resolution timeout in seconds
    #[arg(long = "resolve-timeout", default_value = "2.0")]
    pub resolve_timeout: f64,

    /// Force IPv4
    #[arg(short = '4', long = "ipv4")]
    pub ipv4: bool,

    /// Force IPv6
    #[arg(short = '6', long = "ipv6")]
    pub ipv6: bool,

    /// Bind probes to a network interface by name (e.g. eth0)
    #[arg(short = 'I', long = "interface")]
    pub interface: Option<String>,

    /// Bind probes to a specific source IP address
    #[arg(long = "source-ip")]
    pub source_ip: Option<IpAddr>,

    /// Re-resolve the hostname after this many consecutive failures (0 = never)
    #[arg(short = 'r', long = "retry-resolve-after", default_value = "0")]
    pub retry_resolve_after: u64,

    /// Only print failed probes
    #[arg(long = "show-failures-only")]
    pub show_failures_only: bool,

    /// Prefix each probe line with a timestamp
    #[arg(short = 'D', long = "show-timestamps")]
    pub show_timestamps: bool,

    /// Emit events as JSON lines instead of text
    #[arg(short = 'j', long = "json")]
    pub json: bool,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Write a CSV summary to this path when the run ends
    #[arg(long = "csv")]
    pub csv: Option<String>,
}

impl Args {
    /// Get probe interval as Duration
    pub fn interval_duration(&self) -> Duration {
        Duration::from_secs_f64(self.interval)
    }

    /// Get per-probe timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs_f64(self.timeout)
    }

    /// Validate arguments
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port must be between 1 and 65535".into());
        }

        if self.ipv4 && self.ipv6 {
            return Err("Cannot specify both -4 and -6".into());
        }

        if self.interval <= 0.0 {
            return Err("Interval must be positive".into());
        }

        if self.timeout <= 0.0 {
            return Err("Timeout must be positive".into());
        }

        if self.resolve_timeout <= 0.0 {
            return Err("Resolve timeout must be positive".into());
        }

        if let Some(rt) = self.run_timeout {
            if rt <= 0.0 {
                return Err("Run timeout must be positive".into());
            }
        }

        if self.interface.is_some() && self.source_ip.is_some() {
            return Err("Use either --interface or --source-ip, not both".into());
        }

        // Validate interface name
        if let Some(ref iface) = self.interface {
            if iface.is_empty() {
                return Err("Interface name cannot be empty".into());
            }
            // IFNAMSIZ on Linux is 16 including null terminator
            if iface.len() > 15 {
                return Err(format!("Interface name too long: {} (max 15 chars)", iface));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["knock", "example.com", "443"]);
        assert_eq!(args.host, "example.com");
        assert_eq!(args.port, 443);
        assert_eq!(args.count, 0);
        assert_eq!(args.interval_duration(), Duration::from_secs(1));
        assert_eq!(args.timeout_duration(), Duration::from_millis(500));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_rejects_both_families() {
        let args = Args::parse_from(["knock", "-4", "-6", "example.com", "443"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_rejects_port_zero() {
        let args = Args::parse_from(["knock", "example.com", "0"]);
        assert!(args.validate().unwrap_err().contains("Port"));
    }

    #[test]
    fn test_rejects_interface_and_source_ip() {
        let args = Args::parse_from([
            "knock",
            "-I",
            "eth0",
            "--source-ip",
            "192.0.2.1",
            "example.com",
            "443",
        ]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_rejects_long_interface_name() {
        let args = Args::parse_from(["knock", "-I", "averylonginterface0", "example.com", "443"]);
        assert!(args.validate().unwrap_err().contains("too long"));
    }
}
