//! Line-oriented text output, colored or plain

use chrono::Local;
use crossterm::style::{Color, Stylize};
use std::time::Duration;

use super::{humanize, Observer, PrinterOptions};
use crate::state::Statistics;

/// Human-facing observer writing one line per probe plus a summary block
pub struct TextPrinter {
    options: PrinterOptions,
}

impl TextPrinter {
    pub fn new(options: PrinterOptions) -> Self {
        Self { options }
    }

    fn paint(&self, text: String, color: Color) -> String {
        if self.options.color {
            text.with(color).to_string()
        } else {
            text
        }
    }

    fn prefix(&self) -> String {
        if self.options.show_timestamps {
            format!("{} ", Local::now().format("%Y-%m-%d %H:%M:%S"))
        } else {
            String::new()
        }
    }

    /// "host (ip) on port p", collapsing to "ip on port p" for literal targets
    fn endpoint(stats: &Statistics) -> String {
        let target = &stats.target;
        if target.is_literal() {
            format!("{} on port {}", target.resolved, target.port)
        } else {
            format!(
                "{} ({}) on port {}",
                target.original, target.resolved, target.port
            )
        }
    }

    fn print_summary(&self, stats: &Statistics) {
        let header = format!("--- {} statistics ---", Self::endpoint(stats));
        println!("{}", self.paint(header, Color::Cyan));

        println!(
            "{} probes sent, {} successful, {} failed ({:.1}% loss)",
            stats.total_probes(),
            stats.total_successful,
            stats.total_unsuccessful,
            stats.loss_pct()
        );

        println!(
            "total uptime: {}, total downtime: {}",
            humanize(stats.total_uptime),
            humanize(stats.total_downtime)
        );

        if let Some(up) = stats.longest_up {
            println!(
                "longest uptime: {} (from {} to {})",
                humanize(up.duration),
                up.start.with_timezone(&Local).format("%H:%M:%S"),
                up.end.with_timezone(&Local).format("%H:%M:%S")
            );
        }
        if let Some(down) = stats.longest_down {
            println!(
                "longest downtime: {} (from {} to {})",
                humanize(down.duration),
                down.start.with_timezone(&Local).format("%H:%M:%S"),
                down.end.with_timezone(&Local).format("%H:%M:%S")
            );
        }

        if stats.resolution_retries > 0 {
            println!("hostname resolution retries: {}", stats.resolution_retries);
        }
        if stats.resolved_addresses.len() > 1 {
            let chain: Vec<String> = stats
                .resolved_addresses
                .iter()
                .map(|r| r.addr.to_string())
                .collect();
            println!("IP address changes: {}", chain.join(" -> "));
        }

        if let Some(rtt) = stats.rtt_summary() {
            println!(
                "rtt min/avg/max: {:.2}/{:.2}/{:.2} ms",
                rtt.min, rtt.avg, rtt.max
            );
        }

        if let Some(end) = stats.end_time {
            let elapsed = end
                .signed_duration_since(stats.start_time)
                .to_std()
                .unwrap_or_default();
            println!("run duration: {}", humanize(elapsed));
        }
    }
}

impl Observer for TextPrinter {
    fn on_start(&mut self, stats: &Statistics) {
        println!("Probing {}", Self::endpoint(stats));
    }

    fn on_probe_success(&mut self, stats: &Statistics) {
        if self.options.show_failures_only {
            return;
        }
        let rtt_ms = stats
            .latency_samples
            .last()
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or_default();
        let line = format!(
            "{}Reply from {} tcp_open={} time={:.2} ms",
            self.prefix(),
            Self::endpoint(stats),
            stats.total_successful,
            rtt_ms
        );
        println!("{}", self.paint(line, Color::Green));
    }

    fn on_probe_failure(&mut self, stats: &Statistics) {
        let line = format!(
            "{}No reply from {} tcp_fail={}",
            self.prefix(),
            Self::endpoint(stats),
            stats.total_unsuccessful
        );
        println!("{}", self.paint(line, Color::Red));
    }

    fn on_retrying_resolve(&mut self, stats: &Statistics) {
        let line = format!(
            "{}retrying to resolve {}",
            self.prefix(),
            stats.target.original
        );
        println!("{}", self.paint(line, Color::Yellow));
    }

    fn on_total_downtime(&mut self, _stats: &Statistics, downtime: Duration) {
        let line = format!("{}target was down for {}", self.prefix(), humanize(downtime));
        println!("{}", self.paint(line, Color::Yellow));
    }

    fn on_statistics(&mut self, stats: &Statistics) {
        self.print_summary(stats);
    }

    fn on_error(&mut self, message: &str) {
        eprintln!("{}", self.paint(format!("Error: {}", message), Color::Red));
    }

    fn on_shutdown(&mut self, stats: &Statistics) {
        // Leave the ^C echo on its own line
        println!();
        self.print_summary(stats);
    }
}
