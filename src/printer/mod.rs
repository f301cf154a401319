pub mod json;
pub mod text;

pub use json::*;
pub use text::*;

use std::time::Duration;

use crate::cli::Args;
use crate::state::Statistics;

/// Rendering-side options, deliberately kept out of the statistics aggregate
#[derive(Debug, Clone, Copy, Default)]
pub struct PrinterOptions {
    pub color: bool,
    pub show_timestamps: bool,
    pub show_failures_only: bool,
}

impl From<&Args> for PrinterOptions {
    fn from(args: &Args) -> Self {
        Self {
            color: !args.no_color,
            show_timestamps: args.show_timestamps,
            show_failures_only: args.show_failures_only,
        }
    }
}

/// Consumer of statistics snapshots.
///
/// The scheduler calls these synchronously at the corresponding state
/// transitions and never blocks on anything beyond the call itself. The
/// snapshot reference is only valid for the duration of the call.
pub trait Observer {
    fn on_start(&mut self, stats: &Statistics);
    fn on_probe_success(&mut self, stats: &Statistics);
    fn on_probe_failure(&mut self, stats: &Statistics);
    fn on_retrying_resolve(&mut self, stats: &Statistics);
    fn on_total_downtime(&mut self, stats: &Statistics, downtime: Duration);
    fn on_statistics(&mut self, stats: &Statistics);
    fn on_error(&mut self, message: &str);
    fn on_shutdown(&mut self, stats: &Statistics);
}

impl<T: Observer + ?Sized> Observer for Box<T> {
    fn on_start(&mut self, stats: &Statistics) {
        (**self).on_start(stats)
    }
    fn on_probe_success(&mut self, stats: &Statistics) {
        (**self).on_probe_success(stats)
    }
    fn on_probe_failure(&mut self, stats: &Statistics) {
        (**self).on_probe_failure(stats)
    }
    fn on_retrying_resolve(&mut self, stats: &Statistics) {
        (**self).on_retrying_resolve(stats)
    }
    fn on_total_downtime(&mut self, stats: &Statistics, downtime: Duration) {
        (**self).on_total_downtime(stats, downtime)
    }
    fn on_statistics(&mut self, stats: &Statistics) {
        (**self).on_statistics(stats)
    }
    fn on_error(&mut self, message: &str) {
        (**self).on_error(message)
    }
    fn on_shutdown(&mut self, stats: &Statistics) {
        (**self).on_shutdown(stats)
    }
}

/// Render a duration for humans ("343 ms", "2.0 seconds", "1h 3m 2s")
pub fn humanize(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 1.0 {
        return format!("{:.0} ms", secs * 1000.0);
    }
    if secs < 60.0 {
        return format!("{:.1} seconds", secs);
    }
    let whole = d.as_secs();
    let (h, m, s) = (whole / 3600, (whole % 3600) / 60, whole % 60);
    if h > 0 {
        format!("{}h {}m {}s", h, m, s)
    } else {
        format!("{}m {}s", m, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize() {
        assert_eq!(humanize(Duration::from_millis(343)), "343 ms");
        assert_eq!(humanize(Duration::from_secs(2)), "2.0 seconds");
        assert_eq!(humanize(Duration::from_secs(62)), "1m 2s");
        assert_eq!(humanize(Duration::from_secs(3782)), "1h 3m 2s");
    }
}
