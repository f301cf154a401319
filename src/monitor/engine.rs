//! The probe scheduler
//!
//! A single loop drives the whole run: it suspends on whichever of
//! {periodic tick, overall timeout, cancellation} fires first, probes once
//! per tick, folds the outcome into the statistics aggregate, and notifies
//! the observer. The aggregate is owned by this loop alone; observers only
//! ever see a shared reference between folds, so no synchronization is
//! needed.

use chrono::Utc;
use std::net::{IpAddr, SocketAddr};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::RunError;
use crate::lookup;
use crate::printer::Observer;
use crate::probe;
use crate::state::{Statistics, Target, Transition};

/// Why the loop stopped
enum Exit {
    Cancelled,
    DeadlineReached,
    CountReached,
}

/// The probe engine sends one TCP connect probe per tick
pub struct ProbeEngine<O> {
    config: Config,
    stats: Statistics,
    observer: O,
    cancel: CancellationToken,
    source_ip: Option<IpAddr>,
}

impl<O: Observer> ProbeEngine<O> {
    pub fn new(
        config: Config,
        target: Target,
        observer: O,
        cancel: CancellationToken,
        source_ip: Option<IpAddr>,
    ) -> Self {
        let stats = Statistics::new(target, Utc::now());
        Self {
            config,
            stats,
            observer,
            cancel,
            source_ip,
        }
    }

    /// Final statistics snapshot; stable once `run` has returned
    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    /// Run until cancelled, the probe count is exhausted, or the overall
    /// timeout fires.
    ///
    /// Cancellation and count exhaustion are normal completions. The overall
    /// timeout is a safety bound: it only becomes [`RunError::Timeout`] when
    /// not a single probe succeeded before it fired.
    pub async fn run(&mut self) -> Result<(), RunError> {
        self.observer.on_start(&self.stats);

        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let deadline = self
            .config
            .run_timeout
            .map(|t| tokio::time::Instant::now() + t);

        // Cloned so the cancellation future does not hold a borrow of self
        // across the tick handler
        let cancel = self.cancel.clone();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return self.finish(Exit::Cancelled);
                }
                _ = deadline_sleep(deadline) => {
                    return self.finish(Exit::DeadlineReached);
                }
                _ = interval.tick() => {
                    self.tick().await;

                    if let Some(count) = self.config.count {
                        if self.stats.total_probes() >= count {
                            return self.finish(Exit::CountReached);
                        }
                    }
                }
            }
        }
    }

    /// One scheduler tick: optional re-resolution, one probe, one fold
    async fn tick(&mut self) {
        self.maybe_retry_resolve().await;

        let addr = SocketAddr::new(self.stats.target.resolved, self.stats.target.port);
        let outcome = probe::attempt(addr, self.config.probe_timeout, self.source_ip).await;
        let now = Utc::now();

        match self.stats.fold(outcome, now) {
            Transition::CameBackUp { downtime } => {
                debug!(?downtime, "target back up");
                self.observer.on_total_downtime(&self.stats, downtime);
            }
            Transition::WentDown => debug!("target went down"),
            Transition::None => {}
        }

        if outcome.is_success() {
            self.observer.on_probe_success(&self.stats);
        } else {
            self.observer.on_probe_failure(&self.stats);
        }
    }

    /// Re-resolve the hostname once the failure streak reaches the
    /// configured threshold.
    ///
    /// The streak counter is reset on trigger so the next retry requires a
    /// fresh full run of failures. Mid-run resolution failures are reported
    /// and swallowed; they must never take down an in-progress run.
    async fn maybe_retry_resolve(&mut self) {
        let Some(threshold) = self.config.retry_resolve_after else {
            return;
        };
        if self.stats.target.is_literal() {
            return;
        }
        if self.stats.ongoing_unsuccessful_streak < threshold {
            return;
        }

        self.observer.on_retrying_resolve(&self.stats);
        self.stats.note_resolution_retry();

        let host = self.stats.target.original.clone();
        match lookup::resolve(&host, self.config.family, self.config.resolve_timeout).await {
            Ok(addr) => {
                if addr != self.stats.target.resolved {
                    debug!(%addr, "hostname now resolves to a new address");
                }
                self.stats.record_resolution(addr, Utc::now());
            }
            Err(err) => {
                warn!(%host, error = %err, "mid-run re-resolution failed");
                self.observer
                    .on_error(&format!("failed to re-resolve '{}': {}", host, err));
            }
        }
    }

    /// The one exit routine shared by all three stop conditions.
    ///
    /// Finalization happens exactly here, so no exit path can skip it or
    /// run it twice with different timestamps.
    fn finish(&mut self, exit: Exit) -> Result<(), RunError> {
        self.stats.finalize(Utc::now());

        match exit {
            Exit::Cancelled => {
                self.observer.on_shutdown(&self.stats);
                Ok(())
            }
            Exit::CountReached => {
                self.observer.on_statistics(&self.stats);
                Ok(())
            }
            Exit::DeadlineReached => {
                self.observer.on_statistics(&self.stats);
                if self.stats.total_successful == 0 {
                    Err(RunError::Timeout(
                        self.config.run_timeout.unwrap_or_default(),
                    ))
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Sleep until the overall deadline, or forever when none is configured
async fn deadline_sleep(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}
