//! Background duplicate scanner.
//!
//! A periodic worker that sweeps every owner's recent transactions through
//! the duplicate predicate and links the cross-source pairs it finds. One
//! pass per owner per cycle; a failing owner never blocks the others.
//!
//! Shutdown is a watch channel; the scanner finishes the owner it is on and
//! exits between owners or during sleep.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{Engine, NotificationKind};

/// Scanner tuning. The defaults are the production values: one pass a day
/// over the last 30 days of transactions.
#[derive(Clone, Debug)]
pub struct ScannerConfig {
    pub interval: Duration,
    pub window_days: i64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(24 * 60 * 60),
            window_days: 30,
        }
    }
}

pub struct DuplicateScanner {
    engine: Arc<Engine>,
    config: ScannerConfig,
    shutdown: watch::Receiver<bool>,
}

impl DuplicateScanner {
    pub fn new(engine: Arc<Engine>, config: ScannerConfig, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            engine,
            config,
            shutdown,
        }
    }

    /// Run until the shutdown channel flips to true.
    pub async fn run(mut self) {
        info!(
            interval = ?self.config.interval,
            window_days = self.config.window_days,
            "duplicate scanner starting"
        );

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            self.scan_all_owners().await;

            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("duplicate scanner stopped");
    }

    /// One pass over every owner. Per-owner error boundary: a failure is
    /// logged and the pass moves on.
    async fn scan_all_owners(&mut self) {
        let owners = match self.engine.list_usernames().await {
            Ok(owners) => owners,
            Err(err) => {
                warn!("duplicate scan skipped, cannot list owners: {err}");
                return;
            }
        };

        for owner in owners {
            if *self.shutdown.borrow() {
                return;
            }
            match self
                .engine
                .scan_owner_for_duplicates(&owner, self.config.window_days)
                .await
            {
                Ok(0) => debug!(user = %owner, "duplicate scan found nothing new"),
                Ok(new_links) => {
                    info!(user = %owner, new_links, "duplicate scan flagged new pairs");
                    self.engine
                        .notify(
                            &owner,
                            NotificationKind::DuplicateDetected,
                            "Possible duplicates found",
                            format!("{new_links} possible duplicate pair(s) await review"),
                        )
                        .await;
                }
                Err(err) => warn!(user = %owner, "duplicate scan failed: {err}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_daily_over_a_month() {
        let config = ScannerConfig::default();
        assert_eq!(config.interval, Duration::from_secs(86_400));
        assert_eq!(config.window_days, 30);
    }
}
