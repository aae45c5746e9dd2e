//! Abandonment sweeper.
//!
//! In-progress records idle for longer than the configured threshold are
//! marked abandoned. Each record is abandoned with a guarded update that only
//! matches the exact activity value the sweep read, so a visitor acting
//! between the read and the write keeps their record open. Sweeping twice
//! over the same state changes nothing the second time.

use std::future::Future;

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use tokio::{task, time};

use crate::{
    db::Database,
    error::{Result, TrackerError},
    tracker::Tracker,
};

/// Counts from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Open records examined
    pub scanned: u64,
    pub abandoned: u64,
    /// Stale records that saw activity before they could be abandoned
    pub skipped: u64,
    /// Records that could not be read or updated
    pub failed: u64,
}

/// Marks idle progress records abandoned, once or periodically.
#[derive(Debug, Clone)]
pub struct Sweeper {
    tracker: Tracker,
}

impl Sweeper {
    pub fn new(tracker: Tracker) -> Self {
        Self { tracker }
    }

    /// Runs one sweep with the tracker's clock and threshold.
    ///
    /// A failure on one record is logged and counted; the sweep carries on
    /// with the rest.
    pub async fn sweep_once(&self) -> Result<SweepReport> {
        let now = self.tracker.now();
        let threshold = self.tracker.settings().inactivity_threshold();
        let db_path = self.tracker.database_path().to_path_buf();

        let report = task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            sweep(&mut db, now, threshold)
        })
        .await
        .map_err(|e| TrackerError::Configuration {
            message: format!("Task join error: {e}"),
        })??;

        if report.abandoned > 0 || report.failed > 0 {
            log::info!(
                "Sweep abandoned {} of {} open records ({} skipped, {} failed)",
                report.abandoned,
                report.scanned,
                report.skipped,
                report.failed
            );
        } else {
            log::debug!("Sweep found nothing to abandon among {} records", report.scanned);
        }
        Ok(report)
    }

    /// Sweeps on every tick of the configured interval until `shutdown`
    /// resolves. A failed sweep is logged and retried on the next tick.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut interval = time::interval(self.tracker.settings().sweep_interval());
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        log::info!(
            "Sweeper running every {}s with a {}h inactivity threshold",
            self.tracker.settings().sweep_interval_secs,
            self.tracker.settings().inactivity_threshold_hours
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    log::info!("Sweeper stopped");
                    return Ok(());
                }
                _ = interval.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        log::warn!("Sweep failed: {e}");
                    }
                }
            }
        }
    }
}

fn sweep(db: &mut Database, now: Timestamp, threshold: SignedDuration) -> Result<SweepReport> {
    let open = db.open_activity()?;
    let mut report = SweepReport {
        scanned: open.len() as u64,
        ..SweepReport::default()
    };

    for (progress_id, raw_activity) in open {
        let last_activity = match raw_activity.parse::<Timestamp>() {
            Ok(ts) => ts,
            Err(e) => {
                log::warn!("Progress {progress_id} has unreadable activity '{raw_activity}': {e}");
                report.failed += 1;
                continue;
            }
        };
        if now.duration_since(last_activity) <= threshold {
            continue;
        }

        match db.abandon_if_idle(progress_id, &raw_activity) {
            Ok(true) => {
                log::debug!("Abandoned progress {progress_id}");
                report.abandoned += 1;
            }
            Ok(false) => report.skipped += 1,
            Err(e) => {
                log::warn!("Failed to abandon progress {progress_id}: {e}");
                report.failed += 1;
            }
        }
    }
    Ok(report)
}
