//! Background metrics and health-check loop

use std::sync::Weak;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use handoffcheck_utils::error::MonitorError;

use crate::monitor::ValidationMonitor;
use crate::types::{HealthReport, HealthStatus, MonitoringConfig};

/// Receives the health reports published by a running monitoring loop
#[derive(Debug, Clone)]
pub struct HealthCheckReceiver {
    rx: watch::Receiver<Option<HealthReport>>,
}

impl HealthCheckReceiver {
    /// Wait for the next health report.
    ///
    /// Returns `MonitorError::NotRunning` once the loop has stopped and no
    /// unseen report is left.
    pub async fn next(&mut self) -> Result<HealthReport, MonitorError> {
        loop {
            self.rx
                .changed()
                .await
                .map_err(|_| MonitorError::NotRunning)?;
            if let Some(report) = self.rx.borrow_and_update().clone() {
                return Ok(report);
            }
        }
    }

    /// Most recent report, if any check has run yet
    #[must_use]
    pub fn latest(&self) -> Option<HealthReport> {
        self.rx.borrow().clone()
    }
}

pub(crate) struct LoopHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl LoopHandle {
    pub(crate) fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub(crate) fn stop(self) {
        self.shutdown.send_replace(true);
    }
}

/// Spawn the loop on the current tokio runtime.
///
/// The task holds only a weak reference, so dropping the last
/// `Arc<ValidationMonitor>` ends it.
pub(crate) fn spawn(
    monitor: Weak<ValidationMonitor>,
    config: MonitoringConfig,
) -> (LoopHandle, HealthCheckReceiver) {
    let (report_tx, report_rx) = watch::channel(None);
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut metrics_tick = time::interval(config.metrics_interval);
        let mut health_tick = time::interval(config.health_check_interval);
        metrics_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        health_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // Only ever flips to true, or errors when the monitor is gone
                _ = shutdown_rx.changed() => break,
                _ = metrics_tick.tick() => {
                    let Some(monitor) = monitor.upgrade() else { break };
                    let metrics = monitor.get_metrics();
                    debug!(
                        total_validations = metrics.total_validations,
                        success_rate = metrics.success_rate,
                        correction_success_rate = metrics.correction_success_rate,
                        critical_events = metrics.critical_events,
                        "Validation metrics snapshot"
                    );
                }
                _ = health_tick.tick() => {
                    let Some(monitor) = monitor.upgrade() else { break };
                    let report = monitor.health_score();
                    if report.status == HealthStatus::Healthy {
                        debug!(score = report.score, "Health check passed");
                    } else {
                        warn!(
                            score = report.score,
                            status = %report.status,
                            unresolved_critical_events = report.unresolved_critical_events,
                            "Validation health is {}",
                            report.status
                        );
                    }
                    report_tx.send_replace(Some(report));
                }
            }
        }
        debug!("Monitoring loop stopped");
    });

    (
        LoopHandle {
            shutdown: shutdown_tx,
            task,
        },
        HealthCheckReceiver { rx: report_rx },
    )
}
