use crate::control_loop::clock::{Clock, RealClock};
use crate::control_loop::shutdown::ShutdownSignal;
use crate::database::DatabaseProcess;
use crate::directory::ClusterDirectory;
use crate::reconciler::{CycleOutcome, Reconciler};
use tokio::time::Duration;

/// ControlLoop runs reconciliation cycles back to back, separated by a fixed sleep, until shut
/// down. A failed cycle is logged and the next one runs on schedule.
pub struct ControlLoop<D, B, C = RealClock>
where
    D: ClusterDirectory,
    B: DatabaseProcess,
    C: Clock,
{
    logger: slog::Logger,
    reconciler: Reconciler<D, B>,
    interval: Duration,
    clock: C,
}

impl<D, B> ControlLoop<D, B>
where
    D: ClusterDirectory,
    B: DatabaseProcess,
{
    pub fn new(logger: slog::Logger, reconciler: Reconciler<D, B>, interval: Duration) -> Self {
        Self::with_clock(logger, reconciler, interval, RealClock)
    }
}

impl<D, B, C> ControlLoop<D, B, C>
where
    D: ClusterDirectory,
    B: DatabaseProcess,
    C: Clock,
{
    pub fn with_clock(logger: slog::Logger, reconciler: Reconciler<D, B>, interval: Duration, clock: C) -> Self {
        ControlLoop {
            logger,
            reconciler,
            interval,
            clock,
        }
    }

    /// Returns only once `shutdown` completes. A cycle already in progress finishes first.
    pub async fn run(mut self, mut shutdown: ShutdownSignal) {
        slog::info!(
            self.logger,
            "Starting control loop for '{}' with {:?} between cycles",
            self.reconciler.identity().name,
            self.interval
        );

        loop {
            self.run_cycle().await;

            let interval = self.interval;
            tokio::select! {
                _ = self.clock.sleep(interval) => {}
                _ = &mut shutdown => break,
            }
        }

        slog::info!(self.logger, "Control loop stopped");
    }

    async fn run_cycle(&self) {
        match self.reconciler.run_cycle().await {
            Ok(outcome) => self.log_outcome(&outcome),
            Err(e) => slog::error!(self.logger, "Reconciliation cycle failed: {}", e; "error" => ?e),
        }
    }

    fn log_outcome(&self, outcome: &CycleOutcome) {
        match outcome {
            CycleOutcome::NoRunningReplicas => {
                slog::warn!(self.logger, "No running replicas reported by the directory");
            }
            CycleOutcome::Primary { membership, marker } => {
                slog::info!(self.logger, "Cycle complete as primary"; "membership" => ?membership, "marker" => ?marker);
            }
            other => slog::debug!(self.logger, "Cycle complete"; "outcome" => ?other),
        }
    }
}
