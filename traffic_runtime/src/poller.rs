use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

use crate::{EngineSnapshot, SimulationEngine};

/// Fetches full engine state on a fixed period while the session runs.
///
/// Fetches are issued one at a time, so snapshots leave the poller in the
/// order the engine produced them. A failed fetch is logged and the previous
/// render state stays on screen until the next good one.
#[derive(Debug, Clone)]
pub struct StatePoller {
    period: Duration,
}

impl StatePoller {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Runs until `running` turns false, its sender goes away, or the sink is
    /// closed. A response that lands after the session stopped is discarded.
    pub async fn run<E: SimulationEngine>(
        self,
        engine: Arc<E>,
        mut running: watch::Receiver<bool>,
        sink: UnboundedSender<EngineSnapshot>,
    ) {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if !*running.borrow_and_update() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {}
                changed = running.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            }

            let result = engine.fetch_state().await;
            if !*running.borrow() {
                trace!(target: "traffic::poller", "poll.discarded_after_stop");
                break;
            }
            match result {
                Ok(snapshot) => {
                    if sink.send(snapshot).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    warn!(target: "traffic::poller", error = %err, "poll.failed");
                }
            }
        }

        debug!(target: "traffic::poller", "poller.stopped");
    }
}

impl Default for StatePoller {
    fn default() -> Self {
        Self::new(Duration::from_millis(50))
    }
}
