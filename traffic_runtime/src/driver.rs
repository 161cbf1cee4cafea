use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::client_config::ClientConfig;
use crate::poller::StatePoller;
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::sequencer::{CommandSequencer, DispatchReport};
use crate::session::{ClientState, SessionError};
use crate::vehicle_kind::TypeAlphabet;
use crate::{EngineSnapshot, SimulationEngine};

/// Wires the sequencer and poller tasks to one engine and funnels every
/// snapshot through a channel so a single consumer applies them, in receipt
/// order, to the [`ClientState`].
pub struct SimulationDriver<E: SimulationEngine> {
    engine: Arc<E>,
    runtime: Handle,
    alphabet: TypeAlphabet,
    sequencer: CommandSequencer,
    poller: StatePoller,
    reconciler: Reconciler,
    running_tx: watch::Sender<bool>,
    snapshot_tx: UnboundedSender<EngineSnapshot>,
    snapshot_rx: UnboundedReceiver<EngineSnapshot>,
    poll_task: Option<JoinHandle<()>>,
    dispatch_task: Option<JoinHandle<DispatchReport>>,
}

impl<E: SimulationEngine> SimulationDriver<E> {
    pub fn new(engine: Arc<E>, config: &ClientConfig, runtime: Handle) -> Self {
        let (running_tx, _) = watch::channel(false);
        let (snapshot_tx, snapshot_rx) = unbounded_channel();
        Self {
            engine,
            runtime,
            alphabet: config.vehicles().alphabet(),
            sequencer: CommandSequencer::new(config.dispatch().inter_command_delay()),
            poller: StatePoller::new(config.polling().period()),
            reconciler: Reconciler::new(config.view().mapper()),
            running_tx,
            snapshot_tx,
            snapshot_rx,
            poll_task: None,
            dispatch_task: None,
        }
    }

    pub fn alphabet(&self) -> &TypeAlphabet {
        &self.alphabet
    }

    /// Starts a simulation: flips the session to running, launches the spawn
    /// sequence and begins polling. Returns the number of commands queued.
    ///
    /// A dispatch loop from an earlier start keeps running to completion.
    pub fn start(&mut self, state: &mut ClientState) -> Result<usize, SessionError> {
        let plan = state.start(&self.alphabet)?;
        let planned = plan.len();

        // abort the old poller before the flag flips back on
        if let Some(previous) = self.poll_task.take() {
            previous.abort();
        }
        while self.snapshot_rx.try_recv().is_ok() {}
        self.running_tx.send_replace(true);

        let poll = self.poller.clone().run(
            Arc::clone(&self.engine),
            self.running_tx.subscribe(),
            self.snapshot_tx.clone(),
        );
        self.poll_task = Some(self.runtime.spawn(poll));

        let engine = Arc::clone(&self.engine);
        let sequencer = self.sequencer.clone();
        let dispatch = self
            .runtime
            .spawn(async move { sequencer.dispatch(engine.as_ref(), plan).await });
        if self.dispatch_task.replace(dispatch).is_some() {
            debug!(target: "traffic::driver", "dispatch.previous_detached");
        }

        Ok(planned)
    }

    /// Stops polling. In-flight spawn commands are not cancelled.
    pub fn stop(&mut self, state: &mut ClientState) -> Result<(), SessionError> {
        state.stop()?;
        self.running_tx.send_replace(false);
        Ok(())
    }

    /// Applies every snapshot received so far. Returns how many were applied.
    pub fn pump(&mut self, state: &mut ClientState) -> usize {
        let mut applied = 0;
        while let Ok(snapshot) = self.snapshot_rx.try_recv() {
            if state.apply_snapshot(&self.reconciler, &snapshot).is_some() {
                applied += 1;
            }
        }
        applied
    }

    /// Waits for the next snapshot and applies it. `None` once the session is
    /// no longer running.
    pub async fn next_snapshot(&mut self, state: &mut ClientState) -> Option<ReconcileOutcome> {
        if !state.is_running() {
            return None;
        }
        let snapshot = self.snapshot_rx.recv().await?;
        state.apply_snapshot(&self.reconciler, &snapshot)
    }

    /// Waits for the current spawn sequence and returns its report.
    pub async fn join_dispatch(&mut self) -> Option<DispatchReport> {
        let task = self.dispatch_task.take()?;
        match task.await {
            Ok(report) => Some(report),
            Err(err) => {
                warn!(target: "traffic::driver", error = %err, "dispatch.join_failed");
                None
            }
        }
    }
}

impl<E: SimulationEngine> Drop for SimulationDriver<E> {
    fn drop(&mut self) {
        self.running_tx.send_replace(false);
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
    }
}
