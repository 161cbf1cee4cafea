use thiserror::Error;
use tracing::{info, trace};

use crate::lane_text::LaneInput;
use crate::reconcile::{ReconcileOutcome, Reconciler, RenderState};
use crate::sequencer::SpawnPlan;
use crate::vehicle_kind::TypeAlphabet;
use crate::{Direction, EngineSnapshot, PerDirection};

/// Lifecycle of a simulation as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimulationSession {
    #[default]
    Idle,
    Running,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a simulation is already running")]
    AlreadyRunning,
    #[error("no simulation is running")]
    NotRunning,
    #[error("lane inputs are locked while the simulation runs")]
    InputLocked,
}

/// Process-wide client state: session flag, operator lane inputs and the
/// render state. Only the transitions below mutate it.
#[derive(Debug, Default)]
pub struct ClientState {
    session: SimulationSession,
    lanes: PerDirection<LaneInput>,
    render: RenderState,
    snapshots_applied: u64,
}

impl ClientState {
    pub fn session(&self) -> SimulationSession {
        self.session
    }

    pub fn is_running(&self) -> bool {
        self.session == SimulationSession::Running
    }

    pub fn lanes(&self) -> &PerDirection<LaneInput> {
        &self.lanes
    }

    pub fn lane(&self, direction: Direction) -> &LaneInput {
        self.lanes.get(direction)
    }

    pub fn render(&self) -> &RenderState {
        &self.render
    }

    pub fn snapshots_applied(&self) -> u64 {
        self.snapshots_applied
    }

    pub fn edit_lane(
        &mut self,
        direction: Direction,
        edit: impl FnOnce(&mut LaneInput),
    ) -> Result<(), SessionError> {
        if self.is_running() {
            return Err(SessionError::InputLocked);
        }
        edit(self.lanes.get_mut(direction));
        Ok(())
    }

    pub fn set_lane(
        &mut self,
        direction: Direction,
        text: impl Into<String>,
    ) -> Result<(), SessionError> {
        let text = text.into();
        self.edit_lane(direction, |lane| *lane = LaneInput::from(text))
    }

    /// `idle → running`. Clears the vehicles on screen right away and returns
    /// the spawn commands to dispatch.
    pub fn start(&mut self, alphabet: &TypeAlphabet) -> Result<SpawnPlan, SessionError> {
        if self.is_running() {
            return Err(SessionError::AlreadyRunning);
        }
        self.session = SimulationSession::Running;
        self.render.clear_vehicles();
        let plan = SpawnPlan::from_lanes(&self.lanes, alphabet);
        info!(
            target: "traffic::session",
            planned = plan.len(),
            skipped = plan.skipped(),
            "session.started"
        );
        Ok(plan)
    }

    /// `running → idle`. The render state is left as last seen.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        if !self.is_running() {
            return Err(SessionError::NotRunning);
        }
        self.session = SimulationSession::Idle;
        info!(target: "traffic::session", "session.stopped");
        Ok(())
    }

    /// Applies a snapshot when running; snapshots arriving while idle are
    /// ignored.
    pub fn apply_snapshot(
        &mut self,
        reconciler: &Reconciler,
        snapshot: &EngineSnapshot,
    ) -> Option<ReconcileOutcome> {
        if !self.is_running() {
            trace!(target: "traffic::session", "snapshot.ignored_while_idle");
            return None;
        }
        let outcome = reconciler.apply(&mut self.render, snapshot);
        self.snapshots_applied += 1;
        Some(outcome)
    }
}
