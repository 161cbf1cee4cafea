use std::time::Duration;

use tracing::{info, warn};

use crate::lane_text::{tokenize_lane, LaneInput, LaneToken};
use crate::vehicle_kind::{TypeAlphabet, VehicleKind};
use crate::{Direction, PerDirection, SimulationEngine, SpawnRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedSpawn {
    pub direction: Direction,
    pub kind: VehicleKind,
}

impl PlannedSpawn {
    pub fn to_request(self) -> SpawnRequest {
        SpawnRequest {
            vehicle_type: self.kind.wire_name().to_string(),
            direction: self.direction,
        }
    }
}

/// Ordered spawn commands derived from the four lane inputs: lanes in
/// [`Direction::ALL`] order, codes left to right within a lane.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpawnPlan {
    spawns: Vec<PlannedSpawn>,
    skipped: usize,
}

impl SpawnPlan {
    pub fn from_lanes(lanes: &PerDirection<LaneInput>, alphabet: &TypeAlphabet) -> Self {
        let mut plan = SpawnPlan::default();
        for (direction, lane) in lanes.iter() {
            for token in tokenize_lane(lane.as_str(), alphabet) {
                match token {
                    LaneToken::Vehicle(kind) => plan.spawns.push(PlannedSpawn { direction, kind }),
                    LaneToken::Unrecognized(_) => plan.skipped += 1,
                }
            }
        }
        plan
    }

    pub fn spawns(&self) -> &[PlannedSpawn] {
        &self.spawns
    }

    pub fn len(&self) -> usize {
        self.spawns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spawns.is_empty()
    }

    /// Number of unrecognized codes left out of the plan.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl IntoIterator for SpawnPlan {
    type Item = PlannedSpawn;
    type IntoIter = std::vec::IntoIter<PlannedSpawn>;

    fn into_iter(self) -> Self::IntoIter {
        self.spawns.into_iter()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Sends a [`SpawnPlan`] to the engine one command at a time.
#[derive(Debug, Clone)]
pub struct CommandSequencer {
    delay: Duration,
}

impl CommandSequencer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Each command is awaited before the next is issued and a delivered
    /// command is followed by the configured pause. A failed command is
    /// logged and the rest of the plan still goes out.
    pub async fn dispatch<E: SimulationEngine>(&self, engine: &E, plan: SpawnPlan) -> DispatchReport {
        let mut report = DispatchReport {
            skipped: plan.skipped(),
            ..DispatchReport::default()
        };
        let total = plan.len();

        for (seq, spawn) in plan.into_iter().enumerate() {
            match engine.add_vehicle(spawn.to_request()).await {
                Ok(ack) => {
                    report.sent += 1;
                    info!(
                        target: "traffic::sequencer",
                        seq,
                        total,
                        direction = %spawn.direction,
                        vehicle_type = spawn.kind.wire_name(),
                        vehicle_id = %ack
                            .vehicle_id
                            .as_ref()
                            .map_or_else(|| "-".to_string(), ToString::to_string),
                        "spawn.sent"
                    );
                    tokio::time::sleep(self.delay).await;
                }
                Err(err) => {
                    report.failed += 1;
                    warn!(
                        target: "traffic::sequencer",
                        seq,
                        total,
                        direction = %spawn.direction,
                        vehicle_type = spawn.kind.wire_name(),
                        error = %err,
                        "spawn.failed"
                    );
                }
            }
        }

        info!(
            target: "traffic::sequencer",
            sent = report.sent,
            failed = report.failed,
            skipped = report.skipped,
            "spawn.sequence_complete"
        );
        report
    }
}

impl Default for CommandSequencer {
    fn default() -> Self {
        Self::new(Duration::from_millis(200))
    }
}
