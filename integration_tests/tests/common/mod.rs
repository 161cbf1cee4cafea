#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use parking_lot::Mutex;
use serde_json::json;
use tokio::runtime::Handle;
use tokio::time::Instant;
use traffic_runtime::{
    ActiveVehicle, ClientConfig, ClientState, Direction, EngineError, EngineSnapshot,
    PerDirection, ReconcileOutcome, SimulationDriver, SimulationEngine, SpawnAck, SpawnRequest,
    SpawnedVehicleId, VehicleSets, WirePosition,
};

/// Engine units a vehicle covers per fetch.
pub const STEP: f64 = 10.0;
/// Distance from the center at which spawned vehicles appear.
pub const SPAWN_DISTANCE: f64 = 100.0;

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn fast_config() -> ClientConfig {
    ClientConfig::from_file(&fixture_path("fast_client_config.json"))
        .expect("fixture config loads")
}

#[derive(Debug, Clone)]
pub struct SentCommand {
    pub direction: Direction,
    pub vehicle_type: String,
    pub at: Instant,
}

struct Lane {
    queued: VecDeque<(u64, String)>,
}

struct World {
    next_id: u64,
    lanes: PerDirection<Lane>,
    active: BTreeMap<String, ActiveVehicle>,
    outages: usize,
    fetches: usize,
}

/// In-memory engine: accepted vehicles wait one fetch in their lane queue,
/// then enter at the lane edge and advance toward the center each fetch,
/// departing once they reach it.
pub struct ScriptedEngine {
    world: Mutex<World>,
    sent: Mutex<Vec<SentCommand>>,
    rejected_types: Vec<&'static str>,
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::rejecting(&[])
    }
}

impl ScriptedEngine {
    pub fn rejecting(types: &[&'static str]) -> Self {
        Self {
            world: Mutex::new(World {
                next_id: 1,
                lanes: PerDirection::from_fn(|_| Lane {
                    queued: VecDeque::new(),
                }),
                active: BTreeMap::new(),
                outages: 0,
                fetches: 0,
            }),
            sent: Mutex::new(Vec::new()),
            rejected_types: types.to_vec(),
        }
    }

    /// The next `count` fetches fail at the transport level.
    pub fn fail_next_fetches(&self, count: usize) {
        self.world.lock().outages += count;
    }

    pub fn sent(&self) -> Vec<SentCommand> {
        self.sent.lock().clone()
    }

    pub fn sent_pairs(&self) -> Vec<(Direction, String)> {
        self.sent
            .lock()
            .iter()
            .map(|command| (command.direction, command.vehicle_type.clone()))
            .collect()
    }

    pub fn fetches(&self) -> usize {
        self.world.lock().fetches
    }

    fn entry_point(direction: Direction) -> WirePosition {
        match direction {
            Direction::North => WirePosition { x: 0.0, y: SPAWN_DISTANCE },
            Direction::South => WirePosition { x: 0.0, y: -SPAWN_DISTANCE },
            Direction::East => WirePosition { x: SPAWN_DISTANCE, y: 0.0 },
            Direction::West => WirePosition { x: -SPAWN_DISTANCE, y: 0.0 },
        }
    }
}

fn toward_center(value: f64) -> f64 {
    if value > 0.0 {
        (value - STEP).max(0.0)
    } else {
        (value + STEP).min(0.0)
    }
}

impl World {
    fn advance(&mut self) {
        for vehicle in self.active.values_mut() {
            vehicle.position.x = toward_center(vehicle.position.x);
            vehicle.position.y = toward_center(vehicle.position.y);
        }
        self.active
            .retain(|_, vehicle| vehicle.position.x != 0.0 || vehicle.position.y != 0.0);

        for direction in Direction::ALL {
            let lane = self.lanes.get_mut(direction);
            while let Some((id, kind)) = lane.queued.pop_front() {
                let priority = match kind.as_str() {
                    "ambulance" | "fire" | "police" => Some(3),
                    _ => None,
                };
                self.active.insert(
                    id.to_string(),
                    ActiveVehicle {
                        kind,
                        position: ScriptedEngine::entry_point(direction),
                        stopped: false,
                        priority,
                        origin: Some(direction.as_str().to_string()),
                        destination: Some(direction.next().as_str().to_string()),
                    },
                );
            }
        }
    }

    fn snapshot(&self) -> EngineSnapshot {
        let phase = if self.fetches % 2 == 0 { "green" } else { "red" };
        let other = if self.fetches % 2 == 0 { "red" } else { "green" };
        let queued = Direction::ALL
            .into_iter()
            .map(|direction| {
                let entries = self
                    .lanes
                    .get(direction)
                    .queued
                    .iter()
                    .map(|(id, kind)| json!({ "id": id, "type": kind }))
                    .collect();
                (direction.as_str().to_string(), entries)
            })
            .collect();
        EngineSnapshot {
            lights: PerDirection {
                north: phase.to_string(),
                south: phase.to_string(),
                east: other.to_string(),
                west: other.to_string(),
            },
            algorithm: "fixed_cycle".to_string(),
            next_lane: None,
            vehicles: VehicleSets {
                active: self.active.clone(),
                queued,
            },
        }
    }
}

impl SimulationEngine for ScriptedEngine {
    async fn fetch_state(&self) -> Result<EngineSnapshot, EngineError> {
        let mut world = self.world.lock();
        world.fetches += 1;
        if world.outages > 0 {
            world.outages -= 1;
            return Err(EngineError::Transport("connection refused".to_string()));
        }
        world.advance();
        Ok(world.snapshot())
    }

    async fn add_vehicle(&self, request: SpawnRequest) -> Result<SpawnAck, EngineError> {
        self.sent.lock().push(SentCommand {
            direction: request.direction,
            vehicle_type: request.vehicle_type.clone(),
            at: Instant::now(),
        });
        if self.rejected_types.contains(&request.vehicle_type.as_str()) {
            return Err(EngineError::Rejected {
                status: 400,
                body: format!("unsupported vehicle type {}", request.vehicle_type),
            });
        }
        let mut world = self.world.lock();
        let id = world.next_id;
        world.next_id += 1;
        world
            .lanes
            .get_mut(request.direction)
            .queued
            .push_back((id, request.vehicle_type));
        Ok(SpawnAck {
            success: Some(true),
            vehicle_id: Some(SpawnedVehicleId::Number(id)),
        })
    }
}

pub fn driver(engine: &Arc<ScriptedEngine>) -> SimulationDriver<ScriptedEngine> {
    SimulationDriver::new(Arc::clone(engine), &fast_config(), Handle::current())
}

/// Waits for the next snapshot the driver applies.
pub async fn next_applied<E: SimulationEngine>(
    driver: &mut SimulationDriver<E>,
    state: &mut ClientState,
) -> anyhow::Result<ReconcileOutcome> {
    tokio::time::timeout(Duration::from_secs(5), driver.next_snapshot(state))
        .await?
        .ok_or_else(|| anyhow!("session is not running"))
}
