use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::{
    ActiveVehicle, EngineError, EngineSnapshot, PerDirection, SimulationEngine, SpawnAck,
    SpawnRequest, SpawnedVehicleId, VehicleSets, WirePosition,
};

/// Builds a snapshot with north/south green and the given `(id, type, x, y)`
/// vehicles.
pub(crate) fn snapshot(vehicles: &[(&str, &str, f64, f64)]) -> EngineSnapshot {
    let active: BTreeMap<String, ActiveVehicle> = vehicles
        .iter()
        .map(|(id, kind, x, y)| {
            (
                id.to_string(),
                ActiveVehicle {
                    kind: kind.to_string(),
                    position: WirePosition { x: *x, y: *y },
                    stopped: false,
                    priority: None,
                    origin: None,
                    destination: None,
                },
            )
        })
        .collect();
    EngineSnapshot {
        lights: PerDirection {
            north: "green".to_string(),
            south: "green".to_string(),
            east: "red".to_string(),
            west: "red".to_string(),
        },
        algorithm: "fixed_cycle".to_string(),
        next_lane: None,
        vehicles: VehicleSets {
            active,
            queued: BTreeMap::new(),
        },
    }
}

#[derive(Default)]
pub(crate) struct FakeEngine {
    pub sent: Mutex<Vec<(SpawnRequest, Instant)>>,
    pub reject_type: Option<&'static str>,
    pub fetches: AtomicUsize,
    latency: Duration,
    script: Mutex<VecDeque<Option<EngineSnapshot>>>,
    last: Mutex<Option<EngineSnapshot>>,
}

impl FakeEngine {
    pub fn rejecting(vehicle_type: &'static str) -> Self {
        Self {
            reject_type: Some(vehicle_type),
            ..Self::default()
        }
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    /// Queues a fetch result; `None` scripts a transport failure. Once the
    /// script runs dry the last good snapshot is served again.
    pub fn script(&self, step: Option<EngineSnapshot>) {
        self.script.lock().push_back(step);
    }

    pub fn sent_types(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .iter()
            .map(|(request, _)| {
                (
                    request.direction.to_string(),
                    request.vehicle_type.clone(),
                )
            })
            .collect()
    }
}

impl SimulationEngine for FakeEngine {
    async fn fetch_state(&self) -> Result<EngineSnapshot, EngineError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let step = self.script.lock().pop_front();
        match step {
            Some(Some(snapshot)) => {
                *self.last.lock() = Some(snapshot.clone());
                Ok(snapshot)
            }
            Some(None) => Err(EngineError::Transport("scripted outage".to_string())),
            None => self
                .last
                .lock()
                .clone()
                .ok_or_else(|| EngineError::Transport("no state yet".to_string())),
        }
    }

    async fn add_vehicle(&self, request: SpawnRequest) -> Result<SpawnAck, EngineError> {
        if self.reject_type == Some(request.vehicle_type.as_str()) {
            return Err(EngineError::Rejected {
                status: 400,
                body: "unsupported vehicle".to_string(),
            });
        }
        let mut sent = self.sent.lock();
        sent.push((request, Instant::now()));
        Ok(SpawnAck {
            success: Some(true),
            vehicle_id: Some(SpawnedVehicleId::Number(sent.len() as u64)),
        })
    }
}
