use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use crate::coords::{CoordinateMapper, EnginePosition, ViewPosition};
use crate::vehicle_kind::VehicleKind;
use crate::{ActiveVehicle, Direction, EngineSnapshot, PerDirection};

/// Engine-assigned vehicle identity. Taken verbatim from snapshot keys and
/// never minted by the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(String);

impl VehicleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VehicleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Borrow<str> for VehicleId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightPhase {
    Red,
    Yellow,
    Green,
    /// Nothing reported yet, or a phase string the client does not know.
    #[default]
    Unknown,
}

impl LightPhase {
    pub fn from_wire(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "red" => LightPhase::Red,
            "yellow" | "amber" => LightPhase::Yellow,
            "green" => LightPhase::Green,
            _ => LightPhase::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LightPhase::Red => "red",
            LightPhase::Yellow => "yellow",
            LightPhase::Green => "green",
            LightPhase::Unknown => "unknown",
        }
    }
}

pub type LightState = PerDirection<LightPhase>;
pub type QueueCounts = PerDirection<usize>;

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleRecord {
    pub id: VehicleId,
    pub kind: VehicleKind,
    pub engine_position: EnginePosition,
    pub view_position: ViewPosition,
    pub stopped: bool,
    pub priority: u32,
    pub origin: Option<Direction>,
    pub destination: Option<Direction>,
}

/// Everything the display reads. Written only through [`Reconciler::apply`]
/// and [`RenderState::clear_vehicles`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderState {
    pub lights: LightState,
    pub algorithm: String,
    pub next_lane: Option<Direction>,
    pub queue_counts: QueueCounts,
    vehicles: Vec<VehicleRecord>,
    index: HashMap<VehicleId, usize>,
}

impl RenderState {
    /// Vehicles in first-seen order.
    pub fn vehicles(&self) -> &[VehicleRecord] {
        &self.vehicles
    }

    pub fn vehicle(&self, id: &str) -> Option<&VehicleRecord> {
        self.index.get(id).map(|&slot| &self.vehicles[slot])
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn clear_vehicles(&mut self) {
        self.vehicles.clear();
        self.index.clear();
    }
}

/// Identities touched by one reconciliation. An id appears in at most one list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub entered: Vec<VehicleId>,
    pub updated: Vec<VehicleId>,
    pub departed: Vec<VehicleId>,
}

impl ReconcileOutcome {
    pub fn is_quiet(&self) -> bool {
        self.entered.is_empty() && self.updated.is_empty() && self.departed.is_empty()
    }
}

/// Merges snapshots into a [`RenderState`], keyed by vehicle identity.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    mapper: CoordinateMapper,
}

impl Reconciler {
    pub fn new(mapper: CoordinateMapper) -> Self {
        Self { mapper }
    }

    /// Replaces the render state with the snapshot's view of the world.
    ///
    /// Records whose identity survives are updated in place and keep their
    /// slot, so a renderer keyed on identity animates them continuously.
    /// New identities are appended in snapshot key order; identities missing
    /// from the snapshot are dropped at once.
    pub fn apply(&self, state: &mut RenderState, snapshot: &EngineSnapshot) -> ReconcileOutcome {
        state.lights = snapshot.lights.map(|_, phase| LightPhase::from_wire(phase));
        state.algorithm.clone_from(&snapshot.algorithm);
        state.next_lane = snapshot
            .next_lane
            .as_deref()
            .and_then(|lane| lane.parse().ok());
        state.queue_counts = PerDirection::from_fn(|direction| {
            snapshot.vehicles.queued_count(direction)
        });

        let active = &snapshot.vehicles.active;
        let mut outcome = ReconcileOutcome::default();
        let mut vehicles = Vec::with_capacity(active.len());

        for mut record in std::mem::take(&mut state.vehicles) {
            match active.get(record.id.as_str()) {
                Some(wire) => {
                    let refreshed = self.record_from_wire(record.id.clone(), wire);
                    if refreshed != record {
                        record = refreshed;
                        outcome.updated.push(record.id.clone());
                    }
                    vehicles.push(record);
                }
                None => outcome.departed.push(record.id),
            }
        }

        state.index.clear();
        state.index.extend(
            vehicles
                .iter()
                .enumerate()
                .map(|(slot, record)| (record.id.clone(), slot)),
        );

        for (id, wire) in active {
            if state.index.contains_key(id.as_str()) {
                continue;
            }
            let record = self.record_from_wire(VehicleId::from(id.as_str()), wire);
            state.index.insert(record.id.clone(), vehicles.len());
            outcome.entered.push(record.id.clone());
            vehicles.push(record);
        }

        state.vehicles = vehicles;
        trace!(
            target: "traffic::reconcile",
            vehicles = state.vehicles.len(),
            entered = outcome.entered.len(),
            updated = outcome.updated.len(),
            departed = outcome.departed.len(),
            "snapshot.reconciled"
        );
        outcome
    }

    fn record_from_wire(&self, id: VehicleId, wire: &ActiveVehicle) -> VehicleRecord {
        let kind = VehicleKind::from_wire(&wire.kind);
        let engine_position = EnginePosition::from(wire.position);
        VehicleRecord {
            id,
            kind,
            engine_position,
            view_position: self.mapper.to_view(engine_position),
            stopped: wire.stopped,
            priority: wire.priority.unwrap_or_else(|| kind.default_priority()),
            origin: wire.origin.as_deref().and_then(|lane| lane.parse().ok()),
            destination: wire.destination.as_deref().and_then(|lane| lane.parse().ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_engine::snapshot;

    fn ids(state: &RenderState) -> Vec<&str> {
        state.vehicles().iter().map(|record| record.id.as_str()).collect()
    }

    #[test]
    fn surviving_identity_is_updated_in_place() {
        let reconciler = Reconciler::default();
        let mut state = RenderState::default();

        let first = reconciler.apply(&mut state, &snapshot(&[("v1", "car", 0.0, 80.0)]));
        assert_eq!(first.entered, vec![VehicleId::from("v1")]);

        let second = reconciler.apply(&mut state, &snapshot(&[("v1", "car", 0.0, 60.0)]));
        assert!(second.entered.is_empty());
        assert!(second.departed.is_empty());
        assert_eq!(second.updated, vec![VehicleId::from("v1")]);
        assert_eq!(state.vehicle_count(), 1);
        let record = state.vehicle("v1").expect("v1 kept");
        assert_eq!(record.engine_position, EnginePosition { x: 0.0, y: 60.0 });
        assert_eq!(record.view_position, ViewPosition { x: 50.0, y: 20.0 });
    }

    #[test]
    fn missing_identity_is_dropped() {
        let reconciler = Reconciler::default();
        let mut state = RenderState::default();
        reconciler.apply(
            &mut state,
            &snapshot(&[("v1", "car", 0.0, 80.0), ("v2", "bike", 80.0, 0.0)]),
        );
        let outcome = reconciler.apply(&mut state, &snapshot(&[("v2", "bike", 70.0, 0.0)]));

        assert_eq!(outcome.departed, vec![VehicleId::from("v1")]);
        assert!(state.vehicle("v1").is_none());
        assert_eq!(ids(&state), vec!["v2"]);
    }

    #[test]
    fn survivors_keep_slots_and_newcomers_append() {
        let reconciler = Reconciler::default();
        let mut state = RenderState::default();
        reconciler.apply(
            &mut state,
            &snapshot(&[("b", "car", 0.0, 80.0), ("c", "car", 0.0, 70.0)]),
        );
        reconciler.apply(
            &mut state,
            &snapshot(&[("a", "bus", -90.0, 0.0), ("c", "car", 0.0, 65.0)]),
        );
        assert_eq!(ids(&state), vec!["c", "a"]);
        assert_eq!(state.vehicle("a").map(|record| record.kind), Some(VehicleKind::Bus));
    }

    #[test]
    fn unchanged_snapshot_is_idempotent() {
        let reconciler = Reconciler::default();
        let mut state = RenderState::default();
        let snap = snapshot(&[("1", "ambulance", 10.0, -20.0), ("2", "car", 0.0, 40.0)]);
        reconciler.apply(&mut state, &snap);
        let before = state.clone();
        let outcome = reconciler.apply(&mut state, &snap);
        assert!(outcome.is_quiet());
        assert_eq!(state, before);
    }

    #[test]
    fn lights_queues_and_hints_are_derived() {
        let reconciler = Reconciler::default();
        let mut state = RenderState::default();
        let mut snap = snapshot(&[]);
        snap.lights.east = "flashing".to_string();
        snap.next_lane = Some("west".to_string());
        snap.vehicles.queued.insert(
            "south".to_string(),
            vec![serde_json::json!({"id": 4}), serde_json::json!({"id": 5})],
        );
        snap.vehicles
            .queued
            .insert("sideways".to_string(), vec![serde_json::json!({})]);

        reconciler.apply(&mut state, &snap);
        assert_eq!(state.lights.north, LightPhase::Green);
        assert_eq!(state.lights.west, LightPhase::Red);
        assert_eq!(state.lights.east, LightPhase::Unknown);
        assert_eq!(state.next_lane, Some(Direction::West));
        assert_eq!(state.algorithm, "fixed_cycle");
        assert_eq!(state.queue_counts.south, 2);
        assert_eq!(state.queue_counts.north, 0);
    }

    #[test]
    fn priority_falls_back_to_kind_default() {
        let reconciler = Reconciler::default();
        let mut state = RenderState::default();
        let mut snap = snapshot(&[("1", "police", 0.0, 0.0), ("2", "car", 0.0, 0.0)]);
        if let Some(vehicle) = snap.vehicles.active.get_mut("2") {
            vehicle.priority = Some(5);
            vehicle.origin = Some("north".to_string());
            vehicle.destination = Some("nowhere".to_string());
        }
        reconciler.apply(&mut state, &snap);

        assert_eq!(state.vehicle("1").map(|record| record.priority), Some(3));
        let car = state.vehicle("2").expect("car");
        assert_eq!(car.priority, 5);
        assert_eq!(car.origin, Some(Direction::North));
        assert_eq!(car.destination, None);
    }

    #[test]
    fn clearing_drops_every_vehicle() {
        let reconciler = Reconciler::default();
        let mut state = RenderState::default();
        reconciler.apply(&mut state, &snapshot(&[("1", "car", 0.0, 0.0)]));
        state.clear_vehicles();
        assert_eq!(state.vehicle_count(), 0);
        assert!(state.vehicle("1").is_none());

        let outcome = reconciler.apply(&mut state, &snapshot(&[("1", "car", 0.0, 0.0)]));
        assert_eq!(outcome.entered, vec![VehicleId::from("1")]);
    }
}
