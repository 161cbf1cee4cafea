//! Wire contract between the intersection client and the simulation engine.
//!
//! Mirrors the JSON documents served by `GET /get_state` and accepted by
//! `POST /add_vehicle`. Fields the client needs are required; everything else
//! decodes leniently so a newer engine can add data without breaking polling.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the four approach lanes of the intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Lane order used whenever lanes are walked, including command dispatch.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::East,
            Direction::East => Direction::West,
            Direction::West => Direction::North,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Direction::North => Direction::West,
            Direction::South => Direction::North,
            Direction::East => Direction::South,
            Direction::West => Direction::East,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown direction '{0}'")]
pub struct UnknownDirection(pub String);

impl FromStr for Direction {
    type Err = UnknownDirection;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "north" | "n" => Ok(Direction::North),
            "south" | "s" => Ok(Direction::South),
            "east" | "e" => Ok(Direction::East),
            "west" | "w" => Ok(Direction::West),
            _ => Err(UnknownDirection(value.to_string())),
        }
    }
}

/// A value for each lane.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerDirection<T> {
    pub north: T,
    pub south: T,
    pub east: T,
    pub west: T,
}

impl<T> PerDirection<T> {
    pub fn from_fn(mut f: impl FnMut(Direction) -> T) -> Self {
        Self {
            north: f(Direction::North),
            south: f(Direction::South),
            east: f(Direction::East),
            west: f(Direction::West),
        }
    }

    pub fn get(&self, direction: Direction) -> &T {
        match direction {
            Direction::North => &self.north,
            Direction::South => &self.south,
            Direction::East => &self.east,
            Direction::West => &self.west,
        }
    }

    pub fn get_mut(&mut self, direction: Direction) -> &mut T {
        match direction {
            Direction::North => &mut self.north,
            Direction::South => &mut self.south,
            Direction::East => &mut self.east,
            Direction::West => &mut self.west,
        }
    }

    /// Iterates lanes in [`Direction::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Direction, &T)> + '_ {
        Direction::ALL
            .into_iter()
            .map(move |direction| (direction, self.get(direction)))
    }

    pub fn map<U>(&self, mut f: impl FnMut(Direction, &T) -> U) -> PerDirection<U> {
        PerDirection::from_fn(|direction| f(direction, self.get(direction)))
    }
}

/// Engine-space coordinates as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WirePosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveVehicle {
    #[serde(rename = "type")]
    pub kind: String,
    pub position: WirePosition,
    #[serde(default)]
    pub stopped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VehicleSets {
    /// Vehicles in motion, keyed by engine-assigned identity.
    pub active: BTreeMap<String, ActiveVehicle>,
    /// Vehicles waiting to enter, per lane. Only the list lengths are used,
    /// so entries are kept as raw JSON.
    #[serde(default)]
    pub queued: BTreeMap<String, Vec<serde_json::Value>>,
}

impl VehicleSets {
    pub fn queued_count(&self, direction: Direction) -> usize {
        self.queued
            .get(direction.as_str())
            .map(Vec::len)
            .unwrap_or(0)
    }
}

/// One full `GET /get_state` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub lights: PerDirection<String>,
    #[serde(default)]
    pub algorithm: String,
    #[serde(default)]
    pub next_lane: Option<String>,
    pub vehicles: VehicleSets,
}

#[derive(Debug, Error)]
pub enum SnapshotDecodeError {
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl EngineSnapshot {
    pub fn from_json_str(json: &str) -> Result<Self, SnapshotDecodeError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Body of `POST /add_vehicle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRequest {
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub direction: Direction,
}

/// Engine-assigned id echoed in a spawn acknowledgement. Engines have sent
/// both numbers and strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpawnedVehicleId {
    Number(u64),
    Text(String),
}

impl fmt::Display for SpawnedVehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpawnedVehicleId::Number(id) => write!(f, "{id}"),
            SpawnedVehicleId::Text(id) => f.write_str(id),
        }
    }
}

/// Acknowledgement returned by `POST /add_vehicle`. The engine is not bound to
/// send one, so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnAck {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub vehicle_id: Option<SpawnedVehicleId>,
}

impl SpawnAck {
    /// Decodes an acknowledgement body field by field, so a malformed
    /// `vehicle_id` never hides `success`. A body that is not JSON yields an
    /// empty acknowledgement.
    pub fn from_body(body: &str) -> Self {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
            return SpawnAck::default();
        };
        SpawnAck {
            success: value.get("success").and_then(serde_json::Value::as_bool),
            vehicle_id: value
                .get("vehicle_id")
                .and_then(|id| SpawnedVehicleId::deserialize(id).ok()),
        }
    }

    pub fn is_rejection(&self) -> bool {
        self.success == Some(false)
    }
}
