//! Client-side synchronization core for the intersection viewer.
//!
//! This crate re-exports the wire contract from `traffic_schema` and layers the
//! pieces that keep a display in step with an external simulation engine:
//! coordinate mapping, lane input parsing, the serial spawn-command sequencer,
//! the state poller, snapshot reconciliation and render projection. Transport
//! is abstracted behind [`SimulationEngine`].

pub use traffic_schema::*;

pub mod client_config;
mod coords;
mod driver;
mod engine;
mod lane_text;
mod poller;
mod projection;
mod reconcile;
mod sequencer;
mod session;
#[cfg(test)]
mod test_engine;
mod vehicle_kind;

pub use client_config::{
    load_client_config_from_env, ClientConfig, ClientConfigError, ClientConfigMetadata,
};
pub use coords::{CoordinateMapper, EnginePosition, ViewPosition, VIEW_CENTER};
pub use driver::SimulationDriver;
pub use engine::{EngineError, SimulationEngine};
pub use lane_text::{parse_lane_codes, tokenize_lane, LaneInput, LaneToken};
pub use poller::StatePoller;
pub use projection::{DisplayAttributes, Emphasis, RenderProjector};
pub use reconcile::{
    LightPhase, LightState, QueueCounts, ReconcileOutcome, Reconciler, RenderState, VehicleId,
    VehicleRecord,
};
pub use sequencer::{CommandSequencer, DispatchReport, PlannedSpawn, SpawnPlan};
pub use session::{ClientState, SessionError, SimulationSession};
pub use vehicle_kind::{AlphabetPreset, TypeAlphabet, UnknownAlphabet, VehicleKind};
