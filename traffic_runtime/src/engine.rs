use std::future::Future;

use thiserror::Error;

use crate::{EngineSnapshot, SnapshotDecodeError, SpawnAck, SpawnRequest};

/// Failure talking to the simulation engine. Every variant is recoverable:
/// callers log it and carry on with their loop.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("engine rejected request (status {status}): {body}")]
    Rejected { status: u16, body: String },
    #[error(transparent)]
    MalformedSnapshot(#[from] SnapshotDecodeError),
}

/// Request/response surface of the simulation engine.
pub trait SimulationEngine: Send + Sync + 'static {
    /// `GET /get_state`
    fn fetch_state(&self) -> impl Future<Output = Result<EngineSnapshot, EngineError>> + Send;

    /// `POST /add_vehicle`
    fn add_vehicle(
        &self,
        request: SpawnRequest,
    ) -> impl Future<Output = Result<SpawnAck, EngineError>> + Send;
}
