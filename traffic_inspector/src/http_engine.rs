use std::time::Duration;

use reqwest::{Client, Response};
use traffic_runtime::{EngineError, EngineSnapshot, SimulationEngine, SpawnAck, SpawnRequest};

const STATE_PATH: &str = "/get_state";
const SPAWN_PATH: &str = "/add_vehicle";

/// [`SimulationEngine`] over the engine's JSON HTTP API.
#[derive(Debug, Clone)]
pub struct HttpEngine {
    client: Client,
    base_url: String,
}

impl HttpEngine {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn transport(err: reqwest::Error) -> EngineError {
    EngineError::Transport(err.to_string())
}

fn classify(status: u16, body: String) -> Result<String, EngineError> {
    if (200..300).contains(&status) {
        Ok(body)
    } else {
        Err(EngineError::Rejected { status, body })
    }
}

async fn read_body(response: Response) -> Result<(u16, String), EngineError> {
    let status = response.status().as_u16();
    let body = response.text().await.map_err(transport)?;
    Ok((status, body))
}

fn snapshot_result(status: u16, body: String) -> Result<EngineSnapshot, EngineError> {
    let body = classify(status, body)?;
    Ok(EngineSnapshot::from_json_str(&body)?)
}

/// A 2xx answer can still carry `"success": false`.
fn spawn_result(status: u16, body: String) -> Result<SpawnAck, EngineError> {
    let body = classify(status, body)?;
    let ack = SpawnAck::from_body(&body);
    if ack.is_rejection() {
        return Err(EngineError::Rejected { status, body });
    }
    Ok(ack)
}

impl SimulationEngine for HttpEngine {
    async fn fetch_state(&self) -> Result<EngineSnapshot, EngineError> {
        let response = self
            .client
            .get(self.url(STATE_PATH))
            .send()
            .await
            .map_err(transport)?;
        let (status, body) = read_body(response).await?;
        snapshot_result(status, body)
    }

    async fn add_vehicle(&self, request: SpawnRequest) -> Result<SpawnAck, EngineError> {
        let response = self
            .client
            .post(self.url(SPAWN_PATH))
            .json(&request)
            .send()
            .await
            .map_err(transport)?;
        let (status, body) = read_body(response).await?;
        spawn_result(status, body)
    }
}
