use std::{
    collections::BTreeMap,
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;

use crate::coords::CoordinateMapper;
use crate::vehicle_kind::{AlphabetPreset, TypeAlphabet, VehicleKind};

pub const BUILTIN_CLIENT_CONFIG: &str = include_str!("data/client_config.json");
pub const CLIENT_CONFIG_PATH_ENV: &str = "TRAFFIC_CLIENT_CONFIG_PATH";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    engine: EngineConfig,
    polling: PollingConfig,
    dispatch: DispatchConfig,
    view: ViewConfig,
    vehicles: VehicleCodesConfig,
    projection: ProjectionConfig,
}

impl ClientConfig {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            serde_json::from_str(BUILTIN_CLIENT_CONFIG)
                .expect("builtin client config should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, ClientConfigError> {
        let config: ClientConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ClientConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ClientConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ClientConfig::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ClientConfigError> {
        if self.polling.period_ms == 0 {
            return Err(ClientConfigError::Invalid(
                "polling.period_ms must be positive".to_string(),
            ));
        }
        if !self.view.scale_divisor.is_finite() || self.view.scale_divisor <= 0.0 {
            return Err(ClientConfigError::Invalid(format!(
                "view.scale_divisor must be a positive number, got {}",
                self.view.scale_divisor
            )));
        }
        if let Some(codes) = &self.vehicles.type_codes {
            if codes.is_empty() {
                return Err(ClientConfigError::Invalid(
                    "vehicles.type_codes must not be empty".to_string(),
                ));
            }
            for (code, kind) in codes {
                if code.chars().count() != 1 {
                    return Err(ClientConfigError::Invalid(format!(
                        "vehicles.type_codes key '{code}' must be a single character"
                    )));
                }
                if *kind == VehicleKind::Unknown {
                    return Err(ClientConfigError::Invalid(format!(
                        "vehicles.type_codes '{code}' maps to unknown"
                    )));
                }
            }
        }
        if self.engine.base_url.trim().is_empty() {
            return Err(ClientConfigError::Invalid(
                "engine.base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    pub fn polling(&self) -> &PollingConfig {
        &self.polling
    }

    pub fn dispatch(&self) -> &DispatchConfig {
        &self.dispatch
    }

    pub fn view(&self) -> &ViewConfig {
        &self.view
    }

    pub fn vehicles(&self) -> &VehicleCodesConfig {
        &self.vehicles
    }

    pub fn projection(&self) -> &ProjectionConfig {
        &self.projection
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.engine.base_url = base_url.into();
    }

    pub fn set_scale_divisor(&mut self, scale_divisor: f64) {
        self.view.scale_divisor = scale_divisor;
    }

    /// Selects a preset and drops any custom code table.
    pub fn set_alphabet(&mut self, preset: AlphabetPreset) {
        self.vehicles.alphabet = preset;
        self.vehicles.type_codes = None;
    }
}

#[derive(Debug, Error)]
pub enum ClientConfigError {
    #[error("failed to parse client config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read client config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid client config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    base_url: String,
    request_timeout_ms: u64,
}

impl EngineConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            request_timeout_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    period_ms: u64,
}

impl PollingConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms.max(1))
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { period_ms: 50 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    inter_command_delay_ms: u64,
}

impl DispatchConfig {
    pub fn inter_command_delay(&self) -> Duration {
        Duration::from_millis(self.inter_command_delay_ms)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            inter_command_delay_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    scale_divisor: f64,
}

impl ViewConfig {
    pub fn scale_divisor(&self) -> f64 {
        self.scale_divisor
    }

    pub fn mapper(&self) -> CoordinateMapper {
        CoordinateMapper::new(self.scale_divisor)
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self { scale_divisor: 2.0 }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VehicleCodesConfig {
    alphabet: AlphabetPreset,
    type_codes: Option<BTreeMap<String, VehicleKind>>,
}

impl VehicleCodesConfig {
    pub fn preset(&self) -> AlphabetPreset {
        self.alphabet
    }

    /// Custom `type_codes` win over the preset when present.
    pub fn alphabet(&self) -> TypeAlphabet {
        match &self.type_codes {
            Some(codes) => TypeAlphabet::from_pairs(codes.iter().filter_map(|(code, kind)| {
                let mut chars = code.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Some((ch, *kind)),
                    _ => None,
                }
            })),
            None => TypeAlphabet::from_preset(self.alphabet),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    elevated_priority: u32,
    base_layer: u8,
    elevated_layer: u8,
    heavy_scale: f32,
}

impl ProjectionConfig {
    pub fn elevated_priority(&self) -> u32 {
        self.elevated_priority
    }

    pub fn base_layer(&self) -> u8 {
        self.base_layer
    }

    pub fn elevated_layer(&self) -> u8 {
        self.elevated_layer.max(self.base_layer)
    }

    pub fn heavy_scale(&self) -> f32 {
        self.heavy_scale.max(f32::EPSILON)
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            elevated_priority: 3,
            base_layer: 15,
            elevated_layer: 20,
            heavy_scale: 1.4,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientConfigMetadata {
    path: Option<PathBuf>,
}

impl ClientConfigMetadata {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

/// Loads from `explicit`, else from `TRAFFIC_CLIENT_CONFIG_PATH`, else the
/// builtin copy. A file that fails to load is logged and skipped.
pub fn load_client_config_from_env(
    explicit: Option<&Path>,
) -> (Arc<ClientConfig>, ClientConfigMetadata) {
    let candidate = explicit
        .map(Path::to_path_buf)
        .or_else(|| env::var(CLIENT_CONFIG_PATH_ENV).ok().map(PathBuf::from));

    if let Some(path) = candidate {
        match ClientConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!(
                    target: "traffic::config",
                    path = %path.display(),
                    "client_config.loaded=file"
                );
                return (Arc::new(config), ClientConfigMetadata::new(Some(path)));
            }
            Err(err) => {
                tracing::warn!(
                    target: "traffic::config",
                    path = %path.display(),
                    error = %err,
                    "client_config.load_failed"
                );
            }
        }
    }

    let config = ClientConfig::builtin();
    tracing::info!(target: "traffic::config", "client_config.loaded=builtin");
    (config, ClientConfigMetadata::new(None))
}
