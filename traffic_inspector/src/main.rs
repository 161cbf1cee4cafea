use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::info;
use traffic_runtime::{
    load_client_config_from_env, AlphabetPreset, ClientConfig, ClientState, Direction,
    RenderProjector, SimulationDriver,
};

mod app;
mod headless;
mod http_engine;
mod motion;
mod ui;

use app::InspectorApp;
use http_engine::HttpEngine;

#[derive(Clone)]
struct ChannelWriter {
    sender: Sender<String>,
}

impl std::io::Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(text) = String::from_utf8(buf.to_vec()) {
            let _ = self.sender.send(text);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Traffic intersection inspector", long_about = None)]
struct Cli {
    /// Base URL of the simulation engine. Overrides the config file.
    #[arg(long)]
    endpoint: Option<String>,
    /// Client config JSON. Falls back to TRAFFIC_CLIENT_CONFIG_PATH, then the builtin copy.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Vehicle type-code alphabet: classic or extended.
    #[arg(long)]
    alphabet: Option<AlphabetPreset>,
    /// Engine units per view unit.
    #[arg(long)]
    scale_divisor: Option<f64>,
    /// Run without the terminal UI, logging reconciled state to stdout.
    #[arg(long)]
    headless: bool,
    /// Type codes for the north lane, e.g. "c,b,a".
    #[arg(long, default_value = "")]
    north: String,
    #[arg(long, default_value = "")]
    south: String,
    #[arg(long, default_value = "")]
    east: String,
    #[arg(long, default_value = "")]
    west: String,
    /// How long a headless run polls before stopping.
    #[arg(long, default_value_t = 10)]
    duration_secs: u64,
}

impl Cli {
    fn lanes(&self) -> [(Direction, &str); 4] {
        [
            (Direction::North, self.north.as_str()),
            (Direction::South, self.south.as_str()),
            (Direction::East, self.east.as_str()),
            (Direction::West, self.west.as_str()),
        ]
    }
}

fn resolve_config(cli: &Cli) -> Result<ClientConfig> {
    let (config, metadata) = load_client_config_from_env(cli.config.as_deref());
    if let Some(path) = metadata.path() {
        info!("Using client config {}", path.display());
    }
    let mut config = ClientConfig::clone(&config);
    if let Some(endpoint) = &cli.endpoint {
        config.set_base_url(endpoint.clone());
    }
    if let Some(divisor) = cli.scale_divisor {
        config.set_scale_divisor(divisor);
    }
    if let Some(preset) = cli.alphabet {
        config.set_alphabet(preset);
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let (log_tx, log_rx) = mpsc::channel::<String>();
    if cli.headless {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .compact()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .with_ansi(false)
            .with_writer(move || ChannelWriter {
                sender: log_tx.clone(),
            })
            .init();
    }

    let config = resolve_config(&cli)?;
    info!("Driving simulation engine at {}", config.engine().base_url());

    let engine = HttpEngine::new(config.engine().base_url(), config.engine().request_timeout())?;
    let driver = SimulationDriver::new(Arc::new(engine), &config, Handle::current());
    let projector = RenderProjector::from_config(config.projection());

    let mut client = ClientState::default();
    for (lane, text) in cli.lanes() {
        client.set_lane(lane, text)?;
    }

    if cli.headless {
        return headless::run(
            driver,
            client,
            &projector,
            Duration::from_secs(cli.duration_secs),
        )
        .await;
    }

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let ui_handle = std::thread::spawn(move || -> Result<()> {
        let app = InspectorApp::new(driver, client, projector, log_rx, shutdown_tx)?;
        app.run()
    });

    // The UI thread only schedules work; this thread drives it.
    let _ = shutdown_rx.await;
    info!("Inspector requested shutdown");
    ui_handle
        .join()
        .map_err(|_| eyre!("inspector UI thread panicked"))?
}
