use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use tokio::sync::oneshot;
use tracing::{info, trace, warn};
use traffic_runtime::{ClientState, LaneInput, RenderProjector, SimulationDriver};

use crate::http_engine::HttpEngine;
use crate::ui::{draw_ui, UiState};

const FRAME_INTERVAL: Duration = Duration::from_millis(50);

pub struct InspectorApp {
    terminal: Terminal<CrosstermBackend<std::io::Stdout>>,
    ui_state: UiState,
    driver: SimulationDriver<HttpEngine>,
    client: ClientState,
    projector: RenderProjector,
    log_receiver: Receiver<String>,
    shutdown_sender: Option<oneshot::Sender<()>>,
}

impl InspectorApp {
    pub fn new(
        driver: SimulationDriver<HttpEngine>,
        client: ClientState,
        projector: RenderProjector,
        log_receiver: Receiver<String>,
        shutdown_sender: oneshot::Sender<()>,
    ) -> Result<Self> {
        let stdout = std::io::stdout();
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        crossterm::terminal::enable_raw_mode()?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(Self {
            terminal,
            ui_state: UiState::default(),
            driver,
            client,
            projector,
            log_receiver,
            shutdown_sender: Some(shutdown_sender),
        })
    }

    pub fn run(mut self) -> Result<()> {
        let hint = self.driver.alphabet().hint();
        let mut last_draw = Instant::now();

        loop {
            let applied = self.driver.pump(&mut self.client);
            if applied > 0 {
                trace!(applied, "snapshot.applied");
            }

            while let Ok(line) = self.log_receiver.try_recv() {
                self.ui_state.push_log(line);
            }

            if last_draw.elapsed() >= FRAME_INTERVAL {
                self.ui_state
                    .motion
                    .advance(self.client.render().vehicles());
                self.terminal.draw(|frame| {
                    draw_ui(frame, &self.ui_state, &self.client, &self.projector, &hint)
                })?;
                last_draw = Instant::now();
            }

            if event::poll(Duration::from_millis(10))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && !self.handle_key(key) {
                        break;
                    }
                }
            }
        }

        self.terminal.show_cursor()?;
        crossterm::terminal::disable_raw_mode()?;
        if let Some(sender) = self.shutdown_sender.take() {
            let _ = sender.send(());
        }
        Ok(())
    }

    /// Returns `false` when the operator asked to quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return false,
            KeyCode::Char('c') if ctrl => return false,
            KeyCode::Char('s') if ctrl => self.stop_simulation(),
            KeyCode::Enter => self.start_simulation(),
            KeyCode::Tab | KeyCode::Down => self.ui_state.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.ui_state.focus_previous(),
            KeyCode::Backspace => self.edit_focused(|lane| {
                lane.pop();
            }),
            KeyCode::Char(ch) if !ctrl => self.edit_focused(|lane| lane.push(ch)),
            _ => {}
        }
        true
    }

    fn edit_focused(&mut self, edit: impl FnOnce(&mut LaneInput)) {
        if let Err(err) = self.client.edit_lane(self.ui_state.focus(), edit) {
            self.ui_state.push_log(err.to_string());
        }
    }

    fn start_simulation(&mut self) {
        match self.driver.start(&mut self.client) {
            Ok(planned) => {
                self.ui_state.motion.clear();
                info!(planned, "Simulation started");
            }
            Err(err) => warn!("Start rejected: {}", err),
        }
    }

    fn stop_simulation(&mut self) {
        match self.driver.stop(&mut self.client) {
            Ok(()) => info!("Simulation stopped; spawn commands already queued still go out"),
            Err(err) => warn!("Stop rejected: {}", err),
        }
    }
}
