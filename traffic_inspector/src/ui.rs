use std::collections::VecDeque;

use ratatui::layout::{Constraint, Direction, Layout, Margin};
use ratatui::prelude::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Rectangle};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use traffic_runtime::{
    ClientState, Direction as Lane, DisplayAttributes, Emphasis, LightPhase, RenderProjector,
    RenderState, SimulationSession, VehicleRecord,
};

use crate::motion::MotionTracker;

pub struct UiState {
    focus: Lane,
    pub logs: VecDeque<String>,
    pub max_logs: usize,
    pub motion: MotionTracker,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            focus: Lane::North,
            logs: VecDeque::new(),
            max_logs: 64,
            motion: MotionTracker::default(),
        }
    }
}

impl UiState {
    pub fn focus(&self) -> Lane {
        self.focus
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_previous(&mut self) {
        self.focus = self.focus.previous();
    }

    pub fn push_log<S: Into<String>>(&mut self, line: S) {
        let mut text: String = line.into();
        while text.ends_with('\n') || text.ends_with('\r') {
            text.pop();
        }
        if text.is_empty() {
            return;
        }
        self.logs.push_front(text);
        while self.logs.len() > self.max_logs {
            self.logs.pop_back();
        }
    }
}

fn lane_label(lane: Lane) -> &'static str {
    match lane {
        Lane::North => "North (↓)",
        Lane::South => "South (↑)",
        Lane::East => "East (←)",
        Lane::West => "West (→)",
    }
}

fn phase_color(phase: LightPhase) -> Color {
    match phase {
        LightPhase::Red => Color::Red,
        LightPhase::Yellow => Color::Yellow,
        LightPhase::Green => Color::Green,
        LightPhase::Unknown => Color::DarkGray,
    }
}

fn vehicle_style(attributes: &DisplayAttributes) -> Style {
    let mut style = Style::default();
    if attributes.emphasis == Emphasis::Glow {
        style = style
            .fg(Color::LightRed)
            .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK);
    }
    if attributes.dimmed {
        style = style.add_modifier(Modifier::DIM);
    }
    style
}

pub fn draw_ui(
    frame: &mut Frame,
    state: &UiState,
    client: &ClientState,
    projector: &RenderProjector,
    hint: &str,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Min(12),
        ])
        .split(frame.size());

    let controls = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[1]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(rows[2]);

    draw_header(frame, rows[0], client);
    draw_lanes(frame, controls[0], state, client, hint);
    draw_signals(frame, controls[1], client.render());
    draw_intersection(frame, body[0], state, client.render(), projector);
    draw_logs(frame, body[1], state);
}

fn draw_header(frame: &mut Frame, area: Rect, client: &ClientState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Intersection Inspector");
    let render = client.render();
    let status = match client.session() {
        SimulationSession::Running => {
            Span::styled("Simulating", Style::default().fg(Color::Green))
        }
        SimulationSession::Idle => Span::styled("Idle", Style::default().fg(Color::Yellow)),
    };
    let algorithm = if render.algorithm.is_empty() {
        "-"
    } else {
        render.algorithm.as_str()
    };
    let next_lane = render.next_lane.map_or("-", |lane| lane.as_str());
    let line = Line::from(vec![
        status,
        Span::raw(" | algorithm "),
        Span::styled(algorithm.to_string(), Style::default().fg(Color::Cyan)),
        Span::raw(" | next lane "),
        Span::styled(next_lane, Style::default().fg(Color::Cyan)),
        Span::raw(format!(" | snapshots {}", client.snapshots_applied())),
        Span::raw(" | Enter start, Ctrl+S stop, Tab lane, Esc quit"),
    ]);
    let text = Paragraph::new(line).wrap(Wrap { trim: true });
    frame.render_widget(block, area);
    frame.render_widget(
        text,
        area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        }),
    );
}

fn draw_lanes(frame: &mut Frame, area: Rect, state: &UiState, client: &ClientState, hint: &str) {
    let locked = client.is_running();
    let lines: Vec<Line> = Lane::ALL
        .into_iter()
        .map(|lane| {
            let focused = lane == state.focus();
            let marker = if focused && !locked { "> " } else { "  " };
            let text = client.lane(lane).as_str();
            let input = if text.is_empty() {
                Span::styled(hint.to_string(), Style::default().fg(Color::DarkGray))
            } else if locked {
                Span::styled(text.to_string(), Style::default().fg(Color::DarkGray))
            } else {
                Span::raw(text.to_string())
            };
            let label_style = if focused {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::raw(marker),
                Span::styled(format!("{:<10}", lane_label(lane)), label_style),
                input,
            ])
        })
        .collect();
    let block = Block::default().borders(Borders::ALL).title("Lanes");
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(block, area);
    frame.render_widget(
        paragraph,
        area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        }),
    );
}

fn draw_signals(frame: &mut Frame, area: Rect, render: &RenderState) {
    let lines: Vec<Line> = render
        .lights
        .iter()
        .map(|(lane, phase)| {
            Line::from(vec![
                Span::raw(format!("{:<6}", lane.as_str())),
                Span::styled("● ", Style::default().fg(phase_color(*phase))),
                Span::styled(
                    format!("{:<8}", phase.as_str()),
                    Style::default().fg(phase_color(*phase)),
                ),
                Span::raw(" queued "),
                Span::styled(
                    format!("{:>3}", render.queue_counts.get(lane)),
                    Style::default().fg(Color::Magenta),
                ),
            ])
        })
        .collect();
    let block = Block::default().borders(Borders::ALL).title("Signals");
    let paragraph = Paragraph::new(lines);
    frame.render_widget(block, area);
    frame.render_widget(
        paragraph,
        area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        }),
    );
}

/// Canvas y grows upward while view space grows downward.
fn canvas_point(state: &UiState, record: &VehicleRecord) -> (f64, f64) {
    let view = state
        .motion
        .position(&record.id)
        .unwrap_or(record.view_position);
    (view.x, 100.0 - view.y)
}

fn signal_anchor(lane: Lane) -> (f64, f64) {
    match lane {
        Lane::North => (36.0, 64.0),
        Lane::South => (62.0, 34.0),
        Lane::East => (62.0, 64.0),
        Lane::West => (36.0, 34.0),
    }
}

fn draw_intersection(
    frame: &mut Frame,
    area: Rect,
    state: &UiState,
    render: &RenderState,
    projector: &RenderProjector,
) {
    let painted = projector.paint_order(render.vehicles());
    let canvas = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Intersection ({} active)", render.vehicle_count())),
        )
        .x_bounds([0.0, 100.0])
        .y_bounds([0.0, 100.0])
        .paint(|ctx| {
            ctx.draw(&Rectangle {
                x: 42.0,
                y: 0.0,
                width: 16.0,
                height: 100.0,
                color: Color::DarkGray,
            });
            ctx.draw(&Rectangle {
                x: 0.0,
                y: 42.0,
                width: 100.0,
                height: 16.0,
                color: Color::DarkGray,
            });
            for (lane, phase) in render.lights.iter() {
                let (x, y) = signal_anchor(lane);
                ctx.print(x, y, Span::styled("●", Style::default().fg(phase_color(*phase))));
            }
            ctx.layer();
            for (record, attributes) in &painted {
                let (x, y) = canvas_point(state, record);
                if attributes.scale > 1.0 {
                    let half = 2.0 * f64::from(attributes.scale);
                    ctx.draw(&Rectangle {
                        x: x - half,
                        y: y - half,
                        width: half * 2.0,
                        height: half * 2.0,
                        color: Color::Gray,
                    });
                }
                ctx.print(x, y, Span::styled(attributes.glyph, vehicle_style(attributes)));
                if attributes.siren {
                    ctx.print(
                        x + 3.0,
                        y,
                        Span::styled("🚨", Style::default().fg(Color::LightRed)),
                    );
                }
            }
        });
    frame.render_widget(canvas, area);
}

fn draw_logs(frame: &mut Frame, area: Rect, state: &UiState) {
    let block = Block::default().borders(Borders::ALL).title("Logs");
    let lines: Vec<Line> = state
        .logs
        .iter()
        .map(|entry| Line::from(Span::raw(entry)))
        .collect();
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(block, area);
    frame.render_widget(
        paragraph,
        area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        }),
    );
}
