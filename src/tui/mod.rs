//! Ratatui-based terminal dashboard.
//!
//! The dashboard shows the observed production points with the fitted
//! decline curve over them, a settings panel (model variant, evaluation
//! budget), and a status line. Every settings change triggers a refit. A
//! failed fit never leaves a stale curve on screen: the chart area shows
//! the failure message instead.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Terminal,
};

use crate::app::pipeline::{run_fit_with_ingest, RunOutput};
use crate::cli::{picker, FitArgs};
use crate::domain::{FitConfig, ModelKind};
use crate::error::AppError;
use crate::io::ingest::{load_well_points, IngestedData};

mod plotters_chart;

use plotters_chart::DcaPlottersChart;

const EVENT_POLL: Duration = Duration::from_millis(100);

/// Settings rows, top to bottom: model, evaluation budget.
const SETTINGS_ROWS: usize = 2;

/// What a key press asks the app to do.
enum Action {
    Quit,
    Redraw,
    Ignore,
}

/// Start the dashboard.
///
/// The CSV is chosen before raw mode is enabled so the plain-text picker
/// prompt behaves like a normal terminal program.
pub fn run(args: FitArgs) -> Result<(), AppError> {
    let csv_path = match &args.file {
        Some(path) => picker::validate_csv_path(path)?,
        None => picker::prompt_for_csv_path()?,
    };
    let config = crate::app::fit_config_from_args(&args, csv_path);
    let ingest = load_well_points(&config.csv_path)?;

    let _guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    Dashboard::new(config, ingest).event_loop(&mut terminal)
}

/// Restores the terminal (raw mode off, main screen back) when dropped.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        match execute!(io::stdout(), EnterAlternateScreen) {
            Ok(()) => Ok(Self),
            Err(e) => {
                let _ = disable_raw_mode();
                Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")))
            }
        }
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct Dashboard {
    config: FitConfig,
    ingest: IngestedData,
    /// `None` after a failed fit; `status` then carries the failure message.
    run: Option<RunOutput>,
    status: String,
    selected_row: usize,
}

impl Dashboard {
    fn new(config: FitConfig, ingest: IngestedData) -> Self {
        let mut app = Self {
            config,
            ingest,
            run: None,
            status: String::from("Fitting..."),
            selected_row: 0,
        };
        app.refit();
        app
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut dirty = true;
        loop {
            if dirty {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                dirty = false;
            }

            let ready = event::poll(EVENT_POLL)
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?;
            if !ready {
                continue;
            }

            let ev = event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))?;
            match ev {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    match self.handle_key(key.code) {
                        Action::Quit => return Ok(()),
                        Action::Redraw => dirty = true,
                        Action::Ignore => {}
                    }
                }
                Event::Resize(_, _) => dirty = true,
                _ => {}
            }
        }
    }

    fn handle_key(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Up => {
                self.selected_row = self.selected_row.saturating_sub(1);
                Action::Redraw
            }
            KeyCode::Down => {
                self.selected_row = (self.selected_row + 1).min(SETTINGS_ROWS - 1);
                Action::Redraw
            }
            KeyCode::Left => {
                self.adjust_selected(-1);
                Action::Redraw
            }
            KeyCode::Right => {
                self.adjust_selected(1);
                Action::Redraw
            }
            KeyCode::Char('m') => {
                self.config.model = cycle_model(self.config.model, 1);
                self.refit();
                Action::Redraw
            }
            KeyCode::Char('r') => {
                self.reload();
                Action::Redraw
            }
            KeyCode::Char('d') => {
                self.status = match crate::debug::write_debug_bundle(&self.ingest, &self.config) {
                    Ok(path) => format!("Wrote debug bundle: {}", path.display()),
                    Err(err) => format!("Debug write failed: {err}"),
                };
                Action::Redraw
            }
            _ => Action::Ignore,
        }
    }

    fn adjust_selected(&mut self, delta: i32) {
        match self.selected_row {
            0 => self.config.model = cycle_model(self.config.model, delta),
            1 => {
                // Budget moves in decades; anything finer is noise.
                let next = if delta >= 0 {
                    self.config.max_evaluations.saturating_mul(10)
                } else {
                    self.config.max_evaluations / 10
                };
                self.config.max_evaluations = next.clamp(10, 1_000_000);
            }
            _ => return,
        }
        self.refit();
    }

    /// Refit the loaded dataset under the current settings.
    ///
    /// On failure the previous result is dropped so the chart never shows a
    /// curve that does not belong to the current settings.
    fn refit(&mut self) {
        match run_fit_with_ingest(&self.config, self.ingest.clone()) {
            Ok(run) => {
                self.status = format!(
                    "{} decline: rmse={:.4} in {} evaluation(s)",
                    run.fit.model.display_name, run.fit.quality.rmse, run.fit.quality.evaluations
                );
                self.run = Some(run);
            }
            Err(err) => {
                self.run = None;
                self.status = err.to_string();
            }
        }
    }

    fn reload(&mut self) {
        match load_well_points(&self.config.csv_path) {
            Ok(ingest) => {
                self.ingest = ingest;
                self.refit();
            }
            Err(err) => self.status = format!("Reload failed: {err}"),
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let [header, body, footer] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .areas(frame.area());
        let [chart, settings] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(4)])
            .areas(body);

        self.draw_header(frame, header);
        self.draw_chart(frame, chart);
        self.draw_settings(frame, settings);
        self.draw_footer(frame, footer);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let dim = Style::default().fg(Color::Gray);
        let mut lines = vec![
            Line::from(vec![
                Span::styled("dca", Style::default().fg(Color::Cyan)),
                Span::raw(" — Arps decline curve fit"),
            ]),
            Line::from(Span::styled(
                format!(
                    "file: {} | model: {} | n={} | budget: {}",
                    self.config.csv_path.display(),
                    self.config.model.display_name(),
                    self.ingest.stats.n_points,
                    self.config.max_evaluations,
                ),
                dim,
            )),
        ];

        if let Some(run) = &self.run {
            let mut readout = format!("qi={:.2} di={:.2e}", run.fit.model.qi(), run.fit.model.di());
            if let Some(b) = run.fit.model.b() {
                readout.push_str(&format!(" b={b:.2}"));
            }
            readout.push_str(&format!(
                " | rmse={:.4} | evals={}",
                run.fit.quality.rmse, run.fit.quality.evaluations
            ));
            lines.push(Line::from(Span::styled(readout, dim)));
        }

        frame.render_widget(
            Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL)),
            area,
        );
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Decline Curve").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(run) = &self.run else {
            // `status` holds the failure message after an unsuccessful refit.
            frame.render_widget(
                Paragraph::new(self.status.as_str()).style(Style::default().fg(Color::Yellow)),
                inner,
            );
            return;
        };

        let series = ChartSeries::from_run(run);
        let (chart_rect, axes) = split_chart_area(inner);
        frame.render_widget(
            DcaPlottersChart {
                curve: &series.curve,
                points: &series.points,
                x_bounds: series.x_bounds,
                y_bounds: series.y_bounds,
                x_label: "time",
                y_label: "production",
                fmt_x: fmt_axis_x,
                fmt_y: fmt_axis_y,
            },
            chart_rect,
        );
        if axes {
            draw_tick_labels(frame, inner, chart_rect, series.x_bounds, series.y_bounds);
        }
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = vec![
            ListItem::new(format!("Model: {}", self.config.model.display_name())),
            ListItem::new(format!("Max evaluations: {}", self.config.max_evaluations)),
        ];
        let list = List::new(rows)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected_row));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let line = Line::from(vec![
            Span::styled(
                "↑/↓ select  ←/→ adjust  m model  r reload  d debug  q quit",
                Style::default().fg(Color::Gray),
            ),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        frame.render_widget(
            Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
            area,
        );
    }
}

/// Series and bounds for one chart draw.
struct ChartSeries {
    curve: Vec<(f64, f64)>,
    points: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

impl ChartSeries {
    fn from_run(run: &RunOutput) -> Self {
        // Include t=0 so the curve starts at the initial rate.
        let mut t0 = run.ingest.stats.time_min.min(0.0);
        let mut t1 = run.ingest.stats.time_max;
        if !t0.is_finite() || !t1.is_finite() || t1 <= t0 {
            t0 = 0.0;
            t1 = 60.0;
        }

        let points: Vec<(f64, f64)> = run
            .residuals
            .iter()
            .map(|r| (r.point.time, r.point.production))
            .collect();

        // Undefined samples are simply skipped; the converged parameters are
        // valid on the observed times but the dense grid can reach past them.
        let n = 200usize;
        let curve: Vec<(f64, f64)> = (0..n)
            .filter_map(|i| {
                let t = t0 + (t1 - t0) * i as f64 / (n as f64 - 1.0);
                crate::models::predict(run.fit.model.kind, t, &run.fit.model.params)
                    .map(|q| (t, q))
            })
            .collect();

        let mut q_lo = f64::INFINITY;
        let mut q_hi = f64::NEG_INFINITY;
        for &(_, q) in points.iter().chain(curve.iter()) {
            q_lo = q_lo.min(q);
            q_hi = q_hi.max(q);
        }
        if !q_lo.is_finite() || !q_hi.is_finite() || q_hi <= q_lo {
            q_lo = 0.0;
            q_hi = 1.0;
        }
        let pad = ((q_hi - q_lo) * 0.05).max(1e-12);

        Self {
            curve,
            points,
            x_bounds: [t0, t1],
            y_bounds: [q_lo - pad, q_hi + pad],
        }
    }
}

fn cycle_model(cur: ModelKind, delta: i32) -> ModelKind {
    let all = ModelKind::ALL;
    let idx = all.iter().position(|&k| k == cur).unwrap_or(0) as i32;
    let n = all.len() as i32;
    all[((idx + delta.signum() + n) % n) as usize]
}

fn fmt_axis_x(v: f64) -> String {
    format!("{v:.1}")
}

fn fmt_axis_y(v: f64) -> String {
    format!("{v:.0}")
}

/// Margin reserved around the plot for tick labels, in cells.
const TICKS_LEFT: u16 = 8;
const TICKS_RIGHT: u16 = 2;
const TICKS_TOP: u16 = 1;
const TICKS_BOTTOM: u16 = 2;

/// Carve the tick-label margin out of `inner`.
///
/// Returns the plot rectangle and whether there was room for labels. Small
/// terminals get the whole area and no labels.
fn split_chart_area(inner: Rect) -> (Rect, bool) {
    if inner.width <= TICKS_LEFT + TICKS_RIGHT + 10 || inner.height <= TICKS_TOP + TICKS_BOTTOM + 5 {
        return (inner, false);
    }
    let rect = Rect {
        x: inner.x + TICKS_LEFT,
        y: inner.y + TICKS_TOP,
        width: inner.width - TICKS_LEFT - TICKS_RIGHT,
        height: inner.height - TICKS_TOP - TICKS_BOTTOM,
    };
    (rect, true)
}

/// Draw tick labels and axis names with plain Ratatui text.
///
/// Plotters' own labels render through the canvas backend at sub-cell
/// precision and come out unreadable, so the text layer is ours.
fn draw_tick_labels(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    const TICKS: usize = 5;
    let dim = Style::default().fg(Color::Gray);

    for i in 0..TICKS {
        let u = i as f64 / (TICKS as f64 - 1.0);

        // X ticks run along the row just under the plot.
        let x_value = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let label = fmt_axis_x(x_value);
        let center = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let row = chart.y + chart.height;
        if row < inner.y + inner.height - 1 {
            let rect = Rect {
                x: center.saturating_sub((label.len() / 2) as u16),
                y: row,
                width: label.len() as u16,
                height: 1,
            };
            frame.render_widget(Paragraph::new(label).style(dim), rect);
        }

        // Y ticks sit right-aligned in the left margin, bottom to top.
        let y_value = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let label = fmt_axis_y(y_value);
        let row = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let end = inner.x + TICKS_LEFT.saturating_sub(1);
        let start = end.saturating_sub(label.len() as u16);
        if start >= inner.x {
            let rect = Rect {
                x: start,
                y: row,
                width: label.len() as u16,
                height: 1,
            };
            frame.render_widget(Paragraph::new(label).style(dim), rect);
        }
    }

    let x_name_row = chart.y + chart.height + 1;
    if x_name_row < inner.y + inner.height {
        frame.render_widget(
            Paragraph::new("time").alignment(Alignment::Center).style(dim),
            Rect {
                x: chart.x,
                y: x_name_row,
                width: chart.width,
                height: 1,
            },
        );
    }

    // The top margin row is clear of the plot, so the y-axis name can run
    // past the left margin without overdrawing anything.
    frame.render_widget(
        Paragraph::new("production").style(dim.add_modifier(Modifier::BOLD)),
        Rect {
            x: inner.x,
            y: inner.y,
            width: (("production".len()) as u16).min(inner.width),
            height: 1,
        },
    );
}
