//! Ratatui-based terminal UI.
//!
//! Shows the groups of one allocation: role counters, a group list, the
//! selected group's members and the integrators. The quota policy and tie
//! threshold can be changed live; every change reruns the pipeline on the same
//! records.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table},
    Terminal,
};
use tracing::debug;

use crate::app::LoadedCohort;
use crate::domain::{AllocConfig, Allocation, GroupCard, RunConfig};
use crate::error::AppError;
use crate::report::{role_tag, truncate};

/// Tie threshold step for `+`/`-`.
const THRESHOLD_STEP: f64 = 0.5;

/// Start the TUI on an already validated cohort.
pub fn run(cohort: LoadedCohort, config: RunConfig) -> Result<(), AppError> {
    let mut app = App::new(cohort, config.alloc, config.ingest.csv_path)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::internal(format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Restores the terminal (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::internal(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::internal(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    cohort: LoadedCohort,
    config: AllocConfig,
    source: PathBuf,
    allocation: Allocation,
    groups: Vec<GroupCard>,
    selected: usize,
    status: String,
}

impl App {
    fn new(cohort: LoadedCohort, config: AllocConfig, source: PathBuf) -> Result<Self, AppError> {
        let allocation = crate::app::pipeline::run_allocation(&cohort.records, &config)?;
        let groups = allocation.group_cards();
        Ok(Self {
            cohort,
            config,
            source,
            allocation,
            groups,
            selected: 0,
            status: "Ready.".to_string(),
        })
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::internal(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::internal(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::internal(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => needs_redraw = true,
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the UI should close.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                if self.selected + 1 < self.groups.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('g') => {
                let mut next = self.config;
                next.quota = next.quota.toggled();
                self.rerun(next, format!("quota per role: {}", next.quota));
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let mut next = self.config;
                next.tie_threshold += THRESHOLD_STEP;
                self.rerun(next, format!("tie threshold: {:.1}", next.tie_threshold));
            }
            KeyCode::Char('-') => {
                let mut next = self.config;
                next.tie_threshold = (next.tie_threshold - THRESHOLD_STEP).max(0.0);
                self.rerun(next, format!("tie threshold: {:.1}", next.tie_threshold));
            }
            KeyCode::Char('e') => self.export_roster(),
            _ => {}
        }
        false
    }

    /// Rerun the pipeline with new settings; keep the old result on failure.
    fn rerun(&mut self, config: AllocConfig, message: String) {
        match crate::app::pipeline::run_allocation(&self.cohort.records, &config) {
            Ok(allocation) => {
                debug!(quota = %config.quota, tie_threshold = config.tie_threshold, "reran allocation");
                self.config = config;
                self.groups = allocation.group_cards();
                self.allocation = allocation;
                self.selected = self.selected.min(self.groups.len().saturating_sub(1));
                self.status = message;
            }
            Err(err) => self.status = format!("Allocation failed: {err}"),
        }
    }

    fn export_roster(&mut self) {
        let path = crate::app::default_roster_path(&self.source);
        let roster = crate::io::roster::roster_from_allocation(&self.allocation, Some(&self.source));
        self.status = match crate::io::roster::write_roster_json(&path, &roster) {
            Ok(()) => format!("Wrote roster: {}", path.display()),
            Err(err) => format!("Roster write failed: {err}"),
        };
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let summary = &self.cohort.summary;
        let gray = Style::default().fg(Color::Gray);

        let counts = self.allocation.role_counts();
        let mut counters: Vec<Span> = Vec::new();
        for (role, count) in counts.iter() {
            let short = self.allocation.shortfalls.iter().any(|(r, _)| *r == role);
            let style = if short { Style::default().fg(Color::Yellow) } else { gray };
            counters.push(Span::styled(format!("{}: {count}  ", role.plural()), style));
        }

        let lines = vec![
            Line::from(vec![
                Span::styled("fsg", Style::default().fg(Color::Cyan)),
                Span::raw(format!(" - {}", summary.source)),
            ]),
            Line::from(Span::styled(
                format!(
                    "students: {} (ignored {}) | groups: {} | quota per role: {} | tie threshold: {:.1}",
                    summary.rows_used,
                    summary.rows_ignored,
                    self.groups.len(),
                    self.allocation.quota,
                    self.config.tie_threshold,
                ),
                gray,
            )),
            Line::from(counters),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(26), Constraint::Min(0)])
            .split(area);

        self.draw_group_list(frame, columns[0]);

        let integrator_rows = integrator_panel_height(self.allocation.integrators.len());
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(integrator_rows)])
            .split(columns[1]);

        self.draw_members(frame, right[0]);
        self.draw_integrators(frame, right[1]);
    }

    fn draw_group_list(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .groups
            .iter()
            .map(|g| ListItem::new(format!("Group {} ({}/{})", g.id, g.members.len(), g.target_size)))
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Groups").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_members(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(group) = self.groups.get(self.selected) else {
            let msg = Paragraph::new("No groups.")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(msg, area);
            return;
        };

        let rows: Vec<Row> = group
            .members
            .iter()
            .map(|m| {
                let style = if m.is_integrator {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from(truncate(&m.name, 24)),
                    Cell::from(m.assigned_role.display_name()),
                    Cell::from(m.preference_level.label()),
                    Cell::from(format!(
                        "{}>{}>{}",
                        role_tag(m.primary),
                        role_tag(m.secondary),
                        role_tag(m.tertiary)
                    )),
                    Cell::from(format!("{:.1}", m.delta)),
                    Cell::from(if m.is_integrator { "yes" } else { "" }),
                ])
                .style(style)
            })
            .collect();

        let header = Row::new(vec!["Name", "Role", "Choice", "Ranking", "Δ", "Integr."])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let widths = [
            Constraint::Length(25),
            Constraint::Length(12),
            Constraint::Length(11),
            Constraint::Length(12),
            Constraint::Length(5),
            Constraint::Length(7),
        ];
        let table = Table::new(rows, widths).header(header).block(
            Block::default()
                .title(format!("Group {} (target {})", group.id, group.target_size))
                .borders(Borders::ALL),
        );
        frame.render_widget(table, area);
    }

    fn draw_integrators(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let cards = self.allocation.integrator_cards();
        let items: Vec<ListItem> = if cards.is_empty() {
            vec![ListItem::new("none")]
        } else {
            cards
                .iter()
                .map(|m| {
                    ListItem::new(format!(
                        "{} ({} / {}, Δ {:.1}) -> {}",
                        m.name, m.primary, m.secondary, m.delta, m.assigned_role
                    ))
                })
                .collect()
        };
        let list = List::new(items).block(Block::default().title("Integrators").borders(Borders::ALL));
        frame.render_widget(list, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ group  g quota  +/- threshold  e export roster  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Bordered panel height for `count` integrators: one to eight visible rows.
fn integrator_panel_height(count: usize) -> u16 {
    count.clamp(1, 8) as u16 + 2
}
