mod help;
mod state;

use crate::cli::{build_config, Cli};
use crate::model::{ComputeEvent, RunConfig};
use crate::orchestrator::{self, Presenter, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Sparkline, Tabs, Wrap},
    Terminal,
};
use state::UiState;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    // Unbounded channels keep the worker from ever blocking on a slow UI frame.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<ComputeEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    let cfg = build_config(&args);

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_cfg = cfg.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(ui_cfg, event_rx, cmd_tx));

    let res = orchestrator::run_controller(cfg, args.start_on_launch, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    cfg: RunConfig,
    mut event_rx: UnboundedReceiver<ComputeEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // The presenter and its UiState are owned by the UI thread only.
    let mut presenter = Presenter::new(UiState::new(cfg.target_count));

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            presenter.apply(ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, presenter.view())).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match (k.modifiers, k.code) {
                    (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    (_, KeyCode::Char('s')) => {
                        let state = presenter.view_mut();
                        if state.can_start() {
                            state.info = "Start requested…".into();
                            let _ = cmd_tx.send(UiCommand::Start);
                        } else {
                            state.info = "Already running".into();
                        }
                    }
                    (_, KeyCode::Char('r')) => {
                        // Drop anything still queued from this run before the controller
                        // has even seen the command.
                        presenter.reset();
                        presenter.view_mut().info = "Reset".into();
                        let _ = cmd_tx.send(UiCommand::Reset);
                    }
                    (_, KeyCode::Tab) => {
                        let state = presenter.view_mut();
                        state.tab = (state.tab + 1) % 2;
                    }
                    (_, KeyCode::Char('?')) => {
                        presenter.view_mut().tab = 1;
                    }
                    _ => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let tabs = Tabs::new(vec![Line::from("Dashboard"), Line::from("Help")])
        .select(state.tab)
        .block(Block::default().borders(Borders::ALL).title("prime-progress"))
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        0 => draw_dashboard(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f),
    }
}

fn draw_dashboard(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(6),
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);

    draw_status(rows[0], f, state);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(state.ratio())
        .label(format!("{}/{}", state.found, state.target_count));
    f.render_widget(gauge, rows[1]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)].as_ref())
        .split(rows[2]);

    let recent = state
        .recent
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    let recent_p = Paragraph::new(recent)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Recent primes"));
    f.render_widget(recent_p, middle[0]);

    let gaps = Sparkline::default()
        .block(Block::default().borders(Borders::ALL).title("Prime gaps"))
        .data(&state.gap_series)
        .style(Style::default().fg(Color::Cyan));
    f.render_widget(gaps, middle[1]);

    draw_keybar(rows[3], f, state);
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let elapsed = state
        .elapsed()
        .map(|d| format!("{:.1}s", d.as_secs_f64()))
        .unwrap_or_else(|| "-".into());
    let lines = vec![
        Line::from(Span::styled(
            state.status.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("State: ", Style::default().fg(Color::Gray)),
            Span::raw(state.computation.label()),
            Span::styled("  Elapsed: ", Style::default().fg(Color::Gray)),
            Span::raw(elapsed),
        ]),
        Line::from(vec![
            Span::styled("Last prime: ", Style::default().fg(Color::Gray)),
            Span::raw(
                state
                    .last_value
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "-".into()),
            ),
        ]),
        Line::from(Span::styled(
            state.info.clone(),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(p, area);
}

fn draw_keybar(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let start_style = if state.can_start() {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let line = Line::from(vec![
        Span::styled("[s] Start", start_style),
        Span::raw("   "),
        Span::styled("[r] Reset", Style::default().fg(Color::Yellow)),
        Span::raw("   "),
        Span::styled("[?] Help", Style::default().fg(Color::Magenta)),
        Span::raw("   "),
        Span::styled("[q] Quit", Style::default().fg(Color::Magenta)),
    ]);
    let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(p, area);
}
