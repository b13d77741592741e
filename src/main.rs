use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph, Wrap};

use club_index::config::AppConfig;
use club_index::feed;
use club_index::matchup::{Quote, format_odds, format_pct};
use club_index::state::{
    AppState, Delta, InputMode, ProviderCommand, Side, apply_delta, row_cells,
};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
}

impl App {
    fn new(state: AppState, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state,
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.input_mode == InputMode::Search {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => self.state.input_mode = InputMode::Normal,
                KeyCode::Backspace => self.state.pop_search_char(),
                KeyCode::Char(ch) => self.state.push_search_char(ch),
                KeyCode::Down => self.state.select_next(),
                KeyCode::Up => self.state.select_prev(),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('/') => self.state.input_mode = InputMode::Search,
            KeyCode::Esc => self.state.clear_search(),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('h') | KeyCode::Char('H') => self.state.assign_selected(Side::Home),
            KeyCode::Char('a') | KeyCode::Char('A') => self.state.assign_selected(Side::Away),
            KeyCode::Char('x') => self.state.swap_sides(),
            KeyCode::Char('c') => self.state.clear_fixture(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.request_refresh(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ => {}
        }
    }

    fn request_refresh(&mut self) {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Refresh unavailable");
            return;
        };
        if tx.send(ProviderCommand::Refresh { force: true }).is_err() {
            self.state.push_log("[WARN] Refresh request failed");
        } else {
            self.state.loading = true;
            self.state.push_log("[INFO] Refresh requested");
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let cfg = AppConfig::from_env();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let state = AppState::new(cfg.model);
    feed::spawn_provider(cfg, tx, cmd_rx);

    let mut app = App::new(state, Some(cmd_tx));
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(38)])
        .split(chunks[1]);

    render_table(frame, body[0], &app.state);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(13), Constraint::Min(3)])
        .split(body[1]);
    render_prediction(frame, right[0], &app.state);

    let console = Paragraph::new(console_text(&app.state, right[1].height))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, right[1]);

    let footer = Paragraph::new(footer_text(&app.state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if app.state.help_overlay {
        let area = frame.size();
        render_help_overlay(frame, area);
    }
}

fn header_text(state: &AppState) -> String {
    let status = if state.loading {
        "loading...".to_string()
    } else if let Some(err) = &state.last_error {
        format!("error: {err}")
    } else {
        let source = state.source.as_deref().unwrap_or("-");
        let updated = state
            .fetched_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        format!("{} clubs | {source} | updated {updated}", state.table.len())
    };
    let search = match state.input_mode {
        InputMode::Search => format!("Search: {}_", state.search),
        InputMode::Normal if state.search.is_empty() => "Search: (press /)".to_string(),
        InputMode::Normal => format!("Search: {}", state.search),
    };
    format!("EURO CLUB INDEX | {status}\n{search}")
}

fn footer_text(state: &AppState) -> String {
    match state.input_mode {
        InputMode::Search => "Type to filter | ↑/↓ Move | Enter/Esc Done".to_string(),
        InputMode::Normal => {
            "/ Search | j/k Move | h Home | a Away | x Swap | c Clear | r Refresh | ? Help | q Quit"
                .to_string()
        }
    }
}

fn table_columns() -> [Constraint; 5] {
    [
        Constraint::Length(6),
        Constraint::Min(20),
        Constraint::Length(14),
        Constraint::Length(16),
        Constraint::Length(9),
    ]
}

fn render_table(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Club Ratings").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);

    let widths = table_columns();
    let head = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(sections[0]);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    for (col, title) in ["Rank", "Club", "Country", "League", "Points"]
        .iter()
        .enumerate()
    {
        render_cell_text(frame, head[col], title, bold);
    }

    let list_area = sections[1];
    let rows = state.filtered_rows();
    if rows.is_empty() {
        let msg = if state.loading {
            "Loading ratings..."
        } else if state.table.is_empty() {
            "No ratings available (r to retry)"
        } else {
            "No clubs match the search"
        };
        let empty = Paragraph::new(msg).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }
    if list_area.height == 0 {
        return;
    }

    let visible = list_area.height as usize;
    let (start, end) = visible_range(state.selected, rows.len(), visible);

    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + i as u16,
            width: list_area.width,
            height: 1,
        };
        let club = rows[idx];
        let is_home = state.home.as_deref() == Some(club.name.as_str());
        let is_away = state.away.as_deref() == Some(club.name.as_str());

        let mut style = Style::default();
        if is_home {
            style = style.fg(Color::Green);
        } else if is_away {
            style = style.fg(Color::Red);
        }
        if idx == state.selected {
            style = style.bg(Color::DarkGray);
            frame.render_widget(Block::default().style(style), row_area);
        }

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);
        for (col, text) in row_cells(club).iter().enumerate() {
            let text = if text.is_empty() { "-" } else { text.as_str() };
            render_cell_text(frame, cols[col], text, style);
        }
    }
}

fn render_prediction(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Prediction").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(inner);

    let home = state.home.as_deref().unwrap_or("- (h)");
    let away = state.away.as_deref().unwrap_or("- (a)");
    let mut lines = vec![format!("Home: {home}"), format!("Away: {away}"), String::new()];

    match &state.quote {
        None => lines.push("Pick two clubs to price the fixture".to_string()),
        Some(Err(err)) => lines.push(err.to_string()),
        Some(Ok(quote)) => {
            lines.extend(quote_lines(quote));
            frame.render_widget(quote_bar_chart(quote), parts[1]);
        }
    }

    let text = Paragraph::new(lines.join("\n")).wrap(Wrap { trim: true });
    frame.render_widget(text, parts[0]);
}

fn quote_lines(quote: &Quote) -> Vec<String> {
    vec![
        format!("Delta: {:+.1}", quote.delta),
        format!(
            "Home  {:>6}  @ {}",
            format_pct(quote.probs.p_home),
            format_odds(quote.odds.home)
        ),
        format!(
            "Draw  {:>6}  @ {}",
            format_pct(quote.probs.p_draw),
            format_odds(quote.odds.draw)
        ),
        format!(
            "Away  {:>6}  @ {}",
            format_pct(quote.probs.p_away),
            format_odds(quote.odds.away)
        ),
    ]
}

fn quote_bar_chart(quote: &Quote) -> BarChart<'static> {
    let pct = |p: f64| (p * 100.0).round() as u64;
    let home = Bar::default()
        .value(pct(quote.probs.p_home))
        .text_value(String::new())
        .style(Style::default().fg(Color::Green));
    let draw = Bar::default()
        .value(pct(quote.probs.p_draw))
        .text_value(String::new())
        .style(Style::default().fg(Color::Yellow));
    let away = Bar::default()
        .value(pct(quote.probs.p_away))
        .text_value(String::new())
        .style(Style::default().fg(Color::Red));

    BarChart::default()
        .data(BarGroup::default().bars(&[home, draw, away]))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .group_gap(0)
        .max(100)
}

fn console_text(state: &AppState, height: u16) -> String {
    let shown = height.saturating_sub(2) as usize;
    let skip = state.logs.len().saturating_sub(shown);
    state
        .logs
        .iter()
        .skip(skip)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let text_area = Rect {
        x: area.x,
        y: area.y + (area.height / 2),
        width: area.width,
        height: 1,
    };
    let paragraph = Paragraph::new(text.to_string()).style(style);
    frame.render_widget(paragraph, text_area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Euro Club Index - Help",
        "",
        "Table:",
        "  j/k or ↑/↓   Move",
        "  /            Search (all columns)",
        "  Esc          Clear search",
        "  r            Refresh ratings",
        "",
        "Prediction:",
        "  h            Set highlighted club as home",
        "  a            Set highlighted club as away",
        "  x            Swap home and away",
        "  c            Clear fixture",
        "",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
