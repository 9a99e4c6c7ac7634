// 🖥️ Terminal Dashboard - login, game selector, candidate analytics

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use neurazor_analytics::{
    Accent, AnalyticsFilter, AnalyticsReport, AuthGate, DashboardState, DisplayRow, GameType,
    MockDataset, RouteDecision,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Auth check still running
    Loading,
    Login,
    GameSelection,
    Analytics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Email,
    Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    TimeThreshold,
    ScoreMin,
    ScoreMax,
}

impl FilterField {
    fn next(&self) -> Option<Self> {
        match self {
            FilterField::TimeThreshold => Some(FilterField::ScoreMin),
            FilterField::ScoreMin => Some(FilterField::ScoreMax),
            FilterField::ScoreMax => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            FilterField::TimeThreshold => "Time Threshold (s)",
            FilterField::ScoreMin => "Min Score",
            FilterField::ScoreMax => "Max Score",
        }
    }

    fn get(&self, filter: &AnalyticsFilter) -> u32 {
        match self {
            FilterField::TimeThreshold => filter.time_threshold,
            FilterField::ScoreMin => filter.score_min,
            FilterField::ScoreMax => filter.score_max,
        }
    }

    fn set(&self, filter: &mut AnalyticsFilter, value: u32) {
        match self {
            FilterField::TimeThreshold => filter.time_threshold = value,
            FilterField::ScoreMin => filter.score_min = value,
            FilterField::ScoreMax => filter.score_max = value,
        }
    }
}

#[derive(Debug, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub focus: LoginField,
    pub error: Option<String>,
}

pub struct App {
    gate: Arc<AuthGate>,
    runtime: Handle,
    pub data: MockDataset,
    pub screen: Screen,
    pub login: LoginForm,
    pub dashboard: DashboardState,
    pub games_state: TableState,
    pub table_state: TableState,
    /// Filter field being edited, with its text buffer
    pub editing: Option<FilterField>,
    pub input: String,
    pub show_detail: bool,
    pub status: Option<String>,
}

impl App {
    pub fn new(gate: Arc<AuthGate>, runtime: Handle, data: MockDataset) -> Self {
        let mut games_state = TableState::default();
        games_state.select(Some(0));

        Self {
            gate,
            runtime,
            data,
            screen: Screen::Loading,
            login: LoginForm::default(),
            dashboard: DashboardState::new(),
            games_state,
            table_state: TableState::default(),
            editing: None,
            input: String::new(),
            show_detail: false,
            status: None,
        }
    }

    /// Restore an existing session before the first screen.
    pub fn initialize(&mut self) {
        self.runtime.block_on(self.gate.initialize());
        self.sync_auth();
    }

    /// Follow the gate: signed-out or non-admin users end up on the login screen.
    pub fn sync_auth(&mut self) {
        match self.gate.decision() {
            RouteDecision::Loading => self.screen = Screen::Loading,
            RouteDecision::RedirectToLogin => {
                if self.screen != Screen::Login {
                    self.screen = Screen::Login;
                    self.show_detail = false;
                    self.editing = None;
                }
            }
            RouteDecision::Allow => {
                if matches!(self.screen, Screen::Loading | Screen::Login) {
                    self.screen = Screen::GameSelection;
                }
            }
        }
    }

    pub fn user_email(&self) -> String {
        self.gate
            .user()
            .map(|u| u.email_or_id().to_string())
            .unwrap_or_default()
    }

    pub fn submit_login(&mut self) {
        if self.login.email.trim().is_empty() || self.login.password.is_empty() {
            self.login.error = Some("Email and password are required".to_string());
            return;
        }

        let result = self
            .runtime
            .block_on(self.gate.login(self.login.email.trim(), &self.login.password));

        match result {
            Ok(user) => {
                self.login.password.clear();
                self.login.error = None;
                self.screen = Screen::GameSelection;
                self.status = Some(format!("Signed in as {}", user.email_or_id()));
            }
            Err(e) => {
                self.login.error = Some(e.user_message());
            }
        }
    }

    pub fn logout(&mut self) {
        match self.runtime.block_on(self.gate.logout()) {
            Ok(()) => {
                info!("terminal session signed out");
                self.dashboard.back_to_selection();
                self.show_detail = false;
                self.editing = None;
                self.status = None;
                self.screen = Screen::Login;
            }
            Err(e) => {
                error!(error = %e, "logout error");
                self.status = Some(format!("Logout failed: {}", e));
            }
        }
    }

    // ------------------------------------------------------------------------
    // Game selection
    // ------------------------------------------------------------------------

    pub fn highlighted_game(&self) -> Option<GameType> {
        self.games_state
            .selected()
            .and_then(|i| GameType::ALL.get(i).copied())
    }

    pub fn open_game(&mut self, game: GameType) {
        self.dashboard.select_game(game);
        self.table_state.select(Some(0));
        self.clamp_selection();
        self.show_detail = false;
        self.screen = Screen::Analytics;
    }

    pub fn back_to_selection(&mut self) {
        self.dashboard.back_to_selection();
        self.show_detail = false;
        self.editing = None;
        self.screen = Screen::GameSelection;
    }

    fn move_game(&mut self, forward: bool) {
        let len = GameType::ALL.len();
        let i = self.games_state.selected().unwrap_or(0);
        let next = if forward { (i + 1) % len } else { (i + len - 1) % len };
        self.games_state.select(Some(next));
    }

    // ------------------------------------------------------------------------
    // Analytics
    // ------------------------------------------------------------------------

    pub fn report(&self) -> Option<AnalyticsReport<'_>> {
        let game = self.dashboard.selected_game?;
        Some(AnalyticsReport::build(
            game,
            self.data.candidates_for(game),
            self.dashboard.filter,
        ))
    }

    fn row_count(&self) -> usize {
        self.report().map(|r| r.display_rows().len()).unwrap_or(0)
    }

    pub fn next_row(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous_row(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }

    /// The visible rows changed; keep the selection in range.
    fn clamp_selection(&mut self) {
        let len = self.row_count();
        match self.table_state.selected() {
            _ if len == 0 => self.table_state.select(None),
            Some(i) if i >= len => self.table_state.select(Some(len - 1)),
            None => self.table_state.select(Some(0)),
            _ => {}
        }
    }

    pub fn toggle_outliers(&mut self) {
        self.dashboard.filter.show_outliers = !self.dashboard.filter.show_outliers;
        self.clamp_selection();
    }

    pub fn reset_filters(&mut self) {
        self.dashboard.filter = AnalyticsFilter::default();
        self.editing = None;
        self.clamp_selection();
    }

    pub fn start_editing(&mut self, field: FilterField) {
        self.input = field.get(&self.dashboard.filter).to_string();
        self.editing = Some(field);
    }

    pub fn stop_editing(&mut self) {
        self.editing = None;
        self.input.clear();
    }

    /// Apply the buffer; a blank field means the field's default.
    fn apply_input(&mut self) {
        let Some(field) = self.editing else { return };
        let value = match self.input.parse::<u32>() {
            Ok(value) => value,
            Err(_) => field.get(&AnalyticsFilter::default()),
        };
        field.set(&mut self.dashboard.filter, value);
        self.clamp_selection();
    }

    pub fn edit_push(&mut self, c: char) {
        if c.is_ascii_digit() && self.input.len() < 4 {
            self.input.push(c);
            self.apply_input();
        }
    }

    pub fn edit_backspace(&mut self) {
        self.input.pop();
        self.apply_input();
    }

    fn next_field(&mut self) {
        match self.editing.and_then(|f| f.next()) {
            Some(field) => self.start_editing(field),
            None => self.stop_editing(),
        }
    }

    // ------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------

    /// Handle one key press. Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }

        match self.screen {
            Screen::Loading => false,
            Screen::Login => self.handle_login_key(key),
            Screen::GameSelection => self.handle_selection_key(key),
            Screen::Analytics => self.handle_analytics_key(key),
        }
    }

    fn focused_login_field(&mut self) -> &mut String {
        match self.login.focus {
            LoginField::Email => &mut self.login.email,
            LoginField::Password => &mut self.login.password,
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Esc => return true,
            KeyCode::Tab | KeyCode::Down | KeyCode::Up | KeyCode::BackTab => {
                self.login.focus = match self.login.focus {
                    LoginField::Email => LoginField::Password,
                    LoginField::Password => LoginField::Email,
                };
            }
            KeyCode::Enter => self.submit_login(),
            KeyCode::Backspace => {
                self.focused_login_field().pop();
            }
            KeyCode::Char(c) => self.focused_login_field().push(c),
            _ => {}
        }
        false
    }

    fn handle_selection_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Down | KeyCode::Char('j') => self.move_game(true),
            KeyCode::Up | KeyCode::Char('k') => self.move_game(false),
            KeyCode::Enter => {
                if let Some(game) = self.highlighted_game() {
                    self.open_game(game);
                }
            }
            KeyCode::Char('l') => self.logout(),
            _ => {}
        }
        false
    }

    fn handle_analytics_key(&mut self, key: KeyEvent) -> bool {
        if self.editing.is_some() {
            match key.code {
                KeyCode::Char(c) => self.edit_push(c),
                KeyCode::Backspace => self.edit_backspace(),
                KeyCode::Tab => self.next_field(),
                KeyCode::Enter | KeyCode::Esc => self.stop_editing(),
                _ => {}
            }
            return false;
        }

        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Esc | KeyCode::Char('b') => self.back_to_selection(),
            KeyCode::Tab | KeyCode::Char('f') => self.start_editing(FilterField::TimeThreshold),
            KeyCode::Char('o') => self.toggle_outliers(),
            KeyCode::Char('r') => self.reset_filters(),
            KeyCode::Char('l') => self.logout(),
            KeyCode::Enter => self.show_detail = !self.show_detail,
            KeyCode::Down | KeyCode::Char('j') => self.next_row(),
            KeyCode::Up | KeyCode::Char('k') => self.previous_row(),
            KeyCode::Home => {
                if self.row_count() > 0 {
                    self.table_state.select(Some(0));
                }
            }
            KeyCode::End => {
                let len = self.row_count();
                if len > 0 {
                    self.table_state.select(Some(len - 1));
                }
            }
            _ => {}
        }
        false
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    if app.screen == Screen::Loading {
        terminal.draw(|f| ui(f, app))?;
        app.initialize();
    }

    loop {
        app.sync_auth();
        terminal.draw(|f| ui(f, app))?;

        // Poll so provider-side sign-outs show up without a key press
        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.screen {
        Screen::Loading => render_loading(f, chunks[1]),
        Screen::Login => render_login(f, chunks[1], &app.login),
        Screen::GameSelection => render_game_selection(f, chunks[1], app),
        Screen::Analytics => render_analytics(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn accent_color(accent: Accent) -> Color {
    match accent {
        Accent::Blue => Color::Blue,
        Accent::Green => Color::Green,
        Accent::Yellow => Color::Yellow,
        Accent::Purple => Color::Magenta,
        Accent::Orange => Color::Rgb(249, 115, 22),
        Accent::Indigo => Color::Rgb(99, 102, 241),
        Accent::Pink => Color::LightMagenta,
        Accent::Teal => Color::Cyan,
        Accent::Red => Color::Red,
    }
}

fn label_style() -> Style {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled(
            "NeuRazor Analytics",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled("Performance Dashboard", Style::default().fg(Color::DarkGray)),
    ];

    if matches!(app.screen, Screen::GameSelection | Screen::Analytics) {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(app.dashboard.title(), Style::default().fg(Color::White)));
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            format!("{} (Admin)", app.user_email()),
            Style::default().fg(Color::Green),
        ));
    }

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_loading(f: &mut Frame, area: Rect) {
    let loading = Paragraph::new("Checking authentication...")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(loading, centered(area, 40, 3));
}

fn render_login(f: &mut Frame, area: Rect, form: &LoginForm) {
    let field_style = |field: LoginField| {
        if form.focus == field {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        }
    };
    let cursor = |field: LoginField| if form.focus == field { "█" } else { "" };

    let mut content = vec![
        Line::from(Span::styled(
            "Admin access only",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Email:    ", label_style()),
            Span::styled(
                format!("{}{}", form.email, cursor(LoginField::Email)),
                field_style(LoginField::Email),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Password: ", label_style()),
            Span::styled(
                format!("{}{}", "*".repeat(form.password.chars().count()), cursor(LoginField::Password)),
                field_style(LoginField::Password),
            ),
        ]),
        Line::from(""),
    ];

    if let Some(error) = &form.error {
        content.push(Line::from(Span::styled(
            format!("  {}", error),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }

    let panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Sign In "),
    );

    f.render_widget(panel, centered(area, 60, 11));
}

fn render_game_selection(f: &mut Frame, area: Rect, app: &mut App) {
    let header = Row::new(
        ["", "Game", "Candidates"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))),
    )
    .style(Style::default().bg(Color::DarkGray));

    let rows = GameType::ALL.iter().map(|game| {
        let color = accent_color(game.accent());
        Row::new(vec![
            Cell::from(game.icon()),
            Cell::from(game.display_name()).style(Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Cell::from(app.data.candidates_for(*game).len().to_string()),
        ])
    });

    let table = Table::new(
        rows,
        [Constraint::Length(4), Constraint::Length(24), Constraint::Length(12)],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Select a Base Game "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.games_state);
}

fn render_analytics(f: &mut Frame, area: Rect, app: &mut App) {
    let Some(game) = app.dashboard.selected_game else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Filters
            Constraint::Length(4),  // Stat cards
            Constraint::Length(10), // Histogram
            Constraint::Min(0),     // Candidates
        ])
        .split(area);

    let report = AnalyticsReport::build(game, app.data.candidates_for(game), app.dashboard.filter);
    let rows = report.display_rows();

    render_filters(f, chunks[0], &app.dashboard.filter, app.editing, &app.input);
    render_stat_cards(f, chunks[1], &report);
    render_histogram(f, chunks[2], &report, accent_color(game.accent()));

    if app.show_detail {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[3]);

        let selected = app.table_state.selected().and_then(|i| rows.get(i));
        render_detail_panel(f, body[1], selected);
        render_candidates(f, body[0], &rows, &mut app.table_state);
    } else {
        render_candidates(f, chunks[3], &rows, &mut app.table_state);
    }
}

fn render_filters(
    f: &mut Frame,
    area: Rect,
    filter: &AnalyticsFilter,
    editing: Option<FilterField>,
    input: &str,
) {
    let mut spans = Vec::new();
    for field in [FilterField::TimeThreshold, FilterField::ScoreMin, FilterField::ScoreMax] {
        let (value, style) = if editing == Some(field) {
            (
                format!("{}█", input),
                Style::default().fg(Color::Black).bg(Color::Yellow),
            )
        } else {
            (field.get(filter).to_string(), Style::default().fg(Color::White))
        };
        spans.push(Span::styled(format!(" {}: ", field.label()), label_style()));
        spans.push(Span::styled(value, style));
        spans.push(Span::raw("  "));
    }

    let (mark, color) = if filter.show_outliers { ("[x]", Color::Green) } else { ("[ ]", Color::DarkGray) };
    spans.push(Span::styled(" Show Outliers: ", label_style()));
    spans.push(Span::styled(mark, Style::default().fg(color)));

    let panel = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(" Filters "));
    f.render_widget(panel, area);
}

fn render_stat_cards(f: &mut Frame, area: Rect, report: &AnalyticsReport<'_>) {
    let stats = report.statistics.rounded();
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(area);

    let values = [
        ("Mean Score", format!("{:.2}", stats.mean), Color::Blue),
        ("Standard Deviation", format!("{:.2}", stats.std_dev), Color::Magenta),
        ("Total Candidates", stats.count.to_string(), Color::Green),
    ];

    for ((title, value, color), chunk) in values.into_iter().zip(cards.iter()) {
        let card = Paragraph::new(Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(format!(" {} ", title)));
        f.render_widget(card, *chunk);
    }
}

fn render_histogram(f: &mut Frame, area: Rect, report: &AnalyticsReport<'_>, color: Color) {
    let labels: Vec<String> = report
        .histogram
        .iter()
        .map(|bin| format!("{:.0}", bin.mid_point))
        .collect();
    let data: Vec<(&str, u64)> = labels
        .iter()
        .zip(&report.histogram)
        .map(|(label, bin)| (label.as_str(), bin.count as u64))
        .collect();

    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(" Score Distribution "))
        .data(data.as_slice())
        .bar_width(3)
        .bar_gap(1)
        .bar_style(Style::default().fg(color))
        .value_style(Style::default().fg(Color::Black).bg(color));

    f.render_widget(chart, area);
}

fn render_candidates(f: &mut Frame, area: Rect, rows: &[DisplayRow<'_>], state: &mut TableState) {
    let header_cells = ["Candidate", "Score", "Time (s)", "Date", "Status"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let table_rows = rows.iter().map(|row| {
        let record = row.record;
        let (status, style) = if row.is_outlier {
            ("⚠ Outlier", Style::default().fg(Color::Red))
        } else {
            ("", Style::default())
        };
        Row::new(vec![
            Cell::from(truncate(&record.candidate_name, 28)),
            Cell::from(record.score.to_string()),
            Cell::from(record.time_taken.to_string()),
            Cell::from(record.completion_date.format("%Y-%m-%d").to_string()),
            Cell::from(status),
        ])
        .style(style)
    });

    let table = Table::new(
        table_rows,
        [
            Constraint::Length(30),
            Constraint::Length(7),
            Constraint::Length(9),
            Constraint::Length(12),
            Constraint::Length(11),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" Candidate Performance Data ({}) ", rows.len())),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, row: Option<&DisplayRow<'_>>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Candidate Details ");

    let Some(row) = row else {
        f.render_widget(Paragraph::new("No candidate selected").block(block), area);
        return;
    };
    let record = row.record;

    let mut content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Name: ", label_style()),
            Span::raw(record.candidate_name.as_str()),
        ]),
        Line::from(vec![
            Span::styled("  Score: ", label_style()),
            Span::styled(
                record.score.to_string(),
                Style::default().fg(if row.is_outlier { Color::Red } else { Color::Green }),
            ),
        ]),
        Line::from(vec![
            Span::styled("  Time Taken: ", label_style()),
            Span::raw(format!("{}s", record.time_taken)),
        ]),
        Line::from(vec![
            Span::styled("  Completed: ", label_style()),
            Span::raw(record.completion_date.format("%Y-%m-%d %H:%M").to_string()),
        ]),
        Line::from(""),
        Line::from("  ─────────────────────────────"),
        Line::from(Span::styled(
            "  GAME DETAILS",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )),
        Line::from(""),
    ];

    for (label, value) in record.details.fields() {
        content.push(Line::from(vec![
            Span::styled(format!("  {}: ", label), label_style()),
            Span::raw(value),
        ]));
    }

    if row.is_outlier {
        content.push(Line::from(""));
        content.push(Line::from(Span::styled(
            "  ⚠ Outside mean ± 2σ",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }

    content.push(Line::from(""));
    content.push(Line::from(Span::styled(
        "  Press Enter to close",
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )));

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));
    let mut spans = Vec::new();

    if let Some(status) = &app.status {
        spans.push(Span::styled(format!(" {} ", status), Style::default().fg(Color::Cyan)));
        spans.push(Span::raw("| "));
    }

    match app.screen {
        Screen::Loading => spans.push(Span::raw(" Please wait")),
        Screen::Login => {
            spans.extend([key(" Tab"), Span::raw(" Field | "), key("Enter"), Span::raw(" Sign in | "), key("Esc"), Span::raw(" Quit")]);
        }
        Screen::GameSelection => {
            spans.extend([key(" ↑/↓"), Span::raw(" Nav | "), key("Enter"), Span::raw(" Open | "), key("l"), Span::raw(" Logout | "), key("q"), Span::raw(" Quit")]);
        }
        Screen::Analytics if app.editing.is_some() => {
            spans.extend([key(" 0-9"), Span::raw(" Edit | "), key("Tab"), Span::raw(" Next field | "), key("Enter"), Span::raw(" Done")]);
        }
        Screen::Analytics => {
            spans.extend([
                key(" ↑/↓"), Span::raw(" Nav | "),
                key("Enter"), Span::raw(" Details | "),
                key("f"), Span::raw(" Filters | "),
                key("o"), Span::raw(" Outliers | "),
                key("r"), Span::raw(" Reset | "),
                key("b"), Span::raw(" Back | "),
                key("l"), Span::raw(" Logout | "),
                key("q"), Span::raw(" Quit"),
            ]);
        }
    }

    let status_bar = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
