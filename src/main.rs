use std::collections::VecDeque;
use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Row, Table, TableState};

use wc26_bracket::counter::{self, CounterConfig, WinCount};
use wc26_bracket::predictions::{GroupPosition, KnockoutRound, PodiumSlot, PredictionStore};
use wc26_bracket::progress::{
    AutoAdvance, StagePhase, advance_target, stage_complete, stage_unlocked,
};
use wc26_bracket::resolve::{ResolvedMatch, resolve_stage};
use wc26_bracket::schedule::{MatchRecord, Schedule, Stage, TeamSlot};

const LOG_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Schedule,
    Predict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortKey {
    MatchNo,
    Stage,
    Kickoff,
    Location,
}

impl SortKey {
    fn label(self) -> &'static str {
        match self {
            SortKey::MatchNo => "match",
            SortKey::Stage => "stage",
            SortKey::Kickoff => "kickoff",
            SortKey::Location => "venue",
        }
    }

    fn next(self) -> SortKey {
        match self {
            SortKey::MatchNo => SortKey::Stage,
            SortKey::Stage => SortKey::Kickoff,
            SortKey::Kickoff => SortKey::Location,
            SortKey::Location => SortKey::MatchNo,
        }
    }
}

enum CounterEvent {
    Counts(Vec<WinCount>),
    CountsFailed(String),
    Recorded(String),
    RecordFailed(String),
}

struct App {
    schedule: &'static Schedule,
    store: PredictionStore,
    screen: Screen,
    should_quit: bool,

    // Schedule table view.
    sort_key: SortKey,
    sort_desc: bool,
    stage_filter: Option<String>,
    venue_filter: Option<String>,
    search: String,
    search_mode: bool,
    show_ist: bool,
    schedule_cursor: usize,

    // Prediction flow.
    phase: StagePhase,
    group_cursor: usize,
    pos_cursor: usize,
    match_cursor: usize,
    confirm_reset: bool,
    auto: AutoAdvance,

    counter_cfg: CounterConfig,
    counter_tx: mpsc::Sender<CounterEvent>,
    counter_rx: mpsc::Receiver<CounterEvent>,
    win_counts: Vec<WinCount>,
    counts_in_flight: bool,

    help_overlay: bool,
    log: VecDeque<String>,
}

impl App {
    fn new() -> Self {
        let (counter_tx, counter_rx) = mpsc::channel();
        App {
            schedule: Schedule::bundled(),
            store: PredictionStore::open_default(),
            screen: Screen::Schedule,
            should_quit: false,
            sort_key: SortKey::MatchNo,
            sort_desc: false,
            stage_filter: None,
            venue_filter: None,
            search: String::new(),
            search_mode: false,
            show_ist: false,
            schedule_cursor: 0,
            phase: StagePhase::GroupStage,
            group_cursor: 0,
            pos_cursor: 0,
            match_cursor: 0,
            confirm_reset: false,
            auto: AutoAdvance::new(),
            counter_cfg: CounterConfig::from_env(),
            counter_tx,
            counter_rx,
            win_counts: Vec::new(),
            counts_in_flight: false,
            help_overlay: false,
            log: VecDeque::new(),
        }
    }

    fn push_log(&mut self, msg: impl Into<String>) {
        if self.log.len() == LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(msg.into());
    }

    fn last_log(&self) -> &str {
        self.log.back().map(String::as_str).unwrap_or("")
    }

    // ---- schedule view ----

    fn stage_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for m in self.schedule.matches() {
            let label = m.stage.label();
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        labels
    }

    fn venue_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .schedule
            .matches()
            .iter()
            .map(|m| m.location.clone())
            .collect();
        labels.sort();
        labels.dedup();
        labels
    }

    fn filtered_schedule(&self) -> Vec<&MatchRecord> {
        let needle = self.search.to_lowercase();
        let mut rows: Vec<&MatchRecord> = self
            .schedule
            .matches()
            .iter()
            .filter(|m| {
                if let Some(stage) = &self.stage_filter {
                    if m.stage.label() != *stage {
                        return false;
                    }
                }
                if let Some(venue) = &self.venue_filter {
                    if m.location != *venue {
                        return false;
                    }
                }
                if !needle.is_empty() {
                    let haystack = format!(
                        "{} {} {} {}",
                        m.team1.label(),
                        m.team2.label(),
                        m.location,
                        m.stage.label()
                    )
                    .to_lowercase();
                    if !haystack.contains(&needle) {
                        return false;
                    }
                }
                true
            })
            .collect();

        let show_ist = self.show_ist;
        match self.sort_key {
            SortKey::MatchNo => rows.sort_by_key(|m| m.match_no),
            SortKey::Stage => rows.sort_by(|a, b| {
                a.stage
                    .label()
                    .cmp(&b.stage.label())
                    .then(a.match_no.cmp(&b.match_no))
            }),
            SortKey::Kickoff => rows.sort_by(|a, b| {
                let ka = kickoff_sort_key(a, show_ist);
                let kb = kickoff_sort_key(b, show_ist);
                ka.cmp(&kb).then(a.match_no.cmp(&b.match_no))
            }),
            SortKey::Location => rows.sort_by(|a, b| {
                a.location
                    .cmp(&b.location)
                    .then(a.match_no.cmp(&b.match_no))
            }),
        }
        if self.sort_desc {
            rows.reverse();
        }
        rows
    }

    fn clamp_schedule_cursor(&mut self) {
        let len = self.filtered_schedule().len();
        if len == 0 {
            self.schedule_cursor = 0;
        } else if self.schedule_cursor >= len {
            self.schedule_cursor = len - 1;
        }
    }

    fn cycle_stage_filter(&mut self) {
        let labels = self.stage_labels();
        self.stage_filter = cycle_filter(self.stage_filter.take(), &labels);
        self.clamp_schedule_cursor();
    }

    fn cycle_venue_filter(&mut self) {
        let labels = self.venue_labels();
        self.venue_filter = cycle_filter(self.venue_filter.take(), &labels);
        self.clamp_schedule_cursor();
    }

    // ---- prediction flow ----

    fn phase_stage(&self) -> Stage {
        match self.phase {
            StagePhase::GroupStage => Stage::Group('A'),
            StagePhase::RoundOf32 => Stage::RoundOf32,
            StagePhase::RoundOf16 => Stage::RoundOf16,
            StagePhase::Quarterfinals => Stage::Quarterfinals,
            StagePhase::Semifinals => Stage::Semifinals,
            StagePhase::ThirdPlace => Stage::ThirdPlace,
            StagePhase::Final => Stage::Final,
        }
    }

    fn phase_matches(&self) -> Vec<ResolvedMatch> {
        resolve_stage(self.schedule, self.store.state(), self.phase_stage())
    }

    fn selected_group(&self) -> char {
        let letters = self.schedule.group_letters();
        letters.get(self.group_cursor).copied().unwrap_or('A')
    }

    fn go_to_phase(&mut self, phase: StagePhase) {
        if !stage_unlocked(phase, self.store.state()) {
            self.push_log(format!("{} is locked", phase.label()));
            return;
        }
        self.phase = phase;
        self.match_cursor = 0;
        // Manual navigation overrides any pending auto-advance.
        self.auto.cancel();
        if phase == StagePhase::Final {
            self.request_win_counts();
        }
    }

    fn shift_phase(&mut self, forward: bool) {
        let idx = self.phase.index();
        let target = if forward {
            StagePhase::ALL.get(idx + 1).copied()
        } else {
            idx.checked_sub(1).map(|i| StagePhase::ALL[i])
        };
        if let Some(target) = target {
            self.go_to_phase(target);
        }
    }

    fn after_mutation(&mut self) {
        match advance_target(self.phase, self.store.state()) {
            Some(target) => self.auto.arm(target, Instant::now()),
            None => self.auto.cancel(),
        }
    }

    fn cycle_group_slot(&mut self) {
        let group = self.selected_group();
        let position = GroupPosition::ALL[self.pos_cursor];
        let Some(pred) = self.store.state().group_stage.get(&group) else {
            return;
        };
        let current = pred.slot(position).clone();
        let taken: Vec<String> = GroupPosition::ALL
            .iter()
            .filter(|p| **p != position)
            .filter_map(|p| pred.slot(*p).clone())
            .collect();

        let mut options: Vec<Option<String>> = vec![None];
        for team in self.schedule.group_teams(group) {
            if !taken.contains(&team) {
                options.push(Some(team));
            }
        }
        let at = options.iter().position(|o| *o == current).unwrap_or(0);
        let next = options[(at + 1) % options.len()].clone();
        if self
            .store
            .set_group_position(self.schedule, group, position, next)
        {
            self.after_mutation();
        }
    }

    fn swap_group_slot(&mut self, down: bool) {
        let group = self.selected_group();
        let target = if down {
            self.pos_cursor + 1
        } else {
            self.pos_cursor.wrapping_sub(1)
        };
        if target >= GroupPosition::ALL.len() {
            return;
        }
        self.store.swap_group_positions(
            group,
            GroupPosition::ALL[self.pos_cursor],
            GroupPosition::ALL[target],
        );
        self.pos_cursor = target;
        self.after_mutation();
    }

    fn toggle_qualifier(&mut self) {
        let group = self.selected_group();
        let Some(team) = self
            .store
            .state()
            .group_stage
            .get(&group)
            .and_then(|p| p.third.clone())
        else {
            self.push_log(format!("Pick a 3rd place for Group {group} first"));
            return;
        };
        let mut qualifiers = self.store.state().third_place_qualifiers.clone();
        if let Some(at) = qualifiers.iter().position(|t| *t == team) {
            qualifiers.remove(at);
            self.push_log(format!("{team} removed from qualifiers"));
        } else if qualifiers.len() < 8 {
            qualifiers.push(team.clone());
            self.push_log(format!("{team} added as qualifier"));
        } else {
            self.push_log("Already 8 qualifiers picked");
            return;
        }
        self.store.set_third_place_qualifiers(qualifiers);
        self.after_mutation();
    }

    fn pick_winner(&mut self, first: bool) {
        let matches = self.phase_matches();
        let Some(m) = matches.get(self.match_cursor) else {
            return;
        };
        let pick = if first { &m.team1 } else { &m.team2 };
        let Some(team) = pick.clone() else {
            self.push_log("That side is not resolved yet");
            return;
        };
        match self.phase {
            StagePhase::RoundOf32 => {
                self.store
                    .set_match_winner(KnockoutRound::RoundOf32, m.match_no, team)
            }
            StagePhase::RoundOf16 => {
                self.store
                    .set_match_winner(KnockoutRound::RoundOf16, m.match_no, team)
            }
            StagePhase::Quarterfinals => {
                self.store
                    .set_match_winner(KnockoutRound::Quarterfinals, m.match_no, team)
            }
            StagePhase::Semifinals => {
                self.store
                    .set_match_winner(KnockoutRound::Semifinals, m.match_no, team)
            }
            StagePhase::ThirdPlace => self.store.set_podium(PodiumSlot::ThirdPlace, team),
            StagePhase::Final => {
                self.store.set_podium(PodiumSlot::Final, team.clone());
                self.record_champion_pick(team);
            }
            StagePhase::GroupStage => return,
        }
        self.after_mutation();
    }

    fn request_win_counts(&mut self) {
        if self.counts_in_flight {
            return;
        }
        self.counts_in_flight = true;
        let cfg = self.counter_cfg.clone();
        let tx = self.counter_tx.clone();
        thread::spawn(move || {
            let event = match counter::fetch_win_counts(&cfg) {
                Ok(counts) => CounterEvent::Counts(counts),
                Err(err) => CounterEvent::CountsFailed(err.to_string()),
            };
            let _ = tx.send(event);
        });
    }

    fn record_champion_pick(&mut self, team: String) {
        let cfg = self.counter_cfg.clone();
        let tx = self.counter_tx.clone();
        thread::spawn(move || {
            let event = match counter::record_champion_pick(&cfg, &team) {
                Ok(()) => CounterEvent::Recorded(team),
                Err(err) => CounterEvent::RecordFailed(err.to_string()),
            };
            let _ = tx.send(event);
        });
    }

    fn drain_counter_events(&mut self) {
        while let Ok(event) = self.counter_rx.try_recv() {
            match event {
                CounterEvent::Counts(counts) => {
                    self.counts_in_flight = false;
                    self.push_log(format!("Loaded pick counts for {} teams", counts.len()));
                    self.win_counts = counts;
                }
                CounterEvent::CountsFailed(err) => {
                    self.counts_in_flight = false;
                    self.push_log(format!("[WARN] Pick counts unavailable: {err}"));
                }
                CounterEvent::Recorded(team) => {
                    self.push_log(format!("Champion pick {team} recorded"));
                    // Pull fresh counts so the displayed share includes
                    // the pick that was just recorded.
                    self.request_win_counts();
                }
                CounterEvent::RecordFailed(err) => {
                    self.push_log(format!("[WARN] Champion pick not recorded: {err}"));
                }
            }
        }
    }

    fn tick(&mut self) {
        self.drain_counter_events();
        if let Some(target) = self.auto.poll(Instant::now()) {
            if self.screen == Screen::Predict && stage_unlocked(target, self.store.state()) {
                self.phase = target;
                self.match_cursor = 0;
                self.push_log(format!("Advanced to {}", target.label()));
                if target == StagePhase::Final {
                    self.request_win_counts();
                }
            }
        }
    }

    // ---- input ----

    fn on_key(&mut self, key: KeyEvent) {
        if self.confirm_reset {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.store.reset();
                    self.phase = StagePhase::GroupStage;
                    self.group_cursor = 0;
                    self.pos_cursor = 0;
                    self.match_cursor = 0;
                    self.auto.cancel();
                    self.confirm_reset = false;
                    self.push_log("All predictions reset");
                }
                _ => self.confirm_reset = false,
            }
            return;
        }
        if self.search_mode {
            match key.code {
                KeyCode::Esc | KeyCode::Enter => self.search_mode = false,
                KeyCode::Backspace => {
                    self.search.pop();
                    self.clamp_schedule_cursor();
                }
                KeyCode::Char(c) => {
                    self.search.push(c);
                    self.clamp_schedule_cursor();
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.help_overlay = !self.help_overlay,
            KeyCode::Tab => {
                self.screen = match self.screen {
                    Screen::Schedule => Screen::Predict,
                    Screen::Predict => Screen::Schedule,
                };
            }
            _ => match self.screen {
                Screen::Schedule => self.on_schedule_key(key),
                Screen::Predict => self.on_predict_key(key),
            },
        }
    }

    fn on_schedule_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                let len = self.filtered_schedule().len();
                if len > 0 && self.schedule_cursor + 1 < len {
                    self.schedule_cursor += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.schedule_cursor = self.schedule_cursor.saturating_sub(1);
            }
            KeyCode::Char('s') => {
                self.sort_key = self.sort_key.next();
                self.push_log(format!("Sorting by {}", self.sort_key.label()));
            }
            KeyCode::Char('r') => self.sort_desc = !self.sort_desc,
            KeyCode::Char('f') => self.cycle_stage_filter(),
            KeyCode::Char('v') => self.cycle_venue_filter(),
            KeyCode::Char('t') => self.show_ist = !self.show_ist,
            KeyCode::Char('/') => self.search_mode = true,
            KeyCode::Char('c') => {
                self.stage_filter = None;
                self.venue_filter = None;
                self.search.clear();
                self.sort_key = SortKey::MatchNo;
                self.sort_desc = false;
                self.schedule_cursor = 0;
            }
            _ => {}
        }
    }

    fn on_predict_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left => {
                self.shift_phase(false);
                return;
            }
            KeyCode::Right => {
                self.shift_phase(true);
                return;
            }
            KeyCode::Char('R') => {
                self.confirm_reset = true;
                return;
            }
            _ => {}
        }
        if self.phase == StagePhase::GroupStage {
            match key.code {
                KeyCode::Char('j') | KeyCode::Down => {
                    let len = self.schedule.group_letters().len();
                    if len > 0 && self.group_cursor + 1 < len {
                        self.group_cursor += 1;
                    }
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    self.group_cursor = self.group_cursor.saturating_sub(1);
                }
                KeyCode::Char('h') => self.pos_cursor = self.pos_cursor.saturating_sub(1),
                KeyCode::Char('l') => {
                    if self.pos_cursor + 1 < GroupPosition::ALL.len() {
                        self.pos_cursor += 1;
                    }
                }
                KeyCode::Enter => self.cycle_group_slot(),
                KeyCode::Char('J') => self.swap_group_slot(true),
                KeyCode::Char('K') => self.swap_group_slot(false),
                KeyCode::Char('x') => self.toggle_qualifier(),
                _ => {}
            }
        } else {
            match key.code {
                KeyCode::Char('j') | KeyCode::Down => {
                    let len = self.phase_matches().len();
                    if len > 0 && self.match_cursor + 1 < len {
                        self.match_cursor += 1;
                    }
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    self.match_cursor = self.match_cursor.saturating_sub(1);
                }
                KeyCode::Char('1') => self.pick_winner(true),
                KeyCode::Char('2') => self.pick_winner(false),
                _ => {}
            }
        }
    }
}

fn cycle_filter(current: Option<String>, labels: &[String]) -> Option<String> {
    match current {
        None => labels.first().cloned(),
        Some(value) => labels
            .iter()
            .position(|l| *l == value)
            .and_then(|i| labels.get(i + 1))
            .cloned(),
    }
}

fn kickoff_sort_key(m: &MatchRecord, show_ist: bool) -> (i64, String) {
    let raw = if show_ist {
        if m.kickoff_ist.is_empty() {
            &m.kickoff_edt
        } else {
            &m.kickoff_ist
        }
    } else if m.kickoff_edt.is_empty() {
        &m.kickoff_ist
    } else {
        &m.kickoff_edt
    };
    let ts = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M")
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(i64::MAX);
    (ts, raw.clone())
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new();
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        app.tick();

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
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.size());

    let tabs = match app.screen {
        Screen::Schedule => "[Schedule]  Predict ",
        Screen::Predict => " Schedule  [Predict]",
    };
    let header = Paragraph::new(format!("WC26 BRACKET | {tabs} | Tab to switch"))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.screen {
        Screen::Schedule => render_schedule(frame, chunks[1], app),
        Screen::Predict => render_predict(frame, chunks[1], app),
    }

    let footer = Paragraph::new(format!("{}\n{}", footer_text(app), app.last_log()))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if app.confirm_reset {
        render_confirm_reset(frame, frame.size());
    }
    if app.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn footer_text(app: &App) -> String {
    if app.search_mode {
        return format!("Search: {}_  (Enter/Esc done)", app.search);
    }
    match app.screen {
        Screen::Schedule => {
            "j/k Move | s Sort | r Reverse | f Stage | v Venue | t EDT/IST | / Search | c Clear | ? Help | q Quit"
                .to_string()
        }
        Screen::Predict => match app.phase {
            StagePhase::GroupStage => {
                "j/k Group | h/l Position | Enter Cycle team | J/K Swap | x Qualifier | ←/→ Stage | R Reset | q Quit"
                    .to_string()
            }
            _ => "j/k Move | 1/2 Pick winner | ←/→ Stage | R Reset | ? Help | q Quit".to_string(),
        },
    }
}

fn render_schedule(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let filters = format!(
        "Sort: {}{} | Stage: {} | Venue: {} | TZ: {} | Search: {}",
        app.sort_key.label(),
        if app.sort_desc { " desc" } else { "" },
        app.stage_filter.as_deref().unwrap_or("all"),
        app.venue_filter.as_deref().unwrap_or("all"),
        if app.show_ist { "IST" } else { "EDT" },
        if app.search.is_empty() {
            "-"
        } else {
            app.search.as_str()
        },
    );
    frame.render_widget(
        Paragraph::new(filters).style(Style::default().fg(Color::DarkGray)),
        sections[0],
    );

    let rows_data = app.filtered_schedule();
    if rows_data.is_empty() {
        let empty = Paragraph::new("No matches for this filter")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, sections[1]);
        return;
    }

    let rows: Vec<Row> = rows_data
        .iter()
        .map(|m| {
            let kickoff = if app.show_ist {
                &m.kickoff_ist
            } else {
                &m.kickoff_edt
            };
            Row::new(vec![
                m.match_no.to_string(),
                m.stage.label(),
                m.team1.label(),
                m.team2.label(),
                m.location.clone(),
                kickoff.clone(),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(14),
            Constraint::Length(16),
            Constraint::Length(16),
            Constraint::Length(20),
            Constraint::Length(17),
        ],
    )
    .header(
        Row::new(vec!["No", "Stage", "Team 1", "Team 2", "Venue", "Kickoff"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .highlight_style(Style::default().bg(Color::DarkGray));

    let mut table_state = TableState::default();
    table_state.select(Some(app.schedule_cursor.min(rows_data.len() - 1)));
    frame.render_stateful_widget(table, sections[1], &mut table_state);
}

fn render_predict(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(area);

    render_phase_tabs(frame, sections[0], app);

    match app.phase {
        StagePhase::GroupStage => render_group_stage(frame, sections[1], app),
        _ => render_knockout(frame, sections[1], app),
    }
}

fn render_phase_tabs(frame: &mut Frame, area: Rect, app: &App) {
    let state = app.store.state();
    let mut spans: Vec<Span> = Vec::new();
    for phase in StagePhase::ALL {
        let unlocked = stage_unlocked(phase, state);
        let complete = stage_complete(phase, state);
        let marker = if complete {
            "+"
        } else if unlocked {
            " "
        } else {
            "x"
        };
        let label = format!(" {}{} ", marker, phase.label());
        let style = if phase == app.phase {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else if !unlocked {
            Style::default().fg(Color::DarkGray)
        } else if complete {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw("|"));
    }
    spans.pop();
    frame.render_widget(
        Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::BOTTOM)),
        area,
    );
}

fn render_group_stage(frame: &mut Frame, area: Rect, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(34)])
        .split(area);

    let state = app.store.state();
    let letters = app.schedule.group_letters();

    let rows: Vec<Row> = letters
        .iter()
        .enumerate()
        .map(|(i, g)| {
            let pred = state.group_stage.get(g);
            let cell = |pos: GroupPosition| -> String {
                let name = pred
                    .and_then(|p| p.slot(pos).clone())
                    .unwrap_or_else(|| "-".to_string());
                if i == app.group_cursor && GroupPosition::ALL[app.pos_cursor] == pos {
                    format!(">{name}")
                } else {
                    name
                }
            };
            Row::new(vec![
                format!("Group {g}"),
                cell(GroupPosition::First),
                cell(GroupPosition::Second),
                cell(GroupPosition::Third),
                cell(GroupPosition::Fourth),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(15),
            Constraint::Length(15),
            Constraint::Length(15),
            Constraint::Length(15),
        ],
    )
    .header(
        Row::new(vec!["", "1st", "2nd", "3rd", "4th"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .highlight_style(Style::default().bg(Color::DarkGray));

    let mut table_state = TableState::default();
    table_state.select(Some(app.group_cursor.min(letters.len().saturating_sub(1))));
    frame.render_stateful_widget(table, columns[0], &mut table_state);

    // The ordered qualifier list maps straight onto the fixed third-place
    // ranking codes, so position in this panel is the qualifier rank.
    let mut lines = vec![Line::from(Span::styled(
        format!(
            "3rd-place qualifiers ({}/8)",
            state.third_place_qualifiers.len()
        ),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    for (rank, team) in state.third_place_qualifiers.iter().enumerate() {
        lines.push(Line::from(format!("{}. {}", rank + 1, team)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "x toggles the selected group's 3rd",
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::LEFT)),
        columns[1],
    );
}

fn render_knockout(frame: &mut Frame, area: Rect, app: &App) {
    let matches = app.phase_matches();
    if matches.is_empty() {
        frame.render_widget(
            Paragraph::new("No matches in this stage")
                .style(Style::default().fg(Color::DarkGray)),
            area,
        );
        return;
    }

    let state = app.store.state();
    let rows: Vec<Row> = matches
        .iter()
        .map(|m| {
            let side = |team: &Option<String>, slot: &TeamSlot| -> String {
                match team {
                    Some(name) => name.clone(),
                    None => format!("({})", slot.label()),
                }
            };
            let winner = state.match_winner(m.match_no).unwrap_or("-").to_string();
            Row::new(vec![
                format!("M{}", m.match_no),
                side(&m.team1, &m.slot1),
                side(&m.team2, &m.slot2),
                winner,
                m.location.clone(),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(18),
            Constraint::Length(18),
            Constraint::Length(18),
            Constraint::Length(20),
        ],
    )
    .header(
        Row::new(vec!["", "Team 1", "Team 2", "Winner", "Venue"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .highlight_style(Style::default().bg(Color::DarkGray));

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    let mut table_state = TableState::default();
    table_state.select(Some(app.match_cursor.min(matches.len() - 1)));
    frame.render_stateful_widget(table, sections[0], &mut table_state);

    let status = champion_status(app);
    frame.render_widget(
        Paragraph::new(status).style(Style::default().fg(Color::DarkGray)),
        sections[1],
    );
}

fn champion_status(app: &App) -> String {
    if app.phase != StagePhase::Final {
        return String::new();
    }
    let Some(champion) = app.store.state().final_winner.as_deref() else {
        return "Pick your champion with 1/2".to_string();
    };
    match counter::win_percentage(&app.win_counts, champion) {
        Some(pct) => format!("Champion: {champion} | picked by {pct:.0}% of players"),
        None => format!("Champion: {champion}"),
    }
}

fn render_confirm_reset(frame: &mut Frame, area: Rect) {
    let popup = centered_rect(44, 5, area);
    frame.render_widget(Clear, popup);
    let body = Paragraph::new("Reset all predictions?\n\ny confirm | any other key cancel")
        .block(Block::default().borders(Borders::ALL).title(" Reset "));
    frame.render_widget(body, popup);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup = centered_rect(62, 16, area);
    frame.render_widget(Clear, popup);
    let text = "Schedule\n\
        j/k move  s sort column  r reverse  f stage filter\n\
        v venue filter  t EDT/IST  / search  c clear\n\
        \n\
        Predict\n\
        Left/Right stage tabs (locked stages need the previous one done)\n\
        Group stage: j/k group, h/l position, Enter cycle team,\n\
        J/K swap positions, x toggle 3rd-place qualifier\n\
        Knockouts: j/k match, 1 pick team 1, 2 pick team 2\n\
        R reset everything\n\
        \n\
        Tab switch screens  ? close help  q quit";
    let body = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title(" Help "));
    frame.render_widget(body, popup);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}
