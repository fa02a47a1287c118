//! Terminal presentation.
//!
//! Draw functions only: everything here reads session snapshots and
//! renderer-local cursor state, and never mutates the core. Key handling
//! lives in `main.rs`.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};
use tui_textarea::TextArea;

use std::time::Instant;

use crate::config::Config;
use crate::session::wheel::REVEAL_DELAY;
use crate::session::{Machine, Step, Surprise};

const ACCENT: Color = Color::Magenta;
const DIM: Color = Color::DarkGray;

/// Renderer-local state: cursors, the code input and the cosmetic spin
/// angle. None of this is game state; discarding it loses nothing.
pub struct UiState<'a> {
    pub menu: usize,
    pub game_cursor: usize,
    pub room_cursor: usize,
    pub option_cursor: usize,
    pub code_input: TextArea<'a>,
    pub muted: bool,
    /// Where inside the winning segment the pointer lands, 0..1. Random
    /// per spin, purely cosmetic; the prize is decided before this is.
    pub spin_jitter: f64,
    /// When the current spin started, for the settling countdown.
    pub spin_started: Option<Instant>,
    pub status: Option<String>,
}

impl UiState<'_> {
    pub fn new() -> Self {
        let mut code_input = TextArea::default();
        code_input.set_block(Block::default().borders(Borders::ALL).title(" Secret Code "));
        code_input.set_placeholder_text("type the secret code...");
        Self {
            menu: 0,
            game_cursor: 0,
            room_cursor: 0,
            option_cursor: 0,
            code_input,
            muted: false,
            spin_jitter: 0.0,
            spin_started: None,
            status: None,
        }
    }

    pub fn reset_game_view(&mut self) {
        self.room_cursor = 0;
        self.option_cursor = 0;
        self.spin_started = None;
        self.status = None;
        self.code_input.select_all();
        self.code_input.cut();
    }
}

pub fn draw(f: &mut Frame, app: &Surprise, config: &Config, ui: &UiState) {
    match app.step() {
        Step::Intro => draw_intro(f, ui),
        Step::Selection => match app.session().active() {
            None => draw_selection(f, app, config, ui),
            Some(active) => match &active.machine {
                Machine::Escape(_) => draw_escape(f, app, ui),
                Machine::Wheel(_) => draw_wheel(f, app, ui),
                Machine::Simple(_) => draw_simple(f, app),
            },
        },
        Step::Final => draw_final(f, config),
    }
}

fn draw_intro(f: &mut Frame, ui: &UiState) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
        ])
        .split(area);

    let title_art = r#"
   _____ __  ______  ____  ____  ________ ______
  / ___// / / / __ \/ __ \/ __ \/  _/ ___// ____/
  \__ \/ / / / /_/ / /_/ / /_/ // / \__ \/ __/
 ___/ / /_/ / _, _/ ____/ _, _// / ___/ / /___
/____/\____/_/ |_/_/   /_/ |_/___//____/_____/

        a little quest, made for you
"#;
    let title = Paragraph::new(title_art)
        .style(Style::default().fg(ACCENT))
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let open = menu_item("  OPEN YOUR SURPRISE  ", ui.menu == 0);
    f.render_widget(open, chunks[1]);
    let quit = menu_item("  QUIT  ", ui.menu == 1);
    f.render_widget(quit, chunks[2]);

    let help = Paragraph::new("up/down to select  -  ENTER to confirm  -  q to quit")
        .style(Style::default().fg(DIM))
        .alignment(Alignment::Center);
    f.render_widget(help, chunks[3]);
}

fn menu_item(label: &str, selected: bool) -> Paragraph<'_> {
    let style = if selected {
        Style::default()
            .fg(Color::Black)
            .bg(ACCENT)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    Paragraph::new(label).style(style).alignment(Alignment::Center)
}

fn header(f: &mut Frame, app: &Surprise, config: &Config, area: Rect) {
    let pack = app.session().pack();
    let status = Line::from(vec![
        Span::styled(
            " SURPRISE QUEST ",
            Style::default().fg(Color::Black).bg(ACCENT),
        ),
        Span::raw("  "),
        Span::styled(
            format!(" {} ", pack.title),
            Style::default().fg(Color::White).bg(Color::DarkGray),
        ),
        Span::raw("  "),
        Span::styled(
            format!("For: {}  -  By: {}", config.to, config.from),
            Style::default().fg(ACCENT),
        ),
    ]);
    let block = Paragraph::new(status).block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(block, area);
}

fn draw_selection(f: &mut Frame, app: &Surprise, config: &Config, ui: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(f.area());

    header(f, app, config, chunks[0]);

    let session = app.session();
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Your Progress "))
        .gauge_style(Style::default().fg(ACCENT))
        .ratio(session.progress_fraction())
        .label(format!(
            "{} / {} games",
            session.completed().len(),
            session.pack().len()
        ));
    f.render_widget(gauge, chunks[1]);

    let mut lines: Vec<Line> = vec![Line::from(Span::styled(
        "Choose a mini-game",
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
    ))];
    lines.push(Line::default());
    for (i, game) in session.pack().games.iter().enumerate() {
        let done = session.is_completed(&game.meta.id);
        let marker = if done { "[x]" } else { "[ ]" };
        let style = if i == ui.game_cursor {
            Style::default().fg(Color::Black).bg(ACCENT)
        } else if done {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::from(Span::styled(
            format!(" {marker} {}  -  {} ", game.meta.title, game.meta.tagline),
            style,
        )));
    }
    if app.finale_pending() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "All done! Getting your surprise ready...",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
    }
    let list = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Games "))
        .wrap(Wrap { trim: false });
    f.render_widget(list, chunks[2]);

    footer(f, ui, "up/down select  -  ENTER play  -  q quit", chunks[3]);
}

fn draw_escape(f: &mut Frame, app: &Surprise, ui: &UiState) {
    let Some(chain) = app.escape() else { return };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(4),
        ])
        .split(f.area());

    let title = Paragraph::new(Line::from(vec![
        Span::styled(" ESCAPE ROOM ", Style::default().fg(Color::Black).bg(ACCENT)),
        Span::raw("  "),
        Span::styled(
            format!(
                "Found clues: {}/{}",
                chain.clue_log().len(),
                chain.rooms().len()
            ),
            Style::default().fg(ACCENT),
        ),
    ]))
    .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(title, chunks[0]);

    if chain.all_solved() {
        draw_final_code(f, chain, ui, chunks[1]);
    } else if let Some(room) = chain.open_room() {
        draw_puzzle(f, chain, room, ui, chunks[1]);
    } else {
        draw_room_list(f, chain, ui, chunks[1]);
    }

    let mut clue_lines: Vec<Line> = chain
        .clue_log()
        .iter()
        .map(|clue| Line::from(Span::styled(format!("* {clue}"), Style::default().fg(DIM))))
        .collect();
    if clue_lines.is_empty() {
        clue_lines.push(Line::from(Span::styled(
            "No clues found yet.",
            Style::default().fg(DIM),
        )));
    }
    let clues = Paragraph::new(clue_lines)
        .block(Block::default().borders(Borders::ALL).title(" Clues "))
        .wrap(Wrap { trim: false });
    f.render_widget(clues, chunks[2]);
}

fn draw_room_list(f: &mut Frame, chain: &crate::session::PuzzleChain, ui: &UiState, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();
    for (i, room) in chain.rooms().iter().enumerate() {
        let unlocked = chain.is_unlocked(&room.id);
        let solved = chain.is_solved(&room.id);
        let state = if solved {
            "solved"
        } else if unlocked {
            "open"
        } else {
            "locked"
        };
        let style = if i == ui.room_cursor {
            Style::default().fg(Color::Black).bg(ACCENT)
        } else if solved {
            Style::default().fg(Color::Green)
        } else if unlocked {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(DIM)
        };
        lines.push(Line::from(Span::styled(
            format!(" {} {}  [{state}]  {} ", room.emoji, room.name, room.description),
            style,
        )));
    }
    let list = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Unlock every room  -  ENTER to enter, ESC to leave the game "),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(list, area);
}

fn draw_puzzle(
    f: &mut Frame,
    chain: &crate::session::PuzzleChain,
    room: &crate::pack::types::RoomDef,
    ui: &UiState,
    area: Rect,
) {
    let mut lines = vec![
        Line::from(Span::styled(
            format!("{} {}", room.emoji, room.name),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::raw(room.puzzle.question.clone())),
        Line::default(),
    ];
    if chain.wrong_banner(&room.id) {
        lines.push(Line::from(Span::styled(
            "Not quite right... try again!",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::default());
    }
    for (i, option) in room.puzzle.options.iter().enumerate() {
        let style = if i == ui.option_cursor {
            Style::default().fg(Color::Black).bg(ACCENT)
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::from(Span::styled(format!("  {option}  "), style)));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        format!("Hint: {}", room.puzzle.hint),
        Style::default().fg(Color::Yellow),
    )));
    let puzzle = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" ENTER answer  -  ESC back to rooms "),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(puzzle, area);
}

fn draw_final_code(f: &mut Frame, chain: &crate::session::PuzzleChain, ui: &UiState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(2),
        ])
        .split(area);

    let headline = if chain.finished() {
        "Unlocked! One moment..."
    } else {
        "All rooms unlocked! Enter the secret code."
    };
    let mut lines = vec![Line::from(Span::styled(
        headline,
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
    ))];
    if chain.code_rejected() {
        lines.push(Line::from(Span::styled(
            "That's not it... try again.",
            Style::default().fg(Color::Red),
        )));
    }
    let head = Paragraph::new(lines).wrap(Wrap { trim: false });
    f.render_widget(head, chunks[0]);

    f.render_widget(&ui.code_input, chunks[1]);

    let hint = Paragraph::new(format!("Hint: {}", chain.code_hint()))
        .style(Style::default().fg(Color::Yellow))
        .wrap(Wrap { trim: false });
    f.render_widget(hint, chunks[2]);
}

fn draw_wheel(f: &mut Frame, app: &Surprise, ui: &UiState) {
    let Some(wheel) = app.wheel() else { return };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(f.area());

    let title = Paragraph::new(Line::from(vec![
        Span::styled(" SPIN THE WHEEL ", Style::default().fg(Color::Black).bg(ACCENT)),
        Span::raw("  "),
        Span::styled(
            format!("Spin {}/{}", wheel.spins_used(), wheel.total_spins()),
            Style::default().fg(ACCENT),
        ),
        Span::raw("  "),
        Span::styled(
            if ui.muted { "[muted]" } else { "[sound on]" },
            Style::default().fg(DIM),
        ),
    ]))
    .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(title, chunks[0]);

    let mut lines: Vec<Line> = Vec::new();
    if wheel.spinning() {
        lines.push(Line::from(Span::styled(
            "The wheel is spinning...",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // 3-2-1 while the wheel settles. Cosmetic; the reveal itself is
        // driven by the session's timer.
        let remaining = ui
            .spin_started
            .map(|at| REVEAL_DELAY.saturating_sub(at.elapsed()))
            .unwrap_or_default();
        let count = remaining.as_secs().min(3);
        let countdown = if count > 0 {
            format!("{count}...")
        } else {
            "!".to_string()
        };
        lines.push(Line::from(Span::styled(
            countdown,
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::default());
    } else if let Some(prize) = wheel.last_revealed() {
        let segment = 360.0 / wheel.total_spins() as f64;
        let angle = (prize.ordinal as f64 - 1.0 + ui.spin_jitter) * segment;
        lines.push(Line::from(Span::styled(
            format!("{} {}", prize.emoji, prize.title),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )));
        if let Some(message) = &prize.message {
            lines.push(Line::from(Span::raw(message.clone())));
        }
        lines.push(Line::from(Span::styled(
            format!("(the pointer settled at {angle:.0} degrees)"),
            Style::default().fg(DIM),
        )));
        lines.push(Line::from(Span::styled(
            format!("[ENTER] {}", prize.button),
            Style::default().fg(Color::Yellow),
        )));
        lines.push(Line::default());
    }
    for (i, prize) in wheel.prizes().iter().enumerate() {
        let revealed = i < wheel.spins_used();
        let text = if revealed {
            format!(" {}. {} {} ", prize.ordinal, prize.emoji, prize.title)
        } else {
            format!(" {}. ??? ", prize.ordinal)
        };
        lines.push(Line::from(Span::styled(
            text,
            if revealed {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(DIM)
            },
        )));
    }
    if wheel.celebrating() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "*  .  *  CONGRATULATIONS  *  .  *",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
    }
    let body = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Wheel of Surprises "))
        .wrap(Wrap { trim: false });
    f.render_widget(body, chunks[1]);

    footer(
        f,
        ui,
        "SPACE spin  -  ENTER dismiss prize  -  m mute  -  ESC back",
        chunks[2],
    );
}

fn draw_simple(f: &mut Frame, app: &Surprise) {
    let Some(simple) = app.simple() else { return };
    let block = Paragraph::new(vec![
        Line::from(Span::styled(
            simple.prompt().to_string(),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::raw(simple.message().to_string())),
        Line::default(),
        Line::from(Span::styled(
            "[ENTER] done  -  ESC back",
            Style::default().fg(DIM),
        )),
    ])
    .block(Block::default().borders(Borders::ALL))
    .wrap(Wrap { trim: false });
    f.render_widget(block, f.area());
}

fn draw_final(f: &mut Frame, config: &Config) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(2)])
        .split(f.area());

    let mut lines = vec![
        Line::default(),
        Line::from(Span::styled(
            format!("This is it, {}.", config.to),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::raw(
            "You solved every puzzle and unwrapped every prize.",
        )),
        Line::from(Span::raw(format!(
            "This whole little quest was built just for you, with love, by {}.",
            config.from
        ))),
    ];
    if let Some(photo) = &config.photo {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            format!("(there's a photo waiting for you: {photo})"),
            Style::default().fg(Color::Yellow),
        )));
    }
    let body = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Your Surprise "))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false });
    f.render_widget(body, chunks[0]);

    let help = Paragraph::new("q to close")
        .style(Style::default().fg(DIM))
        .alignment(Alignment::Center);
    f.render_widget(help, chunks[1]);
}

fn footer(f: &mut Frame, ui: &UiState, keys: &str, area: Rect) {
    let text = match &ui.status {
        Some(status) => Line::from(Span::styled(
            status.clone(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled(keys.to_string(), Style::default().fg(DIM))),
    };
    let bar = Paragraph::new(text).block(Block::default().borders(Borders::TOP));
    f.render_widget(bar, area);
}
