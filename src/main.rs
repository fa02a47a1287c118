mod audio;
mod config;
mod pack;
mod session;
mod ui;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use rand::Rng;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use audio::BellEmitter;
use config::{Config, DEFAULT_PACK, USAGE};
use pack::{Catalog, Personalization};
use session::{Machine, SessionError, Step, Surprise};
use ui::UiState;

enum Flow {
    Continue,
    Quit,
}

fn main() -> Result<()> {
    // Logging is opt-in via RUST_LOG and shares the terminal with the
    // TUI, so redirect stderr somewhere when turning it on.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match Config::resolve() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}\n\n{USAGE}");
            std::process::exit(2);
        }
    };
    tracing::info!(?config, "starting");

    let names = Personalization {
        to: config.to.clone(),
        from: config.from.clone(),
    };
    let catalog = Catalog::load(&config.packs_dir, &names)
        .with_context(|| format!("loading packs from {}", config.packs_dir.display()))?;
    let pack = catalog
        .pack_or_default(&config.pack, DEFAULT_PACK)
        .cloned()
        .context("content directory holds no packs, not even the default one")?;

    let mut app = Surprise::new(pack, Box::new(BellEmitter::default()));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app, &config);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    if matches!(app.step(), Step::Final) {
        println!(
            "\nThe surprise is yours, {}. With love, {}.\n",
            config.to, config.from
        );
    }

    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut Surprise,
    config: &Config,
) -> Result<()> {
    let mut ui = UiState::new();

    loop {
        terminal.draw(|f| ui::draw(f, app, config, &ui))?;

        // Sleep no longer than the next pending timer needs; the 250ms
        // cap keeps the spin countdown ticking on screen.
        let timeout = app
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::from_millis(250))
            .min(Duration::from_millis(250));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if let Flow::Quit = handle_key(app, &mut ui, key) {
                    break;
                }
            }
        }

        app.tick(Instant::now());
    }

    Ok(())
}

fn handle_key(app: &mut Surprise, ui: &mut UiState, key: KeyEvent) -> Flow {
    ui.status = None;

    match app.step() {
        Step::Intro => intro_keys(app, ui, key),
        Step::Selection => match app.session().active().map(|a| kind_of(&a.machine)) {
            None => selection_keys(app, ui, key),
            Some(ActiveKind::Escape) => escape_keys(app, ui, key),
            Some(ActiveKind::Wheel) => wheel_keys(app, ui, key),
            Some(ActiveKind::Simple) => simple_keys(app, ui, key),
        },
        Step::Final => match key.code {
            KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => Flow::Quit,
            _ => Flow::Continue,
        },
    }
}

#[derive(Clone, Copy)]
enum ActiveKind {
    Escape,
    Wheel,
    Simple,
}

fn kind_of(machine: &Machine) -> ActiveKind {
    match machine {
        Machine::Escape(_) => ActiveKind::Escape,
        Machine::Wheel(_) => ActiveKind::Wheel,
        Machine::Simple(_) => ActiveKind::Simple,
    }
}

fn intro_keys(app: &mut Surprise, ui: &mut UiState, key: KeyEvent) -> Flow {
    match key.code {
        KeyCode::Up | KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('k') => {
            ui.menu = 1 - ui.menu;
        }
        KeyCode::Enter => {
            if ui.menu == 0 {
                report(ui, app.advance_from_intro());
            } else {
                return Flow::Quit;
            }
        }
        KeyCode::Char('q') => return Flow::Quit,
        _ => {}
    }
    Flow::Continue
}

fn selection_keys(app: &mut Surprise, ui: &mut UiState, key: KeyEvent) -> Flow {
    let count = app.session().pack().len();
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            ui.game_cursor = ui.game_cursor.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            ui.game_cursor = (ui.game_cursor + 1).min(count - 1);
        }
        KeyCode::Enter => {
            let id = app.session().pack().games[ui.game_cursor].meta.id.clone();
            if report(ui, app.select_game(&id)) {
                ui.reset_game_view();
            }
        }
        KeyCode::Char('q') => return Flow::Quit,
        _ => {}
    }
    Flow::Continue
}

fn escape_keys(app: &mut Surprise, ui: &mut UiState, key: KeyEvent) -> Flow {
    // Snapshot what the handler needs before taking &mut app.
    let (all_solved, finished, open, room_ids) = {
        let Some(chain) = app.escape() else {
            return Flow::Continue;
        };
        (
            chain.all_solved(),
            chain.finished(),
            chain
                .open_room()
                .map(|room| (room.id.clone(), room.puzzle.options.len())),
            chain
                .rooms()
                .iter()
                .map(|room| room.id.clone())
                .collect::<Vec<_>>(),
        )
    };

    if all_solved {
        // Final-code phase: the text box owns most keys.
        if finished {
            return Flow::Continue;
        }
        match key.code {
            KeyCode::Enter => {
                let code = ui.code_input.lines().first().cloned().unwrap_or_default();
                report(ui, app.submit_final_code(&code));
            }
            KeyCode::Esc => {
                app.deselect_game();
                ui.reset_game_view();
            }
            _ => {
                ui.code_input.input(key);
            }
        }
        return Flow::Continue;
    }

    if let Some((room_id, options)) = open {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                ui.option_cursor = ui.option_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                ui.option_cursor = (ui.option_cursor + 1).min(options - 1);
            }
            KeyCode::Enter => {
                let choice = ui.option_cursor;
                ui.option_cursor = 0;
                report(ui, app.submit_answer(&room_id, choice));
            }
            KeyCode::Esc => {
                report(ui, app.close_room());
            }
            _ => {}
        }
        return Flow::Continue;
    }

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            ui.room_cursor = ui.room_cursor.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            ui.room_cursor = (ui.room_cursor + 1).min(room_ids.len() - 1);
        }
        KeyCode::Enter => {
            ui.option_cursor = 0;
            report(ui, app.enter_room(&room_ids[ui.room_cursor]));
        }
        KeyCode::Esc => {
            app.deselect_game();
            ui.reset_game_view();
        }
        _ => {}
    }
    Flow::Continue
}

fn wheel_keys(app: &mut Surprise, ui: &mut UiState, key: KeyEvent) -> Flow {
    let (spinning, finished) = {
        let Some(wheel) = app.wheel() else {
            return Flow::Continue;
        };
        (wheel.spinning(), wheel.finished())
    };

    match key.code {
        KeyCode::Char(' ') if !spinning => {
            if report(ui, app.spin()) {
                // Cosmetic only: where inside the winning segment the
                // pointer settles.
                ui.spin_jitter = rand::thread_rng().gen_range(0.0..0.85);
                ui.spin_started = Some(Instant::now());
            }
        }
        KeyCode::Enter if !spinning => {
            report(ui, app.acknowledge());
        }
        KeyCode::Char('m') => {
            ui.muted = !ui.muted;
            app.set_muted(ui.muted);
        }
        KeyCode::Esc if !finished => {
            app.deselect_game();
            ui.reset_game_view();
        }
        _ => {}
    }
    Flow::Continue
}

fn simple_keys(app: &mut Surprise, ui: &mut UiState, key: KeyEvent) -> Flow {
    match key.code {
        KeyCode::Enter => {
            report(ui, app.finish_simple());
        }
        KeyCode::Esc => {
            app.deselect_game();
            ui.reset_game_view();
        }
        _ => {}
    }
    Flow::Continue
}

/// Surface a rejected intent in the footer. The core state is untouched
/// by a rejection, so redrawing the current screen is all the recovery
/// needed.
fn report<T>(ui: &mut UiState, result: std::result::Result<T, SessionError>) -> bool {
    match result {
        Ok(_) => true,
        Err(err) => {
            tracing::debug!(%err, "intent rejected");
            ui.status = Some(err.to_string());
            false
        }
    }
}
