//! Kinetris runner (default binary).
//!
//! Fixed-tick loop: keyboard and remote inputs feed the input manager, the
//! player turns them into matrix commands, and the session advances the
//! matrix and fans events out to the observers. Nothing is drawn; progress is
//! reported on stderr and, optionally, in a JSONL event log.

use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal;

use kinetris::adapter::InputBridge;
use kinetris::config::AppConfig;
use kinetris::core::Session;
use kinetris::input::{apply_key, should_quit, InputManager, Player, PlayerSignal, PlayerState};
use kinetris::observe::{ConsoleReporter, EventLog};

fn main() -> Result<()> {
    let config = AppConfig::from_env();
    let mut bridge = InputBridge::start_from_env()?;

    let mut session = Session::new(config.seed);
    session.subscribe(Box::new(ConsoleReporter::new()));
    if let Some(path) = config.event_log.as_deref() {
        session.subscribe(Box::new(EventLog::create(path)?));
    }
    if let Some(bridge) = bridge.as_ref() {
        session.subscribe(Box::new(bridge.broadcaster()));
        eprintln!("[Kinetris] Remote input on {}", bridge.local_addr());
    }
    eprintln!("[Kinetris] Seed {}. Enter to start, Esc to quit.", config.seed);

    terminal::enable_raw_mode()?;
    let result = run(&config, &mut session, bridge.as_mut());

    // Always try to restore terminal state.
    let _ = terminal::disable_raw_mode();
    result
}

fn run(config: &AppConfig, session: &mut Session, mut bridge: Option<&mut InputBridge>) -> Result<()> {
    let mut input = InputManager::new();
    let mut player = Player::new();
    let mut games = 0u32;

    let tick_duration = Duration::from_millis(config.tick_ms as u64);
    let mut last_tick = Instant::now();

    loop {
        // Input with timeout until next tick.
        let timeout = tick_duration.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Release {
                    if should_quit(key) {
                        return Ok(());
                    }
                    apply_key(key, &mut input);
                }
            }
        }

        if last_tick.elapsed() < tick_duration {
            continue;
        }
        last_tick = Instant::now();

        if let Some(bridge) = bridge.as_deref_mut() {
            bridge.pump(&mut input, session.matrix_mut());
            session.dispatch();
        }

        input.update();
        for signal in player.update(config.tick_ms, &input, session.matrix_mut()) {
            match signal {
                PlayerSignal::StartRequested => {
                    if games > 0 {
                        session.restart(config.seed_for_game(games));
                    }
                    games += 1;
                    eprint!("[Kinetris] Game {} (seed {})\r\n", games, session.seed());
                }
                PlayerSignal::PauseRequested => eprint!("[Kinetris] Paused\r\n"),
                PlayerSignal::ResumeRequested => eprint!("[Kinetris] Resumed\r\n"),
                PlayerSignal::QuitRequested => {
                    eprint!("[Kinetris] Quit? Esc again to confirm, Enter to resume\r\n");
                }
                PlayerSignal::QuitConfirmed => return Ok(()),
            }
        }

        // Time only passes while playing.
        if player.state() == PlayerState::Play {
            session.tick(config.tick_ms);
            if session.matrix().is_over() {
                player.set_state(PlayerState::Home);
                eprint!("[Kinetris] Enter for a new game\r\n");
            }
        } else {
            session.dispatch();
        }
    }
}
