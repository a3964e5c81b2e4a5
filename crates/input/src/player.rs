//! Player - turns input channels into matrix commands.
//!
//! The player has its own request/commit state machine. The application
//! shell reacts to the [`PlayerSignal`]s it returns (start, pause, quit) and
//! decides when to tick the matrix.

use arrayvec::ArrayVec;

use crate::core::{MatrixControl, StateMachine, Transition};
use crate::manager::{Channel, InputManager};

/// How long "both hands up" must be held to ask for quit
pub const QUIT_HOLD_MS: f64 = 3000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerState {
    None,
    /// Waiting for a player to show up
    Wait,
    Home,
    Play,
    /// Paused
    Menu,
    /// Asking for quit confirmation
    Quit,
}

impl PlayerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerState::None => "none",
            PlayerState::Wait => "wait",
            PlayerState::Home => "home",
            PlayerState::Play => "play",
            PlayerState::Menu => "menu",
            PlayerState::Quit => "quit",
        }
    }
}

/// Requests for the application shell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerSignal {
    StartRequested,
    PauseRequested,
    ResumeRequested,
    QuitRequested,
    QuitConfirmed,
}

pub type PlayerSignals = ArrayVec<PlayerSignal, 4>;

#[derive(Debug, Clone)]
pub struct Player {
    state: StateMachine<PlayerState>,
    quit_hold_ms: f64,
}

impl Player {
    pub fn new() -> Self {
        Self {
            state: StateMachine::new(PlayerState::None),
            quit_hold_ms: 0.0,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state.current()
    }

    /// Request a state; takes effect on the next update
    pub fn set_state(&mut self, state: PlayerState) {
        self.state.request(state);
    }

    /// Run one frame: commit the requested state, then map input to commands
    pub fn update(
        &mut self,
        dt_ms: u32,
        input: &InputManager,
        matrix: &mut impl MatrixControl,
    ) -> PlayerSignals {
        let mut out = PlayerSignals::new();

        while let Some(Transition { from, to }) = self.state.commit() {
            if from == PlayerState::Play {
                matrix.set_push(false);
            }
            if to == PlayerState::Play {
                self.quit_hold_ms = 0.0;
            }
        }

        match self.state.current() {
            PlayerState::None => self.state.request(PlayerState::Wait),
            PlayerState::Wait | PlayerState::Home => {
                if input.applied(Channel::Play) {
                    out.push(PlayerSignal::StartRequested);
                    self.state.request(PlayerState::Play);
                }
            }
            PlayerState::Play => self.update_play(dt_ms, input, matrix, &mut out),
            PlayerState::Menu => {
                if input.applied(Channel::Play) {
                    out.push(PlayerSignal::ResumeRequested);
                    self.state.request(PlayerState::Play);
                } else if input.applied(Channel::Quit) {
                    out.push(PlayerSignal::QuitRequested);
                    self.state.request(PlayerState::Quit);
                }
            }
            PlayerState::Quit => {
                let x1 = input.get(Channel::X1);
                let x2 = input.get(Channel::X2);
                if (x2 < 0.0 && x1 < 0.0) || input.applied(Channel::Quit) {
                    out.push(PlayerSignal::QuitConfirmed);
                } else if (x2 > 0.0 && x1 > 0.0) || input.applied(Channel::Play) {
                    out.push(PlayerSignal::ResumeRequested);
                    self.state.request(PlayerState::Play);
                }
            }
        }

        out
    }

    fn update_play(
        &mut self,
        dt_ms: u32,
        input: &InputManager,
        matrix: &mut impl MatrixControl,
        out: &mut PlayerSignals,
    ) {
        if input.applied(Channel::Quit) {
            out.push(PlayerSignal::QuitRequested);
            self.state.request(PlayerState::Quit);
            return;
        }
        if input.applied(Channel::Play) {
            out.push(PlayerSignal::PauseRequested);
            self.state.request(PlayerState::Menu);
            return;
        }

        let x1 = input.get(Channel::X1);
        let y1 = input.get(Channel::Y1);
        let z1 = input.get(Channel::Z1);
        let y2 = input.get(Channel::Y2);
        let l1 = input.get(Channel::L1);
        let r1 = input.get(Channel::R1);

        if z1 >= 0.0 {
            // hands forward: move, push, drop, hold
            if x1 <= -1.0 {
                matrix.move_piece(-1);
            } else if x1 >= 1.0 {
                matrix.move_piece(1);
            }

            matrix.set_push(y1 <= -1.0);

            if y2 < 0.0 && y1 < 0.0 {
                matrix.hard_drop();
            } else if y2 > 0.0 && y1 > 0.0 {
                matrix.hold();
            }

            if y1 >= 1.0 {
                self.quit_hold_ms += dt_ms as f64;
                if self.quit_hold_ms >= QUIT_HOLD_MS {
                    self.quit_hold_ms = 0.0;
                    out.push(PlayerSignal::QuitRequested);
                    self.state.request(PlayerState::Quit);
                }
            } else {
                self.quit_hold_ms = 0.0;
            }
        } else {
            // hands pulled back: turn
            if l1 != 0.0 {
                matrix.turn_piece(-(l1.round() as i32));
            }
            if r1 != 0.0 {
                matrix.turn_piece(r1.round() as i32);
            }
        }
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}
