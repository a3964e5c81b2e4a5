use crossterm::event::{KeyCode, KeyEvent};

use kinetris::core::Matrix;
use kinetris::input::{apply_key, Channel, InputManager, Player, PlayerSignal, PlayerState};
use kinetris::types::{MatrixEvent, MatrixState, PieceKind};

struct Rig {
    input: InputManager,
    player: Player,
    matrix: Matrix,
}

impl Rig {
    fn new() -> Self {
        let mut matrix = Matrix::new(21);
        matrix.preload(&[PieceKind::T, PieceKind::O, PieceKind::I]);
        Self {
            input: InputManager::new(),
            player: Player::new(),
            matrix,
        }
    }

    /// One frame of the game loop
    fn frame(&mut self, dt_ms: u32) -> Vec<PlayerSignal> {
        self.input.update();
        let signals = self.player.update(dt_ms, &self.input, &mut self.matrix);
        if self.player.state() == PlayerState::Play {
            self.matrix.tick(dt_ms);
        }
        signals.to_vec()
    }

    fn key(&mut self, code: KeyCode) {
        assert!(apply_key(KeyEvent::from(code), &mut self.input));
    }

    /// Start a game and wait for the first piece to fall
    fn started() -> Self {
        let mut rig = Self::new();
        rig.frame(33);
        rig.key(KeyCode::Enter);
        assert_eq!(rig.frame(33), vec![PlayerSignal::StartRequested]);
        rig.frame(0);
        rig.frame(1000);
        rig.frame(0);
        assert_eq!(rig.matrix.state(), MatrixState::Fall);
        rig.matrix.drain_events();
        rig
    }
}

#[test]
fn test_matrix_waits_for_start() {
    let mut rig = Rig::new();
    for _ in 0..10 {
        rig.frame(33);
    }
    assert_eq!(rig.player.state(), PlayerState::Wait);
    assert_eq!(rig.matrix.state(), MatrixState::None);
}

#[test]
fn test_arrow_moves_piece() {
    let mut rig = Rig::started();
    let col = rig.matrix.piece().unwrap().position().col;
    rig.key(KeyCode::Left);
    rig.frame(33);
    assert_eq!(rig.matrix.piece().unwrap().position().col, col - 1);
    assert!(matches!(
        rig.matrix.drain_events()[0],
        MatrixEvent::Moved { delta: -1, .. }
    ));
}

#[test]
fn test_up_turns_clockwise() {
    let mut rig = Rig::started();
    rig.key(KeyCode::Up);
    rig.frame(33);
    assert_eq!(rig.matrix.piece().unwrap().orientation(), 1);
    rig.key(KeyCode::Char('z'));
    rig.frame(33);
    assert_eq!(rig.matrix.piece().unwrap().orientation(), 0);
}

#[test]
fn test_space_hard_drops() {
    let mut rig = Rig::started();
    rig.key(KeyCode::Char(' '));
    rig.frame(0);
    let events = rig.matrix.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, MatrixEvent::Dropped { .. })));
    assert!(rig.matrix.score() > 0);
}

#[test]
fn test_c_holds() {
    let mut rig = Rig::started();
    rig.key(KeyCode::Char('c'));
    rig.frame(0);
    assert_eq!(rig.matrix.hold_piece(), Some(PieceKind::T));
    assert_eq!(rig.matrix.piece().map(|p| p.kind()), Some(PieceKind::O));
}

#[test]
fn test_down_pushes_while_held() {
    let mut rig = Rig::started();
    rig.key(KeyCode::Down);
    rig.frame(0);
    assert!(rig.matrix.push());
    // key repeat stopped
    rig.frame(0);
    assert!(!rig.matrix.push());
}

#[test]
fn test_pause_freezes_matrix() {
    let mut rig = Rig::started();
    rig.key(KeyCode::Char('p'));
    assert_eq!(rig.frame(33), vec![PlayerSignal::PauseRequested]);
    rig.frame(33);
    assert_eq!(rig.player.state(), PlayerState::Menu);

    let elapsed = rig.matrix.elapsed_ms();
    for _ in 0..30 {
        rig.frame(33);
    }
    assert_eq!(rig.matrix.elapsed_ms(), elapsed);

    rig.key(KeyCode::Enter);
    assert_eq!(rig.frame(33), vec![PlayerSignal::ResumeRequested]);
}

#[test]
fn test_escape_twice_quits() {
    let mut rig = Rig::started();
    rig.key(KeyCode::Esc);
    assert_eq!(rig.frame(33), vec![PlayerSignal::QuitRequested]);
    rig.frame(33);
    rig.key(KeyCode::Esc);
    assert_eq!(rig.frame(33), vec![PlayerSignal::QuitConfirmed]);
}

#[test]
fn test_remote_style_held_signal() {
    // a sensor holds both hands up without clearing
    let mut rig = Rig::started();
    rig.input.set(Channel::Y1, 1.0, false);
    let mut quit = false;
    for _ in 0..100 {
        quit |= rig.frame(33).contains(&PlayerSignal::QuitRequested);
    }
    assert!(quit);
}
