use kinetris::core::{Field, Matrix, MatrixControl, Ruleset, Session, Tetromino};
use kinetris::types::{MatrixEvent, MatrixState, Pair, PieceKind, COLS, ROWS};

fn names(events: &[MatrixEvent]) -> Vec<&'static str> {
    events.iter().map(MatrixEvent::name).collect()
}

/// Matrix on `field` whose first piece is `kind`, ticked until it falls
fn falling_on(field: Field, kind: PieceKind) -> Matrix {
    let mut m = Matrix::with_field(11, field);
    m.preload(&[kind, PieceKind::T, PieceKind::T]);
    m.tick(0);
    m.tick(1000);
    m.tick(0);
    assert_eq!(m.state(), MatrixState::Fall);
    m.drain_events();
    m
}

/// Tick through the lock delay and into the next state
fn lock_now(m: &mut Matrix) {
    m.tick(0);
    assert_eq!(m.state(), MatrixState::Land);
    m.tick(1500);
    m.tick(0);
}

#[test]
fn scenario_move_is_clamped_by_the_wall() {
    let mut m = falling_on(Field::new(), PieceKind::O);
    let start_col = m.piece().unwrap().blocks().iter().map(|b| b.col).max().unwrap();

    m.move_piece(5);
    let events = m.drain_events();
    let delta = match events[0] {
        MatrixEvent::Moved { delta, .. } => delta,
        ref other => panic!("expected moved, got {other:?}"),
    };
    assert_eq!(delta, COLS as i32 - 1 - start_col);
    assert!(delta < 5);
    let right = m.piece().unwrap().blocks().iter().map(|b| b.col).max().unwrap();
    assert_eq!(right, COLS as i32 - 1);
    assert_eq!(names(&events), vec!["moved", "ghostMoved"]);
}

#[test]
fn scenario_move_into_wall_fails() {
    let mut m = falling_on(Field::new(), PieceKind::O);
    m.move_piece(10);
    m.drain_events();
    m.tick(125);
    m.move_piece(1);
    assert_eq!(names(&m.drain_events()), vec!["moveFailed"]);
}

#[test]
fn scenario_single_line_clear() {
    let mut field = Field::new();
    field.fill_row(0, PieceKind::I, &[4, 5]);
    field.set(Pair::new(1, 0), Some(PieceKind::J));
    let mut m = falling_on(field, PieceKind::O);
    let rules = Ruleset::new();

    m.hard_drop();
    let drop_score = m.score();
    lock_now(&mut m);

    let events = m.drain_events();
    let cleared = events
        .iter()
        .find_map(|e| match e {
            MatrixEvent::LinesCleared(mask) => Some(*mask),
            _ => None,
        })
        .expect("lines cleared");
    assert_eq!(cleared.rows().collect::<Vec<_>>(), vec![0]);
    assert_eq!(m.lines(), 1);
    assert_eq!(m.score(), drop_score + rules.score_for_line_clear(1, 1));
    assert_eq!(m.state(), MatrixState::Line);

    // rows above shifted down by one
    assert_eq!(m.cell(Pair::new(0, 0)), Some(Some(PieceKind::J)));
    assert_eq!(m.cell(Pair::new(0, 4)), Some(Some(PieceKind::O)));
    assert_eq!(m.cell(Pair::new(0, 5)), Some(Some(PieceKind::O)));
    assert_eq!(m.cell(Pair::new(0, 1)), Some(None));
    assert!(m.field().row(1).iter().all(Option::is_none));

    // LINE waits delay_before_next (0) then respawns
    m.tick(0);
    m.tick(0);
    assert_eq!(m.state(), MatrixState::Next);
    assert!(m.piece().is_some());
}

#[test]
fn scenario_tetris_orders_lock_line_level_score() {
    let mut field = Field::new();
    for row in 0..4 {
        field.fill_row(row, PieceKind::L, &[5]);
    }
    let mut m = falling_on(field, PieceKind::I);
    m.turn_piece(1);
    assert!(m.piece().unwrap().blocks().iter().all(|b| b.col == 5));
    m.hard_drop();
    m.tick(0);
    m.tick(1500);
    m.tick(0);

    let events = m.drain_events();
    let order: Vec<&str> = names(&events)
        .into_iter()
        .filter(|n| matches!(*n, "locked" | "linesCleared" | "levelChanged" | "scoreChanged"))
        .collect();
    assert_eq!(
        order,
        vec!["scoreChanged", "locked", "linesCleared", "levelChanged", "scoreChanged"]
    );
    assert!(events.contains(&MatrixEvent::LevelChanged(1)));
    // awarded at the new level
    assert!(events.contains(&MatrixEvent::ScoreChanged(1600)));
    assert_eq!(m.level(), 2);
    assert_eq!(m.speed(), 1.5);
    assert!(m.field().cells().iter().all(Option::is_none));
}

#[test]
fn scenario_spawn_overlap_tops_out_without_falling() {
    let mut field = Field::new();
    for row in 0..ROWS as i32 {
        field.fill_row(row, PieceKind::Z, &[0]);
    }
    let mut m = Matrix::with_field(5, field);
    m.tick(0);
    assert_eq!(m.state(), MatrixState::Over);
    assert_eq!(
        names(&m.drain_events()),
        vec!["spawned", "ghostSpawned", "toppedOut"]
    );

    for _ in 0..100 {
        m.tick(33);
    }
    assert_eq!(m.state(), MatrixState::Over);
    assert!(m.drain_events().is_empty());
    m.hard_drop();
    assert!(m.drain_events().is_empty());
}

#[test]
fn scenario_lock_in_attic_tops_out() {
    let mut field = Field::new();
    for row in 0..20 {
        field.fill_row(row, PieceKind::S, &[0]);
    }
    let mut m = falling_on(field, PieceKind::O);
    m.tick(1000);
    assert!(names(&m.drain_events()).contains(&"landed"));
    lock_now(&mut m);
    let events = m.drain_events();
    assert_eq!(events.last(), Some(&MatrixEvent::ToppedOut));
    assert!(m.is_over());
    assert!(m.snapshot().game_over());
}

#[test]
fn scenario_move_off_ledge_returns_to_fall() {
    let mut field = Field::new();
    field.set(Pair::new(0, 4), Some(PieceKind::I));
    field.set(Pair::new(0, 5), Some(PieceKind::I));
    let mut m = falling_on(field, PieceKind::O);

    m.hard_drop();
    m.tick(0);
    assert_eq!(m.state(), MatrixState::Land);
    m.tick(1000);
    assert_eq!(m.lock_timer_ms(), 1000.0);
    m.drain_events();

    m.move_piece(2);
    assert_eq!(names(&m.drain_events()), vec!["moved", "ghostMoved"]);
    assert_eq!(m.lock_timer_ms(), 0.0);
    assert_eq!(m.requested_state(), MatrixState::Fall);
    m.tick(0);
    assert_eq!(m.state(), MatrixState::Fall);

    // it can fall again
    m.tick(1000);
    assert!(matches!(m.drain_events()[0], MatrixEvent::Fell { rows: 1, .. }));
}

#[test]
fn scenario_move_off_ledge_before_landing_commits() {
    let mut field = Field::new();
    field.set(Pair::new(0, 4), Some(PieceKind::I));
    field.set(Pair::new(0, 5), Some(PieceKind::I));
    let mut m = falling_on(field, PieceKind::O);

    // land requested, not yet committed
    m.hard_drop();
    assert_eq!(m.state(), MatrixState::Fall);
    assert_eq!(m.requested_state(), MatrixState::Land);

    m.move_piece(2);
    assert_eq!(m.requested_state(), MatrixState::Fall);
    m.tick(0);
    assert_eq!(m.state(), MatrixState::Fall);
    m.drain_events();

    // the piece keeps falling and locks on the floor
    m.tick(1000);
    assert!(matches!(m.drain_events()[0], MatrixEvent::Fell { rows: 1, .. }));
    m.tick(1000);
    assert!(names(&m.drain_events()).contains(&"landed"));
    lock_now(&mut m);
    assert_eq!(m.cell(Pair::new(0, 6)), Some(Some(PieceKind::O)));
    assert_eq!(m.cell(Pair::new(0, 7)), Some(Some(PieceKind::O)));
    assert_eq!(m.cell(Pair::new(1, 6)), Some(None));
}

#[test]
fn scenario_move_on_ledge_keeps_landing() {
    let mut field = Field::new();
    field.fill_row(0, PieceKind::I, &[9]);
    let mut m = falling_on(field, PieceKind::O);

    m.hard_drop();
    m.tick(0);
    m.tick(1000);
    m.move_piece(1);
    // the lock delay restarts but the piece stays landed
    assert_eq!(m.lock_timer_ms(), 0.0);
    m.tick(0);
    assert_eq!(m.state(), MatrixState::Land);
}

#[test]
fn scenario_hard_drop_five_rows() {
    let mut field = Field::new();
    for row in 0..15 {
        field.fill_row(row, PieceKind::T, &[0]);
    }
    let mut m = falling_on(field, PieceKind::O);
    let rules = Ruleset::new();

    m.hard_drop();
    let events = m.drain_events();
    assert!(matches!(events[0], MatrixEvent::Dropped { rows: 5, .. }));
    assert!(matches!(events[1], MatrixEvent::Landed(_)));
    assert_eq!(events[2], MatrixEvent::ScoreChanged(rules.score_for_hard_drop(5, 1)));
    assert_eq!(events.len(), 3);
    assert_eq!(m.score(), 10);
    // not locked until the lock delay runs out
    assert!(!m.piece().unwrap().is_locked());
}

#[test]
fn lock_is_idempotent() {
    let rules = Ruleset::new();
    let mut piece = Tetromino::spawn(PieceKind::L, &rules);
    assert_eq!(piece.lock().len(), 1);
    assert!(piece.lock().is_empty());
    assert!(piece.is_locked());
    assert!(piece.move_by(-1, &Field::new()).is_empty());

    let mut m = falling_on(Field::new(), PieceKind::L);
    m.hard_drop();
    m.tick(0);
    m.tick(1500);
    m.tick(1500);
    let locked = m
        .drain_events()
        .iter()
        .filter(|e| matches!(e, MatrixEvent::Locked(_)))
        .count();
    assert_eq!(locked, 1);
}

#[test]
fn full_cycle_event_order() {
    let mut m = Matrix::new(8);
    m.preload(&[PieceKind::T]);
    m.tick(0);
    m.tick(1000);
    m.tick(0);
    m.move_piece(-1);
    m.turn_piece(1);
    m.hard_drop();
    lock_now(&mut m);
    m.tick(0);

    let got = names(&m.drain_events());
    assert_eq!(
        got,
        vec![
            "spawned",
            "ghostSpawned",
            "cast",
            "moved",
            "ghostMoved",
            "turned",
            "ghostTurned",
            "dropped",
            "landed",
            "scoreChanged",
            "locked",
            "spawned",
            "ghostSpawned",
        ]
    );
}

#[test]
fn session_dispatches_in_order_and_restarts() {
    use kinetris::core::MatrixObserver;
    use std::sync::{Arc, Mutex};

    struct Names(Arc<Mutex<Vec<&'static str>>>);
    impl MatrixObserver for Names {
        fn on_event(&mut self, event: &MatrixEvent, _matrix: &Matrix) {
            self.0.lock().unwrap().push(event.name());
        }
    }

    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut session = Session::new(3);
    session.subscribe(Box::new(Names(Arc::clone(&seen))));
    session.tick(0);
    session.tick(1000);
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["spawned", "ghostSpawned", "cast"]
    );

    session.restart(4);
    assert_eq!(session.seed(), 4);
    assert_eq!(session.matrix().state(), MatrixState::None);
    session.tick(0);
    assert_eq!(seen.lock().unwrap().len(), 5);
}
