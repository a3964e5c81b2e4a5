//! Session module - owns one matrix and fans its events out to observers
//!
//! Observers only ever see event payloads plus a shared reference to the
//! matrix; they cannot mutate engine state. Events are dispatched after each
//! tick or command, in emission order.

use crate::control::MatrixControl;
use crate::matrix::Matrix;
use crate::types::{Command, MatrixEvent};

/// Receives matrix events in emission order
pub trait MatrixObserver {
    fn on_event(&mut self, event: &MatrixEvent, matrix: &Matrix);
}

/// One game in progress, plus the observers that outlive it
pub struct Session {
    matrix: Matrix,
    seed: u32,
    observers: Vec<Box<dyn MatrixObserver>>,
}

impl Session {
    pub fn new(seed: u32) -> Self {
        Self::with_matrix(seed, Matrix::new(seed))
    }

    pub fn with_matrix(seed: u32, matrix: Matrix) -> Self {
        Self {
            matrix,
            seed,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn MatrixObserver>) {
        self.observers.push(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Advance the matrix and dispatch what it emitted
    pub fn tick(&mut self, dt_ms: u32) {
        self.matrix.tick(dt_ms);
        self.dispatch();
    }

    /// Apply one command and dispatch what it emitted
    pub fn apply(&mut self, command: Command) {
        self.matrix.apply(command);
        self.dispatch();
    }

    /// Flush queued events to every observer; returns how many were sent
    pub fn dispatch(&mut self) -> usize {
        let events = self.matrix.drain_events();
        for event in &events {
            for observer in self.observers.iter_mut() {
                observer.on_event(event, &self.matrix);
            }
        }
        events.len()
    }

    /// Start over with a fresh matrix; observers stay subscribed
    pub fn restart(&mut self, seed: u32) {
        self.dispatch();
        self.seed = seed;
        self.matrix = Matrix::new(seed);
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Direct access for setup (preloading pieces, custom fields)
    pub fn matrix_mut(&mut self) -> &mut Matrix {
        &mut self.matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatrixState;
    use std::sync::{Arc, Mutex};

    struct Recorder(Arc<Mutex<Vec<&'static str>>>);

    impl MatrixObserver for Recorder {
        fn on_event(&mut self, event: &MatrixEvent, _matrix: &Matrix) {
            if let Ok(mut log) = self.0.lock() {
                log.push(event.name());
            }
        }
    }

    #[test]
    fn test_observers_receive_events_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut session = Session::new(9);
        session.subscribe(Box::new(Recorder(log.clone())));
        session.tick(0);
        session.tick(1000);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["spawned", "ghostSpawned", "cast"]
        );
    }

    #[test]
    fn test_apply_dispatches() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut session = Session::new(9);
        session.subscribe(Box::new(Recorder(log.clone())));
        session.tick(0);
        session.tick(1000);
        session.tick(0);
        log.lock().unwrap().clear();
        session.apply(Command::Drop);
        let names = log.lock().unwrap().clone();
        assert_eq!(names[0], "dropped");
        assert!(names.contains(&"landed"));
    }

    #[test]
    fn test_restart_keeps_observers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut session = Session::new(1);
        session.subscribe(Box::new(Recorder(log.clone())));
        session.tick(0);
        session.restart(2);
        assert_eq!(session.seed(), 2);
        assert_eq!(session.matrix().state(), MatrixState::None);
        assert_eq!(session.observer_count(), 1);
        log.lock().unwrap().clear();
        session.tick(0);
        assert_eq!(log.lock().unwrap().len(), 2);
    }
}
