//! Command surface shared by every input provider

use crate::types::Command;

/// Discrete player commands
///
/// Implementations ignore commands outside the states that accept them, so
/// callers never need to check state first.
pub trait MatrixControl {
    fn move_piece(&mut self, direction: i32);
    fn turn_piece(&mut self, direction: i32);
    fn hard_drop(&mut self);
    fn hold(&mut self);
    fn set_push(&mut self, active: bool);

    fn apply(&mut self, command: Command) {
        match command {
            Command::Move(d) => self.move_piece(d),
            Command::Turn(d) => self.turn_piece(d),
            Command::Drop => self.hard_drop(),
            Command::Hold => self.hold(),
            Command::Push(active) => self.set_push(active),
        }
    }
}
