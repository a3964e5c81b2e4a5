//! Two-phase input buffer.
//!
//! Providers (keyboard, remote bridge, sensors) write *pending* values at any
//! time with [`InputManager::set`]. Once per frame [`InputManager::update`]
//! makes them current, keeping the previous frame for edge detection.
//! Channels written with `clear = true` fall back to zero after one frame,
//! which is how one-shot triggers (a key press, a gesture) are expressed.

use arrayvec::ArrayVec;

/// Number of input channels
pub const CHANNELS: usize = 10;

/// Named analog/digital input channels
///
/// `X1/Y1/Z1` and `X2/Y2/Z2` are the two hands (or the primary and
/// secondary axes of a keyboard/pad), `L1/R1` are turn triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    X1,
    Y1,
    Z1,
    X2,
    Y2,
    Z2,
    L1,
    R1,
    Play,
    Quit,
}

impl Channel {
    pub const ALL: [Channel; CHANNELS] = [
        Channel::X1,
        Channel::Y1,
        Channel::Z1,
        Channel::X2,
        Channel::Y2,
        Channel::Z2,
        Channel::L1,
        Channel::R1,
        Channel::Play,
        Channel::Quit,
    ];

    pub fn index(&self) -> usize {
        match self {
            Channel::X1 => 0,
            Channel::Y1 => 1,
            Channel::Z1 => 2,
            Channel::X2 => 3,
            Channel::Y2 => 4,
            Channel::Z2 => 5,
            Channel::L1 => 6,
            Channel::R1 => 7,
            Channel::Play => 8,
            Channel::Quit => 9,
        }
    }

    /// Parse channel name (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "x1" => Some(Channel::X1),
            "y1" => Some(Channel::Y1),
            "z1" => Some(Channel::Z1),
            "x2" => Some(Channel::X2),
            "y2" => Some(Channel::Y2),
            "z2" => Some(Channel::Z2),
            "l1" => Some(Channel::L1),
            "r1" => Some(Channel::R1),
            "play" => Some(Channel::Play),
            "quit" => Some(Channel::Quit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::X1 => "x1",
            Channel::Y1 => "y1",
            Channel::Z1 => "z1",
            Channel::X2 => "x2",
            Channel::Y2 => "y2",
            Channel::Z2 => "z2",
            Channel::L1 => "l1",
            Channel::R1 => "r1",
            Channel::Play => "play",
            Channel::Quit => "quit",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputManager {
    current: [f64; CHANNELS],
    previous: [f64; CHANNELS],
    pending: [f64; CHANNELS],
    clear: ArrayVec<Channel, CHANNELS>,
}

impl InputManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `channel` for the current frame
    pub fn get(&self, channel: Channel) -> f64 {
        self.current[channel.index()]
    }

    pub fn previous(&self, channel: Channel) -> f64 {
        self.previous[channel.index()]
    }

    /// Write a pending value; with `clear` it lasts exactly one frame
    pub fn set(&mut self, channel: Channel, value: f64, clear: bool) {
        self.pending[channel.index()] = value;
        if clear && !self.clear.contains(&channel) {
            self.clear.push(channel);
        }
    }

    /// Went from zero to non-zero this frame
    pub fn applied(&self, channel: Channel) -> bool {
        let i = channel.index();
        self.previous[i] == 0.0 && self.current[i] != 0.0
    }

    /// Went from non-zero to zero this frame
    pub fn cleared(&self, channel: Channel) -> bool {
        let i = channel.index();
        self.previous[i] != 0.0 && self.current[i] == 0.0
    }

    /// Commit pending values: previous <- current <- pending
    pub fn update(&mut self) {
        self.previous = self.current;
        self.current = self.pending;
        for channel in self.clear.drain(..) {
            self.pending[channel.index()] = 0.0;
        }
    }

    /// Zero everything, including pending values
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
