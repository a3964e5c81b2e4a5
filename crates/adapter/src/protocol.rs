//! Protocol module - JSON message types for the remote input bridge
//!
//! Line-delimited JSON. Every message has `type`, `seq` (sender sequence
//! number) and `ts` (sender timestamp in ms).

use serde::{Deserialize, Serialize};

use crate::input::Channel;
use crate::types::{Command, MatrixEvent, PieceSnapshot, COLS, MAX_TURN_STEPS};

/// Protocol version spoken by this server; clients must match the major part
pub const PROTOCOL_VERSION: &str = "1.0.0";

// ============== Client -> Game Messages ==============

/// Client hello message (first message on every connection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    pub seq: u64,
    pub ts: u64,
    pub client: ClientInfo,
    pub protocol_version: String,
    /// Receive `event` messages for every matrix event
    #[serde(default)]
    pub stream_events: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// Raw channel write, as a sensor would produce it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalMessage {
    pub seq: u64,
    pub ts: u64,
    pub channel: String,
    pub value: f64,
    /// Reset the channel after one frame
    #[serde(default)]
    pub clear: bool,
}

/// Discrete matrix command
///
/// `action` is one of `move`, `turn`, `drop`, `hold`, `push`. `move` and
/// `turn` take a signed `value` (default 1); `push` takes `active`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandMessage {
    pub seq: u64,
    pub ts: u64,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

// ============== Game -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WelcomeType {
    #[serde(rename = "welcome")]
    Welcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckType {
    #[serde(rename = "ack")]
    Ack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckStatus {
    #[serde(rename = "ok")]
    Ok,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "event")]
    Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "invalid_message")]
    InvalidMessage,
    #[serde(rename = "handshake_required")]
    HandshakeRequired,
    #[serde(rename = "backpressure")]
    Backpressure,
    #[serde(rename = "protocol_mismatch")]
    ProtocolMismatch,
    #[serde(rename = "invalid_command")]
    InvalidCommand,
}

/// Welcome message (response to hello)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type")]
    pub msg_type: WelcomeType,
    pub seq: u64,
    pub ts: u64,
    pub protocol_version: String,
    pub client_id: u64,
    pub game_id: String,
}

/// Sent by the game loop once a signal or command has been applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckMessage {
    #[serde(rename = "type")]
    pub msg_type: AckType,
    pub seq: u64,
    pub ts: u64,
    pub status: AckStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: ErrorType,
    pub seq: u64,
    pub ts: u64,
    pub code: ErrorCode,
    pub message: String,
}

/// One matrix event, streamed to clients that asked for it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub msg_type: EventType,
    pub seq: u64,
    pub ts: u64,
    pub event: EventRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceRecord {
    pub kind: char,
    pub row: i32,
    pub col: i32,
    pub orientation: i32,
}

impl From<PieceSnapshot> for PieceRecord {
    fn from(value: PieceSnapshot) -> Self {
        Self {
            kind: value.kind.as_str().chars().next().unwrap_or('?'),
            row: value.position.row,
            col: value.position.col,
            orientation: value.orientation,
        }
    }
}

/// Flat, serializable form of a matrix event
///
/// `value` carries the event magnitude: column delta for `moved`, steps for
/// `turned`, rows for `fell`/`dropped`, delta for `levelChanged` and
/// `scoreChanged`. `rows` lists cleared rows for `linesCleared`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub piece: Option<PieceRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<i32>,
}

impl From<&MatrixEvent> for EventRecord {
    fn from(event: &MatrixEvent) -> Self {
        let (piece, value) = match *event {
            MatrixEvent::Spawned(p)
            | MatrixEvent::GhostSpawned(p)
            | MatrixEvent::Cast(p)
            | MatrixEvent::MoveFailed(p)
            | MatrixEvent::TurnFailed(p)
            | MatrixEvent::Landed(p)
            | MatrixEvent::Locked(p)
            | MatrixEvent::Held(p)
            | MatrixEvent::GhostMoved(p)
            | MatrixEvent::GhostTurned(p) => (Some(p), None),
            MatrixEvent::Moved { piece, delta } => (Some(piece), Some(delta as i64)),
            MatrixEvent::Turned { piece, steps } => (Some(piece), Some(steps as i64)),
            MatrixEvent::Fell { piece, rows } | MatrixEvent::Dropped { piece, rows } => {
                (Some(piece), Some(rows as i64))
            }
            MatrixEvent::LevelChanged(delta) | MatrixEvent::ScoreChanged(delta) => {
                (None, Some(delta as i64))
            }
            MatrixEvent::LinesCleared(_) | MatrixEvent::ToppedOut => (None, None),
        };
        let rows = match event {
            MatrixEvent::LinesCleared(mask) => mask.rows().collect(),
            _ => Vec::new(),
        };
        Self {
            name: event.name().to_string(),
            piece: piece.map(PieceRecord::from),
            value,
            rows,
        }
    }
}

// ============== Message Parsing ==============

/// Parsed incoming message
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Hello(HelloMessage),
    Signal(SignalMessage),
    Command(CommandMessage),
    Unknown(UnknownMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMessage {
    pub seq: u64,
}

/// Parse a JSON message from a string
///
/// Well-formed JSON with an unrecognized `type` is not an error; it parses
/// as [`ParsedMessage::Unknown`].
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    #[derive(Debug, Deserialize)]
    #[serde(tag = "type")]
    enum InboundMessage {
        #[serde(rename = "hello")]
        Hello(HelloMessage),
        #[serde(rename = "signal")]
        Signal(SignalMessage),
        #[serde(rename = "command")]
        Command(CommandMessage),
    }

    match serde_json::from_str::<InboundMessage>(json) {
        Ok(InboundMessage::Hello(m)) => Ok(ParsedMessage::Hello(m)),
        Ok(InboundMessage::Signal(m)) => Ok(ParsedMessage::Signal(m)),
        Ok(InboundMessage::Command(m)) => Ok(ParsedMessage::Command(m)),
        Err(e) => {
            #[derive(Debug, Deserialize)]
            struct Envelope<'a> {
                #[serde(rename = "type")]
                msg_type: Option<&'a str>,
                seq: Option<u64>,
            }
            let envelope = serde_json::from_str::<Envelope>(json)?;
            match envelope.msg_type {
                Some("hello") | Some("signal") | Some("command") => Err(e),
                _ => Ok(ParsedMessage::Unknown(UnknownMessage {
                    seq: envelope.seq.unwrap_or(0),
                })),
            }
        }
    }
}

/// Map a command message onto a matrix command
pub fn map_command(cmd: &CommandMessage) -> Result<Command, (ErrorCode, String)> {
    let value = cmd.value.unwrap_or(1);
    let action = cmd.action.to_lowercase();
    let limit = match action.as_str() {
        "move" => COLS as u32,
        "turn" => MAX_TURN_STEPS,
        _ => 0,
    };
    if limit > 0 && (value == 0 || value.unsigned_abs() > limit) {
        return Err((
            ErrorCode::InvalidCommand,
            format!("{} value must be non-zero and at most {} in magnitude", cmd.action, limit),
        ));
    }
    match action.as_str() {
        "move" => Ok(Command::Move(value)),
        "turn" => Ok(Command::Turn(value)),
        "push" => Ok(Command::Push(cmd.active.unwrap_or(true))),
        other => Command::from_str(other).ok_or_else(|| {
            (
                ErrorCode::InvalidCommand,
                format!("Unknown action: {}", cmd.action),
            )
        }),
    }
}

/// Resolve the channel named by a signal message
pub fn map_signal(signal: &SignalMessage) -> Result<Channel, (ErrorCode, String)> {
    if !signal.value.is_finite() {
        return Err((
            ErrorCode::InvalidCommand,
            "signal value must be finite".to_string(),
        ));
    }
    Channel::from_str(&signal.channel).ok_or_else(|| {
        (
            ErrorCode::InvalidCommand,
            format!("Unknown channel: {}", signal.channel),
        )
    })
}

/// Same major version
pub fn protocol_compatible(version: &str) -> bool {
    let major = |v: &str| v.split('.').next().map(str::to_string);
    major(version).is_some() && major(version) == major(PROTOCOL_VERSION)
}

// ============== Utility Functions ==============

pub fn create_hello(seq: u64, client_name: &str, stream_events: bool) -> HelloMessage {
    HelloMessage {
        seq,
        ts: current_timestamp_ms(),
        client: ClientInfo {
            name: client_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        protocol_version: PROTOCOL_VERSION.to_string(),
        stream_events,
    }
}

/// Hello serialized with its `type` tag, ready to send
pub fn hello_line(hello: &HelloMessage) -> Result<String, serde_json::Error> {
    let mut v = serde_json::to_value(hello)?;
    if let Some(obj) = v.as_object_mut() {
        obj.insert("type".to_string(), serde_json::Value::from("hello"));
    }
    serde_json::to_string(&v)
}

pub fn create_welcome(seq: u64, client_id: u64) -> WelcomeMessage {
    WelcomeMessage {
        msg_type: WelcomeType::Welcome,
        seq,
        ts: current_timestamp_ms(),
        protocol_version: PROTOCOL_VERSION.to_string(),
        client_id,
        game_id: "kinetris".to_string(),
    }
}

pub fn create_ack(seq: u64) -> AckMessage {
    AckMessage {
        msg_type: AckType::Ack,
        seq,
        ts: current_timestamp_ms(),
        status: AckStatus::Ok,
    }
}

pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: ErrorType::Error,
        seq,
        ts: current_timestamp_ms(),
        code,
        message: message.to_string(),
    }
}

pub fn create_event(seq: u64, event: &MatrixEvent) -> EventMessage {
    EventMessage {
        msg_type: EventType::Event,
        seq,
        ts: current_timestamp_ms(),
        event: EventRecord::from(event),
    }
}

/// Get current timestamp in milliseconds
pub fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
