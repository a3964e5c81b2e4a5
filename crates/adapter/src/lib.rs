//! Remote input bridge - sensors and scripts drive the game over TCP
//!
//! A depth sensor or test harness connects to a TCP socket and streams
//! channel values or direct matrix commands. The game loop drains them once
//! per frame and acknowledges each one after it has been applied.
//!
//! # Protocol Overview
//!
//! The bridge speaks a **line-delimited JSON protocol** over TCP:
//!
//! 1. **Connection**: Client connects to TCP socket (default: 127.0.0.1:7878)
//! 2. **Handshake**: Client sends `hello`, server responds with `welcome`
//! 3. **Input**: Client sends `signal` or `command` messages
//! 4. **Events**: Clients that set `stream_events` receive every matrix event
//!
//! ## Client → Server
//!
//! - **hello**: handshake with client info and protocol version
//! - **signal**: `{channel, value, clear}` write into the input manager
//! - **command**: `move`, `turn`, `drop`, `hold` or `push`; `move` takes up
//!   to 10 columns and `turn` up to 4 quarter turns either way
//!
//! ## Server → Client
//!
//! - **welcome**: response to hello
//! - **ack**: input applied by the game loop
//! - **error**: `invalid_message`, `handshake_required`, `backpressure`,
//!   `protocol_mismatch` or `invalid_command`
//! - **event**: one matrix event
//!
//! `seq` must be strictly increasing per client. The inbound queue is
//! bounded; when it is full the server answers `backpressure` instead of
//! queueing.
//!
//! # Configuration
//!
//! - `KINETRIS_INPUT_HOST` (default `127.0.0.1`)
//! - `KINETRIS_INPUT_PORT` (default `7878`)
//! - `KINETRIS_INPUT_MAX_PENDING` (default `32`)
//! - `KINETRIS_INPUT_LOG_PATH`: append the raw wire traffic as JSONL
//! - `KINETRIS_INPUT_DISABLED=1`: do not start the server

pub mod protocol;
pub mod runtime;
pub mod server;

pub use kinetris_core as core;
pub use kinetris_input as input;
pub use kinetris_types as types;

pub use protocol::{ErrorCode, EventRecord, ParsedMessage, PROTOCOL_VERSION};
pub use runtime::{EventBroadcaster, InboundCommand, InboundPayload, InputBridge, OutboundMessage};
pub use server::{run_server, ServerConfig};
