//! Bridge runtime integration.
//!
//! Bridges the sync game loop with the async TCP server.

use std::net::SocketAddr;

use tokio::runtime::Runtime;
use tokio::sync::{mpsc, oneshot};

use crate::core::{Matrix, MatrixControl, MatrixObserver};
use crate::input::{Channel, InputManager};
use crate::protocol::{create_error, create_event, ErrorCode, ErrorMessage, EventMessage};
use crate::server::{run_server, ServerConfig};
use crate::types::{Command, MatrixEvent};

/// Input delivered to the game loop.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundCommand {
    pub client_id: u64,
    pub seq: u64,
    pub payload: InboundPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundPayload {
    /// Channel write for the input manager
    Signal {
        channel: Channel,
        value: f64,
        clear: bool,
    },
    /// Direct matrix command, bypassing the player
    Command(Command),
}

/// Outbound message to be delivered by the server.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    Ack { client_id: u64, seq: u64 },
    Error { client_id: u64, err: ErrorMessage },
    /// Sent to every client that asked for events
    Event(EventMessage),
}

/// Running bridge instance.
pub struct InputBridge {
    _rt: Runtime,
    local_addr: SocketAddr,
    cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl InputBridge {
    /// Start the bridge from environment variables.
    ///
    /// Returns `Ok(None)` if `KINETRIS_INPUT_DISABLED` is set.
    pub fn start_from_env() -> anyhow::Result<Option<Self>> {
        if ServerConfig::is_disabled() {
            return Ok(None);
        }
        Self::start(ServerConfig::from_env()).map(Some)
    }

    /// Start the server on its own runtime and wait until it is listening
    pub fn start(config: ServerConfig) -> anyhow::Result<Self> {
        let max_pending = config.max_pending.max(1);
        let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(max_pending);
        let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
        let (ready_tx, ready_rx) = oneshot::channel();

        let rt = Runtime::new()?;
        rt.spawn(async move {
            if let Err(e) = run_server(config, cmd_tx, out_rx, Some(ready_tx)).await {
                eprintln!("[Adapter] Server stopped: {}", e);
            }
        });

        let local_addr = rt
            .block_on(ready_rx)
            .map_err(|_| anyhow::anyhow!("input server failed to start"))?;

        Ok(Self {
            _rt: rt,
            local_addr,
            cmd_rx,
            out_tx,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn try_recv(&mut self) -> Option<InboundCommand> {
        self.cmd_rx.try_recv().ok()
    }

    pub fn send(&self, msg: OutboundMessage) {
        let _ = self.out_tx.send(msg);
    }

    pub fn ack(&self, client_id: u64, seq: u64) {
        self.send(OutboundMessage::Ack { client_id, seq });
    }

    pub fn reject(&self, client_id: u64, seq: u64, code: ErrorCode, message: &str) {
        self.send(OutboundMessage::Error {
            client_id,
            err: create_error(seq, code, message),
        });
    }

    /// Apply one inbound input and acknowledge it
    ///
    /// Signals land in `input` and take effect on its next update. Commands
    /// reach the matrix right away.
    pub fn apply(
        &self,
        cmd: InboundCommand,
        input: &mut InputManager,
        matrix: &mut impl MatrixControl,
    ) {
        match cmd.payload {
            InboundPayload::Signal {
                channel,
                value,
                clear,
            } => input.set(channel, value, clear),
            InboundPayload::Command(command) => matrix.apply(command),
        }
        self.ack(cmd.client_id, cmd.seq);
    }

    /// Drain everything queued so far; returns how many inputs were applied
    pub fn pump(&mut self, input: &mut InputManager, matrix: &mut impl MatrixControl) -> usize {
        let mut applied = 0;
        while let Some(cmd) = self.try_recv() {
            self.apply(cmd, input, matrix);
            applied += 1;
        }
        applied
    }

    /// Observer that streams matrix events to subscribed clients
    pub fn broadcaster(&self) -> EventBroadcaster {
        EventBroadcaster::new(self.out_tx.clone())
    }
}

/// Forwards matrix events to the server as `event` messages.
pub struct EventBroadcaster {
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
    seq: u64,
}

impl EventBroadcaster {
    pub fn new(out_tx: mpsc::UnboundedSender<OutboundMessage>) -> Self {
        Self { out_tx, seq: 0 }
    }
}

impl MatrixObserver for EventBroadcaster {
    fn on_event(&mut self, event: &MatrixEvent, _matrix: &Matrix) {
        self.seq += 1;
        let _ = self
            .out_tx
            .send(OutboundMessage::Event(create_event(self.seq, event)));
    }
}
