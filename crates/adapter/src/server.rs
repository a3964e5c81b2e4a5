//! TCP server for the remote input bridge
//!
//! Handles incoming connections and manages client lifecycle.
//! Uses tokio for async networking.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};

use crate::protocol::*;
use crate::runtime::{InboundCommand, InboundPayload, OutboundMessage};

fn extract_seq_best_effort(s: &str) -> Option<u64> {
    let start = s.find("\"seq\"")?;
    let after_key = &s[start + 5..];
    let colon = after_key.find(':')?;
    let rest = after_key[colon + 1..].trim_start();
    let end = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if end == 0 {
        return None;
    }
    rest[..end].parse::<u64>().ok()
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Capacity of the inbound queue; a full queue answers `backpressure`
    pub max_pending: usize,
    /// Append every wire line to this file (JSONL)
    pub log_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7878,
            max_pending: 32,
            log_path: None,
        }
    }
}

impl ServerConfig {
    /// Create from `KINETRIS_INPUT_*` environment variables
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        let host = env::var("KINETRIS_INPUT_HOST").unwrap_or(defaults.host);
        let port = env::var("KINETRIS_INPUT_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let max_pending = env::var("KINETRIS_INPUT_MAX_PENDING")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_pending);

        let log_path = env::var("KINETRIS_INPUT_LOG_PATH")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Self {
            host,
            port,
            max_pending,
            log_path,
        }
    }

    /// Remote input is off when `KINETRIS_INPUT_DISABLED` is `1` or `true`
    pub fn is_disabled() -> bool {
        std::env::var("KINETRIS_INPUT_DISABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid socket address {}:{}: {}", self.host, self.port, e))
    }
}

/// Shared server state
struct ServerState {
    clients: RwLock<Vec<ClientHandle>>,
}

impl ServerState {
    fn new() -> Self {
        Self {
            clients: RwLock::new(Vec::new()),
        }
    }

    async fn is_handshaken(&self, client_id: u64) -> bool {
        let clients = self.clients.read().await;
        clients
            .iter()
            .find(|c| c.id == client_id)
            .map(|c| c.handshaken)
            .unwrap_or(false)
    }

    /// Record `seq` if it is strictly greater than the last one seen
    async fn check_and_update_seq(&self, client_id: u64, seq: u64) -> bool {
        let mut clients = self.clients.write().await;
        let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
            return true;
        };

        match client.last_seq {
            Some(prev) if seq <= prev => false,
            _ => {
                client.last_seq = Some(seq);
                true
            }
        }
    }

    async fn send_to(&self, client_id: u64, msg: ClientOutbound) {
        let clients = self.clients.read().await;
        if let Some(c) = clients.iter().find(|c| c.id == client_id) {
            let _ = c.tx.send(msg);
        }
    }
}

/// Handle to a connected client
struct ClientHandle {
    id: u64,
    handshaken: bool,
    stream_events: bool,
    last_seq: Option<u64>,
    tx: mpsc::UnboundedSender<ClientOutbound>,
}

#[derive(Debug, Clone)]
enum ClientOutbound {
    Welcome(WelcomeMessage),
    Ack(AckMessage),
    Error(ErrorMessage),
    Event(Arc<EventMessage>),
}

impl ClientOutbound {
    fn write_json(&self, buf: &mut Vec<u8>) -> serde_json::Result<()> {
        match self {
            ClientOutbound::Welcome(v) => serde_json::to_writer(buf, v),
            ClientOutbound::Ack(v) => serde_json::to_writer(buf, v),
            ClientOutbound::Error(v) => serde_json::to_writer(buf, v),
            ClientOutbound::Event(v) => serde_json::to_writer(buf, v.as_ref()),
        }
    }
}

type WireLog = Option<mpsc::UnboundedSender<Vec<u8>>>;

/// Spawn the wire log writer; every record is one line in the file
fn spawn_wire_log(path: Option<String>) -> WireLog {
    let path = path?;
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
    tokio::spawn(async move {
        use tokio::fs::OpenOptions;

        let mut file = match OpenOptions::new().create(true).append(true).open(&path).await {
            Ok(f) => f,
            Err(e) => {
                eprintln!("[Adapter] Cannot open wire log {}: {}", path, e);
                return;
            }
        };

        while let Some(mut bytes) = rx.recv().await {
            bytes.push(b'\n');
            if file.write_all(&bytes).await.is_err() || file.flush().await.is_err() {
                break;
            }
        }
    });
    Some(tx)
}

/// Start the TCP server
///
/// `ready_tx` receives the bound address once the listener is up, which is
/// how callers binding port 0 learn the real port.
pub async fn run_server(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    mut out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let wire_log = spawn_wire_log(config.log_path.clone());

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(&addr).await?;
    let bound = listener.local_addr()?;
    println!("[Adapter] TCP server listening on {}", bound);
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState::new());
    let mut client_id_counter = 0u64;

    // Outbound dispatcher.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                match msg {
                    OutboundMessage::Ack { client_id, seq } => {
                        state
                            .send_to(client_id, ClientOutbound::Ack(create_ack(seq)))
                            .await;
                    }
                    OutboundMessage::Error { client_id, err } => {
                        state.send_to(client_id, ClientOutbound::Error(err)).await;
                    }
                    OutboundMessage::Event(event) => {
                        let event = Arc::new(event);
                        let clients = state.clients.read().await;
                        for c in clients.iter().filter(|c| c.handshaken && c.stream_events) {
                            let _ = c.tx.send(ClientOutbound::Event(Arc::clone(&event)));
                        }
                    }
                }
            }
        });
    }

    // Accept incoming connections
    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;

        println!("[Adapter] Client {} connected from {}", client_id, addr);

        let state = Arc::clone(&state);
        let command_tx = command_tx.clone();
        let wire_log = wire_log.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, client_id, &state, command_tx, wire_log).await
            {
                eprintln!("[Adapter] Client {} error: {}", client_id, e);
            }
            state.clients.write().await.retain(|c| c.id != client_id);
            println!("[Adapter] Client {} disconnected", client_id);
        });
    }
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    client_id: u64,
    state: &ServerState,
    command_tx: mpsc::Sender<InboundCommand>,
    wire_log: WireLog,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);

    let (tx, mut rx) = mpsc::unbounded_channel::<ClientOutbound>();

    state.clients.write().await.push(ClientHandle {
        id: client_id,
        handshaken: false,
        stream_events: false,
        last_seq: None,
        tx: tx.clone(),
    });

    // Writer task: one JSON object per line.
    let wire_log_out = wire_log.clone();
    let write_task = tokio::spawn(async move {
        let mut buf: Vec<u8> = Vec::with_capacity(1024);
        while let Some(msg) = rx.recv().await {
            buf.clear();
            if msg.write_json(&mut buf).is_err() {
                continue;
            }
            if let Some(log) = wire_log_out.as_ref() {
                let _ = log.send(buf.clone());
            }
            buf.push(b'\n');
            if writer.write_all(&buf).await.is_err() || writer.flush().await.is_err() {
                break;
            }
        }
    });

    let reject = |seq: u64, code: ErrorCode, message: &str| {
        let _ = tx.send(ClientOutbound::Error(create_error(seq, code, message)));
    };

    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            break;
        }

        let raw_line = line.trim_end_matches(['\n', '\r']);
        let trimmed = raw_line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(log) = wire_log.as_ref() {
            let _ = log.send(raw_line.as_bytes().to_vec());
        }

        let (seq, payload) = match parse_message(trimmed) {
            Ok(ParsedMessage::Hello(hello)) => {
                if state.is_handshaken(client_id).await
                    && !state.check_and_update_seq(client_id, hello.seq).await
                {
                    reject(hello.seq, ErrorCode::InvalidMessage, "seq must be strictly increasing");
                    continue;
                }

                if !protocol_compatible(&hello.protocol_version) {
                    reject(
                        hello.seq,
                        ErrorCode::ProtocolMismatch,
                        &format!("Protocol version {} not supported", hello.protocol_version),
                    );
                    break;
                }

                {
                    let mut clients = state.clients.write().await;
                    if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
                        client.handshaken = true;
                        client.stream_events = hello.stream_events;
                        client.last_seq = Some(hello.seq);
                    }
                }
                println!(
                    "[Adapter] Client {} is {} {}",
                    client_id, hello.client.name, hello.client.version
                );

                let _ = tx.send(ClientOutbound::Welcome(create_welcome(hello.seq, client_id)));
                continue;
            }

            Ok(ParsedMessage::Signal(signal)) => (
                signal.seq,
                map_signal(&signal).map(|channel| InboundPayload::Signal {
                    channel,
                    value: signal.value,
                    clear: signal.clear,
                }),
            ),

            Ok(ParsedMessage::Command(cmd)) => {
                (cmd.seq, map_command(&cmd).map(InboundPayload::Command))
            }

            Ok(ParsedMessage::Unknown(unknown)) => (
                unknown.seq,
                Err((ErrorCode::InvalidMessage, "Unknown message type".to_string())),
            ),

            Err(e) => {
                let seq = extract_seq_best_effort(trimmed).unwrap_or(0);
                reject(seq, ErrorCode::InvalidMessage, &format!("JSON parse error: {}", e));
                continue;
            }
        };

        if !state.is_handshaken(client_id).await {
            reject(seq, ErrorCode::HandshakeRequired, "Send hello first");
            continue;
        }

        if !state.check_and_update_seq(client_id, seq).await {
            reject(seq, ErrorCode::InvalidMessage, "seq must be strictly increasing");
            continue;
        }

        let payload = match payload {
            Ok(p) => p,
            Err((code, message)) => {
                reject(seq, code, &message);
                continue;
            }
        };

        // Ack is sent by the game loop once the input has been applied.
        if command_tx
            .try_send(InboundCommand {
                client_id,
                seq,
                payload,
            })
            .is_err()
        {
            reject(seq, ErrorCode::Backpressure, "Input queue is full");
        }
    }

    drop(tx);
    state.clients.write().await.retain(|c| c.id != client_id);
    let _ = write_task.await;
    Ok(())
}
