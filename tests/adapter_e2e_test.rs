use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_test::{assert_err, assert_ok};

use kinetris::adapter::protocol::{create_event, create_hello, hello_line};
use kinetris::adapter::{run_server, InboundCommand, InboundPayload, OutboundMessage, ServerConfig};
use kinetris::input::Channel;
use kinetris::types::{Command, MatrixEvent};

struct Harness {
    server: JoinHandle<()>,
    addr: SocketAddr,
    cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
}

async fn start(max_pending: usize, log_path: Option<String>) -> Harness {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        max_pending,
        log_path,
    };

    let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(max_pending);
    let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let (ready_tx, ready_rx) = oneshot::channel();

    let server = tokio::spawn(async move {
        let _ = run_server(config, cmd_tx, out_rx, Some(ready_tx)).await;
    });

    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .expect("server did not signal ready")
        .expect("ready channel dropped");

    Harness {
        server,
        addr,
        cmd_rx,
        out_tx,
    }
}

struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect failed");
        let (read_half, writer) = stream.into_split();
        Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        }
    }

    async fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        self.writer.flush().await.unwrap();
    }

    async fn recv(&mut self) -> serde_json::Value {
        let line = tokio::time::timeout(Duration::from_secs(2), self.lines.next_line())
            .await
            .expect("timed out waiting for a line")
            .unwrap()
            .expect("connection closed");
        serde_json::from_str(&line).unwrap()
    }

    async fn hello(&mut self, stream_events: bool) {
        let hello = create_hello(1, "e2e-test", stream_events);
        self.send(&hello_line(&hello).unwrap()).await;
        let welcome = self.recv().await;
        assert_eq!(welcome["type"], "welcome");
        assert_eq!(welcome["seq"], 1);
    }
}

#[tokio::test]
async fn bridge_hello_command_signal_ack() {
    let mut h = start(8, None).await;
    let mut client = Client::connect(h.addr).await;
    client.hello(false).await;

    client
        .send(r#"{"type":"command","seq":2,"ts":1,"action":"move","value":-1}"#)
        .await;
    let inbound = tokio::time::timeout(Duration::from_secs(2), h.cmd_rx.recv())
        .await
        .unwrap()
        .expect("expected inbound command");
    assert_eq!(inbound.seq, 2);
    assert_eq!(inbound.payload, InboundPayload::Command(Command::Move(-1)));

    client
        .send(r#"{"type":"signal","seq":3,"ts":2,"channel":"L1","value":1.0,"clear":true}"#)
        .await;
    let inbound_signal = tokio::time::timeout(Duration::from_secs(2), h.cmd_rx.recv())
        .await
        .unwrap()
        .expect("expected inbound signal");
    assert_eq!(
        inbound_signal.payload,
        InboundPayload::Signal {
            channel: Channel::L1,
            value: 1.0,
            clear: true
        }
    );

    // ack after apply
    assert_ok!(h.out_tx.send(OutboundMessage::Ack {
        client_id: inbound.client_id,
        seq: inbound.seq,
    }));
    let ack = client.recv().await;
    assert_eq!(ack["type"], "ack");
    assert_eq!(ack["seq"], 2);
    assert_eq!(ack["status"], "ok");

    h.server.abort();
}

#[tokio::test]
async fn bridge_requires_hello_first() {
    let h = start(8, None).await;
    let mut client = Client::connect(h.addr).await;

    client
        .send(r#"{"type":"command","seq":1,"ts":0,"action":"drop"}"#)
        .await;
    let err = client.recv().await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], "handshake_required");
    assert_eq!(err["seq"], 1);

    h.server.abort();
}

#[tokio::test]
async fn bridge_rejects_stale_seq_and_bad_input() {
    let mut h = start(8, None).await;
    let mut client = Client::connect(h.addr).await;
    client.hello(false).await;

    client
        .send(r#"{"type":"command","seq":5,"ts":0,"action":"hold"}"#)
        .await;
    assert!(h.cmd_rx.recv().await.is_some());

    client
        .send(r#"{"type":"command","seq":5,"ts":0,"action":"hold"}"#)
        .await;
    let err = client.recv().await;
    assert_eq!(err["code"], "invalid_message");
    assert_eq!(err["seq"], 5);

    client
        .send(r#"{"type":"signal","seq":6,"ts":0,"channel":"w7","value":1.0}"#)
        .await;
    let err = client.recv().await;
    assert_eq!(err["code"], "invalid_command");

    client
        .send(r#"{"type":"command","seq":7,"ts":0,"action":"spin"}"#)
        .await;
    let err = client.recv().await;
    assert_eq!(err["code"], "invalid_command");

    client.send(r#"{"seq": 8, "type": "command""#).await;
    let err = client.recv().await;
    assert_eq!(err["code"], "invalid_message");
    assert_eq!(err["seq"], 8);

    client.send(r#"{"type":"telemetry","seq":9}"#).await;
    let err = client.recv().await;
    assert_eq!(err["code"], "invalid_message");

    assert_err!(h.cmd_rx.try_recv());
    h.server.abort();
}

#[tokio::test]
async fn bridge_backpressure_returns_error() {
    let h = start(1, None).await;
    let mut client = Client::connect(h.addr).await;
    client.hello(false).await;

    // nobody drains the queue
    client
        .send(r#"{"type":"command","seq":2,"ts":0,"action":"drop"}"#)
        .await;
    client
        .send(r#"{"type":"command","seq":3,"ts":0,"action":"drop"}"#)
        .await;

    let err = client.recv().await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], "backpressure");
    assert_eq!(err["seq"], 3);

    h.server.abort();
}

#[tokio::test]
async fn bridge_protocol_mismatch_closes() {
    let h = start(8, None).await;
    let mut client = Client::connect(h.addr).await;

    client
        .send(r#"{"type":"hello","seq":1,"ts":0,"client":{"name":"old","version":"0"},"protocol_version":"2.0.0"}"#)
        .await;
    let err = client.recv().await;
    assert_eq!(err["code"], "protocol_mismatch");

    let closed = tokio::time::timeout(Duration::from_secs(2), client.lines.next_line())
        .await
        .unwrap()
        .unwrap();
    assert!(closed.is_none());

    h.server.abort();
}

#[tokio::test]
async fn bridge_streams_events_to_subscribers_only() {
    let h = start(8, None).await;
    let mut watcher = Client::connect(h.addr).await;
    watcher.hello(true).await;
    let mut quiet = Client::connect(h.addr).await;
    quiet.hello(false).await;

    assert_ok!(h
        .out_tx
        .send(OutboundMessage::Event(create_event(1, &MatrixEvent::LevelChanged(1)))));

    let event = watcher.recv().await;
    assert_eq!(event["type"], "event");
    assert_eq!(event["event"]["name"], "levelChanged");
    assert_eq!(event["event"]["value"], 1);

    assert_err!(tokio::time::timeout(Duration::from_millis(200), quiet.lines.next_line()).await);

    h.server.abort();
}

#[tokio::test]
async fn bridge_writes_wire_log() {
    let path = std::env::temp_dir().join(format!("kinetris-wire-{}.jsonl", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let h = start(8, Some(path.to_string_lossy().into_owned())).await;
    let mut client = Client::connect(h.addr).await;
    client.hello(false).await;

    let mut logged = String::new();
    for _ in 0..50 {
        logged = std::fs::read_to_string(&path).unwrap_or_default();
        if logged.lines().count() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let lines: Vec<&str> = logged.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("\"hello\""));
    assert!(lines[1].contains("\"welcome\""));

    h.server.abort();
    let _ = std::fs::remove_file(&path);
}
