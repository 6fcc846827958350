//! TCP server for remote control
//!
//! Handles incoming connections and manages client lifecycle.
//! Line-framed JSON over tokio; the first client to complete the hello
//! handshake becomes the controller, later clients observe. Observations
//! are fanned out to every handshaken client.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};

use neon_blocks_core::GameSnapshot;
use neon_blocks_types::{Difficulty, GameCommand};

use crate::protocol::{
    encode_server_message, parse_client_line, AckStatus, ClientMessage, CommandBody, CommandKind,
    ErrorCode, HelloBody, ObservationBody, Role, ScoreEntry, ServerMessage, PROTOCOL_VERSION,
};
use crate::runtime::SessionRequest;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Capacity of the request channel into the session loop.
    pub max_pending_commands: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7777,
            max_pending_commands: 32,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        let host = env::var("NEONBLOCKS_HOST").unwrap_or(defaults.host);
        let port = env::var("NEONBLOCKS_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);
        let max_pending_commands = env::var("NEONBLOCKS_MAX_PENDING")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_pending_commands);

        Self {
            host,
            port,
            max_pending_commands,
        }
    }

    /// Check if the remote-control server is disabled via environment
    pub fn is_disabled() -> bool {
        std::env::var("NEONBLOCKS_DISABLED")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false)
    }
}

/// Handle to a connected client
struct ClientHandle {
    id: u64,
    name: String,
    handshaken: bool,
    is_controller: bool,
    tx: mpsc::UnboundedSender<String>,
}

/// Shared server state
struct ServerState {
    clients: RwLock<Vec<ClientHandle>>,
    controller: RwLock<Option<u64>>,
}

impl ServerState {
    fn new() -> Self {
        Self {
            clients: RwLock::new(Vec::new()),
            controller: RwLock::new(None),
        }
    }

    async fn send_to(&self, client_id: u64, message: &ServerMessage) {
        let line = encode_server_message(message);
        let clients = self.clients.read().await;
        if let Some(client) = clients.iter().find(|c| c.id == client_id) {
            let _ = client.tx.send(line);
        }
    }
}

/// Accept connections and serve them until the listener fails.
///
/// `ready` (used by tests) receives the actual bound address, which matters
/// when the config asks for port 0.
pub async fn run_server(
    config: ServerConfig,
    requests: mpsc::Sender<SessionRequest>,
    observations: mpsc::UnboundedReceiver<GameSnapshot>,
    ready: Option<oneshot::Sender<SocketAddr>>,
) -> Result<()> {
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    if let Some(ready) = ready {
        let _ = ready.send(listener.local_addr()?);
    }

    let state = Arc::new(ServerState::new());
    tokio::spawn(fan_out_observations(observations, Arc::clone(&state)));

    let mut next_id: u64 = 0;
    loop {
        let (stream, _addr) = listener.accept().await?;
        next_id += 1;
        tokio::spawn(handle_client(
            stream,
            next_id,
            Arc::clone(&state),
            requests.clone(),
        ));
    }
}

/// Broadcast every published snapshot to all handshaken clients.
async fn fan_out_observations(
    mut observations: mpsc::UnboundedReceiver<GameSnapshot>,
    state: Arc<ServerState>,
) {
    let mut seq: u64 = 0;
    while let Some(snapshot) = observations.recv().await {
        seq += 1;
        let body = ObservationBody::from_snapshot(seq, &snapshot);
        let line = encode_server_message(&ServerMessage::Observation(body));
        let clients = state.clients.read().await;
        for client in clients.iter().filter(|c| c.handshaken) {
            let _ = client.tx.send(line.clone());
        }
    }
}

async fn handle_client(
    stream: TcpStream,
    id: u64,
    state: Arc<ServerState>,
    requests: mpsc::Sender<SessionRequest>,
) {
    let (read_half, mut write_half) = stream.into_split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    state.clients.write().await.push(ClientHandle {
        id,
        name: String::new(),
        handshaken: false,
        is_controller: false,
        tx,
    });

    let writer = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if write_half.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            if write_half.write_all(b"\n").await.is_err() {
                break;
            }
        }
    });

    let mut lines = BufReader::new(read_half).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_client_line(line) {
            Ok(ClientMessage::Hello(hello)) => {
                handle_hello(&state, id, hello).await;
            }
            Ok(ClientMessage::Command(command)) => {
                handle_command(&state, id, command, &requests).await;
            }
            Err(err) => {
                state
                    .send_to(
                        id,
                        &ServerMessage::Error {
                            seq: 0,
                            code: ErrorCode::BadMessage,
                            message: err.to_string(),
                        },
                    )
                    .await;
            }
        }
    }

    // Disconnect: drop the handle and free the controller slot if held.
    {
        let mut clients = state.clients.write().await;
        clients.retain(|c| c.id != id);
    }
    {
        let mut controller = state.controller.write().await;
        if *controller == Some(id) {
            *controller = None;
        }
    }
    writer.abort();
}

async fn handle_hello(state: &Arc<ServerState>, id: u64, hello: HelloBody) {
    let role = {
        let mut controller = state.controller.write().await;
        if controller.is_none() {
            *controller = Some(id);
            Role::Controller
        } else if *controller == Some(id) {
            Role::Controller
        } else {
            Role::Observer
        }
    };

    {
        let mut clients = state.clients.write().await;
        if let Some(client) = clients.iter_mut().find(|c| c.id == id) {
            client.handshaken = true;
            client.name = hello.client.name.clone();
            client.is_controller = role == Role::Controller;
        }
    }

    state
        .send_to(
            id,
            &ServerMessage::Welcome {
                seq: hello.seq,
                protocol_version: PROTOCOL_VERSION,
                role,
            },
        )
        .await;
}

async fn handle_command(
    state: &Arc<ServerState>,
    id: u64,
    command: CommandBody,
    requests: &mpsc::Sender<SessionRequest>,
) {
    let seq = command.seq;

    let (handshaken, is_controller, name) = {
        let clients = state.clients.read().await;
        match clients.iter().find(|c| c.id == id) {
            Some(c) => (c.handshaken, c.is_controller, c.name.clone()),
            None => return,
        }
    };
    if !handshaken || !is_controller {
        state
            .send_to(
                id,
                &ServerMessage::Error {
                    seq,
                    code: ErrorCode::NotController,
                    message: "commands require the controller role".to_string(),
                },
            )
            .await;
        return;
    }

    match command.kind {
        CommandKind::StartSession {
            difficulty,
            rows,
            cols,
        } => {
            let Some(difficulty) = Difficulty::from_str(&difficulty) else {
                bad_params(state, id, seq, format!("unknown difficulty: {difficulty}")).await;
                return;
            };
            let (reply, result) = oneshot::channel();
            let request = SessionRequest::Start {
                difficulty,
                rows,
                cols,
                player: name,
                reply,
            };
            if requests.send(request).await.is_err() {
                return;
            }
            match result.await {
                Ok(Ok(())) => {
                    state
                        .send_to(
                            id,
                            &ServerMessage::Ack {
                                seq,
                                status: AckStatus::Ok,
                            },
                        )
                        .await;
                }
                Ok(Err(err)) => bad_params(state, id, seq, err.to_string()).await,
                Err(_) => {}
            }
        }
        CommandKind::Action { action } => {
            let Some(command) = GameCommand::from_str(&action) else {
                state
                    .send_to(
                        id,
                        &ServerMessage::Error {
                            seq,
                            code: ErrorCode::BadCommand,
                            message: format!("unknown action: {action}"),
                        },
                    )
                    .await;
                return;
            };
            let (reply, result) = oneshot::channel();
            let request = SessionRequest::Command {
                command,
                reply: Some(reply),
            };
            if requests.send(request).await.is_err() {
                return;
            }
            // Ignored acks cover silently rejected moves (wall bumps,
            // repeats, commands outside Playing).
            let status = match result.await {
                Ok(true) => AckStatus::Ok,
                Ok(false) => AckStatus::Ignored,
                Err(_) => return,
            };
            state
                .send_to(id, &ServerMessage::Ack { seq, status })
                .await;
        }
        CommandKind::LeaderboardTop { difficulty, limit } => {
            let Some(difficulty) = Difficulty::from_str(&difficulty) else {
                bad_params(state, id, seq, format!("unknown difficulty: {difficulty}")).await;
                return;
            };
            let (reply, result) = oneshot::channel();
            let request = SessionRequest::LeaderboardTop {
                difficulty,
                limit,
                reply,
            };
            if requests.send(request).await.is_err() {
                return;
            }
            let entries = result.await.unwrap_or_default();
            state
                .send_to(
                    id,
                    &ServerMessage::Leaderboard {
                        seq,
                        difficulty: difficulty.as_str().to_string(),
                        entries: entries
                            .into_iter()
                            .map(|e| ScoreEntry {
                                player: e.player,
                                score: e.score,
                            })
                            .collect(),
                    },
                )
                .await;
        }
    }
}

async fn bad_params(state: &Arc<ServerState>, id: u64, seq: u64, message: String) {
    state
        .send_to(
            id,
            &ServerMessage::Error {
                seq,
                code: ErrorCode::BadParams,
                message,
            },
        )
        .await;
}
