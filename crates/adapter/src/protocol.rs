//! Protocol module - JSON message types for remote control
//!
//! Line-delimited JSON over TCP. Every message carries a `type` tag and a
//! client-chosen `seq` echoed back in replies so callers can correlate
//! responses. Observations are server-initiated and carry their own running
//! sequence.
//!
//! Board rows travel as strings, one character per cell: `.` for empty,
//! an uppercase piece letter for a settled cell, lowercase for the transient
//! falling-piece overlay.

use serde::{Deserialize, Serialize};

use neon_blocks_core::GameSnapshot;
use neon_blocks_types::CellState;

/// Protocol version advertised in the welcome message.
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Default entry count for leaderboard queries.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

// ============== Client -> Server Messages ==============

/// Any message a client may send.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    Hello(HelloBody),
    Command(CommandBody),
}

/// Handshake; the first client to hello becomes the controller.
#[derive(Debug, Clone, Deserialize)]
pub struct HelloBody {
    pub seq: u64,
    pub client: ClientInfo,
    #[serde(default)]
    pub protocol_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// A command from the controller.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandBody {
    pub seq: u64,
    #[serde(flatten)]
    pub kind: CommandKind,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "name", rename_all = "camelCase")]
pub enum CommandKind {
    /// Begin a session with externally computed board dimensions.
    StartSession {
        difficulty: String,
        rows: usize,
        cols: usize,
    },
    /// A discrete gameplay command (`moveLeft`, `rotate`, ...).
    Action { action: String },
    /// Fetch the ranked top list for one difficulty.
    LeaderboardTop {
        difficulty: String,
        #[serde(default = "default_limit")]
        limit: usize,
    },
}

fn default_limit() -> usize {
    DEFAULT_LEADERBOARD_LIMIT
}

// ============== Server -> Client Messages ==============

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Welcome {
        seq: u64,
        protocol_version: &'static str,
        role: Role,
    },
    Observation(ObservationBody),
    Ack {
        seq: u64,
        status: AckStatus,
    },
    Error {
        seq: u64,
        code: ErrorCode,
        message: String,
    },
    Leaderboard {
        seq: u64,
        difficulty: String,
        entries: Vec<ScoreEntry>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Controller,
    Observer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AckStatus {
    /// The command changed engine state.
    Ok,
    /// The command was legal but had no effect (wall bump, repeat, ...).
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    BadMessage,
    BadCommand,
    BadParams,
    NotController,
}

/// Full game view streamed to every handshaken client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationBody {
    pub seq: u64,
    pub status: &'static str,
    pub rows: usize,
    pub cols: usize,
    /// One string per row, top to bottom; see the module docs for the
    /// per-cell encoding.
    pub board: Vec<String>,
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    pub drop_interval_ms: u32,
}

impl ObservationBody {
    /// Encode a snapshot for the wire.
    pub fn from_snapshot(seq: u64, snapshot: &GameSnapshot) -> Self {
        let board = (0..snapshot.rows())
            .map(|y| {
                snapshot
                    .row(y)
                    .iter()
                    .map(|cell| match (cell.kind, cell.state) {
                        (None, _) => '.',
                        (Some(kind), CellState::Settled) => kind.as_char(),
                        (Some(kind), CellState::Clearing) => {
                            kind.as_char().to_ascii_lowercase()
                        }
                    })
                    .collect()
            })
            .collect();

        Self {
            seq,
            status: snapshot.status.as_str(),
            rows: snapshot.rows(),
            cols: snapshot.cols(),
            board,
            score: snapshot.score,
            level: snapshot.level,
            lines: snapshot.lines_cleared,
            drop_interval_ms: snapshot.drop_interval_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub player: String,
    pub score: u32,
}

/// Parse one inbound line.
pub fn parse_client_line(line: &str) -> Result<ClientMessage, serde_json::Error> {
    serde_json::from_str(line)
}

/// Serialize one outbound message (no trailing newline).
pub fn encode_server_message(message: &ServerMessage) -> String {
    // Infallible for these types: no maps with non-string keys, no
    // non-finite floats.
    serde_json::to_string(message).expect("protocol message serialization")
}
