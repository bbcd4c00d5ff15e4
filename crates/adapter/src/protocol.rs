//! Protocol module - JSON message types for chess room clients
//!
//! Every frame is a single JSON object with a `type` field.

use serde::{Deserialize, Serialize};

use chess_rooms_core::SessionEvent;

// ============== Client -> Server Messages ==============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Move token in UCI long algebraic notation.
    #[serde(rename = "move")]
    pub token: String,
}

/// Parsed incoming message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Move(MoveRequest),
    /// A well-formed message with a `type` this server does not handle.
    Unknown(String),
}

/// Why an inbound frame could not be understood.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message has no string \"type\" field")]
    MissingType,

    #[error("move message has no string \"move\" field")]
    MissingMove,

    #[error("binary frames are not supported")]
    Binary,
}

/// Parse a JSON message from a string
///
/// Unrecognized `type` values are returned as [`ClientMessage::Unknown`]
/// rather than as an error.
pub fn parse_message(json: &str) -> Result<ClientMessage, ProtocolError> {
    #[derive(Debug, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    enum InboundMessage {
        Move(MoveRequest),
    }

    match serde_json::from_str::<InboundMessage>(json) {
        Ok(InboundMessage::Move(m)) => Ok(ClientMessage::Move(m)),
        Err(e) => {
            #[derive(Debug, Deserialize)]
            struct TypeOnly {
                #[serde(rename = "type")]
                msg_type: Option<serde_json::Value>,
            }
            let msg_type = serde_json::from_str::<TypeOnly>(json)?
                .msg_type
                .ok_or(ProtocolError::MissingType)?;
            match msg_type.as_str() {
                Some("move") => {
                    if e.is_data() {
                        Err(ProtocolError::MissingMove)
                    } else {
                        Err(e.into())
                    }
                }
                Some(other) => Ok(ClientMessage::Unknown(other.to_string())),
                None => Err(ProtocolError::MissingType),
            }
        }
    }
}

// ============== Server -> Client Messages ==============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    GameStart {
        color: String,
        fen: String,
        move_history: Vec<String>,
    },
    Move {
        #[serde(rename = "move")]
        token: String,
        fen: String,
        status: String,
        move_history: Vec<String>,
    },
    Error {
        message: String,
    },
    OpponentDisconnected,
}

impl From<SessionEvent> for ServerMessage {
    fn from(event: SessionEvent) -> Self {
        match event {
            SessionEvent::GameStart {
                color,
                position,
                history,
            } => ServerMessage::GameStart {
                color: color.as_str().to_string(),
                fen: position,
                move_history: history,
            },
            SessionEvent::Moved {
                token,
                position,
                status,
                history,
            } => ServerMessage::Move {
                token,
                fen: position,
                status,
                move_history: history,
            },
            SessionEvent::Rejected { reason } => ServerMessage::Error { message: reason },
            SessionEvent::OpponentLeft => ServerMessage::OpponentDisconnected,
        }
    }
}

// ============== Utility Functions ==============

/// Create an error message
pub fn create_error(message: &str) -> ServerMessage {
    ServerMessage::Error {
        message: message.to_string(),
    }
}

pub const MALFORMED_MESSAGE: &str = "Malformed message";
