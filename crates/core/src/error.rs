use chess_rooms_engine::RulesError;
use chess_rooms_types::RoomKey;

/// Why a connection could not be seated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("room {0} is full")]
    RoomFull(RoomKey),
}

impl JoinError {
    pub fn client_message(&self) -> &'static str {
        match self {
            JoinError::RoomFull(_) => "Room is full",
        }
    }
}

/// Why a move request was refused. None of these change session state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    /// The room is gone or the caller does not hold the seat it claims.
    #[error("connection does not hold a seat in this room")]
    NotSeated,

    #[error("waiting for an opponent")]
    WaitingForOpponent,

    #[error("game is over")]
    GameOver,

    #[error("not your turn")]
    NotYourTurn,

    #[error(transparent)]
    Rules(#[from] RulesError),
}

impl MoveError {
    /// Text sent back to the requesting connection.
    ///
    /// `None` means the request is dropped silently: a connection without a
    /// seat gets no reply.
    pub fn client_message(&self) -> Option<&'static str> {
        match self {
            MoveError::NotSeated => None,
            MoveError::WaitingForOpponent => Some("Waiting for opponent"),
            MoveError::GameOver => Some("Game is over"),
            MoveError::NotYourTurn => Some("Not your turn"),
            MoveError::Rules(_) => Some("Invalid move"),
        }
    }
}
