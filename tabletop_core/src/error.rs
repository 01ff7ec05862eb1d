// Error taxonomy for the core.
//
// `IllegalMove` covers every reason a move can be refused. The server never
// reports these to clients: a refused move simply produces no `game-state`
// broadcast. `LobbyError` covers room and handshake requests; only
// `RoomNameTaken` and `RoomNotFound` have a client-visible event (sent by the
// lobby itself before returning the error). The rest describe actions from a
// connection that is not in a position to perform them, which the dispatch
// loop logs and drops.

use thiserror::Error;

use crate::square::Square;
use crate::types::ConnectionId;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IllegalMove {
    #[error("waiting for an opponent")]
    WaitingForOpponent,
    #[error("the game is already over")]
    GameOver,
    #[error("input is frozen until the pending request resolves")]
    Frozen,
    #[error("not your turn")]
    NotYourTurn,
    #[error("claimed side does not match the seat")]
    SideMismatch,

    #[error("tile {0} is out of range")]
    TileOutOfRange(i32),
    #[error("tile {0} is already taken")]
    TileTaken(i32),

    #[error("square {0} is off the board")]
    OffBoard(Square),
    #[error("no piece of the mover at {0}")]
    NoPieceAt(Square),
    #[error("move is not along a diagonal")]
    NotDiagonal,
    #[error("destination {0} is occupied")]
    Occupied(Square),
    #[error("a capture is available and must be taken")]
    CaptureRequired,
    #[error("only the piece that just captured may move")]
    ChainPieceMustMove,
    #[error("an uncrowned piece cannot step backwards")]
    Backward,
    #[error("no enemy piece to capture")]
    NothingToCapture,
    #[error("path is blocked")]
    BlockedPath,
    #[error("an uncrowned piece cannot move that far")]
    TooFar,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LobbyError {
    #[error("room name {0:?} is already taken")]
    RoomNameTaken(String),
    #[error("no room named {0:?}")]
    RoomNotFound(String),
    #[error("connection {0} asked for a room with a blank name")]
    BlankRoomName(ConnectionId),
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),
    #[error("connection {0} is not in a room")]
    NotInRoom(ConnectionId),
    #[error("connection {0} is already in a room")]
    AlreadyInRoom(ConnectionId),
    #[error("connection {0} is not seated")]
    NotAPlayer(ConnectionId),
    #[error("connection {0} has no opponent")]
    NoOpponent(ConnectionId),
    #[error("connection {0} answered a request that is not pending")]
    NoPendingRequest(ConnectionId),
    #[error("connection {0} asked for something the game state does not allow")]
    GameNotActive(ConnectionId),
    #[error(transparent)]
    IllegalMove(#[from] IllegalMove),
}

impl LobbyError {
    /// True for errors the requesting client was told about.
    pub fn is_reported(&self) -> bool {
        matches!(self, LobbyError::RoomNameTaken(_) | LobbyError::RoomNotFound(_))
    }
}
