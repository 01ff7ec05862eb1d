// Identifier and tag types shared by the lobby, rooms, and the server.
//
// `ConnectionId` is assigned by the transport layer when a client completes
// its handshake; the core never invents one. `RoomId` is allocated by the
// `Lobby` from a per-lobby counter. Both are compact integers rather than
// random strings so that logs stay short and ordering is deterministic.

use std::fmt;

use serde::Serialize;

/// Transport-assigned connection identity (one per connected client).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConnectionId(pub u32);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Lobby-assigned room identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// The two games the service hosts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum GameKind {
    TicTacToe,
    Checkers,
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameKind::TicTacToe => f.write_str("TicTacToe"),
            GameKind::Checkers => f.write_str("Checkers"),
        }
    }
}

/// How a player entered its current room. Echoed back in `setup` so the
/// client knows which lobby screen it came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JoinOption {
    RandomRoom,
    CreateRoom,
    JoinRoom,
}
