// Small value types carried inside protocol messages.
//
// These mirror the vocabulary the browser client already speaks: game names
// as they appear in `hello`/`app-setup`, the join option echoed in `setup`,
// the `message` request kinds, and board coordinates for Checkers moves.
// They are deliberately independent of `tabletop_core`; the server maps
// between the two.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Game selected at handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameName {
    TicTacToe,
    Checkers,
}

impl fmt::Display for GameName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameName::TicTacToe => f.write_str("TicTacToe"),
            GameName::Checkers => f.write_str("Checkers"),
        }
    }
}

/// How the receiving player entered its room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JoinOption {
    RandomRoom,
    CreateRoom,
    JoinRoom,
}

/// Payload of the `message` event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    NewGame,
    Surrender,
    SurrenderOk,
    ResetAlert,
    ResetStart,
    ResetConfirm,
    ResetCancel,
    DrawStart,
    DrawConfirm,
    DrawCancel,
    RoomNameTakenOk,
    RoomNotFoundOk,
}

/// Board coordinate as sent by clients. Wider than the board on purpose so
/// that out-of-range input deserializes and is rejected by the rules, not
/// by the parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowCol {
    pub row: i32,
    pub col: i32,
}
