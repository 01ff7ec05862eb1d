// Protocol messages between browser-style clients and the game server.
//
// Two enums define the full vocabulary:
// - `ClientMessage`: sent by clients (handshake, matchmaking, moves, in-room
//   requests, goodbye).
// - `ServerMessage`: sent by the server to one connection or to every
//   member of a room.
//
// Every message is an envelope `{"event": "<name>", "data": <payload>}`,
// with `data` omitted for payload-less events. Event names are kebab-case
// and match what existing clients listen for, so renaming a variant is a
// wire break.
//
// Board snapshots (the game-specific fields of `setup`, the whole
// `game-state` payload) travel as opaque JSON. The server serializes them
// from `tabletop_core` types; this crate never interprets them.
//
// Move payloads use wide signed integers so that any number a client sends
// still parses; range checks belong to the rules, not to the parser.

use serde::{Deserialize, Serialize};

use crate::types::{GameName, JoinOption, MessageKind, RowCol};

/// Handshake: the player's display name and chosen game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
    pub user_name: String,
    pub game: GameName,
}

/// TicTacToe move. `player` is the side token the client believes it plays.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileClick {
    pub id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
}

/// Checkers move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceMove {
    pub move_from: RowCol,
    pub move_to: RowCol,
}

/// Messages sent by a client to the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Register with a game (must be the first message).
    Hello(Hello),
    /// Join or open a random room.
    RandomRoom,
    /// Open a named room.
    CreateRoom(String),
    /// Join a named room, as a player or spectator.
    JoinRoom(String),
    TileClicked(TileClick),
    PieceMoved(PieceMove),
    /// In-room request or acknowledgement.
    Message(MessageKind),
    /// Player is leaving gracefully.
    Goodbye,
}

/// Personal room view sent on entering a room.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Setup {
    /// Game-specific board fields: `tiles`, plus `crowns` and `pieces` for
    /// Checkers.
    #[serde(flatten)]
    pub board: serde_json::Map<String, serde_json::Value>,
    pub current_player: String,
    pub role: String,
    pub waiting_for_opponent: bool,
    pub join_option: JoinOption,
}

/// Messages sent by the server to a client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Handshake accepted for this game.
    AppSetup(GameName),
    Setup(Setup),
    /// Both seats are filled.
    StartGame,
    /// Full room state snapshot.
    GameState(serde_json::Value),
    /// Stop accepting input until the next state change.
    Freeze,
    /// The opponent surrendered.
    OppSurrender,
    ResetAlert,
    /// The opponent proposes a reset.
    ResetStart,
    ResetCancel,
    /// The opponent proposes a draw.
    DrawStart,
    DrawCancel,
    RoomNameTaken,
    RoomNameTakenOk,
    RoomNotFound,
    RoomNotFoundOk,
}

impl ServerMessage {
    /// Wire event name.
    pub fn event(&self) -> &'static str {
        match self {
            ServerMessage::AppSetup(_) => "app-setup",
            ServerMessage::Setup(_) => "setup",
            ServerMessage::StartGame => "start-game",
            ServerMessage::GameState(_) => "game-state",
            ServerMessage::Freeze => "freeze",
            ServerMessage::OppSurrender => "opp-surrender",
            ServerMessage::ResetAlert => "reset-alert",
            ServerMessage::ResetStart => "reset-start",
            ServerMessage::ResetCancel => "reset-cancel",
            ServerMessage::DrawStart => "draw-start",
            ServerMessage::DrawCancel => "draw-cancel",
            ServerMessage::RoomNameTaken => "room-name-taken",
            ServerMessage::RoomNameTakenOk => "room-name-taken-ok",
            ServerMessage::RoomNotFound => "room-not-found",
            ServerMessage::RoomNotFoundOk => "room-not-found-ok",
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn hello_wire_shape() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "event": "hello",
            "data": { "userName": "ada", "game": "Checkers" }
        }))
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::Hello(Hello {
                user_name: "ada".into(),
                game: GameName::Checkers,
            })
        );
    }

    #[test]
    fn payload_less_events_need_no_data() {
        let msg: ClientMessage = serde_json::from_value(json!({ "event": "random-room" })).unwrap();
        assert_eq!(msg, ClientMessage::RandomRoom);
        assert_eq!(
            serde_json::to_value(&ServerMessage::StartGame).unwrap(),
            json!({ "event": "start-game" })
        );
    }

    #[test]
    fn message_kinds_are_kebab_case() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "event": "message",
            "data": "room-name-taken-ok"
        }))
        .unwrap();
        assert_eq!(msg, ClientMessage::Message(MessageKind::RoomNameTakenOk));
    }

    #[test]
    fn tile_click_player_is_optional() {
        let msg: ClientMessage =
            serde_json::from_value(json!({ "event": "tile-clicked", "data": { "id": 5 } })).unwrap();
        assert_eq!(
            msg,
            ClientMessage::TileClicked(TileClick {
                id: 5,
                player: None
            })
        );
    }

    #[test]
    fn out_of_range_tile_ids_still_parse() {
        for id in [300, -1] {
            let msg: ClientMessage =
                serde_json::from_value(json!({ "event": "tile-clicked", "data": { "id": id } })).unwrap();
            assert_eq!(msg, ClientMessage::TileClicked(TileClick { id, player: None }));
        }
    }

    #[test]
    fn piece_move_uses_camel_case() {
        let msg = ClientMessage::PieceMoved(PieceMove {
            move_from: RowCol { row: 2, col: 1 },
            move_to: RowCol { row: 3, col: 2 },
        });
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "event": "piece-moved",
                "data": { "moveFrom": { "row": 2, "col": 1 }, "moveTo": { "row": 3, "col": 2 } }
            })
        );
    }

    #[test]
    fn setup_wire_shape() {
        let mut board = serde_json::Map::new();
        board.insert("tiles".into(), json!({ "2": "O" }));
        let msg = ServerMessage::Setup(Setup {
            board,
            current_player: "X".into(),
            role: "S".into(),
            waiting_for_opponent: false,
            join_option: JoinOption::JoinRoom,
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["event"], "setup");
        assert_eq!(value["data"]["currentPlayer"], "X");
        assert_eq!(value["data"]["waitingForOpponent"], false);
        assert_eq!(value["data"]["joinOption"], "join-room");
        assert_eq!(value["data"]["tiles"]["2"], "O");
        assert!(value["data"].get("board").is_none());

        let back: ServerMessage = serde_json::from_value(value).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn event_names_match_serialized_tags() {
        let all = [
            ServerMessage::AppSetup(GameName::TicTacToe),
            ServerMessage::GameState(json!({})),
            ServerMessage::StartGame,
            ServerMessage::Freeze,
            ServerMessage::OppSurrender,
            ServerMessage::ResetAlert,
            ServerMessage::ResetStart,
            ServerMessage::ResetCancel,
            ServerMessage::DrawStart,
            ServerMessage::DrawCancel,
            ServerMessage::RoomNameTaken,
            ServerMessage::RoomNameTakenOk,
            ServerMessage::RoomNotFound,
            ServerMessage::RoomNotFoundOk,
        ];
        for msg in all {
            let value = serde_json::to_value(&msg).unwrap();
            assert_eq!(value["event"], msg.event());
        }
    }

    #[test]
    fn unknown_event_is_rejected() {
        let result = serde_json::from_value::<ClientMessage>(json!({ "event": "resume-match", "data": "x" }));
        assert!(result.is_err());
    }
}
