// Translation between core events/moves and protocol messages.
//
// `Outbox` is the server's `Transport`: it encodes each core `Event` into a
// `ServerMessage` and writes it, framed, to the target connection's writer.
// Writes are fire-and-forget. A failed write is logged and otherwise
// ignored; the connection's reader thread sees the broken socket and
// reports the disconnect.
//
// `WireGame` is the inbound half: it decodes the game-specific move message
// (`tile-clicked` or `piece-moved`) into the core move type.

use std::collections::BTreeMap;
use std::io::Write;

use tabletop_core::checkers::{Checkers, PieceMove};
use tabletop_core::game::{Game, Side};
use tabletop_core::square::Square;
use tabletop_core::tictactoe::{Mark, TicTacToe, TileClick};
use tabletop_core::transport::{Event, Transport};
use tabletop_core::types::{ConnectionId, GameKind, JoinOption};
use tabletop_protocol::framing::send_json;
use tabletop_protocol::message::{ClientMessage, ServerMessage, Setup};
use tabletop_protocol::types::{self as wire, GameName, RowCol};
use tracing::warn;

/// Writes encoded events to per-connection writers.
pub struct Outbox<'a, W: Write> {
    writers: &'a mut BTreeMap<ConnectionId, W>,
}

impl<'a, W: Write> Outbox<'a, W> {
    pub fn new(writers: &'a mut BTreeMap<ConnectionId, W>) -> Self {
        Self { writers }
    }

    /// Write one message to `to`. Unknown connections are skipped.
    pub fn send_message(&mut self, to: ConnectionId, msg: &ServerMessage) {
        let Some(writer) = self.writers.get_mut(&to) else {
            return;
        };
        if let Err(e) = send_json(writer, msg) {
            warn!(connection = %to, event = msg.event(), error = %e, "write failed");
        }
    }
}

impl<G: Game, W: Write> Transport<G> for Outbox<'_, W> {
    fn send(&mut self, to: ConnectionId, event: &Event<G>) {
        match encode(event) {
            Ok(msg) => self.send_message(to, &msg),
            Err(e) => warn!(connection = %to, event = event.name(), error = %e, "encode failed"),
        }
    }
}

pub fn game_name(kind: GameKind) -> GameName {
    match kind {
        GameKind::TicTacToe => GameName::TicTacToe,
        GameKind::Checkers => GameName::Checkers,
    }
}

fn join_option(option: JoinOption) -> wire::JoinOption {
    match option {
        JoinOption::RandomRoom => wire::JoinOption::RandomRoom,
        JoinOption::CreateRoom => wire::JoinOption::CreateRoom,
        JoinOption::JoinRoom => wire::JoinOption::JoinRoom,
    }
}

/// Board snapshots serialize as structs whose fields splice into `setup`.
/// A non-object snapshot keeps a `board` key so nothing is lost.
fn board_fields<G: Game>(
    board: &G::Board,
) -> Result<serde_json::Map<String, serde_json::Value>, serde_json::Error> {
    Ok(match serde_json::to_value(board)? {
        serde_json::Value::Object(fields) => fields,
        other => {
            let mut fields = serde_json::Map::new();
            fields.insert("board".to_owned(), other);
            fields
        }
    })
}

/// Encode a core event as a wire message.
pub fn encode<G: Game>(event: &Event<G>) -> Result<ServerMessage, serde_json::Error> {
    Ok(match event {
        Event::Setup(setup) => ServerMessage::Setup(Setup {
            board: board_fields::<G>(&setup.board)?,
            current_player: setup.current_player.token().to_owned(),
            role: setup.role.token().to_owned(),
            waiting_for_opponent: setup.waiting_for_opponent,
            join_option: join_option(setup.join_option),
        }),
        Event::StartGame => ServerMessage::StartGame,
        Event::GameState(state) => ServerMessage::GameState(serde_json::to_value(state.as_ref())?),
        Event::Freeze => ServerMessage::Freeze,
        Event::OppSurrender => ServerMessage::OppSurrender,
        Event::ResetAlert => ServerMessage::ResetAlert,
        Event::ResetStart => ServerMessage::ResetStart,
        Event::ResetCancel => ServerMessage::ResetCancel,
        Event::DrawStart => ServerMessage::DrawStart,
        Event::DrawCancel => ServerMessage::DrawCancel,
        Event::RoomNameTaken => ServerMessage::RoomNameTaken,
        Event::RoomNameTakenOk => ServerMessage::RoomNameTakenOk,
        Event::RoomNotFound => ServerMessage::RoomNotFound,
        Event::RoomNotFoundOk => ServerMessage::RoomNotFoundOk,
    })
}

/// A game whose moves arrive as a protocol message.
pub trait WireGame: Game {
    /// Decode this game's move message. `None` for any other message, or
    /// for a move that cannot be expressed in the game's terms.
    fn decode_move(msg: &ClientMessage) -> Option<Self::Move>;
}

impl WireGame for TicTacToe {
    fn decode_move(msg: &ClientMessage) -> Option<TileClick> {
        let ClientMessage::TileClicked(click) = msg else {
            return None;
        };
        let mark = match &click.player {
            Some(token) => Some(Mark::from_token(token)?),
            None => None,
        };
        Some(TileClick {
            tile: click.id,
            mark,
        })
    }
}

fn square(pos: RowCol) -> Square {
    // Anything that does not fit an i8 is off the board anyway.
    let coord = |v: i32| i8::try_from(v).unwrap_or(i8::MIN);
    Square::new(coord(pos.row), coord(pos.col))
}

impl WireGame for Checkers {
    fn decode_move(msg: &ClientMessage) -> Option<PieceMove> {
        let ClientMessage::PieceMoved(mv) = msg else {
            return None;
        };
        Some(PieceMove {
            from: square(mv.move_from),
            to: square(mv.move_to),
        })
    }
}
