// Connection registry and message dispatch for both games.
//
// `Hub` is what the server's main loop owns. It maps connection ids to the
// game each connection picked and to that connection's writer, and holds
// one `Lobby` per game. Every inbound message is routed to the lobby of the
// sender's game with an `Outbox` over the shared writer map as transport.
//
// Failed requests never escape the hub. Name clashes and missing rooms have
// already been reported to the client by the lobby; rejected moves and
// orphan actions (requests from connections not in a position to make
// them) are logged at debug level and dropped.

use std::collections::BTreeMap;
use std::io::Write;

use tabletop_core::checkers::Checkers;
use tabletop_core::error::LobbyError;
use tabletop_core::lobby::{Lobby, RoomMessage};
use tabletop_core::tictactoe::TicTacToe;
use tabletop_core::transport::Transport;
use tabletop_core::types::ConnectionId;
use tabletop_protocol::message::{ClientMessage, Hello, ServerMessage};
use tabletop_protocol::types::{GameName, MessageKind};
use tracing::{debug, info, warn};

use crate::wire::{Outbox, WireGame, game_name};

pub struct Hub<W: Write> {
    games: BTreeMap<ConnectionId, GameName>,
    writers: BTreeMap<ConnectionId, W>,
    tictactoe: Lobby<TicTacToe>,
    checkers: Lobby<Checkers>,
    next_connection_id: u32,
}

impl<W: Write> Default for Hub<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Hub<W> {
    pub fn new() -> Self {
        Self {
            games: BTreeMap::new(),
            writers: BTreeMap::new(),
            tictactoe: Lobby::new(),
            checkers: Lobby::new(),
            next_connection_id: 0,
        }
    }

    /// Register a connection that completed its handshake. Assigns an id,
    /// enters the player into its game's lobby, and replies `app-setup`.
    pub fn register(&mut self, hello: Hello, writer: W) -> ConnectionId {
        let id = ConnectionId(self.next_connection_id);
        self.next_connection_id += 1;

        self.writers.insert(id, writer);
        self.games.insert(id, hello.game);
        match hello.game {
            GameName::TicTacToe => self.tictactoe.connect(id, hello.user_name),
            GameName::Checkers => self.checkers.connect(id, hello.user_name),
        };
        info!(connection = %id, game = %hello.game, "connection registered");

        Outbox::new(&mut self.writers).send_message(id, &ServerMessage::AppSetup(hello.game));
        id
    }

    pub fn connection_count(&self) -> usize {
        self.games.len()
    }

    pub fn tictactoe(&self) -> &Lobby<TicTacToe> {
        &self.tictactoe
    }

    pub fn checkers(&self) -> &Lobby<Checkers> {
        &self.checkers
    }

    /// Route one message from a registered connection.
    pub fn handle_message(&mut self, id: ConnectionId, msg: ClientMessage) {
        let Some(&game) = self.games.get(&id) else {
            debug!(connection = %id, "message from unknown connection dropped");
            return;
        };
        let mut outbox = Outbox::new(&mut self.writers);
        let result = match game {
            GameName::TicTacToe => dispatch(&mut self.tictactoe, id, msg, &mut outbox),
            GameName::Checkers => dispatch(&mut self.checkers, id, msg, &mut outbox),
        };

        match result {
            Ok(()) => {}
            Err(e) if e.is_reported() => debug!(connection = %id, error = %e, "request refused"),
            Err(LobbyError::IllegalMove(e)) => debug!(connection = %id, error = %e, "move rejected"),
            Err(e) => debug!(connection = %id, error = %e, "orphan action dropped"),
        }
    }

    /// Handle a disconnect (goodbye, EOF, or read error). The player's room
    /// is fully resolved before this returns.
    pub fn disconnect(&mut self, id: ConnectionId) {
        let Some(game) = self.games.remove(&id) else {
            return;
        };
        self.writers.remove(&id);
        let mut outbox = Outbox::new(&mut self.writers);
        match game {
            GameName::TicTacToe => self.tictactoe.disconnect(id, &mut outbox),
            GameName::Checkers => self.checkers.disconnect(id, &mut outbox),
        }
        info!(connection = %id, %game, "connection closed");
    }
}

fn room_message(kind: MessageKind) -> RoomMessage {
    match kind {
        MessageKind::NewGame => RoomMessage::NewGame,
        MessageKind::Surrender => RoomMessage::Surrender,
        MessageKind::SurrenderOk => RoomMessage::SurrenderOk,
        MessageKind::ResetAlert => RoomMessage::ResetAlert,
        MessageKind::ResetStart => RoomMessage::ResetStart,
        MessageKind::ResetConfirm => RoomMessage::ResetConfirm,
        MessageKind::ResetCancel => RoomMessage::ResetCancel,
        MessageKind::DrawStart => RoomMessage::DrawStart,
        MessageKind::DrawConfirm => RoomMessage::DrawConfirm,
        MessageKind::DrawCancel => RoomMessage::DrawCancel,
        MessageKind::RoomNameTakenOk => RoomMessage::RoomNameTakenOk,
        MessageKind::RoomNotFoundOk => RoomMessage::RoomNotFoundOk,
    }
}

fn dispatch<G: WireGame>(
    lobby: &mut Lobby<G>,
    id: ConnectionId,
    msg: ClientMessage,
    t: &mut impl Transport<G>,
) -> Result<(), LobbyError> {
    match msg {
        ClientMessage::RandomRoom => lobby.random_room(id, t).map(drop),
        ClientMessage::CreateRoom(name) => lobby.create_room(id, &name, t).map(drop),
        ClientMessage::JoinRoom(name) => lobby.join_room(id, &name, t).map(drop),
        ClientMessage::Message(kind) => lobby.message(id, room_message(kind), t),
        mv @ (ClientMessage::TileClicked(_) | ClientMessage::PieceMoved(_)) => match G::decode_move(&mv) {
            Some(mv) => lobby.play(id, &mv, t).map(drop),
            None => {
                debug!(connection = %id, game = %game_name(G::KIND), ?mv, "move not valid for this game dropped");
                Ok(())
            }
        },
        ClientMessage::Hello(_) => {
            warn!(connection = %id, "repeated hello ignored");
            Ok(())
        }
        // Handled by the reader thread.
        ClientMessage::Goodbye => Ok(()),
    }
}
