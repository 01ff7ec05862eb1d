// Room & matchmaking manager for one game.
//
// `Lobby` is the registry of players and rooms for a single `Game`. Rooms
// live in an id-keyed map; players refer to their room by `RoomId` rather
// than holding it, and two side indexes (the random-room queue and the
// name -> room map) support matchmaking. All mutation happens on the
// caller's single dispatch loop, so each request runs to completion before
// the next one is looked at.
//
// Entry paths:
// - `random_room`: join the oldest random room with a free seat (taking the
//   complementary side, score reset) or open a new one.
// - `create_room`: open a named room; `room-name-taken` if the name exists.
// - `join_room`: take the free seat of a named room, or queue as a
//   spectator when both seats are filled; `room-not-found` if absent.
//
// Leaving (`disconnect`):
// - Random room: the room is torn down and a remaining opponent is sent
//   back through random matchmaking.
// - Named room: a spectator just leaves the queue. A departing player's
//   seat goes to the next spectator; the room is deleted once no seat is
//   filled.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};

use crate::error::LobbyError;
use crate::game::{Game, Outcome, Role};
use crate::room::{Proposal, Room, RoomKind};
use crate::transport::{Event, Transport};
use crate::types::{ConnectionId, JoinOption, RoomId};

/// A connected player of this lobby's game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub id: ConnectionId,
    pub name: String,
    pub membership: Option<Membership>,
}

/// Back-reference from a player to its room.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Membership {
    pub room: RoomId,
    pub via: JoinOption,
}

/// In-room requests carried by the `message` event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoomMessage {
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

#[derive(Debug)]
pub struct Lobby<G: Game> {
    players: BTreeMap<ConnectionId, Player>,
    rooms: BTreeMap<RoomId, Room<G>>,
    random_rooms: Vec<RoomId>,
    named_rooms: HashMap<String, RoomId>,
    next_room_id: u64,
}

impl<G: Game> Default for Lobby<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: Game> Lobby<G> {
    pub fn new() -> Self {
        Self {
            players: BTreeMap::new(),
            rooms: BTreeMap::new(),
            random_rooms: Vec::new(),
            named_rooms: HashMap::new(),
            next_room_id: 0,
        }
    }

    /// Register a player that picked this lobby's game. Returns false if
    /// the connection is already registered.
    pub fn connect(&mut self, id: ConnectionId, name: String) -> bool {
        if self.players.contains_key(&id) {
            return false;
        }
        info!(game = %G::KIND, connection = %id, %name, "player connected");
        self.players.insert(
            id,
            Player {
                id,
                name,
                membership: None,
            },
        );
        true
    }

    pub fn player(&self, id: ConnectionId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn room(&self, id: RoomId) -> Option<&Room<G>> {
        self.rooms.get(&id)
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room<G>> {
        self.rooms.values()
    }

    /// Random rooms in matchmaking order.
    pub fn random_room_ids(&self) -> &[RoomId] {
        &self.random_rooms
    }

    pub fn named_room(&self, name: &str) -> Option<&Room<G>> {
        self.named_rooms
            .get(name)
            .and_then(|id| self.rooms.get(id))
    }

    /// The room `id` is a member of (seated or spectating).
    pub fn room_of(&self, id: ConnectionId) -> Option<&Room<G>> {
        let membership = self.players.get(&id)?.membership?;
        self.rooms.get(&membership.room)
    }

    fn allocate_room_id(&mut self) -> RoomId {
        let id = RoomId(self.next_room_id);
        self.next_room_id += 1;
        id
    }

    /// Registered player that is not yet in a room.
    fn require_roomless(&self, id: ConnectionId) -> Result<(), LobbyError> {
        let player = self
            .players
            .get(&id)
            .ok_or(LobbyError::UnknownConnection(id))?;
        match player.membership {
            Some(_) => Err(LobbyError::AlreadyInRoom(id)),
            None => Ok(()),
        }
    }

    fn membership_of(&self, id: ConnectionId) -> Result<Membership, LobbyError> {
        self.players
            .get(&id)
            .ok_or(LobbyError::UnknownConnection(id))?
            .membership
            .ok_or(LobbyError::NotInRoom(id))
    }

    fn set_membership(&mut self, id: ConnectionId, membership: Option<Membership>) {
        if let Some(player) = self.players.get_mut(&id) {
            player.membership = membership;
        }
    }

    fn send_setup(&self, id: ConnectionId, t: &mut impl Transport<G>) {
        let Some(membership) = self.players.get(&id).and_then(|p| p.membership) else {
            return;
        };
        let setup = self
            .rooms
            .get(&membership.room)
            .and_then(|room| room.setup_for(id, membership.via));
        if let Some(setup) = setup {
            t.send(id, &Event::Setup(setup));
        }
    }

    /// Handle `random-room`.
    pub fn random_room(&mut self, id: ConnectionId, t: &mut impl Transport<G>) -> Result<RoomId, LobbyError> {
        self.require_roomless(id)?;
        Ok(self.find_or_create_random_room(id, t))
    }

    /// Seat `id` in the oldest random room with a free seat, or open a new
    /// one. Sends `setup` to the player and `start-game` to the room once
    /// both seats are filled.
    fn find_or_create_random_room(&mut self, id: ConnectionId, t: &mut impl Transport<G>) -> RoomId {
        let open = self
            .random_rooms
            .iter()
            .copied()
            .find(|room_id| self.rooms.get(room_id).is_some_and(|room| !room.is_full()));

        let room_id = match open.and_then(|room_id| self.rooms.get_mut(&room_id)) {
            Some(room) => {
                room.seat(id);
                info!(game = %G::KIND, room = %room.id, connection = %id, "joined random room");
                room.reset_all(t);
                room.id
            }
            None => {
                let room_id = self.allocate_room_id();
                let mut room = Room::random(room_id);
                room.seat(id);
                info!(game = %G::KIND, room = %room_id, connection = %id, "created random room");
                self.rooms.insert(room_id, room);
                self.random_rooms.push(room_id);
                room_id
            }
        };

        self.set_membership(
            id,
            Some(Membership {
                room: room_id,
                via: JoinOption::RandomRoom,
            }),
        );
        self.send_setup(id, t);
        if let Some(room) = self.rooms.get(&room_id).filter(|room| room.is_full()) {
            room.start_game(t);
        }
        room_id
    }

    /// Handle `create-room`. A blank name creates nothing.
    pub fn create_room(
        &mut self,
        id: ConnectionId,
        name: &str,
        t: &mut impl Transport<G>,
    ) -> Result<RoomId, LobbyError> {
        self.require_roomless(id)?;
        if name.trim().is_empty() {
            return Err(LobbyError::BlankRoomName(id));
        }
        if self.named_rooms.contains_key(name) {
            debug!(game = %G::KIND, connection = %id, name, "room name taken");
            t.send(id, &Event::RoomNameTaken);
            return Err(LobbyError::RoomNameTaken(name.to_owned()));
        }

        let room_id = self.allocate_room_id();
        let mut room = Room::named(room_id, name.to_owned());
        room.seat(id);
        info!(game = %G::KIND, room = %room_id, name, connection = %id, "created named room");
        self.rooms.insert(room_id, room);
        self.named_rooms.insert(name.to_owned(), room_id);

        self.set_membership(
            id,
            Some(Membership {
                room: room_id,
                via: JoinOption::CreateRoom,
            }),
        );
        self.send_setup(id, t);
        Ok(room_id)
    }

    /// Handle `join-room`. A full room queues the player as a spectator.
    pub fn join_room(
        &mut self,
        id: ConnectionId,
        name: &str,
        t: &mut impl Transport<G>,
    ) -> Result<RoomId, LobbyError> {
        self.require_roomless(id)?;
        let Some(room) = self
            .named_rooms
            .get(name)
            .and_then(|room_id| self.rooms.get_mut(room_id))
        else {
            debug!(game = %G::KIND, connection = %id, name, "room not found");
            t.send(id, &Event::RoomNotFound);
            return Err(LobbyError::RoomNotFound(name.to_owned()));
        };

        let room_id = room.id;
        let seated = if room.is_full() {
            room.add_spectator(id);
            false
        } else {
            room.seat(id);
            info!(game = %G::KIND, room = %room_id, name, connection = %id, "joined named room");
            room.reset_game(t);
            true
        };

        self.set_membership(
            id,
            Some(Membership {
                room: room_id,
                via: JoinOption::JoinRoom,
            }),
        );
        self.send_setup(id, t);
        if seated {
            if let Some(room) = self.rooms.get(&room_id) {
                room.start_game(t);
            }
        }
        Ok(room_id)
    }

    /// Handle a `message` event from `id`.
    pub fn message(
        &mut self,
        id: ConnectionId,
        message: RoomMessage,
        t: &mut impl Transport<G>,
    ) -> Result<(), LobbyError> {
        let echo = match message {
            RoomMessage::RoomNameTakenOk => Some(Event::RoomNameTakenOk),
            RoomMessage::RoomNotFoundOk => Some(Event::RoomNotFoundOk),
            _ => None,
        };
        if let Some(echo) = echo {
            if !self.players.contains_key(&id) {
                return Err(LobbyError::UnknownConnection(id));
            }
            t.send(id, &echo);
            return Ok(());
        }

        let membership = self.membership_of(id)?;
        let room = self
            .rooms
            .get_mut(&membership.room)
            .ok_or(LobbyError::NotInRoom(id))?;

        match message {
            RoomMessage::NewGame => room.acknowledge_rematch(id, t),
            RoomMessage::Surrender => room.surrender(id, t),
            RoomMessage::SurrenderOk => room.accept_surrender(id, t),
            RoomMessage::ResetAlert => {
                t.send(id, &Event::ResetAlert);
                Ok(())
            }
            RoomMessage::ResetStart => room.propose(id, Proposal::Reset, t),
            RoomMessage::ResetConfirm => room.confirm(id, Proposal::Reset, t),
            RoomMessage::ResetCancel => room.cancel(id, Proposal::Reset, t),
            RoomMessage::DrawStart => room.propose(id, Proposal::Draw, t),
            RoomMessage::DrawConfirm => room.confirm(id, Proposal::Draw, t),
            RoomMessage::DrawCancel => room.cancel(id, Proposal::Draw, t),
            RoomMessage::RoomNameTakenOk | RoomMessage::RoomNotFoundOk => Ok(()),
        }
    }

    /// Handle a move from `id`.
    pub fn play(
        &mut self,
        id: ConnectionId,
        mv: &G::Move,
        t: &mut impl Transport<G>,
    ) -> Result<Option<Outcome<G::Side>>, LobbyError> {
        let membership = self.membership_of(id)?;
        let room = self
            .rooms
            .get_mut(&membership.room)
            .ok_or(LobbyError::NotInRoom(id))?;
        room.play(id, mv, t)
    }

    /// Handle a disconnect. The room is fully resolved (opponent requeued,
    /// spectator promoted, or room deleted) before this returns.
    pub fn disconnect(&mut self, id: ConnectionId, t: &mut impl Transport<G>) {
        let Some(player) = self.players.remove(&id) else {
            return;
        };
        info!(game = %G::KIND, connection = %id, name = %player.name, "player disconnected");
        let Some(membership) = player.membership else {
            return;
        };
        let Some(kind) = self.rooms.get(&membership.room).map(|room| room.kind().clone()) else {
            return;
        };

        match kind {
            RoomKind::Random => self.leave_random_room(id, membership.room, t),
            RoomKind::Named { name, .. } => self.leave_named_room(id, membership.room, &name, t),
        }
    }

    fn leave_random_room(&mut self, id: ConnectionId, room_id: RoomId, t: &mut impl Transport<G>) {
        self.random_rooms.retain(|&r| r != room_id);
        let Some(room) = self.rooms.remove(&room_id) else {
            return;
        };
        info!(game = %G::KIND, room = %room_id, "random room closed");

        if let Some(opponent) = room.seats().iter().map(|s| s.connection).find(|&c| c != id) {
            self.set_membership(opponent, None);
            let new_room = self.find_or_create_random_room(opponent, t);
            debug!(game = %G::KIND, connection = %opponent, room = %new_room, "opponent requeued");
        }
    }

    fn leave_named_room(&mut self, id: ConnectionId, room_id: RoomId, name: &str, t: &mut impl Transport<G>) {
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return;
        };
        if room.remove_spectator(id) {
            return;
        }
        room.unseat(id);

        if room.is_empty() {
            self.rooms.remove(&room_id);
            self.named_rooms.remove(name);
            info!(game = %G::KIND, room = %room_id, name, "named room deleted");
            return;
        }

        match room.next_spectator() {
            Some(promoted) => {
                room.seat(promoted);
                info!(game = %G::KIND, room = %room_id, connection = %promoted, "spectator promoted");
                room.reset_all(t);
                self.send_setup(promoted, t);
                if let Some(room) = self.rooms.get(&room_id) {
                    room.start_game(t);
                }
            }
            None => room.reset_all(t),
        }
    }

    /// Role of `id` in its room.
    pub fn role_of(&self, id: ConnectionId) -> Option<Role<G::Side>> {
        self.room_of(id)?.role_of(id)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::checkers::{Checkers, PieceMove};
    use crate::game::Side;
    use crate::piece::Color;
    use crate::square::Square;
    use crate::state::Status;
    use crate::tictactoe::{Mark, TicTacToe, TileClick};
    use crate::transport::RecordingTransport;

    type TttLobby = Lobby<TicTacToe>;

    fn conn(n: u32) -> ConnectionId {
        ConnectionId(n)
    }

    fn lobby_with(n: u32) -> (TttLobby, RecordingTransport<TicTacToe>) {
        let mut lobby = TttLobby::new();
        for i in 1..=n {
            lobby.connect(conn(i), format!("p{i}"));
        }
        (lobby, RecordingTransport::new())
    }

    #[test]
    fn random_rooms_pair_players() {
        let (mut lobby, mut t) = lobby_with(3);
        let r1 = lobby.random_room(conn(1), &mut t).unwrap();
        assert_eq!(t.names_for(conn(1)), vec!["setup"]);
        assert!(t.last_setup(conn(1)).unwrap().waiting_for_opponent);
        assert_eq!(lobby.role_of(conn(1)), Some(Role::Player(Mark::O)));

        let r2 = lobby.random_room(conn(2), &mut t).unwrap();
        assert_eq!(r1, r2);
        assert_eq!(lobby.role_of(conn(2)), Some(Role::Player(Mark::X)));
        assert_eq!(t.names_for(conn(2)), vec!["game-state", "setup", "start-game"]);
        assert_eq!(t.names_for(conn(1)), vec!["setup", "game-state", "start-game"]);
        assert!(!t.last_setup(conn(2)).unwrap().waiting_for_opponent);

        let r3 = lobby.random_room(conn(3), &mut t).unwrap();
        assert_ne!(r3, r1);
        assert_eq!(lobby.random_room_ids(), &[r1, r3]);
    }

    #[test]
    fn random_room_requires_registration_and_no_room() {
        let (mut lobby, mut t) = lobby_with(1);
        assert_eq!(
            lobby.random_room(conn(9), &mut t),
            Err(LobbyError::UnknownConnection(conn(9)))
        );
        lobby.random_room(conn(1), &mut t).unwrap();
        assert_eq!(
            lobby.random_room(conn(1), &mut t),
            Err(LobbyError::AlreadyInRoom(conn(1)))
        );
    }

    #[test]
    fn create_room_rejects_taken_name() {
        let (mut lobby, mut t) = lobby_with(2);
        lobby.create_room(conn(1), "den", &mut t).unwrap();
        let setup = t.last_setup(conn(1)).unwrap();
        assert_eq!(setup.join_option, JoinOption::CreateRoom);
        assert!(setup.waiting_for_opponent);

        assert_eq!(
            lobby.create_room(conn(2), "den", &mut t),
            Err(LobbyError::RoomNameTaken("den".into()))
        );
        assert_eq!(t.names_for(conn(2)), vec!["room-name-taken"]);
        assert!(lobby.player(conn(2)).unwrap().membership.is_none());

        lobby
            .message(conn(2), RoomMessage::RoomNameTakenOk, &mut t)
            .unwrap();
        assert_eq!(t.names_for(conn(2)), vec!["room-name-taken", "room-name-taken-ok"]);
    }

    #[test]
    fn create_room_rejects_blank_name() {
        let (mut lobby, mut t) = lobby_with(1);
        for name in ["", "   "] {
            assert_eq!(
                lobby.create_room(conn(1), name, &mut t),
                Err(LobbyError::BlankRoomName(conn(1)))
            );
        }
        assert!(t.names_for(conn(1)).is_empty());
        assert_eq!(lobby.rooms().count(), 0);
        assert!(lobby.named_room("").is_none());
        assert!(lobby.player(conn(1)).unwrap().membership.is_none());

        // The player is still free to create a real room.
        lobby.create_room(conn(1), "den", &mut t).unwrap();
        assert!(lobby.named_room("den").is_some());
    }

    #[test]
    fn join_room_missing_name() {
        let (mut lobby, mut t) = lobby_with(1);
        assert_eq!(
            lobby.join_room(conn(1), "nowhere", &mut t),
            Err(LobbyError::RoomNotFound("nowhere".into()))
        );
        assert_eq!(t.names_for(conn(1)), vec!["room-not-found"]);
    }

    #[test]
    fn join_room_seats_then_queues_spectators() {
        let (mut lobby, mut t) = lobby_with(4);
        lobby.create_room(conn(1), "den", &mut t).unwrap();
        lobby.join_room(conn(2), "den", &mut t).unwrap();
        assert_eq!(lobby.role_of(conn(2)), Some(Role::Player(Mark::X)));
        assert_eq!(t.names_for(conn(2)), vec!["game-state", "setup", "start-game"]);

        lobby.join_room(conn(3), "den", &mut t).unwrap();
        lobby.join_room(conn(4), "den", &mut t).unwrap();
        assert_eq!(lobby.role_of(conn(3)), Some(Role::Spectator));
        let setup = t.last_setup(conn(4)).unwrap();
        assert_eq!(setup.role, Role::Spectator);
        assert_eq!(setup.join_option, JoinOption::JoinRoom);

        let room = lobby.named_room("den").unwrap();
        assert_eq!(room.members(), vec![conn(1), conn(2), conn(3), conn(4)]);
    }

    #[test]
    fn random_disconnect_requeues_into_waiting_room() {
        let (mut lobby, mut t) = lobby_with(2);
        let old = lobby.random_room(conn(1), &mut t).unwrap();
        lobby.random_room(conn(2), &mut t).unwrap();
        t.clear();

        lobby.disconnect(conn(1), &mut t);
        assert!(lobby.room(old).is_none());
        let new_room = lobby.room_of(conn(2)).unwrap();
        assert_ne!(new_room.id, old);
        assert!(new_room.state.waiting_for_opponent);
        assert_eq!(lobby.role_of(conn(2)), Some(Role::Player(Mark::O)));
        assert_eq!(t.names_for(conn(2)), vec!["setup"]);
        assert_eq!(lobby.random_room_ids(), &[new_room.id]);
    }

    #[test]
    fn random_disconnect_requeues_into_open_room() {
        let (mut lobby, mut t) = lobby_with(3);
        lobby.random_room(conn(1), &mut t).unwrap();
        lobby.random_room(conn(2), &mut t).unwrap();
        let waiting = lobby.random_room(conn(3), &mut t).unwrap();
        t.clear();

        lobby.disconnect(conn(1), &mut t);
        let room = lobby.room_of(conn(2)).unwrap();
        assert_eq!(room.id, waiting);
        assert!(!room.state.waiting_for_opponent);
        assert_eq!(lobby.role_of(conn(2)), Some(Role::Player(Mark::X)));
        assert!(t.names_for(conn(2)).contains(&"start-game"));
        assert!(t.names_for(conn(3)).contains(&"start-game"));
    }

    #[test]
    fn named_disconnect_promotes_spectator_fifo() {
        let (mut lobby, mut t) = lobby_with(4);
        lobby.create_room(conn(1), "den", &mut t).unwrap();
        lobby.join_room(conn(2), "den", &mut t).unwrap();
        lobby.join_room(conn(3), "den", &mut t).unwrap();
        lobby.join_room(conn(4), "den", &mut t).unwrap();
        t.clear();

        lobby.disconnect(conn(1), &mut t);
        assert_eq!(lobby.role_of(conn(3)), Some(Role::Player(Mark::O)));
        assert_eq!(lobby.role_of(conn(4)), Some(Role::Spectator));
        assert_eq!(t.names_for(conn(3)), vec!["game-state", "setup", "start-game"]);
        let setup = t.last_setup(conn(3)).unwrap();
        assert_eq!(setup.role, Role::Player(Mark::O));
        assert!(!setup.waiting_for_opponent);
    }

    #[test]
    fn named_disconnect_without_spectators_waits() {
        let (mut lobby, mut t) = lobby_with(2);
        lobby.create_room(conn(1), "den", &mut t).unwrap();
        lobby.join_room(conn(2), "den", &mut t).unwrap();
        t.clear();

        lobby.disconnect(conn(2), &mut t);
        let room = lobby.named_room("den").unwrap();
        assert_eq!(room.state.status(), Status::WaitingForOpponent);
        assert_eq!(t.names_for(conn(1)), vec!["game-state"]);

        lobby.disconnect(conn(1), &mut t);
        assert!(lobby.named_room("den").is_none());
        assert_eq!(lobby.rooms().count(), 0);
    }

    #[test]
    fn spectator_disconnect_only_leaves_queue() {
        let (mut lobby, mut t) = lobby_with(3);
        lobby.create_room(conn(1), "den", &mut t).unwrap();
        lobby.join_room(conn(2), "den", &mut t).unwrap();
        lobby.join_room(conn(3), "den", &mut t).unwrap();
        t.clear();

        lobby.disconnect(conn(3), &mut t);
        assert!(t.sent.is_empty());
        assert_eq!(lobby.named_room("den").unwrap().members(), vec![conn(1), conn(2)]);
    }

    #[test]
    fn orphan_actions_are_refused() {
        let (mut lobby, mut t) = lobby_with(1);
        assert_eq!(
            lobby.message(conn(1), RoomMessage::Surrender, &mut t),
            Err(LobbyError::NotInRoom(conn(1)))
        );
        assert_eq!(
            lobby.play(conn(7), &TileClick { tile: 1, mark: None }, &mut t),
            Err(LobbyError::UnknownConnection(conn(7)))
        );
        assert!(t.sent.is_empty());
    }

    #[test]
    fn reset_alert_is_echoed_to_sender() {
        let (mut lobby, mut t) = lobby_with(2);
        lobby.random_room(conn(1), &mut t).unwrap();
        lobby.random_room(conn(2), &mut t).unwrap();
        t.clear();
        lobby.message(conn(1), RoomMessage::ResetAlert, &mut t).unwrap();
        assert_eq!(t.names_for(conn(1)), vec!["reset-alert"]);
        assert!(t.names_for(conn(2)).is_empty());
    }

    #[test]
    fn tictactoe_game_to_completion() {
        let (mut lobby, mut t) = lobby_with(2);
        lobby.random_room(conn(1), &mut t).unwrap();
        lobby.random_room(conn(2), &mut t).unwrap();
        // Second join resets the room, so X (conn 2) moves first.
        let room = lobby.room_of(conn(1)).unwrap();
        assert_eq!(room.state.current_player, Mark::X);

        let moves = [(2, 1), (1, 4), (2, 2), (1, 5)];
        for (who, tile) in moves {
            let click = TileClick { tile, mark: None };
            assert_eq!(lobby.play(conn(who), &click, &mut t), Ok(None));
        }
        let last = TileClick {
            tile: 3,
            mark: Some(Mark::X),
        };
        assert_eq!(lobby.play(conn(2), &last, &mut t), Ok(Some(Outcome::Win(Mark::X))));
        let state = t.last_state(conn(1)).unwrap();
        assert!(state.game_over);
        assert_eq!(state.score.wins(Mark::X), 1);
    }

    #[test]
    fn checkers_lobby_plays_moves() {
        let mut lobby: Lobby<Checkers> = Lobby::new();
        let mut t = RecordingTransport::new();
        lobby.connect(conn(1), "w".into());
        lobby.connect(conn(2), "b".into());
        lobby.create_room(conn(1), "board", &mut t).unwrap();
        lobby.join_room(conn(2), "board", &mut t).unwrap();
        assert_eq!(lobby.role_of(conn(1)), Some(Role::Player(Color::White)));

        // The join reset flipped the first mover to Black.
        let black_step = PieceMove {
            from: Square::new(5, 1),
            to: Square::new(4, 0),
        };
        assert_eq!(lobby.play(conn(2), &black_step, &mut t), Ok(None));
        let state = lobby.room_of(conn(1)).unwrap().state.clone();
        assert_eq!(state.current_player, Color::Black.opponent());
    }

    #[derive(Clone, Debug)]
    enum Op {
        Random(u32),
        Create(u32, u8),
        Join(u32, u8),
        Leave(u32),
        Reconnect(u32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1u32..8).prop_map(Op::Random),
            (1u32..8, 0u8..3).prop_map(|(c, n)| Op::Create(c, n)),
            (1u32..8, 0u8..3).prop_map(|(c, n)| Op::Join(c, n)),
            (1u32..8).prop_map(Op::Leave),
            (1u32..8).prop_map(Op::Reconnect),
        ]
    }

    fn check_invariants(lobby: &TttLobby) -> Result<(), TestCaseError> {
        for room in lobby.rooms() {
            let seats = room.seats();
            prop_assert!(seats.len() <= 2);
            prop_assert!(!seats.is_empty());
            if seats.len() == 2 {
                prop_assert_ne!(seats[0].side, seats[1].side);
            }
            prop_assert_eq!(room.state.waiting_for_opponent, seats.len() != 2);
            if !room.is_named() {
                prop_assert_eq!(room.spectators().count(), 0);
                prop_assert!(lobby.random_room_ids().contains(&room.id));
            }
            for member in room.members() {
                let player = lobby.player(member);
                prop_assert!(player.is_some());
                prop_assert_eq!(player.and_then(|p| p.membership).map(|m| m.room), Some(room.id));
            }
        }
        for player in lobby.players() {
            if let Some(membership) = player.membership {
                let room = lobby.room(membership.room);
                prop_assert!(room.is_some_and(|r| r.role_of(player.id).is_some()));
            }
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn lobby_invariants_hold(ops in prop::collection::vec(op(), 1..80)) {
            let (mut lobby, mut t) = lobby_with(7);
            let names = ["a", "b", "c"];
            for op in ops {
                match op {
                    Op::Random(c) => { let _ = lobby.random_room(conn(c), &mut t); }
                    Op::Create(c, n) => { let _ = lobby.create_room(conn(c), names[n as usize], &mut t); }
                    Op::Join(c, n) => { let _ = lobby.join_room(conn(c), names[n as usize], &mut t); }
                    Op::Leave(c) => lobby.disconnect(conn(c), &mut t),
                    Op::Reconnect(c) => { lobby.connect(conn(c), format!("p{c}")); }
                }
                check_invariants(&lobby)?;
            }
        }
    }
}
