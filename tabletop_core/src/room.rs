// A single game room.
//
// `Room` owns the seats (at most two), the spectator queue (named rooms
// only), the embedded `GameState`, and the bookkeeping for the three
// handshakes a seated player can open:
//
// - Rematch: each seat sends `new-game`; the board resets once both have.
//   Acknowledgements are cleared by every reset.
// - Surrender: the opponent is credited at once and the room freezes. The
//   surrendering seat's `surrender-ok` performs the reset.
// - Reset / draw proposals: the proposer's side freezes and the opponent is
//   asked. Confirmation resets (reset: score too; draw: a draw point is
//   credited first). Either seat may cancel, which unfreezes.
//
// Only one surrender/reset/draw request is open at a time (`pending`); it is
// what `freeze` is guarding. Answers that do not match it are refused with
// `NoPendingRequest`.
//
// The room does not know player names or how members joined; the `Lobby`
// owns that and asks the room for a `Setup` view when it needs one. All
// outbound traffic goes through the `Transport` passed into each call.

use std::collections::{BTreeSet, VecDeque};

use tracing::{debug, info};

use crate::error::LobbyError;
use crate::game::{Game, Outcome, Role, Side};
use crate::state::GameState;
use crate::transport::{Event, Setup, Transport};
use crate::types::{ConnectionId, JoinOption, RoomId};

/// Room flavor, fixed at creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoomKind {
    /// Matchmaking room; removed as soon as either occupant leaves.
    Random,
    /// Caller-named room; persists, promoting spectators, until no seat is
    /// filled.
    Named {
        name: String,
        spectators: VecDeque<ConnectionId>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Seat<S> {
    pub connection: ConnectionId,
    pub side: S,
}

/// The two requests that need the opponent's confirmation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Proposal {
    Reset,
    Draw,
}

/// The single open surrender/reset/draw request of a room.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pending {
    Surrender { by: ConnectionId },
    Proposal { kind: Proposal, by: ConnectionId },
}

#[derive(Clone, Debug)]
pub struct Room<G: Game> {
    pub id: RoomId,
    kind: RoomKind,
    seats: Vec<Seat<G::Side>>,
    pub state: GameState<G>,
    rematch_acks: BTreeSet<ConnectionId>,
    pending: Option<Pending>,
}

impl<G: Game> Room<G> {
    pub fn random(id: RoomId) -> Self {
        Self::with_kind(id, RoomKind::Random)
    }

    pub fn named(id: RoomId, name: String) -> Self {
        Self::with_kind(
            id,
            RoomKind::Named {
                name,
                spectators: VecDeque::new(),
            },
        )
    }

    fn with_kind(id: RoomId, kind: RoomKind) -> Self {
        Self {
            id,
            kind,
            seats: Vec::with_capacity(2),
            state: GameState::new(),
            rematch_acks: BTreeSet::new(),
            pending: None,
        }
    }

    pub fn kind(&self) -> &RoomKind {
        &self.kind
    }

    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            RoomKind::Random => None,
            RoomKind::Named { name, .. } => Some(name),
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(self.kind, RoomKind::Named { .. })
    }

    pub fn seats(&self) -> &[Seat<G::Side>] {
        &self.seats
    }

    pub fn spectators(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        let queue = match &self.kind {
            RoomKind::Random => None,
            RoomKind::Named { spectators, .. } => Some(spectators),
        };
        queue.into_iter().flatten().copied()
    }

    pub fn pending(&self) -> Option<Pending> {
        self.pending
    }

    pub fn rematch_acks(&self) -> &BTreeSet<ConnectionId> {
        &self.rematch_acks
    }

    pub fn is_full(&self) -> bool {
        self.seats.len() == 2
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Seated players first, then spectators in queue order.
    pub fn members(&self) -> Vec<ConnectionId> {
        self.seats
            .iter()
            .map(|seat| seat.connection)
            .chain(self.spectators())
            .collect()
    }

    pub fn side_of(&self, connection: ConnectionId) -> Option<G::Side> {
        self.seats
            .iter()
            .find(|seat| seat.connection == connection)
            .map(|seat| seat.side)
    }

    pub fn role_of(&self, connection: ConnectionId) -> Option<Role<G::Side>> {
        if let Some(side) = self.side_of(connection) {
            return Some(Role::Player(side));
        }
        self.spectators()
            .any(|c| c == connection)
            .then_some(Role::Spectator)
    }

    pub fn opponent_of(&self, connection: ConnectionId) -> Option<ConnectionId> {
        self.side_of(connection)?;
        self.seats
            .iter()
            .find(|seat| seat.connection != connection)
            .map(|seat| seat.connection)
    }

    /// Seat `connection`, giving it the side complementary to the occupied
    /// seat, or `Side::FIRST` in an empty room. The caller checks
    /// `is_full` first.
    pub fn seat(&mut self, connection: ConnectionId) -> G::Side {
        let side = match self.seats.first() {
            Some(other) => other.side.opponent(),
            None => G::Side::FIRST,
        };
        self.seats.push(Seat { connection, side });
        self.state.waiting_for_opponent = !self.is_full();
        info!(room = %self.id, %connection, side = side.token(), "player seated");
        side
    }

    /// Remove a seated player. Returns the side it held.
    pub fn unseat(&mut self, connection: ConnectionId) -> Option<G::Side> {
        let index = self
            .seats
            .iter()
            .position(|seat| seat.connection == connection)?;
        let seat = self.seats.remove(index);
        self.rematch_acks.remove(&connection);
        self.state.waiting_for_opponent = !self.is_full();
        Some(seat.side)
    }

    /// Append to the spectator queue. No-op for random rooms.
    pub fn add_spectator(&mut self, connection: ConnectionId) {
        if let RoomKind::Named { spectators, .. } = &mut self.kind {
            spectators.push_back(connection);
            info!(room = %self.id, %connection, "spectator queued");
        }
    }

    pub fn remove_spectator(&mut self, connection: ConnectionId) -> bool {
        match &mut self.kind {
            RoomKind::Named { spectators, .. } => {
                let before = spectators.len();
                spectators.retain(|&c| c != connection);
                spectators.len() != before
            }
            RoomKind::Random => false,
        }
    }

    /// Dequeue the longest-waiting spectator.
    pub fn next_spectator(&mut self) -> Option<ConnectionId> {
        match &mut self.kind {
            RoomKind::Named { spectators, .. } => spectators.pop_front(),
            RoomKind::Random => None,
        }
    }

    /// Personal view of the room for `connection`, if it is a member.
    pub fn setup_for(&self, connection: ConnectionId, join_option: JoinOption) -> Option<Setup<G>> {
        let role = self.role_of(connection)?;
        Some(Setup {
            board: self.state.board.clone(),
            current_player: self.state.current_player,
            role,
            waiting_for_opponent: self.state.waiting_for_opponent,
            join_option,
        })
    }

    pub fn broadcast(&self, t: &mut impl Transport<G>, event: &Event<G>) {
        t.broadcast(&self.members(), event);
    }

    pub fn broadcast_state(&self, t: &mut impl Transport<G>) {
        self.broadcast(t, &Event::GameState(Box::new(self.state.clone())));
    }

    pub fn start_game(&self, t: &mut impl Transport<G>) {
        info!(room = %self.id, "game started");
        self.broadcast(t, &Event::StartGame);
    }

    /// New game with the score kept: board cleared, first mover flipped,
    /// freeze/result/acknowledgements/pending request cleared. Broadcasts
    /// the new state.
    pub fn reset_game(&mut self, t: &mut impl Transport<G>) {
        self.state.reset_game(!self.is_full());
        self.rematch_acks.clear();
        self.pending = None;
        info!(
            room = %self.id,
            first = self.state.first_player.token(),
            "new game"
        );
        self.broadcast_state(t);
    }

    /// Like `reset_game`, but the score is zeroed too.
    pub fn reset_all(&mut self, t: &mut impl Transport<G>) {
        self.state.score.clear();
        self.reset_game(t);
    }

    fn require_seat(&self, connection: ConnectionId) -> Result<G::Side, LobbyError> {
        self.side_of(connection)
            .ok_or(LobbyError::NotAPlayer(connection))
    }

    fn require_opponent(&self, connection: ConnectionId) -> Result<ConnectionId, LobbyError> {
        self.opponent_of(connection)
            .ok_or(LobbyError::NoOpponent(connection))
    }

    /// Handle a `new-game` acknowledgement. The requester is frozen until
    /// the other seat acknowledges too, then the board resets.
    pub fn acknowledge_rematch(
        &mut self,
        connection: ConnectionId,
        t: &mut impl Transport<G>,
    ) -> Result<(), LobbyError> {
        self.require_seat(connection)?;
        if !self.rematch_acks.insert(connection) {
            return Ok(());
        }
        t.send(connection, &Event::Freeze);
        if self.rematch_acks.len() == 2 {
            self.reset_game(t);
        }
        Ok(())
    }

    /// Handle a surrender. The opponent is credited immediately and the
    /// room freezes until the surrendering seat acknowledges.
    pub fn surrender(&mut self, connection: ConnectionId, t: &mut impl Transport<G>) -> Result<(), LobbyError> {
        let side = self.require_seat(connection)?;
        let opponent = self.require_opponent(connection)?;
        if !self.state.is_in_progress() || self.state.freeze {
            return Err(LobbyError::GameNotActive(connection));
        }

        self.state.score.record(Outcome::Win(side.opponent()));
        self.state.freeze = true;
        self.state.surrender = true;
        self.pending = Some(Pending::Surrender { by: connection });
        info!(room = %self.id, side = side.token(), "surrendered");

        t.send(connection, &Event::Freeze);
        t.send(opponent, &Event::OppSurrender);
        Ok(())
    }

    /// Handle `surrender-ok` from the surrendering seat: start the next game.
    pub fn accept_surrender(
        &mut self,
        connection: ConnectionId,
        t: &mut impl Transport<G>,
    ) -> Result<(), LobbyError> {
        if self.pending != Some(Pending::Surrender { by: connection }) {
            return Err(LobbyError::NoPendingRequest(connection));
        }
        self.reset_game(t);
        Ok(())
    }

    /// Open a reset or draw proposal. The room freezes, the proposer is
    /// told to freeze its input, and the opponent is asked.
    pub fn propose(
        &mut self,
        connection: ConnectionId,
        kind: Proposal,
        t: &mut impl Transport<G>,
    ) -> Result<(), LobbyError> {
        self.require_seat(connection)?;
        let opponent = self.require_opponent(connection)?;
        let allowed = match kind {
            Proposal::Reset => !self.state.waiting_for_opponent,
            Proposal::Draw => self.state.is_in_progress(),
        };
        if !allowed || self.state.freeze || self.pending.is_some() {
            return Err(LobbyError::GameNotActive(connection));
        }

        self.state.freeze = true;
        self.pending = Some(Pending::Proposal {
            kind,
            by: connection,
        });
        debug!(room = %self.id, %connection, ?kind, "proposal opened");

        t.send(connection, &Event::Freeze);
        let ask = match kind {
            Proposal::Reset => Event::ResetStart,
            Proposal::Draw => Event::DrawStart,
        };
        t.send(opponent, &ask);
        Ok(())
    }

    fn open_proposal(&self, kind: Proposal) -> Option<ConnectionId> {
        match self.pending {
            Some(Pending::Proposal { kind: open, by }) if open == kind => Some(by),
            _ => None,
        }
    }

    /// Confirm the opponent's proposal.
    pub fn confirm(
        &mut self,
        connection: ConnectionId,
        kind: Proposal,
        t: &mut impl Transport<G>,
    ) -> Result<(), LobbyError> {
        self.require_seat(connection)?;
        match self.open_proposal(kind) {
            Some(by) if by != connection => {}
            _ => return Err(LobbyError::NoPendingRequest(connection)),
        }

        match kind {
            Proposal::Reset => self.reset_all(t),
            Proposal::Draw => {
                self.state.score.record(Outcome::Draw);
                info!(room = %self.id, "draw agreed");
                self.broadcast(t, &Event::DrawCancel);
                self.reset_game(t);
            }
        }
        Ok(())
    }

    /// Withdraw or decline a proposal. Either seat may cancel.
    pub fn cancel(
        &mut self,
        connection: ConnectionId,
        kind: Proposal,
        t: &mut impl Transport<G>,
    ) -> Result<(), LobbyError> {
        self.require_seat(connection)?;
        if self.open_proposal(kind).is_none() {
            return Err(LobbyError::NoPendingRequest(connection));
        }

        self.state.freeze = false;
        self.pending = None;
        let notice = match kind {
            Proposal::Reset => Event::ResetCancel,
            Proposal::Draw => Event::DrawCancel,
        };
        self.broadcast(t, &notice);
        Ok(())
    }

    /// Apply a move by a seated player and broadcast the new state. A
    /// rejected move broadcasts nothing.
    pub fn play(
        &mut self,
        connection: ConnectionId,
        mv: &G::Move,
        t: &mut impl Transport<G>,
    ) -> Result<Option<Outcome<G::Side>>, LobbyError> {
        let side = self.require_seat(connection)?;
        let outcome = self.state.play(side, mv)?;
        if let Some(outcome) = outcome {
            info!(room = %self.id, result = outcome.token(), "game finished");
        }
        self.broadcast_state(t);
        Ok(outcome)
    }
}
