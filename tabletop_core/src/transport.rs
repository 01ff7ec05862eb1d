// Outbound side of the core.
//
// Rooms and the lobby describe what each connection should be told as
// `Event` values and hand them to a `Transport`. Delivery is fire-and-forget:
// the core never waits on, or learns about, a failed send. The server
// implements `Transport` by encoding events into wire messages; tests use
// `RecordingTransport` to assert on exactly what was sent to whom.

use crate::game::{Game, Role};
use crate::state::GameState;
use crate::types::{ConnectionId, JoinOption};

/// Personal view of a room sent to a connection when it (re)enters one.
#[derive(Clone, Debug)]
pub struct Setup<G: Game> {
    pub board: G::Board,
    pub current_player: G::Side,
    pub role: Role<G::Side>,
    pub waiting_for_opponent: bool,
    pub join_option: JoinOption,
}

#[derive(Clone, Debug)]
pub enum Event<G: Game> {
    Setup(Setup<G>),
    StartGame,
    GameState(Box<GameState<G>>),
    Freeze,
    OppSurrender,
    ResetAlert,
    ResetStart,
    ResetCancel,
    DrawStart,
    DrawCancel,
    RoomNameTaken,
    RoomNameTakenOk,
    RoomNotFound,
    RoomNotFoundOk,
}

impl<G: Game> Event<G> {
    /// Wire event name.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Setup(_) => "setup",
            Event::StartGame => "start-game",
            Event::GameState(_) => "game-state",
            Event::Freeze => "freeze",
            Event::OppSurrender => "opp-surrender",
            Event::ResetAlert => "reset-alert",
            Event::ResetStart => "reset-start",
            Event::ResetCancel => "reset-cancel",
            Event::DrawStart => "draw-start",
            Event::DrawCancel => "draw-cancel",
            Event::RoomNameTaken => "room-name-taken",
            Event::RoomNameTakenOk => "room-name-taken-ok",
            Event::RoomNotFound => "room-not-found",
            Event::RoomNotFoundOk => "room-not-found-ok",
        }
    }
}

pub trait Transport<G: Game> {
    fn send(&mut self, to: ConnectionId, event: &Event<G>);

    fn broadcast(&mut self, members: &[ConnectionId], event: &Event<G>) {
        for &member in members {
            self.send(member, event);
        }
    }
}

/// Captures every sent event, in order.
#[derive(Debug)]
pub struct RecordingTransport<G: Game> {
    pub sent: Vec<(ConnectionId, Event<G>)>,
}

impl<G: Game> Default for RecordingTransport<G> {
    fn default() -> Self {
        Self { sent: Vec::new() }
    }
}

impl<G: Game> RecordingTransport<G> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Event names sent to `to`, in order.
    pub fn names_for(&self, to: ConnectionId) -> Vec<&'static str> {
        self.sent
            .iter()
            .filter(|(conn, _)| *conn == to)
            .map(|(_, event)| event.name())
            .collect()
    }

    /// The most recent `setup` sent to `to`.
    pub fn last_setup(&self, to: ConnectionId) -> Option<&Setup<G>> {
        self.sent.iter().rev().find_map(|(conn, event)| match event {
            Event::Setup(setup) if *conn == to => Some(setup),
            _ => None,
        })
    }

    /// The most recent `game-state` sent to `to`.
    pub fn last_state(&self, to: ConnectionId) -> Option<&GameState<G>> {
        self.sent.iter().rev().find_map(|(conn, event)| match event {
            Event::GameState(state) if *conn == to => Some(state.as_ref()),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.sent.clear();
    }
}

impl<G: Game> Transport<G> for RecordingTransport<G> {
    fn send(&mut self, to: ConnectionId, event: &Event<G>) {
        self.sent.push((to, event.clone()));
    }
}
