// The contract every hosted game implements.
//
// A `Game` is a zero-sized marker type that names its side tokens, its board
// representation, its per-turn transient state, and its move type, and that
// supplies two pure functions: `apply` (validate and execute one move) and
// `outcome` (decide whether the move just made ended the game). Everything
// above the rule engine (`GameState`, `Room`, `Lobby`) is generic over this
// trait, so TicTacToe and Checkers share one room lifecycle.
//
// Side tokens are the single-letter strings the clients already understand
// ("O"/"X", "W"/"B"); spectators are "S" and a drawn result is "D". These
// tokens are the serialized form of `Side`, `Role`, and `Outcome`.

use std::fmt::Debug;
use std::hash::Hash;

use serde::{Serialize, Serializer};

use crate::error::IllegalMove;
use crate::types::GameKind;

/// Token used for a drawn result and for the draw column of the score.
pub const DRAW_TOKEN: &str = "D";

/// Token used for the spectator role.
pub const SPECTATOR_TOKEN: &str = "S";

/// One of the two playing sides of a game.
pub trait Side: Copy + Eq + Hash + Debug + Serialize + Send + 'static {
    /// The side that moves first in the very first game of a room, and the
    /// side given to whoever opens a room.
    const FIRST: Self;

    fn opponent(self) -> Self;

    /// Wire token for this side.
    fn token(self) -> &'static str;

    fn from_token(token: &str) -> Option<Self>;

    /// Stable 0/1 index, `FIRST` being 0.
    fn index(self) -> usize {
        if self == Self::FIRST { 0 } else { 1 }
    }
}

/// Whether the mover keeps the turn after a legal move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnEnd {
    /// Turn passes to the opponent (or the game ended).
    Pass,
    /// The same side moves again (an unfinished capture chain).
    Continue,
}

/// Rule engine for one game.
pub trait Game: Clone + Debug + Send + 'static {
    const KIND: GameKind;

    type Side: Side;
    type Board: Clone + Debug + Serialize + Send;
    /// Transient state that lives for one turn (cleared on reset).
    type Turn: Clone + Debug + Default + Send;
    type Move: Debug;

    fn new_board() -> Self::Board;

    /// Validate and execute `mv` for `side`. On `Err` neither `board` nor
    /// `turn` has been touched.
    fn apply(
        board: &mut Self::Board,
        turn: &mut Self::Turn,
        side: Self::Side,
        mv: &Self::Move,
    ) -> Result<TurnEnd, IllegalMove>;

    /// Called after a move by `mover` that passed the turn.
    fn outcome(board: &Self::Board, mover: Self::Side) -> Option<Outcome<Self::Side>>;
}

/// Terminal result of one game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome<S> {
    Win(S),
    Draw,
}

impl<S: Side> Outcome<S> {
    pub fn token(self) -> &'static str {
        match self {
            Outcome::Win(side) => side.token(),
            Outcome::Draw => DRAW_TOKEN,
        }
    }
}

impl<S: Side> Serialize for Outcome<S> {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        serializer.serialize_str(self.token())
    }
}

/// What a connection is doing in its room.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role<S> {
    Player(S),
    Spectator,
}

impl<S: Side> Role<S> {
    pub fn token(self) -> &'static str {
        match self {
            Role::Player(side) => side.token(),
            Role::Spectator => SPECTATOR_TOKEN,
        }
    }

    pub fn side(self) -> Option<S> {
        match self {
            Role::Player(side) => Some(side),
            Role::Spectator => None,
        }
    }
}

impl<S: Side> Serialize for Role<S> {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        serializer.serialize_str(self.token())
    }
}
