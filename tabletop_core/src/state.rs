// Per-room game state machine.
//
// `GameState` holds the score tally, the turn order, the result flags, and
// the board of one room. It is the payload of every `game-state` broadcast,
// so it serializes with the camelCase field names the clients read. The
// jump-chain (or other per-turn transient) state is kept alongside but never
// serialized.
//
// Lifecycle:
//
//   WaitingForOpponent --(second seat filled, reset)--> InProgress
//   InProgress --(winning/drawing move)--> GameOver
//   GameOver --(reset_game)--> InProgress (first mover flipped)
//
// `freeze` is a sub-flag of InProgress/GameOver that blocks move intake
// while a surrender/reset/draw handshake is open. Only the room sets and
// clears it; `reset_game` always clears it.

use std::marker::PhantomData;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::IllegalMove;
use crate::game::{DRAW_TOKEN, Game, Outcome, Side, TurnEnd};

/// Cumulative score of a room: wins per side plus draws.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Score<S: Side> {
    wins: [u32; 2],
    draws: u32,
    _side: PhantomData<S>,
}

impl<S: Side> Default for Score<S> {
    fn default() -> Self {
        Self {
            wins: [0; 2],
            draws: 0,
            _side: PhantomData,
        }
    }
}

impl<S: Side> Score<S> {
    pub fn record(&mut self, outcome: Outcome<S>) {
        match outcome {
            Outcome::Win(side) => self.wins[side.index()] += 1,
            Outcome::Draw => self.draws += 1,
        }
    }

    pub fn wins(&self, side: S) -> u32 {
        self.wins[side.index()]
    }

    pub fn draws(&self) -> u32 {
        self.draws
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl<S: Side> Serialize for Score<S> {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry(S::FIRST.token(), &self.wins(S::FIRST))?;
        map.serialize_entry(S::FIRST.opponent().token(), &self.wins(S::FIRST.opponent()))?;
        map.serialize_entry(DRAW_TOKEN, &self.draws)?;
        map.end()
    }
}

/// Coarse phase of a room's game, derived from the flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    WaitingForOpponent,
    InProgress { frozen: bool },
    GameOver { frozen: bool },
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase", bound = "")]
pub struct GameState<G: Game> {
    pub score: Score<G::Side>,
    pub current_player: G::Side,
    pub first_player: G::Side,
    pub game_over: bool,
    pub freeze: bool,
    pub surrender: bool,
    pub waiting_for_opponent: bool,
    pub result: Option<Outcome<G::Side>>,
    /// Spliced into the snapshot as the game's own fields (`tiles`, and
    /// for Checkers `crowns` and `pieces`).
    #[serde(flatten)]
    pub board: G::Board,
    #[serde(skip)]
    pub turn: G::Turn,
}

impl<G: Game> Default for GameState<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: Game> GameState<G> {
    pub fn new() -> Self {
        Self {
            score: Score::default(),
            current_player: G::Side::FIRST,
            first_player: G::Side::FIRST,
            game_over: false,
            freeze: false,
            surrender: false,
            waiting_for_opponent: true,
            result: None,
            board: G::new_board(),
            turn: G::Turn::default(),
        }
    }

    pub fn status(&self) -> Status {
        if self.waiting_for_opponent {
            Status::WaitingForOpponent
        } else if self.game_over {
            Status::GameOver {
                frozen: self.freeze,
            }
        } else {
            Status::InProgress {
                frozen: self.freeze,
            }
        }
    }

    /// True while moves can be made: both seats filled and no result yet.
    pub fn is_in_progress(&self) -> bool {
        !self.waiting_for_opponent && !self.game_over
    }

    /// Apply one move by `side`. On success the turn passes (or the game
    /// ends) unless the engine reports a continuing chain. On `Err` nothing
    /// has changed.
    pub fn play(&mut self, side: G::Side, mv: &G::Move) -> Result<Option<Outcome<G::Side>>, IllegalMove> {
        if self.waiting_for_opponent {
            return Err(IllegalMove::WaitingForOpponent);
        }
        if self.game_over {
            return Err(IllegalMove::GameOver);
        }
        if self.freeze {
            return Err(IllegalMove::Frozen);
        }
        if side != self.current_player {
            return Err(IllegalMove::NotYourTurn);
        }

        match G::apply(&mut self.board, &mut self.turn, side, mv)? {
            TurnEnd::Continue => Ok(None),
            TurnEnd::Pass => match G::outcome(&self.board, side) {
                Some(outcome) => {
                    self.finish(outcome);
                    Ok(Some(outcome))
                }
                None => {
                    self.current_player = side.opponent();
                    Ok(None)
                }
            },
        }
    }

    fn finish(&mut self, outcome: Outcome<G::Side>) {
        self.game_over = true;
        self.result = Some(outcome);
        self.score.record(outcome);
    }

    /// Clear the board and flags for a new game; the first mover alternates
    /// unconditionally. Score is kept.
    pub fn reset_game(&mut self, waiting_for_opponent: bool) {
        let next = self.first_player.opponent();
        self.first_player = next;
        self.current_player = next;
        self.board = G::new_board();
        self.turn = G::Turn::default();
        self.result = None;
        self.game_over = false;
        self.freeze = false;
        self.surrender = false;
        self.waiting_for_opponent = waiting_for_opponent;
    }

    /// Zero the score, then `reset_game`.
    pub fn reset_all(&mut self, waiting_for_opponent: bool) {
        self.score.clear();
        self.reset_game(waiting_for_opponent);
    }
}
