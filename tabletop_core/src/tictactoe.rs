// TicTacToe rule engine.
//
// Tiles are numbered 1..=9 row by row. A move is a tile click; the side is
// taken from the clicker's seat, and a side token sent along with the click
// must agree with it. The mover wins on completing any of the eight lines;
// otherwise a full grid is a draw.
//
// On the wire the grid is `{"tiles": {"1": "O", "5": "X", ...}}`: a map
// keyed by tile number holding only the occupied tiles.

use std::collections::BTreeMap;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::IllegalMove;
use crate::game::{Game, Outcome, Side, TurnEnd};
use crate::types::GameKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    O,
    X,
}

impl Side for Mark {
    const FIRST: Self = Mark::O;

    fn opponent(self) -> Self {
        match self {
            Mark::O => Mark::X,
            Mark::X => Mark::O,
        }
    }

    fn token(self) -> &'static str {
        match self {
            Mark::O => "O",
            Mark::X => "X",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "O" => Some(Mark::O),
            "X" => Some(Mark::X),
            _ => None,
        }
    }
}

pub const WINNING_LINES: [[u8; 3]; 8] = [
    [1, 2, 3],
    [4, 5, 6],
    [7, 8, 9],
    [1, 4, 7],
    [2, 5, 8],
    [3, 6, 9],
    [1, 5, 9],
    [3, 5, 7],
];

/// The 3x3 grid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Grid {
    tiles: [Option<Mark>; 9],
}

impl Grid {
    /// Mark on a 1-based tile, `None` for empty or out-of-range tiles.
    pub fn get(&self, tile: u8) -> Option<Mark> {
        Self::slot(i32::from(tile)).and_then(|i| self.tiles[i])
    }

    pub fn is_full(&self) -> bool {
        self.tiles.iter().all(Option::is_some)
    }

    pub fn has_line(&self, mark: Mark) -> bool {
        WINNING_LINES
            .iter()
            .any(|line| line.iter().all(|&tile| self.get(tile) == Some(mark)))
    }

    fn slot(tile: i32) -> Option<usize> {
        usize::try_from(tile - 1).ok().filter(|&i| i < 9)
    }
}

impl Serialize for Grid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let tiles: BTreeMap<u8, Mark> = (1..=9)
            .filter_map(|tile| self.get(tile).map(|mark| (tile, mark)))
            .collect();
        let mut grid = serializer.serialize_struct("Grid", 1)?;
        grid.serialize_field("tiles", &tiles)?;
        grid.end()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TicTacToe;

/// A tile click. `tile` is taken as sent, so out-of-range values reach the
/// rules and are refused there. `mark` is the side the client believes it
/// plays, if sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileClick {
    pub tile: i32,
    pub mark: Option<Mark>,
}

impl Game for TicTacToe {
    const KIND: GameKind = GameKind::TicTacToe;

    type Side = Mark;
    type Board = Grid;
    type Turn = ();
    type Move = TileClick;

    fn new_board() -> Grid {
        Grid::default()
    }

    fn apply(grid: &mut Grid, _turn: &mut (), side: Mark, click: &TileClick) -> Result<TurnEnd, IllegalMove> {
        if click.mark.is_some_and(|mark| mark != side) {
            return Err(IllegalMove::SideMismatch);
        }
        let slot = Grid::slot(click.tile).ok_or(IllegalMove::TileOutOfRange(click.tile))?;
        if grid.tiles[slot].is_some() {
            return Err(IllegalMove::TileTaken(click.tile));
        }
        grid.tiles[slot] = Some(side);
        Ok(TurnEnd::Pass)
    }

    fn outcome(grid: &Grid, mover: Mark) -> Option<Outcome<Mark>> {
        if grid.has_line(mover) {
            Some(Outcome::Win(mover))
        } else if grid.is_full() {
            Some(Outcome::Draw)
        } else {
            None
        }
    }
}
