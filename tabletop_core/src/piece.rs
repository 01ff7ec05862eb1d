// Checkers piece model.
//
// A piece's id is the tile it starts on, so `reset` can always put it back
// without a separate layout table. Captured pieces are flagged `alive =
// false` rather than removed; the board keeps every piece for the whole
// match so ids stay stable across a capture chain and across rematches.

use serde::{Deserialize, Serialize};

use crate::game::Side;
use crate::square::{BOARD_SIZE, Square};

/// Checkers side. White starts on rows 0-2 and advances toward row 7.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    #[serde(rename = "W")]
    White,
    #[serde(rename = "B")]
    Black,
}

const WHITE_START: [u8; 12] = [1, 3, 5, 7, 10, 12, 14, 16, 17, 19, 21, 23];
const BLACK_START: [u8; 12] = [42, 44, 46, 48, 49, 51, 53, 55, 58, 60, 62, 64];

impl Color {
    /// Row delta of a forward step.
    pub fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// The opponent's back rank, where this side's pieces are crowned.
    pub fn crown_row(self) -> i8 {
        match self {
            Color::White => BOARD_SIZE - 1,
            Color::Black => 0,
        }
    }

    pub fn starting_tiles(self) -> &'static [u8] {
        match self {
            Color::White => &WHITE_START,
            Color::Black => &BLACK_START,
        }
    }
}

impl Side for Color {
    const FIRST: Self = Color::White;

    fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    fn token(self) -> &'static str {
        match self {
            Color::White => "W",
            Color::Black => "B",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "W" => Some(Color::White),
            "B" => Some(Color::Black),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PieceId(pub u8);

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Piece {
    pub id: PieceId,
    #[serde(rename = "role")]
    pub color: Color,
    pub crown: bool,
    pub pos: Square,
    pub alive: bool,
}

impl Piece {
    /// A fresh piece on its starting tile.
    pub fn new(tile: u8, color: Color) -> Self {
        Self {
            id: PieceId(tile),
            color,
            crown: false,
            pos: Square::from_tile(tile),
            alive: true,
        }
    }

    /// A piece placed on an arbitrary square (custom positions and tests).
    pub fn placed(id: u8, color: Color, pos: Square) -> Self {
        Self {
            id: PieceId(id),
            color,
            crown: false,
            pos,
            alive: true,
        }
    }

    pub fn crowned(mut self) -> Self {
        self.crown = true;
        self
    }

    /// Move to `to`, crowning on the far rank.
    pub fn move_to(&mut self, to: Square) {
        self.pos = to;
        if to.row == self.color.crown_row() {
            self.crown = true;
        }
    }

    pub fn capture(&mut self) {
        self.alive = false;
    }

    pub fn reset(&mut self) {
        self.crown = false;
        self.pos = Square::from_tile(self.id.0);
        self.alive = true;
    }
}
