// Board position arithmetic for the 8x8 Checkers board.
//
// Squares are addressed by `(row, col)` with row 0 on White's home side.
// Clients and the starting layout also use 1-based linear tile numbers
// (`tile = row * 8 + col + 1`). Rows and columns are `i8` so that stepping
// off the edge yields an off-board square instead of wrapping; callers check
// `is_on_board` before using a stepped square.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const BOARD_SIZE: i8 = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Square {
    pub row: i8,
    pub col: i8,
}

/// A unit diagonal step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Direction {
    pub dr: i8,
    pub dc: i8,
}

pub const DIAGONALS: [Direction; 4] = [
    Direction { dr: 1, dc: 1 },
    Direction { dr: 1, dc: -1 },
    Direction { dr: -1, dc: 1 },
    Direction { dr: -1, dc: -1 },
];

/// A move along a diagonal: unit direction plus number of squares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Diagonal {
    pub dir: Direction,
    pub distance: i8,
}

impl Square {
    pub const fn new(row: i8, col: i8) -> Self {
        Self { row, col }
    }

    /// Square for a 1-based tile number. Tiles outside 1..=64 give an
    /// off-board square.
    pub fn from_tile(tile: u8) -> Self {
        let index = i16::from(tile) - 1;
        if !(0..64).contains(&index) {
            return Self::new(-1, -1);
        }
        Self::new((index / 8) as i8, (index % 8) as i8)
    }

    /// 1-based tile number, or `None` off the board.
    pub fn tile(self) -> Option<u8> {
        self.is_on_board()
            .then(|| (self.row * BOARD_SIZE + self.col + 1) as u8)
    }

    pub fn is_on_board(self) -> bool {
        (0..BOARD_SIZE).contains(&self.row) && (0..BOARD_SIZE).contains(&self.col)
    }

    /// The square `distance` steps away along `dir`. May be off the board.
    pub fn step(self, dir: Direction, distance: i8) -> Self {
        Self::new(self.row + dir.dr * distance, self.col + dir.dc * distance)
    }

    /// Direction and length of the move to `to`, if it is a non-empty
    /// diagonal move.
    pub fn diagonal_to(self, to: Square) -> Option<Diagonal> {
        let dr = to.row - self.row;
        let dc = to.col - self.col;
        if dr == 0 || dr.abs() != dc.abs() {
            return None;
        }
        Some(Diagonal {
            dir: Direction {
                dr: dr.signum(),
                dc: dc.signum(),
            },
            distance: dr.abs(),
        })
    }

    /// Squares strictly between `self` and the end of `diagonal`.
    pub fn between(self, diagonal: Diagonal) -> impl Iterator<Item = Square> {
        (1..diagonal.distance).map(move |k| self.step(diagonal.dir, k))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_numbering_matches_layout() {
        assert_eq!(Square::from_tile(1), Square::new(0, 0));
        assert_eq!(Square::from_tile(10), Square::new(1, 1));
        assert_eq!(Square::from_tile(17), Square::new(2, 0));
        assert_eq!(Square::from_tile(64), Square::new(7, 7));
        assert_eq!(Square::new(5, 1).tile(), Some(42));
    }

    #[test]
    fn tiles_outside_the_board_are_off_board() {
        assert!(!Square::from_tile(0).is_on_board());
        assert!(!Square::from_tile(65).is_on_board());
        assert_eq!(Square::new(8, 0).tile(), None);
    }

    #[test]
    fn every_tile_round_trips() {
        for tile in 1..=64u8 {
            assert_eq!(Square::from_tile(tile).tile(), Some(tile));
        }
    }

    #[test]
    fn diagonal_detection() {
        let from = Square::new(2, 1);
        let d = from.diagonal_to(Square::new(4, 3)).unwrap();
        assert_eq!(d.dir, Direction { dr: 1, dc: 1 });
        assert_eq!(d.distance, 2);

        assert!(from.diagonal_to(Square::new(4, 1)).is_none());
        assert!(from.diagonal_to(from).is_none());
        assert!(from.diagonal_to(Square::new(3, 3)).is_none());
    }

    #[test]
    fn between_excludes_endpoints() {
        let from = Square::new(0, 0);
        let d = from.diagonal_to(Square::new(4, 4)).unwrap();
        let path: Vec<Square> = from.between(d).collect();
        assert_eq!(
            path,
            vec![Square::new(1, 1), Square::new(2, 2), Square::new(3, 3)]
        );
    }
}
