// Checkers move validation engine.
//
// `verify_move` is the single entry point. It validates a proposed
// from/to move for one side against the current piece set and the active
// jump chain, and only then mutates: on `Err` the board and chain are
// untouched. Rules enforced:
//
// - Moves are diagonal and land on an empty square.
// - Mandatory capture: if any piece of the moving side can capture, the move
//   must be a capture. While a chain is active only the piece that just
//   captured may move, and it must capture again.
// - Uncrowned pieces step one square forward, or capture by leaping two
//   squares (in any diagonal direction) over an adjacent enemy.
// - Crowned pieces slide any distance over empty squares, or capture by
//   sliding over exactly one enemy piece and landing on any empty square
//   beyond it.
// - Reaching the far rank crowns the piece at once, whatever the move type.
//
// After a capture the chain continues if the same piece (already crowned if
// it just reached the far rank) can capture again; otherwise the turn
// passes. `Checkers::outcome` then applies the loss condition to the side
// about to move: no living pieces, or no legal move at all.

use std::collections::BTreeMap;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::error::IllegalMove;
use crate::game::{Game, Outcome, Side, TurnEnd};
use crate::piece::{Color, Piece, PieceId};
use crate::square::{DIAGONALS, Diagonal, Direction, Square};
use crate::types::GameKind;

#[derive(Clone, Copy, Debug)]
pub struct Checkers;

/// A proposed move, as received from the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PieceMove {
    pub from: Square,
    pub to: Square,
}

/// Capture chain state carried between calls within one turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JumpChain {
    #[default]
    Idle,
    Active { piece: PieceId, at: Square },
}

/// What a legal move did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Moved,
    Jumped,
}

/// How a validated move resolves, before anything is mutated.
enum Plan {
    Slide,
    Capture(usize),
}

/// Every piece of both sides, living and captured.
///
/// Serialized as `tiles` (occupied tile number -> side), `crowns` (tile
/// numbers of living kings, ascending), and `pieces` (the full piece list).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckersBoard {
    pieces: Vec<Piece>,
}

impl Default for CheckersBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for CheckersBoard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let living = || self.pieces.iter().filter(|p| p.alive);
        let tiles: BTreeMap<u8, Color> = living()
            .filter_map(|p| p.pos.tile().map(|tile| (tile, p.color)))
            .collect();
        let mut crowns: Vec<u8> = living()
            .filter(|p| p.crown)
            .filter_map(|p| p.pos.tile())
            .collect();
        crowns.sort_unstable();

        let mut board = serializer.serialize_struct("CheckersBoard", 3)?;
        board.serialize_field("tiles", &tiles)?;
        board.serialize_field("crowns", &crowns)?;
        board.serialize_field("pieces", &self.pieces)?;
        board.end()
    }
}

impl CheckersBoard {
    /// Standard opening layout, twelve pieces a side.
    pub fn new() -> Self {
        let pieces = [Color::White, Color::Black]
            .into_iter()
            .flat_map(|color| {
                color
                    .starting_tiles()
                    .iter()
                    .map(move |&tile| Piece::new(tile, color))
            })
            .collect();
        Self { pieces }
    }

    /// A board holding exactly `pieces`.
    pub fn with_pieces(pieces: Vec<Piece>) -> Self {
        Self { pieces }
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Living pieces of one side.
    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = &Piece> {
        self.pieces
            .iter()
            .filter(move |p| p.alive && p.color == color)
    }

    pub fn living_count(&self, color: Color) -> usize {
        self.pieces_of(color).count()
    }

    /// The living piece on `square`, if any.
    pub fn piece_at(&self, square: Square) -> Option<&Piece> {
        self.index_at(square).map(|i| &self.pieces[i])
    }

    fn index_at(&self, square: Square) -> Option<usize> {
        self.pieces
            .iter()
            .position(|p| p.alive && p.pos == square)
    }

    fn is_empty(&self, square: Square) -> bool {
        square.is_on_board() && self.piece_at(square).is_none()
    }

    /// Put every piece back on its starting tile.
    pub fn reset(&mut self) {
        for piece in &mut self.pieces {
            piece.reset();
        }
    }

    /// Whether the piece at `index` has a capture available in `dir`.
    fn can_capture_toward(&self, index: usize, dir: Direction) -> bool {
        let piece = &self.pieces[index];
        if !piece.crown {
            let over = piece.pos.step(dir, 1);
            let landing = piece.pos.step(dir, 2);
            return self.is_empty(landing)
                && self
                    .piece_at(over)
                    .is_some_and(|other| other.color != piece.color);
        }

        let mut distance = 1;
        loop {
            let square = piece.pos.step(dir, distance);
            if !square.is_on_board() {
                return false;
            }
            match self.piece_at(square) {
                None => distance += 1,
                Some(other) if other.color != piece.color => {
                    return self.is_empty(piece.pos.step(dir, distance + 1));
                }
                Some(_) => return false,
            }
        }
    }

    fn can_jump(&self, index: usize) -> bool {
        let piece = &self.pieces[index];
        piece.alive
            && DIAGONALS
                .iter()
                .any(|&dir| self.can_capture_toward(index, dir))
    }

    /// Whether any living piece of `color` can capture.
    pub fn side_can_jump(&self, color: Color) -> bool {
        (0..self.pieces.len())
            .any(|i| self.pieces[i].alive && self.pieces[i].color == color && self.can_jump(i))
    }

    /// Whether the living piece on `square` can capture.
    pub fn can_jump_from(&self, square: Square) -> bool {
        self.index_at(square).is_some_and(|i| self.can_jump(i))
    }

    /// Whether `color` has any legal move (capture or plain step).
    pub fn has_legal_move(&self, color: Color) -> bool {
        if self.side_can_jump(color) {
            return true;
        }
        self.pieces_of(color).any(|piece| {
            DIAGONALS
                .iter()
                .filter(|dir| piece.crown || dir.dr == color.forward())
                .any(|&dir| self.is_empty(piece.pos.step(dir, 1)))
        })
    }

    /// Decide how the piece at `mover` would travel along `diagonal`,
    /// without mutating anything.
    fn plan(&self, mover: usize, diagonal: Diagonal) -> Result<Plan, IllegalMove> {
        let piece = &self.pieces[mover];

        if !piece.crown {
            return match diagonal.distance {
                1 if diagonal.dir.dr == piece.color.forward() => Ok(Plan::Slide),
                1 => Err(IllegalMove::Backward),
                2 => {
                    let over = piece.pos.step(diagonal.dir, 1);
                    match self.index_at(over) {
                        Some(victim) if self.pieces[victim].color != piece.color => {
                            Ok(Plan::Capture(victim))
                        }
                        _ => Err(IllegalMove::NothingToCapture),
                    }
                }
                _ => Err(IllegalMove::TooFar),
            };
        }

        let mut crossed = piece
            .pos
            .between(diagonal)
            .filter_map(|square| self.index_at(square));
        match (crossed.next(), crossed.next()) {
            (None, _) => Ok(Plan::Slide),
            (Some(victim), None) if self.pieces[victim].color != piece.color => {
                Ok(Plan::Capture(victim))
            }
            _ => Err(IllegalMove::BlockedPath),
        }
    }
}

/// Validate and execute a move for `color` from `from` to `to`.
pub fn verify_move(
    board: &mut CheckersBoard,
    chain: &mut JumpChain,
    color: Color,
    from: Square,
    to: Square,
) -> Result<Step, IllegalMove> {
    if !from.is_on_board() {
        return Err(IllegalMove::OffBoard(from));
    }
    if !to.is_on_board() {
        return Err(IllegalMove::OffBoard(to));
    }
    let diagonal = from.diagonal_to(to).ok_or(IllegalMove::NotDiagonal)?;
    if board.piece_at(to).is_some() {
        return Err(IllegalMove::Occupied(to));
    }
    let mover = board
        .index_at(from)
        .filter(|&i| board.pieces[i].color == color)
        .ok_or(IllegalMove::NoPieceAt(from))?;

    let must_capture = match *chain {
        JumpChain::Active { piece, at } => {
            if from != at || board.pieces[mover].id != piece {
                return Err(IllegalMove::ChainPieceMustMove);
            }
            true
        }
        JumpChain::Idle => board.side_can_jump(color),
    };

    match board.plan(mover, diagonal)? {
        Plan::Slide => {
            if must_capture {
                return Err(IllegalMove::CaptureRequired);
            }
            board.pieces[mover].move_to(to);
            *chain = JumpChain::Idle;
            Ok(Step::Moved)
        }
        Plan::Capture(victim) => {
            board.pieces[victim].capture();
            board.pieces[mover].move_to(to);
            *chain = if board.can_jump(mover) {
                JumpChain::Active {
                    piece: board.pieces[mover].id,
                    at: to,
                }
            } else {
                JumpChain::Idle
            };
            Ok(Step::Jumped)
        }
    }
}

impl Game for Checkers {
    const KIND: GameKind = GameKind::Checkers;

    type Side = Color;
    type Board = CheckersBoard;
    type Turn = JumpChain;
    type Move = PieceMove;

    fn new_board() -> CheckersBoard {
        CheckersBoard::new()
    }

    fn apply(
        board: &mut CheckersBoard,
        chain: &mut JumpChain,
        side: Color,
        mv: &PieceMove,
    ) -> Result<TurnEnd, IllegalMove> {
        verify_move(board, chain, side, mv.from, mv.to)?;
        Ok(match chain {
            JumpChain::Active { .. } => TurnEnd::Continue,
            JumpChain::Idle => TurnEnd::Pass,
        })
    }

    fn outcome(board: &CheckersBoard, mover: Color) -> Option<Outcome<Color>> {
        let next = mover.opponent();
        if board.living_count(next) == 0 || !board.has_legal_move(next) {
            Some(Outcome::Win(mover))
        } else {
            None
        }
    }
}
