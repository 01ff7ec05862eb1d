// Core of the tabletop game service: rule engines, per-room state machine,
// and room/matchmaking management. No I/O happens here.
//
// Module layout, leaves first:
// - `types`: connection/room ids, game kind, join option.
// - `error`: `IllegalMove` and `LobbyError`.
// - `game`: the `Game`/`Side` contract every hosted game implements, plus
//   `Outcome` and `Role`.
// - `square`, `piece`: Checkers board coordinates and the piece model.
// - `checkers`: Checkers move validation (forced capture, capture chains,
//   crowning, sliding king captures).
// - `tictactoe`: TicTacToe rule engine.
// - `state`: `GameState`, the per-room score/turn/result state machine.
// - `transport`: the outbound `Event` vocabulary and the `Transport` trait
//   the server implements.
// - `room`: a single room with seats, spectators, and the
//   rematch/surrender/reset/draw handshakes.
// - `lobby`: the registry of players and rooms for one game, with random
//   and named matchmaking and disconnect handoff.
//
// The server drives one `Lobby` per game from a single dispatch loop and
// passes itself in as the `Transport`.

pub mod checkers;
pub mod error;
pub mod game;
pub mod lobby;
pub mod piece;
pub mod room;
pub mod square;
pub mod state;
pub mod tictactoe;
pub mod transport;
pub mod types;
