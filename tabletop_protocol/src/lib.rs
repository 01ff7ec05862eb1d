// tabletop_protocol: wire protocol between game clients and the tabletop
// server.
//
// This crate defines the message types and framing used over TCP. It is
// shared by the server and by its test client, and has no dependency on the
// game rules in `tabletop_core`.
//
// Module overview:
// - `types.rs`:    Value types inside messages: `GameName`, `JoinOption`,
//                  `MessageKind`, `RowCol`.
// - `message.rs`:  `ClientMessage` / `ServerMessage` envelopes with the
//                  kebab-case event names clients listen for.
// - `framing.rs`:  4-byte big-endian length prefix, then JSON payload, over
//                  any `Read`/`Write`; typed `send_json` / `recv_json`.
//
// Board and state snapshots are carried as `serde_json::Value` so the
// protocol does not need to know either game's board layout.

pub mod framing;
pub mod message;
pub mod types;

pub use framing::{MAX_MESSAGE_SIZE, read_message, recv_json, send_json, write_message};
pub use message::{ClientMessage, Hello, PieceMove, ServerMessage, Setup, TileClick};
pub use types::{GameName, JoinOption, MessageKind, RowCol};
