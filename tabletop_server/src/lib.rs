// tabletop_server: TCP server hosting TicTacToe and Checkers rooms.
//
// The server accepts TCP connections, performs the `hello` handshake, and
// funnels every client message into one dispatch loop that owns both game
// lobbies. All game rules and room lifecycle live in `tabletop_core`; this
// crate is networking, message translation, and process setup.
//
// Module overview:
// - `server.rs`:  TCP listener, reader threads (one per client), and the
//                 main event loop. `std::net` with a thread-per-reader
//                 architecture and an `mpsc` channel into the single
//                 dispatch thread. `ServerConfig` / `start_server`.
// - `hub.rs`:     Connection registry and per-game dispatch into
//                 `tabletop_core::lobby::Lobby`.
// - `wire.rs`:    Core `Event` -> `ServerMessage` encoding (the `Outbox`
//                 transport) and move decoding (`WireGame`).
// - `client.rs`:  Blocking `NetClient` used by tests and headless clients.
//
// The server runs as a standalone binary (`main.rs`) or embedded via
// `start_server`.

pub mod client;
pub mod hub;
pub mod server;
pub mod wire;

pub use client::{ClientError, NetClient};
pub use server::{ServerConfig, ServerHandle, start_server};
