// Test-only player for end-to-end game tests.
//
// Wraps the real `NetClient` (from `tabletop_server::client`) to provide a
// synchronous, test-friendly API for exercising the whole pipeline:
// hello -> matchmaking -> moves -> broadcast state -> rematch/disconnect.
//
// The only test-specific code here is the blocking wait helpers around
// `NetClient::recv_timeout()`. While waiting, the player remembers the
// latest `setup` and `game-state` it saw, so tests can ask "what is my role"
// or "whose turn is it" without re-parsing the message stream.
//
// See also: `tests/full_pipeline.rs` for the scenarios.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use serde_json::Value;
use tabletop_protocol::message::{ServerMessage, Setup};
use tabletop_protocol::types::{GameName, MessageKind};
use tabletop_server::client::NetClient;

/// Default timeout for blocking waits.
const POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Granularity of each blocking receive.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A test player wrapping a real NetClient.
pub struct TestPlayer {
    pub name: String,
    client: NetClient,
    /// Every message received so far, in order.
    pub log: Vec<ServerMessage>,
    setup: Option<Setup>,
    state: Option<Value>,
}

impl TestPlayer {
    /// Connect to a server and complete the `hello` handshake.
    pub fn connect(addr: SocketAddr, name: &str, game: GameName) -> Self {
        let client = NetClient::connect(addr, name, game).expect("TestPlayer::connect failed");
        Self {
            name: name.into(),
            client,
            log: Vec::new(),
            setup: None,
            state: None,
        }
    }

    pub fn random_room(&mut self) {
        self.client.random_room().expect("random_room failed");
    }

    pub fn create_room(&mut self, room: &str) {
        self.client.create_room(room).expect("create_room failed");
    }

    pub fn join_room(&mut self, room: &str) {
        self.client.join_room(room).expect("join_room failed");
    }

    pub fn click_tile(&mut self, id: i32) {
        let role = self.role();
        self.client
            .click_tile(id, Some(&role))
            .expect("click_tile failed");
    }

    pub fn move_piece(&mut self, from: (i32, i32), to: (i32, i32)) {
        self.client.move_piece(from, to).expect("move_piece failed");
    }

    pub fn message(&mut self, kind: MessageKind) {
        self.client.message(kind).expect("message failed");
    }

    /// Send `goodbye`.
    pub fn disconnect(&mut self) {
        self.client.disconnect();
    }

    fn record(&mut self, msg: ServerMessage) {
        match &msg {
            ServerMessage::Setup(setup) => self.setup = Some(setup.clone()),
            ServerMessage::GameState(state) => self.state = Some(state.clone()),
            _ => {}
        }
        self.log.push(msg);
    }

    /// Block until a message matching `pred` arrives; everything before it
    /// is recorded and skipped.
    pub fn wait_for(&mut self, what: &str, pred: impl Fn(&ServerMessage) -> bool) -> ServerMessage {
        let start = Instant::now();
        loop {
            assert!(
                start.elapsed() < POLL_TIMEOUT,
                "{}: timed out waiting for {what}",
                self.name
            );
            if let Some(msg) = self.client.recv_timeout(POLL_INTERVAL) {
                let matched = pred(&msg);
                self.record(msg.clone());
                if matched {
                    return msg;
                }
            }
        }
    }

    /// Block until an event with the given wire name arrives.
    pub fn wait_for_event(&mut self, event: &str) -> ServerMessage {
        self.wait_for(event, |msg| msg.event() == event)
    }

    /// Block until a `game-state` satisfying `pred` arrives; returns it.
    pub fn wait_for_state(&mut self, what: &str, pred: impl Fn(&Value) -> bool) -> Value {
        match self.wait_for(what, |msg| matches!(msg, ServerMessage::GameState(s) if pred(s))) {
            ServerMessage::GameState(state) => state,
            other => panic!("{}: expected game-state, got {other:?}", self.name),
        }
    }

    /// Block until a `setup` arrives; returns it.
    pub fn wait_for_setup(&mut self) -> Setup {
        match self.wait_for_event("setup") {
            ServerMessage::Setup(setup) => setup,
            other => panic!("{}: expected setup, got {other:?}", self.name),
        }
    }

    /// Collect whatever arrives within `window` without waiting for
    /// anything in particular.
    pub fn drain_for(&mut self, window: Duration) -> Vec<ServerMessage> {
        let start = Instant::now();
        let mut seen = Vec::new();
        while start.elapsed() < window {
            if let Some(msg) = self.client.recv_timeout(POLL_INTERVAL) {
                self.record(msg.clone());
                seen.push(msg);
            }
        }
        seen
    }

    /// Role token from the latest `setup`.
    pub fn role(&self) -> String {
        self.setup
            .as_ref()
            .map(|s| s.role.clone())
            .unwrap_or_else(|| panic!("{}: no setup received yet", self.name))
    }

    /// Latest `game-state` snapshot.
    pub fn state(&self) -> &Value {
        self.state
            .as_ref()
            .unwrap_or_else(|| panic!("{}: no game-state received yet", self.name))
    }

    /// True when the latest snapshot says it is this player's move.
    pub fn has_turn(&self) -> bool {
        self.state()["currentPlayer"] == self.role().as_str()
    }
}
