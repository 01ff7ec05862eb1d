// Smoke tests for the server binary's library surface: handshake, framing
// and payload errors, and disconnect handling over real TCP sockets.

use std::io::{BufReader, BufWriter, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::{Duration, Instant};

use tabletop_protocol::framing::{MAX_MESSAGE_SIZE, recv_json, send_json, write_message};
use tabletop_protocol::message::{ClientMessage, Hello, ServerMessage};
use tabletop_protocol::types::GameName;
use tabletop_server::client::NetClient;
use tabletop_server::server::{ServerConfig, ServerHandle, start_server};

const WAIT: Duration = Duration::from_secs(5);

fn start() -> (ServerHandle, SocketAddr) {
    start_server(ServerConfig {
        port: 0,
        poll_interval: Duration::from_millis(10),
        ..ServerConfig::default()
    })
    .unwrap()
}

/// Wait for the next message with the given event name, skipping others.
fn expect_event(client: &NetClient, event: &str) -> ServerMessage {
    loop {
        let msg = client
            .recv_timeout(WAIT)
            .unwrap_or_else(|| panic!("timed out waiting for {event}"));
        if msg.event() == event {
            return msg;
        }
    }
}

/// A raw socket that has done the handshake, for sending hand-made frames.
struct RawPlayer {
    writer: BufWriter<TcpStream>,
    _reader: BufReader<TcpStream>,
}

fn raw_player(addr: SocketAddr, game: GameName) -> RawPlayer {
    let stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(WAIT)).unwrap();
    let mut writer = BufWriter::new(stream.try_clone().unwrap());
    let mut reader = BufReader::new(stream);
    let hello = ClientMessage::Hello(Hello {
        user_name: "raw".into(),
        game,
    });
    send_json(&mut writer, &hello).unwrap();
    let reply: ServerMessage = recv_json(&mut reader).unwrap();
    assert_eq!(reply, ServerMessage::AppSetup(game));
    RawPlayer {
        writer,
        _reader: reader,
    }
}

/// Seat a raw player against `a`, which must already be waiting.
fn seat_against(a: &NetClient, addr: SocketAddr, game: GameName) -> RawPlayer {
    let mut raw = raw_player(addr, game);
    send_json(&mut raw.writer, &ClientMessage::RandomRoom).unwrap();
    expect_event(a, "start-game");
    raw
}

#[test]
fn client_handshake_for_each_game() {
    let (handle, addr) = start();
    for game in [GameName::TicTacToe, GameName::Checkers] {
        let client = NetClient::connect(addr, "ada", game).unwrap();
        assert_eq!(client.game(), game);
    }
    handle.stop();
}

#[test]
fn random_pair_starts_game() {
    let (handle, addr) = start();
    let mut a = NetClient::connect(addr, "ada", GameName::TicTacToe).unwrap();
    let mut b = NetClient::connect(addr, "bea", GameName::TicTacToe).unwrap();
    a.random_room().unwrap();
    expect_event(&a, "setup");
    b.random_room().unwrap();

    expect_event(&a, "start-game");
    let setup = match expect_event(&b, "setup") {
        ServerMessage::Setup(setup) => setup,
        other => panic!("expected setup, got {other:?}"),
    };
    assert_eq!(setup.role, "X");
    assert!(!setup.waiting_for_opponent);
    expect_event(&b, "start-game");
    handle.stop();
}

/// An oversized length prefix from a seated player breaks framing and
/// counts as a disconnect, so the opponent is put back into matchmaking.
#[test]
fn broken_frame_disconnects_player() {
    let (handle, addr) = start();
    let mut a = NetClient::connect(addr, "ada", GameName::Checkers).unwrap();
    a.random_room().unwrap();
    expect_event(&a, "setup");
    let mut raw = seat_against(&a, addr, GameName::Checkers);

    raw.writer.write_all(&(MAX_MESSAGE_SIZE + 1).to_be_bytes()).unwrap();
    raw.writer.flush().unwrap();
    let requeued = match expect_event(&a, "setup") {
        ServerMessage::Setup(setup) => setup,
        other => panic!("expected setup, got {other:?}"),
    };
    assert!(requeued.waiting_for_opponent);
    handle.stop();
}

/// Payloads that parse as a frame but not as a message are skipped. The
/// sender keeps its seat and its later moves still count.
#[test]
fn undecodable_payloads_keep_player_seated() {
    let (handle, addr) = start();
    let mut a = NetClient::connect(addr, "ada", GameName::TicTacToe).unwrap();
    a.random_room().unwrap();
    expect_event(&a, "setup");
    let mut raw = seat_against(&a, addr, GameName::TicTacToe);

    for frame in [
        r#"{"event":"tile-clicked","data":{"id":300}}"#,
        r#"{"event":"tile-clicked","data":{"id":-1}}"#,
        r#"{"event":"message","data":"resume-match"}"#,
        "{ not json",
    ] {
        write_message(&mut raw.writer, frame.as_bytes()).unwrap();
    }

    // No requeue: the opponent never sees a fresh setup.
    let deadline = Instant::now() + Duration::from_millis(300);
    while let Some(left) = deadline.checked_duration_since(Instant::now()) {
        if let Some(msg) = a.recv_timeout(left) {
            assert_ne!(msg.event(), "setup", "opponent was requeued: {msg:?}");
        }
    }

    // The room is still live: whichever seat has the turn fills tile 5.
    write_message(&mut raw.writer, br#"{"event":"tile-clicked","data":{"id":5}}"#).unwrap();
    a.click_tile(5, None).unwrap();
    loop {
        let ServerMessage::GameState(state) = expect_event(&a, "game-state") else {
            panic!("expected game-state");
        };
        if !state["tiles"]["5"].is_null() {
            break;
        }
    }
    handle.stop();
}

/// A connection that never sends `hello` does not hold up anyone else.
#[test]
fn silent_connection_does_not_stall_pairing() {
    let (handle, addr) = start();
    let _silent = TcpStream::connect(addr).unwrap();
    // Let the listener accept it before the real players arrive.
    std::thread::sleep(Duration::from_millis(50));

    let started = Instant::now();
    let mut a = NetClient::connect(addr, "ada", GameName::TicTacToe).unwrap();
    let mut b = NetClient::connect(addr, "bea", GameName::TicTacToe).unwrap();
    a.random_room().unwrap();
    b.random_room().unwrap();
    expect_event(&a, "start-game");
    expect_event(&b, "start-game");
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "pairing took {:?}",
        started.elapsed()
    );
    handle.stop();
}

#[test]
fn stopped_server_refuses_handshake() {
    let (handle, addr) = start();
    handle.stop();
    assert!(NetClient::connect(addr, "late", GameName::TicTacToe).is_err());
}
