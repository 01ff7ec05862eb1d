// TCP client for the tabletop server.
//
// Architecture:
// - `connect()` performs TCP connect + `hello` handshake on the calling
//   thread and waits for `app-setup`, then spawns a background reader
//   thread.
// - The reader thread reads framed `ServerMessage`s in a loop and pushes
//   them into an `mpsc` channel.
// - The caller holds a `BufWriter<TcpStream>` for sending; writes are small
//   and flushed synchronously.
// - `poll()` drains the inbox without blocking; `recv_timeout()` waits for
//   the next message.
//
// Used by the integration tests and usable by any headless client (bots,
// load tools).

use std::io::{self, BufReader, BufWriter};
use std::net::{SocketAddr, TcpStream};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tabletop_protocol::framing::{recv_json, send_json};
use tabletop_protocol::message::{ClientMessage, Hello, PieceMove, ServerMessage, TileClick};
use tabletop_protocol::types::{GameName, MessageKind, RowCol};
use thiserror::Error;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connect failed: {0}")]
    Connect(#[source] io::Error),
    #[error("handshake failed: {0}")]
    Handshake(#[source] io::Error),
    #[error("unexpected handshake reply: {0:?}")]
    UnexpectedReply(Box<ServerMessage>),
    #[error("send failed: {0}")]
    Send(#[source] io::Error),
}

/// TCP client for one player connection.
pub struct NetClient {
    writer: BufWriter<TcpStream>,
    inbox: Receiver<ServerMessage>,
    _reader_thread: Option<JoinHandle<()>>,
    game: GameName,
}

impl NetClient {
    /// Connect, send `hello`, and wait for `app-setup`.
    pub fn connect(addr: SocketAddr, user_name: &str, game: GameName) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).map_err(ClientError::Connect)?;
        stream
            .set_read_timeout(Some(HANDSHAKE_TIMEOUT))
            .map_err(ClientError::Handshake)?;
        let reader_stream = stream.try_clone().map_err(ClientError::Connect)?;
        let mut writer = BufWriter::new(stream);

        let hello = ClientMessage::Hello(Hello {
            user_name: user_name.into(),
            game,
        });
        send_json(&mut writer, &hello).map_err(ClientError::Handshake)?;

        let mut reader = BufReader::new(reader_stream);
        match recv_json::<_, ServerMessage>(&mut reader).map_err(ClientError::Handshake)? {
            ServerMessage::AppSetup(selected) if selected == game => {}
            other => return Err(ClientError::UnexpectedReply(Box::new(other))),
        }

        // Clear the read timeout for the long-lived reader loop.
        reader
            .get_ref()
            .set_read_timeout(None)
            .map_err(ClientError::Handshake)?;

        let (tx, rx) = mpsc::channel();
        let reader_thread = thread::spawn(move || reader_loop(reader, tx));

        Ok(Self {
            writer,
            inbox: rx,
            _reader_thread: Some(reader_thread),
            game,
        })
    }

    pub fn game(&self) -> GameName {
        self.game
    }

    pub fn send(&mut self, msg: &ClientMessage) -> Result<(), ClientError> {
        send_json(&mut self.writer, msg).map_err(ClientError::Send)
    }

    pub fn random_room(&mut self) -> Result<(), ClientError> {
        self.send(&ClientMessage::RandomRoom)
    }

    pub fn create_room(&mut self, name: &str) -> Result<(), ClientError> {
        self.send(&ClientMessage::CreateRoom(name.into()))
    }

    pub fn join_room(&mut self, name: &str) -> Result<(), ClientError> {
        self.send(&ClientMessage::JoinRoom(name.into()))
    }

    /// TicTacToe move.
    pub fn click_tile(&mut self, id: i32, player: Option<&str>) -> Result<(), ClientError> {
        self.send(&ClientMessage::TileClicked(TileClick {
            id,
            player: player.map(str::to_owned),
        }))
    }

    /// Checkers move, as `(row, col)` pairs.
    pub fn move_piece(&mut self, from: (i32, i32), to: (i32, i32)) -> Result<(), ClientError> {
        self.send(&ClientMessage::PieceMoved(PieceMove {
            move_from: RowCol {
                row: from.0,
                col: from.1,
            },
            move_to: RowCol { row: to.0, col: to.1 },
        }))
    }

    pub fn message(&mut self, kind: MessageKind) -> Result<(), ClientError> {
        self.send(&ClientMessage::Message(kind))
    }

    /// Send `goodbye`. The server treats it as a disconnect.
    pub fn disconnect(&mut self) {
        let _ = self.send(&ClientMessage::Goodbye);
    }

    /// Drain all queued server messages (non-blocking).
    pub fn poll(&self) -> Vec<ServerMessage> {
        self.inbox.try_iter().collect()
    }

    /// Wait up to `timeout` for the next server message.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ServerMessage> {
        self.inbox.recv_timeout(timeout).ok()
    }
}

/// Reader thread: read framed messages in a loop, push to channel.
fn reader_loop(mut reader: BufReader<TcpStream>, tx: mpsc::Sender<ServerMessage>) {
    while let Ok(msg) = recv_json::<_, ServerMessage>(&mut reader) {
        if tx.send(msg).is_err() {
            break;
        }
    }
}
