// TCP server and main event loop.
//
// Architecture: thread-per-reader with a central `mpsc` channel.
//
// - **Listener thread** (`TcpListener::accept()` loop): accepts new TCP
//   connections and hands each to a short-lived handshake thread.
// - **Handshake threads** (one per pending connection): wait up to
//   `HANDSHAKE_TIMEOUT` for `hello`, then send `InternalEvent::Registered`
//   with the split stream. A slow or silent peer only stalls its own thread.
// - **Reader threads** (one per client): read framed `ClientMessage`s in a
//   loop and send `InternalEvent::MessageFrom` to the main thread. A frame
//   whose payload does not decode is logged and skipped. On `goodbye`, EOF,
//   an I/O error, or a broken frame they send `InternalEvent::Disconnected`
//   and exit.
// - **Main thread**: owns the `Hub` (and through it both lobbies), receives
//   events from the channel, and handles each one to completion before the
//   next. This is the single-writer discipline for every room and for the
//   matchmaking pools. `recv_timeout` with `poll_interval` bounds how long
//   a stop request can go unnoticed.
//
// The main thread is the only writer to client streams (through the hub's
// `Outbox`). Reader threads only read.
//
// Shutdown: `ServerHandle::stop` clears the `keep_running` flag; the main
// loop and the listener thread check it and exit.

use std::io::{self, BufReader, BufWriter};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use tabletop_core::types::ConnectionId;
use tabletop_protocol::framing::{read_message, recv_json};
use tabletop_protocol::message::{ClientMessage, Hello};
use tracing::{debug, info, warn};

use crate::hub::Hub;

/// How long a new connection has to send its `hello`.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Events sent from listener/reader threads to the main thread.
enum InternalEvent {
    Registered {
        hello: Hello,
        reader: BufReader<TcpStream>,
        writer: BufWriter<TcpStream>,
    },
    MessageFrom { id: ConnectionId, message: ClientMessage },
    Disconnected { id: ConnectionId },
}

/// Handle returned by `start_server` to control the running server.
pub struct ServerHandle {
    keep_running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ServerHandle {
    /// Signal the server to stop and wait for it to shut down.
    pub fn stop(mut self) {
        self.keep_running.store(false, Ordering::SeqCst);
        self.join();
    }

    /// Block until the server thread exits.
    pub fn wait(mut self) {
        self.join();
    }

    fn join(&mut self) {
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                warn!("server thread panicked");
            }
        }
    }
}

/// Configuration for starting a server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: IpAddr,
    /// 0 lets the OS pick a free port.
    pub port: u16,
    /// Upper bound on how long a stop request waits to be noticed.
    pub poll_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 5000,
            poll_interval: Duration::from_millis(50),
        }
    }
}

/// Start the server on a background thread. Returns a handle for stopping
/// it and the actual bound address (useful when port 0 is used).
pub fn start_server(config: ServerConfig) -> io::Result<(ServerHandle, SocketAddr)> {
    let listener = TcpListener::bind((config.bind, config.port))?;
    let addr = listener.local_addr()?;
    let keep_running = Arc::new(AtomicBool::new(true));
    let keep_running_clone = keep_running.clone();

    let thread = thread::spawn(move || {
        run_server(listener, config, keep_running_clone);
    });

    Ok((
        ServerHandle {
            keep_running,
            thread: Some(thread),
        },
        addr,
    ))
}

/// Main server loop. Runs until `keep_running` is set to false.
fn run_server(listener: TcpListener, config: ServerConfig, keep_running: Arc<AtomicBool>) {
    let mut hub: Hub<BufWriter<TcpStream>> = Hub::new();
    let (tx, rx): (Sender<InternalEvent>, Receiver<InternalEvent>) = mpsc::channel();

    // Non-blocking so the accept thread can check keep_running periodically.
    if let Err(e) = listener.set_nonblocking(true) {
        warn!(error = %e, "could not make listener non-blocking");
    }

    let keep_running_listener = keep_running.clone();
    let tx_listener = tx.clone();
    let accept_backoff = config.poll_interval;
    thread::spawn(move || {
        while keep_running_listener.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, peer)) => {
                    debug!(%peer, "accepted connection");
                    stream.set_nonblocking(false).ok();
                    let tx_handshake = tx_listener.clone();
                    thread::spawn(move || match handshake(stream) {
                        Ok(Some(event)) => {
                            let _ = tx_handshake.send(event);
                        }
                        Ok(None) => {}
                        Err(e) => debug!(%peer, error = %e, "handshake failed"),
                    });
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(accept_backoff);
                }
                Err(e) => {
                    warn!(error = %e, "listener failed");
                    break;
                }
            }
        }
    });

    info!("server loop running");
    while keep_running.load(Ordering::SeqCst) {
        match rx.recv_timeout(config.poll_interval) {
            Ok(event) => {
                handle_event(&mut hub, event, &tx, &keep_running);
                while let Ok(event) = rx.try_recv() {
                    handle_event(&mut hub, event, &tx, &keep_running);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    info!("server loop stopped");
}

fn handle_event(
    hub: &mut Hub<BufWriter<TcpStream>>,
    event: InternalEvent,
    tx: &Sender<InternalEvent>,
    keep_running: &Arc<AtomicBool>,
) {
    match event {
        InternalEvent::Registered { hello, reader, writer } => {
            let id = hub.register(hello, writer);
            let tx_reader = tx.clone();
            let keep_running_reader = keep_running.clone();
            thread::spawn(move || {
                reader_loop(reader, id, tx_reader, keep_running_reader);
            });
        }
        InternalEvent::MessageFrom { id, message } => hub.handle_message(id, message),
        InternalEvent::Disconnected { id } => hub.disconnect(id),
    }
}

/// Read the `hello` handshake off the main thread. `None` means the peer
/// sent something else first; the connection is dropped.
fn handshake(stream: TcpStream) -> io::Result<Option<InternalEvent>> {
    stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT))?;
    let mut reader = BufReader::new(stream.try_clone()?);

    let hello = match recv_json::<_, ClientMessage>(&mut reader)? {
        ClientMessage::Hello(hello) => hello,
        other => {
            warn!(message = ?other, "expected hello; dropping connection");
            return Ok(None);
        }
    };

    let writer = BufWriter::new(stream.try_clone()?);
    stream.set_read_timeout(None)?;
    Ok(Some(InternalEvent::Registered { hello, reader, writer }))
}

/// Reader loop for a single client. Runs in its own thread.
fn reader_loop(
    mut reader: BufReader<TcpStream>,
    id: ConnectionId,
    tx: Sender<InternalEvent>,
    keep_running: Arc<AtomicBool>,
) {
    while keep_running.load(Ordering::SeqCst) {
        // Framing errors leave the stream out of sync; payload errors do not.
        let bytes = match read_message(&mut reader) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                warn!(connection = %id, error = %e, "broken frame; disconnecting");
                break;
            }
            Err(e) => {
                debug!(connection = %id, error = %e, "read ended");
                break;
            }
        };
        match serde_json::from_slice::<ClientMessage>(&bytes) {
            Ok(ClientMessage::Goodbye) => break,
            Ok(message) => {
                if tx.send(InternalEvent::MessageFrom { id, message }).is_err() {
                    return;
                }
            }
            Err(e) => warn!(connection = %id, error = %e, "undecodable message ignored"),
        }
    }
    let _ = tx.send(InternalEvent::Disconnected { id });
}
