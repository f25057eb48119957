//! Ingress server: accepts one external injector at a time, decodes
//! `ClientMessage` frames, and dispatches key events into a host-supplied
//! callback.

use std::io::{self, ErrorKind};
use std::os::unix::net::{UnixListener, UnixStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::config::IngressConfig;
use crate::error::RecvError;
use crate::framing::frame_recv;
use crate::message::{ClientMessage, KeyAddress, KeyAction, KeyEvent};
use crate::socket_util::{bind_unix_listener, lower_thread_priority};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Callback signature the host registers via [`IngressServer::configure`].
pub type ScanCallback = dyn Fn(u32, u32, u32, bool) + Send + Sync + 'static;

struct SharedState {
    enabled: bool,
    callback: Option<Arc<ScanCallback>>,
}

/// A running ingress server. Owns the listening socket's reader thread for
/// the lifetime of the process; there is no shutdown API because the
/// original design has none (see DESIGN.md).
pub struct IngressServer {
    config: IngressConfig,
    state: Arc<Mutex<SharedState>>,
    _reader: thread::JoinHandle<()>,
}

impl IngressServer {
    /// Bind the listening socket and spawn the reader thread. Any syscall
    /// failure here is fatal for this instance.
    pub fn start(config: IngressConfig) -> io::Result<Self> {
        let listener = bind_unix_listener(&config.socket_path)?;

        let state = Arc::new(Mutex::new(SharedState {
            enabled: false,
            callback: None,
        }));

        let reader_state = Arc::clone(&state);
        let reader_config = config.clone();
        let reader = thread::Builder::new()
            .name(format!("zmk-ingress-{}", reader_config.source))
            .spawn(move || reader_loop(listener, reader_config, reader_state))
            .map_err(io::Error::other)?;

        Ok(Self {
            config,
            state,
            _reader: reader,
        })
    }

    /// Register the callback invoked per decoded, enabled key event.
    ///
    /// Rust's type system makes a null callback unrepresentable, so unlike
    /// the C-originated design this never fails.
    pub fn configure(&self, callback: impl Fn(u32, u32, u32, bool) + Send + Sync + 'static) {
        let mut state = self.state.lock().expect("ingress state mutex poisoned");
        state.callback = Some(Arc::new(callback));
    }

    /// Gate dispatch on; resumes delivery starting with the next decoded frame.
    pub fn enable(&self) {
        self.state.lock().expect("ingress state mutex poisoned").enabled = true;
    }

    /// Gate dispatch off; decoded frames are discarded until re-enabled.
    pub fn disable(&self) {
        self.state.lock().expect("ingress state mutex poisoned").enabled = false;
    }

    pub fn config(&self) -> &IngressConfig {
        &self.config
    }
}

fn reader_loop(listener: UnixListener, config: IngressConfig, state: Arc<Mutex<SharedState>>) {
    lower_thread_priority();

    loop {
        match listener.accept() {
            Ok((stream, _addr)) => serve_peer(stream, &config, &state),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                log::error!("[ingress] accept error: {e}");
                thread::sleep(ACCEPT_BACKOFF);
            }
        }
    }
}

/// `SERVING` state: decode frames from one peer until it disconnects or
/// sends something unrecoverable.
fn serve_peer(mut stream: UnixStream, config: &IngressConfig, state: &Arc<Mutex<SharedState>>) {
    log::info!("[ingress] peer connected on {:?}", config.socket_path);

    loop {
        match frame_recv::<ClientMessage>(&mut stream, crate::message::MAX_CLIENT_MESSAGE_SIZE) {
            Ok(msg) => dispatch(msg, config, state),
            Err(RecvError::Decode(e)) => {
                log::warn!("[ingress] dropping undecodable frame: {e}");
                // A single corrupt message does not invalidate the stream —
                // length-prefixed framing gives us unambiguous resync.
            }
            Err(RecvError::PeerClosed) => {
                log::info!("[ingress] peer disconnected");
                return;
            }
            Err(RecvError::TooLarge) => {
                log::error!("[ingress] oversized frame, disconnecting peer");
                return;
            }
            Err(RecvError::Io(e)) => {
                log::error!("[ingress] read error, disconnecting peer: {e}");
                return;
            }
        }
    }
}

fn dispatch(msg: ClientMessage, config: &IngressConfig, state: &Arc<Mutex<SharedState>>) {
    let ClientMessage::KeyEvent(KeyEvent { action, address }) = msg;

    let (row, col) = match address {
        KeyAddress::KeyPos(pos) => (pos.row, pos.col),
        KeyAddress::Position(p) => {
            if config.columns == 0 {
                log::error!("[ingress] Position({p}) with columns=0, dropping event");
                return;
            }
            (p / config.columns, p % config.columns)
        }
    };

    let pressed = matches!(action, KeyAction::Press);

    let state = state.lock().expect("ingress state mutex poisoned");
    if !state.enabled {
        return;
    }
    if let Some(callback) = &state.callback {
        callback(config.source, row, col, pressed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::{encode_message, frame_send};
    use crate::message::KeyPosition;
    use std::sync::mpsc;
    use tempfile::TempDir;

    fn start_server(rows: u32, columns: u32) -> (IngressServer, TempDir) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ingress.sock");
        let server = IngressServer::start(IngressConfig::new(path, rows, columns, 0)).unwrap();
        (server, tmp)
    }

    fn send_client_message(socket_path: &std::path::Path, msg: &ClientMessage) -> UnixStream {
        let stream = UnixStream::connect(socket_path).unwrap();
        let mut buf = [0u8; 64];
        let len = encode_message(msg, &mut buf).unwrap();
        frame_send(&stream, &buf[..len]).unwrap();
        stream
    }

    #[test]
    fn explicit_key_pos_is_delivered_verbatim() {
        let (server, _tmp) = start_server(4, 12);
        server.enable();

        let (tx, rx) = mpsc::channel();
        server.configure(move |source, row, col, pressed| {
            tx.send((source, row, col, pressed)).unwrap();
        });

        let _peer = send_client_message(
            &server.config().socket_path,
            &ClientMessage::KeyEvent(KeyEvent {
                action: KeyAction::Press,
                address: KeyAddress::KeyPos(KeyPosition { row: 1, col: 3 }),
            }),
        );

        let (_source, row, col, pressed) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!((row, col, pressed), (1, 3, true));
    }

    #[test]
    fn linear_position_is_expanded_using_configured_columns() {
        let (server, _tmp) = start_server(4, 12);
        server.enable();

        let (tx, rx) = mpsc::channel();
        server.configure(move |_source, row, col, pressed| {
            tx.send((row, col, pressed)).unwrap();
        });

        let _peer = send_client_message(
            &server.config().socket_path,
            &ClientMessage::KeyEvent(KeyEvent {
                action: KeyAction::Release,
                address: KeyAddress::Position(25),
            }),
        );

        let (row, col, pressed) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!((row, col, pressed), (2, 1, false));
    }

    #[test]
    fn zero_columns_with_linear_position_drops_the_event() {
        let (server, _tmp) = start_server(4, 0);
        server.enable();

        let (tx, rx) = mpsc::channel::<()>();
        server.configure(move |_, _, _, _| {
            tx.send(()).unwrap();
        });

        let _peer = send_client_message(
            &server.config().socket_path,
            &ClientMessage::KeyEvent(KeyEvent {
                action: KeyAction::Press,
                address: KeyAddress::Position(5),
            }),
        );

        assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());
    }

    #[test]
    fn disabled_server_does_not_dispatch_until_enabled() {
        let (server, _tmp) = start_server(4, 12);
        // Left disabled on purpose.

        let (tx, rx) = mpsc::channel();
        server.configure(move |_, row, col, pressed| {
            tx.send((row, col, pressed)).unwrap();
        });

        let peer = send_client_message(
            &server.config().socket_path,
            &ClientMessage::KeyEvent(KeyEvent {
                action: KeyAction::Press,
                address: KeyAddress::KeyPos(KeyPosition { row: 0, col: 0 }),
            }),
        );
        assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());

        server.enable();
        let mut buf = [0u8; 64];
        let second = ClientMessage::KeyEvent(KeyEvent {
            action: KeyAction::Press,
            address: KeyAddress::KeyPos(KeyPosition { row: 2, col: 2 }),
        });
        let len = encode_message(&second, &mut buf).unwrap();
        frame_send(&peer, &buf[..len]).unwrap();

        let (row, col, pressed) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!((row, col, pressed), (2, 2, true));
    }

    #[test]
    fn corrupt_frame_is_logged_and_does_not_close_the_connection() {
        let (server, _tmp) = start_server(4, 12);
        server.enable();

        let (tx, rx) = mpsc::channel();
        server.configure(move |_, row, col, pressed| {
            tx.send((row, col, pressed)).unwrap();
        });

        let peer = UnixStream::connect(&server.config().socket_path).unwrap();

        let first = ClientMessage::KeyEvent(KeyEvent {
            action: KeyAction::Press,
            address: KeyAddress::KeyPos(KeyPosition { row: 1, col: 1 }),
        });
        let mut buf = [0u8; 64];
        let len = encode_message(&first, &mut buf).unwrap();
        frame_send(&peer, &buf[..len]).unwrap();
        rx.recv_timeout(Duration::from_secs(2)).unwrap();

        // A length prefix followed by undecodable garbage of that length.
        frame_send(&peer, &[0xff; 10]).unwrap();

        let third = ClientMessage::KeyEvent(KeyEvent {
            action: KeyAction::Release,
            address: KeyAddress::KeyPos(KeyPosition { row: 3, col: 3 }),
        });
        let len = encode_message(&third, &mut buf).unwrap();
        frame_send(&peer, &buf[..len]).unwrap();

        let (row, col, pressed) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!((row, col, pressed), (3, 3, false));
    }

    #[test]
    fn oversize_frame_disconnects_peer_but_server_keeps_accepting() {
        let (server, _tmp) = start_server(4, 12);
        server.enable();
        server.configure(|_, _, _, _| {});

        let peer = UnixStream::connect(&server.config().socket_path).unwrap();
        let bogus_len = crate::message::MAX_CLIENT_MESSAGE_SIZE + 1;
        std::io::Write::write_all(
            &mut { peer.try_clone().unwrap() },
            &bogus_len.to_be_bytes(),
        )
        .unwrap();

        // Give the reader time to process the disconnect, then prove a new
        // peer can still connect and be served.
        std::thread::sleep(Duration::from_millis(200));
        drop(peer);

        let (tx, rx) = mpsc::channel();
        server.configure(move |_, row, col, pressed| {
            tx.send((row, col, pressed)).unwrap();
        });
        let _peer2 = send_client_message(
            &server.config().socket_path,
            &ClientMessage::KeyEvent(KeyEvent {
                action: KeyAction::Press,
                address: KeyAddress::KeyPos(KeyPosition { row: 0, col: 0 }),
            }),
        );
        let (row, col, pressed) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!((row, col, pressed), (0, 0, true));
    }
}
