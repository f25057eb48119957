//! Egress broadcaster: fans out `ZmkEvent` frames to every connected
//! observer over a bounded client table.

use std::io::ErrorKind;
use std::os::unix::net::{UnixListener, UnixStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::adapters::{consumer_report, keyboard_report, kscan_event};
use crate::config::EgressConfig;
use crate::error::SendError;
use crate::framing::{encode_message, frame_send};
use crate::message::{Endpoint, ZmkEvent, MAX_ZMK_EVENT_SIZE};
use crate::socket_util::{bind_unix_listener, lower_thread_priority};

#[cfg(feature = "pointing")]
use crate::adapters::mouse_report;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Fixed-capacity client table. `None` marks a free slot, reused by the
/// next accepted connection.
struct ClientTable {
    slots: Vec<Option<UnixStream>>,
}

impl ClientTable {
    fn new(max_clients: usize) -> Self {
        let mut slots = Vec::with_capacity(max_clients);
        slots.resize_with(max_clients, || None);
        Self { slots }
    }

    fn insert(&mut self, stream: UnixStream) -> Option<usize> {
        let slot = self.slots.iter().position(Option::is_none)?;
        self.slots[slot] = Some(stream);
        Some(slot)
    }

    fn connected_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

/// A running egress broadcaster. Owns the listening socket's accept thread
/// for the lifetime of the process.
pub struct EgressBroadcaster {
    config: EgressConfig,
    clients: Arc<Mutex<ClientTable>>,
    _acceptor: thread::JoinHandle<()>,
}

impl EgressBroadcaster {
    /// Bind the listening socket and spawn the accept thread.
    pub fn start(config: EgressConfig) -> std::io::Result<Self> {
        let listener = bind_unix_listener(&config.socket_path)?;
        let clients = Arc::new(Mutex::new(ClientTable::new(config.max_clients)));

        let acceptor_clients = Arc::clone(&clients);
        let acceptor = thread::Builder::new()
            .name("zmk-egress-accept".into())
            .spawn(move || accept_loop(listener, acceptor_clients))
            .map_err(std::io::Error::other)?;

        Ok(Self {
            config,
            clients,
            _acceptor: acceptor,
        })
    }

    pub fn config(&self) -> &EgressConfig {
        &self.config
    }

    /// Number of currently connected observers.
    pub fn connected_count(&self) -> usize {
        self.clients
            .lock()
            .expect("egress client table mutex poisoned")
            .connected_count()
    }

    /// Encode `event` once and attempt to deliver it to every connected
    /// client. A client whose send fails (backpressure, disconnect, short
    /// write) is evicted from the table; the others still receive the
    /// frame this call.
    pub fn broadcast(&self, event: &ZmkEvent) {
        let mut buf = [0u8; MAX_ZMK_EVENT_SIZE as usize];
        let len = match encode_message(event, &mut buf) {
            Ok(len) => len,
            Err(e) => {
                log::error!("[egress] failed to encode event, dropping broadcast: {e}");
                return;
            }
        };
        let payload = &buf[..len];

        let mut clients = self.clients.lock().expect("egress client table mutex poisoned");
        for slot in clients.slots.iter_mut() {
            let Some(stream) = slot else { continue };
            if let Err(e) = frame_send(stream, payload) {
                match e {
                    SendError::WouldBlock => {
                        log::warn!("[egress] client backpressured, evicting");
                    }
                    SendError::Truncated | SendError::Io(_) => {
                        log::info!("[egress] client disconnected: {e}");
                    }
                }
                *slot = None;
            }
        }
    }

    /// Broadcast a raw key-scan transition.
    pub fn notify_kscan(&self, source: u32, position: u32, pressed: bool, timestamp: u32) {
        self.broadcast(&ZmkEvent::Kscan(kscan_event(source, position, pressed, timestamp)));
    }

    /// Broadcast a keyboard HID report.
    pub fn notify_keyboard(&self, endpoint: Endpoint, modifiers: u8, keys: &[u8]) {
        self.broadcast(&ZmkEvent::Keyboard(keyboard_report(endpoint, modifiers, keys)));
    }

    /// Broadcast a consumer-control HID report.
    pub fn notify_consumer(&self, endpoint: Endpoint, keys: &[u8]) {
        self.broadcast(&ZmkEvent::Consumer(consumer_report(endpoint, keys)));
    }

    /// Broadcast a mouse/trackball HID report.
    #[cfg(feature = "pointing")]
    pub fn notify_mouse(
        &self,
        endpoint: Endpoint,
        buttons: u32,
        dx: i32,
        dy: i32,
        scroll_x: i32,
        scroll_y: i32,
    ) {
        self.broadcast(&ZmkEvent::Mouse(mouse_report(
            endpoint, buttons, dx, dy, scroll_x, scroll_y,
        )));
    }
}

fn accept_loop(listener: UnixListener, clients: Arc<Mutex<ClientTable>>) {
    lower_thread_priority();

    loop {
        match listener.accept() {
            Ok((stream, _addr)) => {
                let mut table = clients.lock().expect("egress client table mutex poisoned");
                match table.insert(stream) {
                    Some(_slot) => log::info!("[egress] observer connected"),
                    None => log::warn!("[egress] client table full, rejecting new observer"),
                }
                // `table.insert` returning `None` already dropped the
                // stream (it was moved in and never stored), which closes
                // the connection from our end.
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                log::error!("[egress] accept error: {e}");
                thread::sleep(ACCEPT_BACKOFF);
            }
        }
    }
}
