//! Standalone demo harness wiring an [`IngressServer`] and an
//! [`EgressBroadcaster`] against an in-memory key matrix.
//!
//! Stands in for "the host firmware": a real embedded build drives these
//! two servers from its own scan loop and keymap processing instead of a
//! CLI. Not part of the library surface.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use clap::Parser;
use mimalloc::MiMalloc;

use zmk_ipc_bridge::{
    Endpoint, EgressBroadcaster, EgressConfig, IngressConfig, IngressServer,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser, Debug)]
#[command(about = "Run the ZMK IPC bridge ingress/egress sockets standalone")]
struct Cli {
    /// Ingress socket path (receives externally-injected key events).
    #[arg(long, default_value = zmk_ipc_bridge::config::DEFAULT_INGRESS_SOCKET)]
    ingress_socket: std::path::PathBuf,

    /// Egress socket path (broadcasts key-scan/HID events to observers).
    #[arg(long, default_value = zmk_ipc_bridge::config::DEFAULT_EGRESS_SOCKET)]
    egress_socket: std::path::PathBuf,

    /// Key matrix row count.
    #[arg(long, default_value_t = 4)]
    rows: u32,

    /// Key matrix column count.
    #[arg(long, default_value_t = 12)]
    columns: u32,

    /// Maximum simultaneous egress observers.
    #[arg(long, default_value_t = 8)]
    max_clients: usize,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let egress = Arc::new(EgressBroadcaster::start(EgressConfig::new(
        cli.egress_socket.clone(),
        cli.max_clients,
    ))?);

    let timestamp = Arc::new(AtomicU32::new(0));
    let egress_for_ingress = Arc::clone(&egress);
    let ingress = IngressServer::start(IngressConfig::new(
        cli.ingress_socket.clone(),
        cli.rows,
        cli.columns,
        0,
    ))?;
    ingress.configure(move |source, row, col, pressed| {
        let position = row * cli.columns + col;
        let ts = timestamp.fetch_add(1, Ordering::Relaxed);
        egress_for_ingress.notify_kscan(source, position, pressed, ts);

        // No keymap in this demo: report the raw scan code as a
        // single-key boot-protocol keyboard report over USB.
        let endpoint = Endpoint {
            transport: zmk_ipc_bridge::TransportType::Usb,
            ble_profile_idx: 0,
        };
        let keys: &[u8] = if pressed { &[0x04] } else { &[] };
        egress_for_ingress.notify_keyboard(endpoint, 0, keys);
    });
    ingress.enable();

    log::info!(
        "ingress listening on {:?}, egress listening on {:?}",
        cli.ingress_socket,
        cli.egress_socket,
    );

    loop {
        std::thread::sleep(std::time::Duration::from_secs(60));
        log::debug!("egress observers connected: {}", egress.connected_count());
    }
}
