//! Per-instance configuration.
//!
//! The core takes no CLI arguments and reads no environment variables —
//! configuration arrives as plain constructor structs. A host embeds these
//! values from whatever configuration plumbing it already has (the real
//! analogue is devicetree/Kconfig; out of scope here).

use std::path::PathBuf;

/// Conventional default ingress socket path.
pub const DEFAULT_INGRESS_SOCKET: &str = "/tmp/zmk_kscan_ipc.sock";

/// Conventional default egress socket path.
pub const DEFAULT_EGRESS_SOCKET: &str = "/tmp/zmk_ipc.sock";

/// Static configuration for one [`crate::ingress::IngressServer`] instance.
#[derive(Debug, Clone)]
pub struct IngressConfig {
    /// Filesystem path of the listening Unix socket.
    pub socket_path: PathBuf,
    /// Key matrix row count, used only for bounds the host applies itself.
    pub rows: u32,
    /// Key matrix column count. Required to expand a `Position` address;
    /// zero is valid configuration but makes `Position` addressing an error.
    pub columns: u32,
    /// Source id reported to the registered callback, distinguishing this
    /// instance from any other co-existing `IngressServer`.
    pub source: u32,
}

impl IngressConfig {
    pub fn new(socket_path: impl Into<PathBuf>, rows: u32, columns: u32, source: u32) -> Self {
        Self {
            socket_path: socket_path.into(),
            rows,
            columns,
            source,
        }
    }
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INGRESS_SOCKET, 0, 0, 0)
    }
}

/// Static configuration for one [`crate::egress::EgressBroadcaster`] instance.
#[derive(Debug, Clone)]
pub struct EgressConfig {
    /// Filesystem path of the listening Unix socket.
    pub socket_path: PathBuf,
    /// Fixed capacity of the client table. The `max_clients + 1`-th
    /// simultaneous connection is accepted by the kernel then immediately
    /// closed.
    pub max_clients: usize,
}

impl EgressConfig {
    pub fn new(socket_path: impl Into<PathBuf>, max_clients: usize) -> Self {
        Self {
            socket_path: socket_path.into(),
            max_clients,
        }
    }
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self::new(DEFAULT_EGRESS_SOCKET, 8)
    }
}
