//! IPC bridge between a ZMK-style keyboard firmware host and external
//! driver processes, over two independent Unix domain sockets:
//!
//! - an **ingress** socket accepting externally-injected key events, and
//! - an **egress** socket broadcasting key-scan and HID reports to any
//!   number of observers.
//!
//! Both sockets share the same length-prefixed, `postcard`-encoded framing
//! defined in [`framing`] and [`message`].

pub mod adapters;
pub mod config;
pub mod egress;
pub mod error;
pub mod framing;
pub mod ingress;
pub mod message;
mod socket_util;

pub use config::{EgressConfig, IngressConfig};
pub use egress::EgressBroadcaster;
pub use error::{EncodeError, RecvError, SendError};
pub use ingress::IngressServer;
pub use message::{
    ClientMessage, Endpoint, HidConsumerReport, HidKeyboardReport, KeyAction, KeyAddress,
    KeyEvent, KeyPosition, KscanEvent, TransportType, ZmkEvent,
};

#[cfg(feature = "pointing")]
pub use message::HidMouseReport;
