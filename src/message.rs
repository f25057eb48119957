//! Wire schema for the ingress and egress message families.
//!
//! These types are encoded with `postcard`: a compact, `serde`-based binary
//! codec. Variant order is the wire tag (mirrors a schema's field numbers),
//! so existing arms must never be reordered or removed — only appended.

use serde::{Deserialize, Serialize};

/// Maximum number of simultaneous HID key codes in a keyboard report.
///
/// Covers both 6-key boot protocol and NKRO hosts; the adapter truncates to
/// this length regardless of how many keys the host reports.
pub const MAX_KEYBOARD_KEYS: usize = 32;

/// Maximum number of simultaneous HID usage codes in a consumer report.
pub const MAX_CONSUMER_KEYS: usize = 8;

/// Upper bound on an encoded [`ClientMessage`], used to size ingress receive
/// buffers and to reject oversized frame prefixes before reading the body.
pub const MAX_CLIENT_MESSAGE_SIZE: u32 = 64;

/// Upper bound on an encoded [`ZmkEvent`], sized for the largest variant
/// (`HidKeyboardReport` with a full `MAX_KEYBOARD_KEYS` key array) plus
/// postcard framing overhead.
pub const MAX_ZMK_EVENT_SIZE: u32 = 128;

/// Destination transport for an HID report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportType {
    None,
    Usb,
    Ble,
}

/// Where a HID report is headed. `ble_profile_idx` is only meaningful when
/// `transport == Ble`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub transport: TransportType,
    pub ble_profile_idx: u32,
}

impl Endpoint {
    pub const NONE: Endpoint = Endpoint {
        transport: TransportType::None,
        ble_profile_idx: 0,
    };
}

/// Explicit key-matrix coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPosition {
    pub row: u32,
    pub col: u32,
}

/// Which edge of a key transition this event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyAction {
    Press,
    Release,
}

/// How the target key is addressed: explicit matrix coordinates, or a
/// linear index that the ingress server expands using its configured
/// column count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyAddress {
    KeyPos(KeyPosition),
    Position(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub action: KeyAction,
    pub address: KeyAddress,
}

/// Single-arm tagged union accepted on the ingress socket. Kept as a union
/// (rather than a bare `KeyEvent`) so a new externally-injected message kind
/// can be added later without breaking the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientMessage {
    KeyEvent(KeyEvent),
}

/// A raw matrix transition, before keymap processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KscanEvent {
    pub source: u32,
    pub position: u32,
    pub pressed: bool,
    pub timestamp: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HidKeyboardReport {
    pub endpoint: Endpoint,
    pub modifiers: u8,
    pub keys: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HidConsumerReport {
    pub endpoint: Endpoint,
    pub keys: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HidMouseReport {
    pub endpoint: Endpoint,
    pub buttons: u32,
    pub dx: i32,
    pub dy: i32,
    pub scroll_x: i32,
    pub scroll_y: i32,
}

/// Tagged union broadcast on the egress socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ZmkEvent {
    Kscan(KscanEvent),
    Keyboard(HidKeyboardReport),
    Consumer(HidConsumerReport),
    #[cfg(feature = "pointing")]
    Mouse(HidMouseReport),
}
