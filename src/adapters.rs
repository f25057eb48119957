//! Translation between host-native event shapes and the wire schema.
//!
//! These are plain functions rather than `From` impls because the host side
//! (row/col/pressed triples, raw HID byte slices) has no natural Rust type
//! of its own to hang a trait on.

use crate::message::{
    Endpoint, HidConsumerReport, HidKeyboardReport, KscanEvent, TransportType,
    MAX_CONSUMER_KEYS, MAX_KEYBOARD_KEYS,
};

#[cfg(feature = "pointing")]
use crate::message::HidMouseReport;

/// Parse a host-supplied transport string into an [`Endpoint`].
///
/// Matched by prefix, not by equality: a string beginning with `"USB"` (e.g.
/// `"USB"`, `"USBC"`, `"USB-HID"`) maps to `Usb`; a string beginning with
/// `"BLE:"` maps to `Ble` with the remainder parsed as a decimal profile
/// index. Anything else — including an unparseable BLE profile suffix —
/// maps to [`Endpoint::NONE`], logged at `warn` so a typo'd transport string
/// is visible without aborting the report.
pub fn parse_endpoint(transport: &str) -> Endpoint {
    if transport.starts_with("USB") {
        return Endpoint {
            transport: TransportType::Usb,
            ble_profile_idx: 0,
        };
    }

    if let Some(profile) = transport.strip_prefix("BLE:") {
        match profile.parse::<u32>() {
            Ok(ble_profile_idx) => {
                return Endpoint {
                    transport: TransportType::Ble,
                    ble_profile_idx,
                }
            }
            Err(_) => {
                log::warn!("unparseable BLE profile index in {transport:?}, treating as NONE");
                return Endpoint::NONE;
            }
        }
    }

    log::warn!("unrecognized transport string {transport:?}, treating as NONE");
    Endpoint::NONE
}

/// Build the raw key-scan event broadcast ahead of keymap processing.
pub fn kscan_event(source: u32, position: u32, pressed: bool, timestamp: u32) -> KscanEvent {
    KscanEvent {
        source,
        position,
        pressed,
        timestamp,
    }
}

/// Build a keyboard HID report, truncating `keys` to [`MAX_KEYBOARD_KEYS`].
///
/// Truncation rather than rejection: a host reporting more simultaneous keys
/// than the wire schema allows still wants its modifier byte delivered.
pub fn keyboard_report(endpoint: Endpoint, modifiers: u8, keys: &[u8]) -> HidKeyboardReport {
    let mut truncated = keys.to_vec();
    truncated.truncate(MAX_KEYBOARD_KEYS);
    HidKeyboardReport {
        endpoint,
        modifiers,
        keys: truncated,
    }
}

/// Build a consumer-control HID report, truncating `keys` to
/// [`MAX_CONSUMER_KEYS`].
pub fn consumer_report(endpoint: Endpoint, keys: &[u8]) -> HidConsumerReport {
    let mut truncated = keys.to_vec();
    truncated.truncate(MAX_CONSUMER_KEYS);
    HidConsumerReport {
        endpoint,
        keys: truncated,
    }
}

#[cfg(feature = "pointing")]
pub fn mouse_report(
    endpoint: Endpoint,
    buttons: u32,
    dx: i32,
    dy: i32,
    scroll_x: i32,
    scroll_y: i32,
) -> HidMouseReport {
    HidMouseReport {
        endpoint,
        buttons,
        dx,
        dy,
        scroll_x,
        scroll_y,
    }
}
