#![cfg_attr(not(test), no_std)]

//! Applet dispatch and credential-management core for a USB/NFC security
//! token: the admin applet, PIN lifecycle, a flash-backed file store, the
//! ISO-7816 command/response codec, and a canonical-CBOR parser for the
//! two CTAP2 requests (`makeCredential`/`getAssertion`) that need PIN
//! gating before they reach the FIDO authenticator itself.
//!
//! The transport (USB HID, NFC, CCID) is out of scope: callers hand
//! [`dispatch::Dispatcher::process`] one already-framed command buffer at
//! a time and get back one already-framed response buffer.

#[macro_use]
extern crate delog;
generate_macros!();

pub use heapless;
pub use heapless::{String, Vec};
pub use heapless_bytes;
pub use heapless_bytes::Bytes;

pub mod admin;
pub mod apdu;
pub mod applet;
pub mod ctap2;
pub mod dispatch;
pub mod flash;
pub mod pin;
pub mod status;

pub use ctap2::{Error, Result};

#[cfg(test)]
mod tests {}
