//! Applet lifecycle: the shared contract every selectable sub-application
//! (admin, FIDO/CTAP, OpenPGP, PIV, OATH) implements.

use crate::apdu::{Command, ResponseData};
use crate::flash::FlashFs;
use crate::status::StatusWord;

/// An application identifier, as presented in a `SELECT` command's data
/// field. Stored by value (AIDs are short) rather than borrowed, so a
/// registry can compare against it without holding onto the inbound APDU.
pub type Aid = heapless::Vec<u8, 16>;

/// The fallible outcome of [`Applet::process`].
///
/// This is the "exception-like early exit" from the original firmware's
/// `EXCEPT()` macro, reified as a `Result`: `Status` is an explicit raise
/// (the applet detected a protocol violation and knows exactly which SW to
/// report), `Io` is the negative-internal-sentinel case (a flash operation
/// failed and the dispatcher must not leak why).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AppletError {
    Status(StatusWord),
    Io,
}

impl From<StatusWord> for AppletError {
    fn from(sw: StatusWord) -> AppletError {
        AppletError::Status(sw)
    }
}

pub type AppletResult = Result<ResponseData, AppletError>;

/// A selectable sub-application.
///
/// `install`/`poweroff`/`process` are the three lifecycle points the
/// dispatcher ever calls; it holds no other per-applet state.
pub trait Applet {
    /// Ensure on-flash state exists (creating defaults on first run).
    /// Idempotent; when `reset` is `true`, wipes and recreates instead.
    fn install(&mut self, fs: &mut dyn FlashFs, reset: bool) -> Result<(), ()>;

    /// Clear all transient session state. Called on every transport
    /// disconnect/reset, regardless of which applet (if any) is selected.
    fn poweroff(&mut self);

    /// Handle one already-decoded command addressed to this applet.
    fn process(&mut self, fs: &mut dyn FlashFs, command: &Command) -> AppletResult;
}

/// A sub-application whose data model is opaque to this crate (OpenPGP,
/// PIV, OATH): the core only needs to be able to reset it and to know it
/// exists, per the Non-goals ("does not define the OpenPGP/PIV/OATH data
/// models in detail — they are opaque resettable sub-states to the core").
pub struct OpaqueApplet {
    name: &'static str,
    installed: bool,
}

impl OpaqueApplet {
    pub const fn new(name: &'static str) -> OpaqueApplet {
        OpaqueApplet {
            name,
            installed: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }
}

impl Applet for OpaqueApplet {
    fn install(&mut self, _fs: &mut dyn FlashFs, reset: bool) -> Result<(), ()> {
        if reset {
            self.installed = false;
        }
        self.installed = true;
        Ok(())
    }

    fn poweroff(&mut self) {}

    fn process(&mut self, _fs: &mut dyn FlashFs, _command: &Command) -> AppletResult {
        Err(AppletError::Status(StatusWord::INS_NOT_SUPPORTED))
    }
}
