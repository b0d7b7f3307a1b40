//! Applet registry, selector, and the top-level command pipeline.
//!
//! This is the "process-wide mutable state" the original firmware kept as
//! file-scope globals (`current_config`, the admin PIN's `is_validated`
//! bit), reified here as a single value — [`Dispatcher`] — owned by
//! whatever event loop drives the transport, and threaded through every
//! applet invocation instead of reached for as ambient global state.

use crate::admin::{
    default_fido_hook, default_vendor_hook, AdminApplet, FidoProvisioningHook, VendorHook,
};
use crate::apdu::{Command, CodecError, Response, ResponseData};
use crate::applet::{Applet, AppletError, OpaqueApplet};
use crate::flash::FlashFs;
use crate::status::StatusWord;

/// ISO-7816-4 `SELECT` instruction byte, shared by every applet's AID.
pub const INS_SELECT: u8 = 0xA4;

/// Which applet, if any, currently holds the selection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Selected {
    None,
    Admin,
    Opaque(OpaqueId),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum OpaqueId {
    OpenPgp,
    Piv,
    Oath,
}

/// The applet AID table. Only the admin AID's value is meaningful to this
/// crate (it gates `RESET_*`/`WRITE_FIDO_*`); the others are placeholders
/// an integration can override by constructing applets with their real
/// vendor AIDs — the core only needs *an* AID to route `SELECT` by.
pub const ADMIN_AID: &[u8] = &[0xF0, 0x00, 0x00, 0x00, 0x01];
pub const OPENPGP_AID: &[u8] = &[0xD2, 0x76, 0x00, 0x01, 0x24, 0x01];
pub const PIV_AID: &[u8] = &[0xA0, 0x00, 0x00, 0x03, 0x08];
pub const OATH_AID: &[u8] = &[0xA0, 0x00, 0x00, 0x05, 0x27, 0x21, 0x01];

pub struct Dispatcher<F: FlashFs> {
    fs: F,
    admin: AdminApplet,
    openpgp: OpaqueApplet,
    piv: OpaqueApplet,
    oath: OpaqueApplet,
    selected: Selected,
    vendor_specific: VendorHook,
    vendor_version: VendorHook,
    write_fido_private_key: FidoProvisioningHook,
    write_fido_cert: FidoProvisioningHook,
}

impl<F: FlashFs> Dispatcher<F> {
    pub fn new(fs: F) -> Dispatcher<F> {
        Dispatcher {
            fs,
            admin: AdminApplet::new(),
            openpgp: OpaqueApplet::new("openpgp"),
            piv: OpaqueApplet::new("piv"),
            oath: OpaqueApplet::new("oath"),
            selected: Selected::None,
            vendor_specific: default_vendor_hook,
            vendor_version: default_vendor_hook,
            write_fido_private_key: default_fido_hook,
            write_fido_cert: default_fido_hook,
        }
    }

    pub fn set_vendor_specific(&mut self, hook: VendorHook) {
        self.vendor_specific = hook;
    }

    pub fn set_vendor_version(&mut self, hook: VendorHook) {
        self.vendor_version = hook;
    }

    pub fn set_fido_provisioning(&mut self, private_key: FidoProvisioningHook, cert: FidoProvisioningHook) {
        self.write_fido_private_key = private_key;
        self.write_fido_cert = cert;
    }

    pub fn flash(&self) -> &F {
        &self.fs
    }

    /// Run every applet's install routine. Call once at first boot, or
    /// whenever bringing a blank device up.
    pub fn install_all(&mut self) -> Result<(), ()> {
        self.admin.install(&mut self.fs, false)?;
        self.openpgp.install(&mut self.fs, false)?;
        self.piv.install(&mut self.fs, false)?;
        self.oath.install(&mut self.fs, false)?;
        Ok(())
    }

    /// Transport disconnect/reset: drop the in-flight response (the caller
    /// just does not send one) and clear every applet's session state. The
    /// next command begins with no applet selected and no PIN validated.
    pub fn poweroff(&mut self) {
        self.admin.poweroff();
        self.openpgp.poweroff();
        self.piv.poweroff();
        self.oath.poweroff();
        self.selected = Selected::None;
    }

    fn opaque_mut(&mut self, id: OpaqueId) -> &mut OpaqueApplet {
        match id {
            OpaqueId::OpenPgp => &mut self.openpgp,
            OpaqueId::Piv => &mut self.piv,
            OpaqueId::Oath => &mut self.oath,
        }
    }

    fn try_select(&mut self, command: &Command) -> Option<Response> {
        if command.ins != INS_SELECT {
            return None;
        }
        let aid: &[u8] = &command.data;
        if aid == ADMIN_AID {
            debug_now!("SELECT.ADMIN");
            if command.p1 != 0x04 || command.p2 != 0x00 {
                return Some(Response::status(StatusWord::WRONG_P1P2));
            }
            self.selected = Selected::None;
            if self.admin.install(&mut self.fs, false).is_err() {
                debug!("admin install failed");
                return Some(Response::status(StatusWord::UNABLE_TO_PROCESS));
            }
            self.selected = Selected::Admin;
            return Some(Response::ok(ResponseData::new()));
        }

        let candidate = if aid == OPENPGP_AID {
            Some(OpaqueId::OpenPgp)
        } else if aid == PIV_AID {
            Some(OpaqueId::Piv)
        } else if aid == OATH_AID {
            Some(OpaqueId::Oath)
        } else {
            None
        };

        if let Some(id) = candidate {
            debug_now!("SELECT.OPAQUE");
            self.selected = Selected::None;
            if self.opaque_mut(id).install(&mut self.fs, false).is_err() {
                debug!("opaque applet install failed");
                return Some(Response::status(StatusWord::UNABLE_TO_PROCESS));
            }
            self.selected = Selected::Opaque(id);
            return Some(Response::ok(ResponseData::new()));
        }

        debug!("SELECT: unknown AID");
        Some(Response::status(StatusWord::INS_NOT_SUPPORTED))
    }

    /// Decode one raw command unit, route it, and return the framed
    /// response bytes (data followed by the two-byte status word).
    pub fn process(&mut self, raw: &[u8]) -> crate::apdu::ResponseWire {
        let response = match Command::parse(raw) {
            Ok(command) => self.process_command(&command),
            Err(CodecError::TooLarge) => {
                debug!("command codec: too large");
                Response::status(StatusWord::WRONG_LENGTH)
            }
            Err(CodecError::Truncated) => {
                debug!("command codec: truncated");
                Response::status(StatusWord::WRONG_LENGTH)
            }
        };
        info!("{}", response.sw);
        response.to_bytes()
    }

    fn process_command(&mut self, command: &Command) -> Response {
        if let Some(response) = self.try_select(command) {
            return response;
        }

        match self.selected {
            Selected::None => {
                debug!("no applet selected");
                Response::status(StatusWord::INS_NOT_SUPPORTED)
            }
            Selected::Admin => self.process_admin(command),
            Selected::Opaque(id) => match self.opaque_mut(id).process(&mut self.fs, command) {
                Ok(data) => Response::ok(data),
                Err(AppletError::Status(sw)) => Response::status(sw),
                Err(AppletError::Io) => {
                    debug!("opaque applet I/O failure");
                    Response::status(StatusWord::UNABLE_TO_PROCESS)
                }
            },
        }
    }

    fn process_admin(&mut self, command: &Command) -> Response {
        debug_now!("DISPATCH.ADMIN ins={:#04x}", command.ins);
        let mut ctx = crate::admin::AdminContext {
            fs: &mut self.fs,
            vendor_specific: self.vendor_specific,
            vendor_version: self.vendor_version,
            write_fido_private_key: self.write_fido_private_key,
            write_fido_cert: self.write_fido_cert,
            reset_openpgp: &mut self.openpgp,
            reset_piv: &mut self.piv,
            reset_oath: &mut self.oath,
        };
        match self.admin.process_with_context(&mut ctx, command) {
            Ok(data) => Response::ok(data),
            Err(AppletError::Status(sw)) => Response::status(sw),
            Err(AppletError::Io) => {
                debug!("admin I/O failure");
                Response::status(StatusWord::UNABLE_TO_PROCESS)
            }
        }
    }
}
