//! The admin applet: device identity, configuration, PIN, and the
//! provisioning/reset instructions gated behind it.

use crate::apdu::{Command, ResponseData};
use crate::applet::{AppletError, AppletResult, OpaqueApplet};
use crate::flash::FlashFs;
use crate::pin::{Pin, UpdateOutcome, VerifyOutcome, PIN_MAX_LENGTH};
use crate::status::StatusWord;

const SN_FILE: &str = "sn";
const CFG_FILE: &str = "admin_cfg";
const PIN_RETRY_COUNTER: u8 = 3;
const DEFAULT_PIN: &[u8] = b"123456";

pub const INS_SELECT: u8 = crate::dispatch::INS_SELECT;
pub const INS_READ_VERSION: u8 = 0x31;
pub const INS_VERIFY: u8 = 0x20;
pub const INS_CHANGE_PIN: u8 = 0x21;
pub const INS_WRITE_FIDO_PRIVATE_KEY: u8 = 0x01;
pub const INS_WRITE_FIDO_CERT: u8 = 0x02;
pub const INS_RESET_OPENPGP: u8 = 0x03;
pub const INS_RESET_PIV: u8 = 0x04;
pub const INS_RESET_OATH: u8 = 0x05;
pub const INS_WRITE_SN: u8 = 0x06;
pub const INS_CONFIG: u8 = 0x07;
pub const INS_READ_FLASH_CAP: u8 = 0x08;
pub const INS_VENDOR_SPECIFIC: u8 = 0x09;

pub const P1_CFG_LED_ON: u8 = 0x00;
pub const P1_CFG_KBDIFACE: u8 = 0x01;

/// Weak-linked vendor hook: defaults to a no-op success, overridable at
/// construction time, mirroring `__attribute__((weak))
/// admin_vendor_specific`/`admin_vendor_version` in the original firmware.
pub type VendorHook = fn(&Command) -> Result<ResponseData, ()>;

pub fn default_vendor_hook(_command: &Command) -> Result<ResponseData, ()> {
    Ok(ResponseData::new())
}

/// Seam the admin applet delegates FIDO attestation-key provisioning
/// through; the credential subsystem's actual key storage is outside this
/// crate's scope (no cryptographic primitives, no FIDO data model), so
/// both hooks default to accepting-and-discarding.
pub type FidoProvisioningHook = fn(&mut dyn FlashFs, &[u8]) -> Result<(), ()>;

pub fn default_fido_hook(_fs: &mut dyn FlashFs, _data: &[u8]) -> Result<(), ()> {
    Ok(())
}

/// Two-field device configuration blob. Kept in declaration order
/// (`led_normally_on` then `kbd_interface_en`) so a blob written by an
/// older single-field image still parses as a truncated read (see
/// `DeviceConfig::from_bytes`).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DeviceConfig {
    pub led_normally_on: bool,
    pub kbd_interface_en: bool,
}

impl Default for DeviceConfig {
    fn default() -> DeviceConfig {
        DeviceConfig {
            led_normally_on: true,
            kbd_interface_en: false,
        }
    }
}

impl DeviceConfig {
    const ENCODED_LEN: usize = 2;

    fn to_bytes(self) -> [u8; Self::ENCODED_LEN] {
        [self.led_normally_on as u8, self.kbd_interface_en as u8]
    }

    /// A blob shorter than the current layout (e.g. the original
    /// single-byte `{ led_normally_on }` image) is accepted: missing
    /// trailing fields take their default value.
    fn from_bytes(buf: &[u8]) -> DeviceConfig {
        let mut cfg = DeviceConfig::default();
        if let Some(&b) = buf.first() {
            cfg.led_normally_on = b & 1 != 0;
        }
        if let Some(&b) = buf.get(1) {
            cfg.kbd_interface_en = b & 1 != 0;
        }
        cfg
    }
}

/// Borrowed collaborators the admin applet needs only while dispatching a
/// single command: the flash backend, the vendor hooks, the FIDO
/// provisioning seam, and the three resettable opaque sub-applets. Built
/// fresh by the dispatcher for each call instead of being owned by
/// [`AdminApplet`] itself, so `AdminApplet` stays storable without
/// borrowing the rest of the registry.
pub struct AdminContext<'a> {
    pub fs: &'a mut dyn FlashFs,
    pub vendor_specific: VendorHook,
    pub vendor_version: VendorHook,
    pub write_fido_private_key: FidoProvisioningHook,
    pub write_fido_cert: FidoProvisioningHook,
    pub reset_openpgp: &'a mut OpaqueApplet,
    pub reset_piv: &'a mut OpaqueApplet,
    pub reset_oath: &'a mut OpaqueApplet,
}

pub struct AdminApplet {
    pin: Pin,
    config: DeviceConfig,
}

impl AdminApplet {
    pub const fn new() -> AdminApplet {
        AdminApplet {
            pin: Pin::new("admin-pin", 6, PIN_MAX_LENGTH as u8, PIN_RETRY_COUNTER),
            config: DeviceConfig {
                led_normally_on: true,
                kbd_interface_en: false,
            },
        }
    }

    pub fn config(&self) -> DeviceConfig {
        self.config
    }

    /// Idempotent: always clears session state first, then ensures the
    /// config blob and PIN both exist, in that order — matching
    /// `admin_install`'s sequencing in the original firmware.
    pub fn install(&mut self, fs: &mut dyn FlashFs, reset: bool) -> Result<(), ()> {
        self.poweroff();

        if reset {
            fs.delete_file(CFG_FILE)?;
        }

        match fs.get_file_size(CFG_FILE) {
            Some(n) if n >= DeviceConfig::ENCODED_LEN => {
                let mut buf = [0u8; DeviceConfig::ENCODED_LEN];
                let read = fs.read_file(CFG_FILE, &mut buf, 0, DeviceConfig::ENCODED_LEN)?;
                self.config = DeviceConfig::from_bytes(&buf[..read]);
            }
            Some(n) if n > 0 => {
                let mut buf = [0u8; DeviceConfig::ENCODED_LEN];
                let read = fs.read_file(CFG_FILE, &mut buf, 0, n)?;
                self.config = DeviceConfig::from_bytes(&buf[..read]);
            }
            _ => {
                self.config = DeviceConfig::default();
                let bytes = self.config.to_bytes();
                fs.write_file(CFG_FILE, &bytes, 0, bytes.len(), true)?;
            }
        }

        if fs.get_file_size(self.pin.path()).is_none() {
            self.pin.create(fs, DEFAULT_PIN, None)?;
        }
        Ok(())
    }

    pub fn poweroff(&mut self) {
        self.pin.poweroff();
    }

    /// `ADMIN_INS_VERIFY`. `LC == 0` queries the current state without
    /// consuming a retry: success if a PIN is already validated this
    /// session, otherwise the retries-remaining status word — matching
    /// `admin_verify`'s zero-length special case.
    fn verify(&mut self, fs: &mut dyn FlashFs, command: &Command) -> AppletResult {
        debug_now!("ADMIN.VERIFY");
        if command.p1 != 0x00 || command.p2 != 0x00 {
            return Err(AppletError::Status(StatusWord::WRONG_P1P2));
        }

        if command.data.is_empty() {
            if self.pin.is_validated() {
                debug!("verify: already validated this session");
                return Ok(ResponseData::new());
            }
            let retries = self.pin.get_retries(fs).map_err(|_| AppletError::Io)?;
            debug!("verify: queried, {} retries left", retries);
            return Err(AppletError::Status(StatusWord::pin_retries(retries)));
        }

        let (outcome, retries) = self
            .pin
            .verify(fs, &command.data)
            .map_err(|_| AppletError::Io)?;
        match outcome {
            VerifyOutcome::Ok => {
                debug!("verify: ok");
                Ok(ResponseData::new())
            }
            VerifyOutcome::LengthInvalid => Err(AppletError::Status(StatusWord::WRONG_LENGTH)),
            VerifyOutcome::AuthFail if retries == 0 => {
                warn!("verify: PIN blocked");
                Err(AppletError::Status(StatusWord::AUTHENTICATION_BLOCKED))
            }
            VerifyOutcome::AuthFail => {
                debug!("verify: wrong PIN, {} retries left", retries);
                Err(AppletError::Status(StatusWord::pin_retries(retries)))
            }
        }
    }

    /// `ADMIN_INS_CHANGE_PIN`. Relies entirely on the dispatcher's gate
    /// (every non-`SELECT`/`READ_VERSION`/`VERIFY` instruction requires a
    /// validated session before it reaches here); this handler does not
    /// re-check `pin.is_validated()` itself, by construction of
    /// [`crate::dispatch::Dispatcher`]'s instruction gate.
    fn change_pin(&mut self, fs: &mut dyn FlashFs, command: &Command) -> AppletResult {
        debug_now!("ADMIN.CHANGE_PIN");
        debug_assert!(
            self.pin.is_validated(),
            "change_pin reached without the dispatcher's gate having validated the PIN"
        );
        if command.p1 != 0x00 || command.p2 != 0x00 {
            return Err(AppletError::Status(StatusWord::WRONG_P1P2));
        }
        match self
            .pin
            .update_authorized(fs, &command.data)
            .map_err(|_| AppletError::Io)?
        {
            UpdateOutcome::Ok => {
                debug!("change_pin: ok");
                Ok(ResponseData::new())
            }
            UpdateOutcome::LengthInvalid => Err(AppletError::Status(StatusWord::WRONG_LENGTH)),
            UpdateOutcome::NotAuthorized => {
                warn!("change_pin: not authorized");
                Err(AppletError::Status(StatusWord::CONDITIONS_NOT_SATISFIED))
            }
        }
    }

    fn write_sn(&mut self, fs: &mut dyn FlashFs, command: &Command) -> AppletResult {
        debug_now!("ADMIN.WRITE_SN");
        if command.p1 != 0x00 || command.p2 != 0x00 {
            return Err(AppletError::Status(StatusWord::WRONG_P1P2));
        }
        if command.data.len() != 4 {
            return Err(AppletError::Status(StatusWord::WRONG_LENGTH));
        }
        if fs.get_file_size(SN_FILE).is_some() {
            debug!("write_sn: already written");
            return Err(AppletError::Status(StatusWord::CONDITIONS_NOT_SATISFIED));
        }
        fs.write_file(SN_FILE, &command.data, 0, 4, true)
            .map_err(|_| AppletError::Io)?;
        Ok(ResponseData::new())
    }

    fn config_write(&mut self, fs: &mut dyn FlashFs, command: &Command) -> AppletResult {
        debug_now!("ADMIN.CONFIG p1={:#04x} p2={:#04x}", command.p1, command.p2);
        match command.p1 {
            P1_CFG_LED_ON => self.config.led_normally_on = command.p2 & 1 != 0,
            P1_CFG_KBDIFACE => self.config.kbd_interface_en = command.p2 & 1 != 0,
            _ => return Err(AppletError::Status(StatusWord::WRONG_P1P2)),
        }
        let bytes = self.config.to_bytes();
        fs.write_file(CFG_FILE, &bytes, 0, bytes.len(), true)
            .map_err(|_| AppletError::Io)?;
        Ok(ResponseData::new())
    }

    fn read_flash_cap(&self, fs: &dyn FlashFs, command: &Command) -> AppletResult {
        if command.p1 != 0x00 || command.p2 != 0x00 {
            return Err(AppletError::Status(StatusWord::WRONG_P1P2));
        }
        let mut out = ResponseData::new();
        out.extend_from_slice(&[fs.capacity()]).map_err(|_| AppletError::Io)?;
        Ok(out)
    }

    /// Route one command already known to target the admin applet.
    pub fn process_with_context(&mut self, ctx: &mut AdminContext, command: &Command) -> AppletResult {
        match command.ins {
            INS_READ_VERSION => {
                debug_now!("ADMIN.READ_VERSION");
                if command.p1 != 0x00 || command.p2 != 0x00 {
                    return Err(AppletError::Status(StatusWord::WRONG_P1P2));
                }
                return (ctx.vendor_version)(command).map_err(|_| AppletError::Io);
            }
            INS_VERIFY => return self.verify(ctx.fs, command),
            _ => {}
        }

        if !self.pin.is_validated() {
            debug!("admin ins={:#04x}: session not validated", command.ins);
            return Err(AppletError::Status(StatusWord::SECURITY_STATUS_NOT_SATISFIED));
        }

        match command.ins {
            INS_WRITE_FIDO_PRIVATE_KEY => {
                debug_now!("ADMIN.WRITE_FIDO_PRIVATE_KEY");
                (ctx.write_fido_private_key)(ctx.fs, &command.data)
                    .map(|_| ResponseData::new())
                    .map_err(|_| AppletError::Io)
            }
            INS_WRITE_FIDO_CERT => {
                debug_now!("ADMIN.WRITE_FIDO_CERT");
                (ctx.write_fido_cert)(ctx.fs, &command.data)
                    .map(|_| ResponseData::new())
                    .map_err(|_| AppletError::Io)
            }
            INS_RESET_OPENPGP => {
                debug_now!("ADMIN.RESET_OPENPGP");
                ctx.reset_openpgp
                    .install(ctx.fs, true)
                    .map(|_| ResponseData::new())
                    .map_err(|_| AppletError::Io)
            }
            INS_RESET_PIV => {
                debug_now!("ADMIN.RESET_PIV");
                ctx.reset_piv
                    .install(ctx.fs, true)
                    .map(|_| ResponseData::new())
                    .map_err(|_| AppletError::Io)
            }
            INS_RESET_OATH => {
                debug_now!("ADMIN.RESET_OATH");
                ctx.reset_oath
                    .install(ctx.fs, true)
                    .map(|_| ResponseData::new())
                    .map_err(|_| AppletError::Io)
            }
            INS_CHANGE_PIN => self.change_pin(ctx.fs, command),
            INS_WRITE_SN => self.write_sn(ctx.fs, command),
            INS_CONFIG => self.config_write(ctx.fs, command),
            INS_READ_FLASH_CAP => self.read_flash_cap(ctx.fs, command),
            INS_VENDOR_SPECIFIC => {
                debug_now!("ADMIN.VENDOR_SPECIFIC");
                (ctx.vendor_specific)(command).map_err(|_| AppletError::Io)
            }
            _ => {
                debug!("admin: unknown ins {:#04x}", command.ins);
                Err(AppletError::Status(StatusWord::INS_NOT_SUPPORTED))
            }
        }
    }
}

impl Default for AdminApplet {
    fn default() -> AdminApplet {
        AdminApplet::new()
    }
}

/// Read the serial number into `buf`, zero-filling on any read failure or
/// short read rather than partially filling it.
pub fn fill_sn(fs: &dyn FlashFs, buf: &mut [u8; 4]) {
    match fs.read_file(SN_FILE, buf, 0, 4) {
        Ok(4) => {}
        _ => *buf = [0; 4],
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::flash::memory::MemoryFlash;
    use crate::applet::Applet;

    fn fresh() -> (AdminApplet, OpaqueApplet, OpaqueApplet, OpaqueApplet, MemoryFlash) {
        let mut admin = AdminApplet::new();
        let mut fs = MemoryFlash::new(64);
        admin.install(&mut fs, false).unwrap();
        (admin, OpaqueApplet::new("openpgp"), OpaqueApplet::new("piv"), OpaqueApplet::new("oath"), fs)
    }

    fn ctx<'a>(
        fs: &'a mut MemoryFlash,
        openpgp: &'a mut OpaqueApplet,
        piv: &'a mut OpaqueApplet,
        oath: &'a mut OpaqueApplet,
    ) -> AdminContext<'a> {
        AdminContext {
            fs,
            vendor_specific: default_vendor_hook,
            vendor_version: default_vendor_hook,
            write_fido_private_key: default_fido_hook,
            write_fido_cert: default_fido_hook,
            reset_openpgp: openpgp,
            reset_piv: piv,
            reset_oath: oath,
        }
    }

    fn cmd(ins: u8, p1: u8, p2: u8, data: &[u8]) -> Command {
        let mut command_data = crate::apdu::CommandData::new();
        command_data.extend_from_slice(data).unwrap();
        Command { cla: 0, ins, p1, p2, data: command_data, le: 0 }
    }

    #[test]
    fn default_config_is_led_on_kbd_off() {
        let (admin, _, _, _, _) = fresh();
        assert_eq!(admin.config(), DeviceConfig { led_normally_on: true, kbd_interface_en: false });
    }

    #[test]
    fn verify_with_default_pin_then_change_pin() {
        let (mut admin, mut o, mut p, mut a, mut fs) = fresh();
        let mut c = ctx(&mut fs, &mut o, &mut p, &mut a);

        let resp = admin.process_with_context(&mut c, &cmd(INS_VERIFY, 0, 0, b"123456"));
        assert!(resp.is_ok());

        let resp = admin.process_with_context(&mut c, &cmd(INS_CHANGE_PIN, 0, 0, b"654321"));
        assert!(resp.is_ok());

        admin.poweroff();
        let resp = admin.process_with_context(&mut c, &cmd(INS_VERIFY, 0, 0, b"654321"));
        assert!(resp.is_ok());
    }

    #[test]
    fn verify_zero_lc_reports_retries_without_consuming() {
        let (mut admin, mut o, mut p, mut a, mut fs) = fresh();
        let mut c = ctx(&mut fs, &mut o, &mut p, &mut a);

        let err = admin.process_with_context(&mut c, &cmd(INS_VERIFY, 0, 0, b""));
        assert_eq!(err, Err(AppletError::Status(StatusWord::pin_retries(3))));

        admin.process_with_context(&mut c, &cmd(INS_VERIFY, 0, 0, b"000000")).ok();
        let err = admin.process_with_context(&mut c, &cmd(INS_VERIFY, 0, 0, b""));
        assert_eq!(err, Err(AppletError::Status(StatusWord::pin_retries(2))));
    }

    #[test]
    fn gated_instruction_before_verify_is_refused() {
        let (mut admin, mut o, mut p, mut a, mut fs) = fresh();
        let mut c = ctx(&mut fs, &mut o, &mut p, &mut a);
        let err = admin.process_with_context(&mut c, &cmd(INS_WRITE_SN, 0, 0, &[1, 2, 3, 4]));
        assert_eq!(err, Err(AppletError::Status(StatusWord::SECURITY_STATUS_NOT_SATISFIED)));
    }

    #[test]
    fn write_sn_is_write_once() {
        let (mut admin, mut o, mut p, mut a, mut fs) = fresh();
        let mut c = ctx(&mut fs, &mut o, &mut p, &mut a);
        admin.process_with_context(&mut c, &cmd(INS_VERIFY, 0, 0, b"123456")).unwrap();

        let resp = admin.process_with_context(&mut c, &cmd(INS_WRITE_SN, 0, 0, &[1, 2, 3, 4]));
        assert!(resp.is_ok());

        let err = admin.process_with_context(&mut c, &cmd(INS_WRITE_SN, 0, 0, &[9, 9, 9, 9]));
        assert_eq!(err, Err(AppletError::Status(StatusWord::CONDITIONS_NOT_SATISFIED)));

        let mut buf = [0u8; 4];
        fill_sn(&fs, &mut buf);
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    fn config_write_persists_across_reinstall() {
        let (mut admin, mut o, mut p, mut a, mut fs) = fresh();
        {
            let mut c = ctx(&mut fs, &mut o, &mut p, &mut a);
            admin.process_with_context(&mut c, &cmd(INS_VERIFY, 0, 0, b"123456")).unwrap();
            admin
                .process_with_context(&mut c, &cmd(INS_CONFIG, P1_CFG_LED_ON, 0, &[]))
                .unwrap();
        }
        let mut admin2 = AdminApplet::new();
        admin2.install(&mut fs, false).unwrap();
        assert_eq!(admin2.config().led_normally_on, false);
    }

    #[test]
    fn reset_openpgp_requires_validated_session() {
        let (mut admin, mut o, mut p, mut a, mut fs) = fresh();
        let mut c = ctx(&mut fs, &mut o, &mut p, &mut a);
        admin.process_with_context(&mut c, &cmd(INS_VERIFY, 0, 0, b"123456")).unwrap();
        assert!(!c.reset_openpgp.is_installed());
        admin.process_with_context(&mut c, &cmd(INS_RESET_OPENPGP, 0, 0, &[])).unwrap();
        assert!(c.reset_openpgp.is_installed());
    }

    quickcheck::quickcheck! {
        /// Idempotence (spec §8, property 4): applying the same `CONFIG`
        /// P1/P2 twice leaves the persisted blob identical to applying it
        /// once.
        fn config_write_is_idempotent(p1_is_kbd: bool, p2: u8) -> bool {
            let (mut admin, mut o, mut p, mut a, mut fs) = fresh();
            let p1 = if p1_is_kbd { P1_CFG_KBDIFACE } else { P1_CFG_LED_ON };
            {
                let mut c = ctx(&mut fs, &mut o, &mut p, &mut a);
                admin.process_with_context(&mut c, &cmd(INS_VERIFY, 0, 0, b"123456")).unwrap();
                admin.process_with_context(&mut c, &cmd(INS_CONFIG, p1, p2, &[])).unwrap();
            }
            let once = crate::flash::read_whole_file::<_, 8>(&fs, CFG_FILE).unwrap();

            {
                let mut c = ctx(&mut fs, &mut o, &mut p, &mut a);
                admin.process_with_context(&mut c, &cmd(INS_CONFIG, p1, p2, &[])).unwrap();
            }
            let twice = crate::flash::read_whole_file::<_, 8>(&fs, CFG_FILE).unwrap();

            once == twice
        }
    }
}
