//! Persistent PIN object: retry counter, verify/update/unblock.

use heapless::{String, Vec};

use crate::flash::FlashFs;

pub const PIN_MAX_LENGTH: usize = 64;
const MAX_PATH_LENGTH: usize = 40;

/// Outcome of a [`Pin::verify`] call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VerifyOutcome {
    Ok,
    LengthInvalid,
    AuthFail,
}

/// Outcome of a [`Pin::update`] family call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UpdateOutcome {
    Ok,
    LengthInvalid,
    NotAuthorized,
}

/// A PIN backed by two flash files: `{path}` (the PIN value) and
/// `{path}-ctr` (the single-byte retry counter). Splitting counter from
/// value matches the original's separate persistence of "the PIN" vs. "how
/// many tries are left", which must survive independently across a crash
/// between a failed compare and the counter decrement.
pub struct Pin {
    path: &'static str,
    min_length: u8,
    max_length: u8,
    max_retries: u8,
    is_validated: bool,
}

impl Pin {
    pub const fn new(path: &'static str, min_length: u8, max_length: u8, max_retries: u8) -> Pin {
        Pin {
            path,
            min_length,
            max_length,
            max_retries,
            is_validated: false,
        }
    }

    /// The flash-file name the PIN value itself is stored under.
    pub fn path(&self) -> &'static str {
        self.path
    }

    fn counter_path(&self) -> String<MAX_PATH_LENGTH> {
        let mut s: String<MAX_PATH_LENGTH> = String::new();
        let _ = s.push_str(self.path);
        let _ = s.push_str("-ctr");
        s
    }

    /// `true` once a successful [`Self::verify`] (or update) has happened
    /// since the last [`Self::poweroff`].
    pub fn is_validated(&self) -> bool {
        self.is_validated
    }

    /// Clear the session-validated bit. Called on every transport
    /// disconnect/reset, regardless of which applet currently holds it.
    pub fn poweroff(&mut self) {
        self.is_validated = false;
    }

    /// Create the PIN if (and only if) it does not already exist.
    ///
    /// Returns `Err(())` if a PIN already exists at this path, the initial
    /// value is out of bounds, or on any underlying flash failure.
    pub fn create<F: FlashFs + ?Sized>(
        &mut self,
        fs: &mut F,
        initial: &[u8],
        max_retries_override: Option<u8>,
    ) -> Result<(), ()> {
        if fs.get_file_size(self.path).is_some() {
            return Err(());
        }
        if initial.len() < self.min_length as usize || initial.len() > self.max_length as usize {
            return Err(());
        }
        fs.write_file(self.path, initial, 0, initial.len(), true)?;
        let max_retries = max_retries_override.unwrap_or(self.max_retries);
        fs.write_file(&self.counter_path(), &[max_retries], 0, 1, true)
    }

    fn read_counter<F: FlashFs + ?Sized>(&self, fs: &F) -> Result<u8, ()> {
        let path = self.counter_path();
        if fs.get_file_size(&path).is_none() {
            return Ok(self.max_retries);
        }
        let mut buf = [0u8; 1];
        let n = fs.read_file(&path, &mut buf, 0, 1)?;
        if n != 1 {
            return Err(());
        }
        Ok(buf[0])
    }

    fn write_counter<F: FlashFs + ?Sized>(&self, fs: &mut F, value: u8) -> Result<(), ()> {
        fs.write_file(&self.counter_path(), &[value], 0, 1, true)
    }

    fn read_value<F: FlashFs + ?Sized>(&self, fs: &F) -> Result<Vec<u8, PIN_MAX_LENGTH>, ()> {
        let size = fs.get_file_size(self.path).ok_or(())?;
        if size > PIN_MAX_LENGTH {
            return Err(());
        }
        let mut buf = [0u8; PIN_MAX_LENGTH];
        let n = fs.read_file(self.path, &mut buf, 0, size)?;
        if n != size {
            return Err(());
        }
        let mut out = Vec::new();
        out.extend_from_slice(&buf[..size]).map_err(|_| ())?;
        Ok(out)
    }

    /// Current retry counter, or `Err(())` on I/O failure. Does not consume
    /// a try.
    pub fn get_retries<F: FlashFs + ?Sized>(&self, fs: &F) -> Result<u8, ()> {
        self.read_counter(fs)
    }

    /// Compare `input` against the stored PIN.
    ///
    /// The retry counter is persisted *before* this function signals an
    /// auth failure to the caller — a crash between the comparison and the
    /// write must lose a try, never gain one, per the crate's durability
    /// contract.
    pub fn verify<F: FlashFs + ?Sized>(
        &mut self,
        fs: &mut F,
        input: &[u8],
    ) -> Result<(VerifyOutcome, u8), ()> {
        if input.len() < self.min_length as usize || input.len() > self.max_length as usize {
            return Ok((VerifyOutcome::LengthInvalid, self.read_counter(fs)?));
        }

        let retries = self.read_counter(fs)?;
        if retries == 0 {
            return Ok((VerifyOutcome::AuthFail, 0));
        }

        let stored = self.read_value(fs)?;
        if constant_time_eq(&stored, input) {
            self.write_counter(fs, self.max_retries)?;
            self.is_validated = true;
            Ok((VerifyOutcome::Ok, self.max_retries))
        } else {
            let remaining = retries - 1;
            self.write_counter(fs, remaining)?;
            Ok((VerifyOutcome::AuthFail, remaining))
        }
    }

    /// Set a new PIN given the session is already validated (by a prior
    /// [`Self::verify`] or by an external gate the caller is responsible
    /// for, e.g. the admin applet's dispatcher-enforced `VERIFY` gate — see
    /// [`crate::admin`]'s `change_pin` handler). Resets the retry counter
    /// to the configured maximum on success.
    pub fn update_authorized<F: FlashFs + ?Sized>(
        &mut self,
        fs: &mut F,
        new_pin: &[u8],
    ) -> Result<UpdateOutcome, ()> {
        if !self.is_validated {
            return Ok(UpdateOutcome::NotAuthorized);
        }
        if new_pin.len() < self.min_length as usize || new_pin.len() > self.max_length as usize {
            return Ok(UpdateOutcome::LengthInvalid);
        }
        fs.write_file(self.path, new_pin, 0, new_pin.len(), true)?;
        self.write_counter(fs, self.max_retries)?;
        self.is_validated = true;
        Ok(UpdateOutcome::Ok)
    }

    /// Set a new PIN by presenting the old one inline, without relying on
    /// any prior session state. For applets (unlike admin) whose
    /// change-PIN command is not gated by a separate `VERIFY` step and so
    /// must authenticate the change within the same APDU.
    pub fn update_with_old_pin<F: FlashFs + ?Sized>(
        &mut self,
        fs: &mut F,
        old_pin: &[u8],
        new_pin: &[u8],
    ) -> Result<UpdateOutcome, ()> {
        if old_pin.len() < self.min_length as usize || old_pin.len() > self.max_length as usize {
            return Ok(UpdateOutcome::LengthInvalid);
        }
        let stored = self.read_value(fs)?;
        if !constant_time_eq(&stored, old_pin) {
            return Ok(UpdateOutcome::NotAuthorized);
        }
        self.is_validated = true;
        self.update_authorized(fs, new_pin)
    }
}

/// Constant-time comparison: both operands are walked in full regardless of
/// where they first differ, and a length mismatch is folded into the
/// accumulator rather than short-circuiting, so timing does not leak how
/// many leading bytes matched.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let longer = a.len().max(b.len());
    let mut diff: u8 = (a.len() != b.len()) as u8;
    for i in 0..longer {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= x ^ y;
    }
    diff == 0
}
