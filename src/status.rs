//! ISO-7816-like status words (SW) returned in every [`crate::apdu::Response`][].
//!
//! The set of codes is closed and the numeric values are part of the wire
//! contract: a host that has already learned `0x6982` means "security status
//! not satisfied" must keep meaning that after a migration, so these are
//! plain associated constants on a `u16` newtype rather than a `#[repr(u16)]`
//! enum — the PIN-retries family needs a carrier value the enum variants
//! can't give us for free.

use core::fmt;

/// A two-byte status word, transmitted big-endian at the end of every RAPDU.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StatusWord(pub u16);

impl StatusWord {
    pub const NO_ERROR: StatusWord = StatusWord(0x9000);
    pub const WRONG_LENGTH: StatusWord = StatusWord(0x6700);
    pub const SECURITY_STATUS_NOT_SATISFIED: StatusWord = StatusWord(0x6982);
    pub const AUTHENTICATION_BLOCKED: StatusWord = StatusWord(0x6983);
    pub const CONDITIONS_NOT_SATISFIED: StatusWord = StatusWord(0x6985);
    pub const WRONG_P1P2: StatusWord = StatusWord(0x6A86);
    pub const INS_NOT_SUPPORTED: StatusWord = StatusWord(0x6D00);
    pub const UNABLE_TO_PROCESS: StatusWord = StatusWord(0x6F00);

    /// Base of the `63Cn` family: `n` (0..=15) is the number of PIN retries
    /// left. `pin_retries(0)` is distinguishable from
    /// [`Self::AUTHENTICATION_BLOCKED`]: the former is "wrong PIN, zero
    /// tries remain, counter is now 0"; the latter is "the PIN is already
    /// blocked, this attempt was refused outright".
    pub const PIN_RETRIES_BASE: u16 = 0x63C0;

    /// Build the `SW_PIN_RETRIES + n` status word for `n` remaining tries.
    ///
    /// `n` is clamped to 15 (the family only has a nibble of room); no
    /// legitimate retry budget in this crate exceeds that.
    pub const fn pin_retries(remaining: u8) -> StatusWord {
        let n = if remaining > 0x0F { 0x0F } else { remaining };
        StatusWord(Self::PIN_RETRIES_BASE | n as u16)
    }

    /// If this status word is a `63Cn` code, the `n` (0..=15), else `None`.
    pub const fn retries_remaining(self) -> Option<u8> {
        if self.0 & 0xFFF0 == Self::PIN_RETRIES_BASE {
            Some((self.0 & 0x0F) as u8)
        } else {
            None
        }
    }

    pub const fn is_success(self) -> bool {
        self.0 == Self::NO_ERROR.0
    }

    pub fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl From<StatusWord> for u16 {
    fn from(sw: StatusWord) -> u16 {
        sw.0
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SW={:04X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_retries_round_trip() {
        for n in 0..=3u8 {
            let sw = StatusWord::pin_retries(n);
            assert_eq!(sw.retries_remaining(), Some(n));
        }
    }

    #[test]
    fn fixed_codes_match_spec() {
        assert_eq!(StatusWord::NO_ERROR.0, 0x9000);
        assert_eq!(StatusWord::WRONG_LENGTH.0, 0x6700);
        assert_eq!(StatusWord::SECURITY_STATUS_NOT_SATISFIED.0, 0x6982);
        assert_eq!(StatusWord::AUTHENTICATION_BLOCKED.0, 0x6983);
        assert_eq!(StatusWord::CONDITIONS_NOT_SATISFIED.0, 0x6985);
        assert_eq!(StatusWord::WRONG_P1P2.0, 0x6A86);
        assert_eq!(StatusWord::INS_NOT_SUPPORTED.0, 0x6D00);
        assert_eq!(StatusWord::UNABLE_TO_PROCESS.0, 0x6F00);
    }

    #[test]
    fn blocked_is_not_a_retries_code() {
        assert_eq!(StatusWord::AUTHENTICATION_BLOCKED.retries_remaining(), None);
    }
}
