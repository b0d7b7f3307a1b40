//! Fixed buffer capacities the parser decodes into.
//!
//! These mirror the original firmware's fixed C arrays (`char
//! domain[DOMAIN_NAME_MAX_SIZE]`, `user->name`, `key[4]`/`key[12]`,
//! `type_str[10]`) — the Rust port keeps the same bounds rather than
//! introducing unbounded allocation, preserving the `no_std` footprint.

/// Maximum bytes of an RP id accepted before truncation (includes the
/// trailing NUL the original keeps room for in its debug copy).
pub const DOMAIN_NAME_MAX_SIZE: usize = 255;

pub const USER_ID_MAX_SIZE: usize = 64;
pub const USER_NAME_LIMIT: usize = 32;
pub const DISPLAY_NAME_LIMIT: usize = 32;
pub const ICON_LIMIT: usize = 64;

pub const CLIENT_DATA_HASH_SIZE: usize = 32;
pub const PIN_AUTH_SIZE: usize = 16;

/// COSE algorithm identifier for ES256, the only algorithm
/// `pubKeyCredParams` is checked against.
pub const COSE_ALG_ES256: i64 = -7;
