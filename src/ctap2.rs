//! CTAP2 request parsing: `authenticatorMakeCredential` and
//! `authenticatorGetAssertion`.
//!
//! Everything above the wire is out of scope here — no attestation, no
//! signing, no credential storage. This module turns a CBOR command body
//! into a validated, bounded-memory request struct and hands it to the
//! applet that actually does something with it.

pub mod cbor;
pub mod parser;
pub mod sizes;

pub use parser::{
    parse_get_assertion, parse_make_credential, CredentialListRef, GetAssertionRequest,
    MakeCredentialRequest, Options, ParsedParams, RpIdHasher, UserEntity,
};

pub type Result<T> = core::result::Result<T, Error>;

/// CTAP2 status codes, as assigned by the FIDO Alliance CTAP2
/// specification. This parser only ever produces a handful of these
/// (see [`parser`]); the rest of the enumeration is kept complete because
/// callers route these values onward as wire bytes and a partial
/// enumeration would not let them do that for codes this crate does not
/// itself raise.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    Success = 0x00,
    InvalidCommand = 0x01,
    InvalidParameter = 0x02,
    InvalidLength = 0x03,
    InvalidSeq = 0x04,
    Timeout = 0x05,
    ChannelBusy = 0x06,
    LockRequired = 0x0A,
    InvalidChannel = 0x0B,
    CborUnexpectedType = 0x11,
    InvalidCbor = 0x12,
    MissingParameter = 0x14,
    LimitExceeded = 0x15,
    UnsupportedExtension = 0x16,
    FingerprintDatabaseFull = 0x17,
    LargeBlobStorageFull = 0x18,
    CredentialExcluded = 0x19,
    Processing = 0x21,
    InvalidCredential = 0x22,
    UserActionPending = 0x23,
    OperationPending = 0x24,
    NoOperations = 0x25,
    UnsupportedAlgorithm = 0x26,
    OperationDenied = 0x27,
    KeyStoreFull = 0x28,
    NotBusy = 0x29,
    NoOperationPending = 0x2A,
    UnsupportedOption = 0x2B,
    InvalidOption = 0x2C,
    KeepaliveCancel = 0x2D,
    NoCredentials = 0x2E,
    UserActionTimeout = 0x2F,
    NotAllowed = 0x30,
    PinInvalid = 0x31,
    PinBlocked = 0x32,
    PinAuthInvalid = 0x33,
    PinAuthBlocked = 0x34,
    PinNotSet = 0x35,
    PinRequired = 0x36,
    PinPolicyViolation = 0x37,
    PinTokenExpired = 0x38,
    RequestTooLarge = 0x39,
    ActionTimeout = 0x3A,
    UpRequired = 0x3B,
    UvBlocked = 0x3C,
    IntegrityFailure = 0x3D,
    InvalidSubcommand = 0x3E,
    UvInvalid = 0x3F,
    UnauthorizedPermission = 0x40,
    Other = 0x7F,
    SpecLast = 0xDF,
    ExtensionFirst = 0xE0,
    ExtensionLast = 0xEF,
    VendorFirst = 0xF0,
    VendorLast = 0xFF,
}
