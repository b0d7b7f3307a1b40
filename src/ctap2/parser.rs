//! `makeCredential`/`getAssertion` canonical-CBOR request parsing.

use bitflags::bitflags;
use heapless::{String, Vec};

use super::cbor::{Cursor, CborError};
use super::sizes::{
    CLIENT_DATA_HASH_SIZE, COSE_ALG_ES256, DISPLAY_NAME_LIMIT, DOMAIN_NAME_MAX_SIZE, ICON_LIMIT,
    PIN_AUTH_SIZE, USER_ID_MAX_SIZE, USER_NAME_LIMIT,
};
use crate::ctap2::Error as Ctap2Error;

impl From<CborError> for Ctap2Error {
    fn from(e: CborError) -> Ctap2Error {
        match e {
            CborError::UnexpectedType => Ctap2Error::CborUnexpectedType,
            CborError::IntegerOverflow => Ctap2Error::LimitExceeded,
            CborError::UnexpectedEof
            | CborError::NonCanonical
            | CborError::InvalidUtf8 => Ctap2Error::InvalidCbor,
        }
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct ParsedParams: u16 {
        const CLIENT_DATA_HASH     = 1 << 0;
        const RP_ID                = 1 << 1;
        const USER                 = 1 << 2;
        const PUB_KEY_CRED_PARAMS  = 1 << 3;
        const CREDENTIAL_LIST      = 1 << 4;
        const OPTIONS              = 1 << 5;
        const PIN_AUTH             = 1 << 6;
        const PIN_PROTOCOL         = 1 << 7;
    }
}

/// A byte-range into the still-CBOR-encoded request buffer naming an array
/// of public-key credential descriptors (`excludeList`/`allowList`), plus
/// its declared element count. The credential subsystem re-enters the
/// decoder against this range rather than this crate handing out a live
/// iterator tied to the request buffer's lifetime.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CredentialListRef {
    pub offset: usize,
    pub length: usize,
    pub count: u64,
}

#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct UserEntity {
    pub id: Vec<u8, USER_ID_MAX_SIZE>,
    pub name: String<USER_NAME_LIMIT>,
    pub display_name: String<DISPLAY_NAME_LIMIT>,
    pub icon: String<ICON_LIMIT>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub struct Options {
    pub rk: bool,
    pub uv: bool,
    pub up: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MakeCredentialRequest {
    pub client_data_hash: [u8; CLIENT_DATA_HASH_SIZE],
    pub rp_id_hash: [u8; 32],
    pub rp_id_debug: String<DOMAIN_NAME_MAX_SIZE>,
    pub user: UserEntity,
    pub exclude_list: Option<CredentialListRef>,
    pub options: Options,
    pub pin_auth: Option<[u8; PIN_AUTH_SIZE]>,
    pub pin_protocol: Option<i64>,
    pub parsed_params: ParsedParams,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GetAssertionRequest {
    pub client_data_hash: [u8; CLIENT_DATA_HASH_SIZE],
    pub rp_id_hash: [u8; 32],
    pub rp_id_debug: String<DOMAIN_NAME_MAX_SIZE>,
    pub allow_list: Option<CredentialListRef>,
    pub options: Options,
    pub pin_auth: Option<[u8; PIN_AUTH_SIZE]>,
    pub pin_protocol: Option<i64>,
    pub parsed_params: ParsedParams,
}

const MC_CLIENT_DATA_HASH: i64 = 1;
const MC_RP: i64 = 2;
const MC_USER: i64 = 3;
const MC_PUB_KEY_CRED_PARAMS: i64 = 4;
const MC_EXCLUDE_LIST: i64 = 5;
const MC_EXTENSIONS: i64 = 6;
const MC_OPTIONS: i64 = 7;
const MC_PIN_AUTH: i64 = 8;
const MC_PIN_PROTOCOL: i64 = 9;

const GA_RP_ID: i64 = 1;
const GA_CLIENT_DATA_HASH: i64 = 2;
const GA_ALLOW_LIST: i64 = 3;
const GA_EXTENSIONS: i64 = 4;
const GA_OPTIONS: i64 = 5;
const GA_PIN_AUTH: i64 = 6;
const GA_PIN_PROTOCOL: i64 = 7;

/// Hash an RP id string into a 32-byte value. Injected rather than called
/// directly against a crypto crate, per the boundary that keeps
/// cryptographic primitives out of this core.
pub type RpIdHasher<'a> = &'a mut dyn FnMut(&[u8]) -> [u8; 32];

fn truncated_copy<const N: usize>(s: &str) -> String<N> {
    let mut out: String<N> = String::new();
    let max = N.saturating_sub(1);
    let mut end = s.len().min(max);
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    out.push_str(&s[..end]).ok();
    out
}

fn parse_rp(map: &mut Cursor, hash: RpIdHasher) -> Result<([u8; 32], String<DOMAIN_NAME_MAX_SIZE>), Ctap2Error> {
    let len = map.enter_map()?;
    // A map with no "id" key falls through with the hash left at its
    // zeroed default, matching the original parser: it returns success
    // without ever writing `rpIdHash` in that case rather than raising
    // a missing-parameter error.
    let mut rp_id_hash = [0u8; 32];
    let mut rp_id_debug = String::new();
    for _ in 0..len {
        let key = map.read_text()?;
        if key == "id" {
            let id = map.read_text()?;
            debug!("rpId: {}", id);
            rp_id_hash = hash(id.as_bytes());
            rp_id_debug = truncated_copy(id);
        } else {
            map.skip_value()?;
        }
    }
    Ok((rp_id_hash, rp_id_debug))
}

fn parse_user(map: &mut Cursor) -> Result<UserEntity, Ctap2Error> {
    let len = map.enter_map()?;
    let mut user = UserEntity::default();
    for _ in 0..len {
        let key = map.read_text()?;
        match key {
            "id" => {
                let id = map.read_bytes()?;
                user.id
                    .extend_from_slice(&id[..id.len().min(USER_ID_MAX_SIZE)])
                    .map_err(|_| Ctap2Error::LimitExceeded)?;
            }
            "name" => {
                let name = map.read_text()?;
                debug!("name: {}", name);
                user.name = truncated_copy(name);
            }
            "displayName" => {
                let display_name = map.read_text()?;
                debug!("displayName: {}", display_name);
                user.display_name = truncated_copy(display_name);
            }
            "icon" => user.icon = truncated_copy(map.read_text()?),
            _ => map.skip_value()?,
        }
    }
    Ok(user)
}

/// Returns `true` if this entry is `{"type": "public-key", "alg": -7}`.
fn parse_pub_key_cred_param(map: &mut Cursor) -> Result<bool, Ctap2Error> {
    let len = map.enter_map()?;
    let mut is_public_key = false;
    let mut alg = None;
    for _ in 0..len {
        let key = map.read_text()?;
        match key {
            "type" => is_public_key = map.read_text()? == "public-key",
            "alg" => alg = Some(map.read_integer()?),
            _ => map.skip_value()?,
        }
    }
    Ok(is_public_key && alg == Some(COSE_ALG_ES256))
}

fn parse_pub_key_cred_params(map: &mut Cursor) -> Result<(), Ctap2Error> {
    let len = map.enter_array()?;
    for i in 0..len {
        if parse_pub_key_cred_param(map)? {
            // Still have to consume the rest of the array so the outer
            // cursor stays aligned with the key/value stream.
            let remaining = len - i - 1;
            for _ in 0..remaining {
                map.skip_value()?;
            }
            return Ok(());
        }
    }
    Err(Ctap2Error::UnsupportedAlgorithm)
}

/// Validate every element is `{"id": bytes, "type": "public-key", ...}`
/// without retaining them; shared between `excludeList` and `allowList`.
fn validate_credential_descriptor_list(data: &[u8], offset: usize, count: u64) -> Result<(), Ctap2Error> {
    let mut cursor = Cursor::at(data, offset);
    for _ in 0..count {
        let len = cursor.enter_map()?;
        let mut has_id = false;
        let mut is_public_key = false;
        for _ in 0..len {
            let key = cursor.read_text()?;
            match key {
                "id" => {
                    cursor.read_bytes()?;
                    has_id = true;
                }
                "type" => is_public_key = cursor.read_text()? == "public-key",
                _ => cursor.skip_value()?,
            }
        }
        if !has_id {
            return Err(Ctap2Error::MissingParameter);
        }
        if !is_public_key {
            return Err(Ctap2Error::InvalidCredential);
        }
    }
    Ok(())
}

fn parse_options(map: &mut Cursor, has_rk: bool, has_up: bool) -> Result<Options, Ctap2Error> {
    let len = map.enter_map()?;
    let mut options = Options::default();
    for _ in 0..len {
        let key = map.read_text()?;
        // Every options value must be boolean regardless of whether the key
        // is one this operation recognizes; only recognized keys are stored.
        let value = map.read_bool()?;
        match key {
            "rk" if has_rk => {
                debug!("rk: {}", value);
                options.rk = value;
            }
            "uv" => {
                debug!("uv: {}", value);
                options.uv = value;
            }
            "up" if has_up => {
                debug!("up: {}", value);
                options.up = value;
            }
            _ => debug!("ignoring option {}", key),
        }
    }
    Ok(options)
}

/// `pinAuth` must be a byte string of exactly [`PIN_AUTH_SIZE`] bytes.
///
/// The original firmware's check here reads `if (type == byte string)
/// return error`, inverted from its evident intent the same way its
/// `pinProtocol` check is (see below) — this port requires a byte string,
/// as the field's own description says.
fn parse_pin_auth(map: &mut Cursor) -> Result<[u8; PIN_AUTH_SIZE], Ctap2Error> {
    let bytes = map.read_bytes()?;
    if bytes.len() != PIN_AUTH_SIZE {
        return Err(Ctap2Error::InvalidCbor);
    }
    let mut out = [0u8; PIN_AUTH_SIZE];
    out.copy_from_slice(bytes);
    Ok(out)
}

/// `pinProtocol` must be an integer equal to `1`.
///
/// Corrected per the re-architecture's explicit instruction: the original
/// source's check reads "if type is Integer -> error", which is inverted
/// from its evident intent (it should reject anything that is *not* an
/// integer). This port requires an integer and checks its value.
fn parse_pin_protocol(map: &mut Cursor) -> Result<i64, Ctap2Error> {
    let value = map.read_integer()?;
    debug!("pinProtocol: {}", value);
    if value != 1 {
        return Err(Ctap2Error::PinAuthInvalid);
    }
    Ok(value)
}

pub fn parse_make_credential(data: &[u8], hash: RpIdHasher) -> Result<MakeCredentialRequest, Ctap2Error> {
    debug_now!("CTAP2.MC");
    let mut cursor = Cursor::new(data);
    let entries = cursor.enter_map()?;

    let mut req = MakeCredentialRequest {
        client_data_hash: [0; CLIENT_DATA_HASH_SIZE],
        rp_id_hash: [0; 32],
        rp_id_debug: String::new(),
        user: UserEntity::default(),
        exclude_list: None,
        options: Options::default(),
        pin_auth: None,
        pin_protocol: None,
        parsed_params: ParsedParams::empty(),
    };

    for _ in 0..entries {
        let key = cursor.read_integer()?;
        match key {
            MC_CLIENT_DATA_HASH => {
                debug!("clientDataHash");
                let bytes = cursor.read_bytes()?;
                if bytes.len() != CLIENT_DATA_HASH_SIZE {
                    return Err(Ctap2Error::InvalidCbor);
                }
                req.client_data_hash.copy_from_slice(bytes);
                req.parsed_params |= ParsedParams::CLIENT_DATA_HASH;
            }
            MC_RP => {
                debug!("rp");
                let (rp_id_hash, rp_id_debug) = parse_rp(&mut cursor, hash)?;
                req.rp_id_hash = rp_id_hash;
                req.rp_id_debug = rp_id_debug;
                req.parsed_params |= ParsedParams::RP_ID;
            }
            MC_USER => {
                debug!("user");
                req.user = parse_user(&mut cursor)?;
                req.parsed_params |= ParsedParams::USER;
            }
            MC_PUB_KEY_CRED_PARAMS => {
                debug!("pubKeyCredParams");
                parse_pub_key_cred_params(&mut cursor)?;
                req.parsed_params |= ParsedParams::PUB_KEY_CRED_PARAMS;
            }
            MC_EXCLUDE_LIST => {
                debug!("excludeList");
                let count = cursor.enter_array()?;
                let offset = cursor.position();
                validate_credential_descriptor_list(data, offset, count)?;
                let mut after = Cursor::at(data, offset);
                for _ in 0..count {
                    after.skip_value()?;
                }
                req.exclude_list = Some(CredentialListRef {
                    offset,
                    length: after.position() - offset,
                    count,
                });
                cursor = after;
                req.parsed_params |= ParsedParams::CREDENTIAL_LIST;
            }
            MC_EXTENSIONS => {
                debug!("ignoring extensions");
                cursor.skip_value()?;
            }
            MC_OPTIONS => {
                debug!("options");
                req.options = parse_options(&mut cursor, true, false)?;
                req.parsed_params |= ParsedParams::OPTIONS;
            }
            MC_PIN_AUTH => {
                debug!("pinAuth");
                req.pin_auth = Some(parse_pin_auth(&mut cursor)?);
                req.parsed_params |= ParsedParams::PIN_AUTH;
            }
            MC_PIN_PROTOCOL => {
                req.pin_protocol = Some(parse_pin_protocol(&mut cursor)?);
                req.parsed_params |= ParsedParams::PIN_PROTOCOL;
            }
            _ => {
                debug!("unknown key: {}", key);
                cursor.skip_value()?;
            }
        }
    }

    if req.parsed_params.contains(ParsedParams::PIN_AUTH)
        && !req.parsed_params.contains(ParsedParams::PIN_PROTOCOL)
    {
        return Err(Ctap2Error::PinAuthInvalid);
    }

    Ok(req)
}

pub fn parse_get_assertion(data: &[u8], hash: RpIdHasher) -> Result<GetAssertionRequest, Ctap2Error> {
    debug_now!("CTAP2.GA");
    let mut cursor = Cursor::new(data);
    let entries = cursor.enter_map()?;

    let mut req = GetAssertionRequest {
        client_data_hash: [0; CLIENT_DATA_HASH_SIZE],
        rp_id_hash: [0; 32],
        rp_id_debug: String::new(),
        allow_list: None,
        options: Options::default(),
        pin_auth: None,
        pin_protocol: None,
        parsed_params: ParsedParams::empty(),
    };

    for _ in 0..entries {
        let key = cursor.read_integer()?;
        match key {
            GA_RP_ID => {
                let id = cursor.read_text()?;
                debug!("rpId: {}", id);
                req.rp_id_hash = hash(id.as_bytes());
                req.rp_id_debug = truncated_copy(id);
                req.parsed_params |= ParsedParams::RP_ID;
            }
            GA_CLIENT_DATA_HASH => {
                debug!("clientDataHash");
                let bytes = cursor.read_bytes()?;
                if bytes.len() != CLIENT_DATA_HASH_SIZE {
                    return Err(Ctap2Error::InvalidCbor);
                }
                req.client_data_hash.copy_from_slice(bytes);
                req.parsed_params |= ParsedParams::CLIENT_DATA_HASH;
            }
            GA_ALLOW_LIST => {
                debug!("allowList");
                let count = cursor.enter_array()?;
                let offset = cursor.position();
                validate_credential_descriptor_list(data, offset, count)?;
                let mut after = Cursor::at(data, offset);
                for _ in 0..count {
                    after.skip_value()?;
                }
                req.allow_list = Some(CredentialListRef {
                    offset,
                    length: after.position() - offset,
                    count,
                });
                cursor = after;
                req.parsed_params |= ParsedParams::CREDENTIAL_LIST;
            }
            GA_EXTENSIONS => {
                debug!("ignoring extensions");
                cursor.skip_value()?;
            }
            GA_OPTIONS => {
                debug!("options");
                req.options = parse_options(&mut cursor, false, true)?;
                req.parsed_params |= ParsedParams::OPTIONS;
            }
            GA_PIN_AUTH => {
                debug!("pinAuth");
                req.pin_auth = Some(parse_pin_auth(&mut cursor)?);
                req.parsed_params |= ParsedParams::PIN_AUTH;
            }
            GA_PIN_PROTOCOL => {
                req.pin_protocol = Some(parse_pin_protocol(&mut cursor)?);
                req.parsed_params |= ParsedParams::PIN_PROTOCOL;
            }
            _ => {
                debug!("unknown key: {}", key);
                cursor.skip_value()?;
            }
        }
    }

    if req.parsed_params.contains(ParsedParams::PIN_AUTH)
        && !req.parsed_params.contains(ParsedParams::PIN_PROTOCOL)
    {
        return Err(Ctap2Error::PinAuthInvalid);
    }

    Ok(req)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_hash(input: &[u8]) -> [u8; 32] {
        // Deterministic, non-cryptographic stand-in so unit tests don't
        // depend on a SHA-256 crate; `sha2` (dev-dependency) is used in
        // the round-trip test below where the actual digest matters.
        let mut out = [0u8; 32];
        for (i, b) in input.iter().enumerate() {
            out[i % 32] ^= *b;
        }
        out
    }

    fn cbor_text(s: &str) -> std::vec::Vec<u8> {
        let mut out = vec![0x60 | s.len() as u8];
        out.extend_from_slice(s.as_bytes());
        out
    }

    fn minimal_make_credential() -> std::vec::Vec<u8> {
        let mut body = vec![0xA4]; // map of 4

        body.push(0x01); // clientDataHash
        body.push(0x58);
        body.push(32);
        body.extend_from_slice(&[0xAA; 32]);

        body.push(0x02); // rp
        body.push(0xA1);
        body.extend_from_slice(&cbor_text("id"));
        body.extend_from_slice(&cbor_text("example.com"));

        body.push(0x03); // user
        body.push(0xA1);
        body.extend_from_slice(&cbor_text("id"));
        body.push(0x50); // 16-byte string
        body.extend_from_slice(&[0x01; 16]);

        body.push(0x04); // pubKeyCredParams
        body.push(0x81);
        body.push(0xA2);
        body.extend_from_slice(&cbor_text("alg"));
        body.push(0x26); // -7
        body.extend_from_slice(&cbor_text("type"));
        body.extend_from_slice(&cbor_text("public-key"));

        body
    }

    #[test]
    fn minimal_make_credential_happy_path() {
        let body = minimal_make_credential();
        let mut hasher = stub_hash;
        let req = parse_make_credential(&body, &mut hasher).unwrap();
        assert!(req.parsed_params.contains(ParsedParams::CLIENT_DATA_HASH));
        assert!(req.parsed_params.contains(ParsedParams::RP_ID));
        assert!(req.parsed_params.contains(ParsedParams::USER));
        assert!(req.parsed_params.contains(ParsedParams::PUB_KEY_CRED_PARAMS));
        assert_eq!(req.rp_id_hash, stub_hash(b"example.com"));
        assert_eq!(&req.user.id[..], &[0x01; 16]);
    }

    #[test]
    fn pin_auth_without_pin_protocol_is_rejected() {
        let mut body = minimal_make_credential();
        body[0] = 0xA5; // now 5 entries
        body.push(0x08); // pinAuth
        body.push(0x50); // 16-byte string
        body.extend_from_slice(&[0x42; 16]);

        let mut hasher = stub_hash;
        let err = parse_make_credential(&body, &mut hasher).unwrap_err();
        assert_eq!(err, Ctap2Error::PinAuthInvalid);
    }

    #[test]
    fn pin_auth_with_pin_protocol_succeeds() {
        let mut body = minimal_make_credential();
        body[0] = 0xA6;
        body.push(0x08);
        body.push(0x50);
        body.extend_from_slice(&[0x42; 16]);
        body.push(0x09);
        body.push(0x01);

        let mut hasher = stub_hash;
        let req = parse_make_credential(&body, &mut hasher).unwrap();
        assert_eq!(req.pin_auth, Some([0x42; 16]));
        assert_eq!(req.pin_protocol, Some(1));
    }

    #[test]
    fn non_canonical_length_is_rejected() {
        let mut body = minimal_make_credential();
        // Corrupt clientDataHash's length prefix to a non-canonical form:
        // 0x59 0x00 0x20 instead of the canonical 0x58 0x20.
        let pos = body.iter().position(|&b| b == 0x58).unwrap();
        body[pos] = 0x59;
        body.insert(pos + 1, 0x00);

        let mut hasher = stub_hash;
        assert!(parse_make_credential(&body, &mut hasher).is_err());
    }

    #[test]
    fn exclude_list_rejects_non_public_key_type() {
        let mut body = vec![0xA1];
        body.push(0x05); // excludeList
        body.push(0x81);
        body.push(0xA2);
        body.extend_from_slice(&cbor_text("id"));
        body.push(0x41);
        body.push(0x00);
        body.extend_from_slice(&cbor_text("type"));
        body.extend_from_slice(&cbor_text("not-a-key"));

        let mut hasher = stub_hash;
        let err = parse_make_credential(&body, &mut hasher).unwrap_err();
        assert_eq!(err, Ctap2Error::InvalidCredential);
    }

    #[test]
    fn get_assertion_minimal_happy_path() {
        let mut body = vec![0xA2];
        body.push(0x01); // rpId
        body.extend_from_slice(&cbor_text("example.com"));
        body.push(0x02); // clientDataHash
        body.push(0x58);
        body.push(32);
        body.extend_from_slice(&[0xBB; 32]);

        let mut hasher = stub_hash;
        let req = parse_get_assertion(&body, &mut hasher).unwrap();
        assert!(req.parsed_params.contains(ParsedParams::RP_ID));
        assert_eq!(req.rp_id_hash, stub_hash(b"example.com"));
    }

    #[test]
    fn unsupported_algorithm_is_rejected() {
        let mut body = vec![0xA1];
        body.push(0x04);
        body.push(0x81);
        body.push(0xA2);
        body.extend_from_slice(&cbor_text("alg"));
        body.push(0x38);
        body.push(0x18); // -25, unsupported
        body.extend_from_slice(&cbor_text("type"));
        body.extend_from_slice(&cbor_text("public-key"));

        let mut hasher = stub_hash;
        let err = parse_make_credential(&body, &mut hasher).unwrap_err();
        assert_eq!(err, Ctap2Error::UnsupportedAlgorithm);
    }

    fn cbor_bytes_any(major_offset: u8, bytes: &[u8]) -> std::vec::Vec<u8> {
        let mut out = std::vec::Vec::new();
        if bytes.len() < 24 {
            out.push(major_offset | bytes.len() as u8);
        } else {
            out.push(major_offset | 24);
            out.push(bytes.len() as u8);
        }
        out.extend_from_slice(bytes);
        out
    }

    fn make_credential_with(rp_id: &str, user_id: &[u8]) -> std::vec::Vec<u8> {
        let mut body = vec![0xA3]; // map of 3: rp, user, clientDataHash

        body.push(0x01);
        body.push(0x58);
        body.push(32);
        body.extend_from_slice(&[0x11; 32]);

        body.push(0x02);
        body.push(0xA1);
        body.extend(cbor_bytes_any(0x60, b"id"));
        body.extend(cbor_bytes_any(0x60, rp_id.as_bytes()));

        body.push(0x03);
        body.push(0xA1);
        body.extend(cbor_bytes_any(0x60, b"id"));
        body.extend(cbor_bytes_any(0x40, user_id));

        body
    }

    quickcheck::quickcheck! {
        /// Round-trip (spec §8, property 3): any well-formed makeCredential
        /// whose `rp.id` and `user.id` sit within bounds parses back to the
        /// exact bytes that were encoded.
        fn parse_recovers_rp_and_user_id(rp_id_seed: std::vec::Vec<u8>, user_id: std::vec::Vec<u8>) -> bool {
            let rp_id: std::string::String = rp_id_seed
                .into_iter()
                .map(|b| (b'a' + b % 26) as char)
                .take(40)
                .collect();
            let rp_id = if rp_id.is_empty() { "x".to_string() } else { rp_id };
            let user_id: std::vec::Vec<u8> = user_id.into_iter().take(USER_ID_MAX_SIZE).collect();

            let body = make_credential_with(&rp_id, &user_id);
            let mut hasher = stub_hash;
            let req = match parse_make_credential(&body, &mut hasher) {
                Ok(req) => req,
                Err(_) => return false,
            };
            req.rp_id_hash == stub_hash(rp_id.as_bytes()) && &req.user.id[..] == &user_id[..]
        }
    }

    #[test]
    fn real_sha256_matches_independent_computation() {
        use sha2::{Digest, Sha256};
        let mut hasher = |input: &[u8]| -> [u8; 32] {
            let mut h = Sha256::new();
            h.update(input);
            h.finalize().into()
        };
        let body = minimal_make_credential();
        let req = parse_make_credential(&body, &mut hasher).unwrap();

        let mut expected = Sha256::new();
        expected.update(b"example.com");
        let expected: [u8; 32] = expected.finalize().into();
        assert_eq!(req.rp_id_hash, expected);
    }
}
