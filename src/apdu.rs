//! Command/response unit codec.
//!
//! Decodes the four classic ISO-7816-4 command cases (no data/no response,
//! data only, response only, data and response), in both short (1-byte
//! length) and extended (3-byte length) form, into a [`Command`]. Encodes a
//! [`Response`] back into wire bytes with its trailing [`StatusWord`].

use heapless_bytes::Bytes;

use crate::status::StatusWord;

/// Maximum command/response data this crate will buffer. CTAP2 messages are
/// chunked by the transport long before they reach here, but extended-length
/// APDUs can in principle ask for up to 65535 bytes; we cap well below that
/// for a token's working memory.
pub const MAX_DATA_LENGTH: usize = 2048;

pub type CommandData = Bytes<MAX_DATA_LENGTH>;
pub type ResponseData = Bytes<MAX_DATA_LENGTH>;

/// Response data plus the trailing two-byte status word.
const MAX_RESPONSE_WIRE_LENGTH: usize = MAX_DATA_LENGTH + 2;
pub type ResponseWire = Bytes<MAX_RESPONSE_WIRE_LENGTH>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CodecError {
    /// Fewer than 4 header bytes, or a length field that runs past the end
    /// of the buffer.
    Truncated,
    /// `LC`/`LE` claimed more data than [`MAX_DATA_LENGTH`] allows.
    TooLarge,
}

/// A decoded command unit (CAPDU).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Command {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: CommandData,
    /// Expected response length (`LE`), 0 meaning "none requested" unless
    /// the extended-length `Le = 0x0000` case explicitly asked for the
    /// maximum (we normalize that to `MAX_DATA_LENGTH`).
    pub le: usize,
}

impl Command {
    /// Parse a raw command unit. Accepts case 1 (header only), case 2s/2e
    /// (Le only), case 3s/3e (Lc + data), and case 4s/4e (Lc + data + Le),
    /// choosing short vs. extended form by whether the first length byte is
    /// `0x00`, per ISO-7816-4.
    pub fn parse(raw: &[u8]) -> Result<Command, CodecError> {
        if raw.len() < 4 {
            return Err(CodecError::Truncated);
        }
        let (cla, ins, p1, p2) = (raw[0], raw[1], raw[2], raw[3]);
        let body = &raw[4..];

        if body.is_empty() {
            // Case 1: no data, no Le.
            return Ok(Command {
                cla,
                ins,
                p1,
                p2,
                data: CommandData::new(),
                le: 0,
            });
        }

        let extended = body[0] == 0x00 && body.len() > 1;

        if !extended {
            Self::parse_short(cla, ins, p1, p2, body)
        } else {
            Self::parse_extended(cla, ins, p1, p2, body)
        }
    }

    fn parse_short(
        cla: u8,
        ins: u8,
        p1: u8,
        p2: u8,
        body: &[u8],
    ) -> Result<Command, CodecError> {
        if body.len() == 1 {
            // Case 2s: Le only.
            return Ok(Command {
                cla,
                ins,
                p1,
                p2,
                data: CommandData::new(),
                le: normalize_short_le(body[0]),
            });
        }

        let lc = body[0] as usize;
        let rest = &body[1..];
        if rest.len() < lc {
            return Err(CodecError::Truncated);
        }
        let (data, tail) = rest.split_at(lc);
        let mut command_data = CommandData::new();
        command_data
            .extend_from_slice(data)
            .map_err(|_| CodecError::TooLarge)?;

        let le = match tail.len() {
            0 => 0,
            1 => normalize_short_le(tail[0]),
            _ => return Err(CodecError::Truncated),
        };

        Ok(Command {
            cla,
            ins,
            p1,
            p2,
            data: command_data,
            le,
        })
    }

    fn parse_extended(
        cla: u8,
        ins: u8,
        p1: u8,
        p2: u8,
        body: &[u8],
    ) -> Result<Command, CodecError> {
        // body[0] == 0x00; body[1..3] is Lc (big-endian), or this is case 2e
        // and body[1..3] is directly Le if body.len() == 3.
        if body.len() == 3 {
            let le = u16::from_be_bytes([body[1], body[2]]);
            return Ok(Command {
                cla,
                ins,
                p1,
                p2,
                data: CommandData::new(),
                le: normalize_extended_le(le),
            });
        }
        if body.len() < 3 {
            return Err(CodecError::Truncated);
        }
        let lc = u16::from_be_bytes([body[1], body[2]]) as usize;
        let rest = &body[3..];
        if rest.len() < lc {
            return Err(CodecError::Truncated);
        }
        let (data, tail) = rest.split_at(lc);
        let mut command_data = CommandData::new();
        command_data
            .extend_from_slice(data)
            .map_err(|_| CodecError::TooLarge)?;

        let le = match tail.len() {
            0 => 0,
            2 => normalize_extended_le(u16::from_be_bytes([tail[0], tail[1]])),
            _ => return Err(CodecError::Truncated),
        };

        Ok(Command {
            cla,
            ins,
            p1,
            p2,
            data: command_data,
            le,
        })
    }
}

fn normalize_short_le(byte: u8) -> usize {
    if byte == 0 {
        256
    } else {
        byte as usize
    }
}

fn normalize_extended_le(value: u16) -> usize {
    if value == 0 {
        MAX_DATA_LENGTH
    } else {
        value as usize
    }
}

/// A response unit (RAPDU): data followed by its status word.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Response {
    pub data: ResponseData,
    pub sw: StatusWord,
}

impl Response {
    pub fn ok(data: ResponseData) -> Response {
        Response {
            data,
            sw: StatusWord::NO_ERROR,
        }
    }

    pub fn status(sw: StatusWord) -> Response {
        Response {
            data: ResponseData::new(),
            sw,
        }
    }

    /// Serialize as wire bytes: data, then the two-byte status word.
    pub fn to_bytes(&self) -> ResponseWire {
        let mut out = Bytes::new();
        out.extend_from_slice(&self.data).ok();
        out.extend_from_slice(&self.sw.to_be_bytes()).ok();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case1_no_data_no_le() {
        let cmd = Command::parse(&[0x00, 0x20, 0x00, 0x00]).unwrap();
        assert_eq!(cmd.data.len(), 0);
        assert_eq!(cmd.le, 0);
    }

    #[test]
    fn case2s_le_only() {
        let cmd = Command::parse(&[0x00, 0xC0, 0x00, 0x00, 0x08]).unwrap();
        assert_eq!(cmd.le, 8);
    }

    #[test]
    fn case2s_le_zero_means_256() {
        let cmd = Command::parse(&[0x00, 0xC0, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(cmd.le, 256);
    }

    #[test]
    fn case3s_data_only() {
        let raw = [0x00, 0x20, 0x00, 0x00, 0x06, b'1', b'2', b'3', b'4', b'5', b'6'];
        let cmd = Command::parse(&raw).unwrap();
        assert_eq!(&cmd.data[..], b"123456");
        assert_eq!(cmd.le, 0);
    }

    #[test]
    fn case4s_data_and_le() {
        let raw = [0x00, 0x20, 0x00, 0x00, 0x04, 0xDE, 0xAD, 0xBE, 0xEF, 0x01];
        let cmd = Command::parse(&raw).unwrap();
        assert_eq!(&cmd.data[..], &[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(cmd.le, 1);
    }

    #[test]
    fn case3e_extended_data() {
        let mut raw = vec![0x00, 0x20, 0x00, 0x00, 0x00, 0x01, 0x00];
        raw.push(0xAB);
        let cmd = Command::parse(&raw).unwrap();
        assert_eq!(&cmd.data[..], &[0xAB]);
        assert_eq!(cmd.le, 0);
    }

    #[test]
    fn truncated_header_is_rejected() {
        assert_eq!(Command::parse(&[0x00, 0x20, 0x00]), Err(CodecError::Truncated));
    }

    #[test]
    fn lc_past_end_is_rejected() {
        let raw = [0x00, 0x20, 0x00, 0x00, 0x06, b'1', b'2'];
        assert_eq!(Command::parse(&raw), Err(CodecError::Truncated));
    }

    #[test]
    fn response_round_trips_status() {
        let resp = Response::status(StatusWord::pin_retries(2));
        let bytes = resp.to_bytes();
        assert_eq!(&bytes[..], &[0x63, 0xC2]);
    }
}
