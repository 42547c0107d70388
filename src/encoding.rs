//! Named byte encodings for legacy string bodies.
//!
//! A legacy endpoint may return a string together with the name of the byte
//! encoding it should be written in. Turning that pair into bytes needs a
//! [`ByteEncoder`]. When an [`Environment`](crate::Environment) has none, only
//! UTF-8 can be produced and other encodings are passed on as text.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, Engine, GeneralPurpose, GeneralPurposeConfig};
use bytes::Bytes;

use crate::error::Error;

/// Encoding assumed when a legacy endpoint names none.
pub const DEFAULT_ENCODING: &str = "utf8";

pub trait ByteEncoder: Send + Sync + 'static {
    /// Encodes `text` as `encoding`. Unknown names fail with
    /// [`Error::UnsupportedEncoding`].
    fn encode(&self, text: &str, encoding: &str) -> Result<Bytes, Error>;
}

/// Is `encoding` a spelling of UTF-8?
pub fn is_utf8(encoding: &str) -> bool {
    matches!(encoding.to_ascii_lowercase().as_str(), "utf8" | "utf-8")
}

/// Encoder for the names Node-style buffers understand: `utf8`, `utf16le`
/// (`ucs2`), `latin1` (`binary`), `ascii`, `base64`, `base64url` and `hex`.
///
/// `base64*` and `hex` *decode* the text, so the string is the textual form
/// of the bytes to send. Decoding is lenient: `hex` stops at the first pair
/// that is not two hex digits, and `base64*` skips characters outside either
/// alphabet and stops at the first `=`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BufferEncoder;

const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

impl ByteEncoder for BufferEncoder {
    fn encode(&self, text: &str, encoding: &str) -> Result<Bytes, Error> {
        let bytes = match encoding.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => return Ok(Bytes::copy_from_slice(text.as_bytes())),
            "utf16le" | "utf-16le" | "ucs2" | "ucs-2" => text
                .encode_utf16()
                .flat_map(u16::to_le_bytes)
                .collect(),
            // One byte per UTF-16 unit, high bits dropped.
            "latin1" | "binary" | "ascii" => text
                .encode_utf16()
                .map(|unit| (unit & 0xff) as u8)
                .collect(),
            "base64" | "base64url" => decode_base64(text, encoding)?,
            "hex" => decode_hex(text),
            _ => return Err(Error::UnsupportedEncoding(encoding.to_owned())),
        };
        Ok(Bytes::from(bytes))
    }
}

fn decode_hex(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() / 2);
    for pair in text.as_bytes().chunks_exact(2) {
        let mut byte = [0u8; 1];
        if hex::decode_to_slice(pair, &mut byte).is_err() {
            break;
        }
        out.push(byte[0]);
    }
    out
}

/// Both alphabets are accepted whichever name was used.
fn decode_base64(text: &str, encoding: &str) -> Result<Vec<u8>, Error> {
    let mut compact: String = text
        .chars()
        .take_while(|&c| c != '=')
        .filter_map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '+' | '/' => Some(c),
            '-' => Some('+'),
            '_' => Some('/'),
            _ => None,
        })
        .collect();
    // A lone trailing symbol carries fewer than 8 bits.
    if compact.len() % 4 == 1 {
        compact.pop();
    }
    LENIENT_BASE64.decode(compact).map_err(|e| Error::InvalidBody {
        encoding: encoding.to_owned(),
        reason: e.to_string(),
    })
}
