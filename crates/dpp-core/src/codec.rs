//! # Byte Decoding
//!
//! JSON-bearing artifacts arrive from arbitrary producers, some of which
//! emit a byte-order mark or UTF-16. Decoding attempts, in order:
//!
//! 1. UTF-8 with a leading BOM stripped (a BOM-less UTF-8 input passes here too)
//! 2. UTF-16 selected by its BOM
//! 3. UTF-16 without BOM, endianness inferred from where the zero bytes fall
//! 4. UTF-16 without BOM in the other endianness
//!
//! The first strict success wins. Unpaired surrogates and odd-length input
//! disqualify the UTF-16 candidates. A UTF-8 result containing NUL is
//! treated as BOM-less UTF-16 when one of the UTF-16 decodings succeeds.
//! Zero bytes at even offsets mean big-endian (ASCII high byte first),
//! zeros at odd offsets mean little-endian.

use serde_json::Value;

use crate::error::DecodeError;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];

#[derive(Clone, Copy)]
enum Endian {
    Little,
    Big,
}

/// Decode bytes into text.
pub fn decode_text(raw: &[u8]) -> Result<String, DecodeError> {
    let without_bom = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    if let Ok(text) = std::str::from_utf8(without_bom) {
        // BOM-less UTF-16 of ASCII text is also valid UTF-8, full of NULs.
        if !text.contains('\0') {
            return Ok(text.to_string());
        }
        return Ok(decode_utf16_bomless(raw).unwrap_or_else(|| text.to_string()));
    }

    if let Some(rest) = raw.strip_prefix(UTF16LE_BOM) {
        if let Some(text) = decode_utf16(rest, Endian::Little) {
            return Ok(text);
        }
    }
    if let Some(rest) = raw.strip_prefix(UTF16BE_BOM) {
        if let Some(text) = decode_utf16(rest, Endian::Big) {
            return Ok(text);
        }
    }

    decode_utf16_bomless(raw).ok_or(DecodeError { len: raw.len() })
}

/// Decode bytes into text and parse the result as JSON.
pub fn decode_json(raw: &[u8]) -> Result<Value, JsonDecodeError> {
    let text = decode_text(raw)?;
    Ok(serde_json::from_str(&text)?)
}

/// Failure to obtain a JSON value from raw bytes.
#[derive(Debug, thiserror::Error)]
pub enum JsonDecodeError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn decode_utf16_bomless(raw: &[u8]) -> Option<String> {
    let (first, second) = match likely_endian(raw) {
        Endian::Big => (Endian::Big, Endian::Little),
        Endian::Little => (Endian::Little, Endian::Big),
    };
    decode_utf16(raw, first).or_else(|| decode_utf16(raw, second))
}

fn likely_endian(raw: &[u8]) -> Endian {
    let (even, odd) = raw
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == 0)
        .fold((0usize, 0usize), |(even, odd), (i, _)| {
            if i % 2 == 0 {
                (even + 1, odd)
            } else {
                (even, odd + 1)
            }
        });
    if even > odd {
        Endian::Big
    } else {
        Endian::Little
    }
}

fn decode_utf16(raw: &[u8], endian: Endian) -> Option<String> {
    if raw.len() % 2 != 0 {
        return None;
    }
    let units = raw.chunks_exact(2).map(|pair| match endian {
        Endian::Little => u16::from_le_bytes([pair[0], pair[1]]),
        Endian::Big => u16::from_be_bytes([pair[0], pair[1]]),
    });
    char::decode_utf16(units).collect::<Result<String, _>>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16(text: &str, endian: Endian, bom: bool) -> Vec<u8> {
        let mut out = Vec::new();
        let units = if bom {
            std::iter::once(0xFEFF).chain(text.encode_utf16()).collect::<Vec<_>>()
        } else {
            text.encode_utf16().collect()
        };
        for u in units {
            match endian {
                Endian::Little => out.extend_from_slice(&u.to_le_bytes()),
                Endian::Big => out.extend_from_slice(&u.to_be_bytes()),
            }
        }
        out
    }

    #[test]
    fn test_plain_utf8() {
        assert_eq!(decode_text(b"{\"a\":1}").unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let mut raw = UTF8_BOM.to_vec();
        raw.extend_from_slice("{\"name\":\"Bøtte\"}".as_bytes());
        assert_eq!(decode_text(&raw).unwrap(), "{\"name\":\"Bøtte\"}");
    }

    #[test]
    fn test_utf16_with_bom_both_endiannesses() {
        let text = "{\"id\":\"example-1\"}";
        assert_eq!(decode_text(&utf16(text, Endian::Little, true)).unwrap(), text);
        assert_eq!(decode_text(&utf16(text, Endian::Big, true)).unwrap(), text);
    }

    #[test]
    fn test_utf16le_without_bom() {
        let text = "{\"id\":1}";
        assert_eq!(decode_text(&utf16(text, Endian::Little, false)).unwrap(), text);
    }

    #[test]
    fn test_utf16be_without_bom() {
        let text = "{\"id\":\"example-1\"}";
        let raw = utf16(text, Endian::Big, false);
        assert_eq!(decode_text(&raw).unwrap(), text);
        assert_eq!(decode_json(&raw).unwrap()["id"], "example-1");
    }

    #[test]
    fn test_utf16le_without_bom_non_ascii() {
        let text = "{\"name\":\"Bøtte\"}";
        let raw = utf16(text, Endian::Little, false);
        assert_eq!(decode_json(&raw).unwrap()["name"], "Bøtte");
    }

    #[test]
    fn test_undecodable_input_is_rejected() {
        // Odd length rules out UTF-16; 0xFF is never valid UTF-8.
        let err = decode_text(&[0xFF, 0xFF, 0xFF]).unwrap_err();
        assert_eq!(err.len, 3);
    }

    #[test]
    fn test_decode_json_reports_syntax_errors() {
        assert!(decode_json(b"{\"a\":").is_err());
        assert_eq!(decode_json(b"[1,2]").unwrap(), serde_json::json!([1, 2]));
    }
}
