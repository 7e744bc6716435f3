//! Text record (Well-Known type `T`) payload decoding and synthesis.
//!
//! The payload starts with a status byte: bit 7 selects the encoding, bit 6
//! is reserved and must be zero, bits 5..0 give the length of the language
//! tag that follows. The rest is the text itself.

use alloc::string::String;
use alloc::vec::Vec;

use super::well_known::BuildError;
use super::{Record, Rtd};

const STATUS_UTF16: u8 = 0x80;
const STATUS_RESERVED: u8 = 0x40;
const STATUS_LANG_MASK: u8 = 0x3F;

/// Text payload encoding selected by the status byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TextEncoding {
    Utf8,
    Utf16,
}

/// Decoded fields of a Text record.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TextInfo {
    /// IANA language tag, at most 63 ASCII characters.
    pub lang: heapless::String<63>,
    /// The text, transcoded to UTF-8 if the payload carried UTF-16.
    pub text: String,
    /// The on-wire encoding of the text.
    pub encoding: TextEncoding,
}

fn lang_byte_ok(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-'
}

/// Decodes a Text record payload, or rejects it so the caller can fall back
/// to the generic representation.
pub(crate) fn decode(payload: &[u8]) -> Option<TextInfo> {
    let (&status, rest) = payload.split_first()?;
    if status & STATUS_RESERVED != 0 {
        trace!("text status byte has the reserved bit set");
        return None;
    }
    let lang_len = (status & STATUS_LANG_MASK) as usize;
    if lang_len > rest.len() {
        trace!("text language tag is longer than the payload");
        return None;
    }
    let (lang_bytes, text_bytes) = rest.split_at(lang_len);
    if !lang_bytes.iter().copied().all(lang_byte_ok) {
        trace!("text language tag has characters outside its alphabet");
        return None;
    }
    // Charset checked above, the tag is valid ASCII.
    let mut lang = heapless::String::new();
    lang.push_str(core::str::from_utf8(lang_bytes).ok()?).ok()?;

    let (encoding, text) = if status & STATUS_UTF16 != 0 {
        (TextEncoding::Utf16, decode_utf16(text_bytes)?)
    } else {
        (TextEncoding::Utf8, String::from(core::str::from_utf8(text_bytes).ok()?))
    };
    Some(TextInfo { lang, text, encoding })
}

/// UTF-16 with an optional BOM; big-endian when there is none.
fn decode_utf16(bytes: &[u8]) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let (bytes, be) = match bytes {
        [0xFE, 0xFF, rest @ ..] => (rest, true),
        [0xFF, 0xFE, rest @ ..] => (rest, false),
        _ => (bytes, true),
    };
    let units = bytes.chunks_exact(2).map(|pair| {
        if be {
            u16::from_be_bytes([pair[0], pair[1]])
        } else {
            u16::from_le_bytes([pair[0], pair[1]])
        }
    });
    char::decode_utf16(units).collect::<Result<String, _>>().ok()
}

impl Record {
    /// Builds a single-record Text message: status byte, language tag, then
    /// the text in the requested encoding (UTF-16 is written big-endian).
    pub fn new_text(text: &str, lang: &str, encoding: TextEncoding) -> Result<Record, BuildError> {
        if lang.len() > STATUS_LANG_MASK as usize || !lang.bytes().all(lang_byte_ok) {
            return Err(BuildError::InvalidLanguage);
        }
        let mut payload = Vec::with_capacity(1 + lang.len() + text.len());
        let mut status = lang.len() as u8;
        if encoding == TextEncoding::Utf16 {
            status |= STATUS_UTF16;
        }
        payload.push(status);
        payload.extend_from_slice(lang.as_bytes());
        match encoding {
            TextEncoding::Utf8 => payload.extend_from_slice(text.as_bytes()),
            TextEncoding::Utf16 => {
                for unit in text.encode_utf16() {
                    payload.extend_from_slice(&unit.to_be_bytes());
                }
            }
        }
        Record::new_well_known(Rtd::Text, b"T", &payload)
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::{decode, TextEncoding};
    use crate::record::well_known::BuildError;
    use crate::record::Record;

    #[test]
    fn test_decode_utf8() {
        let info = decode(&hex!("02 65 6E 48 69")).unwrap();
        assert_eq!(info.lang.as_str(), "en");
        assert_eq!(info.text, "Hi");
        assert_eq!(info.encoding, TextEncoding::Utf8);
    }

    #[test]
    fn test_decode_rejects_reserved_bit() {
        assert!(decode(&hex!("42 65 6E 48 69")).is_none());
        assert!(decode(&hex!("FF 65 6E")).is_none());
    }

    #[test]
    fn test_decode_rejects_oversized_language_tag() {
        // Claims a 5-byte tag inside a 2-byte remainder.
        assert!(decode(&hex!("05 65 6E")).is_none());
    }

    #[test]
    fn test_decode_rejects_empty_payload() {
        assert!(decode(&[]).is_none());
    }

    #[test]
    fn test_decode_rejects_bad_language_characters() {
        assert!(decode(&hex!("02 65 20 48 69")).is_none());
    }

    #[test]
    fn test_decode_rejects_invalid_utf8_text() {
        assert!(decode(&hex!("02 65 6E FF FE")).is_none());
    }

    #[test]
    fn test_decode_utf16_default_big_endian() {
        let info = decode(&hex!("82 65 6E 00 48 00 69")).unwrap();
        assert_eq!(info.text, "Hi");
        assert_eq!(info.encoding, TextEncoding::Utf16);
    }

    #[test]
    fn test_decode_utf16_with_byte_order_marks() {
        let be = decode(&hex!("82 65 6E FE FF 00 48 00 69")).unwrap();
        assert_eq!(be.text, "Hi");
        let le = decode(&hex!("82 65 6E FF FE 48 00 69 00")).unwrap();
        assert_eq!(le.text, "Hi");
    }

    #[test]
    fn test_decode_rejects_odd_utf16_length() {
        assert!(decode(&hex!("82 65 6E 00 48 00")).is_none());
    }

    #[test]
    fn test_decode_rejects_unpaired_surrogate() {
        assert!(decode(&hex!("82 65 6E D8 00")).is_none());
    }

    #[test]
    fn test_new_text_matches_wire_image() {
        let rec = Record::new_text("Hi", "en", TextEncoding::Utf8).unwrap();
        assert_eq!(rec.raw(), hex!("D1 01 05 54 02 65 6E 48 69"));
        let info = rec.as_text().unwrap();
        assert_eq!(info.lang.as_str(), "en");
        assert_eq!(info.text, "Hi");
    }

    #[test]
    fn test_new_text_utf16_round_trips() {
        let rec = Record::new_text("Hör", "de-DE", TextEncoding::Utf16).unwrap();
        let parsed = Record::parse(rec.raw()).unwrap();
        let info = parsed.as_text().unwrap();
        assert_eq!(info.lang.as_str(), "de-DE");
        assert_eq!(info.text, "Hör");
        assert_eq!(info.encoding, TextEncoding::Utf16);
    }

    #[test]
    fn test_new_text_rejects_bad_language_tags() {
        assert_eq!(
            Record::new_text("Hi", "e n", TextEncoding::Utf8).unwrap_err(),
            BuildError::InvalidLanguage
        );
        let long = "a".repeat(64);
        assert_eq!(
            Record::new_text("Hi", &long, TextEncoding::Utf8).unwrap_err(),
            BuildError::InvalidLanguage
        );
    }
}
