//! Type-Length-Value framing used to embed NDEF messages in a byte stream.

use crate::cursor::Cursor;
use crate::ParseError;

/// TLV tags the scanner recognizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tag {
    /// Single-byte separator; carries no length or value.
    Null = 0x00,
    LockControl = 0x01,
    MemoryControl = 0x02,
    /// Carries one NDEF message as its value.
    NdefMessage = 0x03,
    Proprietary = 0xFD,
    /// Ends iteration.
    Terminator = 0xFE,
}

impl Tag {
    fn from_byte(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Tag::Null),
            0x01 => Some(Tag::LockControl),
            0x02 => Some(Tag::MemoryControl),
            0x03 => Some(Tag::NdefMessage),
            0xFD => Some(Tag::Proprietary),
            0xFE => Some(Tag::Terminator),
            _ => None,
        }
    }
}

/// Iterates the (tag, value) pairs of a TLV stream.
pub struct TlvScanner<'a> {
    cur: Cursor<'a>,
    done: bool,
}

impl<'a> TlvScanner<'a> {
    pub fn new(stream: &'a [u8]) -> Self {
        TlvScanner {
            cur: Cursor::new(stream),
            done: false,
        }
    }

    /// Returns the next recognized (tag, value) pair, or `None` once the
    /// stream hits a terminator tag or runs out.
    ///
    /// Null tags are bare separator bytes and are passed over. Tags outside
    /// the recognized set are skipped using their declared length.
    pub fn next(&mut self) -> Result<Option<(Tag, &'a [u8])>, ParseError> {
        while !self.done && !self.cur.is_empty() {
            let tag = self.cur.peek(0)?;
            self.cur.advance(1)?;
            if tag == Tag::Null as u8 {
                continue;
            }
            if tag == Tag::Terminator as u8 {
                break;
            }
            let len = self.value_len()?;
            let value = self.cur.take(len)?;
            match Tag::from_byte(tag) {
                Some(tag) => return Ok(Some((tag, value))),
                None => trace!("skipping unrecognized tlv tag {}", tag),
            }
        }
        self.done = true;
        Ok(None)
    }

    /// Decodes the one- or three-byte length form.
    fn value_len(&mut self) -> Result<usize, ParseError> {
        let first = self.cur.peek(0)?;
        self.cur.advance(1)?;
        if first < 0xFF {
            return Ok(first as usize);
        }
        let hi = self.cur.peek(0)?;
        let lo = self.cur.peek(1)?;
        self.cur.advance(2)?;
        let len = usize::from(hi) << 8 | usize::from(lo);
        if len < 0xFF {
            // The three-byte form is only valid for lengths the one-byte
            // form cannot express.
            return Err(ParseError::MalformedTlv);
        }
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::{Tag, TlvScanner};
    use crate::ParseError;

    #[test]
    fn test_emits_ndef_message_value() {
        let stream = [0x03, 0x03, 0xAA, 0xBB, 0xCC, 0xFE];
        let mut scanner = TlvScanner::new(&stream);
        assert_eq!(
            scanner.next().unwrap(),
            Some((Tag::NdefMessage, &[0xAA, 0xBB, 0xCC][..]))
        );
        assert_eq!(scanner.next().unwrap(), None);
        // The scanner stays finished.
        assert_eq!(scanner.next().unwrap(), None);
    }

    #[test]
    fn test_skips_null_and_unrecognized_tags() {
        let stream = [0x00, 0x00, 0x07, 0x02, 0xAA, 0xBB, 0x03, 0x01, 0xCC];
        let mut scanner = TlvScanner::new(&stream);
        assert_eq!(scanner.next().unwrap(), Some((Tag::NdefMessage, &[0xCC][..])));
        assert_eq!(scanner.next().unwrap(), None);
    }

    #[test]
    fn test_terminator_ends_iteration() {
        let stream = [0xFE, 0x03, 0x01, 0xAA];
        let mut scanner = TlvScanner::new(&stream);
        assert_eq!(scanner.next().unwrap(), None);
    }

    #[test]
    fn test_recognizes_control_tags() {
        let stream = [0x01, 0x01, 0x11, 0x02, 0x01, 0x22, 0xFD, 0x01, 0x33];
        let mut scanner = TlvScanner::new(&stream);
        assert_eq!(scanner.next().unwrap(), Some((Tag::LockControl, &[0x11][..])));
        assert_eq!(scanner.next().unwrap(), Some((Tag::MemoryControl, &[0x22][..])));
        assert_eq!(scanner.next().unwrap(), Some((Tag::Proprietary, &[0x33][..])));
        assert_eq!(scanner.next().unwrap(), None);
    }

    #[test]
    fn test_extended_length_form() {
        let mut stream = Vec::new();
        stream.extend_from_slice(&[0x03, 0xFF, 0x00, 0xFF]);
        stream.resize(stream.len() + 0xFF, 0x5A);
        let mut scanner = TlvScanner::new(&stream);
        let (tag, value) = scanner.next().unwrap().unwrap();
        assert_eq!(tag, Tag::NdefMessage);
        assert_eq!(value.len(), 0xFF);
    }

    #[test]
    fn test_extended_length_below_minimum_is_malformed() {
        let mut stream = Vec::new();
        stream.extend_from_slice(&[0x03, 0xFF, 0x00, 0xFE]);
        stream.resize(stream.len() + 0xFE, 0x5A);
        let mut scanner = TlvScanner::new(&stream);
        assert_eq!(scanner.next(), Err(ParseError::MalformedTlv));
    }

    #[test]
    fn test_truncated_value_is_short_input() {
        let stream = [0x03, 0x05, 0x01, 0x02];
        let mut scanner = TlvScanner::new(&stream);
        assert_eq!(scanner.next(), Err(ParseError::ShortInput));
    }

    #[test]
    fn test_missing_length_byte_is_short_input() {
        let stream = [0x03];
        let mut scanner = TlvScanner::new(&stream);
        assert_eq!(scanner.next(), Err(ParseError::ShortInput));
    }
}
