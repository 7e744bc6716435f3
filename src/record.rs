//! NDEF record model, framing and chain assembly.

pub mod text;
pub mod uri;
pub mod well_known;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::ops::Range;

use packed_struct::prelude::*;

use crate::cursor::Cursor;
use crate::tlv::{Tag, TlvScanner};
use crate::ParseError;

use self::text::TextInfo;
use self::uri::UriInfo;

// Record header bit layout, MSB first: MB ME CF SR IL TNF(3).
pub(crate) const HDR_MB: u8 = 0x80;
pub(crate) const HDR_ME: u8 = 0x40;
pub(crate) const HDR_CF: u8 = 0x20;
pub(crate) const HDR_SR: u8 = 0x10;
pub(crate) const HDR_IL: u8 = 0x08;

/// Declared payload lengths at or above this value are rejected as garbage.
const PAYLOAD_LEN_CAP: u64 = 0x8000_0000;

/// Type Name Format field, the 3-bit enum describing how to interpret the
/// record type bytes.
#[derive(PrimitiveEnum_u8, Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TypeNameFormat {
    /// Record carries no type, id or payload.
    Empty = 0x00,
    /// Type is a Record Type Definition name assigned by the NFC Forum.
    WellKnown = 0x01,
    /// Type is a MIME media type (RFC 2046).
    MediaType = 0x02,
    /// Type is an absolute URI (RFC 3986).
    AbsoluteUri = 0x03,
    /// Type is an NFC Forum external type name.
    External = 0x04,
    Unknown = 0x05,
    /// Type is carried by the first chunk of a chunked record.
    Unchanged = 0x06,
    /// Out-of-range sentinel; normalized to [`Unknown`](Self::Unknown) on
    /// records.
    Reserved = 0x07,
}

/// One-byte NDEF record header.
#[derive(PackedStruct, PartialEq, Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packed_struct(size_bytes = "1", bit_numbering = "lsb0")]
pub struct RecordHeader {
    /// How to interpret the type field.
    #[packed_field(bits = "0..3", ty = "enum")]
    pub tnf: TypeNameFormat,
    /// An ID length field is present.
    #[packed_field(bits = "3")]
    pub id_present: bool,
    /// Short record: the payload length field is one byte instead of four.
    #[packed_field(bits = "4")]
    pub short: bool,
    /// The payload is one chunk of a chunked record.
    #[packed_field(bits = "5")]
    pub chunk: bool,
    /// Last record in the message.
    #[packed_field(bits = "6")]
    pub message_end: bool,
    /// First record in the message.
    #[packed_field(bits = "7")]
    pub message_begin: bool,
}

impl RecordHeader {
    /// The wire byte.
    pub(crate) fn to_byte(&self) -> u8 {
        let mut b = self.tnf.to_primitive();
        if self.id_present {
            b |= HDR_IL;
        }
        if self.short {
            b |= HDR_SR;
        }
        if self.chunk {
            b |= HDR_CF;
        }
        if self.message_end {
            b |= HDR_ME;
        }
        if self.message_begin {
            b |= HDR_MB;
        }
        b
    }
}

/// Record Type Definition tag derived from the TNF and type bytes.
///
/// Only URI and Text payloads are interpreted; the remaining tags mark the
/// type as recognized without decoding its inner structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rtd {
    /// No Well-Known type matched.
    Unknown,
    /// `U` - URI record.
    Uri,
    /// `T` - Text record.
    Text,
    /// `Sp` - Smart Poster.
    SmartPoster,
    /// `Hs` - Handover Select.
    HandoverSelect,
    /// `Hr` - Handover Request.
    HandoverRequest,
    /// `Hc` - Handover Carrier.
    HandoverCarrier,
    /// `ac` - Alternative Carrier.
    AlternativeCarrier,
    /// `cr` - Collision Resolution.
    CarrierReference,
    /// `err` - Handover error record.
    Error,
}

/// Decoded payload of a recognized Well-Known record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Info {
    /// No specialized decoder applied; only the raw views are available.
    Generic,
    Uri(UriInfo),
    Text(TextInfo),
}

/// Framer scratch: one record's on-wire image plus the offsets needed to
/// slice it. Consumed by the factory, never stored.
#[derive(Debug)]
struct RawRecord<'a> {
    header: RecordHeader,
    rec: &'a [u8],
    type_off: usize,
    type_len: usize,
    id_len: usize,
    payload_len: usize,
}

impl<'a> RawRecord<'a> {
    /// Frames exactly one record, advancing the cursor past it.
    fn parse(cur: &mut Cursor<'a>) -> Result<Self, ParseError> {
        // At least 3 bytes are required for anything meaningful.
        if cur.remaining() < 3 {
            debug!("block is too short to be an ndef record");
            return Err(ParseError::ShortInput);
        }
        let header = RecordHeader::unpack(&[cur.peek(0)?]).map_err(|_| ParseError::Garbage)?;
        let type_len = cur.peek(1)? as usize;
        let mut off = 2;

        let payload_len = if header.short {
            let len = u64::from(cur.peek(off)?);
            off += 1;
            len
        } else {
            let mut be = [0u8; 4];
            for (i, b) in be.iter_mut().enumerate() {
                *b = cur.peek(off + i)?;
            }
            off += 4;
            u64::from(u32::from_be_bytes(be))
        };
        if payload_len >= PAYLOAD_LEN_CAP {
            debug!("garbage, payload length out of range");
            return Err(ParseError::Garbage);
        }
        let id_len = if header.id_present {
            let len = cur.peek(off)? as usize;
            off += 1;
            len
        } else {
            0
        };

        // Widened sum; the total must not wrap before the bounds check.
        let total = off as u64 + type_len as u64 + id_len as u64 + payload_len;
        if total > cur.remaining() as u64 {
            debug!("garbage, lengths don't add up");
            return Err(ParseError::Garbage);
        }
        let rec = cur.take(total as usize)?;
        Ok(RawRecord {
            header,
            rec,
            type_off: off,
            type_len,
            id_len,
            payload_len: payload_len as usize,
        })
    }

    fn rec_type(&self) -> &'a [u8] {
        &self.rec[self.type_off..self.type_off + self.type_len]
    }

    fn payload(&self) -> &'a [u8] {
        let start = self.type_off + self.type_len + self.id_len;
        &self.rec[start..start + self.payload_len]
    }
}

/// One NDEF record, the head of an owning chain.
///
/// A record owns a deep copy of its on-wire image; the type, id and payload
/// accessors are views into that copy. Records are immutable once
/// constructed and dropping the head drops the whole chain.
#[derive(Debug)]
pub struct Record {
    tnf: TypeNameFormat,
    rtd: Rtd,
    first: bool,
    last: bool,
    raw: Vec<u8>,
    type_span: Range<usize>,
    id_span: Range<usize>,
    payload_span: Range<usize>,
    info: Info,
    next: Option<Box<Record>>,
}

impl Record {
    /// Parses a bare NDEF message into a record chain.
    ///
    /// Returns the head of the chain, or `None` if the block contains no
    /// parseable records. Framing stops at the first malformed record;
    /// records framed before it are kept. An empty block is the canonical
    /// empty message.
    pub fn parse(block: &[u8]) -> Option<Record> {
        if block.is_empty() {
            debug!("empty ndef message");
            return Some(Record::empty());
        }
        Record::link(Record::collect(block))
    }

    /// Parses a TLV stream, concatenating the chains of every NDEF Message
    /// value it carries.
    ///
    /// Message boundaries are not preserved: the resulting chain may carry a
    /// non-canonical MB/ME pattern.
    pub fn parse_tlv(stream: &[u8]) -> Option<Record> {
        let mut records = Vec::new();
        let mut scanner = TlvScanner::new(stream);
        loop {
            match scanner.next() {
                Ok(Some((Tag::NdefMessage, value))) => {
                    if value.is_empty() {
                        records.push(Record::empty());
                    } else {
                        records.append(&mut Record::collect(value));
                    }
                }
                Ok(Some(_)) => continue,
                Ok(None) => break,
                Err(e) => {
                    debug!("tlv stream stops: {}", e);
                    break;
                }
            }
        }
        Record::link(records)
    }

    /// Frames and decodes records until the block is exhausted or framing
    /// fails.
    fn collect(block: &[u8]) -> Vec<Record> {
        let mut records = Vec::new();
        let mut cur = Cursor::new(block);
        while !cur.is_empty() {
            let data = match RawRecord::parse(&mut cur) {
                Ok(data) => data,
                Err(e) => {
                    debug!("ndef chain stops: {}", e);
                    break;
                }
            };
            if data.header.chunk {
                warn!("chunked records are not supported");
                continue;
            }
            records.push(Record::from_raw(&data));
        }
        records
    }

    fn link(records: Vec<Record>) -> Option<Record> {
        let mut head = None;
        for mut rec in records.into_iter().rev() {
            rec.next = head.take().map(Box::new);
            head = Some(rec);
        }
        head
    }

    /// Dispatches on the type bytes to a specialized decoder, falling back
    /// to the generic representation when none accepts. TNF is not consulted
    /// for the comparison.
    fn from_raw(data: &RawRecord<'_>) -> Record {
        let rtype = data.rec_type();
        if rtype == b"U" {
            if let Some(info) = uri::decode(data.payload()) {
                debug!("uri record");
                return Record::init(data, Rtd::Uri, Info::Uri(info));
            }
        } else if rtype == b"T" {
            if let Some(info) = text::decode(data.payload()) {
                debug!("text record");
                return Record::init(data, Rtd::Text, Info::Text(info));
            }
        } else if rtype == b"Sp" {
            return Record::init(data, Rtd::SmartPoster, Info::Generic);
        } else if rtype == b"Hs" {
            return Record::init(data, Rtd::HandoverSelect, Info::Generic);
        } else if rtype == b"Hr" {
            return Record::init(data, Rtd::HandoverRequest, Info::Generic);
        } else if rtype == b"Hc" {
            return Record::init(data, Rtd::HandoverCarrier, Info::Generic);
        } else if rtype == b"ac" {
            return Record::init(data, Rtd::AlternativeCarrier, Info::Generic);
        } else if rtype == b"cr" {
            return Record::init(data, Rtd::CarrierReference, Info::Generic);
        } else if rtype == b"err" {
            return Record::init(data, Rtd::Error, Info::Generic);
        }
        Record::init(data, Rtd::Unknown, Info::Generic)
    }

    /// Shared initialization path for parsed and synthesized records: deep
    /// copies the image and computes the view spans. Every span lies within
    /// the copied image by construction.
    fn init(data: &RawRecord<'_>, rtd: Rtd, info: Info) -> Record {
        let tnf = match data.header.tnf {
            TypeNameFormat::Reserved => TypeNameFormat::Unknown,
            tnf => tnf,
        };
        let type_start = data.type_off;
        let id_start = type_start + data.type_len;
        let payload_start = id_start + data.id_len;
        Record {
            tnf,
            rtd,
            first: data.header.message_begin,
            last: data.header.message_end,
            raw: data.rec.to_vec(),
            type_span: type_start..id_start,
            id_span: id_start..payload_start,
            payload_span: payload_start..payload_start + data.payload_len,
            info,
            next: None,
        }
    }

    /// Canonical empty record: the minimal image of a single-record message
    /// with TNF Empty and no type, id or payload.
    fn empty() -> Record {
        let raw = [HDR_MB | HDR_ME | HDR_SR, 0x00, 0x00];
        Record {
            tnf: TypeNameFormat::Empty,
            rtd: Rtd::Unknown,
            first: true,
            last: true,
            raw: raw.to_vec(),
            type_span: 3..3,
            id_span: 3..3,
            payload_span: 3..3,
            info: Info::Generic,
            next: None,
        }
    }

    pub fn tnf(&self) -> TypeNameFormat {
        self.tnf
    }

    pub fn rtd(&self) -> Rtd {
        self.rtd
    }

    /// MB was set in the header.
    pub fn is_first(&self) -> bool {
        self.first
    }

    /// ME was set in the header.
    pub fn is_last(&self) -> bool {
        self.last
    }

    /// The record's full on-wire image.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The type bytes.
    pub fn record_type(&self) -> &[u8] {
        &self.raw[self.type_span.clone()]
    }

    /// The id bytes; empty unless the header carried an ID length field.
    pub fn id(&self) -> &[u8] {
        &self.raw[self.id_span.clone()]
    }

    /// The payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.raw[self.payload_span.clone()]
    }

    /// The decoded payload, if a specialized decoder accepted it.
    pub fn info(&self) -> &Info {
        &self.info
    }

    /// The decoded URI of a URI record.
    pub fn as_uri(&self) -> Option<&str> {
        match &self.info {
            Info::Uri(info) => Some(&info.uri),
            _ => None,
        }
    }

    /// The decoded fields of a Text record.
    pub fn as_text(&self) -> Option<&TextInfo> {
        match &self.info {
            Info::Text(info) => Some(info),
            _ => None,
        }
    }

    /// The following record of the same chain.
    pub fn next(&self) -> Option<&Record> {
        self.next.as_deref()
    }

    /// Iterates the chain starting from this record.
    pub fn iter(&self) -> Records<'_> {
        Records { next: Some(self) }
    }

    /// Number of records in the chain starting from this record.
    pub fn len(&self) -> usize {
        self.iter().count()
    }
}

impl Drop for Record {
    fn drop(&mut self) {
        // Unlink iteratively; dropping a long chain must not recurse.
        let mut next = self.next.take();
        while let Some(mut rec) = next {
            next = rec.next.take();
        }
    }
}

/// Iterator over a record chain, head first.
pub struct Records<'a> {
    next: Option<&'a Record>,
}

impl<'a> Iterator for Records<'a> {
    type Item = &'a Record;

    fn next(&mut self) -> Option<&'a Record> {
        let rec = self.next?;
        self.next = rec.next();
        Some(rec)
    }
}
