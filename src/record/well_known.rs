//! Synthesis of single-record Well-Known messages.

use alloc::vec::Vec;

use thiserror::Error;

use super::{text, uri, Info, RawRecord, Record, RecordHeader, Rtd, TypeNameFormat};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BuildError {
    #[error("Type is too long, maximum length is 255 bytes")]
    TypeTooLong,
    #[error("Payload length must stay below 2 GiB")]
    PayloadTooLong,
    #[error("Language tag is too long or has characters outside its alphabet")]
    InvalidLanguage,
}

impl Record {
    /// Builds a single-record Well-Known message from its RTD tag, type
    /// bytes and payload.
    ///
    /// The byte image goes through the same initialization path as a parsed
    /// record, so the raw copy, view spans and MB=ME flags come out exactly
    /// as a re-parse would produce them. The short-record form is used
    /// whenever the payload fits in one length byte.
    ///
    /// The RTD tag is stored as given. A URI or Text payload the matching
    /// decoder rejects leaves the record in its generic representation, as
    /// on the parse side.
    pub fn new_well_known(rtd: Rtd, rec_type: &[u8], payload: &[u8]) -> Result<Record, BuildError> {
        if rec_type.len() > 0xFF {
            return Err(BuildError::TypeTooLong);
        }
        if payload.len() as u64 >= 0x8000_0000 {
            return Err(BuildError::PayloadTooLong);
        }
        let header = RecordHeader {
            tnf: TypeNameFormat::WellKnown,
            id_present: false,
            short: payload.len() <= 0xFF,
            chunk: false,
            message_end: true,
            message_begin: true,
        };

        let mut buf = Vec::with_capacity(6 + rec_type.len() + payload.len());
        buf.push(header.to_byte());
        buf.push(rec_type.len() as u8);
        if header.short {
            buf.push(payload.len() as u8);
        } else {
            buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        }
        let type_off = buf.len();
        buf.extend_from_slice(rec_type);
        buf.extend_from_slice(payload);

        let data = RawRecord {
            header,
            rec: &buf,
            type_off,
            type_len: rec_type.len(),
            id_len: 0,
            payload_len: payload.len(),
        };
        let info = match rtd {
            Rtd::Uri => uri::decode(payload).map_or(Info::Generic, Info::Uri),
            Rtd::Text => text::decode(payload).map_or(Info::Generic, Info::Text),
            _ => Info::Generic,
        };
        Ok(Record::init(&data, rtd, info))
    }
}
