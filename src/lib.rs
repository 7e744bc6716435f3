#![no_std]
#![deny(unused_must_use)]
//! # NDEF record codec
//!
//! This crate parses NFC Data Exchange Format (NDEF) messages into owned,
//! chained records, and synthesizes Well-Known records that carry the same
//! invariants as parsed ones.
//!
//! Two wire entry points are supported:
//! - a bare NDEF message (a sequence of records), and
//! - a TLV stream in which each NDEF Message value (tag `0x03`) wraps one
//!   message; their chains are concatenated in on-wire order.
//!
//! ## Features
//! - **URI records** (Well-Known type `U`): identifier-code prefix expansion.
//! - **Text records** (Well-Known type `T`): language tag plus UTF-8/UTF-16
//!   text.
//! - **Generic records** for everything else, with raw type/id/payload views.
//! - **Synthesis** of single-record Well-Known messages.
//!
//! ## Example Usage
//!
//! ```ignore
//! use nfc_ndef::record::Record;
//!
//! let chain = Record::parse_tlv(&tag_bytes).expect("no NDEF message found");
//! for rec in chain.iter() {
//!     if let Some(uri) = rec.as_uri() {
//!         println!("uri: {}", uri);
//!     }
//! }
//! ```
//!
//! ## Notes
//!
//! - Chunked records (CF set) are skipped with a warning; reassembly is out
//!   of scope.
//! - Smart-Poster and Handover types are recognized and tagged but their
//!   payloads are not interpreted.
//! - The codec is synchronous and allocation happens only for record objects
//!   and their owned raw copies.

extern crate alloc;

// This must go FIRST so that other mods see its macros.
mod fmt;

pub mod cursor;
pub mod record;
pub mod tlv;

pub use record::text::{TextEncoding, TextInfo};
pub use record::uri::UriInfo;
pub use record::well_known::BuildError;
pub use record::{Info, Record, Records, Rtd, TypeNameFormat};

use thiserror::Error;

/// Wire-level parse failures.
///
/// These propagate between the internal parser layers; the chain entry
/// points swallow them and report "no chain" instead.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    #[error("Input ended before a declared length could be read")]
    ShortInput,
    #[error("Declared lengths exceed the buffer")]
    Garbage,
    #[error("Inconsistent TLV length encoding")]
    MalformedTlv,
}
