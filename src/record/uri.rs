//! URI record (Well-Known type `U`) payload decoding and synthesis.

use alloc::string::String;
use alloc::vec::Vec;

use super::well_known::BuildError;
use super::{Record, Rtd};

/// URI identifier-code prefix table from the NDEF RTD specification.
///
/// The first payload byte indexes this table; the rest of the payload is
/// appended to the selected prefix. Index 0 and any index past the end of
/// the table prepend nothing.
pub const URI_PREFIXES: [&str; 36] = [
    "",
    "http://www.",
    "https://www.",
    "http://",
    "https://",
    "tel:",
    "mailto:",
    "ftp://anonymous:anonymous@",
    "ftp://ftp.",
    "ftps://",
    "sftp://",
    "smb://",
    "nfs://",
    "ftp://",
    "dav://",
    "news:",
    "telnet://",
    "imap:",
    "rtsp://",
    "urn:",
    "pop:",
    "sip:",
    "sips:",
    "tftp:",
    "btspp://",
    "btl2cap://",
    "btgoep://",
    "tcpobex://",
    "irdaobex://",
    "file://",
    "urn:epc:id:",
    "urn:epc:tag:",
    "urn:epc:pat:",
    "urn:epc:raw:",
    "urn:epc:",
    "urn:nfc:",
];

/// Decoded fields of a URI record.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UriInfo {
    /// The full URI, prefix already expanded.
    pub uri: String,
}

/// Decodes a URI record payload, or rejects it so the caller can fall back
/// to the generic representation.
///
/// An empty payload decodes to an empty URI. The tail after the identifier
/// code must be printable UTF-8.
pub(crate) fn decode(payload: &[u8]) -> Option<UriInfo> {
    let Some((&code, tail)) = payload.split_first() else {
        return Some(UriInfo { uri: String::new() });
    };
    let prefix = URI_PREFIXES.get(code as usize).copied().unwrap_or("");
    let Ok(tail) = core::str::from_utf8(tail) else {
        trace!("uri tail is not valid utf-8");
        return None;
    };
    if tail.chars().any(|c| c.is_control()) {
        trace!("uri tail contains control characters");
        return None;
    }
    let mut uri = String::with_capacity(prefix.len() + tail.len());
    uri.push_str(prefix);
    uri.push_str(tail);
    Some(UriInfo { uri })
}

/// Picks the longest table prefix the URI starts with.
fn abbreviate(uri: &str) -> (u8, &str) {
    let mut code = 0;
    let mut split = 0;
    for (i, prefix) in URI_PREFIXES.iter().enumerate().skip(1) {
        if prefix.len() > split && uri.starts_with(prefix) {
            code = i as u8;
            split = prefix.len();
        }
    }
    (code, &uri[split..])
}

impl Record {
    /// Builds a single-record URI message, compacting the scheme with the
    /// longest matching prefix from the identifier table.
    pub fn new_uri(uri: &str) -> Result<Record, BuildError> {
        let (code, tail) = abbreviate(uri);
        let mut payload = Vec::with_capacity(1 + tail.len());
        payload.push(code);
        payload.extend_from_slice(tail.as_bytes());
        Record::new_well_known(Rtd::Uri, b"U", &payload)
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::{abbreviate, decode};
    use crate::record::{Record, Rtd};

    #[test]
    fn test_decode_expands_prefix() {
        let info = decode(&hex!("01 6E 66 63 2D 66 6F 72 75 6D 2E 6F 72 67")).unwrap();
        assert_eq!(info.uri, "http://www.nfc-forum.org");
    }

    #[test]
    fn test_decode_empty_payload() {
        assert_eq!(decode(&[]).unwrap().uri, "");
    }

    #[test]
    fn test_decode_identifier_code_out_of_table() {
        assert_eq!(decode(&[0x24, b'x']).unwrap().uri, "x");
        assert_eq!(decode(&[0xFF, b'x']).unwrap().uri, "x");
    }

    #[test]
    fn test_decode_rejects_bad_tails() {
        // Not UTF-8.
        assert!(decode(&[0x00, 0xFF]).is_none());
        // Control character.
        assert!(decode(&[0x00, 0x07]).is_none());
    }

    #[test]
    fn test_abbreviate_prefers_longest_prefix() {
        assert_eq!(abbreviate("http://www.nfc.org"), (0x01, "nfc.org"));
        assert_eq!(abbreviate("http://nfc.org"), (0x03, "nfc.org"));
        assert_eq!(abbreviate("urn:epc:id:x"), (0x1E, "x"));
        assert_eq!(abbreviate("urn:nfc:sn"), (0x23, "sn"));
        assert_eq!(abbreviate("weird://x"), (0x00, "weird://x"));
    }

    #[test]
    fn test_new_uri_matches_wire_image() {
        let rec = Record::new_uri("http://www.nfc.org").unwrap();
        assert_eq!(rec.raw(), hex!("D1 01 08 55 01 6E 66 63 2E 6F 72 67"));
        assert_eq!(rec.rtd(), Rtd::Uri);
        assert_eq!(rec.as_uri(), Some("http://www.nfc.org"));
    }

    #[test]
    fn test_new_uri_round_trips_through_parse() {
        let rec = Record::new_uri("mailto:user@nfc.org").unwrap();
        let parsed = Record::parse(rec.raw()).unwrap();
        assert_eq!(parsed.as_uri(), Some("mailto:user@nfc.org"));
        assert_eq!(parsed.payload()[0], 0x06);
    }
}
