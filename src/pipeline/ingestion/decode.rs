use encoding_rs::{Encoding, SHIFT_JIS, UTF_8};
use tracing::debug;

use crate::error::{IngestError, Result};

/// Encodings tried for delimited text, in order.
pub const CSV_ENCODINGS: [&Encoding; 2] = [UTF_8, SHIFT_JIS];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decodes the whole file under the first encoding that accepts every byte.
/// Returns the text and the name of the encoding used.
pub fn decode_text(bytes: &[u8]) -> Result<(String, &'static str)> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    for encoding in CSV_ENCODINGS {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            debug!("Decoded {} bytes as {}", bytes.len(), encoding.name());
            return Ok((text.into_owned(), encoding.name()));
        }
        debug!("Input is not valid {}", encoding.name());
    }
    Err(IngestError::Decode {
        attempted: CSV_ENCODINGS.iter().map(|e| e.name()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_with_bom() {
        let (text, encoding) = decode_text("\u{FEFF}会社名\nA社".as_bytes()).unwrap();
        assert_eq!(text, "会社名\nA社");
        assert_eq!(encoding, "UTF-8");
    }

    #[test]
    fn test_shift_jis_fallback() {
        let (bytes, _, had_errors) = SHIFT_JIS.encode("会社名,業種\nテスト株式会社,IT\n");
        assert!(!had_errors);
        let (text, encoding) = decode_text(&bytes).unwrap();
        assert_eq!(text, "会社名,業種\nテスト株式会社,IT\n");
        assert_eq!(encoding, "Shift_JIS");
    }

    #[test]
    fn test_undecodable_bytes() {
        let err = decode_text(b"\xff\xfd\x81\x20").unwrap_err();
        match err {
            IngestError::Decode { attempted } => assert_eq!(attempted, vec!["UTF-8", "Shift_JIS"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
