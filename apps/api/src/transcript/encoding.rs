//! Encoding Resolver: best-effort decoding of uploaded bytes.
//!
//! Order: detected charset → UTF-8 → Latin-1 → CP1252 → ISO-8859-1 → forced Latin-1.
//! Latin-1 maps every byte to a code point, so decoding always yields a string.

use std::borrow::Cow;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy)]
enum Fallback {
    Utf8,
    Latin1,
    Cp1252,
    Iso8859_1,
}

const FALLBACKS: [Fallback; 4] = [
    Fallback::Utf8,
    Fallback::Latin1,
    Fallback::Cp1252,
    Fallback::Iso8859_1,
];

impl Fallback {
    fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Fallback::Utf8 => decode_strict(UTF_8, bytes),
            Fallback::Cp1252 => decode_strict(WINDOWS_1252, bytes),
            Fallback::Latin1 | Fallback::Iso8859_1 => Some(latin1(bytes)),
        }
    }
}

/// Decodes arbitrary bytes into text. Never fails; empty input gives an empty string.
pub fn decode_bytes(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return String::new();
    }

    let detected = detect_encoding(bytes);
    if let Some(text) = decode_strict(detected, bytes) {
        return text;
    }

    debug!(
        "Detected encoding {} could not decode upload, trying fallbacks",
        detected.name()
    );

    FALLBACKS
        .iter()
        .find_map(|fallback| fallback.decode(bytes))
        .unwrap_or_else(|| latin1(bytes))
}

/// Best guess at the charset of `bytes`. Valid UTF-8 is always reported as UTF-8.
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    if std::str::from_utf8(bytes).is_ok() {
        return UTF_8;
    }
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}

fn decode_strict(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    let bytes = if encoding == UTF_8 {
        bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
    } else {
        bytes
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(Cow::into_owned)
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
