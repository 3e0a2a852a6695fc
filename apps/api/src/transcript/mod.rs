// Transcript intake: byte decoding and marker normalization.
// Neither step touches the model; both are deterministic.

pub mod encoding;
pub mod normalizer;

use bytes::Bytes;
use serde::Serialize;

pub use encoding::decode_bytes;
pub use normalizer::normalize;

/// Uploaded file as received from the multipart form. Consumed once.
#[derive(Debug, Clone)]
pub struct RawUpload {
    pub filename: String,
    pub bytes: Bytes,
}

/// Decoded transcript owned by a session. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    pub filename: String,
    #[serde(skip)]
    pub text: String,
    pub normalized: String,
}

impl Transcript {
    /// Decodes and normalizes an upload. Returns `None` when nothing readable is left.
    pub fn from_upload(upload: RawUpload) -> Option<Self> {
        let text = decode_bytes(&upload.bytes);
        if text.trim().is_empty() {
            return None;
        }
        let normalized = normalize(&text);
        Some(Self {
            filename: upload.filename,
            text,
            normalized,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(bytes: &'static [u8]) -> RawUpload {
        RawUpload {
            filename: "interview.txt".to_string(),
            bytes: Bytes::from_static(bytes),
        }
    }

    #[test]
    fn test_from_upload_decodes_and_normalizes() {
        let transcript = Transcript::from_upload(upload("A: Hola C: Adiós".as_bytes())).unwrap();
        assert_eq!(transcript.filename, "interview.txt");
        assert_eq!(transcript.text, "A: Hola C: Adiós");
        assert_eq!(transcript.normalized, "A: Hola\nC: Adiós");
    }

    #[test]
    fn test_empty_upload_is_unreadable() {
        assert!(Transcript::from_upload(upload(b"")).is_none());
        assert!(Transcript::from_upload(upload(b"  \r\n ")).is_none());
    }
}
