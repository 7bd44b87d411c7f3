//! Region-specific text charset service.
//!
//! The legacy clients ship strings in their region's native codepage (GBK,
//! Big5, ...). The core treats that conversion as an opaque collaborator:
//! a [`TextCodec`] turns protocol bytes into a `String` and back, and is
//! expected to degrade gracefully rather than fail a whole packet over one
//! bad sequence.

/// Opaque byte/text transform for locale strings.
///
/// Implementations must never panic on malformed input; return a best-effort
/// result instead (replacement characters are fine).
pub trait TextCodec: Send + Sync {
    /// Decode protocol bytes into text.
    fn decode(&self, raw: &[u8]) -> String;

    /// Encode text into protocol bytes.
    fn encode(&self, text: &str) -> Vec<u8>;
}

/// UTF-8 passthrough codec used for regions without a legacy codepage.
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl TextCodec for Passthrough {
    fn decode(&self, raw: &[u8]) -> String {
        String::from_utf8_lossy(raw).into_owned()
    }

    fn encode(&self, text: &str) -> Vec<u8> {
        text.as_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_roundtrip() {
        let codec = Passthrough;
        assert_eq!(codec.decode(&codec.encode("hello")), "hello");
    }

    #[test]
    fn passthrough_tolerates_invalid_utf8() {
        let codec = Passthrough;
        let text = codec.decode(&[0x48, 0xFF, 0x49]);
        assert!(text.starts_with('H'));
        assert!(text.ends_with('I'));
    }
}
