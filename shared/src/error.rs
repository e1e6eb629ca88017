//! Error types for the wire codec.

use thiserror::Error;

/// Reasons an inbound or outbound frame could not be decoded.
///
/// None of these are fatal to a session: the offending frame is dropped and
/// the receive loop carries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A zero-length frame carries no type tag.
    #[error("empty frame")]
    Empty,

    /// The frame ends before a field it declares.
    #[error("truncated frame: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    /// The leading type tag is not one this side of the protocol understands.
    #[error("unknown message type {tag:#04x}")]
    UnknownMessageType { tag: u8 },
}

/// Reasons a message could not be encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Entity counts travel as a single byte.
    #[error("too many {kind}: {count} does not fit a one-byte count")]
    TooManyEntries { kind: &'static str, count: usize },
}

/// Returns `Truncated` unless `bytes` holds at least `needed` bytes.
pub(crate) fn ensure_len(bytes: &[u8], needed: usize) -> Result<(), DecodeError> {
    if bytes.len() < needed {
        return Err(DecodeError::Truncated {
            needed,
            available: bytes.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_len() {
        assert!(ensure_len(&[0; 4], 4).is_ok());
        assert_eq!(
            ensure_len(&[0; 3], 4),
            Err(DecodeError::Truncated {
                needed: 4,
                available: 3
            })
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            DecodeError::UnknownMessageType { tag: 7 }.to_string(),
            "unknown message type 0x07"
        );
        assert_eq!(
            DecodeError::Truncated {
                needed: 34,
                available: 20
            }
            .to_string(),
            "truncated frame: need 34 bytes, have 20"
        );
    }
}
