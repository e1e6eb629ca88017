//! The per-session authentication token.

use crate::error::DecodeError;
use std::fmt;

pub const SECRET_SIZE: usize = 16;

/// 128-bit token issued by the server.
///
/// Every snapshot re-asserts the current value and every control command must
/// echo it back verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Secret(u128);

impl Secret {
    pub const ZERO: Secret = Secret(0);

    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u128 {
        self.0
    }

    /// Wire form: eight big-endian 16-bit words, most significant first.
    pub fn to_wire(self) -> [u8; SECRET_SIZE] {
        let mut out = [0u8; SECRET_SIZE];
        for (index, chunk) in out.chunks_exact_mut(2).enumerate() {
            let shift = 16 * (7 - index);
            let word = (self.0 >> shift) as u16;
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        out
    }

    /// Folds the bytes as a big-endian base-256 number.
    pub fn from_wire(bytes: &[u8; SECRET_SIZE]) -> Self {
        Self(
            bytes
                .iter()
                .fold(0u128, |acc, &byte| (acc << 8) | u128::from(byte)),
        )
    }

    /// Reads a secret starting at `offset`.
    pub fn read(bytes: &[u8], offset: usize) -> Result<Self, DecodeError> {
        let end = offset + SECRET_SIZE;
        let raw: &[u8; SECRET_SIZE] = bytes
            .get(offset..end)
            .and_then(|slice| slice.try_into().ok())
            .ok_or(DecodeError::Truncated {
                needed: end,
                available: bytes.len(),
            })?;
        Ok(Self::from_wire(raw))
    }
}

impl From<u128> for Secret {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_encodes_to_zero_bytes() {
        assert_eq!(Secret::ZERO.to_wire(), [0u8; SECRET_SIZE]);
    }

    #[test]
    fn test_word_order_is_most_significant_first() {
        let secret = Secret::new(0x0102_0304_0506_0708_090A_0B0C_0D0E_0F10);
        assert_eq!(
            secret.to_wire(),
            [
                0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D,
                0x0E, 0x0F, 0x10
            ]
        );
    }

    #[test]
    fn test_matches_native_big_endian() {
        for _ in 0..256 {
            let value: u128 = rand::random();
            assert_eq!(Secret::new(value).to_wire(), value.to_be_bytes());
        }
    }

    #[test]
    fn test_roundtrip_extremes() {
        for value in [0, 1, 255, 256, u128::MAX, u128::MAX - 1, 1 << 127] {
            let secret = Secret::new(value);
            assert_eq!(Secret::from_wire(&secret.to_wire()), secret);
        }
    }

    #[test]
    fn test_roundtrip_random() {
        for _ in 0..1024 {
            let secret = Secret::new(rand::random());
            assert_eq!(Secret::from_wire(&secret.to_wire()), secret);
        }
    }

    #[test]
    fn test_decode_fold() {
        let mut bytes = [0u8; SECRET_SIZE];
        bytes[14] = 0x01;
        bytes[15] = 0x02;
        assert_eq!(Secret::from_wire(&bytes).value(), 258);
    }

    #[test]
    fn test_read_at_offset() {
        let mut bytes = vec![0x00];
        bytes.extend_from_slice(&Secret::new(42).to_wire());
        assert_eq!(Secret::read(&bytes, 1).unwrap(), Secret::new(42));
    }

    #[test]
    fn test_read_truncated() {
        let bytes = [0u8; 10];
        assert_eq!(
            Secret::read(&bytes, 1),
            Err(DecodeError::Truncated {
                needed: 17,
                available: 10
            })
        );
    }

    #[test]
    fn test_display_is_padded_hex() {
        assert_eq!(
            Secret::new(0xAB).to_string(),
            "000000000000000000000000000000ab"
        );
    }
}
