//! Fixed-width geometry carried by snapshots and commands.
//!
//! Every float on the wire is an IEEE-754 single in big-endian order, in both
//! directions. The server writes its snapshots with `to_be_bytes`, so inbound
//! decoding matches it rather than the host order.

use crate::error::DecodeError;
use std::fmt;

pub const F32_SIZE: usize = 4;
pub const VECTOR_SIZE: usize = 2 * F32_SIZE;
pub const WALL_SIZE: usize = 2 * VECTOR_SIZE;
pub const TANK_SIZE: usize = 3 * VECTOR_SIZE;
pub const BULLET_SIZE: usize = 2 * VECTOR_SIZE;

/// Reads a big-endian `f32` starting at `offset`.
pub fn read_f32(bytes: &[u8], offset: usize) -> Result<f32, DecodeError> {
    let end = offset + F32_SIZE;
    let raw: [u8; F32_SIZE] = bytes
        .get(offset..end)
        .and_then(|slice| slice.try_into().ok())
        .ok_or(DecodeError::Truncated {
            needed: end,
            available: bytes.len(),
        })?;
    Ok(f32::from_be_bytes(raw))
}

/// Appends the big-endian encoding of `value`.
pub fn write_f32(out: &mut Vec<u8>, value: f32) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// A 2D vector used for positions and directions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn decode(bytes: &[u8], offset: usize) -> Result<Self, DecodeError> {
        Ok(Self {
            x: read_f32(bytes, offset)?,
            y: read_f32(bytes, offset + F32_SIZE)?,
        })
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        write_f32(out, self.x);
        write_f32(out, self.y);
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl From<(f32, f32)> for Vector {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "< {}, {} >", self.x, self.y)
    }
}

/// A wall segment between two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Wall {
    pub start: Vector,
    pub end: Vector,
}

impl Wall {
    pub const fn new(start: Vector, end: Vector) -> Self {
        Self { start, end }
    }

    pub fn decode(bytes: &[u8], offset: usize) -> Result<Self, DecodeError> {
        Ok(Self {
            start: Vector::decode(bytes, offset)?,
            end: Vector::decode(bytes, offset + VECTOR_SIZE)?,
        })
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        self.start.encode_into(out);
        self.end.encode_into(out);
    }
}

impl fmt::Display for Wall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.start, self.end)
    }
}

/// Snapshot of one tank: where it is, where its hull points and where its
/// turret points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tank {
    pub position: Vector,
    pub direction: Vector,
    pub turret: Vector,
}

impl Tank {
    pub const fn new(position: Vector, direction: Vector, turret: Vector) -> Self {
        Self {
            position,
            direction,
            turret,
        }
    }

    pub fn decode(bytes: &[u8], offset: usize) -> Result<Self, DecodeError> {
        Ok(Self {
            position: Vector::decode(bytes, offset)?,
            direction: Vector::decode(bytes, offset + VECTOR_SIZE)?,
            turret: Vector::decode(bytes, offset + 2 * VECTOR_SIZE)?,
        })
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        self.position.encode_into(out);
        self.direction.encode_into(out);
        self.turret.encode_into(out);
    }
}

impl fmt::Display for Tank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pos: {}, dir: {}, tur: {}",
            self.position, self.direction, self.turret
        )
    }
}

/// Snapshot of one bullet in flight.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bullet {
    pub position: Vector,
    pub direction: Vector,
}

impl Bullet {
    pub const fn new(position: Vector, direction: Vector) -> Self {
        Self {
            position,
            direction,
        }
    }

    pub fn decode(bytes: &[u8], offset: usize) -> Result<Self, DecodeError> {
        Ok(Self {
            position: Vector::decode(bytes, offset)?,
            direction: Vector::decode(bytes, offset + VECTOR_SIZE)?,
        })
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        self.position.encode_into(out);
        self.direction.encode_into(out);
    }
}

impl fmt::Display for Bullet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pos: {}, dir: {}", self.position, self.direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn be_floats(values: &[f32]) -> Vec<u8> {
        let mut out = Vec::new();
        for value in values {
            write_f32(&mut out, *value);
        }
        out
    }

    #[test]
    fn test_write_f32_is_big_endian() {
        let mut out = Vec::new();
        write_f32(&mut out, 1.0);
        assert_eq!(out, vec![0x3F, 0x80, 0x00, 0x00]);

        out.clear();
        write_f32(&mut out, 50.0);
        assert_eq!(out, vec![0x42, 0x48, 0x00, 0x00]);
    }

    #[test]
    fn test_read_f32_is_big_endian() {
        let bytes = [0x3F, 0x80, 0x00, 0x00];
        assert_eq!(read_f32(&bytes, 0).unwrap(), 1.0);
    }

    #[test]
    fn test_float_roundtrip_is_bit_exact() {
        let specials = [
            0.0f32,
            -0.0,
            1.0,
            -1.5,
            f32::MIN_POSITIVE,
            f32::MAX,
            f32::MIN,
            f32::INFINITY,
            f32::NEG_INFINITY,
            f32::EPSILON,
        ];
        let randoms: Vec<f32> = (0..256)
            .map(|_| f32::from_bits(rand::random::<u32>()))
            .filter(|f| !f.is_nan())
            .collect();

        for value in specials.iter().chain(randoms.iter()) {
            let mut out = Vec::new();
            write_f32(&mut out, *value);
            let decoded = read_f32(&out, 0).unwrap();
            assert_eq!(decoded.to_bits(), value.to_bits());
        }
    }

    #[test]
    fn test_nan_payload_survives() {
        let nan = f32::from_bits(0x7FC0_1234);
        let mut out = Vec::new();
        write_f32(&mut out, nan);
        assert_eq!(read_f32(&out, 0).unwrap().to_bits(), 0x7FC0_1234);
    }

    #[test]
    fn test_read_f32_truncated() {
        let bytes = [0u8; 6];
        assert_eq!(
            read_f32(&bytes, 4),
            Err(DecodeError::Truncated {
                needed: 8,
                available: 6
            })
        );
    }

    #[test]
    fn test_decode_vector_at_offset() {
        let mut bytes = vec![0xAA];
        bytes.extend(be_floats(&[3.5, -2.25]));
        let vector = Vector::decode(&bytes, 1).unwrap();
        assert_eq!(vector, Vector::new(3.5, -2.25));
    }

    #[test]
    fn test_decode_wall_endpoint_order() {
        let bytes = be_floats(&[1.0, 2.0, 3.0, 4.0]);
        let wall = Wall::decode(&bytes, 0).unwrap();
        assert_eq!(wall.start, Vector::new(1.0, 2.0));
        assert_eq!(wall.end, Vector::new(3.0, 4.0));
    }

    #[test]
    fn test_decode_tank_field_order() {
        let bytes = be_floats(&[10.0, 20.0, 0.0, 1.0, -1.0, 0.0]);
        assert_eq!(bytes.len(), TANK_SIZE);
        let tank = Tank::decode(&bytes, 0).unwrap();
        assert_eq!(tank.position, Vector::new(10.0, 20.0));
        assert_eq!(tank.direction, Vector::new(0.0, 1.0));
        assert_eq!(tank.turret, Vector::new(-1.0, 0.0));
    }

    #[test]
    fn test_decode_bullet_field_order() {
        let bytes = be_floats(&[5.0, 6.0, 0.5, 0.5]);
        assert_eq!(bytes.len(), BULLET_SIZE);
        let bullet = Bullet::decode(&bytes, 0).unwrap();
        assert_eq!(bullet.position, Vector::new(5.0, 6.0));
        assert_eq!(bullet.direction, Vector::new(0.5, 0.5));
    }

    #[test]
    fn test_decode_tank_truncated() {
        let bytes = be_floats(&[10.0, 20.0, 0.0, 1.0, -1.0]);
        assert!(matches!(
            Tank::decode(&bytes, 0),
            Err(DecodeError::Truncated { needed: 24, .. })
        ));
    }

    #[test]
    fn test_encode_sizes() {
        let mut out = Vec::new();
        Wall::default().encode_into(&mut out);
        assert_eq!(out.len(), WALL_SIZE);

        out.clear();
        Tank::default().encode_into(&mut out);
        assert_eq!(out.len(), TANK_SIZE);

        out.clear();
        Bullet::default().encode_into(&mut out);
        assert_eq!(out.len(), BULLET_SIZE);
    }

    #[test]
    fn test_vector_length() {
        assert_eq!(Vector::new(3.0, 4.0).length(), 5.0);
        assert_eq!(Vector::ZERO.length(), 0.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Vector::new(1.5, -2.0).to_string(), "< 1.5, -2 >");
        let bullet = Bullet::new(Vector::new(1.0, 2.0), Vector::new(0.0, 1.0));
        assert_eq!(bullet.to_string(), "pos: < 1, 2 >, dir: < 0, 1 >");
    }
}
