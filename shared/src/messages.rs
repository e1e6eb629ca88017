//! Message framing for both directions of the protocol.
//!
//! Server to client: `[type:1][secret:16][payload]`, except the disconnect
//! notice which is the bare tag.
//!
//! Client to server: the 3-byte connect handshake, or a 32-byte control
//! command `[0x01][port:2][secret:16][track x:4][track y:4][turret:4][shoot:1]`.
//! All multi-byte fields are big-endian.

use crate::error::{ensure_len, DecodeError, EncodeError};
use crate::geometry::{
    read_f32, write_f32, Bullet, Tank, Vector, Wall, BULLET_SIZE, F32_SIZE, TANK_SIZE, WALL_SIZE,
};
use crate::secret::{Secret, SECRET_SIZE};
use std::fmt;

/// Tag plus secret in front of every snapshot.
pub const SNAPSHOT_HEADER_SIZE: usize = 1 + SECRET_SIZE;
pub const CONNECT_FRAME_SIZE: usize = 3;
pub const CONTROL_FRAME_SIZE: usize = 1 + 2 + SECRET_SIZE + 3 * F32_SIZE + 1;

/// Type tags of server to client frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ServerMessageKind {
    MapChange = 0x00,
    State = 0x01,
    Disconnected = 0x02,
}

impl TryFrom<u8> for ServerMessageKind {
    type Error = DecodeError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0x00 => Ok(Self::MapChange),
            0x01 => Ok(Self::State),
            0x02 => Ok(Self::Disconnected),
            tag => Err(DecodeError::UnknownMessageType { tag }),
        }
    }
}

/// Type tags of client to server frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ClientMessageKind {
    Connect = 0x00,
    Control = 0x01,
}

impl TryFrom<u8> for ClientMessageKind {
    type Error = DecodeError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0x00 => Ok(Self::Connect),
            0x01 => Ok(Self::Control),
            tag => Err(DecodeError::UnknownMessageType { tag }),
        }
    }
}

/// An inbound frame with its tag stripped and its secret extracted, payload
/// still undecoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundFrame<'a> {
    MapChange { secret: Secret, payload: &'a [u8] },
    State { secret: Secret, payload: &'a [u8] },
    Disconnected,
}

impl<'a> InboundFrame<'a> {
    /// Splits a datagram into tag, secret and payload.
    ///
    /// Fails only when the tag is missing or unknown, or when a snapshot is
    /// too short to carry its secret.
    pub fn split(bytes: &'a [u8]) -> Result<Self, DecodeError> {
        let (&tag, rest) = bytes.split_first().ok_or(DecodeError::Empty)?;
        let kind = ServerMessageKind::try_from(tag)?;
        if kind == ServerMessageKind::Disconnected {
            return Ok(Self::Disconnected);
        }

        ensure_len(bytes, SNAPSHOT_HEADER_SIZE)?;
        let secret = Secret::read(bytes, 1)?;
        let payload = &rest[SECRET_SIZE..];
        Ok(match kind {
            ServerMessageKind::MapChange => Self::MapChange { secret, payload },
            _ => Self::State { secret, payload },
        })
    }

    pub fn kind(&self) -> ServerMessageKind {
        match self {
            Self::MapChange { .. } => ServerMessageKind::MapChange,
            Self::State { .. } => ServerMessageKind::State,
            Self::Disconnected => ServerMessageKind::Disconnected,
        }
    }

    pub fn secret(&self) -> Option<Secret> {
        match self {
            Self::MapChange { secret, .. } | Self::State { secret, .. } => Some(*secret),
            Self::Disconnected => None,
        }
    }
}

fn read_count(payload: &[u8], offset: usize) -> Result<usize, DecodeError> {
    payload
        .get(offset)
        .map(|&count| count as usize)
        .ok_or(DecodeError::Truncated {
            needed: offset + 1,
            available: payload.len(),
        })
}

/// Decodes a map snapshot payload: `[wallCount:1][wall:16]*`.
pub fn decode_walls(payload: &[u8]) -> Result<Vec<Wall>, DecodeError> {
    let count = read_count(payload, 0)?;
    ensure_len(payload, 1 + count * WALL_SIZE)?;
    (0..count)
        .map(|index| Wall::decode(payload, 1 + index * WALL_SIZE))
        .collect()
}

/// Decodes a state snapshot payload:
/// `[tankCount:1][tank:24]*[bulletCount:1][bullet:16]*`.
pub fn decode_state(payload: &[u8]) -> Result<(Vec<Tank>, Vec<Bullet>), DecodeError> {
    let tank_count = read_count(payload, 0)?;
    let bullets_at = 1 + tank_count * TANK_SIZE;
    let bullet_count = read_count(payload, bullets_at)?;
    ensure_len(payload, bullets_at + 1 + bullet_count * BULLET_SIZE)?;

    let tanks = (0..tank_count)
        .map(|index| Tank::decode(payload, 1 + index * TANK_SIZE))
        .collect::<Result<Vec<_>, _>>()?;
    let bullets = (0..bullet_count)
        .map(|index| Bullet::decode(payload, bullets_at + 1 + index * BULLET_SIZE))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((tanks, bullets))
}

fn count_byte(kind: &'static str, count: usize) -> Result<u8, EncodeError> {
    u8::try_from(count).map_err(|_| EncodeError::TooManyEntries { kind, count })
}

/// A fully decoded server to client message.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    MapChange {
        secret: Secret,
        walls: Vec<Wall>,
    },
    State {
        secret: Secret,
        tanks: Vec<Tank>,
        bullets: Vec<Bullet>,
    },
    Disconnected,
}

impl ServerMessage {
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        match InboundFrame::split(bytes)? {
            InboundFrame::MapChange { secret, payload } => Ok(Self::MapChange {
                secret,
                walls: decode_walls(payload)?,
            }),
            InboundFrame::State { secret, payload } => {
                let (tanks, bullets) = decode_state(payload)?;
                Ok(Self::State {
                    secret,
                    tanks,
                    bullets,
                })
            }
            InboundFrame::Disconnected => Ok(Self::Disconnected),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        match self {
            Self::MapChange { secret, walls } => {
                let mut out = Vec::with_capacity(SNAPSHOT_HEADER_SIZE + 1 + walls.len() * WALL_SIZE);
                out.push(ServerMessageKind::MapChange as u8);
                out.extend_from_slice(&secret.to_wire());
                out.push(count_byte("walls", walls.len())?);
                walls.iter().for_each(|wall| wall.encode_into(&mut out));
                Ok(out)
            }
            Self::State {
                secret,
                tanks,
                bullets,
            } => {
                let mut out = Vec::with_capacity(
                    SNAPSHOT_HEADER_SIZE + 2 + tanks.len() * TANK_SIZE + bullets.len() * BULLET_SIZE,
                );
                out.push(ServerMessageKind::State as u8);
                out.extend_from_slice(&secret.to_wire());
                out.push(count_byte("tanks", tanks.len())?);
                tanks.iter().for_each(|tank| tank.encode_into(&mut out));
                out.push(count_byte("bullets", bullets.len())?);
                bullets.iter().for_each(|bullet| bullet.encode_into(&mut out));
                Ok(out)
            }
            Self::Disconnected => Ok(vec![ServerMessageKind::Disconnected as u8]),
        }
    }

    pub fn kind(&self) -> ServerMessageKind {
        match self {
            Self::MapChange { .. } => ServerMessageKind::MapChange,
            Self::State { .. } => ServerMessageKind::State,
            Self::Disconnected => ServerMessageKind::Disconnected,
        }
    }
}

/// What a controller asks the server to do with its tank.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlCommand {
    pub track_acceleration_target: Vector,
    pub turret_acceleration_target: f32,
    pub shoot: bool,
}

impl ControlCommand {
    pub fn new(
        track_acceleration_target: Vector,
        turret_acceleration_target: f32,
        shoot: bool,
    ) -> Self {
        Self {
            track_acceleration_target,
            turret_acceleration_target,
            shoot,
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ ({}, {}), {}{} }}",
            self.track_acceleration_target.x,
            self.track_acceleration_target.y,
            self.turret_acceleration_target,
            if self.shoot { ", shoot" } else { "" }
        )
    }
}

/// A client to server frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClientMessage {
    Connect {
        self_port: u16,
    },
    Control {
        self_port: u16,
        secret: Secret,
        command: ControlCommand,
    },
}

impl ClientMessage {
    pub fn connect(self_port: u16) -> Self {
        Self::Connect { self_port }
    }

    pub fn control(self_port: u16, secret: Secret, command: ControlCommand) -> Self {
        Self::Control {
            self_port,
            secret,
            command,
        }
    }

    pub fn self_port(&self) -> u16 {
        match self {
            Self::Connect { self_port } | Self::Control { self_port, .. } => *self_port,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Connect { self_port } => {
                let [high, low] = self_port.to_be_bytes();
                vec![ClientMessageKind::Connect as u8, high, low]
            }
            Self::Control {
                self_port,
                secret,
                command,
            } => {
                let mut out = Vec::with_capacity(CONTROL_FRAME_SIZE);
                out.push(ClientMessageKind::Control as u8);
                out.extend_from_slice(&self_port.to_be_bytes());
                out.extend_from_slice(&secret.to_wire());
                command.track_acceleration_target.encode_into(&mut out);
                write_f32(&mut out, command.turret_acceleration_target);
                out.push(u8::from(command.shoot));
                out
            }
        }
    }

    /// Parses a frame the way the server sees it.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let (&tag, _) = bytes.split_first().ok_or(DecodeError::Empty)?;
        match ClientMessageKind::try_from(tag)? {
            ClientMessageKind::Connect => {
                ensure_len(bytes, CONNECT_FRAME_SIZE)?;
                Ok(Self::Connect {
                    self_port: u16::from_be_bytes([bytes[1], bytes[2]]),
                })
            }
            ClientMessageKind::Control => {
                ensure_len(bytes, CONTROL_FRAME_SIZE)?;
                let self_port = u16::from_be_bytes([bytes[1], bytes[2]]);
                let secret = Secret::read(bytes, 3)?;
                let track_at = 3 + SECRET_SIZE;
                let command = ControlCommand {
                    track_acceleration_target: Vector::decode(bytes, track_at)?,
                    turret_acceleration_target: read_f32(bytes, track_at + 2 * F32_SIZE)?,
                    shoot: bytes[CONTROL_FRAME_SIZE - 1] != 0,
                };
                Ok(Self::Control {
                    self_port,
                    secret,
                    command,
                })
            }
        }
    }
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect { self_port } => write!(f, "connect from port {}", self_port),
            Self::Control {
                self_port, command, ..
            } => write!(f, "control from port {}: {}", self_port, command),
        }
    }
}
