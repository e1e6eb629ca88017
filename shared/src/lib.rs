//! # Tank Protocol
//!
//! Wire format shared by the tank client and anything that speaks to it. The
//! crate is pure data: it turns datagrams into typed messages and back, and
//! never touches a socket.
//!
//! ## Layout
//!
//! | Direction | Tag    | Body                                                         |
//! |-----------|--------|--------------------------------------------------------------|
//! | C → S     | `0x00` | connect: `port:2`                                            |
//! | S → C     | `0x00` | map: `secret:16` `wallCount:1` walls                         |
//! | S → C     | `0x01` | state: `secret:16` `tankCount:1` tanks `bulletCount:1` bullets |
//! | C → S     | `0x01` | command: `port:2` `secret:16` `x:4` `y:4` `turret:4` `shoot:1` |
//! | S → C     | `0x02` | disconnect notice                                            |
//!
//! Integers and floats are big-endian. A wall and a bullet are two vectors
//! (16 bytes), a tank is three (24 bytes).
//!
//! ## Modules
//!
//! - `geometry`: vectors, walls, tanks and bullets with their float codec.
//! - `secret`: the 128-bit session token and its 16-byte wire form.
//! - `messages`: framing for both directions.
//! - `error`: decode and encode failures.

pub mod error;
pub mod geometry;
pub mod messages;
pub mod secret;

pub use error::{DecodeError, EncodeError};
pub use geometry::{Bullet, Tank, Vector, Wall};
pub use messages::{
    decode_state, decode_walls, ClientMessage, ClientMessageKind, ControlCommand, InboundFrame,
    ServerMessage, ServerMessageKind,
};
pub use secret::Secret;
