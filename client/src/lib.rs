//! # Tank Client Library
//!
//! Client-side endpoint for the tank game's UDP protocol. It keeps a session
//! alive with a single authoritative server, decodes the snapshots the server
//! pushes and sends back whatever commands the embedding application decides
//! on.
//!
//! ## Architecture Overview
//!
//! The client is a single receive loop. Each datagram is handled to
//! completion before the next one is read:
//!
//! ```text
//! socket → split frame → absorb secret → decode payload → controller → encode command → socket
//! ```
//!
//! There is no retry or ordering layer on top of UDP. The only thing that is
//! retried is the connect handshake, which is re-sent whenever the server
//! announces a disconnect and whenever the link goes idle.
//!
//! ### Session Secret
//! Every snapshot carries a 128-bit token. The session keeps the most recent
//! one and embeds it in every command it sends; the server ignores commands
//! with a stale token.
//!
//! ### Connection States
//! `Disconnected` → `Connecting` (handshake sent) → `Connected` (snapshot
//! decoded). A disconnect notice drops back to `Connecting` immediately; an
//! idle receive drops to `Disconnected`, waits the reconnect delay and
//! handshakes again.
//!
//! ## Module Organization
//!
//! ### Config Module (`config`)
//! Host, ports, reconnect delay and optional idle timeout, plus the
//! `SELF-PORT` / `SERVER` environment variables.
//!
//! ### Controller Module (`controller`)
//! The `Controller` trait the application implements, and `FnController`
//! for building one out of two closures.
//!
//! ### Session Module (`session`)
//! Socket ownership, the state machine and the receive loop, with a
//! shutdown signal for stopping it from another task.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::{FnController, Session, SessionConfig};
//! use shared::{Bullet, ControlCommand, Tank, Vector, Wall};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let controller = FnController::new(
//!         |_walls: &[Wall]| None,
//!         |_tanks: &[Tank], _bullets: &[Bullet]| {
//!             Some(ControlCommand::new(Vector::new(50.0, 20.0), 1000.0, true))
//!         },
//!     );
//!
//!     let mut session = Session::bind(SessionConfig::from_env(), controller).await?;
//!     session.run_until(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     }).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod controller;
pub mod session;

pub use config::SessionConfig;
pub use controller::{Controller, FnController};
pub use session::{
    shutdown_channel, ConnectionState, Reply, Session, SessionError, Shutdown, ShutdownSignal,
};
