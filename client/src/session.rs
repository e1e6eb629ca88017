//! Client session: owns the UDP socket, keeps the handshake alive and feeds
//! decoded snapshots to a [`Controller`]

use crate::config::SessionConfig;
use crate::controller::Controller;
use log::{debug, error, info, trace, warn};
use shared::{decode_state, decode_walls, ClientMessage, ControlCommand, InboundFrame, Secret};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::time::{sleep, timeout};

/// Socket failures. Every one of these ends the session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("could not bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error("could not read the bound address: {0}")]
    LocalAddr(#[source] io::Error),

    #[error("could not send to the server at {addr}: {source}")]
    Send { addr: SocketAddr, source: io::Error },

    #[error("could not receive from the socket: {0}")]
    Receive(#[source] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No handshake outstanding, or the link went idle
    Disconnected,
    /// Handshake sent, no snapshot seen since
    Connecting,
    /// At least one snapshot decoded since the last handshake
    Connected,
}

/// What the receive loop should do after a datagram has been handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Send this frame to the server
    Send(Vec<u8>),
    /// Re-send the connect handshake right away
    Reconnect,
    Nothing,
}

/// Creates a linked trigger and signal for stopping [`Session::run_until`]
/// from another task. Dropping the trigger also fires the signal.
pub fn shutdown_channel() -> (Shutdown, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (Shutdown(tx), ShutdownSignal(rx))
}

#[derive(Debug)]
pub struct Shutdown(watch::Sender<bool>);

impl Shutdown {
    pub fn trigger(&self) {
        let _ = self.0.send(true);
    }
}

#[derive(Debug, Clone)]
pub struct ShutdownSignal(watch::Receiver<bool>);

impl ShutdownSignal {
    /// Resolves once the trigger fires or is dropped
    pub async fn wait(mut self) {
        while !*self.0.borrow() {
            if self.0.changed().await.is_err() {
                return;
            }
        }
    }
}

pub struct Session<C> {
    socket: UdpSocket,
    config: SessionConfig,
    self_port: u16,
    server_addr: SocketAddr,
    secret: Secret,
    state: ConnectionState,
    controller: C,
}

impl<C: Controller> Session<C> {
    /// Binds the local socket. Nothing is sent until the session runs.
    pub async fn bind(config: SessionConfig, controller: C) -> Result<Self, SessionError> {
        let addr = config.bind_addr();
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| SessionError::Bind { addr, source })?;
        let self_port = socket
            .local_addr()
            .map_err(SessionError::LocalAddr)?
            .port();
        let server_addr = config.server_addr();
        info!("Client bound to port {}, server at {}", self_port, server_addr);

        Ok(Session {
            socket,
            config,
            self_port,
            server_addr,
            secret: Secret::ZERO,
            state: ConnectionState::Disconnected,
            controller,
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn secret(&self) -> Secret {
        self.secret
    }

    /// Port announced to the server; the bound one when configured as 0
    pub fn self_port(&self) -> u16 {
        self.self_port
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    pub fn local_addr(&self) -> Result<SocketAddr, SessionError> {
        self.socket.local_addr().map_err(SessionError::LocalAddr)
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            debug!("Session {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Applies one inbound datagram to the session without doing any I/O.
    ///
    /// Snapshot secrets are absorbed even when the payload after them turns
    /// out to be malformed; malformed or unknown frames are otherwise dropped.
    pub fn handle_datagram(&mut self, data: &[u8]) -> Reply {
        let frame = match InboundFrame::split(data) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Dropping inbound frame ({} bytes): {}", data.len(), e);
                return Reply::Nothing;
            }
        };

        let command = match frame {
            InboundFrame::Disconnected => {
                info!("Server dropped the session, reconnecting");
                self.set_state(ConnectionState::Connecting);
                return Reply::Reconnect;
            }
            InboundFrame::MapChange { secret, payload } => {
                self.secret = secret;
                match decode_walls(payload) {
                    Ok(walls) => {
                        debug!("Map snapshot with {} walls", walls.len());
                        self.set_state(ConnectionState::Connected);
                        self.controller.on_map_change(&walls)
                    }
                    Err(e) => {
                        warn!("Dropping map snapshot: {}", e);
                        return Reply::Nothing;
                    }
                }
            }
            InboundFrame::State { secret, payload } => {
                self.secret = secret;
                match decode_state(payload) {
                    Ok((tanks, bullets)) => {
                        trace!(
                            "State snapshot with {} tanks, {} bullets",
                            tanks.len(),
                            bullets.len()
                        );
                        self.set_state(ConnectionState::Connected);
                        self.controller.on_state_change(&tanks, &bullets)
                    }
                    Err(e) => {
                        warn!("Dropping state snapshot: {}", e);
                        return Reply::Nothing;
                    }
                }
            }
        };

        match command {
            Some(command) => Reply::Send(self.encode_command(command)),
            None => Reply::Nothing,
        }
    }

    /// Encodes a command with the current port and secret
    pub fn encode_command(&self, command: ControlCommand) -> Vec<u8> {
        trace!("Sending {} with secret {}", command, self.secret);
        ClientMessage::control(self.self_port, self.secret, command).encode()
    }

    async fn send(&self, frame: &[u8]) -> Result<(), SessionError> {
        self.socket
            .send_to(frame, self.server_addr)
            .await
            .map_err(|source| SessionError::Send {
                addr: self.server_addr,
                source,
            })?;
        Ok(())
    }

    async fn connect(&mut self) -> Result<(), SessionError> {
        info!("Connecting to {}...", self.server_addr);
        self.send(&ClientMessage::connect(self.self_port).encode())
            .await?;
        self.set_state(ConnectionState::Connecting);
        Ok(())
    }

    /// Waits for the next datagram. `None` means the link looks idle: a
    /// zero-length datagram, or no datagram within the idle timeout.
    async fn receive(&self, buffer: &mut [u8]) -> Result<Option<usize>, SessionError> {
        let received = match self.config.idle_timeout {
            Some(limit) => match timeout(limit, self.socket.recv_from(buffer)).await {
                Ok(received) => received,
                Err(_) => {
                    debug!("Nothing received for {:?}", limit);
                    return Ok(None);
                }
            },
            None => self.socket.recv_from(buffer).await,
        };

        let (len, from) = received.map_err(SessionError::Receive)?;
        if len == 0 {
            debug!("Zero-length datagram from {}", from);
            return Ok(None);
        }
        Ok(Some(len))
    }

    /// Runs until a fatal socket error
    pub async fn run(&mut self) -> Result<(), SessionError> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Runs until `shutdown` resolves or a socket error occurs.
    ///
    /// One datagram is handled at a time: receive, decode, call the
    /// controller, send its reply.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<(), SessionError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut buffer = vec![0u8; self.config.recv_buffer_len()];

        loop {
            self.connect().await?;

            loop {
                let received = tokio::select! {
                    _ = &mut shutdown => {
                        info!("Session shutting down");
                        return Ok(());
                    }
                    received = self.receive(&mut buffer) => received,
                };

                let len = match received {
                    Ok(Some(len)) => len,
                    Ok(None) => break,
                    Err(e) => {
                        error!("{}", e);
                        return Err(e);
                    }
                };

                match self.handle_datagram(&buffer[..len]) {
                    Reply::Send(frame) => self.send(&frame).await?,
                    Reply::Reconnect => self.connect().await?,
                    Reply::Nothing => {}
                }
            }

            self.set_state(ConnectionState::Disconnected);
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Session shutting down");
                    return Ok(());
                }
                _ = sleep(self.config.reconnect_delay) => {}
            }
        }
    }
}
