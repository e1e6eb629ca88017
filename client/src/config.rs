//! Session configuration and its environment surface

use shared::messages::SNAPSHOT_HEADER_SIZE;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
pub const DEFAULT_SELF_PORT: u16 = 4001;
pub const DEFAULT_SERVER_PORT: u16 = 4000;
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(100);

/// Largest snapshot the server produces is 4883 bytes.
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 4885;

/// Smallest complete snapshot: header plus two zero counts.
pub const MIN_RECV_BUFFER_SIZE: usize = SNAPSHOT_HEADER_SIZE + 2;

pub const SELF_PORT_VAR: &str = "SELF-PORT";
pub const SERVER_PORT_VAR: &str = "SERVER";

/// Everything a session needs to know before it binds its socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Local address to bind
    pub bind_host: IpAddr,
    /// Address the server listens on
    pub server_host: IpAddr,
    /// Local port to bind and announce in every frame; 0 picks a free one
    pub self_port: u16,
    pub server_port: u16,
    /// Pause after an idle receive before the handshake is re-sent
    pub reconnect_delay: Duration,
    /// Treat this long without a datagram as idle; `None` waits forever
    pub idle_timeout: Option<Duration>,
    /// Raised to [`MIN_RECV_BUFFER_SIZE`] when smaller
    pub recv_buffer_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bind_host: DEFAULT_HOST,
            server_host: DEFAULT_HOST,
            self_port: DEFAULT_SELF_PORT,
            server_port: DEFAULT_SERVER_PORT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            idle_timeout: None,
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
        }
    }
}

impl SessionConfig {
    /// Reads `SELF-PORT` and `SERVER`, falling back to the defaults when a
    /// variable is missing or not a port number
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = |name: &str, default: u16| {
            lookup(name)
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(default)
        };

        Self {
            self_port: port(SELF_PORT_VAR, DEFAULT_SELF_PORT),
            server_port: port(SERVER_PORT_VAR, DEFAULT_SERVER_PORT),
            ..Self::default()
        }
    }

    pub fn with_ports(mut self, self_port: u16, server_port: u16) -> Self {
        self.self_port = self_port;
        self.server_port = server_port;
        self
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn with_reconnect_delay(mut self, reconnect_delay: Duration) -> Self {
        self.reconnect_delay = reconnect_delay;
        self
    }

    pub fn with_hosts(mut self, bind_host: IpAddr, server_host: IpAddr) -> Self {
        self.bind_host = bind_host;
        self.server_host = server_host;
        self
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_host, self.self_port)
    }

    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server_host, self.server_port)
    }

    /// Receive buffer length actually allocated. A buffer shorter than a
    /// snapshot header would read every datagram as zero-length or truncated.
    pub fn recv_buffer_len(&self) -> usize {
        self.recv_buffer_size.max(MIN_RECV_BUFFER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.self_port, 4001);
        assert_eq!(config.server_port, 4000);
        assert_eq!(config.reconnect_delay, Duration::from_millis(100));
        assert_eq!(config.idle_timeout, None);
        assert_eq!(config.server_addr(), "127.0.0.1:4000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.bind_addr(), "127.0.0.1:4001".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_from_lookup_reads_ports() {
        let config = SessionConfig::from_lookup(lookup_from(&[
            ("SELF-PORT", "5001"),
            ("SERVER", "5000"),
        ]));
        assert_eq!(config.self_port, 5001);
        assert_eq!(config.server_port, 5000);
    }

    #[test]
    fn test_from_lookup_falls_back_on_garbage() {
        let config = SessionConfig::from_lookup(lookup_from(&[
            ("SELF-PORT", "not-a-port"),
            ("SERVER", "70000"),
        ]));
        assert_eq!(config.self_port, DEFAULT_SELF_PORT);
        assert_eq!(config.server_port, DEFAULT_SERVER_PORT);
    }

    #[test]
    fn test_from_lookup_missing_vars() {
        let config = SessionConfig::from_lookup(|_| None);
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_builders() {
        let config = SessionConfig::default()
            .with_ports(0, 9000)
            .with_idle_timeout(Some(Duration::from_secs(5)))
            .with_reconnect_delay(Duration::from_millis(10));
        assert_eq!(config.self_port, 0);
        assert_eq!(config.server_port, 9000);
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.reconnect_delay, Duration::from_millis(10));
    }

    #[test]
    fn test_bind_and_server_hosts_are_independent() {
        let config = SessionConfig::default().with_hosts(
            IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)),
        );
        assert_eq!(config.bind_addr(), "0.0.0.0:4001".parse::<SocketAddr>().unwrap());
        assert_eq!(config.server_addr(), "10.0.0.7:4000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_recv_buffer_len_has_a_floor() {
        let mut config = SessionConfig::default();
        assert_eq!(config.recv_buffer_len(), DEFAULT_RECV_BUFFER_SIZE);

        config.recv_buffer_size = 0;
        assert_eq!(config.recv_buffer_len(), MIN_RECV_BUFFER_SIZE);
        assert_eq!(MIN_RECV_BUFFER_SIZE, 19);
    }
}
