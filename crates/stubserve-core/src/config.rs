//! Server configuration

use crate::{Error, Result};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default listen port
pub const DEFAULT_PORT: u16 = 10000;

/// Default idle timeout applied to every accepted connection
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(20_000);

/// Default delay before the generic response is written
pub const DEFAULT_RESPONSE_DELAY: Duration = Duration::from_millis(1);

/// Default CONNECT tunnel target. Same port as the listener.
pub const DEFAULT_TUNNEL_TARGET: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT);

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub hostname: String,
    pub port: u16,
    /// Connections that deliver no request head within this window are closed
    pub idle_timeout: Duration,
    pub response_delay: Duration,
    /// Where CONNECT requests are tunneled, whatever authority they name
    pub tunnel_target: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            response_delay: DEFAULT_RESPONSE_DELAY,
            tunnel_target: DEFAULT_TUNNEL_TARGET,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn response_delay(mut self, delay: Duration) -> Self {
        self.response_delay = delay;
        self
    }

    pub fn tunnel_target(mut self, target: SocketAddr) -> Self {
        self.tunnel_target = target;
        self
    }

    /// Resolve `hostname:port` into a socket address
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .hostname
            .parse()
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", self.hostname, e)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 10000);
        assert_eq!(config.idle_timeout, Duration::from_secs(20));
        assert_eq!(config.response_delay, Duration::from_millis(1));
        assert_eq!(config.tunnel_target.to_string(), "127.0.0.1:10000");
        assert_eq!(config.listen_addr().unwrap().to_string(), "0.0.0.0:10000");
    }

    #[test]
    fn test_builder_overrides() {
        let config = ServerConfig::new()
            .hostname("127.0.0.1")
            .port(0)
            .idle_timeout(Duration::from_millis(50))
            .tunnel_target("127.0.0.1:9".parse().unwrap());
        assert_eq!(config.listen_addr().unwrap().to_string(), "127.0.0.1:0");
        assert_eq!(config.idle_timeout, Duration::from_millis(50));
        assert_eq!(config.tunnel_target.port(), 9);
    }

    #[test]
    fn test_invalid_hostname() {
        let config = ServerConfig::new().hostname("not an ip");
        assert!(matches!(config.listen_addr(), Err(Error::InvalidAddress(_))));
    }
}
