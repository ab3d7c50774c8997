//! stubserve: run the fixed-response test server until killed

mod logger;

use anyhow::{Context, Result};
use clap::Parser;
use mimalloc::MiMalloc;
use std::net::SocketAddr;
use std::time::Duration;
use stubserve_core::config::{DEFAULT_PORT, DEFAULT_TUNNEL_TARGET};
use stubserve_core::{Server, ServerConfig};
use tracing::{error, info};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Interface to listen on
    #[arg(long, default_value = "0.0.0.0")]
    hostname: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Close connections that send no request within this many milliseconds
    #[arg(long, default_value_t = 20_000)]
    idle_timeout_ms: u64,

    /// Delay before the generic response, in milliseconds
    #[arg(long, default_value_t = 1)]
    delay_ms: u64,

    /// Address every CONNECT tunnel dials, whatever the client asked for
    #[arg(long, default_value_t = DEFAULT_TUNNEL_TARGET)]
    tunnel_target: SocketAddr,
}

impl Cli {
    fn into_config(self) -> ServerConfig {
        ServerConfig::new()
            .hostname(self.hostname)
            .port(self.port)
            .idle_timeout(Duration::from_millis(self.idle_timeout_ms))
            .response_delay(Duration::from_millis(self.delay_ms))
            .tunnel_target(self.tunnel_target)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init()?;

    let server = start(cli.into_config()).await?;
    server.run().await.context("Server stopped")
}

/// Bind the listener, logging the outcome
async fn start(config: ServerConfig) -> Result<Server> {
    info!(
        hostname = %config.hostname,
        port = config.port,
        delay_ms = config.response_delay.as_millis() as u64,
        "starting"
    );

    let hostname = config.hostname.clone();
    let port = config.port;
    match Server::bind(config).await {
        Ok(server) => Ok(server),
        Err(e) => {
            error!(%hostname, port, error = %e, "startup failed");
            Err(e).with_context(|| format!("Failed to bind {}:{}", hostname, port))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_core_config() {
        let config = Cli::parse_from(["stubserve"]).into_config();
        let expected = ServerConfig::default();

        assert_eq!(config.hostname, expected.hostname);
        assert_eq!(config.port, expected.port);
        assert_eq!(config.idle_timeout, expected.idle_timeout);
        assert_eq!(config.response_delay, expected.response_delay);
        assert_eq!(config.tunnel_target, expected.tunnel_target);
    }

    #[test]
    fn test_overrides() {
        let config = Cli::parse_from([
            "stubserve",
            "--hostname",
            "127.0.0.1",
            "-p",
            "8080",
            "--idle-timeout-ms",
            "500",
            "--delay-ms",
            "0",
            "--tunnel-target",
            "127.0.0.1:9000",
        ])
        .into_config();

        assert_eq!(config.listen_addr().unwrap().to_string(), "127.0.0.1:8080");
        assert_eq!(config.idle_timeout, Duration::from_millis(500));
        assert_eq!(config.response_delay, Duration::ZERO);
        assert_eq!(config.tunnel_target.port(), 9000);
    }

    #[tokio::test]
    async fn test_start_binds_requested_port() {
        let config = ServerConfig::new().hostname("127.0.0.1").port(0);
        let server = start(config).await.unwrap();
        assert_ne!(server.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_start_reports_bad_hostname() {
        let err = start(ServerConfig::new().hostname("nowhere")).await.unwrap_err();
        assert!(err.to_string().contains("Failed to bind nowhere:10000"));
    }

    #[test]
    fn test_rejects_bad_tunnel_target() {
        assert!(Cli::try_parse_from(["stubserve", "--tunnel-target", "nowhere"]).is_err());
    }
}
