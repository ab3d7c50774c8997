//! Stub CONNECT tunnel
//!
//! The requested authority is ignored. Every tunnel dials the configured
//! target, forwards whatever the client sent past the CONNECT head, then
//! closes both sides. Nothing is relayed back to the client.

use crate::{Error, Response, ResponseBuilder, Result, StatusCode};
use bytes::Bytes;
use hyper::upgrade::Upgraded;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// Reason phrase of the tunnel setup response
pub const ESTABLISHED_REASON: &str = "Connection Established";

/// Value of the `Proxy-agent` header
pub const PROXY_AGENT: &str = "Node.js-Proxy";

/// Dialer for the fixed tunnel target
#[derive(Debug, Clone, Copy)]
pub struct Tunnel {
    target: SocketAddr,
}

impl Tunnel {
    pub fn new(target: SocketAddr) -> Self {
        Self { target }
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Open the outbound connection
    pub async fn dial(&self) -> Result<TcpStream> {
        TcpStream::connect(self.target)
            .await
            .map_err(|source| Error::Tunnel {
                target: self.target,
                source,
            })
    }

    /// `200 Connection Established` with no body
    pub fn established() -> Response {
        ResponseBuilder::new(StatusCode::OK)
            .reason(ESTABLISHED_REASON)
            .header("Proxy-agent", PROXY_AGENT)
            .build()
    }

    /// Forward the buffered head to `outbound` and close both ends.
    ///
    /// Returns the number of head bytes forwarded.
    pub async fn forward_head(client: Upgraded, mut outbound: TcpStream) -> Result<usize> {
        match client.downcast::<TokioIo<TcpStream>>() {
            Ok(parts) => {
                let mut client = parts.io.into_inner();
                close_both(&mut client, &mut outbound, parts.read_buf).await
            }
            Err(upgraded) => {
                let mut client = TokioIo::new(upgraded);
                close_both(&mut client, &mut outbound, Bytes::new()).await
            }
        }
    }
}

async fn close_both<C>(client: &mut C, outbound: &mut TcpStream, head: Bytes) -> Result<usize>
where
    C: AsyncWrite + Unpin,
{
    outbound.write_all(&head).await?;
    outbound.shutdown().await?;
    client.shutdown().await?;
    Ok(head.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_established_response() {
        let res = Tunnel::established();
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.reason_phrase(), "Connection Established");
        assert_eq!(res.header("proxy-agent"), Some("Node.js-Proxy"));
        assert!(res.body.is_empty());
    }

    #[tokio::test]
    async fn test_dial_reaches_target() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let tunnel = Tunnel::new(listener.local_addr().unwrap());

        let outbound = tunnel.dial().await.unwrap();
        let (_accepted, peer) = listener.accept().await.unwrap();
        assert_eq!(peer, outbound.local_addr().unwrap());
    }

    #[tokio::test]
    async fn test_dial_refused_names_target() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let target = listener.local_addr().unwrap();
        drop(listener);

        let err = Tunnel::new(target).dial().await.unwrap_err();
        assert!(matches!(err, Error::Tunnel { target: t, .. } if t == target));
    }

    #[tokio::test]
    async fn test_close_both_forwards_head() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut outbound = TcpStream::connect(addr).await.unwrap();
        let (mut target_side, _) = listener.accept().await.unwrap();
        let mut client = TcpStream::connect(addr).await.unwrap();
        let (mut client_peer, _) = listener.accept().await.unwrap();

        let sent = close_both(&mut client, &mut outbound, Bytes::from_static(b"early bytes"))
            .await
            .unwrap();
        assert_eq!(sent, 11);

        let mut received = Vec::new();
        target_side.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"early bytes");

        let mut rest = Vec::new();
        client_peer.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }
}
