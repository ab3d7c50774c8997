//! Test HTTP/tunnel server
//!
//! One listening socket, one task per connection:
//! - idle timeout armed on accept (hyper header read timeout)
//! - CONNECT goes to the stub tunnel
//! - everything else goes through the ordered handler chain

use crate::handlers::HandlerChain;
use crate::request::from_hyper_request;
use crate::response::to_hyper_response;
use crate::tunnel::Tunnel;
use crate::{Method, Response, Result, ServerConfig};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, trace, warn};

/// Counts live connections
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    active: AtomicU64,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn increment(&self) -> u64 {
        self.active.fetch_add(1, Ordering::SeqCst) + 1
    }

    #[inline]
    pub fn decrement(&self) -> u64 {
        self.active.fetch_sub(1, Ordering::SeqCst) - 1
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }
}

/// Everything a connection task needs, built once at startup
struct Shared {
    config: ServerConfig,
    chain: HandlerChain,
    tunnel: Tunnel,
    tracker: Arc<ConnectionTracker>,
}

impl Shared {
    fn new(config: ServerConfig) -> Self {
        Self {
            chain: HandlerChain::from_config(&config),
            tunnel: Tunnel::new(config.tunnel_target),
            tracker: Arc::new(ConnectionTracker::new()),
            config,
        }
    }
}

/// A bound server, ready to accept
pub struct Server {
    listener: TcpListener,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("listener", &self.listener)
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Bind the listening socket described by `config`
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        let addr = config.listen_addr()?;
        let socket = create_optimized_socket(&addr)?;
        let std_listener: std::net::TcpListener = socket.into();
        std_listener.set_nonblocking(true)?;
        let listener = TcpListener::from_std(std_listener)?;

        Ok(Self {
            listener,
            shared: Arc::new(Shared::new(config)),
        })
    }

    /// Address actually bound (resolves port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.shared.config
    }

    pub fn tracker(&self) -> Arc<ConnectionTracker> {
        self.shared.tracker.clone()
    }

    /// Accept connections until the task is dropped
    pub async fn run(self) -> Result<()> {
        info!(
            addr = %self.local_addr()?,
            tunnel_target = %self.shared.tunnel.target(),
            idle_timeout_ms = self.shared.config.idle_timeout.as_millis() as u64,
            "listening"
        );

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            };

            tokio::spawn(serve_connection(self.shared.clone(), stream, peer));
        }
    }
}

async fn serve_connection(shared: Arc<Shared>, stream: TcpStream, peer: SocketAddr) {
    let active = shared.tracker.increment();
    debug!(%peer, active, "connection accepted");

    if let Err(e) = drive_connection(shared.clone(), stream, peer).await {
        debug!(%peer, error = %e, "connection ended with error");
    }

    let active = shared.tracker.decrement();
    debug!(%peer, active, "connection closed");
}

/// Run the HTTP/1.1 state machine on one accepted stream
async fn drive_connection(shared: Arc<Shared>, stream: TcpStream, peer: SocketAddr) -> Result<()> {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(%peer, error = %e, "set_nodelay failed");
    }

    let io = TokioIo::new(stream);
    let svc_shared = shared.clone();
    let service = service_fn(move |req| {
        let shared = svc_shared.clone();
        async move { handle_request(shared, req, peer).await }
    });

    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(shared.config.idle_timeout);

    builder.serve_connection(io, service).with_upgrades().await?;
    Ok(())
}

async fn handle_request(
    shared: Arc<Shared>,
    mut req: hyper::Request<Incoming>,
    peer: SocketAddr,
) -> Result<hyper::Response<Full<Bytes>>> {
    let request = from_hyper_request(&req, Some(peer));
    debug!(%peer, method = %request.method_name, target = %request.target, "request");

    if request.is(Method::Connect) {
        let on_upgrade = hyper::upgrade::on(&mut req);
        let outbound = match shared.tunnel.dial().await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(%peer, requested = %request.target, error = %e, "tunnel dial failed");
                return Err(e);
            }
        };
        info!(%peer, requested = %request.target, target = %shared.tunnel.target(), "tunnel established");

        tokio::spawn(async move {
            match on_upgrade.await {
                Ok(upgraded) => match Tunnel::forward_head(upgraded, outbound).await {
                    Ok(n) => debug!(%peer, head_bytes = n, "tunnel closed"),
                    Err(e) => debug!(%peer, error = %e, "tunnel forward failed"),
                },
                Err(e) => debug!(%peer, error = %e, "upgrade failed"),
            }
        });

        return to_hyper_response(Tunnel::established());
    }

    let response = match shared.chain.dispatch(&request) {
        Some((handler, fut)) => {
            trace!(%peer, handler, "dispatched");
            fut.await
        }
        None => Response::ok(),
    };

    to_hyper_response(response)
}

/// Create a TCP socket with optimizations
pub fn create_optimized_socket(addr: &SocketAddr) -> std::io::Result<Socket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    // SO_REUSEADDR - allow binding to address in TIME_WAIT
    socket.set_reuse_address(true)?;

    // SO_REUSEPORT - lets a restarted server rebind while old sockets linger
    #[cfg(unix)]
    socket.set_reuse_port(true)?;

    // TCP_NODELAY - disable Nagle's algorithm for lower latency
    socket.set_nodelay(true)?;

    socket.bind(&(*addr).into())?;

    // Listen with backlog
    socket.listen(1024)?;

    Ok(socket)
}
