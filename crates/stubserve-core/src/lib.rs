//! stubserve-core: fixed-response HTTP server for client testing
//!
//! Answers every request with `200 Hello World` after a short delay,
//! answers TRACE with a fixed TRACE body, and stubs CONNECT by dialing
//! a configured target, forwarding the buffered head bytes and hanging
//! up on both sides.
//!
//! ```no_run
//! # async fn run() -> stubserve_core::Result<()> {
//! use stubserve_core::{Server, ServerConfig};
//!
//! let server = Server::bind(ServerConfig::default()).await?;
//! server.run().await
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod method;
pub mod request;
pub mod response;
pub mod server;
pub mod tunnel;

// Re-exports
pub use config::ServerConfig;
pub use error::{Error, Result};
pub use handlers::{Handler, HandlerChain, Hello, Trace, HELLO_BODY, TRACE_BODY};
pub use method::Method;
pub use request::Request;
pub use response::{Response, ResponseBuilder, StatusCode};
pub use server::{create_optimized_socket, ConnectionTracker, Server};
pub use tunnel::{Tunnel, ESTABLISHED_REASON, PROXY_AGENT};
