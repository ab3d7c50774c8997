//! Request handlers and the ordered dispatch chain
//!
//! Handlers are consulted in registration order and the first one that
//! matches produces the response. Method-specific handlers go ahead of
//! the catch-all so a request is answered exactly once.

pub mod hello;
pub mod trace;

pub use hello::{Hello, HELLO_BODY};
pub use trace::{Trace, TRACE_BODY};

use crate::{Request, Response, ServerConfig};
use std::future::Future;
use std::pin::Pin;

/// Future resolving to a handler's response
pub type ResponseFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Handler trait - claim a request and produce its response
pub trait Handler: Send + Sync {
    /// Whether this handler answers the request
    fn matches(&self, req: &Request) -> bool;

    /// Produce the response
    fn respond(&self, req: &Request) -> ResponseFuture;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Ordered handler chain
pub struct HandlerChain {
    handlers: Vec<Box<dyn Handler>>,
}

impl HandlerChain {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Chain used by the server: TRACE first, then the delayed catch-all
    pub fn from_config(config: &ServerConfig) -> Self {
        let mut chain = Self::new();
        chain.add(Trace);
        chain.add(Hello::new(config.response_delay));
        chain
    }

    pub fn add<H: Handler + 'static>(&mut self, handler: H) {
        self.handlers.push(Box::new(handler));
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Find the first matching handler and start its response
    pub fn dispatch(&self, req: &Request) -> Option<(&'static str, ResponseFuture)> {
        self.handlers
            .iter()
            .find(|h| h.matches(req))
            .map(|h| (h.name(), h.respond(req)))
    }
}

impl Default for HandlerChain {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}
