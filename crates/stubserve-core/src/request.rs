//! HTTP Request types

use crate::Method;
use smallvec::SmallVec;
use std::net::SocketAddr;

/// HTTP Request head as seen by the dispatch chain
#[derive(Debug, Clone)]
pub struct Request {
    /// Known method, `None` for extension methods
    pub method: Option<Method>,
    /// Method token exactly as received
    pub method_name: String,
    /// Request target (origin form path, or authority form for CONNECT)
    pub target: String,
    /// Request headers (stack-allocated for small header counts)
    pub headers: SmallVec<[(String, String); 16]>,
    /// Remote peer, when known
    pub peer: Option<SocketAddr>,
}

impl Request {
    /// Create a new request
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method: Some(method),
            method_name: method.as_str().to_string(),
            target: target.into(),
            headers: SmallVec::new(),
            peer: None,
        }
    }

    /// Check the request method
    #[inline]
    pub fn is(&self, method: Method) -> bool {
        self.method == Some(method)
    }

    /// Get a header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Convert an HTTP-stack request head to our Request type
pub fn from_hyper_request<B>(req: &http::Request<B>, peer: Option<SocketAddr>) -> Request {
    let method_name = req.method().as_str().to_string();
    // CONNECT targets are authority form and carry no path
    let target = match req.uri().authority() {
        Some(authority) if req.uri().path_and_query().is_none() => authority.to_string(),
        _ => req
            .uri()
            .path_and_query()
            .map(|pq| pq.to_string())
            .unwrap_or_else(|| "/".to_string()),
    };

    let mut request = Request {
        method: Method::from_http(req.method()),
        method_name,
        target,
        headers: SmallVec::new(),
        peer,
    };

    // Copy headers
    for (name, value) in req.headers() {
        if let Ok(v) = value.to_str() {
            request.headers.push((name.to_string(), v.to_string()));
        }
    }

    request
}
