//! TRACE handler: fixed body, no delay

use super::{Handler, ResponseFuture};
use crate::{Method, Request, Response};

pub const TRACE_BODY: &str = "Hello World!!!Trace!!!";

/// Answers TRACE immediately. Does not echo the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct Trace;

impl Handler for Trace {
    fn matches(&self, req: &Request) -> bool {
        req.is(Method::Trace)
    }

    fn respond(&self, _req: &Request) -> ResponseFuture {
        Box::pin(std::future::ready(Response::text(TRACE_BODY)))
    }

    fn name(&self) -> &'static str {
        "trace"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_matches_only_trace() {
        assert!(Trace.matches(&Request::new(Method::Trace, "/")));
        assert!(!Trace.matches(&Request::new(Method::Get, "/")));
        assert!(!Trace.matches(&Request::new(Method::Connect, "example.com:443")));
    }

    #[tokio::test]
    async fn test_trace_body() {
        let res = Trace.respond(&Request::new(Method::Trace, "/")).await;
        assert_eq!(res.status.as_u16(), 200);
        assert_eq!(res.content_type(), Some("text/plain"));
        assert_eq!(res.body_string().as_deref(), Some("Hello World!!!Trace!!!"));
    }
}
