//! Catch-all handler: fixed body after a short delay

use super::{Handler, ResponseFuture};
use crate::{Request, Response};
use std::time::Duration;

pub const HELLO_BODY: &str = "Hello World";

/// Answers every request with `Hello World` once `delay` has elapsed
#[derive(Debug, Clone, Copy)]
pub struct Hello {
    delay: Duration,
}

impl Hello {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Handler for Hello {
    fn matches(&self, _req: &Request) -> bool {
        true
    }

    fn respond(&self, _req: &Request) -> ResponseFuture {
        let delay = self.delay;
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            Response::text(HELLO_BODY)
        })
    }

    fn name(&self) -> &'static str {
        "hello"
    }
}
