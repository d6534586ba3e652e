//! Network access.
//!
//! The cache layer never talks to the network directly: every executor goes through a
//! [`Fetcher`], so tests can substitute a scripted network and the host can plug in its own
//! transport.

mod http;

pub use http::{HttpFetcher, TransportError};

use crate::types::{Request, Response};
use crate::Result;
use async_trait::async_trait;

/// Issues a request against the network.
///
/// A non-2xx response is still `Ok`: only transport-level failures (connection refused,
/// DNS, timeout, ...) are errors, mirroring browser `fetch` semantics.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response>;
}
