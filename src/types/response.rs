//! Captured response.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Status used when neither the network nor any partition can serve a request.
pub const UNAVAILABLE_STATUS: u16 = 503;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(skip)]
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(200, body)
    }

    /// Explicit "unavailable" response carrying a human-readable reason.
    pub fn unavailable(reason: impl AsRef<str>) -> Self {
        Self::new(
            UNAVAILABLE_STATUS,
            format!("Service Unavailable: {}", reason.as_ref()),
        )
        .with_header("content-type", "text/plain; charset=utf-8")
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// 2xx. Only these are ever written to a partition.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_len(&self) -> u64 {
        self.body.len() as u64
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
