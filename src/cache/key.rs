//! Cache key generation.

use crate::types::Request;
use sha2::{Digest, Sha256};
use url::Url;

/// Normalized request identity: upper-cased method plus the URL without its fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    pub fn new(method: impl AsRef<str>, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            method: method.as_ref().to_ascii_uppercase(),
            url: url.into(),
        }
    }

    pub fn from_request(request: &Request) -> Self {
        Self::new(request.method(), request.url())
    }

    /// Stable hex digest of the key, used where the raw key is not a safe identifier.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.method.as_bytes());
        hasher.update(b" ");
        hasher.update(self.url.as_bytes());
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

impl From<&Request> for RequestKey {
    fn from(request: &Request) -> Self {
        Self::from_request(request)
    }
}
