//! Intercepted request.

use crate::Result;
use url::Url;

/// Schemes the cache layer is allowed to intercept.
const WEB_SCHEMES: [&str; 2] = ["http", "https"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: String,
    url: Url,
    headers: Vec<(String, String)>,
    client_id: Option<String>,
}

impl Request {
    pub fn new(method: impl AsRef<str>, url: Url) -> Self {
        Self {
            method: method.as_ref().to_ascii_uppercase(),
            url,
            headers: Vec::new(),
            client_id: None,
        }
    }

    /// Build a `GET` request from an absolute URL string.
    pub fn get(url: &str) -> Result<Self> {
        Ok(Self::new("GET", Url::parse(url)?))
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Tag the request with the id of the client (page) that issued it.
    pub fn with_client(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Only `GET` requests are eligible for caching.
    pub fn is_read(&self) -> bool {
        self.method == "GET"
    }

    pub fn is_web_scheme(&self) -> bool {
        WEB_SCHEMES.contains(&self.url.scheme())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_is_normalized() {
        let req = Request::new("post", Url::parse("https://example.com/api").unwrap());
        assert_eq!(req.method(), "POST");
        assert!(!req.is_read());
    }

    #[test]
    fn test_extension_scheme_is_not_web() {
        let req = Request::get("chrome-extension://abcdef/script.js").unwrap();
        assert!(req.is_read());
        assert!(!req.is_web_scheme());
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let req = Request::get("https://example.com/")
            .unwrap()
            .with_header("Accept", "text/html");
        assert_eq!(req.header("accept"), Some("text/html"));
        assert_eq!(req.header("x-missing"), None);
    }
}
