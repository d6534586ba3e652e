//! 类型系统模块：定义被拦截的请求与捕获的响应。
//!
//! # Types Module
//!
//! Request and response values exchanged between callers, the network and the cache.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Request`] | An intercepted request (method, URL, headers, originating client) |
//! | [`Response`] | A captured response: status, headers and a body snapshot |
//!
//! Both types are plain data: cloning a [`Response`] is cheap because the body is
//! reference-counted [`bytes::Bytes`].
//!
//! ## Example
//!
//! ```rust
//! use offline_cache::types::{Request, Response};
//!
//! let req = Request::get("https://prompts.example.com/categories/writing").unwrap();
//! assert!(req.is_read());
//!
//! let resp = Response::ok("<html></html>").with_header("content-type", "text/html");
//! assert!(resp.is_success());
//! ```

pub mod request;
pub mod response;

pub use request::Request;
pub use response::{Response, UNAVAILABLE_STATUS};
