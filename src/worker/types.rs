use bytes::Bytes;
use url::Url;

use crate::worker::error::{internal_error, WorkerResult};

/// An intercepted request, reduced to what routing and caching look at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    /// The intercepted browser request. Handed back to the host untouched so
    /// its mode, credentials and redirect policy survive.
    #[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
    pub(crate) raw: Option<web_sys::Request>,
}

impl Request {
    pub fn new(method: impl Into<String>, url: Url) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            url,
            headers: Vec::new(),
            #[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
            raw: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    pub fn parse(method: &str, url: &str) -> WorkerResult<Self> {
        let url = Url::parse(url)
            .map_err(|err| internal_error(format!("Invalid request URL '{url}': {err}")))?;
        Ok(Self::new(method, url))
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Key under which the response to this request is stored.
    pub fn cache_key(&self) -> CacheKey {
        let mut url = self.url.clone();
        url.set_fragment(None);
        CacheKey {
            method: self.method.clone(),
            url: url.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub method: String,
    pub url: String,
}

/// HTTP-shaped response snapshot; cloning shares the body buffer.
///
/// Responses that came from the browser keep their body in the host object
/// (`body` stays empty), which also covers opaque cross-origin responses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    #[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
    pub(crate) raw: Option<web_sys::Response>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: String::new(),
            headers: Vec::new(),
            body: body.into(),
            #[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
            raw: None,
        }
    }

    pub fn ok_with(body: impl Into<Bytes>) -> Self {
        Self::new(200, body)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Statuses whose responses must be built without a body (101, 204, 205, 304).
    pub fn is_null_body_status(&self) -> bool {
        matches!(self.status, 101 | 204 | 205 | 304)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_ignores_fragment() {
        let a = Request::parse("get", "https://app.example/index.html#top").unwrap();
        let b = Request::parse("GET", "https://app.example/index.html").unwrap();
        assert_eq!(a.cache_key(), b.cache_key());
        assert!(a.is_get());

        let post = Request::parse("POST", "https://app.example/index.html").unwrap();
        assert_ne!(post.cache_key(), b.cache_key());
    }

    #[test]
    fn response_helpers() {
        let response = Response::new(404, "missing").with_header("Content-Type", "text/plain");
        assert!(!response.ok());
        assert_eq!(response.header("content-type"), Some("text/plain"));
        assert_eq!(response.text(), "missing");
        assert!(!response.is_null_body_status());
    }

    #[test]
    fn null_body_statuses() {
        for status in [101, 204, 205, 304] {
            assert!(Response::new(status, "").is_null_body_status(), "{status}");
        }
        for status in [200, 206, 404] {
            assert!(!Response::new(status, "").is_null_body_status(), "{status}");
        }
    }
}
