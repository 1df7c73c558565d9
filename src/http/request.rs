//! HTTP/1.1 request parsing using the [`httparse`] crate.

use thiserror::Error;
use url::form_urlencoded;

use super::{Headers, Method};

/// Errors that can occur while parsing an HTTP/1.1 request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request is incomplete, more data needed")]
    Incomplete,

    #[error("HTTP parse error: {0}")]
    Parse(#[from] httparse::Error),

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid Content-Length header")]
    InvalidContentLength,
}

/// A parsed HTTP/1.1 request.
///
/// Query parameters are decoded with `application/x-www-form-urlencoded`
/// rules, so `?search=open+sans` and `?search=open%20sans` read the same.
///
/// # Examples
///
/// ```
/// use fontdeck::http::Request;
///
/// let raw = b"GET /api/fonts/google?search=open+sans&page=2 HTTP/1.1\r\nHost: localhost\r\n\r\n";
/// let (request, _offset) = Request::parse(raw).unwrap();
///
/// assert_eq!(request.path(), "/api/fonts/google");
/// assert_eq!(request.query("search"), Some("open sans"));
/// assert_eq!(request.query("page"), Some("2"));
/// ```
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    /// HTTP minor version: 0 for HTTP/1.0, 1 for HTTP/1.1.
    version: u8,
    headers: Headers,
    query: Vec<(String, String)>,
}

impl Request {
    const MAX_HEADERS: usize = 64;

    /// Parse the request head in `buf`.
    ///
    /// Returns the request and the offset at which its body starts. A
    /// malformed `Content-Length` is rejected here; the body itself is left
    /// in `buf` for the caller to skip.
    pub fn parse(buf: &[u8]) -> Result<(Self, usize), RequestError> {
        let mut headers = [httparse::EMPTY_HEADER; Self::MAX_HEADERS];
        let mut raw = httparse::Request::new(&mut headers);

        let body_offset = match raw.parse(buf)? {
            httparse::Status::Complete(offset) => offset,
            httparse::Status::Partial => return Err(RequestError::Incomplete),
        };

        let method = Method::from(
            raw.method
                .ok_or(RequestError::MissingField { field: "method" })?,
        );
        let target = raw.path.ok_or(RequestError::MissingField { field: "path" })?;
        let version = raw
            .version
            .ok_or(RequestError::MissingField { field: "version" })?;

        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_owned(), parse_query(query)),
            None => (target.to_owned(), Vec::new()),
        };

        let mut header_map = Headers::with_capacity(raw.headers.len());
        for header in raw.headers.iter() {
            if let Ok(value) = std::str::from_utf8(header.value) {
                header_map.append(header.name, value);
            }
        }

        let request = Self {
            method,
            path,
            version,
            headers: header_map,
            query,
        };
        request.content_length()?;

        Ok((request, body_offset))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// First decoded value of query parameter `key`.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// HTTP/1.1 defaults to keep-alive; HTTP/1.0 only with an explicit header.
    pub fn is_keep_alive(&self) -> bool {
        match self.headers.get("connection") {
            Some(conn) if conn.eq_ignore_ascii_case("close") => false,
            Some(conn) if conn.eq_ignore_ascii_case("keep-alive") => true,
            _ => self.version == 1,
        }
    }

    pub fn content_length(&self) -> Result<Option<usize>, RequestError> {
        self.headers
            .get("content-length")
            .map(|v| {
                v.trim()
                    .parse()
                    .map_err(|_| RequestError::InvalidContentLength)
            })
            .transpose()
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
