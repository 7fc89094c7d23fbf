use std::collections::HashMap;

use crate::http::headers::Headers;

/// HTTP request methods.
///
/// Only GET, HEAD and TRACE are served. Any other token is preserved
/// verbatim in `Other` and answered with 501 Not Implemented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a file
    GET,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// TRACE - Echo the received request back to the client
    TRACE,
    /// Any method this server does not implement
    Other(String),
}

/// Represents a parsed HTTP request from a client.
///
/// Built once by the parser and only read afterwards.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method
    pub method: Method,
    /// The request target exactly as sent (e.g., "/search?q=rust")
    pub uri: String,
    /// Protocol version token (e.g., "HTTP/1.1")
    pub version: String,
    /// The part of the URI before the first `?`
    pub path: String,
    /// The part of the URI after the first `?`, empty when absent
    pub query: String,
    /// Request headers, trimmed, last occurrence wins
    pub headers: Headers,
    /// Query parameters, trimmed, pairs without `=` dropped
    pub params: HashMap<String, String>,
    /// Request line and header block exactly as received
    pub raw: Vec<u8>,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    method: Option<Method>,
    uri: Option<String>,
    version: Option<String>,
    headers: Headers,
}

impl Method {
    /// Parses an HTTP method token.
    ///
    /// Matching is case-sensitive; unknown tokens map to `Method::Other`.
    ///
    /// # Example
    ///
    /// ```
    /// # use lantern::http::request::Method;
    /// assert_eq!(Method::parse("GET"), Method::GET);
    /// assert_eq!(Method::parse("get"), Method::Other("get".to_string()));
    /// ```
    pub fn parse(s: &str) -> Self {
        match s {
            "GET" => Method::GET,
            "HEAD" => Method::HEAD,
            "TRACE" => Method::TRACE,
            other => Method::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::TRACE => "TRACE",
            Method::Other(s) => s,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Splits a request target on the first `?` into path and query.
///
/// # Example
///
/// ```
/// # use lantern::http::request::split_uri;
/// assert_eq!(split_uri("/a?b=1?c"), ("/a", "b=1?c"));
/// assert_eq!(split_uri("/a"), ("/a", ""));
/// ```
pub fn split_uri(uri: &str) -> (&str, &str) {
    uri.split_once('?').unwrap_or((uri, ""))
}

/// Parses an `&`-delimited query string into trimmed key/value pairs.
///
/// Each pair is split on its first `=`; pairs without one are dropped.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            uri: None,
            version: None,
            headers: Headers::new(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Builds the request, synthesizing `raw` from the request line and headers.
    pub fn build(self) -> Result<Request, &'static str> {
        let method = self.method.ok_or("method missing")?;
        let uri = self.uri.ok_or("uri missing")?;
        let version = self.version.unwrap_or_else(|| "HTTP/1.1".to_string());

        let mut raw = format!("{} {} {}\r\n", method, uri, version);
        for (k, v) in self.headers.iter() {
            raw.push_str(&format!("{}: {}\r\n", k, v));
        }
        raw.push_str("\r\n");

        let (path, query) = split_uri(&uri);
        let params = parse_query(query);

        Ok(Request {
            method,
            path: path.to_string(),
            query: query.to_string(),
            uri,
            version,
            headers: self.headers,
            params,
            raw: raw.into_bytes(),
        })
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    /// Retrieves a header value by its exact name.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    /// Retrieves a query parameter by name.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(|v| v.as_str())
    }

    /// Determines whether the connection should remain open after the response.
    ///
    /// True only when a `Connection` header (any case) equals `keep-alive`
    /// (any case). Without the header the connection closes after one
    /// response, whatever version the client announced.
    pub fn keep_alive(&self) -> bool {
        self.headers
            .get_ignore_case("Connection")
            .map(|v| v.eq_ignore_ascii_case("keep-alive"))
            .unwrap_or(false)
    }
}
