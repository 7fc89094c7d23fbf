use std::io;
use std::path::{Path, PathBuf};

use crate::http::headers::Headers;
use crate::http::mime;

/// HTTP status codes produced by the server.
///
/// - `Ok` (200): File found and served
/// - `Forbidden` (403): Path escapes the document root or names a directory
/// - `NotFound` (404): Nothing exists at the resolved path
/// - `NotImplemented` (501): Unsupported method or unparseable request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 501 Not Implemented
    NotImplemented,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use lantern::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::NotImplemented => 501,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use lantern::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotImplemented.reason_phrase(), "Not Implemented");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::NotImplemented => "Not Implemented",
        }
    }
}

/// What follows the header block when a response is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Nothing
    Empty,
    /// The full contents of a regular file, opened at write time
    File { path: PathBuf, len: u64 },
    /// Headers describing a file; the file itself is never opened
    Head { path: PathBuf, len: u64 },
    /// An in-memory payload
    Raw(Vec<u8>),
}

/// A complete HTTP response ready to be sent to a client.
///
/// Status and body are fixed by the constructor. Headers can only be added
/// through [`Response::with_header`], which consumes the response, so a
/// response that has been handed to a writer can no longer change.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: Headers,
    body: Body,
}

impl Response {
    /// A response with no body.
    pub fn empty(status: StatusCode) -> Self {
        let mut headers = Headers::new();
        headers.insert("Content-Length", "0");

        Self {
            status,
            headers,
            body: Body::Empty,
        }
    }

    /// A response streaming a regular file.
    ///
    /// Fails if `path` does not exist or is not a regular file.
    pub fn file(status: StatusCode, path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let (headers, len) = file_headers(&path)?;

        Ok(Self {
            status,
            headers,
            body: Body::File { path, len },
        })
    }

    /// A header-only response describing a regular file.
    ///
    /// Carries the same headers as [`Response::file`] would, including
    /// `Content-Length`, but never writes the file's bytes.
    pub fn head(status: StatusCode, path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let (headers, len) = file_headers(&path)?;

        Ok(Self {
            status,
            headers,
            body: Body::Head { path, len },
        })
    }

    /// A plain-text response with an in-memory body.
    pub fn raw(status: StatusCode, content: impl Into<Vec<u8>>) -> Self {
        Self::raw_typed(status, "text/plain", content.into())
    }

    /// Echoes a received request back as a `message/http` body.
    pub fn echo(request_bytes: impl Into<Vec<u8>>) -> Self {
        Self::raw_typed(StatusCode::Ok, "message/http", request_bytes.into())
    }

    fn raw_typed(status: StatusCode, content_type: &str, content: Vec<u8>) -> Self {
        let mut headers = Headers::new();
        headers.insert("Content-Type", content_type);
        headers.insert("Content-Length", content.len().to_string());

        Self {
            status,
            headers,
            body: Body::Raw(content),
        }
    }

    /// Adds or replaces a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    pub fn body(&self) -> &Body {
        &self.body
    }
}

fn file_headers(path: &Path) -> io::Result<(Headers, u64)> {
    let meta = std::fs::metadata(path)?;
    if !meta.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a regular file", path.display()),
        ));
    }

    let mut headers = Headers::new();
    headers.insert("Content-Type", mime::content_type(path));
    headers.insert("Content-Length", meta.len().to_string());

    Ok((headers, meta.len()))
}
