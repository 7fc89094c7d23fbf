use std::io::{self, BufRead, Read};

use crate::http::headers::Headers;
use crate::http::request::{Method, Request, parse_query, split_uri};

const MAX_LINE_LEN: usize = 8 * 1024;
const MAX_HEADER_LINES: usize = 100;

#[derive(Debug)]
pub enum ParseError {
    /// The peer closed the stream before sending a request line
    ConnectionClosed,
    /// The bytes received do not form a request
    BadRequest(String),
    /// No request arrived within the socket read timeout
    Timeout,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::ConnectionClosed => write!(f, "connection closed by peer"),
            ParseError::BadRequest(reason) => write!(f, "bad request: {}", reason),
            ParseError::Timeout => write!(f, "timed out waiting for request"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Reads one request (request line plus header block) from `reader`.
///
/// Blocks until the blank line ending the header block is seen. Bytes past
/// that line are left in the reader for the next call.
pub fn parse_request<R: BufRead>(reader: &mut R) -> Result<Request, ParseError> {
    let mut raw = Vec::new();

    let request_line = match read_line(reader, &mut raw) {
        Ok(Some(line)) => line,
        Ok(None) => return Err(ParseError::ConnectionClosed),
        Err(LineError::Io(e)) if is_closed(&e) => return Err(ParseError::ConnectionClosed),
        Err(e) => return Err(e.into()),
    };

    let mut parts = request_line.splitn(3, ' ');
    let method = next_token(&mut parts, "method")?;
    let uri = next_token(&mut parts, "uri")?;
    let version = next_token(&mut parts, "version")?;

    let mut headers = Headers::new();
    let mut count = 0;

    loop {
        let line = read_line(reader, &mut raw)?
            .ok_or_else(|| bad("stream ended inside header block"))?;

        if line.is_empty() {
            break;
        }

        count += 1;
        if count > MAX_HEADER_LINES {
            return Err(bad("too many header lines"));
        }

        // Lines without a colon are ignored
        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.trim(), value.trim());
        }
    }

    let (path, query) = split_uri(uri);

    Ok(Request {
        method: Method::parse(method),
        uri: uri.to_string(),
        version: version.to_string(),
        path: path.to_string(),
        query: query.to_string(),
        params: parse_query(query),
        headers,
        raw,
    })
}

enum LineError {
    Io(io::Error),
    TooLong,
    Encoding,
}

impl From<LineError> for ParseError {
    fn from(e: LineError) -> Self {
        match e {
            LineError::Io(e) if is_timeout(&e) => ParseError::Timeout,
            LineError::Io(e) => bad(format!("read failed: {}", e)),
            LineError::TooLong => bad("line too long"),
            LineError::Encoding => bad("line is not valid UTF-8"),
        }
    }
}

/// Reads a line terminated by `\n` or `\r\n`, without the terminator.
/// `Ok(None)` means the stream was already at EOF.
fn read_line<R: BufRead>(reader: &mut R, raw: &mut Vec<u8>) -> Result<Option<String>, LineError> {
    let mut line = Vec::new();
    let n = reader
        .by_ref()
        .take(MAX_LINE_LEN as u64 + 1)
        .read_until(b'\n', &mut line)
        .map_err(LineError::Io)?;

    if n == 0 {
        return Ok(None);
    }
    if line.len() > MAX_LINE_LEN {
        return Err(LineError::TooLong);
    }

    raw.extend_from_slice(&line);

    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }

    String::from_utf8(line).map(Some).map_err(|_| LineError::Encoding)
}

fn next_token<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    what: &str,
) -> Result<&'a str, ParseError> {
    parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| bad(format!("request line missing {}", what)))
}

fn bad(reason: impl Into<String>) -> ParseError {
    ParseError::BadRequest(reason.into())
}

// Unix reports an expired SO_RCVTIMEO as WouldBlock, Windows as TimedOut.
fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

fn is_closed(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted | io::ErrorKind::UnexpectedEof
    )
}
