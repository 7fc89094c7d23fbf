use std::fs::File;
use std::io::{self, Read, Write};

use crate::http::response::{Body, Response};

pub const HTTP_VERSION: &str = "HTTP/1.1";

/// Serializes the status line, headers and the blank separator line.
pub fn serialize_head(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::new();

    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status().as_u16(),
        resp.status().reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    for (k, v) in resp.headers().iter() {
        buf.extend_from_slice(k.as_bytes());
        buf.push(b':');
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    buf.extend_from_slice(b"\r\n");
    buf
}

/// Writes a whole response and flushes `out`.
pub fn write_response<W: Write>(resp: &Response, out: &mut W) -> io::Result<()> {
    out.write_all(&serialize_head(resp))?;

    match resp.body() {
        Body::Empty | Body::Head { .. } => {}
        Body::Raw(content) => out.write_all(content)?,
        Body::File { path, len } => {
            let file = File::open(path)?;
            // Never send more than the Content-Length already written
            let copied = io::copy(&mut file.take(*len), out)?;
            if copied != *len {
                tracing::warn!(
                    path = %path.display(),
                    expected = *len,
                    copied,
                    "File shrank while being sent"
                );
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("sent {} of {} body bytes", copied, len),
                ));
            }
        }
    }

    out.flush()
}

/// Writes responses to one connection, logging failures instead of
/// propagating them.
pub struct ResponseWriter<W: Write> {
    out: W,
}

impl<W: Write> ResponseWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns `false` if the response could not be fully written.
    pub fn send(&mut self, response: &Response) -> bool {
        match write_response(response, &mut self.out) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    status = response.status().as_u16(),
                    error = %e,
                    "Failed to write response"
                );
                false
            }
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
