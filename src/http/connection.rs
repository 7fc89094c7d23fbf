use std::io::{self, BufReader};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::Context;

use crate::config::Config;
use crate::files::{DocumentRoot, route};
use crate::http::parser::{ParseError, parse_request};
use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::http::writer::ResponseWriter;

const BAD_REQUEST_MESSAGE: &str = "Server only accepts HTTP protocol";

/// Read-only settings shared by every connection.
#[derive(Debug)]
pub struct ServeContext {
    pub document_root: DocumentRoot,
    pub server_name: String,
    pub keep_alive_timeout: Duration,
}

impl ServeContext {
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let document_root = DocumentRoot::new(&cfg.static_files.document_root).with_context(|| {
            format!(
                "Invalid document root {}",
                cfg.static_files.document_root.display()
            )
        })?;

        Ok(Self {
            document_root,
            server_name: cfg.server.server_name.clone(),
            keep_alive_timeout: cfg.keep_alive_timeout(),
        })
    }
}

pub enum ConnectionState {
    AwaitRequest,
    Respond(Request),
    Closed,
}

pub struct Connection {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
    writer: ResponseWriter<TcpStream>,
    peer: Option<SocketAddr>,
    ctx: Arc<ServeContext>,
    keep_alive: bool,
    state: ConnectionState,
}

impl Connection {
    pub fn new(stream: TcpStream, ctx: Arc<ServeContext>) -> io::Result<Self> {
        let reader = BufReader::new(stream.try_clone()?);
        let writer = ResponseWriter::new(stream.try_clone()?);
        let peer = stream.peer_addr().ok();

        Ok(Self {
            stream,
            reader,
            writer,
            peer,
            ctx,
            keep_alive: false,
            state: ConnectionState::AwaitRequest,
        })
    }

    /// Serves requests until the peer leaves, the idle window expires, a
    /// request is rejected, or a request does not ask for keep-alive.
    pub fn run(&mut self) {
        loop {
            self.state = match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::AwaitRequest => self.await_request(),
                ConnectionState::Respond(req) => self.respond(req),
                ConnectionState::Closed => break,
            };
        }

        self.close();
    }

    fn await_request(&mut self) -> ConnectionState {
        match parse_request(&mut self.reader) {
            Ok(req) => ConnectionState::Respond(req),

            Err(ParseError::ConnectionClosed) => {
                tracing::debug!(peer = ?self.peer, "Peer closed connection");
                ConnectionState::Closed
            }

            Err(ParseError::Timeout) => {
                tracing::debug!(
                    peer = ?self.peer,
                    keep_alive = self.keep_alive,
                    "Idle timeout, closing connection"
                );
                ConnectionState::Closed
            }

            Err(ParseError::BadRequest(reason)) => {
                tracing::warn!(peer = ?self.peer, %reason, "Rejecting malformed request");
                let response = self.stamp(Response::raw(StatusCode::NotImplemented, BAD_REQUEST_MESSAGE));
                self.writer.send(&response);
                ConnectionState::Closed
            }
        }
    }

    fn respond(&mut self, req: Request) -> ConnectionState {
        let mut response = self.stamp(route(&req, &self.ctx.document_root));

        self.keep_alive = req.keep_alive();
        if self.keep_alive {
            response = response.with_header("Connection", "keep-alive");
            if let Err(e) = self.enable_keep_alive() {
                tracing::warn!(peer = ?self.peer, error = %e, "Failed to enable keep-alive");
                return ConnectionState::Closed;
            }
        }

        tracing::debug!(
            peer = ?self.peer,
            method = %req.method,
            path = %req.path,
            status = response.status().as_u16(),
            "Handled request"
        );

        if !self.writer.send(&response) {
            return ConnectionState::Closed;
        }

        if self.keep_alive {
            ConnectionState::AwaitRequest
        } else {
            ConnectionState::Closed
        }
    }

    /// Adds the headers every reply carries.
    fn stamp(&self, response: Response) -> Response {
        response
            .with_header("Server", self.ctx.server_name.as_str())
            .with_header("Date", httpdate::fmt_http_date(SystemTime::now()))
    }

    fn enable_keep_alive(&self) -> io::Result<()> {
        socket2::SockRef::from(&self.stream).set_keepalive(true)?;
        self.stream.set_read_timeout(Some(self.ctx.keep_alive_timeout))
    }

    fn close(&mut self) {
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            if e.kind() != io::ErrorKind::NotConnected {
                tracing::debug!(peer = ?self.peer, error = %e, "Error shutting down socket");
            }
        }
    }
}
