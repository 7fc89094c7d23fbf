//! HTTP protocol implementation.
//!
//! This module implements the minimal HTTP/1.x subset the server speaks:
//! blocking request parsing, response serialization, and the per-connection
//! keep-alive loop.
//!
//! # Architecture
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`connection`**: The main connection handler implementing the request-response state machine
//! - **`parser`**: Reads one request head from a buffered stream
//! - **`request`**: HTTP request representation and URI/query helpers
//! - **`headers`**: Ordered, case-sensitive header collection
//! - **`response`**: Response variants (empty, file, head-only, raw)
//! - **`writer`**: Serializes and writes HTTP responses to the client
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! Each client connection goes through a state machine:
//!
//! ```text
//!        ┌──────────────────┐
//!        │   AwaitRequest   │ ← Block on the socket for the next request
//!        └──────┬───────────┘
//!               │ Request parsed
//!               │   (peer closed / idle timeout → Closed,
//!               │    malformed → 501 reply → Closed)
//!               ▼
//!        ┌──────────────────┐
//!        │     Respond      │ ← Route, stamp headers, write response
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive → AwaitRequest (read timeout armed)
//!               └─ Close → Closed
//! ```
//!
//! # Example
//!
//! ```ignore
//! use lantern::config::Config;
//! use lantern::http::connection::{Connection, ServeContext};
//! use std::net::TcpListener;
//! use std::sync::Arc;
//!
//! fn main() -> anyhow::Result<()> {
//!     let ctx = Arc::new(ServeContext::from_config(&Config::default())?);
//!     let listener = TcpListener::bind("127.0.0.1:8080")?;
//!
//!     for stream in listener.incoming() {
//!         let mut conn = Connection::new(stream?, Arc::clone(&ctx))?;
//!         conn.run();
//!     }
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod headers;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
