//! Lantern - Thread-pooled static file server
//!
//! Core library for request parsing, routing against a document root, and
//! keep-alive connection handling.

pub mod config;
pub mod files;
pub mod http;
pub mod server;
