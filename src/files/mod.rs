//! Static file serving
//!
//! Maps request paths onto a document root and decides which response a
//! request gets.

pub mod document_root;
pub mod router;

pub use document_root::{DocumentRoot, Resolution};
pub use router::route;
