//! Connection dispatch
//!
//! The listener accepts sockets on one thread and queues each one on a
//! fixed-size worker pool; a worker owns its connection until it closes.

pub mod listener;
pub mod pool;

pub use listener::Listener;
pub use pool::WorkerPool;
