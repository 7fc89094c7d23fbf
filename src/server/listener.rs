use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, anyhow};
use tracing::info;

use crate::config::Config;
use crate::http::connection::{Connection, ServeContext};
use crate::server::pool::WorkerPool;

/// Owns the listening socket and hands accepted connections to a worker pool.
pub struct Listener {
    listen_addr: String,
    pool_size: usize,
    ctx: Arc<ServeContext>,
    state: Mutex<ListenerState>,
}

#[derive(Default)]
struct ListenerState {
    stopped: bool,
    socket: Option<Arc<TcpListener>>,
    local_addr: Option<SocketAddr>,
}

impl Listener {
    /// Fails if the document root does not exist.
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            listen_addr: cfg.server.listen_addr.clone(),
            pool_size: cfg.server.pool_size,
            ctx: Arc::new(ServeContext::from_config(cfg)?),
            state: Mutex::new(ListenerState::default()),
        })
    }

    /// Opens the listening socket if it is not open yet and returns its address.
    pub fn bind(&self) -> anyhow::Result<SocketAddr> {
        let mut state = self.lock_state()?;
        if state.stopped {
            return Err(anyhow!("listener has been stopped"));
        }
        self.open_socket(&mut state)
    }

    fn open_socket(&self, state: &mut ListenerState) -> anyhow::Result<SocketAddr> {
        if let Some(addr) = state.local_addr {
            return Ok(addr);
        }

        let socket = TcpListener::bind(&self.listen_addr)
            .with_context(|| format!("Cannot open port {}", self.listen_addr))?;
        let addr = socket.local_addr()?;

        state.socket = Some(Arc::new(socket));
        state.local_addr = Some(addr);
        info!("Listening on {}", addr);
        Ok(addr)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lock_state().ok().and_then(|s| s.local_addr)
    }

    pub fn is_stopped(&self) -> bool {
        self.lock_state().map(|s| s.stopped).unwrap_or(true)
    }

    /// Runs the accept loop until [`Listener::stop`] is called.
    ///
    /// Returns once every accepted connection has been served. Bind failures
    /// and accept failures outside of a stop are returned as errors.
    pub fn start(&self) -> anyhow::Result<()> {
        // Flag check and bind share one lock so a racing stop() ends in Ok
        let socket = {
            let mut state = self.lock_state()?;
            if state.stopped {
                return Ok(());
            }
            self.open_socket(&mut state)?;
            state.socket.clone().ok_or_else(|| anyhow!("listener socket is closed"))?
        };

        let pool = WorkerPool::new(self.pool_size)?;
        info!(workers = pool.size(), "Accepting connections");

        let result = self.accept_loop(&socket, &pool);

        // Dropping the last handle closes the socket
        drop(socket);
        pool.drain_and_stop();
        info!("Server stopped");
        result
    }

    fn accept_loop(&self, socket: &TcpListener, pool: &WorkerPool) -> anyhow::Result<()> {
        loop {
            match socket.accept() {
                Ok((stream, peer)) => {
                    if self.is_stopped() {
                        // The wake-up connection from stop(), or a late client
                        return Ok(());
                    }

                    info!("Accepted connection from {}", peer);
                    let ctx = Arc::clone(&self.ctx);
                    pool.submit(move || serve(stream, peer, ctx))?;
                }
                Err(e) => {
                    if self.is_stopped() {
                        return Ok(());
                    }
                    return Err(e).context("Error accepting client connection");
                }
            }
        }
    }

    /// Marks the listener stopped and unblocks a pending accept.
    ///
    /// Connections already handed to workers keep running until they close.
    pub fn stop(&self) {
        let wake_addr = match self.lock_state() {
            Ok(mut state) => {
                state.stopped = true;
                state.socket.take();
                state.local_addr
            }
            Err(e) => {
                tracing::error!(error = %e, "Cannot stop listener");
                return;
            }
        };

        info!("Stopping server");

        if let Some(addr) = wake_addr {
            if let Err(e) = TcpStream::connect(connectable(addr)) {
                tracing::debug!(error = %e, "Wake-up connection failed");
            }
        }
    }

    fn lock_state(&self) -> anyhow::Result<MutexGuard<'_, ListenerState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("listener state lock poisoned"))
    }
}

fn serve(stream: TcpStream, peer: SocketAddr, ctx: Arc<ServeContext>) {
    match Connection::new(stream, ctx) {
        Ok(mut conn) => conn.run(),
        Err(e) => tracing::error!("Connection error from {}: {}", peer, e),
    }
}

/// An unspecified bind address is reachable through loopback.
fn connectable(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), addr.port())
        }
        IpAddr::V6(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), addr.port())
        }
        _ => addr,
    }
}
