#![allow(dead_code)]

use lantern::config::Config;
use lantern::http::headers::Headers;
use lantern::server::Listener;
use std::io::{BufRead, BufReader, Read};
use std::net::{SocketAddr, TcpStream};
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tempfile::TempDir;

pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Reply {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

/// Payload of `/big-<n>.bin`, distinct per `n`.
pub fn big_payload(n: u8) -> Vec<u8> {
    (0..512 * 1024u32)
        .map(|i| (i % 251) as u8 ^ n)
        .collect()
}

pub fn document_root() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), b"<h1>Lantern</h1>").unwrap();
    std::fs::write(dir.path().join("big-1.bin"), big_payload(1)).unwrap();
    std::fs::write(dir.path().join("big-2.bin"), big_payload(2)).unwrap();
    std::fs::create_dir(dir.path().join("docs")).unwrap();
    dir
}

pub fn config(root: &Path, pool_size: usize, keep_alive_timeout_secs: u64) -> Config {
    let mut cfg = Config::default();
    cfg.server.listen_addr = "127.0.0.1:0".to_string();
    cfg.server.pool_size = pool_size;
    cfg.server.keep_alive_timeout_secs = keep_alive_timeout_secs;
    cfg.server.server_name = "Lantern-Test".to_string();
    cfg.static_files.document_root = root.to_path_buf();
    cfg
}

pub struct TestServer {
    pub listener: Arc<Listener>,
    pub addr: SocketAddr,
    handle: Option<JoinHandle<anyhow::Result<()>>>,
    _root: TempDir,
}

impl TestServer {
    pub fn start(pool_size: usize, keep_alive_timeout_secs: u64) -> Self {
        let root = document_root();
        let listener = Arc::new(
            Listener::new(&config(root.path(), pool_size, keep_alive_timeout_secs)).unwrap(),
        );
        let addr = listener.bind().unwrap();

        let handle = {
            let listener = Arc::clone(&listener);
            thread::spawn(move || listener.start())
        };

        Self {
            listener,
            addr,
            handle: Some(handle),
            _root: root,
        }
    }

    pub fn connect(&self) -> (TcpStream, BufReader<TcpStream>) {
        connect(self.addr)
    }

    /// Stops the listener and waits for every connection to drain.
    pub fn shutdown(mut self) -> anyhow::Result<()> {
        self.listener.stop();
        match self.handle.take() {
            Some(handle) => handle.join().unwrap(),
            None => Ok(()),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.listener.stop();
            let _ = handle.join();
        }
    }
}

pub fn connect(addr: SocketAddr) -> (TcpStream, BufReader<TcpStream>) {
    let stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(CLIENT_TIMEOUT)).unwrap();
    let reader = BufReader::new(stream.try_clone().unwrap());
    (stream, reader)
}

/// Reads one response; the body is read only when `with_body` is set.
pub fn read_reply<R: BufRead>(reader: &mut R, with_body: bool) -> Reply {
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    assert!(!line.is_empty(), "connection closed before a response arrived");

    let status = line.split(' ').nth(1).unwrap().parse().unwrap();

    let mut headers = Headers::new();
    loop {
        line.clear();
        reader.read_line(&mut line).unwrap();
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }
        let (k, v) = trimmed.split_once(':').unwrap();
        headers.insert(k, v);
    }

    let len = if with_body {
        headers
            .get("Content-Length")
            .map(|v| v.parse().unwrap())
            .unwrap_or(0)
    } else {
        0
    };

    let mut body = vec![0; len];
    reader.read_exact(&mut body).unwrap();

    Reply {
        status,
        headers,
        body,
    }
}

/// True when the peer has closed its side (read returns EOF).
pub fn is_closed<R: Read>(reader: &mut R) -> bool {
    let mut buf = [0u8; 1];
    matches!(reader.read(&mut buf), Ok(0))
}
