use std::sync::Arc;
use std::thread;

use anyhow::{Context, anyhow};
use lantern::config::Config;
use lantern::server::Listener;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    tracing::info!(
        document_root = %cfg.static_files.document_root.display(),
        "Starting server"
    );

    let listener = Arc::new(Listener::new(&cfg)?);
    listener.bind()?;

    let dispatcher = {
        let listener = Arc::clone(&listener);
        thread::Builder::new()
            .name("dispatcher".to_string())
            .spawn(move || listener.start())
            .context("Failed to spawn dispatcher thread")?
    };

    if let Some(after) = cfg.shutdown_after() {
        thread::sleep(after);
        listener.stop();
    }

    dispatcher
        .join()
        .map_err(|_| anyhow!("dispatcher thread panicked"))?
}
