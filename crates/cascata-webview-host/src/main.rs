//! Engine host binary. Spawned by the plugin to own the browser engine in
//! an isolated process; commands arrive on stdin, events leave on stdout.

use cascata_webview::{HeadlessEngine, Result};
use cascata_webview_host::EngineHost;

fn main() -> Result<()> {
    // stdout carries the transport; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    // Platform engine bindings plug in at the BrowserEngine seam; the
    // headless engine keeps the host functional without one.
    let (mut engine, channels) = HeadlessEngine::new();
    engine.start();

    let mut host = EngineHost::new(engine, channels, std::io::stdin(), std::io::stdout())?;
    tracing::info!("engine host up, serving commands");
    host.run()?;
    tracing::info!("command stream closed, shutting down");
    Ok(())
}
