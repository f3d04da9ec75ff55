//! Background reader - a dedicated thread that blocks on the transport's
//! read side and dispatches decoded frames without stalling the owner.
//!
//! Exactly one reader exists per transport instance. The dispatch callback
//! runs on the reader thread; consumers must treat every dispatch as an
//! asynchronous notification and hand off to the owning thread through a
//! channel rather than mutating owner state directly.

use std::io::Read;
use std::thread::{self, JoinHandle};

use crate::error::WebViewError;
use crate::transport::{Frame, FrameReader};

/// Handle to the reader thread. Joined on drop.
///
/// Teardown order matters: close the peer's write side first (drop the
/// child process or the write half of the pipe) so the blocking read
/// unblocks with end-of-stream, then drop this handle.
pub struct FrameReaderThread {
    handle: Option<JoinHandle<()>>,
}

impl FrameReaderThread {
    /// Spawn the reader loop on a named thread.
    ///
    /// `on_frame` is invoked for every complete frame and returns whether
    /// the loop should keep reading; returning `false` tears the
    /// connection down (used for protocol violations). The loop also exits
    /// on end-of-stream or transport failure.
    pub fn spawn<R, F>(name: &str, mut reader: FrameReader<R>, mut on_frame: F) -> crate::Result<Self>
    where
        R: Read + Send + 'static,
        F: FnMut(Frame) -> bool + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || loop {
                match reader.read_frame() {
                    Ok(frame) => {
                        if !on_frame(frame) {
                            tracing::debug!("frame dispatch requested teardown");
                            break;
                        }
                    }
                    Err(WebViewError::Disconnected) => {
                        tracing::debug!("channel closed, reader exiting");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("reader exiting on transport failure: {e}");
                        break;
                    }
                }
            })?;
        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Wait for the reader loop to exit.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for FrameReaderThread {
    fn drop(&mut self) {
        self.join();
    }
}
