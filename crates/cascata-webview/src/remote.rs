//! Out-of-process engine binding - spawns the `webview-host` child process
//! and proxies every engine operation to it over the frame transport.
//!
//! Commands stream to the child's stdin; events come back on its stdout,
//! decoded by a background reader and handed to the owning thread over the
//! engine channels. Commands are fire-and-forget: a write failure marks the
//! binding broken and is logged, there is no retry.
//!
//! The child performs its own readiness deferral, so from this side the
//! command channel is usable as soon as the process is up; both bring-up
//! completions are reported at spawn.

use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command as ProcessCommand, Stdio};

use crate::engine::{BrowserEngine, Completion, EngineChannels, EngineNotifier};
use crate::error::Result;
use crate::protocol::{Command, Event, KeyEvent, Size};
use crate::reader::FrameReaderThread;
use crate::transport::{FrameReader, FrameSender, FrameWriter};

/// Default engine host location: a `webview-host` binary next to the
/// running executable.
pub fn default_host_binary() -> Result<PathBuf> {
    let mut path = std::env::current_exe()?;
    path.pop();
    path.push(format!("webview-host{}", std::env::consts::EXE_SUFFIX));
    Ok(path)
}

/// Browser engine living in a separate process.
pub struct RemoteEngine {
    child: Child,
    sender: FrameSender<ChildStdin>,
    reader: Option<FrameReaderThread>,
    broken: bool,
}

impl RemoteEngine {
    /// Spawn the engine host and connect the transport over its stdio.
    pub fn spawn(host_binary: &Path) -> Result<(Self, EngineChannels)> {
        let mut child = ProcessCommand::new(host_binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()?;
        let stdin = child.stdin.take().expect("child stdin is piped");
        let stdout = child.stdout.take().expect("child stdout is piped");

        let (notifier, channels) = EngineNotifier::channel();

        let events = notifier.events.clone();
        let reader = FrameReaderThread::spawn(
            "webview-event-read",
            FrameReader::new(stdout),
            move |frame| match Event::decode(&frame) {
                Ok(event) => events.send(event).is_ok(),
                Err(e) => {
                    tracing::error!("protocol violation from engine host, closing: {e}");
                    false
                }
            },
        )?;

        // The host defers internally; the command channel is ready now.
        let _ = notifier.completions.send(Completion::EnvironmentReady);
        let _ = notifier.completions.send(Completion::ControllerReady);

        Ok((
            Self {
                child,
                sender: FrameSender::new(FrameWriter::new(stdin)),
                reader: Some(reader),
                broken: false,
            },
            channels,
        ))
    }

    fn send(&mut self, command: Command) {
        if self.broken {
            return;
        }
        if let Err(e) = self.sender.send(&command.encode()) {
            tracing::error!("engine host write failed, dropping connection: {e}");
            self.broken = true;
        }
    }
}

impl BrowserEngine for RemoteEngine {
    fn set_background_color(&mut self, rgba: u32) {
        self.send(Command::SetBackgroundColor { rgba });
    }

    fn set_parent_window(&mut self, handle: u64) {
        self.send(Command::SetParentWindow { handle });
    }

    fn set_size(&mut self, size: Size) {
        self.send(Command::SetSize { size });
    }

    fn navigate(&mut self, url: &str) {
        self.send(Command::Navigate {
            url: url.to_owned(),
        });
    }

    fn run_script(&mut self, source: &str) {
        self.send(Command::RunScript {
            source: source.to_owned(),
        });
    }

    fn inject_script(&mut self, source: &str) {
        self.send(Command::InjectScript {
            source: source.to_owned(),
        });
    }

    fn forward_key_event(&mut self, event: &KeyEvent) {
        self.send(Command::ForwardKeyEvent { event: *event });
    }
}

impl Drop for RemoteEngine {
    fn drop(&mut self) {
        // Terminate the child first so its stdout reaches end-of-stream,
        // then join the reader before the pipe handles go away.
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(mut reader) = self.reader.take() {
            reader.join();
        }
    }
}
