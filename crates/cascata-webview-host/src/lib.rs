//! Engine host - runs in a separate process, owns the actual browser
//! engine instance, and proxies between it and the frame transport.
//!
//! Command frames arrive on one half of the transport (stdin in the
//! spawned binary), are decoded by a background reader thread, and are
//! dispatched into a staged engine wrapper - so commands arriving before
//! the engine's own asynchronous bring-up completes are deferred here,
//! mirroring the deferral on the native side of the boundary. Engine
//! callbacks (script message received, load finished) are encoded and
//! written back as event frames on the other half.
//!
//! A protocol violation on the command stream (unknown opcode, malformed
//! payload) tears the connection down: the reader stops, the dispatch loop
//! drains and exits, and the native side observes end-of-stream.

use std::io::{Read, Write};

use crossbeam_channel::{never, select, unbounded, Receiver};

use cascata_webview::{
    BrowserEngine, Command, EngineChannels, Event, FrameReader, FrameReaderThread, FrameSender,
    FrameWriter, Result, StagedEngine,
};

/// Dispatch loop coupling the transport to a local engine.
pub struct EngineHost<E: BrowserEngine, W: Write> {
    engine: StagedEngine<E>,
    channels: EngineChannels,
    commands: Receiver<Command>,
    reader: Option<FrameReaderThread>,
    events_out: FrameSender<W>,
}

impl<E: BrowserEngine, W: Write> EngineHost<E, W> {
    /// Wire an engine to its half of the transport. `channels` must be the
    /// notification channels of `engine`.
    pub fn new<R>(
        engine: E,
        channels: EngineChannels,
        command_input: R,
        event_output: W,
    ) -> Result<Self>
    where
        R: Read + Send + 'static,
    {
        let (command_tx, command_rx) = unbounded();
        let reader = FrameReaderThread::spawn(
            "host-command-read",
            FrameReader::new(command_input),
            move |frame| match Command::decode(&frame) {
                Ok(command) => command_tx.send(command).is_ok(),
                Err(e) => {
                    tracing::error!("protocol violation, dropping connection: {e}");
                    false
                }
            },
        )?;

        Ok(Self {
            engine: StagedEngine::new(engine),
            channels,
            commands: command_rx,
            reader: Some(reader),
            events_out: FrameSender::new(FrameWriter::new(event_output)),
        })
    }

    pub fn engine(&self) -> &E {
        self.engine.engine()
    }

    pub fn engine_mut(&mut self) -> &mut E {
        self.engine.engine_mut()
    }

    /// Serve until the command stream ends. Returns an error only if the
    /// event side of the transport fails mid-session.
    pub fn run(&mut self) -> Result<()> {
        let commands = self.commands.clone();
        let mut completions = self.channels.completions.clone();
        let mut events = self.channels.events.clone();
        loop {
            select! {
                recv(commands) -> command => match command {
                    Ok(command) => self.dispatch(command),
                    // Reader exited: peer closed the channel or violated
                    // the protocol. Time to go.
                    Err(_) => break,
                },
                recv(completions) -> completion => match completion {
                    Ok(completion) => self.engine.apply_completion(completion),
                    // Binding dropped its notifier; stop selecting on it.
                    Err(_) => completions = never(),
                },
                recv(events) -> event => match event {
                    Ok(event) => self.emit(event)?,
                    Err(_) => events = never(),
                },
            }
        }

        // Late engine notifications; the peer may already be gone, so
        // write failures are not interesting now.
        while let Ok(completion) = self.channels.completions.try_recv() {
            self.engine.apply_completion(completion);
        }
        while let Ok(event) = self.channels.events.try_recv() {
            let _ = self.emit(event);
        }

        if let Some(mut reader) = self.reader.take() {
            reader.join();
        }
        Ok(())
    }

    fn dispatch(&mut self, command: Command) {
        match command {
            Command::SetBackgroundColor { rgba } => self.engine.set_background_color(rgba),
            Command::SetParentWindow { handle } => self.engine.set_parent_window(handle),
            Command::SetSize { size } => self.engine.set_size(size),
            Command::Navigate { url } => self.engine.navigate(&url),
            Command::RunScript { source } => self.engine.run_script(&source),
            Command::InjectScript { source } => self.engine.inject_script(&source),
            Command::ForwardKeyEvent { event } => self.engine.forward_key_event(&event),
        }
    }

    fn emit(&mut self, event: Event) -> Result<()> {
        if let Event::LoadFinished = event {
            self.engine.navigation_finished();
        }
        self.events_out.send(&event.encode())
    }
}
