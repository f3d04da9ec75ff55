//! Browser engine capability - the one shape shared by every platform
//! binding.
//!
//! Two implementations exist in this repository:
//! - [`HeadlessEngine`] - in-process, completes bring-up synchronously;
//!   used by tests and as the default engine of the out-of-process host.
//! - [`RemoteEngine`](crate::remote::RemoteEngine) - out-of-process, proxies
//!   every operation to a child process over the frame transport.
//!
//! Real platform bindings (WebKitGTK, WKWebView, WebView2) plug in at this
//! trait; the readiness staging and the script value bridge are written
//! once against it and shared by all variants.

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::protocol::{Event, KeyEvent, Size};
use crate::readiness::ReadinessStage;
use crate::script::ScriptValueVector;

/// Raw engine operations.
///
/// Callers must not invoke these before the engine can service them; the
/// [`StagedEngine`](crate::readiness::StagedEngine) wrapper enforces that
/// by deferring operations until the required readiness stage.
pub trait BrowserEngine {
    fn set_background_color(&mut self, rgba: u32);
    fn set_parent_window(&mut self, handle: u64);
    fn set_size(&mut self, size: Size);
    fn navigate(&mut self, url: &str);
    fn run_script(&mut self, source: &str);
    fn inject_script(&mut self, source: &str);
    fn forward_key_event(&mut self, event: &KeyEvent);
}

/// Bring-up notification from an engine binding.
///
/// Bindings deliver these over an injected channel instead of host-runtime
/// callback objects, so the deferred-operation logic is testable without a
/// real browser engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    EnvironmentReady,
    ControllerReady,
    /// Environment or controller creation failed. Fatal to this engine
    /// instance; no retry is attempted.
    Failed {
        stage: ReadinessStage,
        reason: String,
    },
}

/// Receive halves of an engine binding's notification channels.
///
/// Owned by the widget; drained on the owning thread each idle tick. This
/// is the handoff boundary between the binding's delivery context (a
/// background reader, an OS callback) and owner-thread state.
pub struct EngineChannels {
    pub completions: Receiver<Completion>,
    pub events: Receiver<Event>,
}

/// Send halves handed to an engine binding.
pub struct EngineNotifier {
    pub completions: Sender<Completion>,
    pub events: Sender<Event>,
}

impl EngineNotifier {
    pub fn channel() -> (EngineNotifier, EngineChannels) {
        let (completion_tx, completion_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        (
            EngineNotifier {
                completions: completion_tx,
                events: event_tx,
            },
            EngineChannels {
                completions: completion_rx,
                events: event_rx,
            },
        )
    }
}

/// In-process engine that performs no rendering.
///
/// Environment and controller creation complete synchronously on
/// [`start`](HeadlessEngine::start); navigation reports completion
/// immediately. Operations are recorded so callers can observe the
/// engine's configuration, and scripts can be answered by posting page
/// messages back through [`post_script_message`].
///
/// [`post_script_message`]: HeadlessEngine::post_script_message
pub struct HeadlessEngine {
    notifier: EngineNotifier,
    background_color: u32,
    parent_window: u64,
    size: Size,
    current_url: Option<String>,
    injected_scripts: Vec<String>,
    executed_scripts: Vec<String>,
    key_events: Vec<KeyEvent>,
}

impl HeadlessEngine {
    pub fn new() -> (Self, EngineChannels) {
        let (notifier, channels) = EngineNotifier::channel();
        (
            Self {
                notifier,
                background_color: 0,
                parent_window: 0,
                size: Size::default(),
                current_url: None,
                injected_scripts: Vec::new(),
                executed_scripts: Vec::new(),
                key_events: Vec::new(),
            },
            channels,
        )
    }

    /// Begin bring-up. A headless engine has nothing to create, so both
    /// stages complete immediately.
    pub fn start(&mut self) {
        let _ = self.notifier.completions.send(Completion::EnvironmentReady);
        let _ = self.notifier.completions.send(Completion::ControllerReady);
    }

    /// Simulate the page posting a message to the native side.
    pub fn post_script_message(&self, args: ScriptValueVector) {
        let _ = self
            .notifier
            .events
            .send(Event::ScriptMessageReceived { args });
    }

    pub fn background_color(&self) -> u32 {
        self.background_color
    }

    pub fn parent_window(&self) -> u64 {
        self.parent_window
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    pub fn injected_scripts(&self) -> &[String] {
        &self.injected_scripts
    }

    pub fn executed_scripts(&self) -> &[String] {
        &self.executed_scripts
    }

    pub fn key_events(&self) -> &[KeyEvent] {
        &self.key_events
    }
}

impl BrowserEngine for HeadlessEngine {
    fn set_background_color(&mut self, rgba: u32) {
        self.background_color = rgba;
    }

    fn set_parent_window(&mut self, handle: u64) {
        self.parent_window = handle;
    }

    fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    fn navigate(&mut self, url: &str) {
        self.current_url = Some(url.to_owned());
        // No content to fetch; the load finishes at once.
        let _ = self.notifier.events.send(Event::LoadFinished);
    }

    fn run_script(&mut self, source: &str) {
        self.executed_scripts.push(source.to_owned());
    }

    fn inject_script(&mut self, source: &str) {
        self.injected_scripts.push(source.to_owned());
    }

    fn forward_key_event(&mut self, event: &KeyEvent) {
        self.key_events.push(*event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_completes_both_stages() {
        let (mut engine, channels) = HeadlessEngine::new();
        engine.start();
        assert_eq!(
            channels.completions.try_recv().unwrap(),
            Completion::EnvironmentReady
        );
        assert_eq!(
            channels.completions.try_recv().unwrap(),
            Completion::ControllerReady
        );
        assert!(channels.completions.try_recv().is_err());
    }

    #[test]
    fn test_navigate_reports_load_finished() {
        let (mut engine, channels) = HeadlessEngine::new();
        engine.navigate("file:///index.html");
        assert_eq!(engine.current_url(), Some("file:///index.html"));
        assert_eq!(channels.events.try_recv().unwrap(), Event::LoadFinished);
    }

    #[test]
    fn test_records_configuration() {
        let (mut engine, _channels) = HeadlessEngine::new();
        engine.set_background_color(0x102030ff);
        engine.set_parent_window(42);
        engine.set_size(Size::new(600, 300));
        engine.inject_script("a");
        engine.run_script("b");
        assert_eq!(engine.background_color(), 0x102030ff);
        assert_eq!(engine.parent_window(), 42);
        assert_eq!(engine.size(), Size::new(600, 300));
        assert_eq!(engine.injected_scripts(), ["a"]);
        assert_eq!(engine.executed_scripts(), ["b"]);
    }
}
