//! Engine-agnostic widget glue - couples a staged engine with the script
//! value bridge.
//!
//! Keep this layer generic; plugin-host specifics belong to the UI proxy.
//!
//! WebKit-based engines have a standard mechanism for messages from JS to
//! native, but no inverse. [`WebWidget::post_message`] implements a
//! "reverse postMessage" to keep the bridge symmetrical: the global
//! `window.webviewHost` object is an `EventTarget` the page listens on,
//! and delivery is a custom event fired through the run-script primitive.

use smallvec::SmallVec;

use crate::engine::{BrowserEngine, EngineChannels};
use crate::protocol::{Event, KeyEvent, Size};
use crate::readiness::{ReadinessStage, StagedEngine};
use crate::script::{serialize_script_values, ScriptValue, ScriptValueVector};

const JS_DISABLE_CONTEXT_MENU: &str = "window.oncontextmenu = (e) => e.preventDefault();";

const JS_CREATE_CONSOLE: &str =
    "window.console = {log: (s) => window.webviewHost.postMessage(['console.log', String(s)])};";

const JS_CREATE_HOST_OBJECT: &str = "window.webviewHost = new EventTarget;\
window.webviewHost.addMessageListener = (lr) => {\
window.webviewHost.addEventListener('message', (ev) => lr(ev.detail))\
};";

const CSS_DISABLE_IMAGE_DRAG: &str = "img { user-drag: none; -webkit-user-drag: none; }";
const CSS_DISABLE_SELECTION: &str = "body { user-select: none; -webkit-user-select: none; }";
const CSS_DISABLE_PINCH_ZOOM: &str = "body { touch-action: pan-x pan-y; }";

/// Notification surfaced to the widget owner by [`WebWidget::poll`].
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    /// A navigation completed. Fired for the initial load and for reloads.
    ContentLoadFinished,
    /// The page posted an application message.
    ScriptMessageReceived(ScriptValueVector),
}

/// A browser engine wired up as a message bridge endpoint.
pub struct WebWidget<E: BrowserEngine> {
    engine: StagedEngine<E>,
    channels: EngineChannels,
}

impl<E: BrowserEngine> WebWidget<E> {
    /// Wrap an engine binding. `post_message_shim` is the engine-specific
    /// script gluing `webviewHost.postMessage` to the engine's native
    /// message channel (empty for engines that install it themselves).
    pub fn new(engine: E, channels: EngineChannels, post_message_shim: &str) -> Self {
        let mut widget = Self {
            engine: StagedEngine::new(engine),
            channels,
        };
        widget.inject_default_scripts(post_message_shim);
        widget
    }

    pub fn stage(&self) -> ReadinessStage {
        self.engine.stage()
    }

    pub fn engine(&self) -> &E {
        self.engine.engine()
    }

    pub fn engine_mut(&mut self) -> &mut E {
        self.engine.engine_mut()
    }

    pub fn set_background_color(&mut self, rgba: u32) {
        self.engine.set_background_color(rgba);
    }

    pub fn reparent(&mut self, window_handle: u64) {
        self.engine.set_parent_window(window_handle);
    }

    pub fn resize(&mut self, size: Size) {
        self.engine.set_size(size);
    }

    pub fn navigate(&mut self, url: &str) {
        self.engine.navigate(url);
    }

    pub fn inject_script(&mut self, source: &str) {
        self.engine.inject_script(source);
    }

    pub fn run_script(&mut self, source: &str) {
        self.engine.run_script(source);
    }

    pub fn forward_key_event(&mut self, event: &KeyEvent) {
        self.engine.forward_key_event(event);
    }

    /// Deliver an application message to the page as a custom event on
    /// `window.webviewHost`. Only valid once content is loaded; the UI
    /// proxy queues messages until then.
    pub fn post_message(&mut self, args: &[ScriptValue]) {
        let payload = serialize_script_values(args);
        tracing::trace!(target: "cascata::traffic", "n -> js: {payload}");
        let source = format!(
            "window.webviewHost.dispatchEvent(new CustomEvent('message',{{detail:{payload}}}));"
        );
        self.engine.run_script(&source);
    }

    /// Drain engine notifications, advancing the readiness machine, and
    /// return the application-level happenings for the owner to handle.
    /// Call from the owning thread; the channels are the handoff point
    /// from the engine's delivery context.
    pub fn poll(&mut self) -> SmallVec<[WidgetEvent; 4]> {
        let mut out = SmallVec::new();

        while let Ok(completion) = self.channels.completions.try_recv() {
            self.engine.apply_completion(completion);
        }

        while let Ok(event) = self.channels.events.try_recv() {
            match event {
                Event::LoadFinished => {
                    self.engine.navigation_finished();
                    self.add_stylesheet(&format!(
                        "{CSS_DISABLE_IMAGE_DRAG}{CSS_DISABLE_SELECTION}{CSS_DISABLE_PINCH_ZOOM}"
                    ));
                    out.push(WidgetEvent::ContentLoadFinished);
                }
                Event::ScriptMessageReceived { args } => {
                    if let Some(line) = console_log_line(&args) {
                        tracing::info!(target: "cascata::page", "{line}");
                        continue;
                    }
                    tracing::trace!(
                        target: "cascata::traffic",
                        "n <- js: {}",
                        serialize_script_values(&args)
                    );
                    out.push(WidgetEvent::ScriptMessageReceived(args));
                }
            }
        }

        out
    }

    fn inject_default_scripts(&mut self, post_message_shim: &str) {
        let source = format!(
            "{JS_DISABLE_CONTEXT_MENU}{JS_CREATE_CONSOLE}{JS_CREATE_HOST_OBJECT}{post_message_shim}"
        );
        self.engine.inject_script(&source);
    }

    fn add_stylesheet(&mut self, source: &str) {
        let script = format!(
            "document.head.insertAdjacentHTML('beforeend', '<style>{source}</style>');"
        );
        self.engine.run_script(&script);
    }
}

/// The page console shim posts `['console.log', text]`; route those to the
/// native log instead of the application handler.
fn console_log_line(args: &[ScriptValue]) -> Option<&str> {
    if args.len() > 1 && args[0].as_str() == Some("console.log") {
        args[1].as_str().or(Some(""))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::HeadlessEngine;
    use smallvec::smallvec;

    fn ready_widget() -> WebWidget<HeadlessEngine> {
        let (mut engine, channels) = HeadlessEngine::new();
        engine.start();
        let mut widget = WebWidget::new(engine, channels, "");
        widget.navigate("file:///index.html");
        widget.poll();
        widget
    }

    #[test]
    fn test_default_scripts_injected_before_navigation() {
        let widget = ready_widget();
        let injected = widget.engine().injected_scripts();
        assert_eq!(injected.len(), 1);
        assert!(injected[0].contains("window.webviewHost = new EventTarget"));
        assert!(injected[0].contains("oncontextmenu"));
        assert!(injected[0].contains("console"));
        assert_eq!(widget.engine().current_url(), Some("file:///index.html"));
    }

    #[test]
    fn test_load_finished_reaches_owner_and_styles_page() {
        let (mut engine, channels) = HeadlessEngine::new();
        engine.start();
        let mut widget = WebWidget::new(engine, channels, "");
        widget.navigate("file:///index.html");

        let events = widget.poll();
        assert_eq!(events.as_slice(), &[WidgetEvent::ContentLoadFinished]);
        assert!(widget.engine().executed_scripts()[0].contains("<style>"));
        assert_eq!(widget.stage(), ReadinessStage::ViewNavigationComplete);
    }

    #[test]
    fn test_post_message_fires_custom_event() {
        let mut widget = ready_widget();
        widget.post_message(&[
            ScriptValue::from("WebUI"),
            ScriptValue::from("parameterChanged"),
            ScriptValue::from(1u32),
            ScriptValue::from(0.75),
        ]);
        let script = widget.engine().executed_scripts().last().unwrap();
        assert_eq!(
            script,
            "window.webviewHost.dispatchEvent(new CustomEvent('message',\
{detail:[\"WebUI\",\"parameterChanged\",1.0,0.75]}));"
        );
    }

    #[test]
    fn test_console_log_is_filtered() {
        let mut widget = ready_widget();
        let args: ScriptValueVector =
            smallvec![ScriptValue::from("console.log"), ScriptValue::from("hello")];
        widget.engine().post_script_message(args);
        assert!(widget.poll().is_empty());
    }

    #[test]
    fn test_script_messages_reach_owner() {
        let mut widget = ready_widget();
        let args: ScriptValueVector =
            smallvec![ScriptValue::from("WebUI"), ScriptValue::from("ping")];
        widget.engine().post_script_message(args.clone());
        assert_eq!(
            widget.poll().as_slice(),
            &[WidgetEvent::ScriptMessageReceived(args)]
        );
    }
}
