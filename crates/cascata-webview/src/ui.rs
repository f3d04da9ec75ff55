//! UI proxy - the plugin-host-facing side of the bridge.
//!
//! Translates host parameter/state callbacks into bridge messages and
//! routes page-originated calls back into host mutations. Application
//! messages sent before the page is ready are buffered in the init message
//! queue and replayed, in order, when the page explicitly asks for them -
//! never on content-ready alone, because the page's listener may not be
//! attached yet at that instant.

use std::path::PathBuf;

use smallvec::smallvec;

use crate::engine::BrowserEngine;
use crate::protocol::{KeyEvent, Size};
use crate::script::{serialize_script_values, ScriptValue, ScriptValueVector};
use crate::widget::{WebWidget, WidgetEvent};

/// Routing tag opening every application-level message vector.
pub const MESSAGE_TAG: &str = "WebUI";

/// Host and application callbacks consumed by the proxy.
///
/// The first three map page requests onto the plugin host ABI; the hooks
/// let the concrete UI react to bridge lifecycle and to messages outside
/// the [`MESSAGE_TAG`] namespace.
pub trait UiHandler {
    fn edit_parameter(&mut self, index: u32, started: bool);
    fn set_parameter_value(&mut self, index: u32, value: f32);
    fn set_state(&mut self, key: &str, value: &str);

    /// First navigation completed; the page exists now.
    fn web_content_ready(&mut self) {}

    /// A message without the reserved routing tag (passthrough).
    fn web_message_received(&mut self, args: &[ScriptValue]) {
        let _ = args;
    }
}

/// Static configuration for a web UI instance.
#[derive(Debug, Clone)]
pub struct WebUiConfig {
    pub base_width: u32,
    pub base_height: u32,
    /// Packed RGBA.
    pub background_color: u32,
    /// Initial page URL, typically `file://.../index.html`. Resource path
    /// discovery is the embedder's concern.
    pub start_url: String,
    /// Engine host binary override for the out-of-process variant.
    pub host_binary: Option<PathBuf>,
}

impl Default for WebUiConfig {
    fn default() -> Self {
        Self {
            base_width: 0,
            base_height: 0,
            background_color: 0xffff_ffff,
            start_url: String::new(),
            host_binary: None,
        }
    }
}

/// Owns the widget and the init message queue for the plugin window's
/// lifetime.
pub struct WebUiProxy<E: BrowserEngine> {
    widget: WebWidget<E>,
    content_ready: bool,
    init_queue: Vec<ScriptValueVector>,
}

impl<E: BrowserEngine> WebUiProxy<E> {
    pub fn new(mut widget: WebWidget<E>, config: &WebUiConfig) -> Self {
        widget.set_background_color(config.background_color);
        widget.resize(Size::new(config.base_width, config.base_height));
        widget.navigate(&config.start_url);
        Self {
            widget,
            content_ready: false,
            init_queue: Vec::new(),
        }
    }

    pub fn widget(&self) -> &WebWidget<E> {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut WebWidget<E> {
        &mut self.widget
    }

    /// Whether the first navigation has completed.
    pub fn content_ready(&self) -> bool {
        self.content_ready
    }

    /// Send an application message to the page, or buffer it until the
    /// page asks for the backlog.
    pub fn post_message(&mut self, args: ScriptValueVector) {
        if self.content_ready {
            self.widget.post_message(&args);
        } else {
            self.init_queue.push(args);
        }
    }

    /// Deliver the buffered backlog in FIFO order and clear it. Invoked
    /// only on the page's explicit request, once its listener is attached.
    pub fn flush_init_message_queue(&mut self) {
        for args in std::mem::take(&mut self.init_queue) {
            self.widget.post_message(&args);
        }
    }

    /// Host notification: a parameter value changed.
    pub fn parameter_changed(&mut self, index: u32, value: f32) {
        self.post_message(smallvec![
            ScriptValue::from(MESSAGE_TAG),
            ScriptValue::from("parameterChanged"),
            ScriptValue::from(index),
            ScriptValue::from(value),
        ]);
    }

    /// Host notification: a state value changed.
    pub fn state_changed(&mut self, key: &str, value: &str) {
        self.post_message(smallvec![
            ScriptValue::from(MESSAGE_TAG),
            ScriptValue::from("stateChanged"),
            ScriptValue::from(key),
            ScriptValue::from(value),
        ]);
    }

    /// Forward a key event captured by the native window.
    pub fn forward_key_event(&mut self, event: &KeyEvent) {
        self.widget.forward_key_event(event);
    }

    /// Drain bridge notifications on the owning thread. Call once per UI
    /// tick.
    pub fn idle(&mut self, handler: &mut dyn UiHandler) {
        for event in self.widget.poll() {
            match event {
                WidgetEvent::ContentLoadFinished => {
                    let first = !self.content_ready;
                    self.content_ready = true;
                    if first {
                        handler.web_content_ready();
                    }
                }
                WidgetEvent::ScriptMessageReceived(args) => {
                    self.dispatch_script_message(args, handler);
                }
            }
        }
    }

    /// Route a page message: tagged messages dispatch to the typed method
    /// table by exact name and argument count; anything else passes
    /// through. A bad call is logged and dropped, never fatal.
    fn dispatch_script_message(&mut self, args: ScriptValueVector, handler: &mut dyn UiHandler) {
        if args.first().and_then(ScriptValue::as_str) != Some(MESSAGE_TAG) {
            handler.web_message_received(&args);
            return;
        }

        let Some(method) = args.get(1).and_then(ScriptValue::as_str) else {
            tracing::warn!("web UI message without a method name");
            return;
        };
        let call_args = &args[2..];

        match (method, call_args) {
            ("flushInitMessageQueue", []) => self.flush_init_message_queue(),
            ("editParameter", [index, started]) => {
                match (index.as_number(), started.as_bool()) {
                    (Some(index), Some(started)) => {
                        handler.edit_parameter(index as u32, started);
                    }
                    _ => tracing::warn!("editParameter called with mistyped arguments"),
                }
            }
            ("setParameterValue", [index, value]) => {
                match (index.as_number(), value.as_number()) {
                    (Some(index), Some(value)) => {
                        handler.set_parameter_value(index as u32, value as f32);
                    }
                    _ => tracing::warn!("setParameterValue called with mistyped arguments"),
                }
            }
            ("setState", [key, value]) => match (key.as_str(), value.as_str()) {
                (Some(key), Some(value)) => handler.set_state(key, value),
                _ => tracing::warn!("setState called with mistyped arguments"),
            },
            _ => {
                tracing::warn!(
                    "invalid web UI call dropped: {}",
                    serialize_script_values(&args)
                );
            }
        }
    }
}
