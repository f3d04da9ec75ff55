//! Concrete web UI for the reverb - wires the UI proxy to the plugin's
//! window geometry and persists the view size through host state.

use std::path::Path;

use crossbeam_channel::Receiver;

use cascata_webview::remote::default_host_binary;
use cascata_webview::{
    BrowserEngine, KeyEvent, RemoteEngine, Result, Size, UiHandler, WebUiConfig, WebUiProxy,
    WebWidget,
};

const BASE_WIDTH_PX: u32 = 600;
const BASE_HEIGHT_PX: u32 = 300;
const INIT_BACKGROUND_RGBA: u32 = 0x0000_00ff;

/// The reverb's control surface: a web page plus size persistence.
pub struct ReverbUi<E: BrowserEngine> {
    proxy: WebUiProxy<E>,
    size: Size,
    key_events: Option<Receiver<KeyEvent>>,
}

impl ReverbUi<RemoteEngine> {
    /// Construct the out-of-process variant, spawning the engine host next
    /// to the running executable unless `config.host_binary` overrides it.
    pub fn spawn_remote(config: &WebUiConfig) -> Result<Self> {
        let host_binary = match &config.host_binary {
            Some(path) => path.clone(),
            None => default_host_binary()?,
        };
        let (engine, channels) = RemoteEngine::spawn(&host_binary)?;
        Ok(Self::new(WebWidget::new(engine, channels, ""), config))
    }
}

impl<E: BrowserEngine> ReverbUi<E> {
    /// UI configuration for a page served from `resource_dir`.
    pub fn config(resource_dir: &Path) -> WebUiConfig {
        WebUiConfig {
            base_width: BASE_WIDTH_PX,
            base_height: BASE_HEIGHT_PX,
            background_color: INIT_BACKGROUND_RGBA,
            start_url: format!("file://{}/index.html", resource_dir.display()),
            host_binary: None,
        }
    }

    pub fn new(widget: WebWidget<E>, config: &WebUiConfig) -> Self {
        Self {
            proxy: WebUiProxy::new(widget, config),
            size: Size::new(config.base_width, config.base_height),
            key_events: None,
        }
    }

    /// Attach a routed key event source (see
    /// [`KeyboardRouter`](cascata_webview::KeyboardRouter)); events are
    /// forwarded to the page on each idle tick.
    pub fn with_key_events(mut self, key_events: Receiver<KeyEvent>) -> Self {
        self.key_events = Some(key_events);
        self
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn proxy(&self) -> &WebUiProxy<E> {
        &self.proxy
    }

    pub fn proxy_mut(&mut self) -> &mut WebUiProxy<E> {
        &mut self.proxy
    }

    /// Host notification: a parameter changed; mirror it to the page.
    pub fn parameter_changed(&mut self, index: u32, value: f32) {
        self.proxy.parameter_changed(index, value);
    }

    /// Host notification: a state value changed. The persisted view size
    /// is consumed here; everything else is mirrored to the page.
    pub fn state_changed(&mut self, key: &str, value: &str) {
        match key {
            "ui_width" => {
                if let Some(width) = parse_dimension(value) {
                    self.size.width = width;
                    self.proxy.widget_mut().resize(self.size);
                }
            }
            "ui_height" => {
                if let Some(height) = parse_dimension(value) {
                    self.size.height = height;
                    self.proxy.widget_mut().resize(self.size);
                }
            }
            _ => self.proxy.state_changed(key, value),
        }
    }

    /// Window reshape: resize the view and persist the new size.
    pub fn reshape(&mut self, handler: &mut dyn UiHandler, width: u32, height: u32) {
        self.size = Size::new(width, height);
        self.proxy.widget_mut().resize(self.size);
        handler.set_state("ui_width", &width.to_string());
        handler.set_state("ui_height", &height.to_string());
    }

    /// Owning-thread tick: forward routed key events, then drain the
    /// bridge.
    pub fn idle(&mut self, handler: &mut dyn UiHandler) {
        if let Some(key_events) = &self.key_events {
            let pending: Vec<KeyEvent> = key_events.try_iter().collect();
            for event in pending {
                self.proxy.forward_key_event(&event);
            }
        }
        self.proxy.idle(handler);
    }
}

fn parse_dimension(value: &str) -> Option<u32> {
    if value.is_empty() {
        return None;
    }
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("ignoring non-numeric view dimension {value:?}");
            None
        }
    }
}
