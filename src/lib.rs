//! # Cascata - reverb plugin with a web view control surface
//!
//! Umbrella crate that coordinates:
//! - **cascata-webview** - the native/page bridge: frame transport, opcode
//!   protocol, background reader, script value serialization, engine
//!   readiness staging, and the web UI proxy
//! - **cascata-webview-host** - the out-of-process engine host spawned when
//!   the browser engine cannot live inside the plugin process
//! - **cascata-plugin** - the plugin shim: reverb parameter mapping, state
//!   persistence, and the concrete web UI
//!
//! ## Quick start
//!
//! ```ignore
//! use cascata::prelude::*;
//!
//! let (engine, channels) = HeadlessEngine::new();
//! let widget = WebWidget::new(engine, channels, "");
//! let mut ui = ReverbUi::new(widget, &ReverbUi::config(resource_dir));
//!
//! // On the owning thread, once per UI tick:
//! ui.idle(&mut handler);
//! ```

/// Re-export of cascata-webview for direct access
pub use cascata_webview as webview;

/// Re-export of cascata-plugin for direct access
pub use cascata_plugin as plugin;

pub use cascata_plugin::{ReverbPlugin, ReverbUi, Reverb};
pub use cascata_webview::{
    BrowserEngine, HeadlessEngine, RemoteEngine, WebUiConfig, WebUiProxy, WebWidget,
};

pub mod prelude {
    //! Common imports for building a plugin UI on the bridge.
    pub use cascata_plugin::{Reverb, ReverbPlugin, ReverbUi};
    pub use cascata_webview::{
        BrowserEngine, HeadlessEngine, RemoteEngine, ScriptValue, ScriptValueVector, UiHandler,
        WebUiConfig, WebUiProxy, WebWidget,
    };
}
