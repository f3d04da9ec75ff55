//! Native/page bridge for Cascata
//!
//! This crate lets plugin code and an embedded web page exchange typed
//! messages while the browser engine brings itself up asynchronously. The
//! pieces, leaves first:
//!
//! - [`transport`] - length-prefixed binary frames over a duplex byte
//!   channel
//! - [`protocol`] - the command/event opcode vocabulary carried in frames
//! - [`reader`] - a dedicated thread turning blocking reads into dispatched
//!   frames
//! - [`script`] - the typed-value model for application messages
//! - [`readiness`] - the bring-up state machine that defers early requests
//! - [`engine`] - the one capability shape shared by all engine bindings,
//!   plus the in-process headless variant
//! - [`remote`] - the out-of-process binding driving a `webview-host`
//!   child
//! - [`widget`] / [`ui`] - bridge glue and the plugin-host-facing proxy
//! - [`keyboard`] - explicit registry for platform key hooks
//!
//! ## Usage
//!
//! ```ignore
//! use cascata_webview::{HeadlessEngine, WebUiConfig, WebUiProxy, WebWidget};
//!
//! let (mut engine, channels) = HeadlessEngine::new();
//! engine.start();
//! let widget = WebWidget::new(engine, channels, "");
//! let mut proxy = WebUiProxy::new(widget, &WebUiConfig::default());
//!
//! // Owning thread, once per UI tick:
//! proxy.idle(&mut handler);
//! ```

pub mod error;
pub use error::{Result, WebViewError};

pub mod script;
pub use script::{
    deserialize_script_values, serialize_script_values, ScriptValue, ScriptValueVector,
};

pub mod protocol;
pub use protocol::{Command, Event, KeyEvent, KeyModifiers, Opcode, Size};

pub mod transport;
pub use transport::{Frame, FrameReader, FrameSender, FrameWriter};

pub mod reader;
pub use reader::FrameReaderThread;

pub mod engine;
pub use engine::{BrowserEngine, Completion, EngineChannels, EngineNotifier, HeadlessEngine};

pub mod readiness;
pub use readiness::{ReadinessStage, StagedEngine};

pub mod remote;
pub use remote::RemoteEngine;

pub mod widget;
pub use widget::{WebWidget, WidgetEvent};

pub mod ui;
pub use ui::{UiHandler, WebUiConfig, WebUiProxy, MESSAGE_TAG};

pub mod keyboard;
pub use keyboard::{HookBackend, KeyboardRegistration, KeyboardRouter};
