//! Cascata reverb plugin
//!
//! Thin plugin layer over the [`cascata-webview`](cascata_webview) bridge:
//! the audio path forwards samples to an opaque [`Reverb`] unit, and the
//! control surface is a browser-rendered page driven through the web UI
//! proxy.

mod reverb;
pub use reverb::Reverb;

mod plugin;
pub use plugin::{
    parameter_info, ParameterInfo, ReverbPlugin, PARAM_FEEDBACK, PARAM_LOWPASS_CUTOFF, STATE_KEYS,
};

mod ui;
pub use ui::ReverbUi;
