//! Plugin shim - maps host parameter and state callbacks onto the reverb
//! unit and runs the per-sample processing loop.

use std::collections::HashMap;

use crate::reverb::Reverb;

pub const PARAM_FEEDBACK: u32 = 0;
pub const PARAM_LOWPASS_CUTOFF: u32 = 1;

/// State keys persisted through the host, in declaration order.
pub const STATE_KEYS: [&str; 2] = ["ui_width", "ui_height"];

/// Host-facing parameter metadata.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterInfo {
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

pub fn parameter_info(index: u32) -> Option<ParameterInfo> {
    match index {
        PARAM_FEEDBACK => Some(ParameterInfo {
            name: "feedback",
            min: 0.0,
            max: 1.0,
            default: 0.5,
        }),
        PARAM_LOWPASS_CUTOFF => Some(ParameterInfo {
            name: "lpfreq",
            min: 0.0,
            max: 10_000.0,
            default: 4_000.0,
        }),
        _ => None,
    }
}

/// The audio-side plugin object. The signal path merely forwards samples
/// to the reverb unit.
pub struct ReverbPlugin {
    reverb: Box<dyn Reverb>,
    state: HashMap<String, String>,
}

impl ReverbPlugin {
    pub fn new(reverb: Box<dyn Reverb>) -> Self {
        let mut plugin = Self {
            reverb,
            state: HashMap::new(),
        };
        for index in [PARAM_FEEDBACK, PARAM_LOWPASS_CUTOFF] {
            let info = parameter_info(index).expect("declared parameter");
            plugin.set_parameter_value(index, info.default);
        }
        plugin
    }

    pub fn get_parameter_value(&self, index: u32) -> f32 {
        match index {
            PARAM_FEEDBACK => self.reverb.feedback(),
            PARAM_LOWPASS_CUTOFF => self.reverb.lowpass_cutoff(),
            _ => 0.0,
        }
    }

    pub fn set_parameter_value(&mut self, index: u32, value: f32) {
        match index {
            PARAM_FEEDBACK => self.reverb.set_feedback(value),
            PARAM_LOWPASS_CUTOFF => self.reverb.set_lowpass_cutoff(value),
            _ => tracing::warn!("ignoring unknown parameter {index}"),
        }
    }

    /// Host state lookup. Unset keys read as the empty string.
    pub fn get_state(&self, key: &str) -> String {
        self.state.get(key).cloned().unwrap_or_default()
    }

    pub fn set_state(&mut self, key: &str, value: &str) {
        self.state.insert(key.to_owned(), value.to_owned());
    }

    /// Process one stereo block in place. The buffers act as both input
    /// and output, which makes host-side buffer aliasing a non-issue: each
    /// frame is read before it is overwritten.
    pub fn run(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len().min(right.len());
        for i in 0..frames {
            let (out_l, out_r) = self.reverb.process(left[i], right[i]);
            left[i] = out_l;
            right[i] = out_r;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reverb that passes input through attenuated by the feedback value,
    /// making the parameter path observable in the output.
    struct StubReverb {
        feedback: f32,
        lowpass_cutoff: f32,
    }

    impl StubReverb {
        fn boxed() -> Box<dyn Reverb> {
            Box::new(Self {
                feedback: 0.0,
                lowpass_cutoff: 0.0,
            })
        }
    }

    impl Reverb for StubReverb {
        fn feedback(&self) -> f32 {
            self.feedback
        }
        fn set_feedback(&mut self, feedback: f32) {
            self.feedback = feedback;
        }
        fn lowpass_cutoff(&self) -> f32 {
            self.lowpass_cutoff
        }
        fn set_lowpass_cutoff(&mut self, cutoff: f32) {
            self.lowpass_cutoff = cutoff;
        }
        fn process(&mut self, input_l: f32, input_r: f32) -> (f32, f32) {
            (input_l * self.feedback, input_r * self.feedback)
        }
    }

    #[test]
    fn test_defaults_applied_at_construction() {
        let plugin = ReverbPlugin::new(StubReverb::boxed());
        assert_eq!(plugin.get_parameter_value(PARAM_FEEDBACK), 0.5);
        assert_eq!(plugin.get_parameter_value(PARAM_LOWPASS_CUTOFF), 4_000.0);
    }

    #[test]
    fn test_parameter_table() {
        let feedback = parameter_info(PARAM_FEEDBACK).unwrap();
        assert_eq!(feedback.name, "feedback");
        assert_eq!((feedback.min, feedback.max), (0.0, 1.0));

        let lpfreq = parameter_info(PARAM_LOWPASS_CUTOFF).unwrap();
        assert_eq!(lpfreq.name, "lpfreq");
        assert_eq!(lpfreq.default, 4_000.0);

        assert!(parameter_info(2).is_none());
    }

    #[test]
    fn test_parameter_reaches_reverb() {
        let mut plugin = ReverbPlugin::new(StubReverb::boxed());
        plugin.set_parameter_value(PARAM_FEEDBACK, 0.25);
        assert_eq!(plugin.get_parameter_value(PARAM_FEEDBACK), 0.25);

        let mut left = [1.0, 2.0];
        let mut right = [4.0, 8.0];
        plugin.run(&mut left, &mut right);
        assert_eq!(left, [0.25, 0.5]);
        assert_eq!(right, [1.0, 2.0]);
    }

    #[test]
    fn test_unknown_parameter_is_ignored() {
        let mut plugin = ReverbPlugin::new(StubReverb::boxed());
        plugin.set_parameter_value(7, 1.0);
        assert_eq!(plugin.get_parameter_value(7), 0.0);
    }

    #[test]
    fn test_state_round_trip() {
        let mut plugin = ReverbPlugin::new(StubReverb::boxed());
        assert_eq!(plugin.get_state("ui_width"), "");
        plugin.set_state("ui_width", "640");
        plugin.set_state("ui_height", "320");
        assert_eq!(plugin.get_state("ui_width"), "640");
        assert_eq!(plugin.get_state("ui_height"), "320");
    }

    #[test]
    fn test_run_handles_mismatched_block_lengths() {
        let mut plugin = ReverbPlugin::new(StubReverb::boxed());
        plugin.set_parameter_value(PARAM_FEEDBACK, 1.0);
        let mut left = [1.0, 1.0, 1.0];
        let mut right = [1.0];
        plugin.run(&mut left, &mut right);
        // Only the common prefix is processed.
        assert_eq!(left, [1.0, 1.0, 1.0]);
        assert_eq!(right, [1.0]);
    }
}
