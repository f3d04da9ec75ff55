//! Reverb unit contract.
//!
//! The DSP algorithm is an external collaborator; the plugin only needs an
//! opaque unit with two controls and a per-sample process call.

/// An opaque stereo reverb.
pub trait Reverb: Send {
    /// Tail feedback amount, 0..1.
    fn feedback(&self) -> f32;
    fn set_feedback(&mut self, feedback: f32);

    /// Low-pass cutoff applied inside the tail, in Hz.
    fn lowpass_cutoff(&self) -> f32;
    fn set_lowpass_cutoff(&mut self, cutoff: f32);

    /// Process one stereo frame.
    fn process(&mut self, input_l: f32, input_r: f32) -> (f32, f32);
}
