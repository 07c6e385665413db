//! Built-in audio nodes.
//!
//! Nodes are organized into three categories:
//!
//! ## Sources ([`source`])
//!
//! Generate audio with no audio inputs:
//! - [`Oscillator`] - Sine, triangle, square and sawtooth drones
//! - [`LoopPlayer`] - Seamlessly loops a pre-rendered noise buffer
//!
//! ## Effects ([`effect`])
//!
//! Process audio (inputs → outputs):
//! - [`Gain`] - Per-voice volume with exponential ramps
//! - [`LowPass`] - Resonant biquad low-pass that sums all of its inputs
//!
//! ## Sinks ([`sink`])
//!
//! Consume audio with no audio outputs:
//! - [`CpalSink`] - Output to a system audio device (requires `cpal_sink` feature)
//! - [`RtrbSink`] - Write to a ring buffer (offline rendering, tests)
//!
//! # Message Types
//!
//! - [`OscillatorMessage`] - Retune an [`Oscillator`]
//! - [`GainMessage`] - Ramp a [`Gain`]
//! - [`LowPassMessage`] - Ramp [`LowPass`] cutoff or resonance
//!
//! [`LoopPlayer`] and the sinks use `()` as their message type.

pub mod source;
pub mod effect;
pub mod sink;

#[cfg(test)]
pub(crate) mod testing;

pub use source::{LoopPlayer, Oscillator, OscillatorMessage, Waveform};
pub use effect::{Gain, GainMessage, LowPass, LowPassMessage};
pub use sink::RtrbSink;

#[cfg(feature = "cpal_sink")]
pub use sink::CpalSink;
