//! Audio source nodes (generators with no audio inputs)

mod looper;
mod oscillator;

pub use looper::LoopPlayer;
pub use oscillator::{Oscillator, OscillatorMessage, Waveform};
