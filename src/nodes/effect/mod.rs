//! Audio effect nodes (processors with audio inputs and outputs)

mod gain;
mod lowpass;

pub use gain::{Gain, GainMessage};
pub use lowpass::{LowPass, LowPassMessage};
