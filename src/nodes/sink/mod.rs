#[cfg(feature = "cpal_sink")]
mod cpal_sink;
mod rtrb_sink;

#[cfg(feature = "cpal_sink")]
pub use cpal_sink::{CpalSink, StreamStats};
#[cfg(feature = "cpal_sink")]
pub(crate) use cpal_sink::build_stream;
pub use rtrb_sink::RtrbSink;

use dasp_graph::Input;

/// Frame `i` of output channel `ch`, summed over every connected input.
///
/// An input with fewer channels repeats its last one; no inputs gives silence.
#[inline]
fn mix_sample(inputs: &[Input], ch: usize, i: usize) -> f32 {
    inputs
        .iter()
        .filter_map(|input| {
            let buffers = input.buffers();
            buffers.get(ch.min(buffers.len().checked_sub(1)?))
        })
        .map(|buffer| buffer[i])
        .sum()
}
