//! Ring buffer sink for offline rendering

use dasp_graph::{Buffer, Input};
use rtrb::Producer;

use crate::node::{AudioNode, ProcessContext};

/// A sink that pushes audio into an rtrb ring buffer
///
/// Used by [`OfflineDevice`](crate::OfflineDevice) to render without a sound
/// card, and by tests to capture what reached the output. Every connected
/// input is summed. With no inputs it writes silence, so a stopped engine
/// still advances time.
pub struct RtrbSink {
    producer: Producer<f32>,
    channels: usize,
}

impl RtrbSink {
    /// Create a sink that writes interleaved samples to the given producer
    pub fn new(producer: Producer<f32>, channels: usize) -> Self {
        Self {
            producer,
            channels: channels.max(1),
        }
    }

    /// Create a sink for mono audio
    pub fn mono(producer: Producer<f32>) -> Self {
        Self::new(producer, 1)
    }
}

impl AudioNode for RtrbSink {
    type Message = ();

    fn process(
        &mut self,
        ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        inputs: &[Input],
        _outputs: &mut [Buffer],
    ) {
        let samples_needed = ctx.buffer_size * self.channels;

        // Skip if the reader has fallen behind
        if self.producer.slots() < samples_needed {
            return;
        }

        for i in 0..ctx.buffer_size {
            for ch in 0..self.channels {
                let _ = self.producer.push(super::mix_sample(inputs, ch, i));
            }
        }
    }

    #[inline]
    fn num_inputs(&self) -> usize {
        // Accept any number of inputs
        usize::MAX
    }

    #[inline]
    fn num_outputs(&self) -> usize { 0 }
}
