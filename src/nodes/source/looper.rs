//! Looping buffer player

use alloc::vec::Vec;

use dasp_graph::{Buffer, Input};
use crate::node::{AudioNode, ProcessContext};

/// Plays a mono buffer end-to-end forever.
///
/// Used for noise voices: the buffer is rendered once per play session at the
/// graph's sample rate, so no resampling happens here.
pub struct LoopPlayer {
    samples: Vec<f32>,
    position: usize,
}

impl LoopPlayer {
    pub fn new(samples: Vec<f32>) -> Self {
        Self { samples, position: 0 }
    }
}

impl AudioNode for LoopPlayer {
    type Message = ();

    fn process(
        &mut self,
        _ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        _inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        let Some((first, rest)) = outputs.split_first_mut() else {
            return;
        };

        if self.samples.is_empty() {
            first.iter_mut().for_each(|s| *s = 0.0);
        } else {
            let total = self.samples.len();
            let mut written = 0;
            // copy in runs so a block may wrap around the loop point
            while written < first.len() {
                let run = (first.len() - written).min(total - self.position);
                first[written..written + run]
                    .copy_from_slice(&self.samples[self.position..self.position + run]);
                written += run;
                self.position = (self.position + run) % total;
            }
        }

        for buffer in rest.iter_mut() {
            buffer.copy_from_slice(first);
        }
    }

    #[inline]
    fn num_inputs(&self) -> usize { 0 }

    #[inline]
    fn num_outputs(&self) -> usize { 1 }
}
