//! Gain/volume control effect

use dasp_graph::{Buffer, Input};
use crate::node::{AudioNode, ProcessContext};
use crate::smoother::{ParamMonitor, Ramp, SmoothedParam};

/// Messages to control gain
#[derive(Clone, Copy, Debug)]
pub enum GainMessage {
    /// Approach a new gain multiplier (1.0 = unity, 0.0 = silence)
    Ramp(Ramp),
}

/// A mono gain stage.
///
/// Sums its inputs and scales them by a smoothed gain. The gain starts settled
/// at the constructor value, so a freshly built voice is at its level from the
/// very first sample.
pub struct Gain {
    level: SmoothedParam,
    monitor: ParamMonitor,
}

impl Gain {
    pub fn new(gain: f32) -> Self {
        Self {
            level: SmoothedParam::new(gain),
            monitor: ParamMonitor::new(gain),
        }
    }

    /// A readout of the instantaneous gain, updated after each block.
    pub fn monitor(&self) -> ParamMonitor {
        self.monitor.clone()
    }

    #[inline]
    pub fn gain(&self) -> f32 {
        self.level.target()
    }
}

impl AudioNode for Gain {
    type Message = GainMessage;

    fn process(
        &mut self,
        ctx: &ProcessContext,
        messages: impl Iterator<Item = GainMessage>,
        inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        // only the latest target matters; each ramp supersedes the last
        for msg in messages {
            match msg {
                GainMessage::Ramp(ramp) => self.level.ramp(ramp, ctx.sample_rate),
            }
        }

        let Some((out, rest)) = outputs.split_first_mut() else {
            return;
        };

        out.iter_mut().for_each(|s| *s = 0.0);
        for input in inputs {
            if let Some(in_buffer) = input.buffers().first() {
                for (o, i) in out.iter_mut().zip(in_buffer.iter()) {
                    *o += *i;
                }
            }
        }

        for sample in out.iter_mut() {
            *sample *= self.level.next();
        }

        for buffer in rest.iter_mut() {
            buffer.copy_from_slice(out);
        }

        self.monitor.store(self.level.current());
    }

    #[inline]
    fn num_inputs(&self) -> usize { 1 }

    #[inline]
    fn num_outputs(&self) -> usize { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::testing::Rig;

    #[test]
    fn starts_at_initial_gain() {
        let gain = Gain::new(0.5);
        let monitor = gain.monitor();
        let mut rig = Rig::new(gain, &[1.0]);

        let out = rig.block();

        assert_eq!(out.len(), 64);
        assert!(out.iter().all(|s| *s == 0.5));
        assert_eq!(monitor.load(), 0.5);
    }

    #[test]
    fn ramps_without_jumping() {
        let gain = Gain::new(0.0);
        let monitor = gain.monitor();
        let mut rig = Rig::new(gain, &[1.0]);

        rig.send(GainMessage::Ramp(Ramp::new(1.0, 0.01)));
        let out = rig.block();

        // rises monotonically but nowhere near the target within 64 samples
        assert!(out.windows(2).all(|w| w[1] > w[0]));
        assert!(out[63] < 0.2);
        assert_eq!(monitor.load(), out[63]);

        for _ in 0..40 {
            rig.block();
        }
        assert!(monitor.load() > 0.99);
    }

    #[test]
    fn sums_inputs() {
        let mut rig = Rig::new(Gain::new(0.5), &[1.0, 0.5]);
        assert!(rig.block().iter().all(|s| *s == 0.75));
    }

    #[test]
    fn no_input_is_silence() {
        let mut rig = Rig::new(Gain::new(1.0), &[]);
        assert!(rig.block().iter().all(|s| *s == 0.0));
    }
}
