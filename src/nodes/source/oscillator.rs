//! Periodic waveform oscillator

use dasp_graph::{Buffer, Input};
use crate::node::{AudioNode, ProcessContext};

/// Oscillator wave shapes.
///
/// All shapes start at phase 0 and swing the full [-1, 1] range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
    Sawtooth,
}

impl Waveform {
    /// Value at `phase` in [0, 1).
    #[inline]
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (phase * core::f32::consts::TAU).sin(),
            Waveform::Triangle => {
                // rises through 0 at phase 0, peaks at 0.25
                let t = (phase + 0.75).fract();
                4.0 * (t - 0.5).abs() - 1.0
            }
            Waveform::Square => {
                if phase < 0.5 { 1.0 } else { -1.0 }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
        }
    }
}

/// Messages to control an [`Oscillator`]
#[derive(Clone, Copy, Debug)]
pub enum OscillatorMessage {
    SetFrequency(f32),
}

/// A free-running oscillator (mono source) at unit amplitude.
///
/// Level is left to the downstream [`Gain`](crate::nodes::Gain).
pub struct Oscillator {
    waveform: Waveform,
    frequency: f32,
    phase: f32,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f32) -> Self {
        Self {
            waveform,
            frequency: frequency.max(0.0),
            phase: 0.0,
        }
    }

    #[inline]
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    #[inline]
    pub fn frequency(&self) -> f32 {
        self.frequency
    }
}

impl AudioNode for Oscillator {
    type Message = OscillatorMessage;

    fn process(
        &mut self,
        ctx: &ProcessContext,
        messages: impl Iterator<Item = OscillatorMessage>,
        _inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        for msg in messages {
            match msg {
                OscillatorMessage::SetFrequency(f) => self.frequency = f.max(0.0),
            }
        }

        let Some((first, rest)) = outputs.split_first_mut() else {
            return;
        };

        let phase_inc = self.frequency / ctx.sample_rate as f32;
        let waveform = self.waveform;

        for sample in first.iter_mut() {
            *sample = waveform.sample(self.phase);

            self.phase += phase_inc;
            // Branchless phase wrap (phase is always positive)
            self.phase -= (self.phase >= 1.0) as u32 as f32;
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
