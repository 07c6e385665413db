//! Resonant low-pass filter effect
//!
//! A second-order (biquad) low-pass from the RBJ audio EQ cookbook, with
//! resonance given in decibels the way a Web Audio `BiquadFilterNode` reads
//! its `Q` for the low-pass type:
//!
//! ```text
//! w0    = 2π · cutoff / Fs
//! alpha = sin(w0) / (2 · 10^(Q / 20))
//! b0 = b2 = (1 - cos w0) / 2,  b1 = 1 - cos w0
//! a0 = 1 + alpha,  a1 = -2 cos w0,  a2 = 1 - alpha
//! ```
//!
//! Q = 0 dB leaves unity gain at the cutoff; larger values add a resonant
//! peak there.

use dasp_graph::{Buffer, Input};
use crate::node::{AudioNode, ProcessContext};
use crate::smoother::{ParamMonitor, Ramp, SmoothedParam};

/// Messages to control the low-pass
#[derive(Clone, Copy, Debug)]
pub enum LowPassMessage {
    /// Approach a new cutoff frequency in Hz
    Cutoff(Ramp),
    /// Approach a new resonance in dB
    Resonance(Ramp),
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Coefficients {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl Coefficients {
    const PASS: Self = Self { b0: 1.0, b1: 0.0, b2: 0.0, a1: 0.0, a2: 0.0 };
    const MUTE: Self = Self { b0: 0.0, b1: 0.0, b2: 0.0, a1: 0.0, a2: 0.0 };

    fn lowpass(cutoff_hz: f32, resonance_db: f32, sample_rate: u32) -> Self {
        let nyquist = sample_rate as f64 / 2.0;
        let cutoff = cutoff_hz as f64;

        if cutoff >= nyquist {
            return Self::PASS;
        }
        if cutoff <= 0.0 {
            return Self::MUTE;
        }

        // f64 keeps low cutoffs stable
        let w0 = core::f64::consts::TAU * cutoff / sample_rate as f64;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * 10f64.powf(resonance_db as f64 / 20.0));

        let a0 = 1.0 + alpha;
        let b1 = (1.0 - cos_w0) / a0;

        Self {
            b0: (b1 / 2.0) as f32,
            b1: b1 as f32,
            b2: (b1 / 2.0) as f32,
            a1: (-2.0 * cos_w0 / a0) as f32,
            a2: ((1.0 - alpha) / a0) as f32,
        }
    }
}

/// The shared master filter.
///
/// Sums every input, then filters the mix. Cutoff and resonance are smoothed
/// per sample; coefficients are only recomputed while a ramp is in flight.
pub struct LowPass {
    cutoff: SmoothedParam,
    resonance: SmoothedParam,
    coeffs: Coefficients,
    /// Sample rate the coefficients were computed for
    coeffs_rate: Option<u32>,
    // transposed direct form II state
    z1: f32,
    z2: f32,
    cutoff_monitor: ParamMonitor,
    resonance_monitor: ParamMonitor,
}

impl LowPass {
    pub fn new(cutoff_hz: f32, resonance_db: f32) -> Self {
        Self {
            cutoff: SmoothedParam::new(cutoff_hz),
            resonance: SmoothedParam::new(resonance_db),
            coeffs: Coefficients::PASS,
            coeffs_rate: None,
            z1: 0.0,
            z2: 0.0,
            cutoff_monitor: ParamMonitor::new(cutoff_hz),
            resonance_monitor: ParamMonitor::new(resonance_db),
        }
    }

    /// A readout of the instantaneous cutoff, updated after each block.
    pub fn cutoff_monitor(&self) -> ParamMonitor {
        self.cutoff_monitor.clone()
    }

    /// A readout of the instantaneous resonance, updated after each block.
    pub fn resonance_monitor(&self) -> ParamMonitor {
        self.resonance_monitor.clone()
    }

    #[inline]
    fn tick(&mut self, x: f32) -> f32 {
        let c = self.coeffs;
        let y = c.b0 * x + self.z1;
        self.z1 = c.b1 * x - c.a1 * y + self.z2;
        self.z2 = c.b2 * x - c.a2 * y;
        y
    }
}

impl AudioNode for LowPass {
    type Message = LowPassMessage;

    fn process(
        &mut self,
        ctx: &ProcessContext,
        messages: impl Iterator<Item = LowPassMessage>,
        inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        for msg in messages {
            match msg {
                LowPassMessage::Cutoff(ramp) => self.cutoff.ramp(ramp, ctx.sample_rate),
                LowPassMessage::Resonance(ramp) => self.resonance.ramp(ramp, ctx.sample_rate),
            }
        }

        if self.coeffs_rate != Some(ctx.sample_rate) {
            self.coeffs = Coefficients::lowpass(self.cutoff.current(), self.resonance.current(), ctx.sample_rate);
            self.coeffs_rate = Some(ctx.sample_rate);
        }

        let Some((out, rest)) = outputs.split_first_mut() else {
            return;
        };

        // Mix all voices
        out.iter_mut().for_each(|s| *s = 0.0);
        for input in inputs {
            if let Some(in_buffer) = input.buffers().first() {
                for (o, i) in out.iter_mut().zip(in_buffer.iter()) {
                    *o += *i;
                }
            }
        }

        for sample in out.iter_mut() {
            if !(self.cutoff.is_settled() && self.resonance.is_settled()) {
                let cutoff = self.cutoff.next();
                let resonance = self.resonance.next();
                self.coeffs = Coefficients::lowpass(cutoff, resonance, ctx.sample_rate);
            }
            *sample = self.tick(*sample);
        }

        for buffer in rest.iter_mut() {
            buffer.copy_from_slice(out);
        }

        self.cutoff_monitor.store(self.cutoff.current());
        self.resonance_monitor.store(self.resonance.current());
    }

    #[inline]
    fn num_inputs(&self) -> usize {
        // Accept any number of inputs
        usize::MAX
    }

    #[inline]
    fn num_outputs(&self) -> usize { 1 }
}
