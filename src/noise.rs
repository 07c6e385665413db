//! Colored noise buffers
//!
//! Noise voices loop a short pre-rendered buffer rather than synthesizing
//! noise on the audio thread. At two seconds the repetition is inaudible for
//! these spectra.
//!
//! | color | slope        | shaping                          |
//! | ----- | ------------ | -------------------------------- |
//! | white | flat         | none                             |
//! | pink  | -3 dB/octave | Paul Kellet's refined 7-term sum |
//! | brown | -6 dB/octave | leaky integrator                 |

use alloc::vec::Vec;

use rand::Rng;

/// Length of a noise loop, in seconds
pub const NOISE_LOOP_SECONDS: f32 = 2.0;

/// Spectral shape of a noise buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoiseColor {
    White,
    Pink,
    Brown,
}

/// Pink noise filter (Kellet's refined method).
///
/// `b6` is updated after the output is summed, so it contributes one sample
/// late. That lag is part of the published filter.
#[derive(Clone, Copy, Debug, Default)]
pub struct PinkFilter {
    b0: f32,
    b1: f32,
    b2: f32,
    b3: f32,
    b4: f32,
    b5: f32,
    b6: f32,
}

impl PinkFilter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn next(&mut self, white: f32) -> f32 {
        self.b0 = 0.99886 * self.b0 + white * 0.0555179;
        self.b1 = 0.99332 * self.b1 + white * 0.0750759;
        self.b2 = 0.96900 * self.b2 + white * 0.1538520;
        self.b3 = 0.86650 * self.b3 + white * 0.3104856;
        self.b4 = 0.55000 * self.b4 + white * 0.5329522;
        self.b5 = -0.7616 * self.b5 - white * 0.0168980;
        let out = self.b0 + self.b1 + self.b2 + self.b3 + self.b4 + self.b5 + self.b6 + white * 0.5362;
        self.b6 = white * 0.115926;
        // roughly unity gain
        out * 0.11
    }
}

/// Brown noise filter (one-pole leaky integrator).
#[derive(Clone, Copy, Debug, Default)]
pub struct BrownFilter {
    last: f32,
}

impl BrownFilter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn next(&mut self, white: f32) -> f32 {
        let out = (self.last + 0.02 * white) / 1.02;
        self.last = out;
        // level-match against white and pink
        out * 3.5
    }
}

/// Generates loopable noise buffers.
pub struct NoiseBuffer;

impl NoiseBuffer {
    /// A [`NOISE_LOOP_SECONDS`] buffer (exactly `2 * sample_rate` samples).
    pub fn generate<R: Rng + ?Sized>(color: NoiseColor, sample_rate: u32, rng: &mut R) -> Vec<f32> {
        let len = (NOISE_LOOP_SECONDS as usize) * sample_rate as usize;
        Self::generate_len(color, len, rng)
    }

    /// A buffer of exactly `len` samples, drawing fresh white noise from `rng`.
    pub fn generate_len<R: Rng + ?Sized>(color: NoiseColor, len: usize, rng: &mut R) -> Vec<f32> {
        let white = (0..len).map(|_| white_sample(rng));
        Self::from_white(color, white)
    }

    /// Shape an existing white sequence.
    ///
    /// Deterministic: the same input always yields bit-identical output.
    /// Filter state starts from zero on every call.
    pub fn from_white<I: IntoIterator<Item = f32>>(color: NoiseColor, white: I) -> Vec<f32> {
        let white = white.into_iter();
        match color {
            NoiseColor::White => white.collect(),
            NoiseColor::Pink => {
                let mut filter = PinkFilter::new();
                white.map(|w| filter.next(w)).collect()
            }
            NoiseColor::Brown => {
                let mut filter = BrownFilter::new();
                white.map(|w| filter.next(w)).collect()
            }
        }
    }
}

/// Uniform on [-1, 1).
#[inline]
fn white_sample<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.random::<f32>() * 2.0 - 1.0
}
