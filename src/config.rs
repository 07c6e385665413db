//! Engine configuration

use crate::noise::NOISE_LOOP_SECONDS;
use crate::smoother::{ParameterSmoother, FILTER_TIME_CONSTANT, VOLUME_TIME_CONSTANT};

/// Tunables for a [`Transport`](crate::Transport).
///
/// The defaults reproduce the reference ambience: 2 second noise loops,
/// 10 ms volume ramps and 100 ms filter ramps.
///
/// ```
/// use rauschen::EngineConfig;
///
/// let config = EngineConfig::default()
///     .with_seed(7)
///     .with_filter_time_constant(0.25);
/// assert_eq!(config.seed, Some(7));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Length of each generated noise loop, in seconds
    pub noise_loop_seconds: f32,
    /// Time constant for volume ramps, in seconds
    pub volume_time_constant: f32,
    /// Time constant for cutoff/resonance ramps, in seconds
    pub filter_time_constant: f32,
    /// Capacity of each node's message queue
    pub message_queue_size: usize,
    /// Fixed seed for noise generation; `None` draws fresh randomness
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            noise_loop_seconds: NOISE_LOOP_SECONDS,
            volume_time_constant: VOLUME_TIME_CONSTANT,
            filter_time_constant: FILTER_TIME_CONSTANT,
            message_queue_size: 64,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn with_noise_loop_seconds(mut self, seconds: f32) -> Self {
        self.noise_loop_seconds = seconds.max(0.0);
        self
    }

    pub fn with_volume_time_constant(mut self, seconds: f32) -> Self {
        self.volume_time_constant = seconds.max(0.0);
        self
    }

    pub fn with_filter_time_constant(mut self, seconds: f32) -> Self {
        self.filter_time_constant = seconds.max(0.0);
        self
    }

    pub fn with_message_queue_size(mut self, size: usize) -> Self {
        self.message_queue_size = size.max(1);
        self
    }

    /// Make noise buffers reproducible across runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Ramp builder for the configured time constants.
    pub fn smoother(&self) -> ParameterSmoother {
        ParameterSmoother::new(self.volume_time_constant, self.filter_time_constant)
    }

    /// Number of samples in one noise loop at `sample_rate`.
    pub fn noise_loop_len(&self, sample_rate: u32) -> usize {
        (self.noise_loop_seconds as f64 * sample_rate as f64).round() as usize
    }
}
