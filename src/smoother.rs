//! Exponential parameter smoothing
//!
//! Every live parameter (voice gain, filter cutoff, filter resonance) moves
//! toward its target the way a Web Audio `setTargetAtTime` does:
//!
//! ```text
//! v(t) = target + (v0 - target) * e^(-t / tau)
//! ```
//!
//! Sampled per frame that is `v[n+1] = target + c * (v[n] - target)` with
//! `c = e^(-1 / (tau * Fs))`. A new ramp simply replaces the target and
//! coefficient, so it starts from wherever the previous ramp had got to.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU32, Ordering};

/// Default time constant for volume ramps (fast enough for slider drags)
pub const VOLUME_TIME_CONSTANT: f32 = 0.01;

/// Default time constant for filter ramps (slow enough to avoid zipper noise)
pub const FILTER_TIME_CONSTANT: f32 = 0.1;

/// Relative distance from the target at which a ramp lands on it
const SETTLE_EPSILON: f32 = 1e-5;

/// A request to approach `target` with time constant `time_constant` seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ramp {
    pub target: f32,
    pub time_constant: f32,
}

impl Ramp {
    pub fn new(target: f32, time_constant: f32) -> Self {
        Self { target, time_constant }
    }

    /// A ramp that lands on `target` at the next sample.
    pub fn immediate(target: f32) -> Self {
        Self { target, time_constant: 0.0 }
    }
}

/// Per-sample exponential smoother, owned by the render side.
#[derive(Clone, Copy, Debug)]
pub struct SmoothedParam {
    current: f32,
    target: f32,
    /// 0.0 = jump, values near 1.0 = slow approach
    coeff: f32,
}

impl SmoothedParam {
    /// Start settled at `value`.
    pub fn new(value: f32) -> Self {
        Self {
            current: value,
            target: value,
            coeff: 0.0,
        }
    }

    /// Retarget, superseding any ramp in flight.
    pub fn ramp(&mut self, ramp: Ramp, sample_rate: u32) {
        self.target = ramp.target;
        self.coeff = coefficient(ramp.time_constant, sample_rate);
    }

    /// Advance one sample and return the new value.
    #[inline]
    pub fn next(&mut self) -> f32 {
        if self.current != self.target {
            let next = self.target + self.coeff * (self.current - self.target);
            // f32 rounding stalls a few ulps short of the target
            let close = (next - self.target).abs() <= SETTLE_EPSILON * self.target.abs().max(1.0);
            self.current = if next == self.current || close { self.target } else { next };
        }
        self.current
    }

    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        self.current == self.target
    }
}

fn coefficient(time_constant: f32, sample_rate: u32) -> f32 {
    let samples = time_constant * sample_rate as f32;
    if samples <= 0.0 || !samples.is_finite() {
        0.0
    } else {
        (-1.0 / samples).exp()
    }
}

/// Builds ramps with the configured time constants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParameterSmoother {
    pub volume_time_constant: f32,
    pub filter_time_constant: f32,
}

impl Default for ParameterSmoother {
    fn default() -> Self {
        Self {
            volume_time_constant: VOLUME_TIME_CONSTANT,
            filter_time_constant: FILTER_TIME_CONSTANT,
        }
    }
}

impl ParameterSmoother {
    pub fn new(volume_time_constant: f32, filter_time_constant: f32) -> Self {
        Self {
            volume_time_constant,
            filter_time_constant,
        }
    }

    /// Ramp for a voice gain.
    pub fn volume(&self, target: f32) -> Ramp {
        Ramp::new(target, self.volume_time_constant)
    }

    /// Ramp for the master filter's cutoff or resonance.
    pub fn filter(&self, target: f32) -> Ramp {
        Ramp::new(target, self.filter_time_constant)
    }
}

/// The instantaneous value of a live parameter, published by the render side.
///
/// Written once per block by the node that owns the parameter; the control
/// side only reads. Cloning shares the same slot.
#[derive(Clone, Debug)]
pub struct ParamMonitor(Arc<AtomicU32>);

impl ParamMonitor {
    pub fn new(value: f32) -> Self {
        Self(Arc::new(AtomicU32::new(value.to_bits())))
    }

    #[inline]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 48_000;

    fn run(param: &mut SmoothedParam, samples: usize) -> f32 {
        let mut last = param.current();
        for _ in 0..samples {
            last = param.next();
        }
        last
    }

    #[test]
    fn one_time_constant_covers_63_percent() {
        let mut param = SmoothedParam::new(0.0);
        param.ramp(Ramp::new(1.0, 0.01), RATE);

        let value = run(&mut param, 480);
        let expected = 1.0 - (-1.0f32).exp();
        assert!((value - expected).abs() < 1e-3, "got {value}, expected {expected}");
    }

    #[test]
    fn settles_within_five_time_constants() {
        let mut param = SmoothedParam::new(20_000.0);
        param.ramp(Ramp::new(500.0, 0.1), RATE);

        let first = param.next();
        assert!(first > 19_000.0, "ramp jumped to {first} in one sample");

        let value = run(&mut param, RATE as usize / 2);
        assert!((value - 500.0).abs() < 19_500.0 * 0.01, "still at {value} after 5 tau");
    }

    #[test]
    fn new_ramp_continues_from_instantaneous_value() {
        let mut param = SmoothedParam::new(0.0);
        param.ramp(Ramp::new(1.0, 0.05), RATE);
        let midway = run(&mut param, 1000);

        param.ramp(Ramp::new(0.0, 0.05), RATE);
        let after = param.next();

        assert!(midway > 0.0 && midway < 1.0);
        assert!(after < midway && after > midway * 0.99, "{after} did not start from {midway}");
        assert_eq!(param.target(), 0.0);
    }

    #[test]
    fn slow_ramps_land_exactly_on_target() {
        for (from, to, tau) in [(20_000.0, 500.0, 0.1), (0.0, 0.8, 0.01), (0.0, 6.0, 0.1)] {
            let mut param = SmoothedParam::new(from);
            param.ramp(Ramp::new(to, tau), RATE);

            let limit = RATE as usize * 3;
            let mut steps = 0;
            while !param.is_settled() && steps < limit {
                param.next();
                steps += 1;
            }
            assert!(param.is_settled(), "{from}->{to} still at {} after 3 s", param.current());
            assert_eq!(param.current(), to);
        }
    }

    #[test]
    fn zero_time_constant_jumps() {
        let mut param = SmoothedParam::new(0.2);
        param.ramp(Ramp::immediate(0.9), RATE);
        assert_eq!(param.next(), 0.9);
        assert!(param.is_settled());
    }

    #[test]
    fn settled_param_stays_bit_exact() {
        let mut param = SmoothedParam::new(0.5);
        param.ramp(Ramp::new(0.5, 0.01), RATE);
        assert_eq!(run(&mut param, 64), 0.5);
    }

    #[test]
    fn smoother_uses_configured_constants() {
        let smoother = ParameterSmoother::default();
        assert_eq!(smoother.volume(0.3), Ramp::new(0.3, 0.01));
        assert_eq!(smoother.filter(800.0), Ramp::new(800.0, 0.1));
    }

    #[test]
    fn monitor_round_trips_through_clones() {
        let monitor = ParamMonitor::new(1.5);
        let reader = monitor.clone();
        monitor.store(-3.25);
        assert_eq!(reader.load(), -3.25);
    }
}
