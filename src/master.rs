//! The shared low-pass every voice feeds

use tracing::debug;

use crate::engine::{Engine, Handle};
use crate::nodes::{LowPass, LowPassMessage};
use crate::smoother::{ParamMonitor, ParameterSmoother, Ramp};
use crate::state::FilterSettings;

/// The master filter stage: one [`LowPass`] wired to the engine output.
///
/// Exists only while the transport is playing. Cutoff and resonance edits
/// become ramps; if the node's queue is momentarily full the newest ramp is
/// held and re-sent by [`flush`](Self::flush).
pub struct MasterFilter {
    handle: Handle<LowPassMessage>,
    smoother: ParameterSmoother,
    cutoff: ParamMonitor,
    resonance: ParamMonitor,
    pending_cutoff: Option<Ramp>,
    pending_resonance: Option<Ramp>,
}

impl MasterFilter {
    /// Add the filter to `engine` at `settings` and connect it to the output.
    pub fn create(engine: &mut Engine, settings: &FilterSettings, smoother: ParameterSmoother) -> Self {
        let filter = LowPass::new(settings.cutoff_hz, settings.resonance);
        let cutoff = filter.cutoff_monitor();
        let resonance = filter.resonance_monitor();

        let handle = engine.add(filter);
        engine.output(&handle);
        debug!(cutoff_hz = settings.cutoff_hz, resonance = settings.resonance, "master filter created");

        Self {
            handle,
            smoother,
            cutoff,
            resonance,
            pending_cutoff: None,
            pending_resonance: None,
        }
    }

    /// Ramp the cutoff toward `hz`.
    pub fn set_cutoff(&mut self, hz: f32) {
        let ramp = self.smoother.filter(hz);
        self.pending_cutoff = None;
        if let Err(LowPassMessage::Cutoff(ramp)) = self.handle.send(LowPassMessage::Cutoff(ramp)) {
            debug!(target_hz = ramp.target, "filter queue full, holding cutoff ramp");
            self.pending_cutoff = Some(ramp);
        }
    }

    /// Ramp the resonance toward `q` (dB).
    pub fn set_resonance(&mut self, q: f32) {
        let ramp = self.smoother.filter(q);
        self.pending_resonance = None;
        if let Err(LowPassMessage::Resonance(ramp)) = self.handle.send(LowPassMessage::Resonance(ramp)) {
            debug!(target_q = ramp.target, "filter queue full, holding resonance ramp");
            self.pending_resonance = Some(ramp);
        }
    }

    /// Re-send ramps that did not fit in the queue earlier.
    pub fn flush(&mut self) {
        if let Some(ramp) = self.pending_cutoff.take() {
            if let Err(LowPassMessage::Cutoff(ramp)) = self.handle.send(LowPassMessage::Cutoff(ramp)) {
                self.pending_cutoff = Some(ramp);
            }
        }
        if let Some(ramp) = self.pending_resonance.take() {
            if let Err(LowPassMessage::Resonance(ramp)) = self.handle.send(LowPassMessage::Resonance(ramp)) {
                self.pending_resonance = Some(ramp);
            }
        }
    }

    /// Instantaneous cutoff as of the last rendered block
    pub fn current_cutoff(&self) -> f32 {
        self.cutoff.load()
    }

    /// Instantaneous resonance as of the last rendered block
    pub fn current_resonance(&self) -> f32 {
        self.resonance.load()
    }

    pub(crate) fn handle(&self) -> &Handle<LowPassMessage> {
        &self.handle
    }

    /// Remove the filter node from `engine`.
    pub fn destroy(self, engine: &mut Engine) {
        engine.remove(self.handle);
        debug!("master filter destroyed");
    }
}
