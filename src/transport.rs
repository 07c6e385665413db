//! Start/stop lifecycle of the whole voice set

use alloc::vec::Vec;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::device::{OutputDevice, Readiness};
use crate::engine::Engine;
use crate::error::Result;
use crate::master::MasterFilter;
use crate::state::EngineState;
use crate::voice::{Voice, VoiceKind};

/// Whether the voices and filter currently exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
}

/// What [`Transport::start`] achieved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    /// The graph is built and audible
    Playing,
    /// The device is still activating; call [`Transport::poll_startup`]
    Pending,
}

/// Everything built by one start, torn down by the matching stop
struct Live {
    filter: MasterFilter,
    /// In [`VoiceKind::ALL`] order
    voices: Vec<Voice>,
}

/// Drives the engine between stopped and playing.
///
/// Starting builds the master filter and then all seven voices from the
/// [`EngineState`]; stopping removes the voices and then the filter. Volume
/// and filter edits are remembered in the state whether or not anything is
/// playing, so the next start picks them up.
///
/// Device activation may be asynchronous. While it is pending the transport
/// is still [`Stopped`](TransportState::Stopped) but
/// [`is_starting`](Self::is_starting); a [`stop`](Self::stop) in that window
/// cancels the start once the device reports back.
///
/// ```
/// use rauschen::{EngineConfig, EngineState, OfflineDevice, StartOutcome, Transport, TransportState};
///
/// let (device, _samples, gate) = OfflineDevice::gated(48_000);
/// let mut transport = Transport::new(device, EngineState::default(), EngineConfig::default());
///
/// assert_eq!(transport.start(), Ok(StartOutcome::Pending));
/// gate.open();
/// assert_eq!(transport.poll_startup(), Ok(TransportState::Playing));
/// assert_eq!(transport.live_voices(), 7);
/// ```
pub struct Transport<D: OutputDevice> {
    device: D,
    state: EngineState,
    config: EngineConfig,
    rng: StdRng,

    /// Created on the first successful activation; keeps the device sink
    engine: Option<Engine>,
    live: Option<Live>,

    starting: bool,
    stop_requested: bool,
}

impl<D: OutputDevice> Transport<D> {
    pub fn new(device: D, state: EngineState, config: EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        Self {
            device,
            state,
            config,
            rng,
            engine: None,
            live: None,
            starting: false,
            stop_requested: false,
        }
    }

    /// Start playback.
    ///
    /// A no-op while playing. If the device needs time to activate this
    /// returns [`StartOutcome::Pending`] and [`poll_startup`](Self::poll_startup)
    /// finishes the job. On failure nothing is built and the transport stays
    /// stopped.
    pub fn start(&mut self) -> Result<StartOutcome> {
        if self.live.is_some() {
            return Ok(StartOutcome::Playing);
        }
        if self.starting {
            // a fresh start overrides an earlier stop request
            self.stop_requested = false;
            return Ok(StartOutcome::Pending);
        }

        match self.device.resume() {
            Ok(Readiness::Ready) => {
                self.build()?;
                Ok(StartOutcome::Playing)
            }
            Ok(Readiness::Pending) => {
                info!("waiting for output device");
                self.starting = true;
                self.stop_requested = false;
                Ok(StartOutcome::Pending)
            }
            Err(err) => {
                warn!(%err, "start failed");
                Err(err)
            }
        }
    }

    /// Resolve a pending start.
    ///
    /// Returns the resulting state. A stop requested while the device was
    /// activating wins: the transport stays stopped and nothing is built.
    pub fn poll_startup(&mut self) -> Result<TransportState> {
        if !self.starting {
            return Ok(self.transport_state());
        }

        match self.device.poll_ready() {
            Ok(Readiness::Pending) => Ok(TransportState::Stopped),
            Ok(Readiness::Ready) => {
                self.starting = false;
                if core::mem::take(&mut self.stop_requested) {
                    info!("device ready, but stop was requested during startup");
                    return Ok(TransportState::Stopped);
                }
                self.build()?;
                Ok(TransportState::Playing)
            }
            Err(err) => {
                self.starting = false;
                self.stop_requested = false;
                warn!(%err, "output device failed to activate");
                Err(err)
            }
        }
    }

    /// Stop playback, removing every voice and then the filter.
    ///
    /// A no-op while stopped. During a pending start this only records the
    /// request.
    pub fn stop(&mut self) {
        if self.starting {
            debug!("stop requested during startup");
            self.stop_requested = true;
            return;
        }

        let (Some(live), Some(engine)) = (self.live.take(), self.engine.as_mut()) else {
            return;
        };

        for voice in live.voices {
            voice.destroy(engine);
        }
        live.filter.destroy(engine);

        info!(remaining_nodes = engine.node_count(), "stopped");
    }

    /// Stop if playing or starting, start otherwise.
    pub fn toggle(&mut self) -> Result<()> {
        if self.is_playing() || (self.starting && !self.stop_requested) {
            self.stop();
            Ok(())
        } else {
            self.start().map(|_| ())
        }
    }

    /// Set a voice's volume (clamped to [0, 1]), ramping it if live.
    pub fn set_volume(&mut self, kind: VoiceKind, volume: f32) {
        if !volume.is_finite() {
            warn!(%kind, volume, "ignoring non-finite volume");
            return;
        }
        let volume = self.state.set_volume(kind, volume);
        if let Some(voice) = self.live.as_mut().and_then(|live| live.voices.get_mut(kind.index())) {
            voice.set_volume(volume);
        }
    }

    /// Set the filter cutoff in Hz, ramping it if live.
    pub fn set_cutoff(&mut self, hz: f32) {
        if !hz.is_finite() {
            warn!(hz, "ignoring non-finite cutoff");
            return;
        }
        let hz = hz.max(0.0);
        self.state.filter.cutoff_hz = hz;
        if let Some(live) = self.live.as_mut() {
            live.filter.set_cutoff(hz);
        }
    }

    /// Set the filter resonance (Q, dB), ramping it if live.
    pub fn set_resonance(&mut self, q: f32) {
        if !q.is_finite() {
            warn!(q, "ignoring non-finite resonance");
            return;
        }
        self.state.filter.resonance = q;
        if let Some(live) = self.live.as_mut() {
            live.filter.set_resonance(q);
        }
    }

    /// Render one block into the device.
    ///
    /// Nothing happens before the first successful start. While stopped the
    /// sink still receives silence.
    pub fn process(&mut self) {
        if let Some(live) = self.live.as_mut() {
            live.filter.flush();
            live.voices.iter_mut().for_each(Voice::flush);
        }
        if let Some(engine) = self.engine.as_mut() {
            engine.process();
        }
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.live.is_some()
    }

    #[inline]
    pub fn is_starting(&self) -> bool {
        self.starting
    }

    pub fn transport_state(&self) -> TransportState {
        if self.is_playing() {
            TransportState::Playing
        } else {
            TransportState::Stopped
        }
    }

    pub fn engine_state(&self) -> &EngineState {
        &self.state
    }

    /// The stored volume for `kind`, live or not
    pub fn volume(&self, kind: VoiceKind) -> f32 {
        self.state.volume(kind)
    }

    /// Instantaneous gain of a live voice
    pub fn voice_gain(&self, kind: VoiceKind) -> Option<f32> {
        self.live
            .as_ref()
            .and_then(|live| live.voices.get(kind.index()))
            .map(Voice::current_gain)
    }

    /// Instantaneous cutoff of the live filter
    pub fn filter_cutoff(&self) -> Option<f32> {
        self.live.as_ref().map(|live| live.filter.current_cutoff())
    }

    /// Instantaneous resonance of the live filter
    pub fn filter_resonance(&self) -> Option<f32> {
        self.live.as_ref().map(|live| live.filter.current_resonance())
    }

    pub fn live_voices(&self) -> usize {
        self.live.as_ref().map_or(0, |live| live.voices.len())
    }

    /// Nodes in the graph besides the device sink
    pub fn live_nodes(&self) -> usize {
        self.engine.as_ref().map_or(0, Engine::node_count)
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn build(&mut self) -> Result<()> {
        let engine = match &mut self.engine {
            Some(engine) => engine,
            slot @ None => {
                let sink = self.device.create_sink()?;
                let engine = Engine::new(self.device.sample_rate())
                    .with_queue_size(self.config.message_queue_size)
                    .with_output(sink);
                slot.insert(engine)
            }
        };

        let filter = MasterFilter::create(engine, &self.state.filter, self.config.smoother());
        let voices = VoiceKind::ALL
            .into_iter()
            .map(|kind| {
                let volume = self.state.volume(kind);
                Voice::create(kind, volume, &filter, engine, &mut self.rng, &self.config)
            })
            .collect();

        info!(
            rate = engine.sample_rate(),
            cutoff_hz = self.state.filter.cutoff_hz,
            resonance = self.state.filter.resonance,
            "playing"
        );
        self.live = Some(Live { filter, voices });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::OfflineDevice;
    use crate::error::EngineError;

    fn transport() -> Transport<OfflineDevice> {
        let (device, _samples) = OfflineDevice::new(48_000);
        let config = EngineConfig::default().with_seed(9).with_noise_loop_seconds(0.05);
        Transport::new(device, EngineState::default(), config)
    }

    #[test]
    fn starts_stopped_with_nothing_built() {
        let mut transport = transport();
        assert_eq!(transport.transport_state(), TransportState::Stopped);
        assert_eq!(transport.live_nodes(), 0);
        assert_eq!(transport.filter_cutoff(), None);
        transport.process();
    }

    #[test]
    fn builds_filter_and_two_nodes_per_voice() {
        let mut transport = transport();
        assert_eq!(transport.start(), Ok(StartOutcome::Playing));
        assert_eq!(transport.live_voices(), 7);
        assert_eq!(transport.live_nodes(), 1 + 2 * 7);

        transport.stop();
        assert_eq!(transport.live_nodes(), 0);
        assert_eq!(transport.voice_gain(VoiceKind::Sine), None);
    }

    #[test]
    fn non_finite_values_are_ignored() {
        let mut transport = transport();
        transport.set_volume(VoiceKind::PinkNoise, 0.25);
        transport.set_volume(VoiceKind::PinkNoise, f32::NAN);
        transport.set_cutoff(f32::INFINITY);
        transport.set_resonance(f32::NEG_INFINITY);

        assert_eq!(transport.volume(VoiceKind::PinkNoise), 0.25);
        assert_eq!(transport.engine_state().filter.cutoff_hz, 20_000.0);
        assert_eq!(transport.engine_state().filter.resonance, 0.0);
    }

    #[test]
    fn unavailable_device_builds_nothing() {
        let device = OfflineDevice::unavailable(48_000);
        let mut transport = Transport::new(device, EngineState::default(), EngineConfig::default());

        assert!(matches!(transport.start(), Err(EngineError::DeviceUnavailable(_))));
        assert!(!transport.is_starting());
        assert_eq!(transport.live_nodes(), 0);
    }

    #[test]
    fn toggle_while_starting_cancels() {
        let (device, _samples, gate) = OfflineDevice::gated(48_000);
        let mut transport = Transport::new(device, EngineState::default(), EngineConfig::default());

        transport.toggle().ok();
        assert!(transport.is_starting());
        transport.toggle().ok();

        gate.open();
        assert_eq!(transport.poll_startup(), Ok(TransportState::Stopped));
        assert_eq!(transport.live_voices(), 0);
    }
}
