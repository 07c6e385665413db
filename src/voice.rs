//! Voices: one sound source plus its own gain stage

use core::fmt;
use core::str::FromStr;

use rand::Rng;
use tracing::debug;

use crate::config::EngineConfig;
use crate::engine::{Engine, Handle};
use crate::error::EngineError;
use crate::master::MasterFilter;
use crate::noise::{NoiseBuffer, NoiseColor};
use crate::nodes::{Gain, GainMessage, LoopPlayer, Oscillator, OscillatorMessage, Waveform};
use crate::smoother::{ParamMonitor, ParameterSmoother, Ramp};

/// The seven sound sources, in mixing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VoiceKind {
    WhiteNoise,
    PinkNoise,
    BrownNoise,
    Sine,
    Triangle,
    Square,
    Sawtooth,
}

/// What feeds a voice's gain stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SourceSpec {
    /// A looped noise buffer
    Noise(NoiseColor),
    /// A free-running oscillator
    Periodic { waveform: Waveform, base_hz: f32 },
}

impl VoiceKind {
    pub const COUNT: usize = 7;

    pub const ALL: [VoiceKind; Self::COUNT] = [
        VoiceKind::WhiteNoise,
        VoiceKind::PinkNoise,
        VoiceKind::BrownNoise,
        VoiceKind::Sine,
        VoiceKind::Triangle,
        VoiceKind::Square,
        VoiceKind::Sawtooth,
    ];

    /// Position in [`ALL`](Self::ALL)
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The source this kind is built from.
    pub fn source(self) -> SourceSpec {
        match self {
            VoiceKind::WhiteNoise => SourceSpec::Noise(NoiseColor::White),
            VoiceKind::PinkNoise => SourceSpec::Noise(NoiseColor::Pink),
            VoiceKind::BrownNoise => SourceSpec::Noise(NoiseColor::Brown),
            VoiceKind::Sine => SourceSpec::Periodic { waveform: Waveform::Sine, base_hz: 110.0 },
            VoiceKind::Triangle => SourceSpec::Periodic { waveform: Waveform::Triangle, base_hz: 110.0 },
            VoiceKind::Square => SourceSpec::Periodic { waveform: Waveform::Square, base_hz: 55.0 },
            VoiceKind::Sawtooth => SourceSpec::Periodic { waveform: Waveform::Sawtooth, base_hz: 55.0 },
        }
    }

    /// Short key, as accepted by [`FromStr`]
    pub fn name(self) -> &'static str {
        match self {
            VoiceKind::WhiteNoise => "white",
            VoiceKind::PinkNoise => "pink",
            VoiceKind::BrownNoise => "brown",
            VoiceKind::Sine => "sine",
            VoiceKind::Triangle => "triangle",
            VoiceKind::Square => "square",
            VoiceKind::Sawtooth => "sawtooth",
        }
    }
}

impl fmt::Display for VoiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VoiceKind {
    type Err = EngineError;

    /// Accepts the short key (`"pink"`) or the long UI form (`"pink-noise"`,
    /// `"sine-wave"`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        let short = key
            .strip_suffix("-noise")
            .or_else(|| key.strip_suffix("-wave"))
            .unwrap_or(key.as_str());

        VoiceKind::ALL
            .into_iter()
            .find(|kind| kind.name() == short || (short == "saw" && *kind == VoiceKind::Sawtooth))
            .ok_or_else(|| EngineError::InvalidVoiceKind(s.to_owned()))
    }
}

enum SourceHandle {
    Noise(Handle<()>),
    Periodic(Handle<OscillatorMessage>),
}

/// A live voice: its source and gain nodes, created and removed together.
///
/// The voice does not own its volume; that lives in
/// [`EngineState`](crate::EngineState) so it survives the voice.
pub struct Voice {
    kind: VoiceKind,
    source: SourceHandle,
    gain: Handle<GainMessage>,
    monitor: ParamMonitor,
    smoother: ParameterSmoother,
    pending: Option<Ramp>,
}

impl Voice {
    /// Build the source and gain for `kind` and wire them into `filter`.
    ///
    /// The gain starts at `volume` exactly, so the voice is audible from its
    /// first block. Noise buffers are drawn from `rng`.
    pub fn create<R: Rng + ?Sized>(
        kind: VoiceKind,
        volume: f32,
        filter: &MasterFilter,
        engine: &mut Engine,
        rng: &mut R,
        config: &EngineConfig,
    ) -> Self {
        let source = match kind.source() {
            SourceSpec::Noise(color) => {
                let len = config.noise_loop_len(engine.sample_rate());
                let samples = NoiseBuffer::generate_len(color, len, rng);
                SourceHandle::Noise(engine.add(LoopPlayer::new(samples)))
            }
            SourceSpec::Periodic { waveform, base_hz } => {
                SourceHandle::Periodic(engine.add(Oscillator::new(waveform, base_hz)))
            }
        };

        let gain_node = Gain::new(volume);
        let monitor = gain_node.monitor();
        let gain = engine.add(gain_node);

        match &source {
            SourceHandle::Noise(handle) => engine.connect(handle, &gain),
            SourceHandle::Periodic(handle) => engine.connect(handle, &gain),
        };
        engine.connect(&gain, filter.handle());

        debug!(%kind, volume, "voice created");

        Self {
            kind,
            source,
            gain,
            monitor,
            smoother: config.smoother(),
            pending: None,
        }
    }

    #[inline]
    pub fn kind(&self) -> VoiceKind {
        self.kind
    }

    /// Ramp the gain toward `volume`.
    pub fn set_volume(&mut self, volume: f32) {
        let ramp = self.smoother.volume(volume);
        self.pending = None;
        if let Err(GainMessage::Ramp(ramp)) = self.gain.send(GainMessage::Ramp(ramp)) {
            debug!(kind = %self.kind, volume = ramp.target, "gain queue full, holding ramp");
            self.pending = Some(ramp);
        }
    }

    /// Re-send a ramp that did not fit in the queue earlier.
    pub fn flush(&mut self) {
        if let Some(ramp) = self.pending.take() {
            if let Err(GainMessage::Ramp(ramp)) = self.gain.send(GainMessage::Ramp(ramp)) {
                self.pending = Some(ramp);
            }
        }
    }

    /// Instantaneous gain as of the last rendered block
    pub fn current_gain(&self) -> f32 {
        self.monitor.load()
    }

    /// Retune an oscillator voice. Returns false for noise voices.
    pub fn set_frequency(&mut self, hz: f32) -> bool {
        match &mut self.source {
            SourceHandle::Periodic(handle) => handle.send(OscillatorMessage::SetFrequency(hz)).is_ok(),
            SourceHandle::Noise(_) => false,
        }
    }

    /// Remove the source and gain nodes from `engine`.
    pub fn destroy(self, engine: &mut Engine) {
        match self.source {
            SourceHandle::Noise(handle) => engine.remove(handle),
            SourceHandle::Periodic(handle) => engine.remove(handle),
        };
        engine.remove(self.gain);
        debug!(kind = %self.kind, "voice destroyed");
    }
}
