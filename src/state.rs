//! Parameter values that outlive any single play cycle

use crate::voice::VoiceKind;

/// Default master filter cutoff, in Hz (fully open)
pub const DEFAULT_CUTOFF_HZ: f32 = 20_000.0;

/// Master filter settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterSettings {
    pub cutoff_hz: f32,
    /// Resonance (Q) in dB
    pub resonance: f32,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            cutoff_hz: DEFAULT_CUTOFF_HZ,
            resonance: 0.0,
        }
    }
}

/// The last values chosen for every voice and for the filter.
///
/// Owned by the [`Transport`](crate::Transport) and read whenever voices are
/// built, so a value set while stopped is what the next start plays.
///
/// ```
/// use rauschen::{EngineState, VoiceKind};
///
/// let mut state = EngineState::default();
/// state.set_volume(VoiceKind::BrownNoise, 1.7);
/// assert_eq!(state.volume(VoiceKind::BrownNoise), 1.0);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EngineState {
    volumes: [f32; VoiceKind::COUNT],
    pub filter: FilterSettings,
}

impl EngineState {
    #[inline]
    pub fn volume(&self, kind: VoiceKind) -> f32 {
        self.volumes[kind.index()]
    }

    /// Store a volume, clamped to [0, 1]. Returns the stored value.
    pub fn set_volume(&mut self, kind: VoiceKind, volume: f32) -> f32 {
        let volume = volume.clamp(0.0, 1.0);
        self.volumes[kind.index()] = volume;
        volume
    }

    /// Builder-style [`set_volume`](Self::set_volume)
    pub fn with_volume(mut self, kind: VoiceKind, volume: f32) -> Self {
        self.set_volume(kind, volume);
        self
    }

    pub fn with_filter(mut self, filter: FilterSettings) -> Self {
        self.filter = filter;
        self
    }

    /// Every kind with its stored volume, in mixing order
    pub fn volumes(&self) -> impl Iterator<Item = (VoiceKind, f32)> + '_ {
        VoiceKind::ALL.into_iter().map(move |kind| (kind, self.volume(kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_silent_and_open() {
        let state = EngineState::default();
        assert!(state.volumes().all(|(_, v)| v == 0.0));
        assert_eq!(state.filter.cutoff_hz, 20_000.0);
        assert_eq!(state.filter.resonance, 0.0);
    }

    #[test]
    fn volumes_are_clamped_per_kind() {
        let mut state = EngineState::default().with_volume(VoiceKind::Sine, 0.3);
        assert_eq!(state.set_volume(VoiceKind::Square, -2.0), 0.0);

        assert_eq!(state.volume(VoiceKind::Sine), 0.3);
        assert_eq!(state.volume(VoiceKind::Square), 0.0);
        assert_eq!(state.volume(VoiceKind::Sawtooth), 0.0);
    }
}
