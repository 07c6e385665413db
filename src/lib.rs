//! # rauschen
//!
//! Procedural ambient sound engine: three colored-noise loops and four drone
//! oscillators, each behind its own gain stage, all summed into one resonant
//! low-pass filter.
//!
//! ```text
//!  white ─ gain ─┐
//!  pink  ─ gain ─┤
//!  brown ─ gain ─┤
//!  sine  ─ gain ─┼─ low-pass ─ output device
//!  tri   ─ gain ─┤
//!  square─ gain ─┤
//!  saw   ─ gain ─┘
//! ```
//!
//! Every control-side edit (volume, cutoff, resonance) becomes an exponential
//! [`Ramp`] sent through a lock-free message queue, so dragging a slider never
//! clicks and the audio thread never waits on the UI.
//!
//! # Quick Start
//!
//! ```
//! use rauschen::{EngineConfig, EngineState, OfflineDevice, Transport, VoiceKind};
//!
//! let (device, samples) = OfflineDevice::new(48_000);
//! let mut transport = Transport::new(device, EngineState::default(), EngineConfig::default());
//!
//! transport.set_volume(VoiceKind::PinkNoise, 0.4);
//! transport.start().expect("offline device is always ready");
//! transport.set_cutoff(800.0);
//!
//! transport.process();
//! assert_eq!(samples.slots(), 64);
//! ```
//!
//! With the `cpal_sink` feature, [`CpalDevice`] plays through the system's
//! default output instead.

extern crate alloc;

mod config;
mod device;
mod engine;
mod error;
mod graph;
mod master;
mod node;
pub mod noise;
pub mod nodes;
mod smoother;
mod state;
mod transport;
mod voice;

pub use config::EngineConfig;
#[cfg(feature = "cpal_sink")]
pub use device::CpalDevice;
pub use device::{DeviceGate, OfflineDevice, OutputDevice, Readiness};
pub use engine::{Engine, Handle};
pub use error::{EngineError, Result};
pub use master::MasterFilter;
pub use node::{AudioNode, NodeId, ProcessContext, BLOCK_SIZE};
pub use smoother::{ParamMonitor, ParameterSmoother, Ramp, SmoothedParam};
pub use state::{EngineState, FilterSettings};
pub use transport::{StartOutcome, Transport, TransportState};
pub use voice::{SourceSpec, Voice, VoiceKind};
