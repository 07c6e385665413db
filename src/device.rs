//! Output devices and their activation.
//!
//! A device is activated in two steps: [`OutputDevice::resume`] asks for the
//! output to start and [`OutputDevice::poll_ready`] reports when it actually
//! has. Real sound cards may take a while (or fail) between the two; the
//! [`Transport`](crate::Transport) keeps working while it waits.
//!
//! # Example: List and Select a Device
//!
//! ```no_run
//! # #[cfg(feature = "cpal_sink")] {
//! use rauschen::{CpalDevice, EngineConfig, EngineState, OutputDevice, Transport};
//!
//! for (i, device) in CpalDevice::list_outputs().iter().enumerate() {
//!     println!("[{}] {} ({} Hz, {} ch)",
//!         i, device.name(), device.sample_rate(), device.channels());
//! }
//!
//! let device = CpalDevice::default_output().unwrap();
//! let transport = Transport::new(device, EngineState::default(), EngineConfig::default());
//! # }
//! ```

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU8, Ordering};

use rtrb::{Consumer, Producer, RingBuffer};

use crate::error::{EngineError, Result};
use crate::node::AudioNode;
use crate::nodes::RtrbSink;

/// Whether a resumed device is producing sound yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Pending,
}

/// An audio output the engine renders into.
pub trait OutputDevice {
    /// The graph node that hands samples to the device
    type Sink: AudioNode<Message = ()>;

    fn sample_rate(&self) -> u32;

    fn channels(&self) -> usize;

    /// Ask the device to start. May complete immediately or later.
    fn resume(&mut self) -> Result<Readiness>;

    /// Check on an earlier [`resume`](Self::resume).
    fn poll_ready(&mut self) -> Result<Readiness>;

    /// Create the sink node feeding this device. Called once, after the
    /// device first reports ready.
    fn create_sink(&mut self) -> Result<Self::Sink>;
}

const GATE_PENDING: u8 = 0;
const GATE_OPEN: u8 = 1;
const GATE_FAILED: u8 = 2;

/// Remote control for a [`OfflineDevice::gated`] device's readiness.
///
/// Stands in for a permission prompt or a slow driver: the device stays
/// pending until [`open`](Self::open) or [`fail`](Self::fail) is called.
#[derive(Clone, Debug)]
pub struct DeviceGate(Arc<AtomicU8>);

impl DeviceGate {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(GATE_PENDING)))
    }

    pub fn open(&self) {
        self.0.store(GATE_OPEN, Ordering::Release);
    }

    pub fn fail(&self) {
        self.0.store(GATE_FAILED, Ordering::Release);
    }

    fn readiness(&self) -> Result<Readiness> {
        match self.0.load(Ordering::Acquire) {
            GATE_OPEN => Ok(Readiness::Ready),
            GATE_FAILED => Err(EngineError::DeviceUnavailable("device refused to start".into())),
            _ => Ok(Readiness::Pending),
        }
    }
}

/// A mono device that renders into a ring buffer instead of a sound card.
///
/// Useful for headless rendering and tests; the paired [`Consumer`] receives
/// every sample the engine produces.
pub struct OfflineDevice {
    sample_rate: u32,
    producer: Option<Producer<f32>>,
    gate: Option<DeviceGate>,
    available: bool,
}

impl OfflineDevice {
    /// A device that is ready as soon as it is resumed.
    ///
    /// The ring buffer holds one second of audio.
    pub fn new(sample_rate: u32) -> (Self, Consumer<f32>) {
        let (producer, consumer) = RingBuffer::new(sample_rate.max(1) as usize);
        let device = Self {
            sample_rate,
            producer: Some(producer),
            gate: None,
            available: true,
        };
        (device, consumer)
    }

    /// A device that stays pending until its [`DeviceGate`] decides.
    pub fn gated(sample_rate: u32) -> (Self, Consumer<f32>, DeviceGate) {
        let (mut device, consumer) = Self::new(sample_rate);
        let gate = DeviceGate::new();
        device.gate = Some(gate.clone());
        (device, consumer, gate)
    }

    /// A device that always fails to resume.
    pub fn unavailable(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            producer: None,
            gate: None,
            available: false,
        }
    }
}

impl OutputDevice for OfflineDevice {
    type Sink = RtrbSink;

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> usize {
        1
    }

    fn resume(&mut self) -> Result<Readiness> {
        self.poll_ready()
    }

    fn poll_ready(&mut self) -> Result<Readiness> {
        if !self.available {
            return Err(EngineError::DeviceUnavailable("offline device disabled".into()));
        }
        match &self.gate {
            Some(gate) => gate.readiness(),
            None => Ok(Readiness::Ready),
        }
    }

    fn create_sink(&mut self) -> Result<RtrbSink> {
        self.producer
            .take()
            .map(RtrbSink::mono)
            .ok_or_else(|| EngineError::DeviceUnavailable("sink already created".into()))
    }
}

#[cfg(feature = "cpal_sink")]
pub use self::cpal_device::CpalDevice;

#[cfg(feature = "cpal_sink")]
mod cpal_device {
    use std::string::String;
    use std::sync::mpsc::{self, Receiver, TryRecvError};
    use std::vec::Vec;

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use rtrb::{Producer, RingBuffer};
    use tracing::{info, warn};

    use super::{OutputDevice, Readiness};
    use crate::error::{EngineError, Result};
    use crate::nodes::sink::{build_stream, CpalSink, StreamStats};

    enum Activation {
        Idle,
        Starting(Receiver<core::result::Result<(), String>>),
        Running,
    }

    /// A discovered audio output device.
    ///
    /// Use [`CpalDevice::default_output`] to get the system default, or
    /// [`CpalDevice::list_outputs`] to enumerate all available devices.
    pub struct CpalDevice {
        device: cpal::Device,
        config: cpal::SupportedStreamConfig,

        name: String,
        sample_rate: u32,
        channels: u16,

        activation: Activation,
        producer: Option<Producer<f32>>,
        stats: StreamStats,
    }

    impl CpalDevice {
        fn from_device(device: cpal::Device) -> Result<Self> {
            let config = device
                .default_output_config()
                .map_err(|err| EngineError::DeviceUnavailable(err.to_string()))?;
            let name = device.name().unwrap_or_else(|_| "Unknown".into());

            Ok(Self {
                sample_rate: config.sample_rate().0,
                channels: config.channels(),
                name,
                device,
                config,
                activation: Activation::Idle,
                producer: None,
                stats: StreamStats::default(),
            })
        }

        /// Get the system's default output device.
        pub fn default_output() -> Result<Self> {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or_else(|| EngineError::DeviceUnavailable("no default output device".into()))?;
            Self::from_device(device)
        }

        /// List all available audio output devices.
        ///
        /// Returns an empty list if enumeration fails.
        pub fn list_outputs() -> Vec<Self> {
            let host = cpal::default_host();
            host.output_devices()
                .map(|devices| devices.filter_map(|device| Self::from_device(device).ok()).collect())
                .unwrap_or_default()
        }

        /// Get the device name.
        pub fn name(&self) -> &str {
            &self.name
        }

        /// Playback counters, shared with the sink once it exists
        pub fn stats(&self) -> StreamStats {
            self.stats.clone()
        }
    }

    impl OutputDevice for CpalDevice {
        type Sink = CpalSink;

        fn sample_rate(&self) -> u32 {
            self.sample_rate
        }

        fn channels(&self) -> usize {
            self.channels as usize
        }

        /// Spawns the stream thread; the outcome arrives via [`poll_ready`](Self::poll_ready).
        fn resume(&mut self) -> Result<Readiness> {
            match self.activation {
                Activation::Running => return Ok(Readiness::Ready),
                Activation::Starting(_) => return Ok(Readiness::Pending),
                Activation::Idle => {}
            }

            let channels = self.channels as usize;
            // Ring buffer sized for ~100ms of audio to handle scheduling jitter
            let buffer_samples = ((self.sample_rate as f32 * 0.1) as usize) * channels;
            let buffer_size = buffer_samples.next_power_of_two().max(8192);
            let (producer, consumer) = RingBuffer::<f32>::new(buffer_size);

            let (ready_tx, ready_rx) = mpsc::channel();
            let device = self.device.clone();
            let sample_format = self.config.sample_format();
            let stream_config = self.config.config();
            let stats = self.stats.clone();

            info!(device = %self.name, rate = self.sample_rate, channels, "starting output stream");

            std::thread::spawn(move || {
                let stream = match build_stream(&device, sample_format, &stream_config, consumer, stats) {
                    Ok(stream) => stream,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                if let Err(err) = stream.play() {
                    let _ = ready_tx.send(Err(err.to_string()));
                    return;
                }
                let _ = ready_tx.send(Ok(()));

                // Keep thread alive - stream lives as long as this thread
                loop {
                    std::thread::park();
                }
            });

            self.producer = Some(producer);
            self.activation = Activation::Starting(ready_rx);
            Ok(Readiness::Pending)
        }

        fn poll_ready(&mut self) -> Result<Readiness> {
            let outcome = match &self.activation {
                Activation::Running => return Ok(Readiness::Ready),
                Activation::Idle => return Ok(Readiness::Pending),
                Activation::Starting(rx) => match rx.try_recv() {
                    Ok(outcome) => outcome,
                    Err(TryRecvError::Empty) => return Ok(Readiness::Pending),
                    Err(TryRecvError::Disconnected) => Err("stream thread exited".into()),
                },
            };

            match outcome {
                Ok(()) => {
                    info!(device = %self.name, "output stream running");
                    self.activation = Activation::Running;
                    Ok(Readiness::Ready)
                }
                Err(reason) => {
                    warn!(device = %self.name, %reason, "output stream failed to start");
                    // allow a later retry
                    self.activation = Activation::Idle;
                    self.producer = None;
                    Err(EngineError::DeviceUnavailable(reason))
                }
            }
        }

        fn create_sink(&mut self) -> Result<CpalSink> {
            let producer = self
                .producer
                .take()
                .ok_or_else(|| EngineError::DeviceUnavailable("stream not started".into()))?;
            Ok(CpalSink::new(producer, self.channels as usize, self.stats.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_device_is_ready_at_once() {
        let (mut device, _samples) = OfflineDevice::new(48_000);
        assert_eq!(device.resume(), Ok(Readiness::Ready));
        assert_eq!(device.channels(), 1);
        assert!(device.create_sink().is_ok());
        assert!(device.create_sink().is_err());
    }

    #[test]
    fn gate_controls_readiness() {
        let (mut device, _samples, gate) = OfflineDevice::gated(48_000);
        assert_eq!(device.resume(), Ok(Readiness::Pending));
        assert_eq!(device.poll_ready(), Ok(Readiness::Pending));

        gate.open();
        assert_eq!(device.poll_ready(), Ok(Readiness::Ready));

        gate.fail();
        assert!(matches!(device.poll_ready(), Err(EngineError::DeviceUnavailable(_))));
    }

    #[test]
    fn unavailable_device_refuses() {
        let mut device = OfflineDevice::unavailable(44_100);
        assert!(matches!(device.resume(), Err(EngineError::DeviceUnavailable(_))));
        assert!(device.create_sink().is_err());
    }
}
