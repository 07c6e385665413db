//! CPAL audio output sink

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use cpal::traits::DeviceTrait;
use cpal::SampleFormat;
use dasp_graph::{Buffer, Input};
use rtrb::{Consumer, Producer};

use crate::node::{AudioNode, ProcessContext};

/// Counters shared between a [`CpalSink`] and the stream callback feeding
/// the sound card.
#[derive(Clone, Debug, Default)]
pub struct StreamStats {
    samples_consumed: Arc<AtomicUsize>,
    had_underrun: Arc<AtomicBool>,
}

impl StreamStats {
    /// Returns how many samples have been played
    #[inline]
    pub fn samples_consumed(&self) -> usize {
        self.samples_consumed.load(Ordering::Relaxed)
    }

    /// Check and clear the underrun flag
    pub fn check_underrun(&self) -> bool {
        self.had_underrun.swap(false, Ordering::Relaxed)
    }

    fn record(&self, consumed: usize, underrun: bool) {
        if underrun {
            self.had_underrun.store(true, Ordering::Relaxed);
        }
        self.samples_consumed.fetch_add(consumed, Ordering::Relaxed);
    }
}

/// A sink that outputs audio to a CPAL device
///
/// The CPAL stream runs on its own thread (see
/// [`CpalDevice`](crate::CpalDevice)); this node feeds samples into a ring
/// buffer that the stream consumes. Connected inputs are summed and mono
/// input is duplicated to every device channel.
pub struct CpalSink {
    buffer: Producer<f32>,
    channels: usize,
    stats: StreamStats,
}

impl CpalSink {
    pub(crate) fn new(buffer: Producer<f32>, channels: usize, stats: StreamStats) -> Self {
        Self {
            buffer,
            channels: channels.max(1),
            stats,
        }
    }

    /// Returns how many samples have been played
    #[inline]
    pub fn samples_consumed(&self) -> usize {
        self.stats.samples_consumed()
    }

    /// Check and clear the underrun flag
    pub fn check_underrun(&self) -> bool {
        self.stats.check_underrun()
    }
}

/// Build an output stream that drains `consumer`, converting to the device's
/// sample format.
pub(crate) fn build_stream(
    device: &cpal::Device,
    sample_format: SampleFormat,
    stream_config: &cpal::StreamConfig,
    mut consumer: Consumer<f32>,
    stats: StreamStats,
) -> Result<cpal::Stream, String> {
    let on_error = |err: cpal::StreamError| tracing::error!("cpal stream error: {err}");

    let stream = match sample_format {
        SampleFormat::F32 => device.build_output_stream(
            stream_config,
            move |data: &mut [f32], _| {
                let mut underrun = false;
                for sample in data.iter_mut() {
                    *sample = consumer.pop().unwrap_or_else(|_| {
                        underrun = true;
                        0.0
                    });
                }
                stats.record(data.len(), underrun);
            },
            on_error,
            None,
        ),
        SampleFormat::I16 => device.build_output_stream(
            stream_config,
            move |data: &mut [i16], _| {
                let mut underrun = false;
                for sample in data.iter_mut() {
                    let s = consumer.pop().unwrap_or_else(|_| {
                        underrun = true;
                        0.0
                    });
                    *sample = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                }
                stats.record(data.len(), underrun);
            },
            on_error,
            None,
        ),
        SampleFormat::U16 => device.build_output_stream(
            stream_config,
            move |data: &mut [u16], _| {
                let mut underrun = false;
                for sample in data.iter_mut() {
                    let s = consumer.pop().unwrap_or_else(|_| {
                        underrun = true;
                        0.0
                    });
                    *sample = ((s.clamp(-1.0, 1.0) + 1.0) * 0.5 * u16::MAX as f32) as u16;
                }
                stats.record(data.len(), underrun);
            },
            on_error,
            None,
        ),
        other => return Err(format!("unsupported sample format {other:?}")),
    };

    stream.map_err(|err| err.to_string())
}

impl AudioNode for CpalSink {
    type Message = ();

    fn process(
        &mut self,
        ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        inputs: &[Input],
        _outputs: &mut [Buffer],
    ) {
        let samples_needed = ctx.buffer_size * self.channels;

        // Generating faster than the device consumes: skip this block rather
        // than partially write
        if self.buffer.slots() < samples_needed {
            return;
        }

        for i in 0..ctx.buffer_size {
            for ch in 0..self.channels {
                let _ = self.buffer.push(super::mix_sample(inputs, ch, i));
            }
        }
    }

    #[inline]
    fn num_inputs(&self) -> usize {
        // Accept any number of inputs
        usize::MAX
    }

    #[inline]
    fn num_outputs(&self) -> usize { 0 }
}
