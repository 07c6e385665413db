//! Core node trait and context types.

use dasp_graph::{Buffer, Input};

/// Number of frames rendered per graph block.
///
/// Fixed by `dasp_graph`'s buffer length.
pub const BLOCK_SIZE: usize = 64;

/// Information available during audio processing.
///
/// Passed to every [`AudioNode::process`] call.
#[derive(Clone, Copy, Debug)]
pub struct ProcessContext {
    /// Sample rate of the graph in Hz (e.g., 44100, 48000)
    pub sample_rate: u32,
    /// Number of frames per block (always [`BLOCK_SIZE`])
    pub buffer_size: usize,
}

/// Unique identifier for a node within a graph.
///
/// Ids are never reused, even after the node is removed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(pub(crate) u32);

/// A block-based audio processing node.
///
/// Nodes are either:
/// - **Sources**: 0 inputs, 1+ outputs (oscillators, noise loops)
/// - **Effects**: 1+ inputs, 1+ outputs (gain, the master low-pass)
/// - **Sinks**: 1+ inputs, 0 outputs (device outputs, capture buffers)
///
/// # Message-Based Parameters
///
/// Nodes never share mutable state with the control side. Parameter changes
/// arrive as messages, drained once at the start of each block:
///
/// ```
/// use rauschen::{AudioNode, ProcessContext};
/// use dasp_graph::{Buffer, Input};
///
/// enum HumMessage {
///     SetLevel(f32),
/// }
///
/// struct Hum {
///     level: f32,
///     phase: f32,
/// }
///
/// impl AudioNode for Hum {
///     type Message = HumMessage;
///
///     fn process(
///         &mut self,
///         ctx: &ProcessContext,
///         messages: impl Iterator<Item = HumMessage>,
///         _inputs: &[Input],
///         outputs: &mut [Buffer],
///     ) {
///         for msg in messages {
///             match msg {
///                 HumMessage::SetLevel(l) => self.level = l,
///             }
///         }
///
///         for sample in outputs[0].iter_mut() {
///             *sample = (self.phase * std::f32::consts::TAU).sin() * self.level;
///             self.phase = (self.phase + 50.0 / ctx.sample_rate as f32) % 1.0;
///         }
///     }
/// }
/// ```
///
/// Nodes without runtime parameters use `()` as their message type.
pub trait AudioNode: Send + 'static {
    /// Message type for parameter updates.
    type Message: Send + 'static;

    /// Process one block of audio.
    ///
    /// Implementations should:
    /// 1. Drain and handle all pending messages
    /// 2. Read from `inputs` (if any)
    /// 3. Write every sample of `outputs`
    fn process(
        &mut self,
        ctx: &ProcessContext,
        messages: impl Iterator<Item = Self::Message>,
        inputs: &[Input],
        outputs: &mut [Buffer],
    );

    /// Number of audio input channels (0 for sources).
    fn num_inputs(&self) -> usize { 0 }

    /// Number of audio output channels.
    fn num_outputs(&self) -> usize { 1 }
}
