//! Block-processing engine: owns the node graph and the output sink

use core::marker::PhantomData;

use crate::graph::AudioGraph;
use crate::node::{AudioNode, NodeId};

/// Default capacity of each node's message queue
const DEFAULT_QUEUE_SIZE: usize = 64;

/// A handle for sending messages to a node in the engine.
///
/// Handles are returned when you add a node to an [`Engine`] and provide two
/// capabilities:
/// 1. **Connections** - Pass handles to [`Engine::connect`] or [`Engine::output`]
/// 2. **Messages** - Send parameter updates via [`Handle::send`]
///
/// Messages are buffered in a lock-free ring buffer and processed at the start
/// of the next audio block. If the buffer is full, [`Handle::send`] returns
/// `Err(msg)` with the message that couldn't be sent.
pub struct Handle<M: Send + 'static> {
    pub(crate) node_id: NodeId,
    pub(crate) sender: rtrb::Producer<M>,
    pub(crate) _marker: PhantomData<M>,
}

impl<M: Send + 'static> Handle<M> {
    /// Send a message to the node.
    ///
    /// - `Ok(())` if the message was queued
    /// - `Err(msg)` if the queue is full (message not queued)
    pub fn send(&mut self, msg: M) -> Result<(), M> {
        self.sender.push(msg).map_err(|rtrb::PushError::Full(m)| m)
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.node_id
    }
}

/// Manages nodes, connections, and audio processing.
///
/// ```
/// use rauschen::Engine;
/// use rauschen::nodes::{Gain, Oscillator, RtrbSink, Waveform};
///
/// let (producer, consumer) = rtrb::RingBuffer::new(1024);
/// let mut engine = Engine::new(48_000).with_output(RtrbSink::mono(producer));
///
/// let sine = engine.add(Oscillator::new(Waveform::Sine, 110.0));
/// let gain = engine.add(Gain::new(0.5));
/// engine.connect(&sine, &gain);
/// engine.output(&gain);
///
/// engine.process();
/// assert_eq!(consumer.slots(), 64);
/// ```
pub struct Engine {
    graph: AudioGraph,
    /// The output sink node (e.g. a `CpalSink`)
    sink_node: Option<NodeId>,
    queue_size: usize,
}

impl Engine {
    /// Create an engine without an output sink at the given sample rate.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            graph: AudioGraph::new(sample_rate),
            sink_node: None,
            queue_size: DEFAULT_QUEUE_SIZE,
        }
    }

    /// Add the output sink (builder pattern).
    pub fn with_output<S: AudioNode<Message = ()>>(mut self, sink: S) -> Self {
        let handle = self.graph.add_with_queue_size(sink, 1);
        self.sink_node = Some(handle.id());
        self.graph.set_terminal(handle.id());
        self
    }

    /// Capacity of message queues for nodes added from now on (builder pattern).
    pub fn with_queue_size(mut self, queue_size: usize) -> Self {
        self.queue_size = queue_size.max(1);
        self
    }

    /// Get the output sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.graph.sample_rate()
    }

    /// Add a node to the graph.
    pub fn add<N: AudioNode>(&mut self, node: N) -> Handle<N::Message> {
        let queue_size = self.queue_size;
        self.add_with_queue_size(node, queue_size)
    }

    /// Add a node with a custom message queue capacity.
    pub fn add_with_queue_size<N: AudioNode>(&mut self, node: N, queue_size: usize) -> Handle<N::Message> {
        let handle = self.graph.add_with_queue_size(node, queue_size);
        Handle {
            node_id: handle.id,
            sender: handle.sender,
            _marker: PhantomData,
        }
    }

    /// Connect two nodes together. Audio flows from `from` to `to`.
    ///
    /// Returns false if either node has already been removed.
    pub fn connect<M1, M2>(&mut self, from: &Handle<M1>, to: &Handle<M2>) -> bool
    where
        M1: Send + 'static,
        M2: Send + 'static,
    {
        self.graph.connect(from.node_id, to.node_id)
    }

    /// Connect a node directly to the output sink.
    ///
    /// Returns false if no sink is configured.
    pub fn output<M: Send + 'static>(&mut self, handle: &Handle<M>) -> bool {
        match self.sink_node {
            Some(sink) => self.graph.connect(handle.node_id, sink),
            None => false,
        }
    }

    /// Remove a node, its connections and its message queue.
    ///
    /// Returns false if the node was not in this engine.
    pub fn remove<M: Send + 'static>(&mut self, handle: Handle<M>) -> bool {
        self.graph.remove(handle.node_id)
    }

    /// Whether the node behind `handle` is still part of the graph
    pub fn contains<M: Send + 'static>(&self, handle: &Handle<M>) -> bool {
        self.graph.contains(handle.node_id)
    }

    /// Number of nodes in the graph, not counting the output sink.
    pub fn node_count(&self) -> usize {
        self.graph.len() - usize::from(self.sink_node.is_some())
    }

    /// Process one block of audio (64 frames) into the output sink.
    pub fn process(&mut self) {
        self.graph.process();
    }
}
