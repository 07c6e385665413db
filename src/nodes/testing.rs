//! Test fixtures: a constant source and a capturing sink

use dasp_graph::{Buffer, Input};
use rtrb::{Consumer, RingBuffer};

use crate::graph::{AudioGraph, NodeHandle};
use crate::node::{AudioNode, ProcessContext, BLOCK_SIZE};
use crate::nodes::RtrbSink;

/// Outputs the same value forever
pub(crate) struct Constant(pub f32);

impl AudioNode for Constant {
    type Message = ();

    fn process(
        &mut self,
        _ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        _inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        for buffer in outputs.iter_mut() {
            buffer.iter_mut().for_each(|s| *s = self.0);
        }
    }
}

/// Mono capture sink with room for a few seconds of audio
pub(crate) struct Capture;

impl Capture {
    pub fn new() -> (RtrbSink, Consumer<f32>) {
        let (producer, consumer) = RingBuffer::new(BLOCK_SIZE * 4096);
        (RtrbSink::mono(producer), consumer)
    }

    /// Pop everything captured so far
    pub fn drain(consumer: &mut Consumer<f32>) -> Vec<f32> {
        core::iter::from_fn(|| consumer.pop().ok()).collect()
    }
}

/// `node` fed by one [`Constant`] per input value and captured by a [`Capture`]
pub(crate) struct Rig<M: Send + 'static> {
    graph: AudioGraph,
    node: NodeHandle<M>,
    samples: Consumer<f32>,
}

impl<M: Send + 'static> Rig<M> {
    pub fn new<N: AudioNode<Message = M>>(node: N, inputs: &[f32]) -> Self {
        let mut graph = AudioGraph::new(48_000);
        let (capture, samples) = Capture::new();
        let sink = graph.add_with_queue_size(capture, 1);
        graph.set_terminal(sink.id());

        let node = graph.add_with_queue_size(node, 64);
        graph.connect(node.id(), sink.id());
        for value in inputs {
            let source = graph.add_with_queue_size(Constant(*value), 1);
            graph.connect(source.id(), node.id());
        }

        Self { graph, node, samples }
    }

    pub fn send(&mut self, msg: M) {
        assert!(self.node.send(msg).is_ok(), "test queue full");
    }

    /// Render one block and return what reached the sink
    pub fn block(&mut self) -> Vec<f32> {
        self.graph.process();
        Capture::drain(&mut self.samples)
    }
}
