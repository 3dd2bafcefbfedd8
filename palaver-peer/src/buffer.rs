use palaver_core::CandidateInit;
use std::collections::VecDeque;

/// Plain FIFO used for everything the engine must hold back until it can
/// legally act: early connectivity candidates and chat payloads queued
/// while the data channel is closed. Carries no failure modes of its own;
/// whatever consumes the drained items owns their errors.
#[derive(Debug, Default)]
pub struct Fifo<T> {
    items: VecDeque<T>,
}

impl<T> Fifo<T> {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    pub fn enqueue(&mut self, item: T) {
        self.items.push_back(item);
    }

    /// Remove every item in arrival order. The buffer is empty afterwards.
    pub fn drain(&mut self) -> Vec<T> {
        self.items.drain(..).collect()
    }

    /// Forward every item, in arrival order, to `consumer`, then empty.
    pub fn drain_into(&mut self, mut consumer: impl FnMut(T)) {
        for item in self.items.drain(..) {
            consumer(item);
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Candidates that arrived before the remote description was set.
pub type CandidateBuffer = Fifo<CandidateInit>;

/// Chat payloads queued before the data channel opened.
pub type OutboundQueue = Fifo<String>;
