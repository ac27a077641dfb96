//! # Ordering Queue
//!
//! Tracks events between submission and delivery so the publisher loop sees
//! them in submission order.
//!
//! ## Baton Passing
//!
//! Every node owns a one-shot completion signal. Linking a node takes the
//! signal of the node before it (`waiting_on`) and installs its own as the
//! one the next submission must wait on. A node is only handed to the
//! publisher loop after its predecessor's signal fired, and the loop fires a
//! node's signal once its send attempt finished. The global order is
//! therefore the order in which `link` acquired the metadata mutex.
//!
//! Nodes live in a deque indexed by sequence number. Processed predecessors
//! are collected whenever a new node becomes current.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use shared_types::Event;
use tokio::sync::oneshot;

use crate::error::ProxyError;

/// Receipt for a linked node.
#[derive(Debug)]
pub struct Ticket {
    pub seq: u64,
    /// Completion signal of the predecessor, `None` for the first node.
    pub waiting_on: Option<oneshot::Receiver<()>>,
}

/// Outcome of [`EventQueue::request_stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopRequest {
    /// Nothing left to deliver; the channel can close now.
    Drained,
    /// This many nodes still await delivery.
    Pending(usize),
    /// Stop was requested before.
    AlreadyRequested,
}

/// Point-in-time view of the queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    /// Nodes linked but not yet processed.
    pub pending: usize,
    /// Id of the event being or last delivered.
    pub current: Option<String>,
    /// Id of the most recently linked event.
    pub last: Option<String>,
    /// Nodes whose send attempt finished.
    pub processed: u64,
}

struct QueueNode {
    seq: u64,
    event: Arc<Event>,
    completion: Option<oneshot::Sender<()>>,
    processed: bool,
}

#[derive(Default)]
struct QueueState {
    nodes: VecDeque<QueueNode>,
    next_seq: u64,
    current: Option<u64>,
    last_completion: Option<oneshot::Receiver<()>>,
    stop_requested: bool,
    processed: u64,
}

impl QueueState {
    fn position(&self, seq: u64) -> Option<usize> {
        let front = self.nodes.front()?.seq;
        let index = usize::try_from(seq.checked_sub(front)?).ok()?;
        (index < self.nodes.len()).then_some(index)
    }

    fn is_drained(&self) -> bool {
        self.nodes.back().map_or(true, |tail| tail.processed)
    }

    fn pending(&self) -> usize {
        self.nodes.iter().filter(|n| !n.processed).count()
    }
}

/// Submission-ordered queue of events awaiting delivery.
#[derive(Default)]
pub struct EventQueue {
    state: Mutex<QueueState>,
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `event` at the tail.
    ///
    /// # Errors
    ///
    /// [`ProxyError::Stopped`] once stop has been requested.
    pub fn link(&self, event: Arc<Event>) -> Result<Ticket, ProxyError> {
        let mut state = self.state.lock();
        if state.stop_requested {
            return Err(ProxyError::Stopped);
        }

        let seq = state.next_seq;
        state.next_seq += 1;

        let (completion, signal) = oneshot::channel();
        let waiting_on = state.last_completion.replace(signal);
        state.nodes.push_back(QueueNode {
            seq,
            event,
            completion: Some(completion),
            processed: false,
        });

        Ok(Ticket { seq, waiting_on })
    }

    /// Mark `seq` as the node being delivered and return its event.
    ///
    /// Processed nodes ahead of it are dropped from the arena.
    pub fn activate(&self, seq: u64) -> Option<Arc<Event>> {
        let mut state = self.state.lock();
        while state
            .nodes
            .front()
            .is_some_and(|n| n.seq < seq && n.processed)
        {
            state.nodes.pop_front();
        }

        let index = state.position(seq)?;
        let event = Arc::clone(&state.nodes[index].event);
        state.current = Some(seq);
        Some(event)
    }

    /// Record that the send attempt for `seq` finished, releasing its
    /// successor.
    ///
    /// Returns `true` when stop was requested and `seq` is the tail, i.e.
    /// the last delivery before shutdown.
    pub fn complete(&self, seq: u64) -> bool {
        let mut state = self.state.lock();
        let Some(index) = state.position(seq) else {
            return false;
        };

        let node = &mut state.nodes[index];
        if node.processed {
            return false;
        }
        node.processed = true;
        if let Some(completion) = node.completion.take() {
            // Successor may already be gone if its task was cancelled
            let _ = completion.send(());
        }
        state.processed += 1;

        state.stop_requested && state.nodes.back().is_some_and(|tail| tail.seq == seq)
    }

    /// Refuse further links and report whether anything is left to deliver.
    pub fn request_stop(&self) -> StopRequest {
        let mut state = self.state.lock();
        if state.stop_requested {
            return StopRequest::AlreadyRequested;
        }
        state.stop_requested = true;

        if state.is_drained() {
            StopRequest::Drained
        } else {
            StopRequest::Pending(state.pending())
        }
    }

    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.state.lock().stop_requested
    }

    #[must_use]
    pub fn snapshot(&self) -> QueueSnapshot {
        let state = self.state.lock();
        let current = state
            .current
            .and_then(|seq| state.position(seq))
            .map(|index| state.nodes[index].event.id().to_string());
        QueueSnapshot {
            pending: state.pending(),
            current,
            last: state.nodes.back().map(|n| n.event.id().to_string()),
            processed: state.processed,
        }
    }
}

impl std::fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventQueue")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}
