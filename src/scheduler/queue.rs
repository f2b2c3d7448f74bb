use std::collections::VecDeque;
use std::time::Instant;

use tokio::sync::oneshot;

use crate::config::types::{Priority, Protocol};
use crate::errors::ModbusError;
use crate::handlers::{Request, ResponseEnvelope};

/// A submitted request awaiting dispatch. Mutated only by the scheduler:
/// created on submission, removed on terminal resolution.
pub struct QueuedRequest {
    pub id: u64,
    pub unit_id: u8,
    pub request: Request,
    pub protocol: Protocol,
    pub priority: Priority,
    pub submitted_at: Instant,
    /// Attempts made so far, incremented by the dispatcher on each retry.
    pub attempts: u32,
    pub max_attempts: u32,
    pub waiter: oneshot::Sender<Result<ResponseEnvelope, ModbusError>>,
}

/// Insertion-ordered priority queue: strict priority, FIFO among equals.
/// Deliberately not a `BinaryHeap` — a heap does not preserve insertion
/// order between equal-priority elements without extra bookkeeping, and the
/// queue here never grows past `queue_size_limit`, so the O(n) insert cost
/// is not a concern.
#[derive(Default)]
pub struct PriorityQueue {
    items: VecDeque<QueuedRequest>,
}

impl PriorityQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Inserts at the first position whose priority is strictly lower than
    /// `request`'s, preserving FIFO order among requests of equal priority.
    pub fn insert(&mut self, request: QueuedRequest) {
        let position = self
            .items
            .partition_point(|existing| existing.priority >= request.priority);
        self.items.insert(position, request);
    }

    pub fn pop_front(&mut self) -> Option<QueuedRequest> {
        self.items.pop_front()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = QueuedRequest> + '_ {
        self.items.drain(..)
    }
}
