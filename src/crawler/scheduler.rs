//! Scheduler for managing the crawl frontier and concurrency
//!
//! This module handles:
//! - Priority queue management for pending fetch requests
//! - Global concurrency limiting via semaphores
//!
//! Deeper requests are served first, so a branch that has reached its parts
//! pages finishes before new makes are opened. Requests at the same depth are
//! served in the order they were added.

use crate::pipeline::FetchRequest;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A request waiting in the frontier
#[derive(Debug, Clone)]
struct QueuedRequest {
    request: FetchRequest,

    /// Insertion order, for FIFO among equal depths
    seq: u64,
}

// BinaryHeap pops the greatest element: greater depth first, then lower seq
impl Ord for QueuedRequest {
    fn cmp(&self, other: &Self) -> Ordering {
        self.request
            .depth()
            .cmp(&other.request.depth())
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedRequest {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedRequest {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedRequest {}

/// A scheduled fetch with a semaphore permit
///
/// The permit is released when this value (or the task owning it) is dropped.
pub struct ScheduledFetch {
    /// The request to fetch
    pub request: FetchRequest,

    /// The semaphore permit for this fetch
    pub _permit: OwnedSemaphorePermit,
}

/// Scheduler manages the frontier queue and the in-flight limit
pub struct Scheduler {
    /// Global semaphore for limiting concurrent fetches
    global_semaphore: Arc<Semaphore>,

    /// Frontier priority queue of requests to fetch
    frontier: BinaryHeap<QueuedRequest>,

    /// Next insertion sequence number
    next_seq: u64,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `concurrent_requests` - Maximum number of fetches in flight
    pub fn new(concurrent_requests: usize) -> Self {
        Self {
            global_semaphore: Arc::new(Semaphore::new(concurrent_requests.max(1))),
            frontier: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Adds a request to the frontier
    pub fn add_request(&mut self, request: FetchRequest) {
        tracing::trace!(
            "Queueing {:?} request for {} (depth {})",
            request.stage(),
            request.url(),
            request.depth()
        );
        let seq = self.next_seq;
        self.next_seq += 1;
        self.frontier.push(QueuedRequest { request, seq });
    }

    /// Takes the next request if one is queued and a permit is free
    ///
    /// # Returns
    ///
    /// * `Some(ScheduledFetch)` - A request that may be fetched now
    /// * `None` - The frontier is empty or every permit is in use
    pub fn try_next(&mut self) -> Option<ScheduledFetch> {
        if self.frontier.is_empty() {
            return None;
        }

        let permit = Arc::clone(&self.global_semaphore)
            .try_acquire_owned()
            .ok()?;
        let queued = self.frontier.pop()?;

        Some(ScheduledFetch {
            request: queued.request,
            _permit: permit,
        })
    }

    /// Gets the number of requests waiting in the frontier
    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frontier.is_empty()
    }

    /// Gets the number of fetches that could start right now
    pub fn available_permits(&self) -> usize {
        self.global_semaphore.available_permits()
    }
}
