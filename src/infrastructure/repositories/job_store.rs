use crate::domain::jobs::{Job, JobStatus};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

struct StoredJob {
    /// Insertion order, breaks ties between equal creation instants
    seq: u64,
    job: Job,
}

#[derive(Default)]
struct StoreState {
    jobs: HashMap<Uuid, StoredJob>,
    next_seq: u64,
}

/// Job counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    pub queued: usize,
    pub running: usize,
    pub done: usize,
    pub failed: usize,
}

/// In-memory job table holding at most `capacity` jobs.
///
/// `evict_excess` drops the oldest jobs by creation time, whatever their
/// status. Every operation runs under one lock.
pub struct JobStore {
    capacity: usize,
    state: Mutex<StoreState>,
}

impl JobStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(StoreState::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert a job without evicting; the store may exceed capacity until
    /// the next `evict_excess`
    pub fn insert(&self, job: Job) {
        let mut state = self.state.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.jobs.insert(job.id, StoredJob { seq, job });
    }

    /// Evict the oldest jobs until the store is back within capacity and
    /// return their ids
    pub fn evict_excess(&self) -> Vec<Uuid> {
        let mut state = self.state.lock();
        let excess = state.jobs.len().saturating_sub(self.capacity);
        if excess == 0 {
            return Vec::new();
        }

        let mut by_age: Vec<_> = state
            .jobs
            .iter()
            .map(|(id, stored)| (stored.job.created_at, stored.seq, *id))
            .collect();
        by_age.sort_unstable();

        let evicted: Vec<Uuid> = by_age.into_iter().take(excess).map(|(_, _, id)| id).collect();
        for id in &evicted {
            state.jobs.remove(id);
        }
        evicted
    }

    /// Snapshot of a job
    pub fn get(&self, id: Uuid) -> Option<Job> {
        self.state.lock().jobs.get(&id).map(|stored| stored.job.clone())
    }

    /// Apply `f` to a stored job; `None` when the id is unknown or evicted
    pub fn update<R>(&self, id: Uuid, f: impl FnOnce(&mut Job) -> R) -> Option<R> {
        self.state
            .lock()
            .jobs
            .get_mut(&id)
            .map(|stored| f(&mut stored.job))
    }

    pub fn remove(&self, id: Uuid) -> Option<Job> {
        self.state.lock().jobs.remove(&id).map(|stored| stored.job)
    }

    pub fn len(&self) -> usize {
        self.state.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> JobCounts {
        let state = self.state.lock();
        let mut counts = JobCounts::default();
        for stored in state.jobs.values() {
            match stored.job.status {
                JobStatus::Queued => counts.queued += 1,
                JobStatus::Running => counts.running += 1,
                JobStatus::Done => counts.done += 1,
                JobStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }
}
