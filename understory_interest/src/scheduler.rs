// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-threaded delayed tasks with one pending task per kind per invoker.
//!
//! Time is supplied by the caller as `u64` milliseconds. Tasks live in a
//! deadline-ordered queue owned by the controller; each invoker record holds
//! one [`TaskSlot`] per [`TaskKind`]. Scheduling into an occupied slot cancels
//! the previous task first, so a slot never has two tasks racing.

use alloc::collections::BTreeMap;

use crate::types::InterestState;

/// The three kinds of delayed task an invoker can have pending.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Gain interest once the show delay elapses.
    Gained,
    /// Lose interest once the hide delay elapses.
    Lost,
    /// Gain full interest once a touch press has been held long enough.
    LongPress,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct TaskId(u64);

/// Queue key: deadline first, then scheduling order.
type QueueKey = (u64, TaskId);

/// Holds at most one pending task.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct TaskSlot {
    pending: Option<QueueKey>,
}

impl TaskSlot {
    pub(crate) fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Forget the pending task if it is `id` (it has just fired).
    pub(crate) fn clear_fired(&mut self, id: TaskId) {
        if self.pending.is_some_and(|(_, pending)| pending == id) {
            self.pending = None;
        }
    }
}

/// A task that has come due.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct DueTask<K> {
    pub(crate) id: TaskId,
    pub(crate) invoker: K,
    pub(crate) kind: TaskKind,
    /// Requested state for [`TaskKind::Gained`] tasks.
    pub(crate) state: InterestState,
}

#[derive(Copy, Clone, Debug)]
struct Task<K> {
    invoker: K,
    kind: TaskKind,
    state: InterestState,
}

#[derive(Clone, Debug)]
pub(crate) struct Scheduler<K> {
    queue: BTreeMap<QueueKey, Task<K>>,
    next_id: u64,
}

impl<K: Copy> Default for Scheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy> Scheduler<K> {
    pub(crate) fn new() -> Self {
        Self {
            queue: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Cancel whatever `slot` holds, then schedule a new task into it.
    pub(crate) fn schedule(
        &mut self,
        slot: &mut TaskSlot,
        deadline: u64,
        invoker: K,
        kind: TaskKind,
        state: InterestState,
    ) {
        self.cancel(slot);
        let id = TaskId(self.next_id);
        self.next_id += 1;
        let key = (deadline, id);
        self.queue.insert(
            key,
            Task {
                invoker,
                kind,
                state,
            },
        );
        slot.pending = Some(key);
    }

    /// Cancel the task held by `slot`. Returns `true` if one was pending.
    pub(crate) fn cancel(&mut self, slot: &mut TaskSlot) -> bool {
        match slot.pending.take() {
            Some(key) => self.queue.remove(&key).is_some(),
            None => false,
        }
    }

    /// Earliest pending deadline.
    pub(crate) fn next_deadline(&self) -> Option<u64> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Remove and return the earliest task due at `now`.
    pub(crate) fn pop_due(&mut self, now: u64) -> Option<DueTask<K>> {
        let entry = self.queue.first_entry()?;
        let (deadline, id) = *entry.key();
        if deadline > now {
            return None;
        }
        let task = entry.remove();
        Some(DueTask {
            id,
            invoker: task.invoker,
            kind: task.kind,
            state: task.state,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn clear(&mut self) {
        self.queue.clear();
    }
}
