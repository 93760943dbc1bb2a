//! Deferred task queue.
//!
//! A bounded list of `(due time, task)` pairs kept in insertion order. It is
//! not a priority structure: every tick the whole queue is scanned, and tasks
//! that are due run in the order they were scheduled.

use embassy_time::Instant;
use heapless::Vec;

use super::traits::Task;
use crate::error::{Error, ErrorPlaceHolder};

struct ScheduledTask {
    due: Instant,
    task: Task,
}

/// A fixed-capacity queue of one-shot deferred tasks.
pub struct TaskQueue<const MAX_TASKS: usize> {
    tasks: Vec<ScheduledTask, MAX_TASKS>,
}

impl<const MAX_TASKS: usize> Default for TaskQueue<MAX_TASKS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const MAX_TASKS: usize> TaskQueue<MAX_TASKS> {
    pub const fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Append `task` to run no earlier than `due`.
    pub fn schedule(&mut self, due: Instant, task: Task) -> Result<(), Error<ErrorPlaceHolder>> {
        self.tasks
            .push(ScheduledTask { due, task })
            .map_err(|_| Error::QueueFull)
    }

    /// Start a scan over the tasks queued right now.
    ///
    /// Tasks appended after this call, including those scheduled by a task run
    /// during the scan, are not visited by it.
    pub(crate) fn scan(&self) -> DueScan {
        DueScan {
            index: 0,
            remaining: self.tasks.len(),
        }
    }

    /// The earliest due time in the queue.
    pub fn next_due(&self) -> Option<Instant> {
        self.tasks.iter().map(|t| t.due).min()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.tasks.len() == MAX_TASKS
    }
}

/// Cursor over a snapshot of the queue, yielding due tasks one at a time.
///
/// The queue is not borrowed between calls, so the caller may run each task
/// with mutable access to whatever owns the queue. Running tasks may only
/// append; the queue offers no way to cancel a scheduled task.
#[derive(Debug)]
pub(crate) struct DueScan {
    index: usize,
    remaining: usize,
}

impl DueScan {
    /// Remove and return the next task whose due time is at or before `now`.
    pub fn next_due<const MAX_TASKS: usize>(
        &mut self,
        queue: &mut TaskQueue<MAX_TASKS>,
        now: Instant,
    ) -> Option<Task> {
        while self.remaining > 0 {
            self.remaining -= 1;
            let due = queue.tasks.get(self.index)?.due;
            if due <= now {
                // Removing shifts the rest down, so the index stays put.
                return Some(queue.tasks.remove(self.index).task);
            }
            self.index += 1;
        }
        None
    }
}
