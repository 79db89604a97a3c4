use alloc::vec::Vec;
use core::time::Duration;

/// Identifies one scheduled task, handles are never reused so a stale one cannot cancel a newer task.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

#[derive(Clone, Debug, PartialEq)]
struct ScheduledTask<T> {
    handle: TaskHandle,
    task: T,
    remaining: Duration,
    period: Option<Duration>,
}

/// Deferred continuations driven by explicitly advancing time.
///
/// The owner decides when time passes; nothing fires on its own, which keeps every state change
/// on the owner's single call stack.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskQueue<T> {
    next_handle: u64,
    tasks: Vec<ScheduledTask<T>>,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self {
            next_handle: 0,
            tasks: Vec::new(),
        }
    }
}

impl<T: Copy> TaskQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_once(&mut self, delay: Duration, task: T) -> TaskHandle {
        self.push(delay, None, task)
    }

    /// Fires every `period` until cancelled, the period is at least one millisecond.
    pub fn schedule_repeating(&mut self, period: Duration, task: T) -> TaskHandle {
        let period = period.max(Duration::from_millis(1));
        self.push(period, Some(period), task)
    }

    fn push(&mut self, delay: Duration, period: Option<Duration>, task: T) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        self.tasks.push(ScheduledTask {
            handle,
            task,
            remaining: delay,
            period,
        });
        handle
    }

    /// Returns whether the task was still pending.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|scheduled| scheduled.handle != handle);
        self.tasks.len() != before
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn is_scheduled(&self, handle: TaskHandle) -> bool {
        self.tasks.iter().any(|scheduled| scheduled.handle == handle)
    }

    pub fn remaining(&self, handle: TaskHandle) -> Option<Duration> {
        self.tasks
            .iter()
            .find(|scheduled| scheduled.handle == handle)
            .map(|scheduled| scheduled.remaining)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Pops the next task due within `budget`, consuming the time that passed until it fired.
    ///
    /// Once nothing else is due the rest of the budget elapses and `None` is returned. Ties fire in
    /// scheduling order. Calling this in a loop lets the owner react to each task, including
    /// cancelling later ones, before the clock moves on.
    pub fn pop_due(&mut self, budget: &mut Duration) -> Option<(TaskHandle, T)> {
        let next = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, scheduled)| scheduled.remaining <= *budget)
            .min_by_key(|(_, scheduled)| (scheduled.remaining, scheduled.handle))
            .map(|(index, _)| index);

        let Some(index) = next else {
            self.elapse(*budget);
            *budget = Duration::ZERO;
            return None;
        };

        let wait = self.tasks[index].remaining;
        self.elapse(wait);
        *budget -= wait;

        let ScheduledTask {
            handle,
            task,
            period,
            ..
        } = self.tasks[index];
        match period {
            Some(period) => self.tasks[index].remaining = period,
            None => {
                self.tasks.remove(index);
            }
        }
        Some((handle, task))
    }

    /// Lets `elapsed` pass and returns every task that fired, in firing order.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<(TaskHandle, T)> {
        let mut budget = elapsed;
        let mut fired = Vec::new();
        while let Some(task) = self.pop_due(&mut budget) {
            fired.push(task);
        }
        fired
    }

    fn elapse(&mut self, elapsed: Duration) {
        for scheduled in &mut self.tasks {
            scheduled.remaining = scheduled.remaining.saturating_sub(elapsed);
        }
    }
}
