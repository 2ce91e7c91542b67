//! Scheduler - the engine's microtask queue.
//!
//! Work requested while user code runs (state setters, post-render effect
//! flushes) is queued here and executed when the host drains the queue with
//! `Engine::flush`. A [`ScheduleFlag`] collapses repeated requests into one
//! queued run per epoch: the flag is raised when a run is queued and lowered
//! just before that run executes.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Unit of deferred work.
pub type Task = Box<dyn FnOnce()>;

/// FIFO task queue.
#[derive(Default)]
pub struct TaskQueue {
    tasks: RefCell<VecDeque<Task>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, task: impl FnOnce() + 'static) {
        self.tasks.borrow_mut().push_back(Box::new(task));
    }

    /// Next task, released from the queue before it runs.
    pub fn pop(&self) -> Option<Task> {
        self.tasks.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.tasks.borrow_mut().clear();
    }
}

/// At-most-once-per-epoch guard.
#[derive(Debug, Default)]
pub struct ScheduleFlag {
    scheduled: Cell<bool>,
}

impl ScheduleFlag {
    /// Raise the flag. Returns false if it was already raised.
    pub fn try_schedule(&self) -> bool {
        !self.scheduled.replace(true)
    }

    pub fn reset(&self) {
        self.scheduled.set(false);
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled.get()
    }
}

/// Queue `run` on `queue` unless a run guarded by `flag` is already pending.
///
/// Returns true when a new run was queued.
pub fn enqueue_coalesced(
    queue: &TaskQueue,
    flag: Rc<ScheduleFlag>,
    run: impl FnOnce() + 'static,
) -> bool {
    if !flag.try_schedule() {
        return false;
    }
    queue.enqueue(move || {
        flag.reset();
        run();
    });
    true
}

/// Run tasks until the queue is empty or `limit` tasks have run.
///
/// Returns the number of tasks executed and whether the queue settled.
pub fn drain(queue: &TaskQueue, limit: usize) -> (usize, bool) {
    let mut ran = 0;
    while ran < limit {
        let Some(task) = queue.pop() else {
            return (ran, true);
        };
        task();
        ran += 1;
    }
    (ran, queue.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_is_fifo() {
        let queue = TaskQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let log = log.clone();
            queue.enqueue(move || log.borrow_mut().push(i));
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(drain(&queue, 10), (3, true));
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_tasks_may_enqueue_more_work() {
        let queue = Rc::new(TaskQueue::new());
        let hits = Rc::new(Cell::new(0));
        let q = queue.clone();
        let h = hits.clone();
        queue.enqueue(move || {
            h.set(h.get() + 1);
            let h = h.clone();
            q.enqueue(move || h.set(h.get() + 1));
        });
        assert_eq!(drain(&queue, 10), (2, true));
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_drain_respects_limit() {
        let queue = TaskQueue::new();
        for _ in 0..5 {
            queue.enqueue(|| {});
        }
        assert_eq!(drain(&queue, 3), (3, false));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_schedule_flag() {
        let flag = ScheduleFlag::default();
        assert!(flag.try_schedule());
        assert!(!flag.try_schedule());
        assert!(flag.is_scheduled());
        flag.reset();
        assert!(flag.try_schedule());
    }

    #[test]
    fn test_enqueue_coalesced_runs_once_per_epoch() {
        let queue = TaskQueue::new();
        let flag = Rc::new(ScheduleFlag::default());
        let runs = Rc::new(Cell::new(0));

        for _ in 0..3 {
            let runs = runs.clone();
            enqueue_coalesced(&queue, flag.clone(), move || runs.set(runs.get() + 1));
        }
        assert_eq!(queue.len(), 1);
        drain(&queue, 10);
        assert_eq!(runs.get(), 1);

        // Next epoch schedules again.
        let r = runs.clone();
        assert!(enqueue_coalesced(&queue, flag.clone(), move || r.set(r.get() + 1)));
        drain(&queue, 10);
        assert_eq!(runs.get(), 2);
    }
}
