//! The tick queue.
//!
//! Reactive work is deferred to the next tick instead of running inside the
//! mutation that triggered it. A tick is one call to [`Scheduler::flush`]:
//! it runs exactly the jobs queued before it started, in queue order. Jobs
//! queued while flushing wait for the next tick.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

type Job = Box<dyn FnOnce()>;

/// Shared handle to a tick queue.
#[derive(Clone, Default)]
pub struct Scheduler(Rc<SchedulerInner>);

#[derive(Default)]
struct SchedulerInner {
    queue: RefCell<VecDeque<Job>>,
    ticks: Cell<u64>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `job` for the next tick.
    pub fn next_tick(&self, job: impl FnOnce() + 'static) {
        self.0.queue.borrow_mut().push_back(Box::new(job));
    }

    /// Jobs waiting for a tick.
    pub fn pending(&self) -> usize {
        self.0.queue.borrow().len()
    }

    /// Number of ticks flushed so far.
    pub fn ticks(&self) -> u64 {
        self.0.ticks.get()
    }

    /// Run one tick and return how many jobs ran.
    ///
    /// A panicking job is logged and does not stop the remaining jobs.
    pub fn flush(&self) -> usize {
        let batch = self.pending();
        if batch == 0 {
            return 0;
        }
        self.0.ticks.set(self.0.ticks.get() + 1);

        for _ in 0..batch {
            let Some(job) = self.0.queue.borrow_mut().pop_front() else {
                break;
            };
            if catch_unwind(AssertUnwindSafe(job)).is_err() {
                tracing::error!("scheduled job panicked; continuing with the next job");
            }
        }
        tracing::trace!(tick = self.ticks(), jobs = batch, "tick flushed");
        batch
    }

    /// Flush ticks until the queue is empty or `max_ticks` ran.
    /// Returns the number of ticks flushed.
    pub fn run_until_idle(&self, max_ticks: usize) -> usize {
        let mut ran = 0;
        while ran < max_ticks && self.flush() > 0 {
            ran += 1;
        }
        if self.pending() > 0 {
            tracing::warn!(
                max_ticks,
                pending = self.pending(),
                "tick queue still busy after the tick limit"
            );
        }
        ran
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .field("ticks", &self.ticks())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jobs_queued_during_flush_wait() {
        let scheduler = Scheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let (inner, l) = (scheduler.clone(), log.clone());
        scheduler.next_tick(move || {
            l.borrow_mut().push("first");
            let l = l.clone();
            inner.next_tick(move || l.borrow_mut().push("nested"));
        });
        let l = log.clone();
        scheduler.next_tick(move || l.borrow_mut().push("second"));

        assert_eq!(scheduler.flush(), 2);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
        assert_eq!(scheduler.pending(), 1);

        assert_eq!(scheduler.flush(), 1);
        assert_eq!(*log.borrow(), vec!["first", "second", "nested"]);
        assert_eq!(scheduler.ticks(), 2);
    }

    #[test]
    fn test_panicking_job_is_contained() {
        let scheduler = Scheduler::new();
        let ran = Rc::new(Cell::new(false));

        scheduler.next_tick(|| panic!("boom"));
        let flag = ran.clone();
        scheduler.next_tick(move || flag.set(true));

        assert_eq!(scheduler.flush(), 2);
        assert!(ran.get());
    }

    #[test]
    fn test_run_until_idle_respects_limit() {
        fn requeue(scheduler: Scheduler) {
            let next = scheduler.clone();
            scheduler.next_tick(move || requeue(next));
        }
        let scheduler = Scheduler::new();
        requeue(scheduler.clone());

        assert_eq!(scheduler.run_until_idle(5), 5);
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_empty_flush_is_not_a_tick() {
        let scheduler = Scheduler::new();
        assert_eq!(scheduler.flush(), 0);
        assert_eq!(scheduler.ticks(), 0);
    }
}
