//! Coalescing expression updater shared by every directive handler.
//!
//! Feeding data stops all previous subscriptions and queues one evaluation on
//! the scheduler. Any number of further triggers before that tick runs fold
//! into the same evaluation. The evaluation reads through the updater's own
//! [`Tracker`], so later writes to anything it read queue it again.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use sinopia_tempera::{Object, Scheduler, Tracker, Value};

use crate::expression::Expression;

type Apply = Box<dyn Fn(&Value, &Tracker)>;

struct UpdaterState {
    scheduler: Scheduler,
    expression: Rc<Expression>,
    apply: Apply,
    tracker: Tracker,
    data: RefCell<Option<Object>>,
    queued: Cell<bool>,
    destroyed: Cell<bool>,
    evaluations: Cell<u64>,
}

/// Handle to one scheduled expression binding.
#[derive(Clone)]
pub struct Updater(Rc<UpdaterState>);

impl Updater {
    /// `apply` receives each successful result together with the tracker the
    /// evaluation ran under, for appliers that read further observable data.
    pub fn new(
        scheduler: Scheduler,
        expression: Rc<Expression>,
        apply: impl Fn(&Value, &Tracker) + 'static,
    ) -> Self {
        let state = Rc::new_cyclic(|weak: &Weak<UpdaterState>| {
            let weak = weak.clone();
            UpdaterState {
                scheduler,
                expression,
                apply: Box::new(apply),
                tracker: Tracker::new(move || {
                    if let Some(state) = weak.upgrade() {
                        Updater(state).update(None);
                    }
                }),
                data: RefCell::new(None),
                queued: Cell::new(false),
                destroyed: Cell::new(false),
                evaluations: Cell::new(0),
            }
        });
        Self(state)
    }

    /// Request an evaluation, optionally against fresh data.
    pub fn update(&self, data: Option<&Object>) {
        let state = &self.0;
        if state.destroyed.get() {
            return;
        }
        if let Some(data) = data {
            state.tracker.stop();
            *state.data.borrow_mut() = Some(data.clone());
        }
        if state.queued.replace(true) {
            return;
        }

        let weak = Rc::downgrade(state);
        state.scheduler.next_tick(move || {
            if let Some(state) = weak.upgrade() {
                state.run();
            }
        });
    }

    /// Stop tracking and drop the data. A queued evaluation becomes a no-op.
    pub fn destroy(&self) {
        let state = &self.0;
        if state.destroyed.replace(true) {
            return;
        }
        state.tracker.stop();
        state.data.borrow_mut().take();
    }

    pub fn is_destroyed(&self) -> bool {
        self.0.destroyed.get()
    }

    pub fn is_queued(&self) -> bool {
        self.0.queued.get()
    }

    /// Evaluations run so far.
    pub fn evaluation_count(&self) -> u64 {
        self.0.evaluations.get()
    }

    pub fn expression(&self) -> &Expression {
        &self.0.expression
    }

    pub fn tracker(&self) -> &Tracker {
        &self.0.tracker
    }
}

impl UpdaterState {
    fn run(&self) {
        self.queued.set(false);
        if self.destroyed.get() {
            return;
        }
        let Some(data) = self.data.borrow().clone() else {
            return;
        };

        self.evaluations.set(self.evaluations.get() + 1);
        match self.expression.evaluate(&data, Some(&self.tracker)) {
            Ok(value) => (self.apply)(&value, &self.tracker),
            Err(error) => tracing::error!(
                expression = self.expression.source(),
                %error,
                "expression evaluation failed; keeping last value"
            ),
        }
    }
}

impl fmt::Debug for Updater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Updater")
            .field("expression", &self.0.expression.source())
            .field("queued", &self.0.queued.get())
            .field("destroyed", &self.0.destroyed.get())
            .finish()
    }
}
