//! Dependency trackers.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use compact_str::CompactString;

use crate::array::ArrayInner;
use crate::object::ObjectInner;

static NEXT_TRACKER_ID: AtomicU64 = AtomicU64::new(1);

/// A dependency tracker.
///
/// Reads performed with `Some(&tracker)` subscribe the tracker to what was
/// read; mutations of those sources invoke its callback. The callback should
/// only schedule work (typically through [`crate::Scheduler::next_tick`]),
/// never mutate the source synchronously.
///
/// Cloning yields another handle to the same tracker.
#[derive(Clone)]
pub struct Tracker(pub(crate) Rc<TrackerInner>);

pub(crate) struct TrackerInner {
    id: u64,
    callback: Box<dyn Fn()>,
    sources: RefCell<Vec<Source>>,
    notifications: Cell<u64>,
}

/// Something a tracker is subscribed to.
pub(crate) enum Source {
    /// One property of an object
    Key(Weak<ObjectInner>, CompactString),
    /// Any change to an object's set of keys or values
    Object(Weak<ObjectInner>),
    /// Any change to an array
    Array(Weak<ArrayInner>),
}

impl Tracker {
    /// Create a tracker invoking `callback` on every notification.
    pub fn new(callback: impl Fn() + 'static) -> Self {
        Self(Rc::new(TrackerInner {
            id: NEXT_TRACKER_ID.fetch_add(1, Ordering::Relaxed),
            callback: Box::new(callback),
            sources: RefCell::new(Vec::new()),
            notifications: Cell::new(0),
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Number of live subscriptions.
    pub fn source_count(&self) -> usize {
        self.0.sources.borrow().len()
    }

    /// How many times this tracker has been notified.
    pub fn notification_count(&self) -> u64 {
        self.0.notifications.get()
    }

    /// Subscribe to every mutation of `array`.
    pub fn watch_array(&self, array: &crate::Array) {
        array.subscribe(self);
    }

    /// Subscribe to every mutation of `object`.
    pub fn watch_object(&self, object: &crate::Object) {
        object.subscribe_all(self);
    }

    /// Unsubscribe from everything this tracker was subscribed to.
    pub fn stop(&self) {
        let sources = std::mem::take(&mut *self.0.sources.borrow_mut());
        for source in sources {
            match source {
                Source::Key(object, key) => {
                    if let Some(object) = object.upgrade() {
                        object.unsubscribe_key(&key, self);
                    }
                }
                Source::Object(object) => {
                    if let Some(object) = object.upgrade() {
                        object.unsubscribe_all(self);
                    }
                }
                Source::Array(array) => {
                    if let Some(array) = array.upgrade() {
                        array.unsubscribe(self);
                    }
                }
            }
        }
    }

    pub(crate) fn record(&self, source: Source) {
        self.0.sources.borrow_mut().push(source);
    }

    pub(crate) fn downgrade(&self) -> Weak<TrackerInner> {
        Rc::downgrade(&self.0)
    }

    fn notify(&self) {
        self.0.notifications.set(self.0.notifications.get() + 1);
        (self.0.callback)();
    }
}

impl PartialEq for Tracker {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Tracker {}

impl fmt::Debug for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracker")
            .field("id", &self.0.id)
            .field("sources", &self.source_count())
            .finish()
    }
}

/// Weak subscriber list owned by an observable.
#[derive(Default)]
pub(crate) struct Subscribers(Vec<Weak<TrackerInner>>);

impl Subscribers {
    /// Add `tracker`; returns false when it was already subscribed.
    pub(crate) fn add(&mut self, tracker: &Tracker) -> bool {
        let weak = tracker.downgrade();
        if self.0.iter().any(|existing| existing.ptr_eq(&weak)) {
            return false;
        }
        self.0.push(weak);
        true
    }

    pub(crate) fn remove(&mut self, tracker: &Tracker) {
        let weak = tracker.downgrade();
        self.0.retain(|existing| !existing.ptr_eq(&weak) && existing.strong_count() > 0);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    /// Live trackers, pruning dropped ones.
    pub(crate) fn live(&mut self) -> Vec<Tracker> {
        self.0.retain(|weak| weak.strong_count() > 0);
        self.0.iter().filter_map(|weak| weak.upgrade().map(Tracker)).collect()
    }
}

/// Invoke every tracker. Callers must release their borrows first.
pub(crate) fn notify_all(trackers: Vec<Tracker>) {
    for tracker in trackers {
        tracker.notify();
    }
}
