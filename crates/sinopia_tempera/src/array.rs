//! Observable arrays.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::tracker::{notify_all, Source, Subscribers, Tracker};
use crate::value::Value;

/// A shared, observable list.
///
/// Any tracked read subscribes to the whole array and every mutation notifies
/// all subscribers once.
#[derive(Clone, Default)]
pub struct Array(Rc<ArrayInner>);

#[derive(Default)]
pub(crate) struct ArrayInner {
    items: RefCell<Vec<Value>>,
    subscribers: RefCell<Subscribers>,
}

impl ArrayInner {
    pub(crate) fn unsubscribe(&self, tracker: &Tracker) {
        self.subscribers.borrow_mut().remove(tracker);
    }
}

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(items: Vec<Value>) -> Self {
        Self(Rc::new(ArrayInner {
            items: RefCell::new(items),
            subscribers: RefCell::default(),
        }))
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address-based identity, stable while the array is alive.
    #[inline]
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub fn get(&self, index: usize, tracker: Option<&Tracker>) -> Value {
        self.track(tracker);
        self.0
            .items
            .borrow()
            .get(index)
            .cloned()
            .unwrap_or(Value::Undefined)
    }

    pub fn len(&self, tracker: Option<&Tracker>) -> usize {
        self.track(tracker);
        self.0.items.borrow().len()
    }

    pub fn is_empty(&self, tracker: Option<&Tracker>) -> bool {
        self.len(tracker) == 0
    }

    /// Snapshot of the current items.
    pub fn to_vec(&self, tracker: Option<&Tracker>) -> Vec<Value> {
        self.track(tracker);
        self.0.items.borrow().clone()
    }

    pub fn push(&self, value: Value) {
        self.mutate(|items| items.push(value));
    }

    pub fn pop(&self) -> Option<Value> {
        let popped = self.0.items.borrow_mut().pop();
        if popped.is_some() {
            self.notify();
        }
        popped
    }

    /// Insert at `index`, clamped to the length.
    pub fn insert(&self, index: usize, value: Value) {
        self.mutate(|items| {
            let at = index.min(items.len());
            items.insert(at, value);
        });
    }

    pub fn remove(&self, index: usize) -> Option<Value> {
        let removed = {
            let mut items = self.0.items.borrow_mut();
            (index < items.len()).then(|| items.remove(index))
        };
        if removed.is_some() {
            self.notify();
        }
        removed
    }

    /// Replace the item at `index`, growing with `undefined` when needed.
    pub fn set(&self, index: usize, value: Value) {
        {
            let mut items = self.0.items.borrow_mut();
            if let Some(current) = items.get(index) {
                if current.same_value(&value) {
                    return;
                }
            }
            if index >= items.len() {
                items.resize(index + 1, Value::Undefined);
            }
            items[index] = value;
        }
        self.notify();
    }

    /// Remove `delete_count` items at `start` and insert `replacement` there.
    pub fn splice(&self, start: usize, delete_count: usize, replacement: Vec<Value>) -> Vec<Value> {
        let removed = {
            let mut items = self.0.items.borrow_mut();
            let start = start.min(items.len());
            let end = start.saturating_add(delete_count).min(items.len());
            let removed: Vec<Value> = items.splice(start..end, replacement).collect();
            removed
        };
        self.notify();
        removed
    }

    /// Replace the whole content.
    pub fn replace(&self, items: Vec<Value>) {
        self.mutate(|current| *current = items);
    }

    pub fn clear(&self) {
        self.mutate(Vec::clear);
    }

    pub fn reverse(&self) {
        self.mutate(|items| items.reverse());
    }

    /// Number of subscribed trackers.
    pub fn subscriber_count(&self) -> usize {
        self.0.subscribers.borrow().len()
    }

    pub(crate) fn subscribe(&self, tracker: &Tracker) {
        if self.0.subscribers.borrow_mut().add(tracker) {
            tracker.record(Source::Array(Rc::downgrade(&self.0)));
        }
    }

    fn track(&self, tracker: Option<&Tracker>) {
        if let Some(tracker) = tracker {
            self.subscribe(tracker);
        }
    }

    fn mutate(&self, f: impl FnOnce(&mut Vec<Value>)) {
        f(&mut *self.0.items.borrow_mut());
        self.notify();
    }

    fn notify(&self) {
        let trackers = self.0.subscribers.borrow_mut().live();
        notify_all(trackers);
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.items.borrow().iter()).finish()
    }
}
