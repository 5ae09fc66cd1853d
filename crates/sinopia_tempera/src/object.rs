//! Observable objects.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use compact_str::CompactString;
use indexmap::IndexMap;
use sinopia_carton::FxHashMap;

use crate::tracker::{notify_all, Source, Subscribers, Tracker};
use crate::value::Value;

/// A shared, observable string-keyed map preserving insertion order.
///
/// Every object is observable from creation; there is no separate
/// "make observable" step.
#[derive(Clone, Default)]
pub struct Object(Rc<ObjectInner>);

#[derive(Default)]
pub(crate) struct ObjectInner {
    entries: RefCell<IndexMap<CompactString, Value>>,
    /// Trackers that read a specific key
    key_subscribers: RefCell<FxHashMap<CompactString, Subscribers>>,
    /// Trackers interested in any change
    all_subscribers: RefCell<Subscribers>,
}

impl ObjectInner {
    pub(crate) fn unsubscribe_key(&self, key: &str, tracker: &Tracker) {
        let mut map = self.key_subscribers.borrow_mut();
        if let Some(subscribers) = map.get_mut(key) {
            subscribers.remove(tracker);
            if subscribers.is_empty() {
                map.remove(key);
            }
        }
    }

    pub(crate) fn unsubscribe_all(&self, tracker: &Tracker) {
        self.all_subscribers.borrow_mut().remove(tracker);
    }
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an object from entries, later duplicates overwriting earlier ones.
    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: Into<CompactString>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let object = Self::new();
        {
            let mut map = object.0.entries.borrow_mut();
            for (key, value) in entries {
                map.insert(key.into(), value);
            }
        }
        object
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address-based identity, stable while the object is alive.
    #[inline]
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    /// Read a property, subscribing `tracker` to it. Missing keys read as
    /// `undefined`.
    pub fn get(&self, key: &str, tracker: Option<&Tracker>) -> Value {
        if let Some(tracker) = tracker {
            self.subscribe_key(key, tracker);
        }
        self.peek(key)
    }

    /// Read a property without subscribing.
    pub fn peek(&self, key: &str) -> Value {
        self.0
            .entries
            .borrow()
            .get(key)
            .cloned()
            .unwrap_or(Value::Undefined)
    }

    pub fn contains_key(&self, key: &str, tracker: Option<&Tracker>) -> bool {
        if let Some(tracker) = tracker {
            self.subscribe_key(key, tracker);
        }
        self.0.entries.borrow().contains_key(key)
    }

    /// Keys in insertion order. Subscribes to every change of the object.
    pub fn keys(&self, tracker: Option<&Tracker>) -> Vec<CompactString> {
        if let Some(tracker) = tracker {
            self.subscribe_all(tracker);
        }
        self.0.entries.borrow().keys().cloned().collect()
    }

    /// Entries in insertion order. Subscribes to every change of the object.
    pub fn entries(&self, tracker: Option<&Tracker>) -> Vec<(CompactString, Value)> {
        if let Some(tracker) = tracker {
            self.subscribe_all(tracker);
        }
        self.0
            .entries
            .borrow()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.entries.borrow().is_empty()
    }

    /// Write a property. Subscribers are notified only when the stored value
    /// actually changes.
    pub fn set(&self, key: impl Into<CompactString>, value: Value) {
        let key = key.into();
        {
            let mut entries = self.0.entries.borrow_mut();
            match entries.get_mut(&key) {
                Some(current) if current.same_value(&value) => return,
                Some(current) => *current = value,
                None => {
                    entries.insert(key.clone(), value);
                }
            }
        }
        self.notify(&key);
    }

    /// Remove a property, returning its value.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let removed = self.0.entries.borrow_mut().shift_remove(key);
        if removed.is_some() {
            self.notify(key);
        }
        removed
    }

    /// Copy every entry of `other` into this object.
    pub fn assign(&self, other: &Object) {
        if self.ptr_eq(other) {
            return;
        }
        for (key, value) in other.entries(None) {
            self.set(key, value);
        }
    }

    /// Number of trackers subscribed to `key`.
    pub fn subscriber_count(&self, key: &str) -> usize {
        self.0
            .key_subscribers
            .borrow()
            .get(key)
            .map_or(0, Subscribers::len)
    }

    /// Number of trackers subscribed to any change.
    pub fn watcher_count(&self) -> usize {
        self.0.all_subscribers.borrow().len()
    }

    fn subscribe_key(&self, key: &str, tracker: &Tracker) {
        let added = self
            .0
            .key_subscribers
            .borrow_mut()
            .entry(CompactString::from(key))
            .or_default()
            .add(tracker);
        if added {
            tracker.record(Source::Key(Rc::downgrade(&self.0), key.into()));
        }
    }

    pub(crate) fn subscribe_all(&self, tracker: &Tracker) {
        if self.0.all_subscribers.borrow_mut().add(tracker) {
            tracker.record(Source::Object(Rc::downgrade(&self.0)));
        }
    }

    fn notify(&self, key: &str) {
        let mut trackers = self
            .0
            .key_subscribers
            .borrow_mut()
            .get_mut(key)
            .map(Subscribers::live)
            .unwrap_or_default();
        for tracker in self.0.all_subscribers.borrow_mut().live() {
            if !trackers.contains(&tracker) {
                trackers.push(tracker);
            }
        }
        notify_all(trackers);
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.entries.borrow().iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counting_tracker() -> (Tracker, Rc<Cell<u32>>) {
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        (Tracker::new(move || counter.set(counter.get() + 1)), hits)
    }

    #[test]
    fn test_missing_key_is_undefined() {
        let object = Object::new();
        assert!(matches!(object.peek("nope"), Value::Undefined));
    }

    #[test]
    fn test_same_value_does_not_notify() {
        let (tracker, hits) = counting_tracker();
        let object = Object::from_entries([("a", Value::from("x"))]);
        object.get("a", Some(&tracker));

        object.set("a", Value::from("x"));
        assert_eq!(hits.get(), 0);

        object.set("a", Value::from("y"));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_key_subscription_is_scoped() {
        let (tracker, hits) = counting_tracker();
        let object = Object::new();
        object.get("a", Some(&tracker));

        object.set("b", Value::from(1));
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_watch_object_sees_additions_and_removals() {
        let (tracker, hits) = counting_tracker();
        let object = Object::new();
        tracker.watch_object(&object);

        object.set("a", Value::from(1));
        object.remove("a");
        assert_eq!(hits.get(), 2);
        assert!(object.is_empty());
    }

    #[test]
    fn test_single_notification_for_key_and_watch() {
        let (tracker, hits) = counting_tracker();
        let object = Object::new();
        object.get("a", Some(&tracker));
        tracker.watch_object(&object);

        object.set("a", Value::from(1));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_assign_preserves_order() {
        let object = Object::from_entries([("b", Value::from(1))]);
        object.assign(&Object::from_entries([("a", Value::from(2)), ("b", Value::from(3))]));
        assert_eq!(object.keys(None), vec!["b", "a"]);
        assert_eq!(object.peek("b"), Value::from(3));
    }
}
