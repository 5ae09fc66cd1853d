//! List reconciliation for `_each`.
//!
//! One [`EachHandler`] per loop occurrence. It owns a trailing placeholder
//! marker, the ordered row binders in front of it and the key map. Two
//! reactive inputs drive it:
//!
//! - the source updater re-evaluates the loop's source expression and swaps
//!   collections when the reference changes;
//! - the list tracker watches the current collection and queues one
//!   iteration pass per tick on any mutation.
//!
//! A pass builds the new row order, reusing binders by key (keyed mode) or by
//! position (unkeyed mode), destroys binders that fell out, then walks the new
//! order backward and moves each row only when it is not already directly in
//! front of its successor.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use compact_str::CompactString;
use sinopia_carton::{bitflags, is_whitespace_only, FxHashMap, FxHashSet};
use sinopia_relief::Node;
use sinopia_tempera::{Array, Object, Tracker, Value};

use super::each::KEY_ATTR;
use crate::directive::NodeHandler;
use crate::expression::Expression;
use crate::runtime::Runtime;
use crate::template::Template;
use crate::updater::Updater;
use crate::view::{View, ROOT_DATA_KEY};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct LoopFlags: u8 {
        /// No row has been rendered yet
        const FIRST_RENDER = 1 << 0;
        /// Rows are matched by key
        const USES_KEY = 1 << 1;
        const DESTROYED = 1 << 2;
        /// An iteration pass is queued for the next tick
        const ITERATION_QUEUED = 1 << 3;
    }
}

/// Lifecycle of one loop occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    /// Created, no source seen yet
    Uninitialized,
    /// Bound to an absent or empty source
    Empty,
    /// Bound with at least one row
    Populated,
    Destroyed,
}

/// Object or array used as a row key, compared by identity.
///
/// Holding the handle keeps the allocation alive while the key is mapped,
/// so an address is never shared by two live keys.
#[derive(Debug, Clone)]
pub enum KeyIdentity {
    Object(Object),
    Array(Array),
}

impl KeyIdentity {
    fn id(&self) -> usize {
        match self {
            Self::Object(object) => object.id(),
            Self::Array(array) => array.id(),
        }
    }
}

impl PartialEq for KeyIdentity {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::Array(a), Self::Array(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Eq for KeyIdentity {}

impl Hash for KeyIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

/// Row identity in keyed mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowKey {
    Text(CompactString),
    /// `f64` bits, with `-0` folded into `0`
    Number(u64),
    Bool(bool),
    Identity(KeyIdentity),
}

impl RowKey {
    /// Falsy values do not key a row.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_truthy() {
            return None;
        }
        Some(match value {
            Value::String(s) => Self::Text(s.clone()),
            Value::Number(n) => Self::Number(if *n == 0.0 { 0 } else { n.to_bits() }),
            Value::Bool(b) => Self::Bool(*b),
            Value::Object(object) => Self::Identity(KeyIdentity::Object(object.clone())),
            Value::Array(array) => Self::Identity(KeyIdentity::Array(array.clone())),
            Value::Undefined | Value::Null => return None,
        })
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(bits) => write!(f, "{}", Value::Number(f64::from_bits(*bits)).to_js_string()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Identity(identity) => write!(f, "#{:x}", identity.id()),
        }
    }
}

/// One rendered row.
struct RowBinder {
    view: View,
    key: Option<RowKey>,
}

impl RowBinder {
    fn detach(&self) {
        for root in self.view.roots() {
            root.detach();
        }
    }
}

/// One iteration step: the item, its key in the source, its position.
struct Entry {
    value: Value,
    key: Value,
    index: usize,
}

struct LoopState {
    runtime: Rc<Runtime>,
    template: Option<Rc<Template>>,
    args: Vec<CompactString>,
    placeholder: Node,
    flags: Cell<LoopFlags>,
    phase: Cell<LoopPhase>,
    key_expression: RefCell<Option<Rc<Expression>>>,
    rows: RefCell<Vec<Rc<RowBinder>>>,
    rows_by_key: RefCell<FxHashMap<RowKey, Rc<RowBinder>>>,
    data: RefCell<Option<Object>>,
    collection: RefCell<Option<Value>>,
    source_updater: RefCell<Option<Updater>>,
    list_tracker: RefCell<Option<Tracker>>,
}

/// Live state of one `_each` occurrence.
pub struct EachHandler(Rc<LoopState>);

impl EachHandler {
    pub(crate) fn new(
        args: Vec<CompactString>,
        source: Option<Rc<Expression>>,
        payload: &Node,
        runtime: &Rc<Runtime>,
    ) -> Self {
        let placeholder = Node::marker("");
        if payload.replace_with(&placeholder).is_err() {
            tracing::error!("loop payload marker has no parent");
        }

        let template = source
            .is_some()
            .then(|| runtime.template(&payload.node_value()));

        let state = Rc::new(LoopState {
            runtime: runtime.clone(),
            template,
            args,
            placeholder,
            flags: Cell::new(LoopFlags::FIRST_RENDER),
            phase: Cell::new(LoopPhase::Uninitialized),
            key_expression: RefCell::new(None),
            rows: RefCell::new(Vec::new()),
            rows_by_key: RefCell::new(FxHashMap::default()),
            data: RefCell::new(None),
            collection: RefCell::new(None),
            source_updater: RefCell::new(None),
            list_tracker: RefCell::new(None),
        });

        if let Some(source) = source {
            let weak = Rc::downgrade(&state);
            let updater = Updater::new(runtime.scheduler().clone(), source, move |value, _| {
                if let Some(state) = weak.upgrade() {
                    state.set_collection(value);
                }
            });
            *state.source_updater.borrow_mut() = Some(updater);
        }

        Self(state)
    }

    pub fn phase(&self) -> LoopPhase {
        self.0.phase.get()
    }

    pub fn row_count(&self) -> usize {
        self.0.rows.borrow().len()
    }

    /// Row views in document order.
    pub fn rows(&self) -> Vec<View> {
        self.0.rows.borrow().iter().map(|row| row.view.clone()).collect()
    }

    /// Keys of keyed rows in document order.
    pub fn keys(&self) -> Vec<RowKey> {
        self.0
            .rows
            .borrow()
            .iter()
            .filter_map(|row| row.key.clone())
            .collect()
    }

    pub fn is_keyed(&self) -> bool {
        self.0.flags.get().contains(LoopFlags::USES_KEY)
    }

    /// The trailing marker rows are kept in front of.
    pub fn placeholder(&self) -> &Node {
        &self.0.placeholder
    }
}

impl NodeHandler for EachHandler {
    fn render(&self, data: &Object) {
        let state = &self.0;
        if state.is_destroyed() {
            return;
        }
        *state.data.borrow_mut() = Some(data.clone());
        match &*state.source_updater.borrow() {
            Some(updater) => updater.update(Some(data)),
            None => state.phase.set(LoopPhase::Empty),
        }
    }

    fn destroy(&self) {
        let state = &self.0;
        if state.is_destroyed() {
            return;
        }
        state.set_flag(LoopFlags::DESTROYED, true);
        if let Some(updater) = &*state.source_updater.borrow() {
            updater.destroy();
        }
        if let Some(tracker) = state.list_tracker.borrow_mut().take() {
            tracker.stop();
        }
        state.rows_by_key.borrow_mut().clear();
        let rows = std::mem::take(&mut *state.rows.borrow_mut());
        for row in rows {
            row.detach();
            row.view.destroy();
        }
        state.data.borrow_mut().take();
        state.collection.borrow_mut().take();
        state.phase.set(LoopPhase::Destroyed);
    }

    fn is_destroyed(&self) -> bool {
        self.0.is_destroyed()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl LoopState {
    fn is_destroyed(&self) -> bool {
        self.flags.get().contains(LoopFlags::DESTROYED)
    }

    fn set_flag(&self, flag: LoopFlags, on: bool) {
        let mut flags = self.flags.get();
        flags.set(flag, on);
        self.flags.set(flags);
    }

    /// The source expression produced `value`.
    fn set_collection(self: &Rc<Self>, value: &Value) {
        if self.is_destroyed() {
            return;
        }
        let unchanged = match (&*self.collection.borrow(), value) {
            (Some(Value::Array(old)), Value::Array(new)) => old.ptr_eq(new),
            (Some(Value::Object(old)), Value::Object(new)) => old.ptr_eq(new),
            _ => false,
        };
        if unchanged {
            return;
        }

        if let Some(tracker) = self.list_tracker.borrow_mut().take() {
            tracker.stop();
        }

        let is_empty = match value {
            Value::Array(array) => array.is_empty(None),
            Value::Object(object) => object.is_empty(),
            _ => {
                self.collection.borrow_mut().take();
                self.clear_rows();
                self.phase.set(LoopPhase::Empty);
                return;
            }
        };

        let weak = Rc::downgrade(self);
        let tracker = Tracker::new(move || {
            if let Some(state) = weak.upgrade() {
                state.queue_iteration();
            }
        });
        match value {
            Value::Array(array) => tracker.watch_array(array),
            Value::Object(object) => tracker.watch_object(object),
            _ => {}
        }
        *self.list_tracker.borrow_mut() = Some(tracker);
        *self.collection.borrow_mut() = Some(value.clone());

        if is_empty {
            self.clear_rows();
            self.phase.set(LoopPhase::Empty);
        } else {
            self.iterate();
        }
    }

    /// Collection mutated; coalesce into one pass on the next tick.
    fn queue_iteration(self: &Rc<Self>) {
        let flags = self.flags.get();
        if flags.intersects(LoopFlags::DESTROYED | LoopFlags::ITERATION_QUEUED) {
            return;
        }
        self.set_flag(LoopFlags::ITERATION_QUEUED, true);

        let weak: Weak<LoopState> = Rc::downgrade(self);
        self.runtime.scheduler().next_tick(move || {
            if let Some(state) = weak.upgrade() {
                state.set_flag(LoopFlags::ITERATION_QUEUED, false);
                state.iterate();
            }
        });
    }

    fn entries(&self, collection: &Value) -> Vec<Entry> {
        match collection {
            Value::Array(array) => array
                .to_vec(None)
                .into_iter()
                .enumerate()
                .map(|(index, value)| Entry {
                    value,
                    key: Value::Number(index as f64),
                    index,
                })
                .collect(),
            Value::Object(object) => object
                .entries(None)
                .into_iter()
                .enumerate()
                .map(|(index, (key, value))| Entry {
                    value,
                    key: Value::String(key),
                    index,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Per-row scope: the iterator names plus a reference to the root data.
    fn row_data(&self, root_data: &Value, collection: &Value, entry: &Entry) -> Object {
        let row = Object::new();
        row.set(ROOT_DATA_KEY, root_data.clone());

        let positional: Vec<Value> = match collection {
            Value::Object(_) => vec![
                entry.value.clone(),
                entry.key.clone(),
                Value::Number(entry.index as f64),
            ],
            _ => vec![entry.value.clone(), Value::Number(entry.index as f64)],
        };
        for (name, value) in self.args.iter().zip(positional) {
            row.set(name.clone(), value);
        }
        row
    }

    fn root_data(&self) -> Value {
        match &*self.data.borrow() {
            Some(data) => match data.peek(ROOT_DATA_KEY) {
                Value::Object(root) => Value::Object(root),
                _ => Value::Object(data.clone()),
            },
            None => Value::Undefined,
        }
    }

    /// Full iteration pass over the current collection.
    fn iterate(self: &Rc<Self>) {
        if self.is_destroyed() {
            return;
        }
        let Some(collection) = self.collection.borrow().clone() else {
            return;
        };
        let Some(template) = self.template.clone() else {
            return;
        };

        let entries = self.entries(&collection);
        if entries.is_empty() {
            self.clear_rows();
            self.phase.set(LoopPhase::Empty);
            return;
        }

        if self.flags.get().contains(LoopFlags::FIRST_RENDER) {
            self.set_flag(LoopFlags::FIRST_RENDER, false);
            if let Some(source) = template.root_key() {
                match Expression::parse(&source) {
                    Ok(expression) => {
                        *self.key_expression.borrow_mut() = Some(Rc::new(expression));
                        self.set_flag(LoopFlags::USES_KEY, true);
                    }
                    Err(error) => tracing::warn!(%source, %error, "invalid loop key; rows stay unkeyed"),
                }
            }
        }

        let root_data = self.root_data();
        let keyed = self.flags.get().contains(LoopFlags::USES_KEY);
        let previous = std::mem::take(&mut *self.rows.borrow_mut());
        let mut next: Vec<Rc<RowBinder>> = Vec::with_capacity(entries.len());
        let mut claimed: FxHashSet<RowKey> = FxHashSet::default();

        for entry in &entries {
            let data = self.row_data(&root_data, &collection, entry);
            let row = if keyed {
                self.keyed_row(&template, data, &mut claimed)
            } else {
                match previous.get(entry.index) {
                    Some(existing) => {
                        existing.view.set_data(&data);
                        existing.clone()
                    }
                    None => self.create_row(&template, data, None),
                }
            };
            next.push(row);
        }

        let mut destroyed = 0;
        for old in &previous {
            if !next.iter().any(|row| Rc::ptr_eq(row, old)) {
                self.destroy_row(old);
                destroyed += 1;
            }
        }

        self.reposition(&next);
        tracing::trace!(rows = next.len(), destroyed, keyed, "loop reconciled");
        *self.rows.borrow_mut() = next;
        self.phase.set(LoopPhase::Populated);
    }

    fn keyed_row(
        &self,
        template: &Rc<Template>,
        data: Object,
        claimed: &mut FxHashSet<RowKey>,
    ) -> Rc<RowBinder> {
        let key = self.key_expression.borrow().as_ref().and_then(|expression| {
            match expression.evaluate(&data, None) {
                Ok(value) => RowKey::from_value(&value),
                Err(error) => {
                    tracing::error!(key = expression.source(), %error, "loop key evaluation failed");
                    None
                }
            }
        });

        let Some(key) = key else {
            return self.create_row(template, data, None);
        };
        if !claimed.insert(key.clone()) {
            tracing::warn!(%key, "duplicate loop key; row rendered without reuse");
            return self.create_row(template, data, None);
        }

        let existing = self.rows_by_key.borrow().get(&key).cloned();
        match existing {
            Some(row) => {
                row.view.set_data(&data);
                row
            }
            None => {
                let row = self.create_row(template, data, Some(key.clone()));
                self.rows_by_key.borrow_mut().insert(key, row.clone());
                row
            }
        }
    }

    fn create_row(&self, template: &Rc<Template>, data: Object, key: Option<RowKey>) -> Rc<RowBinder> {
        let view = self.runtime.render(template, &data);
        for root in view.roots() {
            if root.is_element() {
                root.remove_attribute(KEY_ATTR);
            }
        }
        Rc::new(RowBinder { view, key })
    }

    fn destroy_row(&self, row: &Rc<RowBinder>) {
        row.detach();
        if let Some(key) = &row.key {
            let mut by_key = self.rows_by_key.borrow_mut();
            if by_key.get(key).is_some_and(|current| Rc::ptr_eq(current, row)) {
                by_key.remove(key);
            }
        }
        row.view.destroy();
    }

    /// Remove every row.
    fn clear_rows(&self) {
        let rows = std::mem::take(&mut *self.rows.borrow_mut());
        self.rows_by_key.borrow_mut().clear();
        if rows.is_empty() {
            return;
        }

        match self.dedicated_parent(&rows) {
            Some(parent) => {
                parent.clear_children();
                if let Err(error) = parent.append_child(&self.placeholder) {
                    tracing::error!(%error, "could not restore loop placeholder");
                }
                self.runtime.scheduler().next_tick(move || {
                    for row in rows {
                        row.view.destroy();
                    }
                });
            }
            None => {
                for row in &rows {
                    row.detach();
                    row.view.destroy();
                }
            }
        }
    }

    /// The placeholder's parent when it holds nothing but this loop: the
    /// placeholder, whitespace text and the top-level nodes of `rows`. A
    /// fragment parent never qualifies.
    fn dedicated_parent(&self, rows: &[Rc<RowBinder>]) -> Option<Node> {
        let parent = self.placeholder.parent().filter(|parent| !parent.is_fragment())?;
        let owned = |child: &Node| {
            child.ptr_eq(&self.placeholder)
                || rows
                    .iter()
                    .any(|row| row.view.roots().iter().any(|root| root.ptr_eq(child)))
        };
        parent
            .children()
            .iter()
            .all(|child| owned(child) || (child.is_text() && is_whitespace_only(&child.node_value())))
            .then_some(parent)
    }

    /// Walk `rows` from last to first, moving a row only when it is not
    /// directly in front of its successor.
    fn reposition(&self, rows: &[Rc<RowBinder>]) {
        let Some(parent) = self.placeholder.parent() else {
            return;
        };
        let mut anchor = self.placeholder.clone();

        for row in rows.iter().rev() {
            let roots = row.view.roots();
            let (Some(first), Some(last)) = (roots.first(), roots.last()) else {
                continue;
            };
            let in_place = last.next_sibling().is_some_and(|next| next.ptr_eq(&anchor));
            if !in_place {
                for root in roots {
                    if let Err(error) = parent.insert_before(root, Some(&anchor)) {
                        tracing::error!(%error, "could not position loop row");
                    }
                }
            }
            anchor = first.clone();
        }
    }
}
