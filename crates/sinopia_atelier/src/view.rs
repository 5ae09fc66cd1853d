//! Bound template instances.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use sinopia_relief::Node;
use sinopia_tempera::Object;

use crate::directive::NodeHandler;

/// Key under which row data refers back to the root data.
pub const ROOT_DATA_KEY: &str = "$data";

struct ViewInner {
    root: Node,
    roots: Vec<Node>,
    handlers: Vec<Rc<dyn NodeHandler>>,
    data: Object,
    destroyed: Cell<bool>,
}

/// A live instance: its nodes, its handlers and the data they read.
///
/// `View` is a cheap handle; clones refer to the same instance.
#[derive(Clone)]
pub struct View(Rc<ViewInner>);

impl View {
    /// `root` is the instance container: a fragment of cloned content or the
    /// tree that was bound in place. The top-level nodes are recorded now, so
    /// they are still known after a fragment is inserted into a document.
    pub fn new(root: Node, handlers: Vec<Rc<dyn NodeHandler>>, data: Object) -> Self {
        let roots = if root.is_fragment() {
            root.children()
        } else {
            vec![root.clone()]
        };
        Self(Rc::new(ViewInner {
            root,
            roots,
            handlers,
            data,
            destroyed: Cell::new(false),
        }))
    }

    #[inline]
    pub fn ptr_eq(&self, other: &View) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn root(&self) -> &Node {
        &self.0.root
    }

    /// Top-level nodes of the instance.
    pub fn roots(&self) -> &[Node] {
        &self.0.roots
    }

    pub fn handlers(&self) -> &[Rc<dyn NodeHandler>] {
        &self.0.handlers
    }

    pub fn data(&self) -> &Object {
        &self.0.data
    }

    /// Copy the entries of `data` into this view's data, except the root
    /// data reference. Handlers that read a changed entry update on the next
    /// tick.
    pub fn set_data(&self, data: &Object) {
        if self.0.destroyed.get() || self.0.data.ptr_eq(data) {
            return;
        }
        for (key, value) in data.entries(None) {
            if key != ROOT_DATA_KEY {
                self.0.data.set(key, value);
            }
        }
    }

    /// Destroy every handler. Idempotent.
    pub fn destroy(&self) {
        if self.0.destroyed.replace(true) {
            return;
        }
        for handler in &self.0.handlers {
            handler.destroy();
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.0.destroyed.get()
    }

    /// Current markup of the instance.
    ///
    /// A fragment root that still holds the instance serializes its
    /// children; once its nodes were moved out, the recorded top-level nodes
    /// are serialized instead.
    pub fn html(&self) -> String {
        let root = &self.0.root;
        if !root.is_fragment() {
            return root.outer_html();
        }
        if root.has_children() {
            return root.inner_html();
        }
        self.0.roots.iter().map(Node::outer_html).collect()
    }

    /// First handler of type `H`, for inspection.
    pub fn find_handler<H: 'static>(&self) -> Option<&H> {
        self.0
            .handlers
            .iter()
            .find_map(|handler| handler.as_any().downcast_ref::<H>())
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("roots", &self.0.roots.len())
            .field("handlers", &self.0.handlers.len())
            .field("destroyed", &self.0.destroyed.get())
            .finish()
    }
}
