//! Directive traits and the ordered directive set.
//!
//! Three layers, from static to live:
//!
//! - [`DirectiveKind`]: a registered directive type. Knows which attributes it
//!   claims and whether it manages (replaces) its element.
//! - [`Directive`]: one instance per distinct `(kind, attribute, value)` or
//!   token expression within a compile run. Holds the parsed expression and
//!   is shared by every node that carries the same expression.
//! - [`NodeHandler`]: per-instantiation state for one concrete node.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use compact_str::CompactString;
use sinopia_relief::Node;
use sinopia_tempera::Object;

use crate::directives::{AttrDirectiveKind, EachDirectiveKind, StyleDirectiveKind};
use crate::errors::DirectiveSetError;
use crate::runtime::Runtime;

/// A registered directive type.
pub trait DirectiveKind {
    /// Short name used in configuration and diagnostics.
    fn name(&self) -> &'static str;

    /// The first attribute of `element` this kind claims, if any.
    fn matches(&self, element: &Node) -> Option<CompactString>;

    /// Whether the directive replaces its element with a placeholder.
    fn manages(&self) -> bool {
        false
    }

    /// Build an instance for one attribute occurrence. `value` is trimmed.
    fn create(&self, attr: &str, value: &str) -> Rc<dyn Directive>;
}

/// A compiled directive instance.
pub trait Directive {
    /// Name of the kind that produced it.
    fn kind(&self) -> &'static str;

    /// Human readable description, e.g. `attr:disabled="!enabled"`.
    fn describe(&self) -> String;

    /// Create the live handler for `node` in a fresh instance.
    fn node_handler(&self, node: &Node, runtime: &Rc<Runtime>) -> Rc<dyn NodeHandler>;
}

/// Live, per-node binding state.
pub trait NodeHandler {
    /// Feed fresh data. Work is deferred to the next tick.
    fn render(&self, data: &Object);

    /// Unsubscribe and release. Idempotent.
    fn destroy(&self);

    fn is_destroyed(&self) -> bool;

    fn as_any(&self) -> &dyn Any;
}

impl fmt::Debug for dyn Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Ordered list of directive kinds a template is compiled against.
///
/// Order is part of the compiler contract: for each element the kinds are
/// tried in this order and the first managing match stops the others, so
/// managing kinds (`each`) belong first.
#[derive(Clone)]
pub struct DirectiveSet(Vec<Rc<dyn DirectiveKind>>);

impl DirectiveSet {
    /// Names accepted by [`DirectiveSet::from_names`].
    pub const KNOWN: [&'static str; 3] = ["each", "attr", "style"];

    pub fn new(kinds: Vec<Rc<dyn DirectiveKind>>) -> Self {
        Self(kinds)
    }

    /// No element directives; only text tokens are bound.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// `each`, `attr`, `style`
    pub fn standard() -> Self {
        Self(vec![
            Rc::new(EachDirectiveKind),
            Rc::new(AttrDirectiveKind),
            Rc::new(StyleDirectiveKind),
        ])
    }

    /// Build a set from directive names in the given order.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, DirectiveSetError> {
        let mut kinds: Vec<Rc<dyn DirectiveKind>> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            if kinds.iter().any(|kind| kind.name() == name) {
                return Err(DirectiveSetError::Duplicate(name.into()));
            }
            kinds.push(match name {
                "each" => Rc::new(EachDirectiveKind),
                "attr" => Rc::new(AttrDirectiveKind),
                "style" => Rc::new(StyleDirectiveKind),
                other => return Err(DirectiveSetError::Unknown(other.into())),
            });
        }
        Ok(Self(kinds))
    }

    pub fn kinds(&self) -> &[Rc<dyn DirectiveKind>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|kind| kind.name() == name)
    }

    /// Stable identity of the ordered set, used in template cache keys.
    pub fn signature(&self) -> String {
        self.0
            .iter()
            .map(|kind| kind.name())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for DirectiveSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for DirectiveSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.0.iter().map(|kind| kind.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_names_keeps_order() {
        let set = DirectiveSet::from_names(&["style", "each"]).unwrap();
        assert_eq!(set.signature(), "style,each");
        assert_eq!(set.position("each"), Some(1));
    }

    #[test]
    fn test_from_names_rejects_unknown_and_duplicates() {
        assert_eq!(
            DirectiveSet::from_names(&["if"]).err(),
            Some(DirectiveSetError::Unknown("if".into()))
        );
        assert_eq!(
            DirectiveSet::from_names(&["attr", "attr"]).err(),
            Some(DirectiveSetError::Duplicate("attr".into()))
        );
    }

    #[test]
    fn test_standard_order() {
        assert_eq!(DirectiveSet::standard().signature(), "each,attr,style");
    }
}
