//! The binding map: compiled path to directive-instance table.

use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use sinopia_relief::NodePath;

use crate::directive::Directive;

/// Directive instances bound to the node at one path.
#[derive(Clone)]
pub struct Binding {
    pub path: NodePath,
    pub directives: Vec<Rc<dyn Directive>>,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("path", &self.path)
            .field("directives", &self.directives)
            .finish()
    }
}

/// Ordered mapping from [`NodePath`] to directive instances.
///
/// Entries are in node discovery order. The map is immutable once built and
/// shared by every instantiation of its template.
#[derive(Debug, Clone, Default)]
pub struct BindingMap {
    bindings: Vec<Binding>,
}

/// Serializable view of one binding, used by diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingDescription {
    pub path: NodePath,
    pub directives: Vec<String>,
}

impl BindingMap {
    pub(crate) fn new(bindings: Vec<Binding>) -> Self {
        Self { bindings }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Binding> {
        self.bindings.iter()
    }

    pub fn get(&self, path: &NodePath) -> Option<&[Rc<dyn Directive>]> {
        self.bindings
            .iter()
            .find(|binding| &binding.path == path)
            .map(|binding| binding.directives.as_slice())
    }

    pub fn paths(&self) -> Vec<NodePath> {
        self.bindings.iter().map(|b| b.path.clone()).collect()
    }

    /// Total number of directive instances across all paths.
    pub fn directive_count(&self) -> usize {
        self.bindings.iter().map(|b| b.directives.len()).sum()
    }

    pub fn describe(&self) -> Vec<BindingDescription> {
        self.bindings
            .iter()
            .map(|binding| BindingDescription {
                path: binding.path.clone(),
                directives: binding.directives.iter().map(|d| d.describe()).collect(),
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a BindingMap {
    type Item = &'a Binding;
    type IntoIter = std::slice::Iter<'a, Binding>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
