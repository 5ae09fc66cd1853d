//! Node handles and structural operations.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use compact_str::CompactString;
use sinopia_carton::floor_char_boundary;

use crate::errors::TreeError;
use crate::style::{parse_style, serialize_style};

/// Node type discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeType {
    Fragment = 0,
    Element = 1,
    Text = 3,
    Marker = 8,
}

/// A single attribute on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: CompactString,
    pub value: CompactString,
}

impl Attribute {
    pub fn new(name: impl Into<CompactString>, value: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Element payload: tag name and ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementData {
    pub tag: CompactString,
    pub attrs: Vec<Attribute>,
}

impl ElementData {
    fn position(&self, name: &str) -> Option<usize> {
        self.attrs.iter().position(|attr| attr.name == name)
    }
}

/// Node type variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Parentless container
    Fragment,
    /// Element with attributes
    Element(ElementData),
    /// Character data
    Text(CompactString),
    /// Inert placeholder with opaque data
    Marker(CompactString),
}

struct NodeData {
    kind: RefCell<NodeKind>,
    parent: RefCell<Weak<NodeData>>,
    children: RefCell<Vec<Node>>,
}

/// Shared handle to a node in a live tree.
///
/// Cloning the handle does not clone the node; equality and hashing are by
/// identity. Use [`Node::clone_deep`] for a structural copy.
#[derive(Clone)]
pub struct Node(Rc<NodeData>);

impl Node {
    fn with_kind(kind: NodeKind) -> Self {
        Self(Rc::new(NodeData {
            kind: RefCell::new(kind),
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
        }))
    }

    /// Create an empty fragment.
    pub fn fragment() -> Self {
        Self::with_kind(NodeKind::Fragment)
    }

    /// Create an element without attributes.
    pub fn element(tag: impl Into<CompactString>) -> Self {
        Self::with_kind(NodeKind::Element(ElementData {
            tag: tag.into(),
            attrs: Vec::new(),
        }))
    }

    /// Create a text node.
    pub fn text(value: impl Into<CompactString>) -> Self {
        Self::with_kind(NodeKind::Text(value.into()))
    }

    /// Create a marker (placeholder) node.
    pub fn marker(data: impl Into<CompactString>) -> Self {
        Self::with_kind(NodeKind::Marker(data.into()))
    }

    /// Identity comparison.
    #[inline]
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn node_type(&self) -> NodeType {
        match &*self.0.kind.borrow() {
            NodeKind::Fragment => NodeType::Fragment,
            NodeKind::Element(_) => NodeType::Element,
            NodeKind::Text(_) => NodeType::Text,
            NodeKind::Marker(_) => NodeType::Marker,
        }
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        self.node_type() == NodeType::Element
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        self.node_type() == NodeType::Text
    }

    #[inline]
    pub fn is_marker(&self) -> bool {
        self.node_type() == NodeType::Marker
    }

    #[inline]
    pub fn is_fragment(&self) -> bool {
        self.node_type() == NodeType::Fragment
    }

    /// Snapshot of the node payload.
    pub fn kind(&self) -> NodeKind {
        self.0.kind.borrow().clone()
    }

    /// Element tag name, if this is an element.
    pub fn tag(&self) -> Option<CompactString> {
        match &*self.0.kind.borrow() {
            NodeKind::Element(el) => Some(el.tag.clone()),
            _ => None,
        }
    }

    // ---------------------------------------------------------------------
    // Attributes
    // ---------------------------------------------------------------------

    /// Get an attribute value.
    pub fn attribute(&self, name: &str) -> Option<CompactString> {
        match &*self.0.kind.borrow() {
            NodeKind::Element(el) => el
                .attrs
                .iter()
                .find(|attr| attr.name == name)
                .map(|attr| attr.value.clone()),
            _ => None,
        }
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        match &*self.0.kind.borrow() {
            NodeKind::Element(el) => el.position(name).is_some(),
            _ => false,
        }
    }

    /// Attribute names in document order.
    pub fn attribute_names(&self) -> Vec<CompactString> {
        match &*self.0.kind.borrow() {
            NodeKind::Element(el) => el.attrs.iter().map(|attr| attr.name.clone()).collect(),
            _ => Vec::new(),
        }
    }

    /// Whether the element carries at least one attribute.
    pub fn has_attributes(&self) -> bool {
        match &*self.0.kind.borrow() {
            NodeKind::Element(el) => !el.attrs.is_empty(),
            _ => false,
        }
    }

    /// Set an attribute, replacing the value in place if it exists.
    /// No-op on non-element nodes.
    pub fn set_attribute(&self, name: &str, value: impl Into<CompactString>) {
        if let NodeKind::Element(el) = &mut *self.0.kind.borrow_mut() {
            let value = value.into();
            match el.position(name) {
                Some(i) => el.attrs[i].value = value,
                None => el.attrs.push(Attribute::new(name, value)),
            }
        }
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attribute(&self, name: &str) -> Option<CompactString> {
        if let NodeKind::Element(el) = &mut *self.0.kind.borrow_mut() {
            let i = el.position(name)?;
            return Some(el.attrs.remove(i).value);
        }
        None
    }

    /// Read one property from the `style` attribute.
    pub fn style_property(&self, property: &str) -> Option<CompactString> {
        let style = self.attribute("style")?;
        parse_style(&style)
            .into_iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value)
    }

    /// Set (or with `None`/empty, remove) one property of the `style` attribute.
    pub fn set_style_property(&self, property: &str, value: Option<&str>) {
        let mut declarations = self
            .attribute("style")
            .map(|style| parse_style(&style))
            .unwrap_or_default();
        let existing = declarations.iter().position(|(name, _)| name == property);

        match (value.filter(|v| !v.is_empty()), existing) {
            (Some(value), Some(i)) => declarations[i].1 = value.into(),
            (Some(value), None) => declarations.push((property.into(), value.into())),
            (None, Some(i)) => {
                declarations.remove(i);
            }
            (None, None) => return,
        }

        if declarations.is_empty() {
            self.remove_attribute("style");
        } else {
            self.set_attribute("style", serialize_style(&declarations));
        }
    }

    // ---------------------------------------------------------------------
    // Character data
    // ---------------------------------------------------------------------

    /// Text of a text node or data of a marker; empty for other kinds.
    pub fn node_value(&self) -> CompactString {
        match &*self.0.kind.borrow() {
            NodeKind::Text(value) | NodeKind::Marker(value) => value.clone(),
            _ => CompactString::default(),
        }
    }

    /// Replace the text of a text node or the data of a marker.
    pub fn set_node_value(&self, value: impl Into<CompactString>) {
        match &mut *self.0.kind.borrow_mut() {
            NodeKind::Text(current) | NodeKind::Marker(current) => *current = value.into(),
            _ => {}
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let NodeKind::Text(value) = &*self.0.kind.borrow() {
            out.push_str(value);
            return;
        }
        for child in self.0.children.borrow().iter() {
            child.collect_text(out);
        }
    }

    /// Split a text node at a byte offset.
    ///
    /// This node keeps the text before `offset`; a new text node holding the
    /// rest is inserted right after it (when attached) and returned. Offsets
    /// inside a multi-byte character are moved back to the character start.
    pub fn split_text(&self, offset: usize) -> Result<Node, TreeError> {
        let tail = {
            let mut kind = self.0.kind.borrow_mut();
            let NodeKind::Text(value) = &mut *kind else {
                return Err(TreeError::NotText);
            };
            let at = floor_char_boundary(value, offset);
            let tail = CompactString::from(&value[at..]);
            value.truncate(at);
            tail
        };

        let next = Node::text(tail);
        if let Some(parent) = self.parent() {
            let reference = self.next_sibling();
            parent.insert_before(&next, reference.as_ref())?;
        }
        Ok(next)
    }

    // ---------------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------------

    pub fn parent(&self) -> Option<Node> {
        self.0.parent.borrow().upgrade().map(Node)
    }

    /// Snapshot of the child list.
    pub fn children(&self) -> Vec<Node> {
        self.0.children.borrow().clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.children.borrow().len()
    }

    pub fn has_children(&self) -> bool {
        !self.0.children.borrow().is_empty()
    }

    pub fn child_at(&self, index: usize) -> Option<Node> {
        self.0.children.borrow().get(index).cloned()
    }

    pub fn first_child(&self) -> Option<Node> {
        self.0.children.borrow().first().cloned()
    }

    pub fn last_child(&self) -> Option<Node> {
        self.0.children.borrow().last().cloned()
    }

    /// Position of this node in its parent's child list.
    pub fn index_in_parent(&self) -> Option<usize> {
        let parent = self.parent()?;
        let children = parent.0.children.borrow();
        children.iter().position(|child| child.ptr_eq(self))
    }

    pub fn next_sibling(&self) -> Option<Node> {
        let parent = self.parent()?;
        let index = self.index_in_parent()?;
        parent.child_at(index + 1)
    }

    pub fn previous_sibling(&self) -> Option<Node> {
        let parent = self.parent()?;
        let index = self.index_in_parent()?;
        index.checked_sub(1).and_then(|i| parent.child_at(i))
    }

    /// Inclusive containment: a node contains itself.
    pub fn contains(&self, other: &Node) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if node.ptr_eq(self) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// All descendants in document (pre-)order, excluding this node.
    pub fn descendants(&self) -> Vec<Node> {
        let mut result = Vec::new();
        let mut stack: Vec<Node> = self.children().into_iter().rev().collect();

        while let Some(node) = stack.pop() {
            // Push children in reverse order so they're processed left-to-right
            stack.extend(node.children().into_iter().rev());
            result.push(node);
        }

        result
    }

    // ---------------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------------

    fn can_hold_children(&self) -> bool {
        matches!(self.node_type(), NodeType::Fragment | NodeType::Element)
    }

    /// Nodes that inserting `node` actually moves: a fragment donates its children.
    fn insertion_set(node: &Node) -> Vec<Node> {
        if node.is_fragment() {
            node.children()
        } else {
            vec![node.clone()]
        }
    }

    /// Append a child, detaching it from its previous parent first.
    /// Appending a fragment moves the fragment's children.
    pub fn append_child(&self, child: &Node) -> Result<(), TreeError> {
        self.insert_before(child, None)
    }

    /// Insert `node` before `reference` (or at the end when `None`).
    pub fn insert_before(&self, node: &Node, reference: Option<&Node>) -> Result<(), TreeError> {
        if !self.can_hold_children() || node.contains(self) {
            return Err(TreeError::HierarchyRequest);
        }
        if let Some(reference) = reference {
            if !reference.parent().is_some_and(|p| p.ptr_eq(self)) {
                return Err(TreeError::NotAChild);
            }
            if reference.ptr_eq(node) {
                return Ok(());
            }
        }

        let moving = Self::insertion_set(node);
        for item in &moving {
            item.detach();
        }

        let mut children = self.0.children.borrow_mut();
        let mut at = match reference {
            Some(reference) => children
                .iter()
                .position(|child| child.ptr_eq(reference))
                .ok_or(TreeError::NotAChild)?,
            None => children.len(),
        };
        for item in moving {
            *item.0.parent.borrow_mut() = Rc::downgrade(&self.0);
            children.insert(at, item);
            at += 1;
        }
        Ok(())
    }

    /// Remove a direct child.
    pub fn remove_child(&self, child: &Node) -> Result<(), TreeError> {
        let mut children = self.0.children.borrow_mut();
        let index = children
            .iter()
            .position(|c| c.ptr_eq(child))
            .ok_or(TreeError::NotAChild)?;
        let removed = children.remove(index);
        *removed.0.parent.borrow_mut() = Weak::new();
        Ok(())
    }

    /// Remove this node from its parent, if any.
    pub fn detach(&self) {
        if let Some(parent) = self.parent() {
            let _ = parent.remove_child(self);
        }
    }

    /// Put `replacement` at this node's position and detach this node.
    pub fn replace_with(&self, replacement: &Node) -> Result<(), TreeError> {
        let parent = self.parent().ok_or(TreeError::Detached)?;
        parent.insert_before(replacement, Some(self))?;
        parent.remove_child(self)
    }

    /// Detach every child.
    pub fn clear_children(&self) {
        let children = std::mem::take(&mut *self.0.children.borrow_mut());
        for child in children {
            *child.0.parent.borrow_mut() = Weak::new();
        }
    }

    /// Structural deep copy. The copy is parentless.
    pub fn clone_deep(&self) -> Node {
        let copy = Node::with_kind(self.kind());
        {
            let mut copy_children = copy.0.children.borrow_mut();
            for child in self.0.children.borrow().iter() {
                let child_copy = child.clone_deep();
                *child_copy.0.parent.borrow_mut() = Rc::downgrade(&copy.0);
                copy_children.push(child_copy);
            }
        }
        copy
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0.kind.borrow() {
            NodeKind::Fragment => write!(f, "Fragment({} children)", self.child_count()),
            NodeKind::Element(el) => write!(f, "<{}>({} children)", el.tag, self.child_count()),
            NodeKind::Text(value) => write!(f, "Text({:?})", value),
            NodeKind::Marker(data) => write!(f, "Marker({:?})", data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Node {
        let ul = Node::element("ul");
        for item in items {
            let li = Node::element("li");
            li.append_child(&Node::text(*item)).unwrap();
            ul.append_child(&li).unwrap();
        }
        ul
    }

    #[test]
    fn test_append_sets_parent() {
        let ul = list(&["a"]);
        let li = ul.first_child().unwrap();
        assert!(li.parent().unwrap().ptr_eq(&ul));
        assert_eq!(li.index_in_parent(), Some(0));
    }

    #[test]
    fn test_append_moves_between_parents() {
        let a = list(&["x"]);
        let b = Node::element("div");
        let li = a.first_child().unwrap();
        b.append_child(&li).unwrap();
        assert_eq!(a.child_count(), 0);
        assert!(li.parent().unwrap().ptr_eq(&b));
    }

    #[test]
    fn test_insert_fragment_moves_children() {
        let ul = list(&["c"]);
        let frag = Node::fragment();
        frag.append_child(&Node::element("li")).unwrap();
        frag.append_child(&Node::element("li")).unwrap();
        let first = ul.first_child();
        ul.insert_before(&frag, first.as_ref()).unwrap();
        assert_eq!(ul.child_count(), 3);
        assert_eq!(frag.child_count(), 0);
        assert_eq!(ul.last_child().unwrap().text_content(), "c");
    }

    #[test]
    fn test_insert_before_foreign_reference() {
        let ul = list(&["a"]);
        let stranger = Node::element("li");
        let result = ul.insert_before(&Node::text("x"), Some(&stranger));
        assert_eq!(result, Err(TreeError::NotAChild));
    }

    #[test]
    fn test_insert_ancestor_rejected() {
        let ul = list(&["a"]);
        let li = ul.first_child().unwrap();
        assert_eq!(li.append_child(&ul), Err(TreeError::HierarchyRequest));
    }

    #[test]
    fn test_split_text() {
        let p = Node::element("p");
        let text = Node::text("hello world");
        p.append_child(&text).unwrap();
        let tail = text.split_text(5).unwrap();
        assert_eq!(text.node_value(), "hello");
        assert_eq!(tail.node_value(), " world");
        assert_eq!(p.child_count(), 2);
        assert!(text.next_sibling().unwrap().ptr_eq(&tail));
    }

    #[test]
    fn test_split_non_text() {
        assert_eq!(
            Node::element("p").split_text(0).unwrap_err(),
            TreeError::NotText
        );
    }

    #[test]
    fn test_replace_with() {
        let ul = list(&["a", "b"]);
        let first = ul.first_child().unwrap();
        let marker = Node::marker("");
        first.replace_with(&marker).unwrap();
        assert!(ul.first_child().unwrap().ptr_eq(&marker));
        assert!(first.parent().is_none());
        assert_eq!(ul.child_count(), 2);
    }

    #[test]
    fn test_clone_deep_is_congruent() {
        let ul = list(&["a", "b"]);
        ul.set_attribute("class", "items");
        let copy = ul.clone_deep();
        assert!(!copy.ptr_eq(&ul));
        assert_eq!(copy.child_count(), 2);
        assert_eq!(copy.attribute("class").as_deref(), Some("items"));
        assert_eq!(copy.child_at(1).unwrap().text_content(), "b");
        assert!(copy.child_at(1).unwrap().parent().unwrap().ptr_eq(&copy));
    }

    #[test]
    fn test_attributes() {
        let div = Node::element("div");
        div.set_attribute("id", "a");
        div.set_attribute("class", "b");
        div.set_attribute("id", "c");
        assert_eq!(div.attribute_names(), vec!["id", "class"]);
        assert_eq!(div.remove_attribute("id").as_deref(), Some("c"));
        assert!(!div.has_attribute("id"));
        assert_eq!(div.remove_attribute("missing"), None);
    }

    #[test]
    fn test_style_properties() {
        let div = Node::element("div");
        div.set_style_property("color", Some("red"));
        div.set_style_property("width", Some("10px"));
        assert_eq!(div.attribute("style").as_deref(), Some("color: red; width: 10px"));
        div.set_style_property("color", None);
        assert_eq!(div.style_property("color"), None);
        div.set_style_property("width", Some(""));
        assert!(!div.has_attribute("style"));
    }

    #[test]
    fn test_descendants_preorder() {
        let ul = list(&["a", "b"]);
        let order: Vec<String> = ul
            .descendants()
            .iter()
            .map(|n| match n.kind() {
                NodeKind::Element(el) => el.tag.to_string(),
                NodeKind::Text(t) => t.to_string(),
                _ => String::new(),
            })
            .collect();
        assert_eq!(order, vec!["li", "a", "li", "b"]);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let ul = list(&["a"]);
        let text = ul.first_child().unwrap().first_child().unwrap();
        assert!(ul.contains(&text));
        assert!(ul.contains(&ul));
        assert!(!text.contains(&ul));
    }
}
