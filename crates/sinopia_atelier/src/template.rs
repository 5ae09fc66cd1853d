//! Compiled templates.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use compact_str::CompactString;
use sinopia_armature::{parse_template, ParseError, ParserOptions};
use sinopia_relief::Node;

use crate::binding::BindingMap;
use crate::compiler::compile;
use crate::directive::DirectiveSet;
use crate::directives::KEY_ATTR;

static NEXT_TEMPLATE_ID: AtomicU64 = AtomicU64::new(1);

/// Template content compiled once, instantiated any number of times.
///
/// The content has its directive attributes stripped and its tokens replaced
/// by placeholders. Instances are deep clones of it, so every path in the
/// binding map resolves the same way in each.
pub struct Template {
    id: u64,
    content: Node,
    bindings: BindingMap,
    errors: Vec<ParseError>,
}

impl Template {
    /// Parse `markup` and compile it.
    pub fn parse(markup: &str, options: ParserOptions, directives: &DirectiveSet) -> Self {
        let (content, errors) = parse_template(markup, options);
        for error in &errors {
            tracing::debug!(code = ?error.code, offset = error.offset, "template markup recovered");
        }
        let mut template = Self::compile(content, directives);
        template.errors = errors;
        template
    }

    /// Compile existing content. A non-fragment node is wrapped in a fragment.
    pub fn compile(content: Node, directives: &DirectiveSet) -> Self {
        let content = if content.is_fragment() {
            content
        } else {
            let fragment = Node::fragment();
            if let Err(error) = fragment.append_child(&content) {
                tracing::error!(%error, "could not wrap template content");
            }
            fragment
        };
        let bindings = compile(&content, directives);
        Self {
            id: NEXT_TEMPLATE_ID.fetch_add(1, Ordering::Relaxed),
            content,
            bindings,
            errors: Vec::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// The compiled content. Treat as read-only.
    pub fn content(&self) -> &Node {
        &self.content
    }

    pub fn bindings(&self) -> &BindingMap {
        &self.bindings
    }

    /// Markup problems recovered from while parsing
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// A fresh deep copy of the content for one instance.
    pub fn instantiate_content(&self) -> Node {
        self.content.clone_deep()
    }

    /// The compiled content as markup.
    pub fn html(&self) -> String {
        self.content.inner_html()
    }

    /// The key expression when the content is a single element carrying the
    /// reserved key attribute.
    pub fn root_key(&self) -> Option<CompactString> {
        let mut elements = self.content.children().into_iter().filter(|child| {
            !(child.is_text() && sinopia_carton::is_whitespace_only(&child.node_value()))
        });
        match (elements.next(), elements.next()) {
            (Some(root), None) if root.is_element() => root.attribute(KEY_ATTR),
            _ => None,
        }
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("id", &self.id)
            .field("bindings", &self.bindings.len())
            .field("errors", &self.errors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(markup: &str) -> Template {
        Template::parse(markup, ParserOptions::default(), &DirectiveSet::standard())
    }

    #[test]
    fn test_template_root_unwrapped() {
        let t = template("<template><b>{{ x }}</b></template>");
        assert_eq!(t.html(), "<b><!----><!--sinopia:token--><!----></b>");
        assert_eq!(t.bindings().len(), 1);
    }

    #[test]
    fn test_instances_are_independent_copies() {
        let t = template("<p>{{ x }}</p>");
        let a = t.instantiate_content();
        let b = t.instantiate_content();
        assert!(!a.ptr_eq(&b));
        assert_eq!(a.inner_html(), b.inner_html());
        a.clear_children();
        assert_eq!(t.content().child_count(), 1);
    }

    #[test]
    fn test_root_key() {
        assert_eq!(template(r#"<li _key="item.id">x</li>"#).root_key().as_deref(), Some("item.id"));
        assert_eq!(template(r#"<li _key="a"></li><li></li>"#).root_key(), None);
        assert_eq!(template("<li></li>").root_key(), None);
    }

    #[test]
    fn test_parse_errors_are_kept() {
        let t = template("<div><span></div>");
        assert!(!t.errors().is_empty());
    }
}
