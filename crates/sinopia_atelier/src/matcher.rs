//! Directive matcher.
//!
//! Applies one directive kind to one element: claims matching attributes,
//! strips them from the element and, for managing kinds, swaps the element
//! for a placeholder marker that carries the element's markup.

use std::rc::Rc;

use compact_str::CompactString;
use sinopia_carton::FxHashMap;
use sinopia_relief::Node;

use crate::directive::{Directive, DirectiveKind};
use crate::directives::TextDirective;

/// Per-compile-run cache of directive instances.
///
/// Instances are keyed by `(kind position, attribute, value)` and by token
/// text, so identical expressions within one template share one instance.
/// Managing kinds are memoized the same way; their per-occurrence state lives
/// in the node handler, not the instance.
#[derive(Default)]
pub struct DirectiveMemo {
    attributes: FxHashMap<(usize, CompactString, CompactString), Rc<dyn Directive>>,
    tokens: FxHashMap<CompactString, Rc<dyn Directive>>,
}

impl DirectiveMemo {
    pub fn for_attribute(
        &mut self,
        kind_index: usize,
        kind: &dyn DirectiveKind,
        attr: &str,
        value: &str,
    ) -> Rc<dyn Directive> {
        self.attributes
            .entry((kind_index, attr.into(), value.into()))
            .or_insert_with(|| kind.create(attr, value))
            .clone()
    }

    pub fn for_token(&mut self, expression: &str) -> Rc<dyn Directive> {
        self.tokens
            .entry(expression.into())
            .or_insert_with(|| Rc::new(TextDirective::new(expression)))
            .clone()
    }

    /// Distinct instances created so far.
    pub fn len(&self) -> usize {
        self.attributes.len() + self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What applying a kind did to the element
#[derive(Debug)]
pub enum MatchOutcome {
    /// No attribute matched
    Unmatched,
    /// Directives were bound to the element itself
    Bound(usize),
    /// The element was replaced by this placeholder
    Managed(Node),
}

/// Apply `kind` to `element`, reporting each instance through `record`.
pub fn apply_directive_kind(
    kind_index: usize,
    kind: &dyn DirectiveKind,
    element: &Node,
    memo: &mut DirectiveMemo,
    record: &mut dyn FnMut(&Node, Rc<dyn Directive>),
) -> MatchOutcome {
    let mut bound = 0;

    while let Some(attr) = kind.matches(element) {
        let raw = element.remove_attribute(&attr);
        let Some(raw) = raw else {
            // A matcher naming an absent attribute would loop forever
            tracing::warn!(directive = kind.name(), %attr, "matcher claimed a missing attribute");
            break;
        };
        let value = raw.trim();
        let directive = memo.for_attribute(kind_index, kind, &attr, value);

        if !kind.manages() {
            record(element, directive);
            bound += 1;
            continue;
        }

        let Some(parent) = element.parent() else {
            tracing::warn!(
                directive = kind.name(),
                "managing directive on a parentless root is ignored"
            );
            break;
        };

        let placeholder = Node::marker(element.outer_html());
        if parent.insert_before(&placeholder, Some(element)).is_err() {
            break;
        }
        element.detach();
        record(&placeholder, directive);
        return MatchOutcome::Managed(placeholder);
    }

    if bound == 0 {
        MatchOutcome::Unmatched
    } else {
        MatchOutcome::Bound(bound)
    }
}
