//! Template compiler.
//!
//! One depth-first pass over a template tree. Each element is offered to the
//! directive kinds in set order, then its direct text children are scanned
//! for tokens, then its child elements are visited. Bound nodes are recorded
//! by reference during the walk and converted to [`NodePath`]s at the end,
//! after every structural edit the pass makes has happened.

use std::rc::Rc;

use indexmap::IndexMap;
use sinopia_relief::{Node, NodePath};

use crate::binding::{Binding, BindingMap};
use crate::directive::{Directive, DirectiveSet};
use crate::matcher::{apply_directive_kind, DirectiveMemo, MatchOutcome};
use crate::scanner::split_tokens;

/// Counters from one compile run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileStats {
    pub elements: usize,
    pub tokens: usize,
    pub managed: usize,
}

pub struct Compiler<'a> {
    directives: &'a DirectiveSet,
    memo: DirectiveMemo,
    pending: IndexMap<Node, Vec<Rc<dyn Directive>>>,
    stats: CompileStats,
}

impl<'a> Compiler<'a> {
    pub fn new(directives: &'a DirectiveSet) -> Self {
        Self {
            directives,
            memo: DirectiveMemo::default(),
            pending: IndexMap::new(),
            stats: CompileStats::default(),
        }
    }

    /// Compile `root` in place and return its binding map.
    ///
    /// `root` is usually a fragment holding template content. An element root
    /// is itself offered to the directive kinds.
    pub fn compile(mut self, root: &Node) -> BindingMap {
        if let Some(position) = self.directives.position("each") {
            if position != 0 {
                tracing::warn!(
                    position,
                    order = %self.directives.signature(),
                    "`each` is not the first directive; other directives may claim attributes of loop elements"
                );
            }
        }

        self.visit(root);

        let mut bindings = Vec::with_capacity(self.pending.len());
        for (node, directives) in std::mem::take(&mut self.pending) {
            match NodePath::of(&node, root) {
                Some(path) => bindings.push(Binding { path, directives }),
                None => tracing::error!(
                    node = %node.outer_html(),
                    "bound node is no longer under the template root"
                ),
            }
        }

        tracing::debug!(
            elements = self.stats.elements,
            tokens = self.stats.tokens,
            managed = self.stats.managed,
            bindings = bindings.len(),
            instances = self.memo.len(),
            "template compiled"
        );
        BindingMap::new(bindings)
    }

    fn visit(&mut self, node: &Node) {
        if node.is_element() {
            self.stats.elements += 1;
            if self.apply_directives(node) {
                return;
            }
        }

        let children = node.children();
        for child in children.iter().filter(|c| c.is_text()) {
            self.scan_text(child);
        }
        for child in children.iter().filter(|c| c.is_element()) {
            self.visit(child);
        }
    }

    /// Returns `true` when a managing kind replaced the element.
    fn apply_directives(&mut self, element: &Node) -> bool {
        let directives = self.directives;
        for (index, kind) in directives.kinds().iter().enumerate() {
            let pending = &mut self.pending;
            let outcome = apply_directive_kind(
                index,
                kind.as_ref(),
                element,
                &mut self.memo,
                &mut |node, directive| {
                    pending.entry(node.clone()).or_default().push(directive);
                },
            );
            if let MatchOutcome::Managed(_) = outcome {
                self.stats.managed += 1;
                return true;
            }
        }
        false
    }

    fn scan_text(&mut self, text: &Node) {
        for (placeholder, token) in split_tokens(text) {
            self.stats.tokens += 1;
            let directive = self.memo.for_token(&token.expression);
            self.pending.entry(placeholder).or_default().push(directive);
        }
    }
}

/// Compile `root` in place against `directives`.
pub fn compile(root: &Node, directives: &DirectiveSet) -> BindingMap {
    Compiler::new(directives).compile(root)
}
