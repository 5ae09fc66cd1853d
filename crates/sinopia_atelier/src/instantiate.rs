//! Binding instantiation.

use std::rc::Rc;

use sinopia_relief::Node;

use crate::binding::{Binding, BindingMap};
use crate::directive::NodeHandler;
use crate::runtime::Runtime;

/// Create the node handlers for one instance.
///
/// Every path is resolved against `root` before any handler is created:
/// handlers replace nodes (placeholders become text nodes or loop anchors),
/// and that must not shift later lookups. A path that does not resolve is
/// logged and skipped.
pub fn instantiate(root: &Node, bindings: &BindingMap, runtime: &Rc<Runtime>) -> Vec<Rc<dyn NodeHandler>> {
    let resolved: Vec<(Node, &Binding)> = bindings
        .iter()
        .filter_map(|binding| match binding.path.resolve(root) {
            Some(node) => Some((node, binding)),
            None => {
                tracing::error!(
                    path = %binding.path,
                    "binding path does not resolve in this instance; skipping"
                );
                None
            }
        })
        .collect();

    let mut handlers = Vec::with_capacity(bindings.directive_count());
    for (node, binding) in resolved {
        for directive in &binding.directives {
            handlers.push(directive.node_handler(&node, runtime));
        }
    }

    tracing::debug!(
        bindings = bindings.len(),
        handlers = handlers.len(),
        "instance bound"
    );
    handlers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Template;
    use sinopia_armature::ParserOptions;
    use sinopia_relief::NodePath;

    #[test]
    fn test_unresolvable_path_is_skipped() {
        let runtime = Runtime::new(Default::default());
        let template = Template::parse(
            "<p>{{ a }}</p><b b:attr.title=\"t\"></b>",
            ParserOptions::default(),
            runtime.directives(),
        );
        let content = template.instantiate_content();
        // Drop the <b> so its path no longer resolves
        content.last_child().unwrap().detach();

        let handlers = instantiate(&content, template.bindings(), &runtime);
        assert_eq!(handlers.len(), 1);
        assert!(NodePath::from_indices([1]).resolve(&content).is_none());
        assert_eq!(content.inner_html(), "<p><!----><!----></p>");
    }
}
