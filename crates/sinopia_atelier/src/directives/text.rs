//! `{{ expr }}` text binding.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use compact_str::CompactString;
use sinopia_relief::Node;
use sinopia_tempera::Object;

use super::parse_logged;
use crate::directive::{Directive, NodeHandler};
use crate::expression::Expression;
use crate::runtime::Runtime;
use crate::updater::Updater;

pub struct TextDirective {
    source: CompactString,
    expression: Option<Rc<Expression>>,
}

impl TextDirective {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.into(),
            expression: parse_logged("text", source),
        }
    }
}

impl Directive for TextDirective {
    fn kind(&self) -> &'static str {
        "text"
    }

    fn describe(&self) -> String {
        format!("text:{{{{ {} }}}}", self.source)
    }

    fn node_handler(&self, node: &Node, runtime: &Rc<Runtime>) -> Rc<dyn NodeHandler> {
        Rc::new(TextHandler::new(self.expression.clone(), node, runtime))
    }
}

/// Replaces a token placeholder with a text node and keeps it current.
pub struct TextHandler {
    text: Node,
    updater: Option<Updater>,
    destroyed: Cell<bool>,
}

impl TextHandler {
    fn new(expression: Option<Rc<Expression>>, placeholder: &Node, runtime: &Rc<Runtime>) -> Self {
        let text = Node::text("");
        if placeholder.replace_with(&text).is_err() {
            tracing::error!("token placeholder has no parent");
        }

        let updater = expression.map(|expression| {
            let target = text.clone();
            Updater::new(runtime.scheduler().clone(), expression, move |value, _| {
                let rendered = value.to_display_string();
                if target.node_value() != rendered {
                    target.set_node_value(rendered);
                }
            })
        });
        Self {
            text,
            updater,
            destroyed: Cell::new(false),
        }
    }

    pub fn text(&self) -> &Node {
        &self.text
    }

    pub fn updater(&self) -> Option<&Updater> {
        self.updater.as_ref()
    }
}

impl NodeHandler for TextHandler {
    fn render(&self, data: &Object) {
        if let Some(updater) = &self.updater {
            updater.update(Some(data));
        }
    }

    fn destroy(&self) {
        self.destroyed.set(true);
        if let Some(updater) = &self.updater {
            updater.destroy();
        }
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
