//! `b:attr.<name>` attribute binding.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use compact_str::CompactString;
use sinopia_relief::Node;
use sinopia_tempera::{Object, Value};

use super::parse_logged;
use crate::directive::{Directive, DirectiveKind, NodeHandler};
use crate::expression::Expression;
use crate::runtime::Runtime;
use crate::updater::Updater;

pub const ATTR_PREFIX: &str = "b:attr.";

pub struct AttrDirectiveKind;

impl DirectiveKind for AttrDirectiveKind {
    fn name(&self) -> &'static str {
        "attr"
    }

    fn matches(&self, element: &Node) -> Option<CompactString> {
        element
            .attribute_names()
            .into_iter()
            .find(|name| name.len() > ATTR_PREFIX.len() && name.starts_with(ATTR_PREFIX))
    }

    fn create(&self, attr: &str, value: &str) -> Rc<dyn Directive> {
        Rc::new(AttrDirective::new(attr.strip_prefix(ATTR_PREFIX).unwrap_or(attr), value))
    }
}

pub struct AttrDirective {
    name: CompactString,
    source: CompactString,
    expression: Option<Rc<Expression>>,
}

impl AttrDirective {
    pub fn new(name: &str, source: &str) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            expression: parse_logged("attr", source),
        }
    }

    /// Target attribute name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Directive for AttrDirective {
    fn kind(&self) -> &'static str {
        "attr"
    }

    fn describe(&self) -> String {
        format!("attr:{}=\"{}\"", self.name, self.source)
    }

    fn node_handler(&self, node: &Node, runtime: &Rc<Runtime>) -> Rc<dyn NodeHandler> {
        let updater = self.expression.clone().map(|expression| {
            let element = node.clone();
            let name = self.name.clone();
            Updater::new(runtime.scheduler().clone(), expression, move |value, _| {
                apply_attribute(&element, &name, value)
            })
        });
        Rc::new(AttrHandler {
            updater,
            destroyed: Cell::new(false),
        })
    }
}

/// Truthy values set the attribute to their string form, falsy values remove it.
fn apply_attribute(element: &Node, name: &str, value: &Value) {
    if value.is_truthy() {
        let rendered = value.to_js_string();
        if element.attribute(name).as_ref() != Some(&rendered) {
            element.set_attribute(name, rendered);
        }
    } else if element.has_attribute(name) {
        element.remove_attribute(name);
    }
}

pub struct AttrHandler {
    updater: Option<Updater>,
    destroyed: Cell<bool>,
}

impl NodeHandler for AttrHandler {
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
