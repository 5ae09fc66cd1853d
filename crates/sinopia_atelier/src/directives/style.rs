//! `b:style` style-map binding.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use compact_str::CompactString;
use sinopia_relief::Node;
use sinopia_tempera::{Object, Tracker, Value};

use super::parse_logged;
use crate::directive::{Directive, DirectiveKind, NodeHandler};
use crate::expression::Expression;
use crate::runtime::Runtime;
use crate::updater::Updater;

pub const STYLE_ATTR: &str = "b:style";

pub struct StyleDirectiveKind;

impl DirectiveKind for StyleDirectiveKind {
    fn name(&self) -> &'static str {
        "style"
    }

    fn matches(&self, element: &Node) -> Option<CompactString> {
        element.has_attribute(STYLE_ATTR).then(|| STYLE_ATTR.into())
    }

    fn create(&self, _attr: &str, value: &str) -> Rc<dyn Directive> {
        Rc::new(StyleDirective::new(value))
    }
}

pub struct StyleDirective {
    source: CompactString,
    expression: Option<Rc<Expression>>,
}

impl StyleDirective {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.into(),
            expression: parse_logged("style", source),
        }
    }
}

impl Directive for StyleDirective {
    fn kind(&self) -> &'static str {
        "style"
    }

    fn describe(&self) -> String {
        format!("style:\"{}\"", self.source)
    }

    fn node_handler(&self, node: &Node, runtime: &Rc<Runtime>) -> Rc<dyn NodeHandler> {
        let updater = self.expression.clone().map(|expression| {
            let element = node.clone();
            Updater::new(runtime.scheduler().clone(), expression, move |value, tracker| {
                apply_style(&element, value, tracker)
            })
        });
        Rc::new(StyleHandler {
            updater,
            destroyed: Cell::new(false),
        })
    }
}

/// `fontSize` -> `font-size`. Already dashed names pass through.
pub(crate) fn css_property_name(key: &str) -> CompactString {
    let mut out = CompactString::with_capacity(key.len() + 2);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

fn apply_style(element: &Node, value: &Value, tracker: &Tracker) {
    let styles = match value {
        Value::Object(styles) => styles,
        Value::Undefined | Value::Null => return,
        other => {
            tracing::warn!(
                value = other.type_name(),
                "style binding expects an object of properties"
            );
            return;
        }
    };

    for (key, value) in styles.entries(Some(tracker)) {
        let property = css_property_name(&key);
        let rendered = value.to_display_string();
        if rendered.is_empty() {
            if element.style_property(&property).is_some() {
                element.set_style_property(&property, None);
            }
        } else if element.style_property(&property).as_ref() != Some(&rendered) {
            element.set_style_property(&property, Some(rendered.as_str()));
        }
    }
}

pub struct StyleHandler {
    updater: Option<Updater>,
    destroyed: Cell<bool>,
}

impl NodeHandler for StyleHandler {
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
