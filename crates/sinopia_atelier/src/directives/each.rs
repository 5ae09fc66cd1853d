//! `_each` list directive.
//!
//! `_each` manages its element: the compiler swaps the element for a marker
//! carrying the element's markup, and that markup becomes the row template.
//! An optional `_key="expr"` on the element switches the loop to keyed
//! reconciliation.

use std::rc::Rc;

use compact_str::CompactString;
use once_cell::sync::Lazy;
use regex::Regex;
use sinopia_carton::is_valid_ident;
use sinopia_relief::Node;

use super::list::EachHandler;
use super::parse_logged;
use crate::directive::{Directive, DirectiveKind, NodeHandler};
use crate::expression::Expression;
use crate::runtime::Runtime;

pub const EACH_ATTR: &str = "_each";
pub const KEY_ATTR: &str = "_key";

static LOOP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\(?\s*(.+?)\s*\)?\s+(?:of|in)\s+(.+)$").unwrap()
});

/// `(item, index) of source`, split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopExpression {
    /// One to three iterator names
    pub args: Vec<CompactString>,
    pub source: CompactString,
}

/// Split a loop expression. `None` when it does not have the loop shape or
/// the names are not identifiers.
pub fn parse_loop_expression(input: &str) -> Option<LoopExpression> {
    let captures = LOOP_RE.captures(input.trim())?;
    let args: Vec<CompactString> = captures
        .get(1)?
        .as_str()
        .split(',')
        .map(|arg| CompactString::from(arg.trim()))
        .collect();
    if args.len() > 3 || !args.iter().all(|arg| is_valid_ident(arg)) {
        return None;
    }
    Some(LoopExpression {
        args,
        source: captures.get(2)?.as_str().trim().into(),
    })
}

pub struct EachDirectiveKind;

impl DirectiveKind for EachDirectiveKind {
    fn name(&self) -> &'static str {
        "each"
    }

    fn matches(&self, element: &Node) -> Option<CompactString> {
        element.has_attribute(EACH_ATTR).then(|| EACH_ATTR.into())
    }

    fn manages(&self) -> bool {
        true
    }

    fn create(&self, _attr: &str, value: &str) -> Rc<dyn Directive> {
        Rc::new(EachDirective::new(value))
    }
}

pub struct EachDirective {
    source: CompactString,
    args: Vec<CompactString>,
    expression: Option<Rc<Expression>>,
}

impl EachDirective {
    pub fn new(source: &str) -> Self {
        let (args, expression) = match parse_loop_expression(source) {
            Some(parsed) => (parsed.args, parse_logged("each", &parsed.source)),
            None => {
                tracing::warn!(source, "malformed loop expression; the loop renders nothing");
                (Vec::new(), None)
            }
        };
        Self {
            source: source.into(),
            args,
            expression,
        }
    }

    pub fn args(&self) -> &[CompactString] {
        &self.args
    }
}

impl Directive for EachDirective {
    fn kind(&self) -> &'static str {
        "each"
    }

    fn describe(&self) -> String {
        format!("each:\"{}\"", self.source)
    }

    fn node_handler(&self, node: &Node, runtime: &Rc<Runtime>) -> Rc<dyn NodeHandler> {
        Rc::new(EachHandler::new(
            self.args.clone(),
            self.expression.clone(),
            node,
            runtime,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(input: &str) -> Option<(Vec<String>, String)> {
        parse_loop_expression(input).map(|l| {
            (
                l.args.iter().map(|a| a.to_string()).collect(),
                l.source.to_string(),
            )
        })
    }

    #[test]
    fn test_loop_expression_forms() {
        assert_eq!(
            parsed("item of items"),
            Some((vec!["item".into()], "items".into()))
        );
        assert_eq!(
            parsed("(item, i) of list.rows"),
            Some((vec!["item".into(), "i".into()], "list.rows".into()))
        );
        assert_eq!(
            parsed("( value , key , n ) in settings"),
            Some((
                vec!["value".into(), "key".into(), "n".into()],
                "settings".into()
            ))
        );
        assert_eq!(
            parsed("entry in inventory"),
            Some((vec!["entry".into()], "inventory".into()))
        );
    }

    #[test]
    fn test_malformed_loop_expressions() {
        assert_eq!(parsed("items"), None);
        assert_eq!(parsed("item of"), None);
        assert_eq!(parsed("(a, b, c, d) of xs"), None);
        assert_eq!(parsed("1x of xs"), None);
    }

    #[test]
    fn test_malformed_directive_has_no_source() {
        let directive = EachDirective::new("just nonsense");
        assert!(directive.args().is_empty());
        assert!(directive.expression.is_none());
    }
}
