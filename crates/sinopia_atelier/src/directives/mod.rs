//! Built-in directives.
//!
//! | Kind    | Syntax                          | Target                        |
//! |---------|---------------------------------|-------------------------------|
//! | `text`  | `{{ expr }}` in text            | token placeholder             |
//! | `attr`  | `b:attr.<name>="expr"`          | one attribute                 |
//! | `style` | `b:style="{ prop: expr }"`      | properties of `style`         |
//! | `each`  | `_each="(item, i) of list"`     | the element, repeated per row |

mod attr;
mod each;
mod list;
mod style;
mod text;

use std::rc::Rc;

pub use attr::{AttrDirective, AttrDirectiveKind, AttrHandler, ATTR_PREFIX};
pub use each::{parse_loop_expression, EachDirective, EachDirectiveKind, LoopExpression, EACH_ATTR, KEY_ATTR};
pub use list::{EachHandler, KeyIdentity, LoopPhase, RowKey};
pub use style::{StyleDirective, StyleDirectiveKind, StyleHandler, STYLE_ATTR};
pub use text::{TextDirective, TextHandler};

use crate::expression::Expression;

/// Parse a directive expression, logging instead of failing.
pub(crate) fn parse_logged(kind: &'static str, source: &str) -> Option<Rc<Expression>> {
    match Expression::parse(source) {
        Ok(expression) => Some(Rc::new(expression)),
        Err(error) => {
            tracing::warn!(directive = kind, source, %error, "invalid directive expression");
            None
        }
    }
}
