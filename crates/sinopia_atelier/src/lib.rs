//! Atelier - The workshop where Sinopia templates come alive.
//!
//! The atelier compiles a template tree once into a [`BindingMap`] and binds
//! any number of deep clones of it to observable data:
//!
//! - [`scanner`] isolates `{{ expr }}` tokens as placeholders
//! - [`matcher`] applies directive kinds to elements
//! - [`compiler`] walks the tree and records bound nodes as [`NodePath`]s
//! - [`instantiate`] resolves those paths in a clone and creates handlers
//! - [`updater`] coalesces re-evaluation onto the tick scheduler
//! - [`directives`] holds `text`, `attr`, `style` and the `each` list engine
//!
//! # Example
//!
//! ```
//! use sinopia_atelier::{DirectiveSet, Runtime};
//! use sinopia_tempera::{Object, Value};
//!
//! let runtime = Runtime::new(DirectiveSet::standard());
//! let data = Object::from_entries([("name", Value::from("Ada"))]);
//! let view = runtime.render_markup("<p>Hello {{ name }}</p>", &data);
//! runtime.run_until_idle(8);
//! assert_eq!(view.html(), "<p>Hello Ada<!----></p>");
//! ```
//!
//! [`NodePath`]: sinopia_relief::NodePath

pub mod binding;
pub mod compiler;
pub mod directive;
pub mod directives;
pub mod errors;
pub mod expression;
pub mod instantiate;
pub mod matcher;
pub mod runtime;
pub mod scanner;
pub mod template;
pub mod updater;
pub mod view;

pub use binding::{Binding, BindingDescription, BindingMap};
pub use compiler::{compile, CompileStats, Compiler};
pub use directive::{Directive, DirectiveKind, DirectiveSet, NodeHandler};
pub use directives::{EachHandler, KeyIdentity, LoopPhase, RowKey};
pub use errors::{DirectiveSetError, ExpressionError};
pub use expression::Expression;
pub use instantiate::instantiate;
pub use runtime::Runtime;
pub use scanner::TOKEN_MARKER;
pub use template::Template;
pub use updater::Updater;
pub use view::{View, ROOT_DATA_KEY};
