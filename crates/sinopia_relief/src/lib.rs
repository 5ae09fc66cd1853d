//! Relief - The sculptured node tree for Sinopia.
//!
//! A relief is carved into the wall itself: this crate holds the live tree that
//! templates are compiled against and that bound views mutate. Nodes are shared
//! handles (`Node` is a cheap `Rc` clone) so a compiled binding, a running
//! directive and the caller can all point at the same node.
//!
//! # Node kinds
//!
//! - **Fragment**: a parentless container (template content, rendered rows)
//! - **Element**: tag name plus ordered attributes
//! - **Text**: character data
//! - **Marker**: an inert placeholder carrying opaque data, serialized as a comment
//!
//! # Paths
//!
//! [`NodePath`] addresses a node by the child index taken at every level below
//! a root. A path computed on a compiled tree resolves to the congruent node
//! in any deep clone of that tree.

mod errors;
mod node;
mod path;
mod serialize;
mod style;

pub use errors::TreeError;
pub use node::{Attribute, ElementData, Node, NodeKind, NodeType};
pub use path::NodePath;
pub use serialize::{inner_html, outer_html};
pub use style::{parse_style, serialize_style};
