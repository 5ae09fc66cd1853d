//! Tempera - Observable data for Sinopia.
//!
//! Tempera is pigment bound in egg yolk: the medium that carries colour onto
//! the panel. This crate carries data into bound views:
//!
//! - [`Value`]: a JSON-like dynamic value whose objects and arrays are shared,
//!   observable handles
//! - [`Tracker`]: an explicit dependency-tracking handle passed to reads;
//!   a read with a tracker subscribes it, a later write notifies it
//! - [`Scheduler`]: the tick queue (`next_tick` / `flush`) that batches
//!   reactive work
//!
//! There is no ambient "current tracker". Every read that should subscribe
//! takes the tracker as an argument, so the dependency graph is visible at
//! each call site.
//!
//! ```text
//! Object::get(key, Some(&tracker))  ──subscribes──▶  tracker
//! Object::set(key, value)           ──notifies────▶  tracker callback
//! ```

mod array;
mod object;
mod scheduler;
mod tracker;
mod value;

pub use array::Array;
pub use object::Object;
pub use scheduler::Scheduler;
pub use tracker::Tracker;
pub use value::Value;
