//! # Sinopia
//!
//! Reactive template binding written in Rust.
//!
//! This crate re-exports all Sinopia sub-crates for unified documentation.
//!
//! ## Crates
//!
//! - [`carton`] - Shared utilities, hashing and tag tables
//! - [`relief`] - The live node tree, paths and serialization
//! - [`armature`] - Markup tokenizer and tree builder
//! - [`tempera`] - Observable values, dependency trackers and the tick queue
//! - [`atelier`] - Template compiler, directives and the binding runtime

/// Shared utilities, hashing and tag tables.
pub use sinopia_carton as carton;

/// The live node tree, paths and serialization.
pub use sinopia_relief as relief;

/// Markup tokenizer and tree builder.
pub use sinopia_armature as armature;

/// Observable values, dependency trackers and the tick queue.
pub use sinopia_tempera as tempera;

/// Template compiler, directives and the binding runtime.
pub use sinopia_atelier as atelier;
