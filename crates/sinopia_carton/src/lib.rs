//! Carton - The artist's toolbox for Sinopia.
//!
//! This crate provides the foundational utilities shared by every Sinopia crate,
//! much like a carton (artist's portfolio case) holds the essential tools an
//! artist carries from one wall to the next.
//!
//! # Modules
//!
//! - **dom_tag_config**: HTML tag tables (void elements)
//! - **general**: small string helpers used by the parser and the compiler
//! - **hash**: xxHash3 helpers for template cache keys
//!
//! # Example
//!
//! ```
//! use sinopia_carton::{is_void_tag, FxHashMap};
//!
//! let mut seen: FxHashMap<&str, bool> = FxHashMap::default();
//! seen.insert("br", is_void_tag("br"));
//! assert_eq!(seen.get("br"), Some(&true));
//! ```

pub mod dom_tag_config;
pub mod general;
pub mod hash;

// Re-export compact_str::CompactString for convenience
pub use compact_str::{format_compact, CompactString};

// Re-export smallvec for stack-optimized collections
pub use smallvec::{smallvec, SmallVec};

// Re-export bitflags for flag types
pub use bitflags::bitflags;

// Re-export rustc-hash for fast hash maps/sets
pub use rustc_hash::{FxHashMap, FxHashSet};

// Re-export phf for compile-time perfect hash functions
pub use phf::{phf_set, Set as PhfSet};

// Re-export shared utilities
pub use dom_tag_config::*;
pub use general::*;
