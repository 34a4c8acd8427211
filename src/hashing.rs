//! This module provides deterministic `HashMap` and `HashSet` variants. The hashing data
//! structures in the standard library are randomly seeded, which makes iteration order differ
//! from run to run; simulations must be reproducible from their random seed alone, so all maps
//! keyed by person or disease use these aliases instead.
//!
//! `HashMap<K, V, S>` does not have a `new` method for a custom hasher. Use
//! `HashMap::default()` instead.

pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
