//! Type aliases for the deterministic collections used throughout the crate.
//!
//! Iteration order of `Map`/`Set` is insertion order, which is what keeps
//! automaton state numbering stable from run to run.

use std::hash::BuildHasherDefault;

pub type Map<K, V> = indexmap::IndexMap<K, V, BuildHasherDefault<rustc_hash::FxHasher>>;
pub type Set<T> = indexmap::IndexSet<T, BuildHasherDefault<rustc_hash::FxHasher>>;
