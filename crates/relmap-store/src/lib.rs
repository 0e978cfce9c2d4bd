//! relmap-store: the relational entity graph accessor.
//!
//! This crate is the single mutation point for relmap data. All reads and
//! writes flow through [`Store`] so that cardinality rules, required parents,
//! and bidirectional navigation stay consistent.

pub mod mutations;
pub mod queries;
pub mod snapshot;
pub mod store;

pub use store::{Sequences, Store, Tables};
