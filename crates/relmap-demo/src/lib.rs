//! relmap-demo: the relationship and todo demos replayed over a relmap store.
//!
//! Every route is a plain function from a [`relmap_store::Store`] to a
//! [`views::Response`], so the CLI and the tests drive the same code.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod views;
