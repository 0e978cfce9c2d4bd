//! relmap-core: Shared types, configuration, and error handling for relmap.
//!
//! This crate provides the foundational types used across all relmap crates:
//! - Records (User, Profile, Post, Role, Todo) and their typed identifiers
//! - Typed create/update inputs
//! - Relationship names and cardinalities for navigation
//! - Configuration management
//! - The common error type

pub mod config;
pub mod error;
pub mod types;

pub use config::{DeletePolicy, StoreConfig};
pub use error::{RelmapError, Result};
pub use types::{
    Entity, EntityId, EntityKind, LinkMode, Navigation, NewEntity, NewPost, NewProfile, NewRole,
    NewTodo, NewUser, Order, Post, PostId, Profile, ProfileId, Relationship, RelationshipKind,
    Role, RoleId, Todo, TodoId, TodoUpdate, User, UserId, UserRole,
};
