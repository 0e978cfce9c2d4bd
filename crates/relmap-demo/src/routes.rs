//! The demo's route table, shared by the CLI and the route tests.

use clap::Subcommand;

use relmap_core::{PostId, RoleId, TodoId, UserId};
use relmap_store::Store;

use crate::handlers;
use crate::views::Response;

/// Which snapshot a route reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backing {
    Relations,
    Todos,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Route {
    /// Health check.
    Index,
    /// Add "John Doe" with a profile and the Admin, Editor and Viewer roles.
    UserAdd,
    /// Add three sample posts to the first user.
    PostAdd,
    /// Every user with profile bio, posts and roles.
    Users,
    /// One user by id.
    User { id: i64 },
    /// Every post with its author's name.
    Posts,
    /// One post by id.
    Post { id: i64 },
    /// Every role with its users.
    Roles,
    /// One role by id.
    Role { id: i64 },
    /// Every profile with its user's name.
    Profiles,
    /// Record counts per table.
    Stats,
    /// The books endpoint.
    Books,
    /// Todo app.
    #[command(subcommand)]
    Todo(TodoRoute),
}

#[derive(Debug, Clone, Subcommand)]
pub enum TodoRoute {
    /// Add a todo.
    Add { title: Option<String> },
    /// List todos, newest first.
    List,
    /// List todos with one selected for editing.
    Show { id: i64 },
    /// Change a todo's title.
    Edit { id: i64, title: Option<String> },
    /// Delete a todo.
    Delete { id: i64 },
}

impl Route {
    /// The store this route needs, if any.
    pub fn backing(&self) -> Option<Backing> {
        match self {
            Self::Index | Self::Books => None,
            Self::Todo(_) => Some(Backing::Todos),
            _ => Some(Backing::Relations),
        }
    }

    /// Whether the route writes to its store.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::UserAdd
                | Self::PostAdd
                | Self::Todo(TodoRoute::Add { .. } | TodoRoute::Edit { .. } | TodoRoute::Delete { .. })
        )
    }

    pub fn handle(&self, store: &Store) -> Response {
        match self {
            Self::Index => handlers::index(),
            Self::UserAdd => handlers::add_user(store),
            Self::PostAdd => handlers::add_posts(store),
            Self::Users => handlers::list_users(store),
            Self::User { id } => handlers::show_user(store, UserId(*id)),
            Self::Posts => handlers::list_posts(store),
            Self::Post { id } => handlers::show_post(store, PostId(*id)),
            Self::Roles => handlers::list_roles(store),
            Self::Role { id } => handlers::show_role(store, RoleId(*id)),
            Self::Profiles => handlers::list_profiles(store),
            Self::Stats => handlers::counts(store),
            Self::Books => handlers::books(),
            Self::Todo(route) => route.handle(store),
        }
    }
}

impl TodoRoute {
    fn handle(&self, store: &Store) -> Response {
        match self {
            Self::Add { title } => handlers::todo_add(store, title.clone()),
            Self::List => handlers::todo_page(store, None),
            Self::Show { id } => handlers::todo_page(store, Some(TodoId(*id))),
            Self::Edit { id, title } => handlers::todo_edit(store, TodoId(*id), title.clone()),
            Self::Delete { id } => handlers::todo_delete(store, TodoId(*id)),
        }
    }
}
