//! Route handlers for the relationship examples and the todo app.
//!
//! Each handler takes the store it reads or writes and returns a
//! [`Response`]; store errors are mapped to status codes at this boundary.

use relmap_core::{
    EntityKind, NewPost, NewProfile, NewRole, NewTodo, NewUser, Order, Post, PostId, Profile,
    RelationshipKind, RelmapError, Role, RoleId, TodoId, TodoUpdate, User, UserId,
};
use relmap_store::Store;

use crate::error::{DemoError, Result};
use crate::views::{
    Flash, Message, NameOnly, PostSummary, PostView, ProfileView, Response, RoleView, TodoPage,
    UserView,
};

const SAMPLE_USER: &str = "John Doe";
const SAMPLE_BIO: &str = "Software Developer";
const SAMPLE_ROLES: [&str; 3] = ["Admin", "Editor", "Viewer"];
const SAMPLE_POSTS: [(&str, &str); 3] = [
    ("First Post", "This is the first post"),
    ("Second Post", "This is the second post"),
    ("Third Post", "This is the third post"),
];

fn respond(result: Result<Response>) -> Response {
    result.unwrap_or_else(Response::from)
}

fn message(text: &str) -> Result<Response> {
    Response::json(&Message { message: text })
}

// ── Health ───────────────────────────────────────────────────────

pub fn index() -> Response {
    respond(message("Hello, World!"))
}

pub fn books() -> Response {
    Response::text("books")
}

// ── Relationship Writes ──────────────────────────────────────────

/// Create "John Doe" with a profile and three fresh roles.
pub fn add_user(store: &Store) -> Response {
    respond(try_add_user(store))
}

fn try_add_user(store: &Store) -> Result<Response> {
    let user = store.create_user(&NewUser {
        name: SAMPLE_USER.to_string(),
    })?;
    store.create_profile(&NewProfile {
        bio: SAMPLE_BIO.to_string(),
        user_id: Some(user),
    })?;
    for name in SAMPLE_ROLES {
        let role = store.create_role(&NewRole {
            name: name.to_string(),
        })?;
        store.link(user.into(), role.into(), RelationshipKind::ManyToMany)?;
    }

    tracing::info!(user_id = %user, "Sample user added");
    message("User and Profile added successfully!")
}

/// Add three sample posts to the first user, creating one if needed.
pub fn add_posts(store: &Store) -> Response {
    respond(try_add_posts(store))
}

fn try_add_posts(store: &Store) -> Result<Response> {
    let user = match store.first_user() {
        Some(user) => user.id,
        None => store.create_user(&NewUser {
            name: SAMPLE_USER.to_string(),
        })?,
    };
    for (title, description) in SAMPLE_POSTS {
        store.create_post(&NewPost {
            title: title.to_string(),
            description: description.to_string(),
            user_id: Some(user),
        })?;
    }

    tracing::info!(user_id = %user, count = SAMPLE_POSTS.len(), "Sample posts added");
    message("Posts added successfully!")
}

// ── Relationship Reads ───────────────────────────────────────────

pub fn list_users(store: &Store) -> Response {
    respond(try_list_users(store))
}

fn try_list_users(store: &Store) -> Result<Response> {
    let users = store
        .users(store.default_order())
        .into_iter()
        .map(|user| user_view(store, user))
        .collect::<relmap_core::Result<Vec<_>>>()?;
    Response::json(&Message { message: users })
}

pub fn show_user(store: &Store, id: UserId) -> Response {
    respond(
        store
            .user(id)
            .and_then(|user| user_view(store, user))
            .map_err(DemoError::from)
            .and_then(|view| Response::json(&view)),
    )
}

pub fn list_posts(store: &Store) -> Response {
    respond(try_list_posts(store))
}

fn try_list_posts(store: &Store) -> Result<Response> {
    let posts = store
        .posts(store.default_order())
        .into_iter()
        .map(|post| post_view(store, post))
        .collect::<relmap_core::Result<Vec<_>>>()?;
    Response::json(&posts)
}

pub fn show_post(store: &Store, id: PostId) -> Response {
    respond(
        store
            .post(id)
            .and_then(|post| post_view(store, post))
            .map_err(DemoError::from)
            .and_then(|view| Response::json(&view)),
    )
}

pub fn list_roles(store: &Store) -> Response {
    respond(try_list_roles(store))
}

fn try_list_roles(store: &Store) -> Result<Response> {
    let roles = store
        .roles(store.default_order())
        .into_iter()
        .map(|role| role_view(store, role))
        .collect::<relmap_core::Result<Vec<_>>>()?;
    Response::json(&roles)
}

pub fn show_role(store: &Store, id: RoleId) -> Response {
    respond(
        store
            .role(id)
            .and_then(|role| role_view(store, role))
            .map_err(DemoError::from)
            .and_then(|view| Response::json(&view)),
    )
}

pub fn list_profiles(store: &Store) -> Response {
    respond(try_list_profiles(store))
}

fn try_list_profiles(store: &Store) -> Result<Response> {
    let profiles = store
        .profiles(store.default_order())
        .into_iter()
        .map(|profile| profile_view(store, profile))
        .collect::<relmap_core::Result<Vec<_>>>()?;
    Response::json(&profiles)
}

fn user_view(store: &Store, user: User) -> relmap_core::Result<UserView> {
    let profile_bio = store.user_profile(user.id)?.map(|p| p.bio);
    let posts = store
        .user_posts(user.id)?
        .into_iter()
        .map(|p| PostSummary {
            title: p.title,
            description: p.description,
        })
        .collect();
    let roles = store
        .user_roles(user.id)?
        .into_iter()
        .map(|r| NameOnly { name: r.name })
        .collect();

    Ok(UserView {
        id: user.id,
        name: user.name,
        profile_bio,
        posts,
        roles,
    })
}

fn post_view(store: &Store, post: Post) -> relmap_core::Result<PostView> {
    let author = store.post_author(post.id)?;
    Ok(PostView {
        id: post.id,
        title: post.title,
        description: post.description,
        author_name: author.name,
    })
}

fn role_view(store: &Store, role: Role) -> relmap_core::Result<RoleView> {
    let users = store
        .role_users(role.id)?
        .into_iter()
        .map(|u| NameOnly { name: u.name })
        .collect();
    Ok(RoleView {
        id: role.id,
        name: role.name,
        users,
    })
}

fn profile_view(store: &Store, profile: Profile) -> relmap_core::Result<ProfileView> {
    let owner = store.profile_user(profile.id)?;
    Ok(ProfileView {
        id: profile.id,
        bio: profile.bio,
        user_name: owner.name,
    })
}

// ── Todo App ─────────────────────────────────────────────────────

const TODO_HOME: &str = "/";

/// The todo page, newest first. `edit` selects the todo being edited; a
/// missing one renders as `null`.
pub fn todo_page(store: &Store, edit: Option<TodoId>) -> Response {
    respond(try_todo_page(store, edit))
}

fn try_todo_page(store: &Store, edit: Option<TodoId>) -> Result<Response> {
    let edit_todo = match edit {
        Some(id) => found(store.todo(id))?,
        None => None,
    };
    Response::json(&TodoPage {
        todos: store.todos(Order::IdDesc),
        edit_todo,
    })
}

pub fn todo_add(store: &Store, title: Option<String>) -> Response {
    match store.create_todo(&NewTodo { title }) {
        Ok(id) => {
            tracing::info!(todo_id = %id, "Todo added");
            Response::redirect(TODO_HOME, Some(Flash::success("Todo added successfully!")))
        }
        Err(e) => Response::from(DemoError::from(e)),
    }
}

/// Retitle a todo. A missing todo redirects home without a flash.
pub fn todo_edit(store: &Store, id: TodoId, title: Option<String>) -> Response {
    respond(try_todo_edit(store, id, title))
}

fn try_todo_edit(store: &Store, id: TodoId, title: Option<String>) -> Result<Response> {
    if found(store.todo(id))?.is_none() {
        tracing::debug!(todo_id = %id, "Edit of missing todo ignored");
        return Ok(Response::redirect(TODO_HOME, None));
    }
    store.update_todo(id, &TodoUpdate { title })?;
    tracing::info!(todo_id = %id, "Todo updated");
    Ok(Response::redirect(
        TODO_HOME,
        Some(Flash::success("Todo updated successfully!")),
    ))
}

/// Delete a todo. A missing todo redirects home without a flash.
pub fn todo_delete(store: &Store, id: TodoId) -> Response {
    match store.delete(id.into()) {
        Ok(()) => {
            tracing::info!(todo_id = %id, "Todo deleted");
            Response::redirect(TODO_HOME, Some(Flash::success("Todo deleted successfully!")))
        }
        Err(RelmapError::NotFound { .. }) => {
            tracing::debug!(todo_id = %id, "Delete of missing todo ignored");
            Response::redirect(TODO_HOME, None)
        }
        Err(e) => Response::from(DemoError::from(e)),
    }
}

/// Turn `NotFound` into `None`, passing every other error through.
fn found<T>(result: relmap_core::Result<T>) -> relmap_core::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(RelmapError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Record counts per table.
pub fn counts(store: &Store) -> Response {
    let counts: serde_json::Map<String, serde_json::Value> = EntityKind::ALL
        .into_iter()
        .map(|kind| (kind.label().to_lowercase(), store.count(kind).into()))
    .collect();
    respond(Response::json(&counts))
}
