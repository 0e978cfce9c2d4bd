//! Core domain types for the relmap entity graph.
//!
//! Records are plain data: every relationship is stored exactly once, as a
//! foreign key on the child record or as a row in the user/role association
//! set. Back-references are never stored; the accessor resolves them.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Identifiers ───────────────────────────────────────────────────

/// Identity of a User record, assigned by the store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Identity of a Profile record, assigned by the store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ProfileId(pub i64);

/// Identity of a Post record, assigned by the store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct PostId(pub i64);

/// Identity of a Role record, assigned by the store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct RoleId(pub i64);

/// Identity of a Todo record, assigned by the store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TodoId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kinds of record the store manages (one table each).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Profile,
    Post,
    Role,
    Todo,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        Self::User,
        Self::Profile,
        Self::Post,
        Self::Role,
        Self::Todo,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Profile => "Profile",
            Self::Post => "Post",
            Self::Role => "Role",
            Self::Todo => "Todo",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A typed reference to any record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "id")]
pub enum EntityId {
    User(UserId),
    Profile(ProfileId),
    Post(PostId),
    Role(RoleId),
    Todo(TodoId),
}

impl EntityId {
    /// Build a reference from a kind and a raw id.
    pub fn new(kind: EntityKind, raw: i64) -> Self {
        match kind {
            EntityKind::User => Self::User(UserId(raw)),
            EntityKind::Profile => Self::Profile(ProfileId(raw)),
            EntityKind::Post => Self::Post(PostId(raw)),
            EntityKind::Role => Self::Role(RoleId(raw)),
            EntityKind::Todo => Self::Todo(TodoId(raw)),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::User(_) => EntityKind::User,
            Self::Profile(_) => EntityKind::Profile,
            Self::Post(_) => EntityKind::Post,
            Self::Role(_) => EntityKind::Role,
            Self::Todo(_) => EntityKind::Todo,
        }
    }

    pub fn raw(&self) -> i64 {
        match self {
            Self::User(id) => id.0,
            Self::Profile(id) => id.0,
            Self::Post(id) => id.0,
            Self::Role(id) => id.0,
            Self::Todo(id) => id.0,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.raw())
    }
}

impl From<UserId> for EntityId {
    fn from(id: UserId) -> Self {
        Self::User(id)
    }
}

impl From<ProfileId> for EntityId {
    fn from(id: ProfileId) -> Self {
        Self::Profile(id)
    }
}

impl From<PostId> for EntityId {
    fn from(id: PostId) -> Self {
        Self::Post(id)
    }
}

impl From<RoleId> for EntityId {
    fn from(id: RoleId) -> Self {
        Self::Role(id)
    }
}

impl From<TodoId> for EntityId {
    fn from(id: TodoId) -> Self {
        Self::Todo(id)
    }
}

// ── Records ───────────────────────────────────────────────────────

/// A user. Owns at most one profile, any number of posts and roles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

/// Profile information. `user_id` is unique across all profiles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub id: ProfileId,
    pub bio: String,
    pub user_id: UserId,
}

/// A post. Every post has exactly one author.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub description: String,
    pub user_id: UserId,
}

/// A named role, assigned to users through [`UserRole`] rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

/// Association row linking a user to a role. The pair is its identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserRole {
    pub user_id: UserId,
    pub role_id: RoleId,
}

/// A todo item from the single-table todo list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
}

/// Enum wrapper for every record kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind")]
pub enum Entity {
    User(User),
    Profile(Profile),
    Post(Post),
    Role(Role),
    Todo(Todo),
}

impl Entity {
    pub fn id(&self) -> EntityId {
        match self {
            Entity::User(e) => e.id.into(),
            Entity::Profile(e) => e.id.into(),
            Entity::Post(e) => e.id.into(),
            Entity::Role(e) => e.id.into(),
            Entity::Todo(e) => e.id.into(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.id().kind()
    }
}

// ── Inputs ────────────────────────────────────────────────────────

/// Attributes for a new user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
}

/// Attributes for a new profile. The owning user is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProfile {
    pub bio: String,
    pub user_id: Option<UserId>,
}

/// Attributes for a new post. The author is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub description: String,
    pub user_id: Option<UserId>,
}

/// Attributes for a new role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRole {
    pub name: String,
}

/// Attributes for a new todo, as submitted by a form. The title is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTodo {
    pub title: Option<String>,
}

/// Replacement attributes for an existing todo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TodoUpdate {
    pub title: Option<String>,
}

/// Generic create payload, one variant per record kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum NewEntity {
    User(NewUser),
    Profile(NewProfile),
    Post(NewPost),
    Role(NewRole),
    Todo(NewTodo),
}

// ── Relationships ─────────────────────────────────────────────────

/// Cardinality of a declared relationship.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// User ↔ Profile.
    OneToOne,
    /// User → Posts.
    OneToMany,
    /// User ↔ Roles.
    ManyToMany,
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::OneToOne => "one_to_one",
            Self::OneToMany => "one_to_many",
            Self::ManyToMany => "many_to_many",
        };
        f.write_str(s)
    }
}

/// A navigable relationship end, named as it is read from the source record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    /// `user.profile`
    Profile,
    /// `profile.user`
    User,
    /// `user.posts`
    Posts,
    /// `post.author`
    Author,
    /// `user.roles`
    Roles,
    /// `role.users`
    Users,
}

impl Relationship {
    /// Resolve a relationship name declared on `kind`.
    pub fn for_kind(kind: EntityKind, name: &str) -> Option<Self> {
        let rel = match name {
            "profile" => Self::Profile,
            "user" => Self::User,
            "posts" => Self::Posts,
            "author" => Self::Author,
            "roles" => Self::Roles,
            "users" => Self::Users,
            _ => return None,
        };
        (rel.source() == kind).then_some(rel)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::User => "user",
            Self::Posts => "posts",
            Self::Author => "author",
            Self::Roles => "roles",
            Self::Users => "users",
        }
    }

    /// The kind of record this relationship is read from.
    pub fn source(&self) -> EntityKind {
        match self {
            Self::Profile | Self::Posts | Self::Roles => EntityKind::User,
            Self::User => EntityKind::Profile,
            Self::Author => EntityKind::Post,
            Self::Users => EntityKind::Role,
        }
    }

    /// The kind of record this relationship resolves to.
    pub fn target(&self) -> EntityKind {
        match self {
            Self::Profile => EntityKind::Profile,
            Self::User | Self::Author | Self::Users => EntityKind::User,
            Self::Posts => EntityKind::Post,
            Self::Roles => EntityKind::Role,
        }
    }

    pub fn cardinality(&self) -> RelationshipKind {
        match self {
            Self::Profile | Self::User => RelationshipKind::OneToOne,
            Self::Posts | Self::Author => RelationshipKind::OneToMany,
            Self::Roles | Self::Users => RelationshipKind::ManyToMany,
        }
    }

    /// Whether navigation yields a sequence rather than at most one record.
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Posts | Self::Roles | Self::Users)
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.source().label().to_lowercase(), self.name())
    }
}

/// Result of resolving a relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    One(Option<Entity>),
    Many(Vec<Entity>),
}

impl Navigation {
    /// Number of records reached.
    pub fn len(&self) -> usize {
        match self {
            Navigation::One(found) => usize::from(found.is_some()),
            Navigation::Many(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into a sequence regardless of cardinality.
    pub fn into_vec(self) -> Vec<Entity> {
        match self {
            Navigation::One(found) => found.into_iter().collect(),
            Navigation::Many(items) => items,
        }
    }
}

// ── Options ───────────────────────────────────────────────────────

/// Ordering for full scans.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    #[default]
    IdAsc,
    IdDesc,
}

/// How a one-to-one link treats an existing counterpart.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LinkMode {
    /// Fail if the user already has a different profile.
    #[default]
    Strict,
    /// Remove the user's current profile and attach the new one.
    Replace,
}
