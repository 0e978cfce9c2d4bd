//! Read operations: point lookups, scans, and relationship navigation.
//!
//! Navigation is resolved from the stored keys on every call; nothing is
//! cached, so a read after a write always sees the write.

use relmap_core::{
    Entity, EntityId, EntityKind, Navigation, Order, Post, PostId, Profile, ProfileId,
    Relationship, RelmapError, Result, Role, RoleId, Todo, TodoId, User, UserId,
};

use crate::store::{ordered, Store, Tables};

impl Store {
    // ── Single Record Lookups ────────────────────────────────────

    /// Get any record by its typed id.
    pub fn get(&self, id: EntityId) -> Result<Entity> {
        let tables = self.read();
        let entity = match id {
            EntityId::User(id) => Entity::User(tables.user(id)?.clone()),
            EntityId::Profile(id) => Entity::Profile(tables.profile(id)?.clone()),
            EntityId::Post(id) => Entity::Post(tables.post(id)?.clone()),
            EntityId::Role(id) => Entity::Role(tables.role(id)?.clone()),
            EntityId::Todo(id) => Entity::Todo(tables.todo(id)?.clone()),
        };
        Ok(entity)
    }

    pub fn user(&self, id: UserId) -> Result<User> {
        self.read().user(id).cloned()
    }

    pub fn profile(&self, id: ProfileId) -> Result<Profile> {
        self.read().profile(id).cloned()
    }

    pub fn post(&self, id: PostId) -> Result<Post> {
        self.read().post(id).cloned()
    }

    pub fn role(&self, id: RoleId) -> Result<Role> {
        self.read().role(id).cloned()
    }

    pub fn todo(&self, id: TodoId) -> Result<Todo> {
        self.read().todo(id).cloned()
    }

    /// The lowest-id record of a kind, if any.
    pub fn first(&self, kind: EntityKind) -> Option<Entity> {
        let tables = self.read();
        match kind {
            EntityKind::User => tables.users.values().next().cloned().map(Entity::User),
            EntityKind::Profile => tables.profiles.values().next().cloned().map(Entity::Profile),
            EntityKind::Post => tables.posts.values().next().cloned().map(Entity::Post),
            EntityKind::Role => tables.roles.values().next().cloned().map(Entity::Role),
            EntityKind::Todo => tables.todos.values().next().cloned().map(Entity::Todo),
        }
    }

    pub fn first_user(&self) -> Option<User> {
        self.read().users.values().next().cloned()
    }

    // ── List Queries ─────────────────────────────────────────────

    /// Full scan of one table.
    pub fn list_all(&self, kind: EntityKind, order: Order) -> Vec<Entity> {
        let tables = self.read();
        match kind {
            EntityKind::User => wrap(ordered(&tables.users, order), Entity::User),
            EntityKind::Profile => wrap(ordered(&tables.profiles, order), Entity::Profile),
            EntityKind::Post => wrap(ordered(&tables.posts, order), Entity::Post),
            EntityKind::Role => wrap(ordered(&tables.roles, order), Entity::Role),
            EntityKind::Todo => wrap(ordered(&tables.todos, order), Entity::Todo),
        }
    }

    pub fn users(&self, order: Order) -> Vec<User> {
        ordered(&self.read().users, order)
    }

    pub fn profiles(&self, order: Order) -> Vec<Profile> {
        ordered(&self.read().profiles, order)
    }

    pub fn posts(&self, order: Order) -> Vec<Post> {
        ordered(&self.read().posts, order)
    }

    pub fn roles(&self, order: Order) -> Vec<Role> {
        ordered(&self.read().roles, order)
    }

    pub fn todos(&self, order: Order) -> Vec<Todo> {
        ordered(&self.read().todos, order)
    }

    /// Count records of a kind.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.read().count(kind)
    }

    // ── Navigation ───────────────────────────────────────────────

    /// Resolve a relationship declared on `from`'s kind.
    pub fn navigate(&self, from: EntityId, relationship: Relationship) -> Result<Navigation> {
        let tables = self.read();
        let reached: Vec<Entity> = match (relationship, from) {
            (Relationship::Profile, EntityId::User(user)) => {
                tables.user(user)?;
                tables.profile_of(user).cloned().map(Entity::Profile).into_iter().collect()
            }
            (Relationship::User, EntityId::Profile(profile)) => {
                vec![Entity::User(owner_of_profile(&tables, profile)?.clone())]
            }
            (Relationship::Posts, EntityId::User(user)) => {
                tables.user(user)?;
                tables.posts_of(user).cloned().map(Entity::Post).collect()
            }
            (Relationship::Author, EntityId::Post(post)) => {
                vec![Entity::User(author_of_post(&tables, post)?.clone())]
            }
            (Relationship::Roles, EntityId::User(user)) => {
                tables.user(user)?;
                tables.roles_of(user).cloned().map(Entity::Role).collect()
            }
            (Relationship::Users, EntityId::Role(role)) => {
                tables.role(role)?;
                tables.users_of(role).cloned().map(Entity::User).collect()
            }
            _ => {
                return Err(RelmapError::Validation(format!(
                    "{} has no relationship named '{}'",
                    from.kind(),
                    relationship.name()
                )))
            }
        };

        Ok(if relationship.is_collection() {
            Navigation::Many(reached)
        } else {
            Navigation::One(reached.into_iter().next())
        })
    }

    /// Resolve a relationship by its declared name (`"profile"`, `"posts"`, ...).
    pub fn navigate_by_name(&self, from: EntityId, name: &str) -> Result<Navigation> {
        let relationship = Relationship::for_kind(from.kind(), name).ok_or_else(|| {
            RelmapError::Validation(format!(
                "{} has no relationship named '{name}'",
                from.kind()
            ))
        })?;
        self.navigate(from, relationship)
    }

    /// `user.profile`
    pub fn user_profile(&self, user: UserId) -> Result<Option<Profile>> {
        let tables = self.read();
        tables.user(user)?;
        Ok(tables.profile_of(user).cloned())
    }

    /// `user.posts`, in id order.
    pub fn user_posts(&self, user: UserId) -> Result<Vec<Post>> {
        let tables = self.read();
        tables.user(user)?;
        Ok(tables.posts_of(user).cloned().collect())
    }

    /// `user.roles`, in role id order.
    pub fn user_roles(&self, user: UserId) -> Result<Vec<Role>> {
        let tables = self.read();
        tables.user(user)?;
        let mut roles: Vec<Role> = tables.roles_of(user).cloned().collect();
        roles.sort_by_key(|r| r.id);
        Ok(roles)
    }

    /// `profile.user`
    pub fn profile_user(&self, profile: ProfileId) -> Result<User> {
        owner_of_profile(&self.read(), profile).cloned()
    }

    /// `post.author`
    pub fn post_author(&self, post: PostId) -> Result<User> {
        author_of_post(&self.read(), post).cloned()
    }

    /// `role.users`, in user id order.
    pub fn role_users(&self, role: RoleId) -> Result<Vec<User>> {
        let tables = self.read();
        tables.role(role)?;
        Ok(tables.users_of(role).cloned().collect())
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn wrap<T>(items: Vec<T>, f: fn(T) -> Entity) -> Vec<Entity> {
    items.into_iter().map(f).collect()
}

fn owner_of_profile(tables: &Tables, profile: ProfileId) -> Result<&User> {
    let user_id = tables.profile(profile)?.user_id;
    tables.user(user_id)
}

fn author_of_post(tables: &Tables, post: PostId) -> Result<&User> {
    let user_id = tables.post(post)?.user_id;
    tables.user(user_id)
}
