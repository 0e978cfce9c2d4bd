//! Write operations for the entity graph.
//!
//! Every relationship is written through exactly one foreign key or one
//! association row, so both navigation directions change together. All
//! checks run before the first insert; a rejected write changes nothing.

use relmap_core::{
    DeletePolicy, EntityId, EntityKind, LinkMode, NewEntity, NewPost, NewProfile, NewRole,
    NewTodo, NewUser, Post, PostId, Profile, ProfileId, Relationship, RelationshipKind,
    RelmapError, Result, Role, RoleId, Todo, TodoId, TodoUpdate, User, UserId, UserRole,
};

use crate::store::{Store, Tables};

impl Store {
    // ── Creates ──────────────────────────────────────────────────

    /// Insert any record kind and return its new id.
    pub fn create(&self, input: &NewEntity) -> Result<EntityId> {
        match input {
            NewEntity::User(u) => self.create_user(u).map(Into::into),
            NewEntity::Profile(p) => self.create_profile(p).map(Into::into),
            NewEntity::Post(p) => self.create_post(p).map(Into::into),
            NewEntity::Role(r) => self.create_role(r).map(Into::into),
            NewEntity::Todo(t) => self.create_todo(t).map(Into::into),
        }
    }

    pub fn create_user(&self, input: &NewUser) -> Result<UserId> {
        self.write("create_user", |tables| {
            let id = UserId(tables.allocate(EntityKind::User)?);
            tables.users.insert(
                id,
                User {
                    id,
                    name: input.name.clone(),
                },
            );
            tracing::debug!(user_id = %id, name = %input.name, "User created");
            Ok(id)
        })
    }

    /// Insert a profile for an existing user that has none yet.
    pub fn create_profile(&self, input: &NewProfile) -> Result<ProfileId> {
        self.write("create_profile", |tables| {
            let user_id = require_parent(tables, input.user_id, EntityKind::Profile)?;
            if let Some(existing) = tables.profile_of(user_id) {
                return Err(RelmapError::Cardinality {
                    relationship: Relationship::Profile,
                    id: user_id.into(),
                    existing: existing.id.into(),
                });
            }

            let id = ProfileId(tables.allocate(EntityKind::Profile)?);
            tables.profiles.insert(
                id,
                Profile {
                    id,
                    bio: input.bio.clone(),
                    user_id,
                },
            );
            tracing::debug!(profile_id = %id, user_id = %user_id, "Profile created");
            Ok(id)
        })
    }

    /// Insert a post under an existing author.
    pub fn create_post(&self, input: &NewPost) -> Result<PostId> {
        self.write("create_post", |tables| {
            let user_id = require_parent(tables, input.user_id, EntityKind::Post)?;
            let id = PostId(tables.allocate(EntityKind::Post)?);
            tables.posts.insert(
                id,
                Post {
                    id,
                    title: input.title.clone(),
                    description: input.description.clone(),
                    user_id,
                },
            );
            tracing::debug!(post_id = %id, user_id = %user_id, "Post created");
            Ok(id)
        })
    }

    pub fn create_role(&self, input: &NewRole) -> Result<RoleId> {
        self.write("create_role", |tables| {
            let id = RoleId(tables.allocate(EntityKind::Role)?);
            tables.roles.insert(
                id,
                Role {
                    id,
                    name: input.name.clone(),
                },
            );
            tracing::debug!(role_id = %id, name = %input.name, "Role created");
            Ok(id)
        })
    }

    pub fn create_todo(&self, input: &NewTodo) -> Result<TodoId> {
        let title = require_title(&input.title)?;
        self.write("create_todo", |tables| {
            let id = TodoId(tables.allocate(EntityKind::Todo)?);
            tables.todos.insert(id, Todo { id, title });
            tracing::debug!(todo_id = %id, "Todo created");
            Ok(id)
        })
    }

    // ── Updates ──────────────────────────────────────────────────

    /// Replace a todo's title.
    pub fn update_todo(&self, id: TodoId, update: &TodoUpdate) -> Result<Todo> {
        let title = require_title(&update.title)?;
        self.write("update_todo", |tables| {
            let todo = tables
                .todos
                .get_mut(&id)
                .ok_or_else(|| RelmapError::not_found(id))?;
            todo.title = title;
            tracing::debug!(todo_id = %id, "Todo updated");
            Ok(todo.clone())
        })
    }

    pub fn rename_user(&self, id: UserId, name: &str) -> Result<User> {
        self.write("rename_user", |tables| {
            let user = tables
                .users
                .get_mut(&id)
                .ok_or_else(|| RelmapError::not_found(id))?;
            user.name = name.to_string();
            tracing::debug!(user_id = %id, name, "User renamed");
            Ok(user.clone())
        })
    }

    // ── Links ────────────────────────────────────────────────────

    /// Establish a relationship between two records, in either argument order.
    pub fn link(&self, a: EntityId, b: EntityId, kind: RelationshipKind) -> Result<()> {
        self.link_with(a, b, kind, LinkMode::Strict)
    }

    /// Like [`Store::link`], choosing how a one-to-one link treats an
    /// existing counterpart.
    pub fn link_with(
        &self,
        a: EntityId,
        b: EntityId,
        kind: RelationshipKind,
        mode: LinkMode,
    ) -> Result<()> {
        match (kind, endpoints(a, b)) {
            (RelationshipKind::OneToOne, Some(Endpoints::Profile(user, profile))) => {
                self.attach_profile(user, profile, mode).map(drop)
            }
            (RelationshipKind::OneToMany, Some(Endpoints::Post(user, post))) => {
                self.set_author(post, user).map(drop)
            }
            (RelationshipKind::ManyToMany, Some(Endpoints::Role(user, role))) => {
                self.assign_role(user, role).map(drop)
            }
            _ => Err(undeclared(a, b, kind)),
        }
    }

    /// Remove a many-to-many association. Removing a missing one is a no-op.
    ///
    /// One-to-one and one-to-many links cannot be removed: the child's
    /// parent is required. Delete the child instead.
    pub fn unlink(&self, a: EntityId, b: EntityId, kind: RelationshipKind) -> Result<()> {
        match (kind, endpoints(a, b)) {
            (RelationshipKind::ManyToMany, Some(Endpoints::Role(user, role))) => {
                self.revoke_role(user, role).map(drop)
            }
            (RelationshipKind::OneToOne, Some(Endpoints::Profile(..)))
            | (RelationshipKind::OneToMany, Some(Endpoints::Post(..))) => {
                Err(RelmapError::Validation(format!(
                    "{kind} link between {a} and {b} cannot be removed: the parent is required"
                )))
            }
            _ => Err(undeclared(a, b, kind)),
        }
    }

    /// Point `profile` at `user`. Returns `false` if it already was.
    ///
    /// A profile that belonged to another user moves; that user is left
    /// without a profile. If `user` already has a different profile, `Strict`
    /// fails and `Replace` deletes the displaced profile.
    pub fn attach_profile(&self, user: UserId, profile: ProfileId, mode: LinkMode) -> Result<bool> {
        self.write("attach_profile", |tables| {
            tables.user(user)?;
            if tables.profile(profile)?.user_id == user {
                return Ok(false);
            }

            if let Some(existing) = tables.profile_of(user).map(|p| p.id) {
                match mode {
                    LinkMode::Strict => {
                        return Err(RelmapError::Cardinality {
                            relationship: Relationship::Profile,
                            id: user.into(),
                            existing: existing.into(),
                        })
                    }
                    LinkMode::Replace => {
                        tables.profiles.remove(&existing);
                        tracing::debug!(profile_id = %existing, user_id = %user, "Displaced profile removed");
                    }
                }
            }

            if let Some(p) = tables.profiles.get_mut(&profile) {
                p.user_id = user;
            }
            tracing::debug!(profile_id = %profile, user_id = %user, "Profile attached");
            Ok(true)
        })
    }

    /// Re-parent a post. Returns `false` if `user` already was its author.
    pub fn set_author(&self, post: PostId, user: UserId) -> Result<bool> {
        self.write("set_author", |tables| {
            tables.user(user)?;
            let record = tables
                .posts
                .get_mut(&post)
                .ok_or_else(|| RelmapError::not_found(post))?;
            if record.user_id == user {
                return Ok(false);
            }
            record.user_id = user;
            tracing::debug!(post_id = %post, user_id = %user, "Post author set");
            Ok(true)
        })
    }

    /// Insert a user/role association row. Returns `false` if it existed.
    pub fn assign_role(&self, user: UserId, role: RoleId) -> Result<bool> {
        self.write("assign_role", |tables| {
            tables.user(user)?;
            tables.role(role)?;
            let inserted = tables.user_roles.insert(UserRole {
                user_id: user,
                role_id: role,
            });
            tracing::debug!(user_id = %user, role_id = %role, inserted, "Role assigned");
            Ok(inserted)
        })
    }

    /// Remove a user/role association row. Returns `false` if it was absent.
    pub fn revoke_role(&self, user: UserId, role: RoleId) -> Result<bool> {
        self.write("revoke_role", |tables| {
            let removed = tables.user_roles.remove(&UserRole {
                user_id: user,
                role_id: role,
            });
            tracing::debug!(user_id = %user, role_id = %role, removed, "Role revoked");
            Ok(removed)
        })
    }

    // ── Deletes ──────────────────────────────────────────────────

    /// Delete a record.
    ///
    /// Association rows go with their user or role. A user's profile and
    /// posts follow the configured [`DeletePolicy`].
    pub fn delete(&self, id: EntityId) -> Result<()> {
        let policy = self.config().delete_policy;
        self.write("delete", |tables| {
            match id {
                EntityId::User(user) => delete_user(tables, user, policy)?,
                EntityId::Profile(profile) => {
                    tables
                        .profiles
                        .remove(&profile)
                        .ok_or_else(|| RelmapError::not_found(profile))?;
                }
                EntityId::Post(post) => {
                    tables
                        .posts
                        .remove(&post)
                        .ok_or_else(|| RelmapError::not_found(post))?;
                }
                EntityId::Role(role) => {
                    tables
                        .roles
                        .remove(&role)
                        .ok_or_else(|| RelmapError::not_found(role))?;
                    tables.user_roles.retain(|link| link.role_id != role);
                }
                EntityId::Todo(todo) => {
                    tables
                        .todos
                        .remove(&todo)
                        .ok_or_else(|| RelmapError::not_found(todo))?;
                }
            }
            tracing::debug!(entity = %id, "Record deleted");
            Ok(())
        })
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// The declared endpoint pairs, normalized to (user, child).
enum Endpoints {
    Profile(UserId, ProfileId),
    Post(UserId, PostId),
    Role(UserId, RoleId),
}

fn endpoints(a: EntityId, b: EntityId) -> Option<Endpoints> {
    match (a, b) {
        (EntityId::User(u), EntityId::Profile(p)) | (EntityId::Profile(p), EntityId::User(u)) => {
            Some(Endpoints::Profile(u, p))
        }
        (EntityId::User(u), EntityId::Post(p)) | (EntityId::Post(p), EntityId::User(u)) => {
            Some(Endpoints::Post(u, p))
        }
        (EntityId::User(u), EntityId::Role(r)) | (EntityId::Role(r), EntityId::User(u)) => {
            Some(Endpoints::Role(u, r))
        }
        _ => None,
    }
}

fn undeclared(a: EntityId, b: EntityId, kind: RelationshipKind) -> RelmapError {
    RelmapError::Validation(format!(
        "no {kind} relationship is declared between {} and {}",
        a.kind(),
        b.kind()
    ))
}

/// The parent user of a new child record must be given and must exist.
fn require_parent(tables: &Tables, user_id: Option<UserId>, child: EntityKind) -> Result<UserId> {
    let user_id = user_id.ok_or_else(|| {
        RelmapError::Validation(format!("{child} requires an owning User"))
    })?;
    if !tables.users.contains_key(&user_id) {
        return Err(RelmapError::Validation(format!(
            "{child} owner User {user_id} does not exist"
        )));
    }
    Ok(user_id)
}

fn require_title(title: &Option<String>) -> Result<String> {
    title
        .clone()
        .ok_or_else(|| RelmapError::Validation("Todo title is required".to_string()))
}

fn delete_user(tables: &mut Tables, user: UserId, policy: DeletePolicy) -> Result<()> {
    tables.user(user)?;

    let profile = tables.profile_of(user).map(|p| p.id);
    let posts: Vec<PostId> = tables.posts_of(user).map(|p| p.id).collect();

    match policy {
        DeletePolicy::Restrict if profile.is_some() || !posts.is_empty() => {
            let mut dependents = Vec::new();
            if profile.is_some() {
                dependents.push("1 profile".to_string());
            }
            if !posts.is_empty() {
                dependents.push(format!("{} posts", posts.len()));
            }
            return Err(RelmapError::Restricted {
                kind: EntityKind::User,
                id: user.0,
                dependents: dependents.join(", "),
            });
        }
        DeletePolicy::Restrict => {}
        DeletePolicy::Cascade => {
            if let Some(profile) = profile {
                tables.profiles.remove(&profile);
            }
            for post in &posts {
                tables.posts.remove(post);
            }
            tracing::debug!(
                user_id = %user,
                profile = profile.is_some(),
                posts = posts.len(),
                "Dependents cascaded"
            );
        }
    }

    tables.user_roles.retain(|link| link.user_id != user);
    tables.users.remove(&user);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use relmap_core::StoreConfig;

    fn store_with_user(name: &str) -> (Store, UserId) {
        let store = Store::in_memory();
        let user = store
            .create_user(&NewUser {
                name: name.to_string(),
            })
            .unwrap();
        (store, user)
    }

    fn new_profile(store: &Store, user: UserId, bio: &str) -> ProfileId {
        store
            .create_profile(&NewProfile {
                bio: bio.to_string(),
                user_id: Some(user),
            })
            .unwrap()
    }

    #[test]
    fn ids_are_assigned_per_table() {
        let (store, user) = store_with_user("John Doe");
        let role = store
            .create_role(&NewRole {
                name: "Admin".to_string(),
            })
            .unwrap();
        assert_eq!(user, UserId(1));
        assert_eq!(role, RoleId(1));
    }

    #[test]
    fn post_without_author_is_rejected() {
        let store = Store::in_memory();
        let result = store.create_post(&NewPost {
            title: "Orphan".to_string(),
            description: "No parent".to_string(),
            user_id: None,
        });
        assert!(matches!(result, Err(RelmapError::Validation(_))));
        assert!(store.export().posts.is_empty());
    }

    #[test]
    fn post_with_unknown_author_is_rejected() {
        let store = Store::in_memory();
        let result = store.create_post(&NewPost {
            title: "Ghost".to_string(),
            description: "Bad parent".to_string(),
            user_id: Some(UserId(99)),
        });
        assert!(matches!(result, Err(RelmapError::Validation(_))));
    }

    #[test]
    fn second_profile_is_a_cardinality_error() {
        let (store, user) = store_with_user("John Doe");
        new_profile(&store, user, "first");

        let result = store.create_profile(&NewProfile {
            bio: "second".to_string(),
            user_id: Some(user),
        });
        assert!(matches!(result, Err(RelmapError::Cardinality { .. })));
        assert_eq!(store.export().profiles.len(), 1);
    }

    #[test]
    fn strict_attach_rejects_a_different_profile() {
        let (store, john) = store_with_user("John Doe");
        let jane = store
            .create_user(&NewUser {
                name: "Jane".to_string(),
            })
            .unwrap();
        new_profile(&store, john, "john's");
        let janes = new_profile(&store, jane, "jane's");

        let result = store.attach_profile(john, janes, LinkMode::Strict);
        assert!(matches!(result, Err(RelmapError::Cardinality { .. })));
    }

    #[test]
    fn replace_attach_removes_the_displaced_profile() {
        let (store, john) = store_with_user("John Doe");
        let jane = store
            .create_user(&NewUser {
                name: "Jane".to_string(),
            })
            .unwrap();
        let johns = new_profile(&store, john, "john's");
        let janes = new_profile(&store, jane, "jane's");

        assert!(store.attach_profile(john, janes, LinkMode::Replace).unwrap());

        let tables = store.export();
        assert!(!tables.profiles.contains_key(&johns));
        assert_eq!(tables.profiles[&janes].user_id, john);
        assert!(tables.profile_of(jane).is_none());
    }

    #[test]
    fn attaching_the_same_pair_is_a_no_op() {
        let (store, user) = store_with_user("John Doe");
        let profile = new_profile(&store, user, "bio");
        assert!(!store.attach_profile(user, profile, LinkMode::Strict).unwrap());
    }

    #[test]
    fn role_links_are_idempotent() {
        let (store, user) = store_with_user("John Doe");
        let role = store
            .create_role(&NewRole {
                name: "Admin".to_string(),
            })
            .unwrap();

        store
            .link(user.into(), role.into(), RelationshipKind::ManyToMany)
            .unwrap();
        store
            .link(role.into(), user.into(), RelationshipKind::ManyToMany)
            .unwrap();

        assert_eq!(store.export().user_roles.len(), 1);
    }

    #[test]
    fn unlinking_an_absent_role_is_a_no_op() {
        let (store, user) = store_with_user("John Doe");
        let role = store
            .create_role(&NewRole {
                name: "Viewer".to_string(),
            })
            .unwrap();
        store
            .unlink(user.into(), role.into(), RelationshipKind::ManyToMany)
            .unwrap();
        assert!(!store.revoke_role(user, role).unwrap());
    }

    #[test]
    fn unlinking_a_required_parent_is_rejected() {
        let (store, user) = store_with_user("John Doe");
        let profile = new_profile(&store, user, "bio");
        let result = store.unlink(user.into(), profile.into(), RelationshipKind::OneToOne);
        assert!(matches!(result, Err(RelmapError::Validation(_))));
    }

    #[test]
    fn mismatched_link_kind_is_rejected() {
        let (store, user) = store_with_user("John Doe");
        let role = store
            .create_role(&NewRole {
                name: "Admin".to_string(),
            })
            .unwrap();
        let result = store.link(user.into(), role.into(), RelationshipKind::OneToOne);
        assert!(matches!(result, Err(RelmapError::Validation(_))));
    }

    #[test]
    fn link_to_missing_record_is_not_found() {
        let (store, user) = store_with_user("John Doe");
        let result = store.link(user.into(), RoleId(5).into(), RelationshipKind::ManyToMany);
        assert!(matches!(
            result,
            Err(RelmapError::NotFound {
                kind: EntityKind::Role,
                id: 5
            })
        ));
    }

    #[test]
    fn set_author_moves_a_post() {
        let (store, john) = store_with_user("John Doe");
        let jane = store
            .create_user(&NewUser {
                name: "Jane".to_string(),
            })
            .unwrap();
        let post = store
            .create_post(&NewPost {
                title: "First Post".to_string(),
                description: "This is the first post".to_string(),
                user_id: Some(john),
            })
            .unwrap();

        store
            .link(jane.into(), post.into(), RelationshipKind::OneToMany)
            .unwrap();
        assert_eq!(store.export().posts[&post].user_id, jane);
    }

    #[test]
    fn todo_requires_title() {
        let store = Store::in_memory();
        let result = store.create_todo(&NewTodo { title: None });
        assert!(matches!(result, Err(RelmapError::Validation(_))));

        let id = store
            .create_todo(&NewTodo {
                title: Some("Buy milk".to_string()),
            })
            .unwrap();
        let updated = store
            .update_todo(
                id,
                &TodoUpdate {
                    title: Some("Buy oat milk".to_string()),
                },
            )
            .unwrap();
        assert_eq!(updated.title, "Buy oat milk");
    }

    #[test]
    fn update_missing_todo_is_not_found() {
        let store = Store::in_memory();
        let result = store.update_todo(
            TodoId(3),
            &TodoUpdate {
                title: Some("x".to_string()),
            },
        );
        assert!(matches!(result, Err(RelmapError::NotFound { .. })));
    }

    #[test]
    fn restrict_blocks_deleting_a_user_with_posts() {
        let (store, user) = store_with_user("John Doe");
        store
            .create_post(&NewPost {
                title: "t".to_string(),
                description: "d".to_string(),
                user_id: Some(user),
            })
            .unwrap();

        let result = store.delete(user.into());
        assert!(matches!(result, Err(RelmapError::Restricted { .. })));
        assert_eq!(store.export().users.len(), 1);
    }

    #[test]
    fn restrict_still_removes_role_rows() {
        let (store, user) = store_with_user("John Doe");
        let role = store
            .create_role(&NewRole {
                name: "Admin".to_string(),
            })
            .unwrap();
        store.assign_role(user, role).unwrap();

        store.delete(user.into()).unwrap();
        let tables = store.export();
        assert!(tables.users.is_empty());
        assert!(tables.user_roles.is_empty());
        assert_eq!(tables.roles.len(), 1);
    }

    #[test]
    fn cascade_removes_dependents() {
        let store = Store::open(&StoreConfig::default().with_delete_policy(DeletePolicy::Cascade))
            .unwrap();
        let user = store
            .create_user(&NewUser {
                name: "John Doe".to_string(),
            })
            .unwrap();
        new_profile(&store, user, "bio");
        store
            .create_post(&NewPost {
                title: "t".to_string(),
                description: "d".to_string(),
                user_id: Some(user),
            })
            .unwrap();

        store.delete(user.into()).unwrap();
        let tables = store.export();
        assert!(tables.users.is_empty());
        assert!(tables.profiles.is_empty());
        assert!(tables.posts.is_empty());
    }

    #[test]
    fn deleting_a_role_drops_its_links() {
        let (store, user) = store_with_user("John Doe");
        let role = store
            .create_role(&NewRole {
                name: "Editor".to_string(),
            })
            .unwrap();
        store.assign_role(user, role).unwrap();

        store.delete(role.into()).unwrap();
        assert!(store.export().user_roles.is_empty());
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let store = Store::in_memory();
        let first = store
            .create_todo(&NewTodo {
                title: Some("a".to_string()),
            })
            .unwrap();
        store.delete(first.into()).unwrap();
        let second = store
            .create_todo(&NewTodo {
                title: Some("b".to_string()),
            })
            .unwrap();
        assert_eq!(second, TodoId(2));
    }

    #[test]
    fn rename_user_changes_the_name() {
        let (store, user) = store_with_user("John Doe");
        let renamed = store.rename_user(user, "Jane").unwrap();
        assert_eq!(renamed.name, "Jane");
        assert_eq!(store.user(user).unwrap().name, "Jane");
    }

    #[test]
    fn rename_missing_user_is_not_found() {
        let store = Store::in_memory();
        let result = store.rename_user(UserId(7), "Nobody");
        assert!(matches!(
            result,
            Err(RelmapError::NotFound {
                kind: EntityKind::User,
                id: 7
            })
        ));
    }

    #[test]
    fn generic_one_to_one_link_enforces_cardinality() {
        let (store, john) = store_with_user("John Doe");
        let jane = store
            .create_user(&NewUser {
                name: "Jane".to_string(),
            })
            .unwrap();
        let johns = new_profile(&store, john, "john's");
        let janes = new_profile(&store, jane, "jane's");

        let result = store.link(janes.into(), john.into(), RelationshipKind::OneToOne);
        assert!(matches!(result, Err(RelmapError::Cardinality { .. })));
        assert_eq!(store.export().profiles[&johns].user_id, john);

        store
            .link_with(
                janes.into(),
                john.into(),
                RelationshipKind::OneToOne,
                LinkMode::Replace,
            )
            .unwrap();
        let tables = store.export();
        assert!(!tables.profiles.contains_key(&johns));
        assert_eq!(tables.profile_of(john).map(|p| p.id), Some(janes));
    }

    #[test]
    fn deleting_a_profile_or_post_leaves_the_user() {
        let (store, user) = store_with_user("John Doe");
        let profile = new_profile(&store, user, "bio");
        let post = store
            .create_post(&NewPost {
                title: "First Post".to_string(),
                description: "This is the first post".to_string(),
                user_id: Some(user),
            })
            .unwrap();

        store.delete(profile.into()).unwrap();
        store.delete(post.into()).unwrap();

        let tables = store.export();
        assert!(tables.profiles.is_empty());
        assert!(tables.posts.is_empty());
        assert!(tables.users.contains_key(&user));
    }

    #[test]
    fn deleting_a_missing_record_is_not_found() {
        let store = Store::in_memory();
        for target in [
            EntityId::from(UserId(3)),
            EntityId::from(ProfileId(3)),
            EntityId::from(PostId(3)),
            EntityId::from(RoleId(3)),
            EntityId::from(TodoId(3)),
        ] {
            let result = store.delete(target);
            assert!(
                matches!(result, Err(RelmapError::NotFound { kind, id: 3 }) if kind == target.kind()),
                "{target}"
            );
        }
    }
}
