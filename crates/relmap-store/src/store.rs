//! Store handle, table layout, and write discipline.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use serde::{Deserialize, Serialize};

use relmap_core::{
    EntityId, EntityKind, Order, Post, PostId, Profile, ProfileId, RelmapError, Result, Role,
    RoleId, StoreConfig, Todo, TodoId, User, UserId, UserRole,
};

use crate::snapshot;

/// Last id handed out per table. Ids are never reused.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sequences {
    pub user: i64,
    pub profile: i64,
    pub post: i64,
    pub role: i64,
    pub todo: i64,
}

impl Sequences {
    pub(crate) fn next(&mut self, kind: EntityKind) -> i64 {
        let slot = match kind {
            EntityKind::User => &mut self.user,
            EntityKind::Profile => &mut self.profile,
            EntityKind::Post => &mut self.post,
            EntityKind::Role => &mut self.role,
            EntityKind::Todo => &mut self.todo,
        };
        *slot += 1;
        *slot
    }

    pub(crate) fn current(&self, kind: EntityKind) -> i64 {
        match kind {
            EntityKind::User => self.user,
            EntityKind::Profile => self.profile,
            EntityKind::Post => self.post,
            EntityKind::Role => self.role,
            EntityKind::Todo => self.todo,
        }
    }
}

/// Every table the store holds. This is also the snapshot payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tables {
    pub users: BTreeMap<UserId, User>,
    pub profiles: BTreeMap<ProfileId, Profile>,
    pub posts: BTreeMap<PostId, Post>,
    pub roles: BTreeMap<RoleId, Role>,
    pub user_roles: BTreeSet<UserRole>,
    pub todos: BTreeMap<TodoId, Todo>,
    pub sequences: Sequences,
}

impl Tables {
    pub(crate) fn user(&self, id: UserId) -> Result<&User> {
        self.users.get(&id).ok_or_else(|| RelmapError::not_found(id))
    }

    pub(crate) fn profile(&self, id: ProfileId) -> Result<&Profile> {
        self.profiles
            .get(&id)
            .ok_or_else(|| RelmapError::not_found(id))
    }

    pub(crate) fn post(&self, id: PostId) -> Result<&Post> {
        self.posts.get(&id).ok_or_else(|| RelmapError::not_found(id))
    }

    pub(crate) fn role(&self, id: RoleId) -> Result<&Role> {
        self.roles.get(&id).ok_or_else(|| RelmapError::not_found(id))
    }

    pub(crate) fn todo(&self, id: TodoId) -> Result<&Todo> {
        self.todos.get(&id).ok_or_else(|| RelmapError::not_found(id))
    }

    /// Reverse lookup through the unique `profiles.user_id` key.
    pub(crate) fn profile_of(&self, user_id: UserId) -> Option<&Profile> {
        self.profiles.values().find(|p| p.user_id == user_id)
    }

    /// Filtered scan of `posts.user_id`.
    pub(crate) fn posts_of(&self, user_id: UserId) -> impl Iterator<Item = &Post> + '_ {
        self.posts.values().filter(move |p| p.user_id == user_id)
    }

    /// Join `user_roles` → `roles`.
    pub(crate) fn roles_of(&self, user_id: UserId) -> impl Iterator<Item = &Role> + '_ {
        self.user_roles
            .iter()
            .filter(move |link| link.user_id == user_id)
            .filter_map(move |link| self.roles.get(&link.role_id))
    }

    /// Join `user_roles` → `users`.
    pub(crate) fn users_of(&self, role_id: RoleId) -> impl Iterator<Item = &User> + '_ {
        self.user_roles
            .iter()
            .filter(move |link| link.role_id == role_id)
            .filter_map(move |link| self.users.get(&link.user_id))
    }

    /// Take the next id of `kind`. Fails if a record already holds it.
    pub(crate) fn allocate(&mut self, kind: EntityKind) -> Result<i64> {
        let raw = self.sequences.next(kind);
        let id = EntityId::new(kind, raw);
        if self.contains(id) {
            return Err(RelmapError::Duplicate { id });
        }
        Ok(raw)
    }

    pub(crate) fn contains(&self, id: EntityId) -> bool {
        match id {
            EntityId::User(id) => self.users.contains_key(&id),
            EntityId::Profile(id) => self.profiles.contains_key(&id),
            EntityId::Post(id) => self.posts.contains_key(&id),
            EntityId::Role(id) => self.roles.contains_key(&id),
            EntityId::Todo(id) => self.todos.contains_key(&id),
        }
    }

    fn max_id(&self, kind: EntityKind) -> i64 {
        let last = match kind {
            EntityKind::User => self.users.keys().next_back().map(|id| id.0),
            EntityKind::Profile => self.profiles.keys().next_back().map(|id| id.0),
            EntityKind::Post => self.posts.keys().next_back().map(|id| id.0),
            EntityKind::Role => self.roles.keys().next_back().map(|id| id.0),
            EntityKind::Todo => self.todos.keys().next_back().map(|id| id.0),
        };
        last.unwrap_or(0)
    }

    /// Check the invariants writes maintain, returning the first violation.
    ///
    /// Used on tables that did not come from this store's own writes.
    pub(crate) fn check_integrity(&self) -> std::result::Result<(), String> {
        for kind in EntityKind::ALL {
            let (seq, max) = (self.sequences.current(kind), self.max_id(kind));
            if seq < max {
                return Err(format!("{kind} sequence {seq} is behind stored id {max}"));
            }
        }

        let keyed = self.users.iter().all(|(k, v)| *k == v.id)
            && self.profiles.iter().all(|(k, v)| *k == v.id)
            && self.posts.iter().all(|(k, v)| *k == v.id)
            && self.roles.iter().all(|(k, v)| *k == v.id)
            && self.todos.iter().all(|(k, v)| *k == v.id);
        if !keyed {
            return Err("a record is stored under another record's id".to_string());
        }

        let mut owners = BTreeSet::new();
        for profile in self.profiles.values() {
            if !self.users.contains_key(&profile.user_id) {
                return Err(format!(
                    "Profile {} belongs to missing User {}",
                    profile.id, profile.user_id
                ));
            }
            if !owners.insert(profile.user_id) {
                return Err(format!("User {} has more than one Profile", profile.user_id));
            }
        }

        if let Some(post) = self
            .posts
            .values()
            .find(|p| !self.users.contains_key(&p.user_id))
        {
            return Err(format!(
                "Post {} belongs to missing User {}",
                post.id, post.user_id
            ));
        }

        if let Some(link) = self.user_roles.iter().find(|link| {
            !self.users.contains_key(&link.user_id) || !self.roles.contains_key(&link.role_id)
        }) {
            return Err(format!(
                "role link ({}, {}) names a missing record",
                link.user_id, link.role_id
            ));
        }

        Ok(())
    }

    pub(crate) fn count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::User => self.users.len(),
            EntityKind::Profile => self.profiles.len(),
            EntityKind::Post => self.posts.len(),
            EntityKind::Role => self.roles.len(),
            EntityKind::Todo => self.todos.len(),
        }
    }
}

/// Collect map values in the requested id order.
pub(crate) fn ordered<K: Ord, V: Clone>(map: &BTreeMap<K, V>, order: Order) -> Vec<V> {
    match order {
        Order::IdAsc => map.values().cloned().collect(),
        Order::IdDesc => map.values().rev().cloned().collect(),
    }
}

struct Inner {
    config: StoreConfig,
    tables: RwLock<Tables>,
}

/// Handle to an entity graph.
///
/// This is the single point of access for all reads and writes. Clone is
/// cheap (inner Arc). Reads share the lock; each write holds it exclusively
/// from its first check to its last insert.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

impl Store {
    /// A store with no backing file.
    pub fn in_memory() -> Self {
        Self::from_parts(StoreConfig::default(), Tables::default())
    }

    /// Open a store, loading its snapshot file if one is configured and present.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let tables = match &config.data_file {
            Some(path) => snapshot::load(path)?.unwrap_or_default(),
            None => Tables::default(),
        };

        tracing::info!(
            data_file = ?config.data_file,
            users = tables.users.len(),
            posts = tables.posts.len(),
            roles = tables.roles.len(),
            todos = tables.todos.len(),
            "Store opened"
        );
        Ok(Self::from_parts(config.clone(), tables))
    }

    fn from_parts(config: StoreConfig, tables: Tables) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                tables: RwLock::new(tables),
            }),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Ordering to use when the caller has no preference.
    pub fn default_order(&self) -> Order {
        self.inner.config.default_order
    }

    /// Write the current tables to the data file, if one is configured.
    pub fn flush(&self) -> Result<()> {
        let Some(path) = &self.inner.config.data_file else {
            return Ok(());
        };
        let tables = self.read();
        snapshot::save(path, &tables)?;
        tracing::info!(path = %path.display(), "Store flushed");
        Ok(())
    }

    /// Flush and release this handle.
    pub fn close(self) -> Result<()> {
        self.flush()?;
        tracing::info!("Store closed");
        Ok(())
    }

    /// A copy of every table, for export and tests.
    pub fn export(&self) -> Tables {
        self.read().clone()
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.inner
            .tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `op` to a working copy of the tables and swap it in only if the
    /// operation and the snapshot write both succeed.
    pub(crate) fn write<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut Tables) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self
            .inner
            .tables
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let mut working = guard.clone();
        let value = match f(&mut working) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(op, error = %e, "Write rejected");
                return Err(e);
            }
        };

        if self.inner.config.sync_on_write {
            if let Some(path) = &self.inner.config.data_file {
                snapshot::save(path, &working)?;
            }
        }

        *guard = working;
        Ok(value)
    }
}
