use crate::domain::permission::{PermPair, Permission};
use crate::domain::role::Role;
use crate::domain::unit_group::UnitGroup;
use crate::infrastructure::{KeyValueStore, StoreError, StoreResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, instrument};

pub const ROLES_KEY: &str = "roles";
pub const PERMISSIONS_KEY: &str = "permissions";
pub const ROLE_PERMISSIONS_KEY: &str = "role_permissions";
pub const USER_ROLES_KEY: &str = "user_roles";
pub const BLOCKED_USERS_KEY: &str = "blocked_users";
pub const UNIT_GROUPS_KEY: &str = "unit_groups";

const COLLECTIONS: [&str; 6] = [
    ROLES_KEY,
    PERMISSIONS_KEY,
    ROLE_PERMISSIONS_KEY,
    USER_ROLES_KEY,
    BLOCKED_USERS_KEY,
    UNIT_GROUPS_KEY,
];

pub type Roles = BTreeMap<String, Role>;
pub type Permissions = BTreeMap<String, Permission>;
pub type RolePermMap = BTreeMap<String, BTreeSet<PermPair>>;
pub type UserRoleMap = BTreeMap<String, Vec<String>>;
pub type BlockedUsers = BTreeMap<String, String>;
pub type UnitGroups = BTreeMap<String, UnitGroup>;

/// Typed access to the named collections kept in a [`KeyValueStore`].
///
/// Construct it over a store, call [`Database::initialize`] once, then share
/// it. Every accessor fails with [`StoreError::NotReady`] until then.
pub struct Database {
    store: Arc<dyn KeyValueStore>,
    ready: AtomicBool,
}

impl Database {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            ready: AtomicBool::new(false),
        }
    }

    /// Seeds every missing collection with an empty value and marks the database ready.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> StoreResult<()> {
        let mut missing = Vec::new();
        for key in COLLECTIONS {
            if self.store.get(key).await?.is_none() {
                missing.push((key.to_string(), Value::Object(Default::default())));
            }
        }
        if !missing.is_empty() {
            debug!(count = missing.len(), "seeding empty collections");
            self.store.put_many(missing).await?;
        }
        self.ready.store(true, Ordering::Release);
        info!("database initialized");
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn ensure_ready(&self) -> StoreResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(StoreError::NotReady)
        }
    }

    async fn load<T: DeserializeOwned + Default>(&self, key: &str) -> StoreResult<T> {
        self.ensure_ready()?;
        match self.store.get(key).await? {
            Some(value) => {
                serde_json::from_value(value).map_err(|source| StoreError::CorruptCollection {
                    key: key.to_string(),
                    source,
                })
            }
            None => Ok(T::default()),
        }
    }

    /// Writes every collection in the batch in one store call.
    pub async fn commit(&self, batch: Batch) -> StoreResult<()> {
        self.ensure_ready()?;
        if batch.is_empty() {
            return Ok(());
        }
        debug!(collections = ?batch.keys(), "committing batch");
        self.store.put_many(batch.entries).await
    }

    pub async fn get_roles(&self) -> StoreResult<Roles> {
        self.load(ROLES_KEY).await
    }

    pub async fn update_roles(&self, roles: &Roles) -> StoreResult<()> {
        self.commit(Batch::new().roles(roles)?).await
    }

    pub async fn get_permissions(&self) -> StoreResult<Permissions> {
        self.load(PERMISSIONS_KEY).await
    }

    pub async fn update_permissions(&self, perms: &Permissions) -> StoreResult<()> {
        self.commit(Batch::new().permissions(perms)?).await
    }

    pub async fn get_role_perm_map(&self) -> StoreResult<RolePermMap> {
        self.load(ROLE_PERMISSIONS_KEY).await
    }

    pub async fn update_role_perm_map(&self, map: &RolePermMap) -> StoreResult<()> {
        self.commit(Batch::new().role_perm_map(map)?).await
    }

    pub async fn get_user_role_map(&self) -> StoreResult<UserRoleMap> {
        self.load(USER_ROLES_KEY).await
    }

    pub async fn update_user_role_map(&self, map: &UserRoleMap) -> StoreResult<()> {
        self.commit(Batch::new().user_role_map(map)?).await
    }

    pub async fn get_blocked_users(&self) -> StoreResult<BlockedUsers> {
        self.load(BLOCKED_USERS_KEY).await
    }

    pub async fn update_blocked_users(&self, blocked: &BlockedUsers) -> StoreResult<()> {
        self.commit(Batch::new().blocked_users(blocked)?).await
    }

    pub async fn get_unit_groups(&self) -> StoreResult<UnitGroups> {
        self.load(UNIT_GROUPS_KEY).await
    }

    pub async fn update_unit_groups(&self, groups: &UnitGroups) -> StoreResult<()> {
        self.commit(Batch::new().unit_groups(groups)?).await
    }
}

/// A set of whole-collection replacements applied together by [`Database::commit`].
#[derive(Debug, Default)]
pub struct Batch {
    entries: Vec<(String, Value)>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T: Serialize>(mut self, key: &str, value: &T) -> StoreResult<Self> {
        let value = serde_json::to_value(value)?;
        self.entries.retain(|(k, _)| k != key);
        self.entries.push((key.to_string(), value));
        Ok(self)
    }

    pub fn roles(self, roles: &Roles) -> StoreResult<Self> {
        self.with(ROLES_KEY, roles)
    }

    pub fn permissions(self, perms: &Permissions) -> StoreResult<Self> {
        self.with(PERMISSIONS_KEY, perms)
    }

    pub fn role_perm_map(self, map: &RolePermMap) -> StoreResult<Self> {
        self.with(ROLE_PERMISSIONS_KEY, map)
    }

    pub fn user_role_map(self, map: &UserRoleMap) -> StoreResult<Self> {
        self.with(USER_ROLES_KEY, map)
    }

    pub fn blocked_users(self, blocked: &BlockedUsers) -> StoreResult<Self> {
        self.with(BLOCKED_USERS_KEY, blocked)
    }

    pub fn unit_groups(self, groups: &UnitGroups) -> StoreResult<Self> {
        self.with(UNIT_GROUPS_KEY, groups)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryKeyValueStore;
    use serde_json::json;

    async fn ready_db() -> (Arc<InMemoryKeyValueStore>, Database) {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let db = Database::new(store.clone());
        db.initialize().await.unwrap();
        (store, db)
    }

    #[tokio::test]
    async fn test_operations_fail_before_initialize() {
        let db = Database::new(Arc::new(InMemoryKeyValueStore::new()));
        assert!(!db.is_ready());
        assert!(matches!(db.get_roles().await, Err(StoreError::NotReady)));
        assert!(matches!(
            db.update_blocked_users(&BlockedUsers::new()).await,
            Err(StoreError::NotReady)
        ));
    }

    #[tokio::test]
    async fn test_initialize_seeds_all_collections() {
        let (store, db) = ready_db().await;
        assert!(db.is_ready());
        let keys = store.keys().await.unwrap();
        for key in COLLECTIONS {
            assert!(keys.contains(&key.to_string()), "missing {key}");
        }
        assert!(db.get_roles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_keeps_existing_data() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        store
            .put(BLOCKED_USERS_KEY, json!({"bob": "spam"}))
            .await
            .unwrap();
        let db = Database::new(store);
        db.initialize().await.unwrap();
        let blocked = db.get_blocked_users().await.unwrap();
        assert_eq!(blocked.get("bob").map(String::as_str), Some("spam"));
    }

    #[tokio::test]
    async fn test_commit_writes_every_collection() {
        let (_, db) = ready_db().await;
        let mut roles = Roles::new();
        roles.insert("editor".to_string(), Role::new("editor", "can edit"));
        let mut user_roles = UserRoleMap::new();
        user_roles.insert("alice".to_string(), vec!["editor".to_string()]);

        let batch = Batch::new()
            .roles(&roles)
            .unwrap()
            .user_role_map(&user_roles)
            .unwrap();
        assert_eq!(batch.keys(), vec![ROLES_KEY, USER_ROLES_KEY]);
        db.commit(batch).await.unwrap();

        assert_eq!(db.get_roles().await.unwrap(), roles);
        assert_eq!(db.get_user_role_map().await.unwrap(), user_roles);
    }

    #[tokio::test]
    async fn test_empty_batch_commits_nothing() {
        let (_, db) = ready_db().await;
        let batch = Batch::new();
        assert!(batch.is_empty());
        db.commit(batch).await.unwrap();

        let batch = Batch::new().blocked_users(&BlockedUsers::new()).unwrap();
        assert!(!batch.is_empty());
    }

    #[tokio::test]
    async fn test_role_perm_sets_round_trip() {
        let (_, db) = ready_db().await;
        let mut map = RolePermMap::new();
        map.insert(
            "editor".to_string(),
            BTreeSet::from([PermPair::new("doc", "edit"), PermPair::new("doc", "read")]),
        );
        db.update_role_perm_map(&map).await.unwrap();
        assert_eq!(db.get_role_perm_map().await.unwrap(), map);
    }

    #[tokio::test]
    async fn test_corrupt_collection_is_reported() {
        let (store, db) = ready_db().await;
        store.put(ROLES_KEY, json!(["not", "a", "map"])).await.unwrap();
        match db.get_roles().await {
            Err(StoreError::CorruptCollection { key, .. }) => assert_eq!(key, ROLES_KEY),
            other => panic!("expected corrupt collection, got {other:?}"),
        }
    }
}
