use crate::application::validators::AccessControlValidator;
use crate::domain::permission::{PermPair, PermRef, Permission};
use crate::domain::role::{Role, RoleRef};
use crate::domain::user::UserPermissions;
use crate::infrastructure::database::{BlockedUsers, Permissions, Roles};
use crate::infrastructure::{Batch, Database, StoreError};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// Access-control error types
#[derive(Debug, thiserror::Error)]
pub enum AccessControlError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{message}")]
    InvalidUser { user: String, message: String },
    #[error("{message}")]
    InvalidPermission { perm: PermPair, message: String },
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl AccessControlError {
    fn invalid_user(user: &str, message: String) -> Self {
        AccessControlError::InvalidUser {
            user: user.to_string(),
            message,
        }
    }

    fn invalid_permission(perm: &PermPair, message: String) -> Self {
        AccessControlError::InvalidPermission {
            perm: perm.clone(),
            message,
        }
    }
}

pub type AccessResult<T> = Result<T, AccessControlError>;

/// Role-based access-control engine.
///
/// Holds no state of its own between calls: every operation re-reads the
/// collections it needs from the [`Database`]. Mutations hold the write guard
/// for their whole read-modify-write cycle; multi-collection reads hold the
/// read guard so they observe one consistent state.
pub struct AccessControlService {
    db: Arc<Database>,
    lock: RwLock<()>,
}

impl AccessControlService {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            lock: RwLock::new(()),
        }
    }

    // ---- roles ----

    /// Returns the available roles indexed by name.
    pub async fn get_roles(&self) -> AccessResult<Roles> {
        Ok(self.db.get_roles().await?)
    }

    pub async fn get_role(&self, role_name: &str) -> AccessResult<Option<Role>> {
        AccessControlValidator::validate_role_name(role_name)?;
        let mut roles = self.db.get_roles().await?;
        Ok(roles.remove(role_name))
    }

    /// Adds a role. An existing role with the same name is left untouched.
    #[instrument(skip(self, role), fields(role_name = %role.name))]
    pub async fn add_role(&self, role: Role) -> AccessResult<()> {
        AccessControlValidator::validate_role_name(&role.name)?;
        let _guard = self.lock.write().await;

        let mut roles = self.db.get_roles().await?;
        if roles.contains_key(&role.name) {
            debug!("role already exists");
            return Ok(());
        }
        roles.insert(role.name.clone(), role);
        self.db.update_roles(&roles).await?;
        info!("role added");
        Ok(())
    }

    /// Removes a role, stripping it from every user and dropping its grants.
    pub async fn remove_role<'a>(&self, role: impl Into<RoleRef<'a>>) -> AccessResult<()> {
        let role: RoleRef<'a> = role.into();
        let role_name = role.name();
        AccessControlValidator::validate_role_name(role_name)?;
        let _guard = self.lock.write().await;

        let mut roles = self.db.get_roles().await?;
        if roles.remove(role_name).is_none() {
            debug!(role = role_name, "role does not exist, nothing to remove");
            return Ok(());
        }

        let mut user_role_map = self.db.get_user_role_map().await?;
        for user_roles in user_role_map.values_mut() {
            user_roles.retain(|r| r != role_name);
        }
        let mut role_perm_map = self.db.get_role_perm_map().await?;
        role_perm_map.remove(role_name);

        let batch = Batch::new()
            .user_role_map(&user_role_map)?
            .role_perm_map(&role_perm_map)?
            .roles(&roles)?;
        self.db.commit(batch).await?;
        info!(role = role_name, "role removed");
        Ok(())
    }

    // ---- permissions ----

    /// Returns the available permissions indexed by name.
    pub async fn get_permissions(&self) -> AccessResult<Permissions> {
        Ok(self.db.get_permissions().await?)
    }

    pub async fn get_permission(&self, perm_name: &str) -> AccessResult<Option<Permission>> {
        AccessControlValidator::validate_permission_name(perm_name)?;
        let mut perms = self.db.get_permissions().await?;
        Ok(perms.remove(perm_name))
    }

    /// Adds a permission. Fails if one with the same name is already registered.
    #[instrument(skip(self, perm), fields(permission = %perm.name))]
    pub async fn add_permission(&self, perm: Permission) -> AccessResult<()> {
        AccessControlValidator::validate_permission_name(&perm.name)?;
        let pair = perm.pair();
        AccessControlValidator::validate_pair(&pair)?;
        let _guard = self.lock.write().await;

        let mut perms = self.db.get_permissions().await?;
        if perms.contains_key(&perm.name) {
            warn!("permission name already registered");
            return Err(AccessControlError::invalid_permission(
                &pair,
                format!("Permission '{}' is already in database.", perm.name),
            ));
        }
        perms.insert(perm.name.clone(), perm);
        self.db.update_permissions(&perms).await?;
        info!(pair = %pair, "permission added");
        Ok(())
    }

    /// Removes the permission carrying the given pair and revokes it from every role.
    pub async fn remove_permission<'a>(&self, perm: impl Into<PermRef<'a>>) -> AccessResult<()> {
        let perm: PermRef<'a> = perm.into();
        let pair = perm.into_pair();
        AccessControlValidator::validate_pair(&pair)?;
        let _guard = self.lock.write().await;

        let mut perms = self.db.get_permissions().await?;
        let perm_name = perms
            .iter()
            .find(|(_, p)| p.matches(&pair))
            .map(|(name, _)| name.clone())
            .ok_or_else(|| {
                AccessControlError::invalid_permission(
                    &pair,
                    format!("Permission {pair} does not exist."),
                )
            })?;

        let mut role_perm_map = self.db.get_role_perm_map().await?;
        for role_perms in role_perm_map.values_mut() {
            role_perms.remove(&pair);
        }
        perms.remove(&perm_name);

        let batch = Batch::new()
            .role_perm_map(&role_perm_map)?
            .permissions(&perms)?;
        self.db.commit(batch).await?;
        info!(permission = %perm_name, pair = %pair, "permission removed");
        Ok(())
    }

    // ---- role permissions ----

    /// Returns the pairs granted to a role; empty if it has none.
    pub async fn get_role_perms<'a>(
        &self,
        role: impl Into<RoleRef<'a>>,
    ) -> AccessResult<BTreeSet<PermPair>> {
        let role: RoleRef<'a> = role.into();
        let role_name = role.name();
        AccessControlValidator::validate_role_name(role_name)?;
        let mut role_perm_map = self.db.get_role_perm_map().await?;
        Ok(role_perm_map.remove(role_name).unwrap_or_default())
    }

    pub async fn add_role_perm<'a>(
        &self,
        role: impl Into<RoleRef<'a>>,
        pair: impl Into<PermPair>,
    ) -> AccessResult<()> {
        let role: RoleRef<'a> = role.into();
        let role_name = role.name();
        let pair: PermPair = pair.into();
        AccessControlValidator::validate_role_name(role_name)?;
        AccessControlValidator::validate_pair(&pair)?;
        let _guard = self.lock.write().await;

        let mut role_perm_map = self.db.get_role_perm_map().await?;
        role_perm_map
            .entry(role_name.to_string())
            .or_default()
            .insert(pair.clone());
        self.db.update_role_perm_map(&role_perm_map).await?;
        info!(role = role_name, pair = %pair, "permission granted to role");
        Ok(())
    }

    /// Revokes a pair from a role. Fails if the role does not hold it.
    pub async fn remove_role_perm<'a>(
        &self,
        role: impl Into<RoleRef<'a>>,
        pair: impl Into<PermPair>,
    ) -> AccessResult<()> {
        let role: RoleRef<'a> = role.into();
        let role_name = role.name();
        let pair: PermPair = pair.into();
        AccessControlValidator::validate_role_name(role_name)?;
        AccessControlValidator::validate_pair(&pair)?;
        let _guard = self.lock.write().await;

        let mut role_perm_map = self.db.get_role_perm_map().await?;
        let removed = role_perm_map
            .get_mut(role_name)
            .is_some_and(|role_perms| role_perms.remove(&pair));
        if !removed {
            return Err(AccessControlError::invalid_permission(
                &pair,
                format!("Permission {pair} is not granted to role '{role_name}'."),
            ));
        }
        self.db.update_role_perm_map(&role_perm_map).await?;
        info!(role = role_name, pair = %pair, "permission revoked from role");
        Ok(())
    }

    // ---- users ----

    /// Returns the user's role names in assignment order.
    pub async fn get_user_roles(&self, user_name: &str) -> AccessResult<Vec<String>> {
        AccessControlValidator::validate_user_name(user_name)?;
        let mut user_role_map = self.db.get_user_role_map().await?;
        Ok(user_role_map.remove(user_name).unwrap_or_default())
    }

    /// Assigns an existing role to a user. Assigning a held role is a no-op.
    pub async fn assign_user_role<'a>(
        &self,
        user_name: &str,
        role: impl Into<RoleRef<'a>>,
    ) -> AccessResult<()> {
        let role: RoleRef<'a> = role.into();
        let role_name = role.name();
        AccessControlValidator::validate_user_name(user_name)?;
        AccessControlValidator::validate_role_name(role_name)?;
        let _guard = self.lock.write().await;

        let roles = self.db.get_roles().await?;
        if !roles.contains_key(role_name) {
            return Err(AccessControlError::InvalidArgument(format!(
                "Role '{role_name}' does not exist."
            )));
        }

        let mut user_role_map = self.db.get_user_role_map().await?;
        let user_roles = user_role_map.entry(user_name.to_string()).or_default();
        if user_roles.iter().any(|r| r == role_name) {
            return Ok(());
        }
        user_roles.push(role_name.to_string());
        self.db.update_user_role_map(&user_role_map).await?;
        info!(user = user_name, role = role_name, "role assigned to user");
        Ok(())
    }

    /// Takes a role away from a user. Returns whether the user held it.
    pub async fn revoke_user_role<'a>(
        &self,
        user_name: &str,
        role: impl Into<RoleRef<'a>>,
    ) -> AccessResult<bool> {
        let role: RoleRef<'a> = role.into();
        let role_name = role.name();
        AccessControlValidator::validate_user_name(user_name)?;
        AccessControlValidator::validate_role_name(role_name)?;
        let _guard = self.lock.write().await;

        let mut user_role_map = self.db.get_user_role_map().await?;
        let Some(user_roles) = user_role_map.get_mut(user_name) else {
            return Ok(false);
        };
        let before = user_roles.len();
        user_roles.retain(|r| r != role_name);
        if user_roles.len() == before {
            return Ok(false);
        }
        self.db.update_user_role_map(&user_role_map).await?;
        info!(user = user_name, role = role_name, "role revoked from user");
        Ok(true)
    }

    /// Users holding the given role, ordered by user name.
    pub async fn get_role_users<'a>(
        &self,
        role: impl Into<RoleRef<'a>>,
    ) -> AccessResult<Vec<String>> {
        let role: RoleRef<'a> = role.into();
        let role_name = role.name();
        AccessControlValidator::validate_role_name(role_name)?;
        let _guard = self.lock.read().await;

        let user_role_map = self.db.get_user_role_map().await?;
        Ok(user_role_map
            .into_iter()
            .filter(|(_, roles)| roles.iter().any(|r| r == role_name))
            .map(|(user, _)| user)
            .collect())
    }

    /// Snapshot of every `(role, pair)` the user is granted.
    pub async fn get_user_perms(&self, user_name: &str) -> AccessResult<UserPermissions> {
        AccessControlValidator::validate_user_name(user_name)?;
        let _guard = self.lock.read().await;
        self.load_user_perms(user_name).await
    }

    pub async fn user_has_role<'a>(
        &self,
        user_name: &str,
        role: impl Into<RoleRef<'a>>,
    ) -> AccessResult<bool> {
        let role: RoleRef<'a> = role.into();
        let role_name = role.name();
        AccessControlValidator::validate_user_name(user_name)?;
        AccessControlValidator::validate_role_name(role_name)?;
        let user_roles = self.get_user_roles(user_name).await?;
        Ok(user_roles.iter().any(|r| r == role_name))
    }

    pub async fn user_has_perm(
        &self,
        user_name: &str,
        pair: impl Into<PermPair>,
    ) -> AccessResult<bool> {
        let pair: PermPair = pair.into();
        AccessControlValidator::validate_user_name(user_name)?;
        AccessControlValidator::validate_pair(&pair)?;
        let _guard = self.lock.read().await;
        Ok(self.load_user_perms(user_name).await?.contains(&pair))
    }

    async fn load_user_perms(&self, user_name: &str) -> AccessResult<UserPermissions> {
        let mut user_role_map = self.db.get_user_role_map().await?;
        let role_perm_map = self.db.get_role_perm_map().await?;
        let roles = user_role_map.remove(user_name).unwrap_or_default();
        Ok(UserPermissions::new(roles, role_perm_map))
    }

    // ---- block list ----

    pub async fn user_is_blocked(&self, user_name: &str) -> AccessResult<bool> {
        AccessControlValidator::validate_user_name(user_name)?;
        let blocked_users = self.db.get_blocked_users().await?;
        Ok(blocked_users.contains_key(user_name))
    }

    /// Returns the blocked users with the reason each was blocked.
    pub async fn get_blocked_users(&self) -> AccessResult<BlockedUsers> {
        Ok(self.db.get_blocked_users().await?)
    }

    /// Adds the given user to the block list.
    #[instrument(skip(self, reason))]
    pub async fn block_user(&self, user_name: &str, reason: &str) -> AccessResult<()> {
        AccessControlValidator::validate_user_name(user_name)?;
        let _guard = self.lock.write().await;

        let mut blocked_users = self.db.get_blocked_users().await?;
        if blocked_users.contains_key(user_name) {
            return Err(AccessControlError::invalid_user(
                user_name,
                format!("User {user_name} is already blocked."),
            ));
        }
        blocked_users.insert(user_name.to_string(), reason.to_string());
        self.db.update_blocked_users(&blocked_users).await?;
        info!(reason, "user blocked");
        Ok(())
    }

    /// Removes the given user from the block list.
    #[instrument(skip(self))]
    pub async fn unblock_user(&self, user_name: &str) -> AccessResult<()> {
        AccessControlValidator::validate_user_name(user_name)?;
        let _guard = self.lock.write().await;

        let mut blocked_users = self.db.get_blocked_users().await?;
        if blocked_users.remove(user_name).is_none() {
            return Err(AccessControlError::invalid_user(
                user_name,
                format!("User {user_name} is not blocked."),
            ));
        }
        self.db.update_blocked_users(&blocked_users).await?;
        info!("user unblocked");
        Ok(())
    }

    /// Decides whether the user may perform the action. Blocked users never may.
    pub async fn user_is_authorized(
        &self,
        user_name: &str,
        pair: impl Into<PermPair>,
    ) -> AccessResult<bool> {
        let pair: PermPair = pair.into();
        AccessControlValidator::validate_user_name(user_name)?;
        let _guard = self.lock.read().await;

        let blocked_users = self.db.get_blocked_users().await?;
        if blocked_users.contains_key(user_name) {
            debug!(user = user_name, pair = %pair, "denied: user is blocked");
            return Ok(false);
        }
        AccessControlValidator::validate_pair(&pair)?;
        let granted = self.load_user_perms(user_name).await?.contains(&pair);
        debug!(user = user_name, pair = %pair, granted, "authorization decided");
        Ok(granted)
    }
}
