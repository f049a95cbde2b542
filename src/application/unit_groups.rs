use crate::application::services::{AccessControlError, AccessControlService};
use crate::domain::permission::PermPair;
use crate::domain::unit_group::{
    UnitGroup, is_valid_invite_link, is_valid_unit_code, normalize_unit_code,
};
use crate::infrastructure::{Database, StoreError};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

pub const UNIT_GROUP_OBJECT: &str = "unit_group";
pub const ADD_OPERATION: &str = "add";
pub const UPDATE_OPERATION: &str = "update";
pub const REMOVE_OPERATION: &str = "remove";

/// Unit group registry error types
#[derive(Debug, thiserror::Error)]
pub enum UnitGroupError {
    #[error("{0} is a malformed unit code")]
    MalformedUnitCode(String),
    #[error("Bad link {link} given for {unit_code}")]
    BadLink { unit_code: String, link: String },
    #[error("Bad unit name for {0}")]
    BadUnitName(String),
    #[error("No known group for {0}")]
    NotFound(String),
    #[error("{actor} is not authorized to {operation} unit groups")]
    Unauthorized { actor: String, operation: String },
    #[error(transparent)]
    AccessControl(#[from] AccessControlError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Registry of invitation links, one per academic unit.
///
/// Reads are open to everyone; each mutation requires the acting user to be
/// authorized for `("unit_group", <operation>)`. Authorization is decided
/// while the registry write lock is held, so mutations are checked in the
/// order they are applied. A block that lands after the check takes effect
/// from the next mutation on.
pub struct UnitGroupService {
    db: Arc<Database>,
    access: Arc<AccessControlService>,
    write_lock: Mutex<()>,
}

impl UnitGroupService {
    pub fn new(db: Arc<Database>, access: Arc<AccessControlService>) -> Self {
        Self {
            db,
            access,
            write_lock: Mutex::new(()),
        }
    }

    /// The permission pairs guarding each registry mutation.
    pub fn permission_pairs() -> [PermPair; 3] {
        [
            PermPair::new(UNIT_GROUP_OBJECT, ADD_OPERATION),
            PermPair::new(UNIT_GROUP_OBJECT, UPDATE_OPERATION),
            PermPair::new(UNIT_GROUP_OBJECT, REMOVE_OPERATION),
        ]
    }

    async fn authorize(&self, actor: &str, operation: &str) -> Result<(), UnitGroupError> {
        let pair = PermPair::new(UNIT_GROUP_OBJECT, operation);
        if self.access.user_is_authorized(actor, pair).await? {
            return Ok(());
        }
        warn!(actor, operation, "unauthorized unit group mutation");
        Err(UnitGroupError::Unauthorized {
            actor: actor.to_string(),
            operation: operation.to_string(),
        })
    }

    fn checked_code(unit_code: &str) -> Result<String, UnitGroupError> {
        let unit_code = normalize_unit_code(unit_code);
        if !is_valid_unit_code(&unit_code) {
            return Err(UnitGroupError::MalformedUnitCode(unit_code));
        }
        Ok(unit_code)
    }

    pub async fn get_group(&self, unit_code: &str) -> Result<UnitGroup, UnitGroupError> {
        let unit_code = Self::checked_code(unit_code)?;
        let mut groups = self.db.get_unit_groups().await?;
        groups
            .remove(&unit_code)
            .ok_or(UnitGroupError::NotFound(unit_code))
    }

    pub async fn contains(&self, unit_code: &str) -> Result<bool, UnitGroupError> {
        let groups = self.db.get_unit_groups().await?;
        Ok(groups.contains_key(&normalize_unit_code(unit_code)))
    }

    /// All registered groups ordered by unit code.
    pub async fn list_groups(&self) -> Result<Vec<UnitGroup>, UnitGroupError> {
        let groups = self.db.get_unit_groups().await?;
        Ok(groups.into_values().collect())
    }

    /// Groups whose unit code starts with the given programme prefix.
    pub async fn list_groups_with_prefix(
        &self,
        prefix: &str,
    ) -> Result<Vec<UnitGroup>, UnitGroupError> {
        let prefix = prefix.to_ascii_uppercase();
        let groups = self.db.get_unit_groups().await?;
        Ok(groups
            .into_values()
            .filter(|group| group.prefix() == prefix)
            .collect())
    }

    /// Registers a group, replacing any existing entry for the same unit.
    #[instrument(skip(self))]
    pub async fn add_group(
        &self,
        actor: &str,
        unit_code: &str,
        unit_name: &str,
        link: &str,
    ) -> Result<UnitGroup, UnitGroupError> {
        let _guard = self.write_lock.lock().await;
        self.authorize(actor, ADD_OPERATION).await?;
        let unit_code = Self::checked_code(unit_code)?;
        if !is_valid_invite_link(link) {
            return Err(UnitGroupError::BadLink {
                unit_code,
                link: link.to_string(),
            });
        }
        let unit_name = unit_name.trim();
        if unit_name.is_empty() {
            return Err(UnitGroupError::BadUnitName(unit_code));
        }

        let group = UnitGroup {
            unit_code: unit_code.clone(),
            unit_name: unit_name.to_string(),
            link: link.to_string(),
        };
        let mut groups = self.db.get_unit_groups().await?;
        groups.insert(unit_code, group.clone());
        self.db.update_unit_groups(&groups).await?;
        info!("unit group added");
        Ok(group)
    }

    #[instrument(skip(self))]
    pub async fn update_name(
        &self,
        actor: &str,
        unit_code: &str,
        unit_name: &str,
    ) -> Result<UnitGroup, UnitGroupError> {
        self.modify(actor, unit_code, |unit_code, group| {
            let unit_name = unit_name.trim();
            if unit_name.is_empty() {
                return Err(UnitGroupError::BadUnitName(unit_code.to_string()));
            }
            group.unit_name = unit_name.to_string();
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn update_link(
        &self,
        actor: &str,
        unit_code: &str,
        link: &str,
    ) -> Result<UnitGroup, UnitGroupError> {
        self.modify(actor, unit_code, |unit_code, group| {
            if !is_valid_invite_link(link) {
                return Err(UnitGroupError::BadLink {
                    unit_code: unit_code.to_string(),
                    link: link.to_string(),
                });
            }
            group.link = link.to_string();
            Ok(())
        })
        .await
    }

    /// Applies an update to an existing group after authorizing `actor`.
    async fn modify(
        &self,
        actor: &str,
        unit_code: &str,
        apply: impl FnOnce(&str, &mut UnitGroup) -> Result<(), UnitGroupError>,
    ) -> Result<UnitGroup, UnitGroupError> {
        let _guard = self.write_lock.lock().await;
        self.authorize(actor, UPDATE_OPERATION).await?;
        let unit_code = Self::checked_code(unit_code)?;
        let mut groups = self.db.get_unit_groups().await?;
        let Some(group) = groups.get_mut(&unit_code) else {
            return Err(UnitGroupError::NotFound(unit_code));
        };
        apply(&unit_code, group)?;
        let updated = group.clone();
        self.db.update_unit_groups(&groups).await?;
        info!(unit_code = %updated.unit_code, "unit group updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn remove_group(
        &self,
        actor: &str,
        unit_code: &str,
    ) -> Result<UnitGroup, UnitGroupError> {
        let _guard = self.write_lock.lock().await;
        self.authorize(actor, REMOVE_OPERATION).await?;
        let unit_code = Self::checked_code(unit_code)?;

        let mut groups = self.db.get_unit_groups().await?;
        let removed = groups
            .remove(&unit_code)
            .ok_or_else(|| UnitGroupError::NotFound(unit_code.clone()))?;
        self.db.update_unit_groups(&groups).await?;
        info!("unit group removed");
        Ok(removed)
    }
}
