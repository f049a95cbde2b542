use crate::application::services::{AccessControlService, AccessResult};
use crate::application::unit_groups::UnitGroupService;
use crate::domain::permission::Permission;
use crate::domain::role::Role;
use tracing::{info, instrument};

pub const ADMIN_ROLE: &str = "admin";

/// Seeds the admin role with the unit-group permissions and makes its holders
/// exactly the configured administrators: listed users gain the role, stored
/// holders missing from the list lose it. Safe to run on every start.
#[instrument(skip(access))]
pub async fn bootstrap_admins(access: &AccessControlService, admins: &[String]) -> AccessResult<()> {
    access
        .add_role(Role::new(ADMIN_ROLE, "Manages the unit group registry"))
        .await?;

    let existing = access.get_permissions().await?;
    for pair in UnitGroupService::permission_pairs() {
        let name = format!("{}_{}", pair.object_name, pair.operation_name);
        if !existing.values().any(|p| p.matches(&pair)) && !existing.contains_key(&name) {
            access
                .add_permission(Permission::new(
                    name,
                    format!("May {} unit groups", pair.operation_name),
                    pair.object_name.as_str(),
                    pair.operation_name.as_str(),
                ))
                .await?;
        }
        access.add_role_perm(ADMIN_ROLE, pair).await?;
    }

    for holder in access.get_role_users(ADMIN_ROLE).await? {
        if !admins.contains(&holder) {
            access.revoke_user_role(&holder, ADMIN_ROLE).await?;
            info!(user = %holder, "admin role revoked from unlisted user");
        }
    }
    for admin in admins.iter().filter(|a| !a.is_empty()) {
        access.assign_user_role(admin, ADMIN_ROLE).await?;
    }
    info!(admins = admins.len(), "administrators bootstrapped");
    Ok(())
}
