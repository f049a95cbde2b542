use access_control_service::application::bootstrap::{ADMIN_ROLE, bootstrap_admins};
use access_control_service::application::unit_groups::UnitGroupError;
use access_control_service::domain::role::Role;
use access_control_service::interface::AppState;
use access_control_service::test_utils::create_test_app_state;
use std::sync::Arc;

async fn state_with_admin() -> Arc<AppState> {
    let state = create_test_app_state().await;
    bootstrap_admins(&state.access_control, &["admin1".to_string()])
        .await
        .unwrap();
    state
}

#[tokio::test]
async fn test_admin_can_add_and_get_group() {
    let state = state_with_admin().await;
    let groups = &state.unit_groups;

    let added = groups
        .add_group("admin1", "ict133", "Structured Programming", "https://t.me/+abc")
        .await
        .unwrap();
    assert_eq!(added.unit_code, "ICT133");

    let found = groups.get_group("ICT133").await.unwrap();
    assert_eq!(found, added);
    assert!(groups.contains("ict133").await.unwrap());
}

#[tokio::test]
async fn test_non_admin_cannot_mutate() {
    let state = state_with_admin().await;
    let err = state
        .unit_groups
        .add_group("student", "ICT133", "Structured Programming", "https://t.me/+abc")
        .await
        .unwrap_err();
    assert!(matches!(err, UnitGroupError::Unauthorized { ref actor, .. } if actor == "student"));
    assert!(state.unit_groups.list_groups().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_blocked_admin_cannot_mutate() {
    let state = state_with_admin().await;
    state
        .access_control
        .block_user("admin1", "compromised account")
        .await
        .unwrap();

    assert!(matches!(
        state
            .unit_groups
            .add_group("admin1", "ICT133", "Structured Programming", "https://t.me/+abc")
            .await,
        Err(UnitGroupError::Unauthorized { .. })
    ));
}

#[tokio::test]
async fn test_validation_errors() {
    let state = state_with_admin().await;
    let groups = &state.unit_groups;

    assert!(matches!(
        groups.add_group("admin1", "ICT13", "Name", "https://t.me/+abc").await,
        Err(UnitGroupError::MalformedUnitCode(_))
    ));
    assert!(matches!(
        groups.add_group("admin1", "ICT133", "Name", "https://example.com/abc").await,
        Err(UnitGroupError::BadLink { .. })
    ));
    assert!(matches!(
        groups.add_group("admin1", "ICT133", "  ", "https://t.me/+abc").await,
        Err(UnitGroupError::BadUnitName(_))
    ));
    assert!(matches!(
        groups.get_group("ICT133").await,
        Err(UnitGroupError::NotFound(_))
    ));
    assert!(matches!(
        groups.get_group("bad").await,
        Err(UnitGroupError::MalformedUnitCode(_))
    ));
}

#[tokio::test]
async fn test_update_and_remove() {
    let state = state_with_admin().await;
    let groups = &state.unit_groups;
    groups
        .add_group("admin1", "ICT133", "Structured Programming", "https://t.me/+abc")
        .await
        .unwrap();

    let renamed = groups
        .update_name("admin1", "ICT133", "Programming Fundamentals")
        .await
        .unwrap();
    assert_eq!(renamed.unit_name, "Programming Fundamentals");
    assert_eq!(renamed.link, "https://t.me/+abc");

    let relinked = groups
        .update_link("admin1", "ict133", "https://t.me/+xyz")
        .await
        .unwrap();
    assert_eq!(relinked.link, "https://t.me/+xyz");
    assert_eq!(relinked.unit_name, "Programming Fundamentals");

    assert!(matches!(
        groups.update_link("admin1", "ICT999", "https://t.me/+xyz").await,
        Err(UnitGroupError::NotFound(_))
    ));

    groups.remove_group("admin1", "ICT133").await.unwrap();
    assert!(matches!(
        groups.remove_group("admin1", "ICT133").await,
        Err(UnitGroupError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_list_groups_sorted_and_by_prefix() {
    let state = state_with_admin().await;
    let groups = &state.unit_groups;
    for (code, name) in [
        ("MTH219", "Discrete Mathematics"),
        ("ICT162", "Object Oriented Programming"),
        ("ICT133", "Structured Programming"),
    ] {
        groups
            .add_group("admin1", code, name, "https://t.me/+abc")
            .await
            .unwrap();
    }

    let codes: Vec<String> = groups
        .list_groups()
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.unit_code)
        .collect();
    assert_eq!(codes, vec!["ICT133", "ICT162", "MTH219"]);

    let ict = groups.list_groups_with_prefix("ict").await.unwrap();
    assert_eq!(ict.len(), 2);
}

#[tokio::test]
async fn test_bootstrap_is_idempotent() {
    let state = state_with_admin().await;
    let admins = vec!["admin1".to_string(), "admin2".to_string()];
    bootstrap_admins(&state.access_control, &admins).await.unwrap();
    bootstrap_admins(&state.access_control, &admins).await.unwrap();

    let access = &state.access_control;
    assert_eq!(access.get_permissions().await.unwrap().len(), 3);
    assert_eq!(access.get_role_perms(ADMIN_ROLE).await.unwrap().len(), 3);
    assert_eq!(access.get_user_roles("admin1").await.unwrap(), vec![ADMIN_ROLE]);
    assert!(access.user_has_role("admin2", ADMIN_ROLE).await.unwrap());
}

#[tokio::test]
async fn test_bootstrap_revokes_admins_dropped_from_config() {
    let state = create_test_app_state().await;
    let access = &state.access_control;
    access.add_role(Role::new("viewer", "")).await.unwrap();
    access.assign_user_role("bob", "viewer").await.unwrap();

    bootstrap_admins(access, &["alice".to_string(), "bob".to_string()])
        .await
        .unwrap();
    bootstrap_admins(access, &["alice".to_string()]).await.unwrap();

    assert_eq!(access.get_role_users(ADMIN_ROLE).await.unwrap(), vec!["alice"]);
    assert_eq!(access.get_user_roles("bob").await.unwrap(), vec!["viewer"]);
    assert!(matches!(
        state
            .unit_groups
            .add_group("bob", "ICT133", "Structured Programming", "https://t.me/+abc")
            .await,
        Err(UnitGroupError::Unauthorized { ref actor, .. }) if actor == "bob"
    ));
    state
        .unit_groups
        .add_group("alice", "ICT133", "Structured Programming", "https://t.me/+abc")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_block_stops_every_later_mutation() {
    let state = state_with_admin().await;
    let groups = &state.unit_groups;
    groups
        .add_group("admin1", "ICT133", "Structured Programming", "https://t.me/+abc")
        .await
        .unwrap();

    state
        .access_control
        .block_user("admin1", "compromised account")
        .await
        .unwrap();

    assert!(matches!(
        groups.update_name("admin1", "ICT133", "Renamed").await,
        Err(UnitGroupError::Unauthorized { ref operation, .. }) if operation == "update"
    ));
    assert!(matches!(
        groups.update_link("admin1", "ICT133", "https://t.me/+xyz").await,
        Err(UnitGroupError::Unauthorized { .. })
    ));
    assert!(matches!(
        groups.remove_group("admin1", "ICT133").await,
        Err(UnitGroupError::Unauthorized { ref operation, .. }) if operation == "remove"
    ));

    let unchanged = groups.get_group("ICT133").await.unwrap();
    assert_eq!(unchanged.unit_name, "Structured Programming");
    assert_eq!(unchanged.link, "https://t.me/+abc");
}

#[tokio::test]
async fn test_update_validation_runs_after_lookup() {
    let state = state_with_admin().await;
    let groups = &state.unit_groups;
    groups
        .add_group("admin1", "ICT133", "Structured Programming", "https://t.me/+abc")
        .await
        .unwrap();

    assert!(matches!(
        groups.update_name("admin1", "ICT133", "   ").await,
        Err(UnitGroupError::BadUnitName(ref code)) if code == "ICT133"
    ));
    assert!(matches!(
        groups.update_link("admin1", "ict133", "t.me/+xyz").await,
        Err(UnitGroupError::BadLink { .. })
    ));
    assert!(matches!(
        groups.update_name("admin1", "ICT1", "Name").await,
        Err(UnitGroupError::MalformedUnitCode(_))
    ));
}
