use crate::application::services::AccessControlService;
use crate::application::unit_groups::UnitGroupService;
use crate::domain::permission::Permission;
use crate::domain::role::Role;
use crate::infrastructure::{Database, InMemoryKeyValueStore, KeyValueStore};
use crate::interface::app_state::AppState;
use std::sync::Arc;

/// Creates an initialized database over a fresh in-memory store
pub async fn create_test_database() -> Arc<Database> {
    create_test_database_with_store(Arc::new(InMemoryKeyValueStore::new())).await
}

/// Creates an initialized database over the given store
pub async fn create_test_database_with_store(store: Arc<dyn KeyValueStore>) -> Arc<Database> {
    let database = Database::new(store);
    database
        .initialize()
        .await
        .expect("in-memory database initializes");
    Arc::new(database)
}

/// Creates a test application state with an in-memory store and no bootstrap
pub async fn create_test_app_state() -> Arc<AppState> {
    let database = create_test_database().await;
    let access_control = Arc::new(AccessControlService::new(database.clone()));
    let unit_groups = Arc::new(UnitGroupService::new(
        database.clone(),
        access_control.clone(),
    ));
    Arc::new(AppState {
        database,
        access_control,
        unit_groups,
    })
}

/// Creates the `editor` role with the `edit_doc` permission granted to it
pub async fn seed_editor_role(access: &AccessControlService) {
    access
        .add_role(Role::new("editor", "can edit"))
        .await
        .expect("add editor role");
    access
        .add_permission(Permission::new("edit_doc", "edit documents", "doc", "edit"))
        .await
        .expect("add edit_doc permission");
    access
        .add_role_perm("editor", ("doc", "edit"))
        .await
        .expect("grant doc:edit to editor");
}
