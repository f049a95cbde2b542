use access_control_service::application::services::AccessControlService;
use access_control_service::domain::role::Role;
use access_control_service::infrastructure::{Database, KeyValueStore, PostgresKeyValueStore};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

#[tokio::test]
async fn test_postgres_store_round_trip() {
    // Skip if no database connection available
    let database_url = std::env::var("DATABASE_URL").ok();
    if database_url.is_none() {
        eprintln!("Skipping database connectivity test - no DATABASE_URL");
        return;
    }

    let pool = PgPool::connect(&database_url.unwrap()).await.unwrap();
    let store = PostgresKeyValueStore::new(pool);
    store.ensure_schema().await.unwrap();

    let key = format!("connectivity_{}", uuid::Uuid::new_v4().simple());
    store.put(&key, json!({"ok": true})).await.unwrap();
    assert_eq!(store.get(&key).await.unwrap(), Some(json!({"ok": true})));
    assert!(store.keys().await.unwrap().contains(&key));

    sqlx::query("DELETE FROM kv_store WHERE key = $1")
        .bind(&key)
        .execute(&store.pool)
        .await
        .unwrap();

    let db = Arc::new(Database::new(Arc::new(store)));
    db.initialize().await.unwrap();
    let access = AccessControlService::new(db);
    let role_name = format!("role_{}", uuid::Uuid::new_v4().simple());
    access.add_role(Role::new(role_name.as_str(), "")).await.unwrap();
    assert!(access.get_role(&role_name).await.unwrap().is_some());
    access.remove_role(role_name.as_str()).await.unwrap();

    println!("Database connectivity test passed successfully!");
}
