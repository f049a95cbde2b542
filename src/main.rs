use access_control_service::{AppConfig, AppStateBuilder, open_store};
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse environment variables
    let config = AppConfig::from_env().expect("Failed to parse environment variables");
    info!(backend = ?config.store_backend, "starting access control service");

    // Open the key-value store
    let store = open_store(&config).await.expect("Failed to open store");

    // Setup application state
    let app_state = AppStateBuilder::new()
        .with_store(store)
        .with_config(config.clone())
        .build()
        .await
        .expect("Failed to setup application");

    let roles = app_state
        .access_control
        .get_roles()
        .await
        .expect("Failed to read roles");
    let blocked = app_state
        .access_control
        .get_blocked_users()
        .await
        .expect("Failed to read block list");
    let groups = app_state
        .unit_groups
        .list_groups()
        .await
        .expect("Failed to read unit groups");

    info!(
        roles = roles.len(),
        blocked = blocked.len(),
        unit_groups = groups.len(),
        admins = ?config.admins,
        "store ready"
    );
    for group in &groups {
        println!("{} {} {}", group.unit_code, group.unit_name, group.link);
    }
}
