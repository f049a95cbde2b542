use crate::application::services::AccessControlService;
use crate::application::unit_groups::UnitGroupService;
use crate::infrastructure::Database;
use std::sync::Arc;

/// Everything the command-handling layer needs, shared behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub database: Arc<Database>,
    pub access_control: Arc<AccessControlService>,
    pub unit_groups: Arc<UnitGroupService>,
}
