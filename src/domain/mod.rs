// Domain layer: entities and value objects
pub mod permission;
pub mod role;
pub mod unit_group;
pub mod user;
