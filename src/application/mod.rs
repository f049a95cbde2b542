// Application layer: use cases over the domain and the persistence façade
pub mod bootstrap;
pub mod services;
pub mod unit_groups;
pub mod validators;
