pub mod data_registry;
pub mod loader;
pub mod record;
pub mod rules;
pub mod store;
pub mod validate;
