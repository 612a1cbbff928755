// src/db/models/mod.rs

//! Data models for devboot database entities
//!
//! Each struct maps to one table and carries its own queries, in the same
//! insert/find/list/delete shape for every model.

mod installed_app;
mod schema_migration;
mod system_data;

pub use installed_app::InstalledApp;
pub use schema_migration::SchemaMigration;
pub use system_data::SystemData;
